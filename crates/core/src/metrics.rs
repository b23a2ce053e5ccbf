//! 메트릭 상수 및 설명 등록
//!
//! 엔진이 기록하는 모든 메트릭의 이름과 설명을 한곳에서 정의합니다.
//! 레코더 설치는 애플리케이션의 몫이며, 설치되지 않았다면 기록은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `lognorm_`
//! - 모듈명: `grok_`, `syslog_`, `codec_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(lognorm_core::metrics::GROK_BUILDS_TOTAL).increment(1);
//! ```

use metrics::describe_counter;

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (matched, unmatched)
pub const LABEL_RESULT: &str = "result";

/// SysLog 표준 레이블 키 (rfc3164, rfc5424)
pub const LABEL_STANDARD: &str = "standard";

/// 문서 형식 레이블 키 (json, yaml, csv ...)
pub const LABEL_FORMAT: &str = "format";

// ─── Grok 메트릭 ─────────────────────────────────────────────────

/// Grok: `build` 호출 수 (counter)
pub const GROK_BUILDS_TOTAL: &str = "lognorm_grok_builds_total";

/// Grok: 실제 정규식 컴파일 수 (counter)
pub const GROK_COMPILATIONS_TOTAL: &str = "lognorm_grok_compilations_total";

/// Grok: 정규식 컴파일 실패 수 (counter)
pub const GROK_COMPILE_ERRORS_TOTAL: &str = "lognorm_grok_compile_errors_total";

/// Grok: 패턴 전개 실패 수 (counter)
pub const GROK_RESOLVE_ERRORS_TOTAL: &str = "lognorm_grok_resolve_errors_total";

/// Grok: 매칭 시도 수 (counter, label: result)
pub const GROK_MATCHES_TOTAL: &str = "lognorm_grok_matches_total";

// ─── SysLog 메트릭 ───────────────────────────────────────────────

/// SysLog: 파싱 성공 수 (counter, label: standard)
pub const SYSLOG_PARSED_TOTAL: &str = "lognorm_syslog_parsed_total";

/// SysLog: 파싱 실패 수 (counter)
pub const SYSLOG_FAILURES_TOTAL: &str = "lognorm_syslog_failures_total";

// ─── Codec 메트릭 ────────────────────────────────────────────────

/// Codec: 형식 변환 수 (counter, label: format)
pub const CODEC_CONVERSIONS_TOTAL: &str = "lognorm_codec_conversions_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더를 설치한 직후 한 번 호출합니다.
pub fn describe_all() {
    // Grok
    describe_counter!(
        GROK_BUILDS_TOTAL,
        "Total number of grok build requests, cached or not"
    );
    describe_counter!(
        GROK_COMPILATIONS_TOTAL,
        "Total number of regular expressions compiled by grok"
    );
    describe_counter!(
        GROK_COMPILE_ERRORS_TOTAL,
        "Total number of grok expressions rejected by the regex compiler"
    );
    describe_counter!(
        GROK_RESOLVE_ERRORS_TOTAL,
        "Total number of grok patterns that failed placeholder resolution"
    );
    describe_counter!(
        GROK_MATCHES_TOTAL,
        "Total number of grok match attempts by result"
    );

    // SysLog
    describe_counter!(
        SYSLOG_PARSED_TOTAL,
        "Total number of syslog messages parsed by standard"
    );
    describe_counter!(
        SYSLOG_FAILURES_TOTAL,
        "Total number of syslog messages that matched no standard"
    );

    // Codec
    describe_counter!(
        CODEC_CONVERSIONS_TOTAL,
        "Total number of document conversions by target format"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        GROK_BUILDS_TOTAL,
        GROK_COMPILATIONS_TOTAL,
        GROK_COMPILE_ERRORS_TOTAL,
        GROK_RESOLVE_ERRORS_TOTAL,
        GROK_MATCHES_TOTAL,
        SYSLOG_PARSED_TOTAL,
        SYSLOG_FAILURES_TOTAL,
        CODEC_CONVERSIONS_TOTAL,
    ];

    #[test]
    fn all_metrics_start_with_lognorm_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("lognorm_"),
                "Metric '{}' does not start with 'lognorm_' prefix",
                name
            );
        }
    }

    #[test]
    fn all_counters_end_with_total() {
        for name in ALL_METRIC_NAMES {
            assert!(name.ends_with("_total"), "Counter '{}' lacks _total", name);
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_RESULT, LABEL_STANDARD, LABEL_FORMAT] {
            assert_eq!(label.to_lowercase(), label);
        }
    }
}
