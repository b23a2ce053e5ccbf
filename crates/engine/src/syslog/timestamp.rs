//! SysLog 타임스탬프 해석과 출력
//!
//! 세 가지 입력 형식을 받습니다.
//!
//! - BSD: `Oct 11 22:14:15` (연도 없으면 현재 연도), `Oct 11 22:14:15 2003`
//! - Plain: `2003-10-11 22:14:15` (UTC로 해석)
//! - ISO 8601: `2003-10-11T22:14:15.003Z`, `2003-10-11T22:14:15+09:00`
//!
//! 해석 결과는 밀리초 단위로 자릅니다.

use std::fmt::Write;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

use super::extract::DateKind;

/// 판별된 형식에 맞춰 타임스탬프 텍스트를 해석합니다.
pub(crate) fn parse(kind: DateKind, text: &str) -> Option<DateTime<Utc>> {
    let parsed = match kind {
        DateKind::Bsd => parse_bsd(text),
        DateKind::Plain => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.and_utc()),
        DateKind::Iso => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    };
    parsed.map(truncate_millis)
}

/// BSD 타임스탬프 해석. 연속 공백(`Oct  1`)을 허용합니다.
fn parse_bsd(text: &str) -> Option<DateTime<Utc>> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (year, month, day, time) = match tokens.as_slice() {
        [month, day, time] => (Utc::now().year(), *month, *day, *time),
        [month, day, time, year] => (year.parse().ok()?, *month, *day, *time),
        _ => return None,
    };

    let normalized = format!("{year} {month} {day} {time}");
    NaiveDateTime::parse_from_str(&normalized, "%Y %b %d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

/// 임의 strftime 형식으로 된 텍스트를 해석합니다.
///
/// 오프셋이 있으면 UTC로 변환하고, 없으면 UTC로 간주합니다.
/// 시각이 없는 형식은 자정으로 봅니다.
pub(crate) fn parse_with_format(text: &str, format: &str) -> Option<DateTime<Utc>> {
    if !is_valid_format(format) {
        return None;
    }
    let parsed = DateTime::parse_from_str(text, format)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(text, format).map(|dt| dt.and_utc()))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })?;
    Some(truncate_millis(parsed))
}

/// 타임스탬프를 strftime 형식으로 출력합니다. 형식이 잘못되었으면 `None`.
pub(crate) fn render(ts: &DateTime<Utc>, format: &str) -> Option<String> {
    if !is_valid_format(format) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", ts.format(format)).ok()?;
    Some(out)
}

/// RFC 3339 밀리초 표현 (`dump()`용)
pub(crate) fn to_rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub(crate) use lognorm_core::config::is_valid_date_format as is_valid_format;

fn truncate_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    let millis = ts.nanosecond() / 1_000_000 * 1_000_000;
    ts.with_nanosecond(millis).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bsd_with_year() {
        let ts = parse(DateKind::Bsd, "Oct 11 22:14:15 2003").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2003, 10, 11, 22, 14, 15).unwrap());
    }

    #[test]
    fn bsd_without_year_uses_current_year() {
        let ts = parse(DateKind::Bsd, "Oct 11 22:14:15").unwrap();
        assert_eq!(ts.year(), Utc::now().year());
        assert_eq!(ts.month(), 10);
    }

    #[test]
    fn bsd_single_digit_day_with_double_space() {
        let ts = parse(DateKind::Bsd, "Dec  1 00:00:00 2020").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 12, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn bsd_invalid_month() {
        assert!(parse(DateKind::Bsd, "Foo 11 22:14:15").is_none());
    }

    #[test]
    fn plain_is_utc() {
        let ts = parse(DateKind::Plain, "2003-10-11 22:14:15").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2003, 10, 11, 22, 14, 15).unwrap());
    }

    #[test]
    fn iso_with_offset_converts_to_utc() {
        let ts = parse(DateKind::Iso, "2003-10-11T22:14:15+09:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2003, 10, 11, 13, 14, 15).unwrap());
    }

    #[test]
    fn iso_fraction_is_truncated_to_millis() {
        let ts = parse(DateKind::Iso, "2003-10-11T22:14:15.003456Z").unwrap();
        assert_eq!(ts.nanosecond(), 3_000_000);
    }

    #[test]
    fn invalid_calendar_date() {
        assert!(parse(DateKind::Iso, "2003-13-45T22:14:15Z").is_none());
        assert!(parse(DateKind::Plain, "2003-02-30 00:00:00").is_none());
    }

    #[test]
    fn render_default_format() {
        let ts = parse(DateKind::Iso, "2003-10-11T22:14:15.003Z").unwrap();
        assert_eq!(
            render(&ts, lognorm_core::config::DEFAULT_DATE_FORMAT).unwrap(),
            "2003-10-11T22:14:15.003Z"
        );
    }

    #[test]
    fn render_rejects_invalid_format() {
        let ts = Utc.with_ymd_and_hms(2003, 10, 11, 22, 14, 15).unwrap();
        assert!(render(&ts, "%Q").is_none());
        assert!(render(&ts, "").is_none());
        assert!(!is_valid_format("%"));
        assert!(is_valid_format("%Y/%m/%d"));
    }

    #[test]
    fn parse_with_custom_formats() {
        let ts = parse_with_format("11/10/2003 22:14", "%d/%m/%Y %H:%M").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2003, 10, 11, 22, 14, 0).unwrap());

        let ts = parse_with_format("2003-10-11", "%Y-%m-%d").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2003, 10, 11, 0, 0, 0).unwrap());

        let ts = parse_with_format("2003-10-11 22:14:15 +0100", "%Y-%m-%d %H:%M:%S %z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2003, 10, 11, 21, 14, 15).unwrap());

        assert!(parse_with_format("garbage", "%Y-%m-%d").is_none());
    }

    #[test]
    fn rfc3339_dump_representation() {
        let ts = Utc.with_ymd_and_hms(2003, 10, 11, 22, 14, 15).unwrap();
        assert_eq!(to_rfc3339(&ts), "2003-10-11T22:14:15.000Z");
    }
}
