//! 설정 관리: lognorm.toml 파싱 및 런타임 설정
//!
//! [`LognormConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//! 파일 읽기는 호출자의 몫이며, 이 모듈은 TOML 텍스트만 다룹니다.
//!
//! # 설정 적용 우선순위
//! 1. 환경변수 (`LOGNORM_GROK_MAX_DEPTH=32` 형식)
//! 2. TOML 텍스트
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```
//! use lognorm_core::config::LognormConfig;
//!
//! let mut config = LognormConfig::parse("[grok]\nmax_depth = 16").unwrap();
//! config.apply_env_overrides();
//! config.validate().unwrap();
//! assert_eq!(config.grok.max_depth, 16);
//! ```

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LognormError};

/// SysLog 기본 날짜 출력 형식 (ISO-8601, 밀리초, UTC `Z`)
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// strftime 형식 문자열 검사
///
/// 비어 있거나 chrono가 해석하지 못하는 지정자(`%Q` 등)가 있으면 `false`.
/// 설정 검증과 SysLog 엔진이 같은 규칙을 씁니다.
pub fn is_valid_date_format(format: &str) -> bool {
    !format.is_empty() && StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

/// lognorm 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LognormConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// Grok 엔진 설정
    #[serde(default)]
    pub grok: GrokConfig,
    /// SysLog 파서 설정
    #[serde(default)]
    pub syslog: SyslogConfig,
}

impl LognormConfig {
    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LognormError> {
        toml::from_str(toml_str).map_err(|e| {
            LognormError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGNORM_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGNORM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGNORM_GENERAL_LOG_FORMAT");

        // Grok
        override_usize(&mut self.grok.max_depth, "LOGNORM_GROK_MAX_DEPTH");
        override_bool(
            &mut self.grok.case_insensitive,
            "LOGNORM_GROK_CASE_INSENSITIVE",
        );
        override_usize(&mut self.grok.size_limit, "LOGNORM_GROK_SIZE_LIMIT");
        override_bool(
            &mut self.grok.builtin_patterns,
            "LOGNORM_GROK_BUILTIN_PATTERNS",
        );

        // SysLog
        override_string(&mut self.syslog.standard, "LOGNORM_SYSLOG_STANDARD");
        override_string(&mut self.syslog.mode, "LOGNORM_SYSLOG_MODE");
        override_string(&mut self.syslog.date_format, "LOGNORM_SYSLOG_DATE_FORMAT");
        override_usize(
            &mut self.syslog.max_input_size,
            "LOGNORM_SYSLOG_MAX_INPUT_SIZE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LognormError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.grok.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "grok.max_depth".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.grok.size_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "grok.size_limit".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        let valid_standards = ["auto", "rfc3164", "rfc5424"];
        if !valid_standards.contains(&self.syslog.standard.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "syslog.standard".to_owned(),
                reason: format!("must be one of: {}", valid_standards.join(", ")),
            }
            .into());
        }

        let valid_modes = ["native", "regexp"];
        if !valid_modes.contains(&self.syslog.mode.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "syslog.mode".to_owned(),
                reason: format!("must be one of: {}", valid_modes.join(", ")),
            }
            .into());
        }

        if !is_valid_date_format(&self.syslog.date_format) {
            return Err(ConfigError::InvalidValue {
                field: "syslog.date_format".to_owned(),
                reason: format!(
                    "'{}' is not a valid strftime format",
                    self.syslog.date_format
                ),
            }
            .into());
        }

        if self.syslog.max_input_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "syslog.max_input_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// Grok 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrokConfig {
    /// 패턴 중첩 전개 최대 깊이
    pub max_depth: usize,
    /// 대소문자 무시 매칭 여부
    pub case_insensitive: bool,
    /// 전개된 식 길이와 컴파일된 정규식 크기의 한도 (바이트)
    pub size_limit: usize,
    /// 내장 패턴 라이브러리 로드 여부
    pub builtin_patterns: bool,
}

impl Default for GrokConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            case_insensitive: true,
            size_limit: 10 * 1024 * 1024, // 10MB
            builtin_patterns: true,
        }
    }
}

/// SysLog 파서 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyslogConfig {
    /// 파싱 표준 (auto, rfc3164, rfc5424)
    pub standard: String,
    /// 파싱 방식 (native, regexp)
    pub mode: String,
    /// 타임스탬프 출력 형식 (strftime)
    pub date_format: String,
    /// 최대 허용 입력 크기 (바이트)
    pub max_input_size: usize,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            standard: "auto".to_owned(),
            mode: "native".to_owned(),
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
            max_input_size: 64 * 1024, // 64KB
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}
