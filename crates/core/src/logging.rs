//! tracing 초기화
//!
//! [`GeneralConfig`]의 `log_level`/`log_format`에 따라 전역 `tracing-subscriber`를
//! 설치합니다. 라이브러리 내부는 `tracing` 매크로만 사용하고, 구독자 설치는
//! 이 함수를 호출하는 애플리케이션이 한 번만 수행합니다.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::GeneralConfig;
use crate::error::LognormError;

/// 전역 tracing 구독자를 초기화합니다.
///
/// `RUST_LOG` 환경변수가 있으면 `log_level`보다 우선합니다.
///
/// # Formats
///
/// * `"json"` - JSON lines
/// * `"pretty"` - 사람이 읽기 쉬운 출력
pub fn init_tracing(config: &GeneralConfig) -> Result<(), LognormError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| {
                LognormError::Logging(format!(
                    "failed to initialize JSON tracing subscriber: {e}"
                ))
            }),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .map_err(|e| {
                LognormError::Logging(format!(
                    "failed to initialize pretty tracing subscriber: {e}"
                ))
            }),
        other => Err(LognormError::Logging(format!(
            "unknown log format '{other}', expected 'json' or 'pretty'"
        ))),
    }
}
