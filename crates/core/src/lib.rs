//! lognorm 공통 기반 크레이트
//!
//! 문서 모델([`Document`]), 형식 어댑터 trait([`DocumentCodec`]), 에러 타입,
//! 설정, 로깅 초기화, 메트릭 이름을 제공합니다. 추출 엔진은 `lognorm-engine`에 있습니다.

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, DocumentError, LognormError};

// 설정
pub use config::{GeneralConfig, GrokConfig, LognormConfig, SyslogConfig};

// 문서 모델
pub use codec::{Document, DocumentCodec, Format};
