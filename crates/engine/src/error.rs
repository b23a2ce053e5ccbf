//! 추출 엔진 에러 타입
//!
//! [`EngineError`]는 Grok 패턴 전개/컴파일, SysLog 프레이밍, 코덱 변환에서
//! 발생하는 에러를 표현합니다. `From<EngineError> for LognormError` 변환이
//! 구현되어 있어 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use lognorm_core::error::{ConfigError, DocumentError, LognormError};

/// 패턴 전개(resolve) 실패 사유
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// 어느 레지스트리에도 없는 패턴 참조
    #[error("undefined pattern '{name}'")]
    Undefined {
        /// 참조된 패턴 이름
        name: String,
    },

    /// 순환 참조 (A -> B -> A)
    #[error("cyclic pattern reference: {}", chain.join(" -> "))]
    Cycle {
        /// 순환을 이루는 패턴 이름 목록 (첫 항목이 마지막에 반복됨)
        chain: Vec<String>,
    },

    /// 전개 깊이 초과
    #[error("pattern expansion exceeded max depth {depth}")]
    DepthExceeded {
        /// 설정된 최대 깊이
        depth: usize,
    },

    /// 전개된 정규식이 크기 한도 초과
    #[error("expanded pattern exceeds size limit: {size} bytes (max: {max})")]
    TooLarge {
        /// 초과가 감지된 시점의 길이
        size: usize,
        /// 설정된 최대 길이
        max: usize,
    },

    /// 괄호/문자 클래스 불균형
    #[error("unbalanced expression in '{pattern}': {reason}")]
    Unbalanced {
        /// 문제가 된 패턴 이름 (최상위 식은 `<expression>`)
        pattern: String,
        /// 상세 사유
        reason: String,
    },

    /// 잘못된 플레이스홀더 문법 (`%{}`, `%{A:}` 등)
    #[error("invalid placeholder '{placeholder}'")]
    InvalidPlaceholder {
        /// 원문 플레이스홀더
        placeholder: String,
    },

    /// 빈 식
    #[error("empty expression")]
    EmptyExpression,
}

/// 추출 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Grok 식 전개 실패
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// 전개된 정규식 컴파일 실패 (해당 id는 영구적으로 사용 불가)
    #[error("compile error: cache id {id:#018x}: {reason}")]
    Compile {
        /// 캐시 id
        id: u64,
        /// 정규식 엔진이 보고한 사유
        reason: String,
    },

    /// SysLog 프레이밍 불일치
    #[error("syslog framing error: {0}")]
    Framing(String),

    /// 텍스트 → 문서 디코딩 실패
    #[error("decode error: {format} at offset {offset}: {reason}")]
    Decode {
        /// 형식 이름
        format: String,
        /// 실패 위치 (바이트 오프셋)
        offset: usize,
        /// 실패 사유
        reason: String,
    },

    /// 문서 → 텍스트 인코딩 실패
    #[error("encode error: {format}: {reason}")]
    Encode {
        /// 형식 이름
        format: String,
        /// 실패 사유
        reason: String,
    },

    /// 어댑터가 등록되지 않은 형식
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// 입력 크기 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge {
        /// 입력 크기
        size: usize,
        /// 허용 최대 크기
        max: usize,
    },

    /// 설정 값 오류
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<EngineError> for LognormError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Decode {
                format,
                offset,
                reason,
            } => LognormError::Document(DocumentError::Decode {
                format,
                offset,
                reason,
            }),
            EngineError::Encode { format, reason } => {
                LognormError::Document(DocumentError::Encode { format, reason })
            }
            EngineError::UnsupportedFormat(format) => {
                LognormError::Document(DocumentError::UnsupportedFormat(format))
            }
            EngineError::TooLarge { size, max } => {
                LognormError::Document(DocumentError::TooLarge { size, max })
            }
            EngineError::Config { field, reason } => {
                LognormError::Config(ConfigError::InvalidValue { field, reason })
            }
            other => LognormError::Extraction(other.to_string()),
        }
    }
}
