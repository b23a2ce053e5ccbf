//! 에러 타입: 도메인별 에러 정의

/// lognorm 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LognormError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 문서 변환 에러
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// 패턴 추출 엔진 에러 (Grok, SysLog)
    #[error("extraction error: {0}")]
    Extraction(String),

    /// 로깅 초기화 에러
    #[error("logging error: {0}")]
    Logging(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 문서 모델 변환 에러
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// 지원하지 않는 형식
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// 텍스트 → 문서 디코딩 실패
    #[error("{format} decode failed at offset {offset}: {reason}")]
    Decode {
        format: String,
        offset: usize,
        reason: String,
    },

    /// 문서 → 텍스트 인코딩 실패
    #[error("{format} encode failed: {reason}")]
    Encode { format: String, reason: String },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: LognormError = ConfigError::InvalidValue {
            field: "grok.max_depth".to_owned(),
            reason: "must be greater than 0".to_owned(),
        }
        .into();
        assert!(matches!(err, LognormError::Config(_)));
        assert!(err.to_string().contains("grok.max_depth"));
    }

    #[test]
    fn decode_error_display_contains_offset() {
        let err = DocumentError::Decode {
            format: "csv".to_owned(),
            offset: 17,
            reason: "unterminated quote".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("csv"));
        assert!(msg.contains("17"));
        assert!(msg.contains("unterminated quote"));
    }
}
