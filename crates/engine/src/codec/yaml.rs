//! YAML 코덱
//!
//! `serde_yaml`로 YAML 텍스트를 공통 문서 모델(`serde_json::Value`)로 읽고 씁니다.
//! 문자열이 아닌 매핑 키와 태그 값은 문서 모델로 표현할 수 없어 디코딩 에러입니다.

use lognorm_core::error::LognormError;
use lognorm_core::{Document, DocumentCodec, Format};
use serde_json::Value;

use super::check_size;
use crate::error::EngineError;

/// 기본 최대 입력 크기 (1MB)
const DEFAULT_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// YAML 코덱
#[derive(Debug, Clone)]
pub struct YamlCodec {
    max_input_size: usize,
}

impl YamlCodec {
    pub fn new() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    fn decode_document(&self, text: &str) -> Result<Document, EngineError> {
        check_size(text, self.max_input_size)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_yaml::from_str(text).map_err(|e| EngineError::Decode {
            format: Format::Yaml.as_str().to_owned(),
            offset: e.location().map_or(0, |loc| loc.index()),
            reason: e.to_string(),
        })
    }

    fn encode_document(&self, document: &Document) -> Result<String, EngineError> {
        serde_yaml::to_string(document).map_err(|e| EngineError::Encode {
            format: Format::Yaml.as_str().to_owned(),
            reason: e.to_string(),
        })
    }
}

impl Default for YamlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCodec for YamlCodec {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn decode(&self, text: &str) -> Result<Document, LognormError> {
        Ok(self.decode_document(text)?)
    }

    fn encode(&self, document: &Document) -> Result<String, LognormError> {
        Ok(self.encode_document(document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_mapping_and_sequence() {
        let doc = YamlCodec::new()
            .decode("host: web-01\nports:\n  - 80\n  - 443\ntls: true\n")
            .unwrap();
        assert_eq!(doc, json!({"host": "web-01", "ports": [80, 443], "tls": true}));
    }

    #[test]
    fn decode_empty_is_null() {
        assert_eq!(YamlCodec::new().decode("\n  \n").unwrap(), Value::Null);
    }

    #[test]
    fn decode_error_has_location() {
        let err = YamlCodec::new()
            .decode_document("a: 1\nb: [unclosed\n")
            .unwrap_err();
        assert!(matches!(err, EngineError::Decode { ref format, .. } if format == "yaml"));
    }

    #[test]
    fn encode_round_trips() {
        let codec = YamlCodec::new();
        let doc = json!({"name": "lognorm", "nested": {"list": ["a", "b"]}});
        let text = codec.encode(&doc).unwrap();
        assert_eq!(codec.decode(&text).unwrap(), doc);
    }

    #[test]
    fn decode_too_large() {
        let codec = YamlCodec::new().with_max_input_size(2);
        assert!(matches!(
            codec.decode_document("a: 1"),
            Err(EngineError::TooLarge { .. })
        ));
    }
}
