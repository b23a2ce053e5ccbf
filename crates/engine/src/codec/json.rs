//! JSON 코덱
//!
//! `serde_json`으로 텍스트와 문서를 변환합니다. 키 순서는 보존됩니다.

use lognorm_core::error::LognormError;
use lognorm_core::{Document, DocumentCodec, Format};

use super::{check_size, line_column_offset};
use crate::error::EngineError;

/// 기본 최대 입력 크기 (1MB)
const DEFAULT_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// JSON 코덱
#[derive(Debug, Clone)]
pub struct JsonCodec {
    pretty: bool,
    max_input_size: usize,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self {
            pretty: false,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }

    /// 들여쓰기 출력 여부
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    fn decode_document(&self, text: &str) -> Result<Document, EngineError> {
        check_size(text, self.max_input_size)?;
        serde_json::from_str(text).map_err(|e| EngineError::Decode {
            format: Format::Json.as_str().to_owned(),
            offset: line_column_offset(text, e.line(), e.column()),
            reason: e.to_string(),
        })
    }

    fn encode_document(&self, document: &Document) -> Result<String, EngineError> {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(document)
        } else {
            serde_json::to_string(document)
        };
        encoded.map_err(|e| EngineError::Encode {
            format: Format::Json.as_str().to_owned(),
            reason: e.to_string(),
        })
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCodec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
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
    fn decode_preserves_key_order() {
        let doc = JsonCodec::new().decode(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn decode_error_has_offset() {
        let err = JsonCodec::new()
            .decode_document("{\n  \"a\": 1,\n  oops\n}")
            .unwrap_err();
        match err {
            EngineError::Decode { format, offset, .. } => {
                assert_eq!(format, "json");
                // 세 번째 줄 (`  oops`) 안을 가리킴
                assert!((12..=16).contains(&offset), "offset {offset}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decode_too_large() {
        let codec = JsonCodec::new().with_max_input_size(4);
        assert!(matches!(
            codec.decode_document("[1,2,3]"),
            Err(EngineError::TooLarge { size: 7, max: 4 })
        ));
    }

    #[test]
    fn encode_compact_and_pretty() {
        let doc = json!({"a": [1, 2]});
        assert_eq!(JsonCodec::new().encode(&doc).unwrap(), r#"{"a":[1,2]}"#);
        let pretty = JsonCodec::new().pretty(true).encode(&doc).unwrap();
        assert!(pretty.starts_with("{\n"));
    }

    #[test]
    fn scalar_documents() {
        let codec = JsonCodec::new();
        assert_eq!(codec.decode("42").unwrap(), json!(42));
        assert_eq!(codec.decode("null").unwrap(), json!(null));
    }
}
