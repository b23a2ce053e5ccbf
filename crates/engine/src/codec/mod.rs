//! 형식 변환 코덱: 텍스트 ⇄ 공통 문서 모델
//!
//! [`CodecRouter`]는 [`Format`]별로 등록된 [`DocumentCodec`]을 골라
//! 디코딩/인코딩/변환을 수행합니다. 등록되지 않은 형식은
//! `UnsupportedFormat`입니다.
//!
//! # 기본 코덱
//! - JSON ([`JsonCodec`])
//! - YAML ([`YamlCodec`])
//! - CSV ([`CsvCodec`], 쉼표 구분, 첫 줄 헤더)
//! - SysLog ([`SyslogCodec`])
//!
//! Grok 코덱([`GrokCodec`])은 빌드된 식이 필요하므로 직접 등록합니다.
//!
//! # 사용 예시
//! ```
//! use lognorm_core::Format;
//! use lognorm_engine::codec::CodecRouter;
//!
//! let router = CodecRouter::with_defaults();
//! let yaml = router.convert(r#"{"host":"web-01","port":8080}"#, Format::Json, Format::Yaml)?;
//! assert!(yaml.contains("host: web-01"));
//! # Ok::<(), lognorm_core::LognormError>(())
//! ```

pub mod csv;
pub mod grok;
pub mod json;
pub mod syslog;
pub mod yaml;

pub use self::csv::{Csv, CsvCodec};
pub use self::grok::GrokCodec;
pub use self::json::JsonCodec;
pub use self::syslog::SyslogCodec;
pub use self::yaml::YamlCodec;

use lognorm_core::error::LognormError;
use lognorm_core::metrics as m;
use lognorm_core::{Document, DocumentCodec, Format};
use serde_json::Value;
use tracing::debug;

use crate::error::EngineError;

/// 코덱 라우터
///
/// 형식마다 코덱 하나를 가집니다. 같은 형식을 다시 등록하면 교체됩니다.
pub struct CodecRouter {
    codecs: Vec<Box<dyn DocumentCodec>>,
}

impl CodecRouter {
    /// 빈 라우터를 생성합니다.
    pub fn new() -> Self {
        Self { codecs: Vec::new() }
    }

    /// 기본 코덱 세트 (JSON, YAML, CSV, SysLog)로 라우터를 생성합니다.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Box::new(JsonCodec::new()))
            .register(Box::new(YamlCodec::new()))
            .register(Box::new(CsvCodec::default()))
            .register(Box::new(SyslogCodec::default()))
    }

    /// 코덱을 등록합니다.
    pub fn register(mut self, codec: Box<dyn DocumentCodec>) -> Self {
        let format = codec.format();
        match self.codecs.iter_mut().find(|c| c.format() == format) {
            Some(slot) => {
                debug!(format = format.as_str(), "replacing registered codec");
                *slot = codec;
            }
            None => self.codecs.push(codec),
        }
        self
    }

    /// 형식의 코덱
    pub fn codec(&self, format: Format) -> Option<&dyn DocumentCodec> {
        self.codecs
            .iter()
            .find(|c| c.format() == format)
            .map(|c| c.as_ref())
    }

    /// 텍스트를 문서로 변환합니다.
    pub fn decode(&self, format: Format, text: &str) -> Result<Document, LognormError> {
        let document = self.require(format)?.decode(text)?;
        metrics::counter!(m::CODEC_CONVERSIONS_TOTAL, m::LABEL_FORMAT => format.as_str())
            .increment(1);
        Ok(document)
    }

    /// 문서를 텍스트로 변환합니다.
    pub fn encode(&self, format: Format, document: &Document) -> Result<String, LognormError> {
        let text = self.require(format)?.encode(document)?;
        metrics::counter!(m::CODEC_CONVERSIONS_TOTAL, m::LABEL_FORMAT => format.as_str())
            .increment(1);
        Ok(text)
    }

    /// `from` 형식 텍스트를 `to` 형식 텍스트로 변환합니다.
    pub fn convert(&self, text: &str, from: Format, to: Format) -> Result<String, LognormError> {
        // 양쪽 코덱을 먼저 확인해 디코딩 작업을 낭비하지 않음
        self.require(to)?;
        let document = self.decode(from, text)?;
        self.encode(to, &document)
    }

    /// 등록된 형식 목록 (등록 순서)
    pub fn registered_formats(&self) -> Vec<Format> {
        self.codecs.iter().map(|c| c.format()).collect()
    }

    fn require(&self, format: Format) -> Result<&dyn DocumentCodec, LognormError> {
        self.codec(format)
            .ok_or_else(|| EngineError::UnsupportedFormat(format.as_str().to_owned()).into())
    }
}

impl Default for CodecRouter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// 입력 크기 검사
pub(crate) fn check_size(text: &str, max: usize) -> Result<(), EngineError> {
    if text.len() > max {
        return Err(EngineError::TooLarge {
            size: text.len(),
            max,
        });
    }
    Ok(())
}

/// 1부터 시작하는 (줄, 열) 위치를 바이트 오프셋으로 바꿉니다.
pub(crate) fn line_column_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

/// 줄 단위 형식의 공통 디코딩
///
/// 비어 있지 않은 줄이 하나면 객체 하나, 여러 개면 배열입니다.
/// 한 줄이라도 실패하면 그 줄의 시작 오프셋으로 에러를 반환합니다.
pub(crate) fn decode_lines<F>(
    text: &str,
    format: Format,
    mut decode_line: F,
) -> Result<Document, EngineError>
where
    F: FnMut(&str) -> Option<Document>,
{
    let mut documents = Vec::new();
    let mut offset = 0;
    for raw in text.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\r', '\n']);
        if !line.trim().is_empty() {
            let document = decode_line(line).ok_or_else(|| EngineError::Decode {
                format: format.as_str().to_owned(),
                offset,
                reason: "line did not match".to_owned(),
            })?;
            documents.push(document);
        }
        offset += raw.len();
    }

    match documents.len() {
        0 => Err(EngineError::Decode {
            format: format.as_str().to_owned(),
            offset: 0,
            reason: "empty input".to_owned(),
        }),
        1 => Ok(documents.swap_remove(0)),
        _ => Ok(Value::Array(documents)),
    }
}

/// 문서의 스칼라 값을 셀/필드 텍스트로
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
