//! SysLog 코덱
//!
//! 한 줄은 [`SysLog::dump`] 모양의 객체 하나, 여러 줄은 객체 배열이 됩니다.
//! 인코딩은 반대로 [`SysLog::load`] 후 [`SysLog::syslog`]로 줄을 만듭니다.

use lognorm_core::config::SyslogConfig;
use lognorm_core::error::LognormError;
use lognorm_core::{Document, DocumentCodec, Format};
use serde_json::Value;

use super::decode_lines;
use crate::error::EngineError;
use crate::syslog::SysLog;

/// SysLog 코덱
#[derive(Debug, Clone)]
pub struct SyslogCodec {
    template: SysLog,
}

impl SyslogCodec {
    /// 설정으로 코덱을 만듭니다.
    pub fn new(config: &SyslogConfig) -> Result<Self, EngineError> {
        Ok(Self {
            template: SysLog::with_config(config)?,
        })
    }

    fn encode_one(&self, document: &Document) -> Result<String, EngineError> {
        let mut log = self.template.clone();
        if !log.load(document) {
            return Err(EngineError::Encode {
                format: Format::Syslog.as_str().to_owned(),
                reason: "document does not describe a syslog record".to_owned(),
            });
        }
        Ok(log.syslog())
    }
}

impl Default for SyslogCodec {
    fn default() -> Self {
        Self {
            template: SysLog::new(),
        }
    }
}

impl DocumentCodec for SyslogCodec {
    fn format(&self) -> Format {
        Format::Syslog
    }

    fn decode(&self, text: &str) -> Result<Document, LognormError> {
        let mut log = self.template.clone();
        Ok(decode_lines(text, Format::Syslog, |line| {
            log.parse(line).then(|| log.dump())
        })?)
    }

    fn encode(&self, document: &Document) -> Result<String, LognormError> {
        let lines = match document {
            Value::Array(items) => items
                .iter()
                .map(|item| self.encode_one(item))
                .collect::<Result<Vec<_>, _>>()?,
            other => vec![self.encode_one(other)?],
        };
        Ok(lines.join("\n"))
    }
}
