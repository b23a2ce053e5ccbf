//! Grok 코덱 (디코딩 전용)
//!
//! 미리 빌드한 Grok 식으로 줄마다 필드를 추출합니다. 공유 추출 상태를 쓰지 않는
//! [`Grok::extract`]를 사용하므로 같은 엔진을 여러 코덱이 함께 써도 됩니다.

use std::sync::Arc;

use lognorm_core::error::LognormError;
use lognorm_core::{Document, DocumentCodec, Format};

use super::decode_lines;
use crate::error::EngineError;
use crate::grok::{CacheId, Grok};

/// Grok 코덱
#[derive(Debug, Clone)]
pub struct GrokCodec {
    grok: Arc<Grok>,
    id: CacheId,
}

impl GrokCodec {
    /// 식을 빌드하여 코덱을 만듭니다.
    pub fn new(grok: Arc<Grok>, expression: &str) -> Result<Self, EngineError> {
        let id = grok.build(expression)?;
        Ok(Self { grok, id })
    }

    /// 사용 중인 캐시 id
    pub fn cache_id(&self) -> CacheId {
        self.id
    }
}

impl DocumentCodec for GrokCodec {
    fn format(&self) -> Format {
        Format::Grok
    }

    fn decode(&self, text: &str) -> Result<Document, LognormError> {
        Ok(decode_lines(text, Format::Grok, |line| {
            self.grok.extract(line, self.id).map(|vars| vars.to_document())
        })?)
    }

    fn encode(&self, _document: &Document) -> Result<String, LognormError> {
        Err(EngineError::UnsupportedFormat("grok encoding".to_owned()).into())
    }
}
