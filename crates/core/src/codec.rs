//! 문서 모델과 형식 변환 trait: 모듈 확장 포인트 정의
//!
//! 모든 형식 어댑터(JSON, YAML, CSV, SysLog, Grok ...)는 같은 트리 구조
//! [`Document`]를 생산하고 소비합니다. 새 형식을 지원하려면
//! [`DocumentCodec`]을 구현합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LognormError;

/// 공통 문서 모델
///
/// object/array/string/number/bool/null 노드로 구성된 순서 보존 트리입니다.
/// 키 순서는 삽입 순서를 따릅니다 (`serde_json`의 `preserve_order`).
pub type Document = serde_json::Value;

/// 지원 형식 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Yaml,
    Csv,
    Ini,
    Xml,
    Cef,
    Syslog,
    Grok,
}

impl Format {
    /// 문자열에서 형식을 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "csv" => Some(Self::Csv),
            "ini" => Some(Self::Ini),
            "xml" => Some(Self::Xml),
            "cef" => Some(Self::Cef),
            "syslog" => Some(Self::Syslog),
            "grok" => Some(Self::Grok),
            _ => None,
        }
    }

    /// 형식 이름 (로그/메트릭 레이블용)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Csv => "csv",
            Self::Ini => "ini",
            Self::Xml => "xml",
            Self::Cef => "cef",
            Self::Syslog => "syslog",
            Self::Grok => "grok",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 형식 어댑터 trait
///
/// 텍스트 ⇄ [`Document`] 양방향 변환을 제공합니다.
/// 한 방향만 의미가 있는 형식은 다른 방향에서 `UnsupportedFormat`을 반환합니다.
pub trait DocumentCodec: Send + Sync {
    /// 담당 형식
    fn format(&self) -> Format;

    /// 텍스트를 문서로 변환
    fn decode(&self, text: &str) -> Result<Document, LognormError>;

    /// 문서를 텍스트로 변환
    fn encode(&self, document: &Document) -> Result<String, LognormError>;
}
