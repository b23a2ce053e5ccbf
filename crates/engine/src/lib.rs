//! lognorm 패턴 기반 텍스트 추출 엔진
//!
//! # 모듈 구성
//!
//! - [`grok`]: Grok 패턴 레지스트리, 전개기, 컴파일 캐시, [`Grok`] 엔진
//! - [`syslog`]: RFC 3164 / RFC 5424 파서 ([`SysLog`]), NATIVE/REGEXP 두 추출 방식
//! - [`codec`]: JSON, YAML, CSV, SysLog, Grok 코덱과 [`CodecRouter`]
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! patterns(doc) / pattern()        build(expr)                 parse(text, id)
//!   PatternRegistry  ----------->  resolve -> CacheEntry  ---->  Variables -> dump()
//!                                  (FNV-1a id, compile once)
//!
//! SysLog::parse(line) -> NativeExtractor | RegexExtractor(Grok) -> typed fields -> dump()/syslog()
//!
//! CodecRouter: text <-> Document (JSON / YAML / CSV / SysLog / Grok)
//! ```
//!
//! # 사용 예시
//! ```
//! use lognorm_engine::Grok;
//!
//! let grok = Grok::new();
//! let id = grok.build("%{IP:client} %{WORD:method} %{URIPATHPARAM:request}")?;
//! assert!(grok.parse("55.3.244.1 GET /index.html", id));
//! assert_eq!(grok.get("method", id).as_deref(), Some("GET"));
//! # Ok::<(), lognorm_engine::EngineError>(())
//! ```

pub mod codec;
pub mod error;
pub mod grok;
pub mod syslog;

// --- 주요 타입 re-export ---

// Grok
pub use grok::{CacheId, Grok, Resolved, Variables};

// SysLog
pub use syslog::{Mode, ParseState, Standard, StructuredData, SysLog};

// 코덱
pub use codec::{CodecRouter, Csv, CsvCodec, GrokCodec, JsonCodec, SyslogCodec, YamlCodec};

// 에러
pub use error::{EngineError, ResolveError};
