//! REGEXP 모드: Grok 엔진 위의 필드 추출기
//!
//! 전용 [`Grok`] 인스턴스(대소문자 구분, 내장 패턴 없음)에 다섯 개의 식을
//! 등록하고 한 번만 빌드합니다. 매칭은 공유 상태를 건드리지 않는
//! [`Grok::extract`]를 사용하므로 여러 스레드가 동시에 써도 됩니다.

use std::sync::OnceLock;

use lognorm_core::config::GrokConfig;
use tracing::warn;

use super::extract::{DateKind, FieldExtractor, RawFields};
use crate::error::EngineError;
use crate::grok::{CacheId, Grok, Variables};

const DATE_BSD: &str = r"[A-Za-z]{3} +[0-9]{1,2} [0-9]{2}:[0-9]{2}:[0-9]{2}(?: [0-9]{4})?";

const DATE_PLAIN: &str = r"[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}";

const DATE_ISO: &str = r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?(?:Z|[+-][0-9]{2}:[0-9]{2})";

const RFC3164: &str = r"(?s)^<(?<pri>[0-9]{1,3})>(?:(?<timestamp>%{SYSLOG_DATE_BSD}|%{SYSLOG_DATE_PLAIN}|%{SYSLOG_DATE_ISO})\s+(?<host>\S+)(?:\s+|$))?(?:(?<app>[^\s\[\]:]+)(?:\[(?<pid>[0-9]+)\])?:(?:\s+|$))?(?<message>.*)$";

const RFC5424: &str = r#"(?s)^<(?<pri>[0-9]{1,3})>(?<version>[1-9][0-9]{0,2})\s+(?:-|(?<timestamp>%{SYSLOG_DATE_ISO}))\s+(?<host>\S+)\s+(?<app>\S+)\s+(?<pid>\S+)\s+(?<msgid>\S+)(?:\s+(?<sd>-|(?:\[(?:[^\]"]|"(?:[^"\\]|\\.)*")*\])+))?(?:\s+(?<message>.*))?$"#;

/// 등록되는 패턴 (이름, 본문)
const PATTERNS: [(&str, &str); 5] = [
    ("SYSLOG_DATE_BSD", DATE_BSD),
    ("SYSLOG_DATE_PLAIN", DATE_PLAIN),
    ("SYSLOG_DATE_ISO", DATE_ISO),
    ("SYSLOG_RFC3164", RFC3164),
    ("SYSLOG_RFC5424", RFC5424),
];

struct Compiled {
    grok: Grok,
    rfc3164: CacheId,
    rfc5424: CacheId,
    bsd: CacheId,
    plain: CacheId,
    iso: CacheId,
}

impl Compiled {
    fn build() -> Result<Self, EngineError> {
        let grok = Grok::with_config(&GrokConfig {
            case_insensitive: false,
            builtin_patterns: false,
            ..GrokConfig::default()
        });
        for (name, body) in PATTERNS {
            grok.pattern(name, body)?;
        }

        Ok(Self {
            rfc3164: grok.build("%{SYSLOG_RFC3164}")?,
            rfc5424: grok.build("%{SYSLOG_RFC5424}")?,
            bsd: grok.build("^%{SYSLOG_DATE_BSD}$")?,
            plain: grok.build("^%{SYSLOG_DATE_PLAIN}$")?,
            iso: grok.build("^%{SYSLOG_DATE_ISO}$")?,
            grok,
        })
    }
}

/// 프로세스 전역에서 한 번 빌드. 실패하면 REGEXP 모드는 항상 매칭 실패입니다.
fn compiled() -> Option<&'static Compiled> {
    static COMPILED: OnceLock<Option<Compiled>> = OnceLock::new();
    COMPILED
        .get_or_init(|| match Compiled::build() {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                warn!(error = %e, "failed to build syslog grok expressions");
                None
            }
        })
        .as_ref()
}

/// Grok 식 기반 추출기
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct RegexExtractor;

impl RegexExtractor {
    fn extract(line: &str, pick: fn(&Compiled) -> CacheId) -> Option<Variables> {
        let compiled = compiled()?;
        compiled.grok.extract(line, pick(compiled))
    }
}

fn raw_fields(vars: &Variables) -> Option<RawFields> {
    let field = |name: &str| vars.get(name).map(str::to_owned);
    Some(RawFields {
        pri: field("pri")?,
        version: field("version"),
        timestamp: field("timestamp"),
        host: field("host"),
        app: field("app"),
        pid: field("pid"),
        msgid: field("msgid"),
        sd: field("sd"),
        message: field("message"),
    })
}

impl FieldExtractor for RegexExtractor {
    fn rfc5424(&self, line: &str) -> Option<RawFields> {
        raw_fields(&Self::extract(line, |c| c.rfc5424)?)
    }

    fn rfc3164(&self, line: &str) -> Option<RawFields> {
        raw_fields(&Self::extract(line, |c| c.rfc3164)?)
    }

    fn date_kind(&self, text: &str) -> Option<DateKind> {
        let compiled = compiled()?;
        let matches = |id| compiled.grok.extract(text, id).is_some();
        if matches(compiled.bsd) {
            Some(DateKind::Bsd)
        } else if matches(compiled.plain) {
            Some(DateKind::Plain)
        } else if matches(compiled.iso) {
            Some(DateKind::Iso)
        } else {
            None
        }
    }
}
