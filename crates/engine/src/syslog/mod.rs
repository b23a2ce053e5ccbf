//! SysLog 파서: RFC 3164 / RFC 5424
//!
//! 한 줄을 파싱해 타입이 있는 필드로 보관하고, 문서로 내보내거나
//! 다시 RFC 형식의 줄로 직렬화합니다.
//!
//! # 표준 감지
//! `Standard::Auto`는 RFC 5424 프레이밍을 먼저 시도하고, 맞지 않으면
//! RFC 3164로 떨어집니다. 둘 다 맞지 않으면 `ParseState::Failed`이며 모든
//! 필드는 기본값입니다.
//!
//! # 추출 방식
//! - `Mode::Native`: 직접 문자열 스캔
//! - `Mode::Regexp`: 전용 Grok 식 (`SYSLOG_RFC5424`, `SYSLOG_RFC3164`,
//!   `SYSLOG_DATE_BSD`, `SYSLOG_DATE_PLAIN`, `SYSLOG_DATE_ISO`)
//!
//! 두 방식은 같은 입력에 대해 같은 필드 값을 냅니다.
//!
//! # 사용 예시
//! ```
//! use lognorm_engine::syslog::{Standard, SysLog};
//!
//! let mut log = SysLog::new();
//! assert!(log.parse("<34>Oct 11 22:14:15 mymachine su: 'su root' failed"));
//! assert_eq!(log.std(), Standard::Rfc3164);
//! assert_eq!(log.category(), 4);
//! assert_eq!(log.importance(), 2);
//! assert_eq!(log.host(), Some("mymachine"));
//! ```

mod extract;
mod native;
mod regexp;
mod sd;
mod timestamp;

pub use sd::StructuredData;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use lognorm_core::Document;
use lognorm_core::config::{DEFAULT_DATE_FORMAT, SyslogConfig};
use lognorm_core::metrics as m;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::EngineError;
use extract::{FieldExtractor, RawFields};
use native::NativeExtractor;
use regexp::RegexExtractor;

/// 최대 PRI 값 (facility 23 * 8 + severity 7)
const MAX_PRI: u8 = 191;

/// 기본 VERSION
const DEFAULT_VERSION: u8 = 1;

/// RFC 3164 타임스탬프 출력 형식
const BSD_DATE_FORMAT: &str = "%b %e %H:%M:%S";

/// SysLog 표준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Standard {
    /// 자동 감지 (파싱 후에는 "감지 안 됨"을 뜻함)
    #[default]
    Auto,
    /// BSD syslog
    Rfc3164,
    /// IETF syslog
    Rfc5424,
}

impl Standard {
    /// 문자열에서 표준을 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "rfc3164" | "3164" | "bsd" => Some(Self::Rfc3164),
            "rfc5424" | "5424" | "ietf" => Some(Self::Rfc5424),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Rfc3164 => "rfc3164",
            Self::Rfc5424 => "rfc5424",
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 필드 추출 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// 직접 스캔
    #[default]
    Native,
    /// Grok 식
    Regexp,
}

impl Mode {
    /// 문자열에서 방식을 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "native" => Some(Self::Native),
            "regexp" | "regex" => Some(Self::Regexp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Regexp => "regexp",
        }
    }

    fn extractor(self) -> &'static dyn FieldExtractor {
        match self {
            Self::Native => &NativeExtractor,
            Self::Regexp => &RegexExtractor,
        }
    }
}

/// 파싱 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseState {
    /// 아직 파싱하지 않음 (또는 `clear()` 이후)
    #[default]
    Unparsed,
    /// 파싱 성공 또는 `load()`로 채워짐
    Parsed,
    /// 어떤 프레이밍에도 맞지 않음
    Failed,
}

/// SysLog 레코드
///
/// `&mut self`로 파싱하므로 한 인스턴스를 여러 스레드가 동시에 수정할 수 없습니다.
/// 공유가 필요하면 호출자가 `Mutex`로 감쌉니다.
#[derive(Debug, Clone, PartialEq)]
pub struct SysLog {
    standard: Standard,
    mode: Mode,
    max_input_size: usize,
    format: String,

    detected: Standard,
    state: ParseState,
    pri: u8,
    version: u8,
    timestamp: Option<DateTime<Utc>>,
    host: Option<String>,
    app: Option<String>,
    pid: Option<u32>,
    msgid: Option<String>,
    message: String,
    sd: StructuredData,
}

impl SysLog {
    /// 기본 설정(AUTO, NATIVE)으로 빈 레코드를 생성합니다.
    pub fn new() -> Self {
        let defaults = SyslogConfig::default();
        Self {
            standard: Standard::Auto,
            mode: Mode::Native,
            max_input_size: defaults.max_input_size,
            format: DEFAULT_DATE_FORMAT.to_owned(),
            detected: Standard::Auto,
            state: ParseState::Unparsed,
            pri: 0,
            version: DEFAULT_VERSION,
            timestamp: None,
            host: None,
            app: None,
            pid: None,
            msgid: None,
            message: String::new(),
            sd: StructuredData::new(),
        }
    }

    /// 설정으로 빈 레코드를 생성합니다.
    pub fn with_config(config: &SyslogConfig) -> Result<Self, EngineError> {
        let standard =
            Standard::from_str_loose(&config.standard).ok_or_else(|| EngineError::Config {
                field: "syslog.standard".to_owned(),
                reason: format!("unknown standard '{}'", config.standard),
            })?;
        let mode = Mode::from_str_loose(&config.mode).ok_or_else(|| EngineError::Config {
            field: "syslog.mode".to_owned(),
            reason: format!("unknown mode '{}'", config.mode),
        })?;
        if !timestamp::is_valid_format(&config.date_format) {
            return Err(EngineError::Config {
                field: "syslog.date_format".to_owned(),
                reason: format!("invalid strftime format '{}'", config.date_format),
            });
        }
        if config.max_input_size == 0 {
            return Err(EngineError::Config {
                field: "syslog.max_input_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(Self {
            standard,
            mode,
            max_input_size: config.max_input_size,
            format: config.date_format.clone(),
            ..Self::new()
        })
    }

    /// 파싱 표준을 설정합니다.
    pub fn with_standard(mut self, standard: Standard) -> Self {
        self.standard = standard;
        self
    }

    /// 추출 방식을 설정합니다.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    // --- 파싱 ---

    /// 설정된 표준으로 한 줄을 파싱합니다.
    ///
    /// 이전 필드는 모두 지워집니다. 실패하면 상태가 `Failed`가 되고
    /// 필드는 기본값으로 남습니다.
    pub fn parse(&mut self, line: &str) -> bool {
        self.parse_as(line, self.standard)
    }

    /// 지정한 표준으로 한 줄을 파싱합니다.
    pub fn parse_as(&mut self, line: &str, standard: Standard) -> bool {
        self.clear();

        if line.len() > self.max_input_size {
            warn!(
                size = line.len(),
                max = self.max_input_size,
                "syslog input too large, rejecting"
            );
            return self.fail();
        }

        let line = line.trim();
        let extractor = self.mode.extractor();
        let candidates: &[Standard] = match standard {
            Standard::Auto => &[Standard::Rfc5424, Standard::Rfc3164],
            Standard::Rfc5424 => &[Standard::Rfc5424],
            Standard::Rfc3164 => &[Standard::Rfc3164],
        };

        for &candidate in candidates {
            let raw = match candidate {
                Standard::Rfc5424 => extractor.rfc5424(line),
                _ => extractor.rfc3164(line),
            };
            if let Some(raw) = raw {
                if self.apply(candidate, raw, extractor) {
                    debug!(
                        standard = candidate.as_str(),
                        mode = self.mode.as_str(),
                        "detected syslog framing"
                    );
                    metrics::counter!(m::SYSLOG_PARSED_TOTAL, m::LABEL_STANDARD => candidate.as_str())
                        .increment(1);
                    return true;
                }
            }
        }

        debug!(mode = self.mode.as_str(), "no syslog framing matched");
        self.fail()
    }

    fn fail(&mut self) -> bool {
        self.clear();
        self.state = ParseState::Failed;
        metrics::counter!(m::SYSLOG_FAILURES_TOTAL).increment(1);
        false
    }

    /// 원시 필드를 검증하고 적용합니다. 검증에 실패하면 아무것도 바꾸지 않습니다.
    fn apply(&mut self, standard: Standard, raw: RawFields, extractor: &dyn FieldExtractor) -> bool {
        let Some(pri) = raw.pri.parse::<u8>().ok().filter(|p| *p <= MAX_PRI) else {
            debug!(pri = raw.pri.as_str(), "syslog priority out of range");
            return false;
        };
        let version = match raw.version.as_deref() {
            Some(v) => match v.parse::<u8>() {
                Ok(v) => v,
                Err(_) => {
                    debug!(version = v, "syslog version out of range");
                    return false;
                }
            },
            None => DEFAULT_VERSION,
        };

        self.timestamp = raw.timestamp.as_deref().and_then(|text| {
            let parsed = extractor
                .date_kind(text)
                .and_then(|kind| timestamp::parse(kind, text));
            if parsed.is_none() {
                debug!(timestamp = text, "unparseable syslog timestamp, dropping");
            }
            parsed
        });

        self.detected = standard;
        self.state = ParseState::Parsed;
        self.pri = pri;
        self.version = version;
        self.host = raw.host.and_then(nil);
        self.app = raw.app.and_then(nil);
        self.pid = raw.pid.and_then(|p| p.parse().ok());
        self.msgid = raw.msgid.and_then(nil);
        self.sd = raw.sd.as_deref().map(sd::parse).unwrap_or_default();
        self.message = raw.message.unwrap_or_default();
        true
    }

    /// 모든 필드를 기본값으로 되돌립니다. 표준/방식/날짜 형식 설정은 유지됩니다.
    pub fn clear(&mut self) {
        self.detected = Standard::Auto;
        self.state = ParseState::Unparsed;
        self.pri = 0;
        self.version = DEFAULT_VERSION;
        self.timestamp = None;
        self.host = None;
        self.app = None;
        self.pid = None;
        self.msgid = None;
        self.message.clear();
        self.sd.clear();
    }

    // --- 접근자 ---

    /// 감지된 표준. 감지되지 않았으면 `Standard::Auto`.
    pub fn std(&self) -> Standard {
        self.detected
    }

    /// 파싱에 사용할 표준 설정
    pub fn requested_standard(&self) -> Standard {
        self.standard
    }

    pub fn set_standard(&mut self, standard: Standard) {
        self.standard = standard;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn pri(&self) -> u8 {
        self.pri
    }

    /// facility (`pri / 8`)
    pub fn category(&self) -> u8 {
        self.pri >> 3
    }

    /// severity (`pri % 8`)
    pub fn importance(&self) -> u8 {
        self.pri & 0x07
    }

    /// `pri = category * 8 + importance`로 설정합니다. 범위 밖이면 `false`.
    pub fn set_pri(&mut self, category: u8, importance: u8) -> bool {
        if category > MAX_PRI >> 3 || importance > 7 {
            return false;
        }
        self.pri = category * 8 + importance;
        true
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// VERSION은 0일 수 없습니다.
    pub fn set_version(&mut self, version: u8) -> bool {
        if version == 0 {
            return false;
        }
        self.version = version;
        true
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: Option<DateTime<Utc>>) {
        self.timestamp = timestamp;
    }

    /// 설정된 날짜 출력 형식
    pub fn format(&self) -> &str {
        &self.format
    }

    /// 날짜 출력 형식을 바꿉니다. 잘못된 strftime 형식이면 `false`.
    pub fn set_format(&mut self, format: &str) -> bool {
        if !timestamp::is_valid_format(format) {
            warn!(format, "invalid syslog date format, keeping previous");
            return false;
        }
        self.format = format.to_owned();
        true
    }

    /// 타임스탬프를 지정한 형식으로 출력합니다.
    pub fn date(&self, format: &str) -> Option<String> {
        self.timestamp
            .as_ref()
            .and_then(|ts| timestamp::render(ts, format))
    }

    /// 지정한 형식의 텍스트로 타임스탬프를 설정합니다.
    pub fn set_date(&mut self, text: &str, format: &str) -> bool {
        match timestamp::parse_with_format(text, format) {
            Some(ts) => {
                self.timestamp = Some(ts);
                true
            }
            None => false,
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// 빈 문자열이나 `-`는 "없음"입니다.
    pub fn set_host(&mut self, host: &str) {
        self.host = nil(host.to_owned());
    }

    pub fn application(&self) -> Option<&str> {
        self.app.as_deref()
    }

    pub fn set_application(&mut self, app: &str) {
        self.app = nil(app.to_owned());
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn set_pid(&mut self, pid: Option<u32>) {
        self.pid = pid;
    }

    pub fn msgid(&self) -> Option<&str> {
        self.msgid.as_deref()
    }

    pub fn set_msgid(&mut self, msgid: &str) {
        self.msgid = nil(msgid.to_owned());
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: &str) {
        self.message = message.to_owned();
    }

    // --- Structured Data ---

    /// 전체 Structured Data
    pub fn structured_data(&self) -> &StructuredData {
        &self.sd
    }

    pub fn has_sd(&self, id: &str) -> bool {
        self.sd.contains_key(id)
    }

    pub fn has_sd_param(&self, id: &str, key: &str) -> bool {
        self.sd.get(id).is_some_and(|block| block.contains_key(key))
    }

    pub fn sd(&self, id: &str, key: &str) -> Option<&str> {
        self.sd.get(id)?.get(key).map(String::as_str)
    }

    pub fn sd_block(&self, id: &str) -> Option<&BTreeMap<String, String>> {
        self.sd.get(id)
    }

    /// SD 블록에 파라미터를 합칩니다. 빈 id는 무시합니다.
    pub fn set_sd<I, K, V>(&mut self, id: &str, params: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if id.is_empty() || id.contains(char::is_whitespace) {
            return false;
        }
        self.sd
            .entry(id.to_owned())
            .or_default()
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        true
    }

    // --- 직렬화 ---

    /// 현재 필드로 SysLog 줄을 만듭니다.
    ///
    /// 감지된 표준, 없으면 설정된 표준, 둘 다 AUTO면 RFC 5424로 씁니다.
    pub fn syslog(&self) -> String {
        let standard = match (self.detected, self.standard) {
            (Standard::Auto, Standard::Auto) => Standard::Rfc5424,
            (Standard::Auto, requested) => requested,
            (detected, _) => detected,
        };
        match standard {
            Standard::Rfc3164 => self.rfc3164_line(),
            _ => self.rfc5424_line(),
        }
    }

    fn rfc5424_line(&self) -> String {
        let timestamp = self
            .timestamp
            .as_ref()
            .map(|ts| timestamp::render(ts, &self.format).unwrap_or_else(|| timestamp::to_rfc3339(ts)))
            .unwrap_or_else(|| "-".to_owned());
        let pid = self
            .pid
            .map_or_else(|| "-".to_owned(), |pid| pid.to_string());

        let mut line = format!(
            "<{}>{} {} {} {} {} {} {}",
            self.pri,
            self.version,
            timestamp,
            self.host.as_deref().unwrap_or("-"),
            self.app.as_deref().unwrap_or("-"),
            pid,
            self.msgid.as_deref().unwrap_or("-"),
            sd::render(&self.sd),
        );
        if !self.message.is_empty() {
            line.push(' ');
            line.push_str(&self.message);
        }
        line
    }

    /// RFC 3164 HOSTNAME은 TIMESTAMP 뒤에만 올 수 있으므로, 타임스탬프가 없으면
    /// 호스트도 쓰지 않습니다.
    fn rfc3164_line(&self) -> String {
        let mut line = format!("<{}>", self.pri);

        if let Some(ts) = self.timestamp {
            line.push_str(&timestamp::render(&ts, BSD_DATE_FORMAT).unwrap_or_default());
            if ts.year() != Utc::now().year() {
                line.push(' ');
                line.push_str(&ts.year().to_string());
            }
            line.push(' ');
            line.push_str(self.host.as_deref().unwrap_or("-"));
            line.push(' ');
        }

        if let Some(app) = &self.app {
            line.push_str(app);
            if let Some(pid) = self.pid {
                line.push_str(&format!("[{pid}]"));
            }
            line.push_str(": ");
        }

        line.push_str(&self.message);
        line
    }

    // --- 문서 변환 ---

    /// 필드를 문서로 내보냅니다. 값이 없는 선택 필드는 생략합니다.
    pub fn dump(&self) -> Document {
        let mut map = Map::new();
        if self.detected != Standard::Auto {
            map.insert("std".to_owned(), Value::from(self.detected.as_str()));
        }
        map.insert("pri".to_owned(), Value::from(self.pri));
        map.insert("ver".to_owned(), Value::from(self.version));
        if let Some(ts) = &self.timestamp {
            map.insert("timestamp".to_owned(), Value::from(timestamp::to_rfc3339(ts)));
        }
        if let Some(host) = &self.host {
            map.insert("host".to_owned(), Value::from(host.as_str()));
        }
        if let Some(app) = &self.app {
            map.insert("app".to_owned(), Value::from(app.as_str()));
        }
        if let Some(pid) = self.pid {
            map.insert("pid".to_owned(), Value::from(pid));
        }
        if let Some(msgid) = &self.msgid {
            map.insert("msgid".to_owned(), Value::from(msgid.as_str()));
        }
        if !self.sd.is_empty() {
            let sd = self
                .sd
                .iter()
                .map(|(id, params)| {
                    let params = params
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                        .collect::<Map<_, _>>();
                    (id.clone(), Value::Object(params))
                })
                .collect::<Map<_, _>>();
            map.insert("sd".to_owned(), Value::Object(sd));
        }
        if !self.message.is_empty() {
            map.insert("message".to_owned(), Value::from(self.message.as_str()));
        }
        map.insert("format".to_owned(), Value::from(self.format.as_str()));
        Value::Object(map)
    }

    /// `dump()`과 같은 모양의 문서로 필드를 채웁니다.
    ///
    /// 빠진 키는 기본값으로 둡니다. 잘못된 값은 건너뛰고 `false`를 반환하지만
    /// 나머지 필드는 적용됩니다. 객체가 아니면 아무것도 바꾸지 않습니다.
    pub fn load(&mut self, document: &Document) -> bool {
        let Some(map) = document.as_object() else {
            warn!("syslog document is not an object, ignoring");
            return false;
        };

        self.clear();
        let mut ok = true;
        let mut reject = |key: &str| {
            warn!(key, "invalid syslog document field, skipping");
            ok = false;
        };

        if let Some(value) = map.get("std") {
            match value.as_str().and_then(Standard::from_str_loose) {
                Some(standard) => self.detected = standard,
                None => reject("std"),
            }
        }
        if let Some(value) = map.get("pri") {
            match integer::<u8>(value).filter(|p| *p <= MAX_PRI) {
                Some(pri) => self.pri = pri,
                None => reject("pri"),
            }
        }
        if let Some(value) = map.get("ver") {
            match integer::<u8>(value).filter(|v| *v != 0) {
                Some(version) => self.version = version,
                None => reject("ver"),
            }
        }
        if let Some(value) = map.get("timestamp") {
            match document_timestamp(value) {
                Some(ts) => self.timestamp = Some(ts),
                None => reject("timestamp"),
            }
        }
        if let Some(value) = map.get("pid") {
            match integer::<u32>(value) {
                Some(pid) => self.pid = Some(pid),
                None if value.is_null() => {}
                None => reject("pid"),
            }
        }
        for (key, slot) in [
            ("host", &mut self.host),
            ("app", &mut self.app),
            ("msgid", &mut self.msgid),
        ] {
            match map.get(key) {
                Some(Value::String(s)) => *slot = nil(s.clone()),
                Some(Value::Null) | None => {}
                Some(_) => reject(key),
            }
        }
        match map.get("message") {
            Some(Value::String(s)) => self.message = s.clone(),
            Some(Value::Null) | None => {}
            Some(_) => reject("message"),
        }
        if let Some(value) = map.get("sd") {
            match document_sd(value) {
                Some(sd) => self.sd = sd,
                None => reject("sd"),
            }
        }
        if let Some(value) = map.get("format") {
            match value.as_str().filter(|f| timestamp::is_valid_format(f)) {
                Some(format) => self.format = format.to_owned(),
                None => reject("format"),
            }
        }

        self.state = ParseState::Parsed;
        ok
    }
}

impl Default for SysLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SysLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.syslog())
    }
}

impl FromStr for SysLog {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut log = Self::new();
        if log.parse(s) {
            Ok(log)
        } else {
            Err(EngineError::Framing(format!(
                "no rfc5424 or rfc3164 framing matched ({} bytes)",
                s.len()
            )))
        }
    }
}

/// 빈 문자열과 NILVALUE(`-`)는 `None`
fn nil(value: String) -> Option<String> {
    if value.is_empty() || value == "-" {
        None
    } else {
        Some(value)
    }
}

/// 숫자 또는 숫자 문자열
fn integer<T: TryFrom<u64> + FromStr>(value: &Value) -> Option<T> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| T::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// RFC 3339 문자열 또는 epoch 초
fn document_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => {
            let millis = if let Some(secs) = n.as_i64() {
                secs.checked_mul(1000)?
            } else {
                let secs = n.as_f64()?;
                if !secs.is_finite() {
                    return None;
                }
                (secs * 1000.0) as i64
            };
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

/// `{ id: { key: value } }` 모양의 문서. 문자열이 아닌 스칼라 값은 문자열로 바꿉니다.
fn document_sd(value: &Value) -> Option<StructuredData> {
    let blocks = value.as_object()?;
    let mut sd = StructuredData::new();
    for (id, params) in blocks {
        if id.is_empty() {
            continue;
        }
        let params = params.as_object()?;
        let block = sd.entry(id.clone()).or_default();
        for (key, value) in params {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(_) | Value::Bool(_) => value.to_string(),
                _ => return None,
            };
            block.insert(key.clone(), text);
        }
    }
    Some(sd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const RFC3164_EXAMPLE: &str = "<34>Oct 11 22:14:15 mymachine su: 'su root' failed";
    const RFC5424_EXAMPLE: &str = r#"<165>1 2003-10-11T22:14:15.003Z mymachine.example.com evntslog - ID47 [exampleSDID@32473 iut="3" eventSource="Application"] An application event log entry"#;

    fn both_modes() -> [SysLog; 2] {
        [
            SysLog::new().with_mode(Mode::Native),
            SysLog::new().with_mode(Mode::Regexp),
        ]
    }

    #[test]
    fn rfc3164_priority_decode() {
        for mut log in both_modes() {
            assert!(log.parse(RFC3164_EXAMPLE));
            assert_eq!(log.std(), Standard::Rfc3164);
            assert_eq!(log.state(), ParseState::Parsed);
            assert_eq!(log.pri(), 34);
            assert_eq!(log.category(), 4);
            assert_eq!(log.importance(), 2);
            assert_eq!(log.host(), Some("mymachine"));
            assert_eq!(log.application(), Some("su"));
            assert_eq!(log.pid(), None);
            assert_eq!(log.message(), "'su root' failed");
            let ts = log.timestamp().unwrap();
            assert_eq!((ts.month(), ts.day(), ts.hour()), (10, 11, 22));
        }
    }

    #[test]
    fn rfc5424_example() {
        for mut log in both_modes() {
            assert!(log.parse(RFC5424_EXAMPLE));
            assert_eq!(log.std(), Standard::Rfc5424);
            assert_eq!(log.pri(), 165);
            assert_eq!(log.category(), 20);
            assert_eq!(log.importance(), 5);
            assert_eq!(log.version(), 1);
            assert_eq!(log.host(), Some("mymachine.example.com"));
            assert_eq!(log.application(), Some("evntslog"));
            assert_eq!(log.pid(), None);
            assert_eq!(log.msgid(), Some("ID47"));
            assert!(log.has_sd("exampleSDID@32473"));
            assert_eq!(log.sd("exampleSDID@32473", "iut"), Some("3"));
            assert_eq!(
                log.sd("exampleSDID@32473", "eventSource"),
                Some("Application")
            );
            assert!(log.has_sd_param("exampleSDID@32473", "iut"));
            assert!(!log.has_sd_param("exampleSDID@32473", "missing"));
            assert_eq!(log.message(), "An application event log entry");
            assert_eq!(
                log.date("%Y-%m-%d %H:%M:%S%.3f").as_deref(),
                Some("2003-10-11 22:14:15.003")
            );
        }
    }

    #[test]
    fn rfc3164_with_year_and_pid() {
        let mut log = SysLog::new();
        assert!(log.parse("<13>Oct 11 22:14:15 2003 host sshd[42]: hello"));
        assert_eq!(log.timestamp().unwrap().year(), 2003);
        assert_eq!(log.pid(), Some(42));
        assert_eq!(log.application(), Some("sshd"));
    }

    #[test]
    fn rfc3164_plain_and_iso_dates() {
        let mut log = SysLog::new().with_standard(Standard::Rfc3164);
        assert!(log.parse("<13>2003-10-11 22:14:15 host app: m"));
        assert_eq!(log.date("%Y-%m-%d %H:%M:%S").as_deref(), Some("2003-10-11 22:14:15"));

        assert!(log.parse("<13>2003-10-11T22:14:15.123Z host app: m"));
        assert_eq!(log.timestamp().unwrap().nanosecond(), 123_000_000);
    }

    #[test]
    fn auto_falls_back_to_rfc3164() {
        let mut log = SysLog::new();
        assert!(log.parse("<13>not really structured"));
        assert_eq!(log.std(), Standard::Rfc3164);
        assert_eq!(log.host(), None);
        assert_eq!(log.message(), "not really structured");
    }

    #[test]
    fn forced_standard_does_not_fall_back() {
        let mut log = SysLog::new().with_standard(Standard::Rfc5424);
        assert!(!log.parse(RFC3164_EXAMPLE));
        assert_eq!(log.state(), ParseState::Failed);
        assert_eq!(log.std(), Standard::Auto);
    }

    #[test]
    fn failure_resets_fields() {
        let mut log = SysLog::new();
        assert!(log.parse(RFC5424_EXAMPLE));
        assert!(!log.parse("no priority here"));
        assert_eq!(log.state(), ParseState::Failed);
        assert_eq!(log.std(), Standard::Auto);
        assert_eq!(log.pri(), 0);
        assert_eq!(log.host(), None);
        assert!(log.structured_data().is_empty());
        assert!(log.message().is_empty());
    }

    #[test]
    fn invalid_priorities_fail() {
        let mut log = SysLog::new();
        assert!(!log.parse("<192>Oct 11 22:14:15 host app: m"));
        assert!(!log.parse("<999>1 - - - - -"));
        assert!(!log.parse("<>msg"));
        assert!(!log.parse("<-1>msg"));
        assert!(!log.parse(""));
        assert!(!log.parse("   "));
        assert!(log.parse("<191>1 - - - - -"));
        assert!(log.parse("<0>msg"));
    }

    #[test]
    fn rfc5424_nilvalues_are_absent() {
        let mut log = SysLog::new();
        assert!(log.parse("<14>1 - - - - - -"));
        assert_eq!(log.std(), Standard::Rfc5424);
        assert_eq!(log.timestamp(), None);
        assert_eq!(log.host(), None);
        assert_eq!(log.application(), None);
        assert_eq!(log.pid(), None);
        assert_eq!(log.msgid(), None);
        assert!(log.structured_data().is_empty());
        assert!(log.message().is_empty());
    }

    #[test]
    fn rfc5424_large_version_fails_over_to_3164() {
        let mut log = SysLog::new();
        // VERSION 999는 u8 범위 밖이라 5424 적용이 실패하고 3164로 해석됨
        assert!(log.parse("<14>999 - h a p m"));
        assert_eq!(log.std(), Standard::Rfc3164);
        assert_eq!(log.message(), "999 - h a p m");
    }

    #[test]
    fn invalid_timestamp_text_is_dropped() {
        let mut log = SysLog::new();
        assert!(log.parse("<14>1 2003-13-45T22:14:15Z host app - - - msg"));
        assert_eq!(log.timestamp(), None);
        assert_eq!(log.host(), Some("host"));
    }

    #[test]
    fn too_large_input_fails() {
        let config = SyslogConfig {
            max_input_size: 16,
            ..SyslogConfig::default()
        };
        let mut log = SysLog::with_config(&config).unwrap();
        assert!(!log.parse(RFC3164_EXAMPLE));
        assert_eq!(log.state(), ParseState::Failed);
    }

    #[test]
    fn with_config_rejects_bad_values() {
        let bad = [
            SyslogConfig {
                standard: "rfc9999".to_owned(),
                ..SyslogConfig::default()
            },
            SyslogConfig {
                mode: "magic".to_owned(),
                ..SyslogConfig::default()
            },
            SyslogConfig {
                date_format: "%Q".to_owned(),
                ..SyslogConfig::default()
            },
            SyslogConfig {
                max_input_size: 0,
                ..SyslogConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                SysLog::with_config(&config),
                Err(EngineError::Config { .. })
            ));
        }
    }

    #[test]
    fn with_config_applies_values() {
        let config = SyslogConfig {
            standard: "rfc3164".to_owned(),
            mode: "regexp".to_owned(),
            date_format: "%Y".to_owned(),
            max_input_size: 1024,
        };
        let log = SysLog::with_config(&config).unwrap();
        assert_eq!(log.requested_standard(), Standard::Rfc3164);
        assert_eq!(log.mode(), Mode::Regexp);
        assert_eq!(log.format(), "%Y");
    }

    #[test]
    fn rfc5424_round_trip() {
        let mut log = SysLog::new();
        assert!(log.parse(RFC5424_EXAMPLE));
        // SD 파라미터는 이름 순으로 출력됨
        let line = log.syslog();
        assert_eq!(
            line,
            r#"<165>1 2003-10-11T22:14:15.003Z mymachine.example.com evntslog - ID47 [exampleSDID@32473 eventSource="Application" iut="3"] An application event log entry"#
        );

        let mut again = SysLog::new();
        assert!(again.parse(&line));
        assert_eq!(again, log);
    }

    #[test]
    fn rfc3164_round_trip() {
        let mut log = SysLog::new();
        assert!(log.parse("<13>Feb  5 17:32:18 2019 10.0.0.99 sshd[4123]: Accepted password"));
        let line = log.syslog();
        assert_eq!(line, "<13>Feb  5 17:32:18 2019 10.0.0.99 sshd[4123]: Accepted password");

        let mut again = SysLog::new();
        assert!(again.parse(&line));
        assert_eq!(again, log);
    }

    #[test]
    fn syslog_uses_configured_date_format() {
        let mut log = SysLog::new();
        assert!(log.parse(RFC5424_EXAMPLE));
        assert!(log.set_format("%Y-%m-%dT%H:%M:%SZ"));
        assert!(log.syslog().starts_with("<165>1 2003-10-11T22:14:15Z "));
        assert!(!log.set_format("%Q"));
        assert_eq!(log.format(), "%Y-%m-%dT%H:%M:%SZ");
    }

    #[test]
    fn built_from_setters() {
        let mut log = SysLog::new();
        assert!(log.set_pri(4, 2));
        assert!(!log.set_pri(24, 0));
        assert!(!log.set_pri(0, 8));
        assert!(log.set_date("2020-01-02 03:04:05", "%Y-%m-%d %H:%M:%S"));
        log.set_host("web01");
        log.set_application("nginx");
        log.set_pid(Some(7));
        log.set_msgid("-");
        log.set_message("started");
        assert!(log.set_sd("meta@1", [("k", "v\"q")]));
        assert!(!log.set_sd("", [("k", "v")]));

        assert_eq!(
            log.syslog(),
            r#"<34>1 2020-01-02T03:04:05.000Z web01 nginx 7 - [meta@1 k="v\"q"] started"#
        );
    }

    #[test]
    fn set_sd_merges() {
        let mut log = SysLog::new();
        log.set_sd("a", [("x", "1")]);
        log.set_sd("a", [("y", "2")]);
        assert_eq!(log.sd_block("a").map(BTreeMap::len), Some(2));
    }

    #[test]
    fn rfc3164_rendering_without_timestamp_or_host() {
        let mut log = SysLog::new().with_standard(Standard::Rfc3164);
        log.set_application("cron");
        log.set_message("tick");
        assert_eq!(log.syslog(), "<0>cron: tick");
    }

    #[test]
    fn backslash_in_sd_id_is_part_of_the_id() {
        for mut log in both_modes() {
            assert!(log.parse(r"<14>1 - h a p m [a\] msg"));
            assert!(log.has_sd(r"a\"));
            assert_eq!(log.message(), "msg");

            let again: SysLog = log.syslog().parse().unwrap();
            assert_eq!(again, log);
        }
    }

    #[test]
    fn rfc3164_host_without_timestamp_does_not_invent_date() {
        let mut log = SysLog::new();
        assert!(log.load(&serde_json::json!({
            "std": "rfc3164",
            "pri": 13,
            "host": "web01",
            "app": "cron",
            "message": "tick"
        })));
        assert_eq!(log.timestamp(), None);
        assert_eq!(log.syslog(), "<13>cron: tick");

        for mode in [Mode::Native, Mode::Regexp] {
            let mut again = SysLog::new().with_mode(mode);
            assert!(again.parse(&log.syslog()));
            assert_eq!(again.std(), Standard::Rfc3164);
            assert_eq!(again.timestamp(), None);
            assert_eq!(again.host(), None);
            assert_eq!(again.application(), Some("cron"));
            assert_eq!(again.message(), "tick");
        }
    }

    #[test]
    fn dump_and_load() {
        let mut log = SysLog::new();
        assert!(log.parse(RFC5424_EXAMPLE));
        let doc = log.dump();
        assert_eq!(doc["std"], "rfc5424");
        assert_eq!(doc["pri"], 165);
        assert_eq!(doc["ver"], 1);
        assert_eq!(doc["timestamp"], "2003-10-11T22:14:15.003Z");
        assert_eq!(doc["msgid"], "ID47");
        assert_eq!(doc["sd"]["exampleSDID@32473"]["iut"], "3");
        assert!(doc.get("pid").is_none());

        let mut restored = SysLog::new();
        assert!(restored.load(&doc));
        assert_eq!(restored, log);
    }

    #[test]
    fn load_tolerates_missing_and_loose_values() {
        let mut log = SysLog::new();
        let doc = serde_json::json!({
            "pri": "13",
            "pid": 99,
            "timestamp": 1_065_910_455,
            "sd": { "id": { "n": 5, "b": true } }
        });
        assert!(log.load(&doc));
        assert_eq!(log.pri(), 13);
        assert_eq!(log.pid(), Some(99));
        assert_eq!(log.timestamp().unwrap().year(), 2003);
        assert_eq!(log.sd("id", "n"), Some("5"));
        assert_eq!(log.sd("id", "b"), Some("true"));
        assert_eq!(log.host(), None);
        assert_eq!(log.version(), 1);
    }

    #[test]
    fn load_reports_bad_fields() {
        let mut log = SysLog::new();
        let doc = serde_json::json!({ "pri": 500, "host": ["x"], "message": "kept" });
        assert!(!log.load(&doc));
        assert_eq!(log.pri(), 0);
        assert_eq!(log.message(), "kept");
        assert!(!log.load(&serde_json::json!("not an object")));
    }

    #[test]
    fn display_and_from_str() {
        let log: SysLog = RFC3164_EXAMPLE.parse().unwrap();
        assert_eq!(log.std(), Standard::Rfc3164);
        let reparsed: SysLog = log.to_string().parse().unwrap();
        assert_eq!(reparsed, log);
        assert!(matches!(
            "garbage".parse::<SysLog>(),
            Err(EngineError::Framing(_))
        ));
    }

    #[test]
    fn clone_and_eq_cover_all_fields() {
        let mut a = SysLog::new();
        assert!(a.parse(RFC5424_EXAMPLE));
        let mut b = a.clone();
        assert_eq!(a, b);
        b.set_sd("exampleSDID@32473", [("iut", "4")]);
        assert_ne!(a, b);
    }

    #[test]
    fn clear_keeps_configuration() {
        let mut log = SysLog::new().with_mode(Mode::Regexp);
        assert!(log.set_format("%Y"));
        assert!(log.parse(RFC5424_EXAMPLE));
        log.clear();
        assert_eq!(log.state(), ParseState::Unparsed);
        assert_eq!(log.mode(), Mode::Regexp);
        assert_eq!(log.format(), "%Y");
        assert!(log.message().is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn token() -> impl Strategy<Value = String> {
            "[A-Za-z0-9._-]{1,12}"
        }

        fn rfc5424_line() -> impl Strategy<Value = String> {
            (
                0u8..=191,
                1u8..=9,
                prop::option::of((1990i32..2030, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60, 0u32..1000)),
                token(),
                token(),
                prop::option::of(0u32..100_000),
                token(),
                prop::option::of((token(), token(), "[ -~]{0,10}")),
                "[ -~]{0,40}",
            )
                .prop_map(|(pri, ver, ts, host, app, pid, msgid, sd, msg)| {
                    let ts = ts.map_or_else(
                        || "-".to_owned(),
                        |(y, mo, d, h, mi, s, ms)| {
                            format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}.{ms:03}Z")
                        },
                    );
                    let pid = pid.map_or_else(|| "-".to_owned(), |p| p.to_string());
                    let sd = sd.map_or_else(
                        || "-".to_owned(),
                        |(id, key, value)| {
                            let escaped: String = value
                                .chars()
                                .flat_map(|c| {
                                    let escape = matches!(c, '"' | '\\' | ']');
                                    escape.then_some('\\').into_iter().chain(std::iter::once(c))
                                })
                                .collect();
                            format!("[{id} {key}=\"{escaped}\"]")
                        },
                    );
                    format!("<{pri}>{ver} {ts} {host} {app} {pid} {msgid} {sd} {msg}")
                })
        }

        fn rfc3164_line() -> impl Strategy<Value = String> {
            (
                0u8..=191,
                prop::sample::select(vec!["Jan", "Feb", "Mar", "Oct", "Dec"]),
                1u32..=28,
                0u32..24,
                0u32..60,
                prop::option::of(1990i32..2030),
                token(),
                prop::option::of(("[a-z]{1,8}", prop::option::of(0u32..100_000))),
                "[ -~]{0,40}",
            )
                .prop_map(|(pri, mon, day, h, mi, year, host, tag, msg)| {
                    let year = year.map(|y| format!(" {y}")).unwrap_or_default();
                    let tag = tag
                        .map(|(app, pid)| match pid {
                            Some(pid) => format!("{app}[{pid}]: "),
                            None => format!("{app}: "),
                        })
                        .unwrap_or_default();
                    format!("<{pri}>{mon} {day:>2} {h:02}:{mi:02}:00{year} {host} {tag}{msg}")
                })
        }

        fn parse_both(line: &str) -> (SysLog, SysLog) {
            let mut native = SysLog::new().with_mode(Mode::Native);
            let mut regexp = SysLog::new().with_mode(Mode::Regexp);
            let a = native.parse(line);
            let b = regexp.parse(line);
            assert_eq!(a, b, "parse result differs for {line:?}");
            regexp.set_mode(Mode::Native);
            (native, regexp)
        }

        proptest! {
            #[test]
            fn parse_never_panics(input in "\\PC{0,200}") {
                let _ = parse_both(&input);
            }

            #[test]
            fn bracketed_garbage_never_panics(input in "<[0-9]{1,3}>[ -~\\[\\]\"\\\\]{0,80}") {
                let _ = parse_both(&input);
            }

            #[test]
            fn modes_agree_on_rfc5424(line in rfc5424_line()) {
                let (native, regexp) = parse_both(&line);
                prop_assert_eq!(native.std(), Standard::Rfc5424);
                prop_assert_eq!(native, regexp);
            }

            #[test]
            fn modes_agree_on_rfc3164(line in rfc3164_line()) {
                let (native, regexp) = parse_both(&line);
                prop_assert_eq!(native.std(), Standard::Rfc3164);
                prop_assert_eq!(native, regexp);
            }

            #[test]
            fn modes_agree_on_arbitrary_text(input in "\\PC{0,120}") {
                let (native, regexp) = parse_both(&input);
                prop_assert_eq!(native, regexp);
            }

            #[test]
            fn rfc5424_reparse_is_stable(line in rfc5424_line()) {
                let mut first = SysLog::new();
                prop_assert!(first.parse(&line));
                let mut second = SysLog::new();
                prop_assert!(second.parse(&first.syslog()));
                prop_assert_eq!(first, second);
            }
        }
    }
}
