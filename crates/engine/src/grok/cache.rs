//! 컴파일된 패턴 캐시 항목
//!
//! 항목은 전개된 정규식의 내용 해시로 식별됩니다. 같은 식을 요청한 호출자들은
//! 하나의 항목과 하나의 컴파일 결과를 공유합니다.
//!
//! - 컴파일은 항목당 정확히 한 번 (`OnceLock`), 실패도 영구히 기록
//! - 필드 이름 표는 삽입 후 불변 (`Arc<[String]>`), 매칭마다 잠금 없이 참조
//! - id별 추출 상태만 별도 `Mutex`로 보호

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};

use super::variables::Variables;

/// 캐시 id: 전개된 정규식과 필드 이름 표의 64비트 해시
pub type CacheId = u64;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a 64비트 해시
fn fnv1a(hash: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(hash, |acc, &b| {
        (acc ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// 전개 결과의 캐시 id를 계산합니다.
///
/// 프로세스/인스턴스와 무관하게 같은 입력이면 같은 값입니다.
pub(crate) fn cache_id(regex: &str, field_names: &[String]) -> CacheId {
    let mut hash = fnv1a(FNV_OFFSET_BASIS, regex.as_bytes());
    for name in field_names {
        hash = fnv1a(hash, &[0]);
        hash = fnv1a(hash, name.as_bytes());
    }
    hash
}

/// 정규식 컴파일 옵션
#[derive(Debug, Clone, Copy)]
pub(crate) struct CompileOptions {
    pub case_insensitive: bool,
    pub size_limit: usize,
}

impl CompileOptions {
    pub(crate) fn compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(self.case_insensitive)
            .size_limit(self.size_limit)
            .build()
    }
}

/// 캐시 항목
pub(crate) struct CacheEntry {
    id: CacheId,
    expression: String,
    field_names: Arc<[String]>,
    compiled: OnceLock<Result<Regex, String>>,
    state: Mutex<Variables>,
}

impl CacheEntry {
    pub(crate) fn new(id: CacheId, expression: String, field_names: Vec<String>) -> Self {
        Self {
            id,
            expression,
            field_names: field_names.into(),
            compiled: OnceLock::new(),
            state: Mutex::new(Variables::new()),
        }
    }

    pub(crate) fn id(&self) -> CacheId {
        self.id
    }

    pub(crate) fn expression(&self) -> &str {
        &self.expression
    }

    pub(crate) fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// 정규식을 컴파일합니다. 첫 호출만 `compile`을 실행하고 이후에는
    /// 저장된 결과(성공 또는 실패)를 돌려줍니다.
    pub(crate) fn compile_once<F>(&self, compile: F) -> Result<&Regex, &str>
    where
        F: FnOnce(&str) -> Result<Regex, String>,
    {
        self.compiled
            .get_or_init(|| compile(&self.expression))
            .as_ref()
            .map_err(String::as_str)
    }

    /// 컴파일된 정규식 (컴파일 전이거나 실패했으면 `None`)
    pub(crate) fn regex(&self) -> Option<&Regex> {
        self.compiled.get().and_then(|r| r.as_ref().ok())
    }

    /// 컴파일 실패 사유
    pub(crate) fn compile_error(&self) -> Option<&str> {
        self.compiled
            .get()
            .and_then(|r| r.as_ref().err())
            .map(String::as_str)
    }

    /// 텍스트에 매칭하여 추출 결과를 반환합니다. 공유 상태는 건드리지 않습니다.
    ///
    /// 빈 캡처는 필드로 기록하지 않습니다.
    pub(crate) fn extract(&self, text: &str) -> Option<Variables> {
        let regex = self.regex()?;
        let captures = regex.captures(text)?;

        let mut vars = Variables::new();
        for (index, name) in self.field_names.iter().enumerate() {
            if let Some(m) = captures.get(index + 1) {
                if !m.as_str().is_empty() {
                    vars.insert(name, m.as_str());
                }
            }
        }
        Some(vars)
    }

    /// 매칭에 성공하면 id별 상태를 교체합니다. 실패하면 이전 상태를 유지합니다.
    pub(crate) fn parse(&self, text: &str) -> bool {
        match self.extract(text) {
            Some(vars) => {
                *self.state.lock() = vars;
                true
            }
            None => false,
        }
    }

    /// 현재 추출 상태의 사본
    pub(crate) fn snapshot(&self) -> Variables {
        self.state.lock().clone()
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&Variables) -> R) -> R {
        f(&self.state.lock())
    }

    /// 추출 상태만 비웁니다. 컴파일 결과는 유지됩니다.
    pub(crate) fn reset(&self) {
        self.state.lock().clear();
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("id", &format_args!("{:#018x}", self.id))
            .field("expression", &self.expression)
            .field("field_names", &self.field_names)
            .field("compiled", &self.regex().is_some())
            .field("compile_error", &self.compile_error())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn options() -> CompileOptions {
        CompileOptions {
            case_insensitive: false,
            size_limit: 1 << 20,
        }
    }

    fn compiled(expression: &str, fields: &[&str]) -> CacheEntry {
        let fields: Vec<String> = fields.iter().map(|s| (*s).to_owned()).collect();
        let entry = CacheEntry::new(cache_id(expression, &fields), expression.to_owned(), fields);
        let _ = entry.compile_once(|p| options().compile(p).map_err(|e| e.to_string()));
        entry
    }

    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(fnv1a(FNV_OFFSET_BASIS, b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(FNV_OFFSET_BASIS, b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn cache_id_depends_on_field_names() {
        let a = cache_id("([0-9]+)", &["x".to_owned()]);
        let b = cache_id("([0-9]+)", &["y".to_owned()]);
        assert_ne!(a, b);
        assert_eq!(a, cache_id("([0-9]+)", &["x".to_owned()]));
    }

    #[test]
    fn compile_runs_once_even_on_failure() {
        let entry = CacheEntry::new(1, "(unclosed".to_owned(), Vec::new());
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let result = entry.compile_once(|p| {
                calls.fetch_add(1, Ordering::SeqCst);
                options().compile(p).map_err(|e| e.to_string())
            });
            assert!(result.is_err());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(entry.compile_error().is_some());
        assert!(!entry.parse("anything"));
        assert!(format!("{entry:?}").contains("compile_error: Some("));
    }

    #[test]
    fn parse_maps_positional_captures() {
        let entry = compiled(r"([a-z]+)=([0-9]+)", &["key", "value"]);
        assert!(entry.parse("xx port=8080 yy"));
        let vars = entry.snapshot();
        assert_eq!(vars.get("key"), Some("port"));
        assert_eq!(vars.get("value"), Some("8080"));
    }

    #[test]
    fn failed_parse_keeps_previous_state() {
        let entry = compiled(r"id=([0-9]+)", &["id"]);
        assert!(entry.parse("id=7"));
        assert!(!entry.parse("no match here"));
        assert_eq!(entry.snapshot().get("id"), Some("7"));
    }

    #[test]
    fn empty_and_unmatched_groups_are_skipped() {
        let entry = compiled(r"a([0-9]*)b(x)?", &["num", "opt"]);
        assert!(entry.parse("ab"));
        assert!(entry.snapshot().is_empty());
    }

    #[test]
    fn reset_clears_state_only() {
        let entry = compiled(r"([0-9]+)", &["n"]);
        assert!(entry.parse("42"));
        entry.reset();
        assert!(entry.snapshot().is_empty());
        assert!(entry.regex().is_some());
        assert!(entry.parse("43"));
    }

    #[test]
    fn extract_does_not_touch_state() {
        let entry = compiled(r"([0-9]+)", &["n"]);
        let vars = entry.extract("5").unwrap();
        assert_eq!(vars.get("n"), Some("5"));
        assert!(entry.snapshot().is_empty());
    }
}
