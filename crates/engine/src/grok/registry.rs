//! 패턴 레지스트리: 내장(internal) / 사용자(external) 두 이름 공간

use std::collections::HashMap;

use super::builtin::BUILTIN_PATTERNS;

/// 이름 → 패턴 본문 저장소
///
/// 조회는 external을 먼저 보고 internal로 넘어갑니다. external 패턴은
/// internal을 가릴 수 있지만 제거/초기화는 external에만 적용됩니다.
#[derive(Debug, Default)]
pub(crate) struct PatternRegistry {
    internal: HashMap<String, String>,
    external: HashMap<String, String>,
}

impl PatternRegistry {
    /// 내장 패턴을 적재한 레지스트리를 생성합니다.
    pub(crate) fn with_builtins() -> Self {
        let internal = BUILTIN_PATTERNS
            .iter()
            .map(|(name, body)| ((*name).to_owned(), (*body).to_owned()))
            .collect();
        Self {
            internal,
            external: HashMap::new(),
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&str> {
        self.external
            .get(name)
            .or_else(|| self.internal.get(name))
            .map(String::as_str)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.external.contains_key(name) || self.internal.contains_key(name)
    }

    pub(crate) fn insert_external(&mut self, name: String, body: String) -> Option<String> {
        self.external.insert(name, body)
    }

    pub(crate) fn remove_external(&mut self, name: &str) -> bool {
        self.external.remove(name).is_some()
    }

    pub(crate) fn clear_external(&mut self) {
        self.external.clear();
    }

    pub(crate) fn external_len(&self) -> usize {
        self.external.len()
    }

    pub(crate) fn internal_len(&self) -> usize {
        self.internal.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_shadows_internal() {
        let mut registry = PatternRegistry::with_builtins();
        assert_eq!(registry.lookup("WORD"), Some(r"\b\w+\b"));

        registry.insert_external("WORD".to_owned(), "[a-z]+".to_owned());
        assert_eq!(registry.lookup("WORD"), Some("[a-z]+"));

        assert!(registry.remove_external("WORD"));
        assert_eq!(registry.lookup("WORD"), Some(r"\b\w+\b"));
    }

    #[test]
    fn clear_external_keeps_builtins() {
        let mut registry = PatternRegistry::with_builtins();
        let builtins = registry.internal_len();
        registry.insert_external("MINE".to_owned(), "x".to_owned());
        registry.clear_external();

        assert_eq!(registry.external_len(), 0);
        assert_eq!(registry.internal_len(), builtins);
        assert!(!registry.contains("MINE"));
        assert!(registry.contains("IP"));
    }

    #[test]
    fn remove_cannot_touch_internal() {
        let mut registry = PatternRegistry::with_builtins();
        assert!(!registry.remove_external("IP"));
        assert!(registry.contains("IP"));
    }

    #[test]
    fn empty_registry_has_nothing() {
        let registry = PatternRegistry::default();
        assert_eq!(registry.lookup("IP"), None);
    }
}
