//! 추출 결과: 필드 이름 → 값(들)
//!
//! 같은 필드 이름이 여러 캡처 그룹에 붙을 수 있으므로 값은 목록으로 보관합니다.
//! 표시 순서는 알파벳 순이 아니라 첫 등장 순서입니다.

use lognorm_core::Document;
use serde_json::{Map, Value};

/// 한 번의 매칭에서 추출된 필드 집합
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    entries: Vec<(String, Vec<String>)>,
}

impl Variables {
    /// 빈 결과를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 값을 추가합니다. 이미 있는 필드면 값 목록 뒤에 붙입니다.
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some((_, values)) => values.push(value.to_owned()),
            None => self
                .entries
                .push((name.to_owned(), vec![value.to_owned()])),
        }
    }

    /// 필드의 첫 번째 값
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// 필드의 모든 값 (없으면 빈 슬라이스)
    pub fn values(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// 필드 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// 첫 등장 순서의 필드 이름
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// (필드, 값 목록) 순회
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// 필드 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 모든 필드를 제거합니다.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 문서로 변환합니다.
    ///
    /// 값이 하나면 문자열, 반복된 필드면 문자열 배열이 됩니다.
    pub fn to_document(&self) -> Document {
        let mut map = Map::with_capacity(self.entries.len());
        for (key, values) in &self.entries {
            let value = match values.as_slice() {
                [single] => Value::String(single.clone()),
                many => Value::Array(many.iter().cloned().map(Value::String).collect()),
            };
            map.insert(key.clone(), value);
        }
        Value::Object(map)
    }

    /// 문서에서 복원합니다.
    ///
    /// 객체가 아니면 빈 결과를 반환합니다. 문자열이 아닌 스칼라는 텍스트로
    /// 바꾸고, null과 중첩 객체는 건너뜁니다.
    pub fn from_document(document: &Document) -> Self {
        let mut vars = Self::new();
        let Some(map) = document.as_object() else {
            return vars;
        };

        for (key, value) in map {
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = scalar_text(item) {
                            vars.insert(key, &text);
                        }
                    }
                }
                other => {
                    if let Some(text) = scalar_text(other) {
                        vars.insert(key, &text);
                    }
                }
            }
        }
        vars
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
