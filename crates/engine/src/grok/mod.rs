//! Grok 패턴 엔진
//!
//! 이름 있는 하위 패턴을 조합한 Grok 식(`%{IP:client} %{WORD:method}`)을
//! 정규식으로 전개하고, 컴파일 결과를 캐시에 두고 재사용합니다.
//! 호출자는 정규식 핸들 대신 64비트 캐시 id만 다룹니다.
//!
//! # 잠금 구조
//!
//! - 패턴 레지스트리: `RwLock` (전개 동안 읽기 잠금)
//! - 캐시 맵: `RwLock` (id 조회/삽입 동안만)
//! - 항목별 추출 상태: 항목 내부 `Mutex`
//!
//! 정규식 실행 중에는 레지스트리/캐시 잠금을 잡지 않습니다.
//!
//! # 사용 예시
//! ```
//! use lognorm_engine::grok::Grok;
//!
//! let grok = Grok::new();
//! let id = grok.build("%{IP:client} %{WORD:method} %{URIPATHPARAM:request}").unwrap();
//! assert!(grok.parse("55.3.244.1 GET /index.html", id));
//! assert_eq!(grok.get("method", id).as_deref(), Some("GET"));
//! ```

mod builtin;
mod cache;
mod registry;
mod resolver;
mod variables;

pub use cache::CacheId;
pub use resolver::Resolved;
pub use variables::Variables;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lognorm_core::config::GrokConfig;
use lognorm_core::metrics as m;
use lognorm_core::Document;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{EngineError, ResolveError};
use cache::{CacheEntry, CompileOptions};
use registry::PatternRegistry;
use resolver::Limits;

/// Grok 엔진
///
/// 여러 스레드가 하나의 인스턴스를 공유할 수 있습니다 (`Send + Sync`).
pub struct Grok {
    registry: RwLock<PatternRegistry>,
    cache: RwLock<HashMap<CacheId, Arc<CacheEntry>>>,
    compilations: AtomicU64,
    max_depth: usize,
    options: CompileOptions,
}

impl Grok {
    /// 기본 설정(내장 패턴 포함, 대소문자 무시)으로 엔진을 생성합니다.
    pub fn new() -> Self {
        Self::with_config(&GrokConfig::default())
    }

    /// 설정으로 엔진을 생성합니다.
    pub fn with_config(config: &GrokConfig) -> Self {
        let registry = if config.builtin_patterns {
            PatternRegistry::with_builtins()
        } else {
            PatternRegistry::default()
        };

        Self {
            registry: RwLock::new(registry),
            cache: RwLock::new(HashMap::new()),
            compilations: AtomicU64::new(0),
            max_depth: config.max_depth,
            options: CompileOptions {
                case_insensitive: config.case_insensitive,
                size_limit: config.size_limit,
            },
        }
    }

    // --- 패턴 레지스트리 ---

    /// 문서(`{ "NAME": "body", ... }`)에서 사용자 패턴을 일괄 등록합니다.
    ///
    /// 문자열이 아니거나 문법이 잘못된 항목은 건너뜁니다. 등록된 개수를 반환합니다.
    /// 컴파일은 하지 않습니다.
    pub fn patterns(&self, document: &Document) -> usize {
        let Some(map) = document.as_object() else {
            warn!("pattern document is not an object, ignoring");
            return 0;
        };

        let mut loaded = 0;
        for (name, body) in map {
            let Some(body) = body.as_str() else {
                warn!(pattern = name.as_str(), "pattern body is not a string, skipping");
                continue;
            };
            match self.pattern(name, body) {
                Ok(()) => loaded += 1,
                Err(e) => warn!(pattern = name.as_str(), error = %e, "invalid pattern, skipping"),
            }
        }

        debug!(loaded, total = map.len(), "loaded grok patterns");
        loaded
    }

    /// 사용자 패턴 하나를 추가하거나 덮어씁니다.
    pub fn pattern(&self, name: &str, body: &str) -> Result<(), EngineError> {
        if !resolver::is_valid_name(name) {
            return Err(ResolveError::InvalidPlaceholder {
                placeholder: format!("%{{{name}}}"),
            }
            .into());
        }
        resolver::validate(name, body)?;

        self.registry
            .write()
            .insert_external(name.to_owned(), body.to_owned());
        Ok(())
    }

    /// 사용자 패턴을 제거합니다. 내장 패턴은 제거되지 않습니다.
    pub fn remove_pattern(&self, name: &str) -> bool {
        self.registry.write().remove_external(name)
    }

    /// 모든 사용자 패턴을 제거합니다. 내장 패턴은 유지됩니다.
    pub fn clear_patterns(&self) {
        self.registry.write().clear_external();
    }

    /// 패턴 이름이 정의되어 있는지 확인합니다 (사용자 또는 내장).
    pub fn has_pattern(&self, name: &str) -> bool {
        self.registry.read().contains(name)
    }

    // --- 전개 / 캐시 ---

    /// Grok 식을 정규식으로 전개합니다. 캐시는 건드리지 않습니다.
    pub fn resolve(&self, expression: &str) -> Result<Resolved, EngineError> {
        let registry = self.registry.read();
        let limits = Limits {
            max_depth: self.max_depth,
            max_size: self.options.size_limit,
        };
        resolver::resolve(expression, &registry, limits).map_err(|e| {
            metrics::counter!(m::GROK_RESOLVE_ERRORS_TOTAL).increment(1);
            warn!(error = %e, "grok expression resolution failed");
            EngineError::from(e)
        })
    }

    /// Grok 식을 전개하고 컴파일하여 캐시 id를 반환합니다.
    ///
    /// 같은 식(같은 전개 결과)은 항상 같은 id를 받고, 정규식은 한 번만 컴파일됩니다.
    /// 전개 실패 시 캐시는 변경되지 않습니다. 컴파일 실패 시 항목은 남지만
    /// 영구적으로 사용 불가로 표시되고 이후 호출도 같은 에러를 반환합니다.
    pub fn build(&self, expression: &str) -> Result<CacheId, EngineError> {
        metrics::counter!(m::GROK_BUILDS_TOTAL).increment(1);

        let resolved = self.resolve(expression)?;
        let id = cache::cache_id(&resolved.regex, &resolved.field_names);

        let entry = self.entry(id).unwrap_or_else(|| {
            let mut cache = self.cache.write();
            Arc::clone(cache.entry(id).or_insert_with(|| {
                debug!(
                    cache_id = id,
                    fields = resolved.field_names.len(),
                    "inserted grok cache entry"
                );
                Arc::new(CacheEntry::new(
                    id,
                    resolved.regex.clone(),
                    resolved.field_names.clone(),
                ))
            }))
        });

        entry
            .compile_once(|pattern| {
                self.compilations.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(m::GROK_COMPILATIONS_TOTAL).increment(1);
                self.options.compile(pattern).map_err(|e| {
                    metrics::counter!(m::GROK_COMPILE_ERRORS_TOTAL).increment(1);
                    warn!(cache_id = id, error = %e, "grok regex compilation failed");
                    e.to_string()
                })
            })
            .map(|_| id)
            .map_err(|reason| EngineError::Compile {
                id,
                reason: reason.to_owned(),
            })
    }

    /// 텍스트에 매칭하고, 성공하면 id의 추출 결과를 교체합니다.
    ///
    /// 매칭 실패, 알 수 없는 id, 컴파일 실패한 id는 모두 `false`이며
    /// 이전 추출 결과는 그대로 남습니다.
    pub fn parse(&self, text: &str, id: CacheId) -> bool {
        let matched = self.entry(id).is_some_and(|entry| entry.parse(text));
        record_match(matched);
        matched
    }

    /// 텍스트에 매칭한 결과를 반환합니다. id의 공유 추출 상태는 건드리지 않습니다.
    pub fn extract(&self, text: &str, id: CacheId) -> Option<Variables> {
        let vars = self.entry(id).and_then(|entry| entry.extract(text));
        record_match(vars.is_some());
        vars
    }

    /// id의 현재 추출 결과를 문서로 반환합니다. 알 수 없는 id면 빈 객체입니다.
    pub fn dump(&self, id: CacheId) -> Document {
        self.entry(id)
            .map(|entry| entry.with_state(Variables::to_document))
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// id의 현재 추출 결과 사본
    pub fn variables(&self, id: CacheId) -> Option<Variables> {
        self.entry(id).map(|entry| entry.snapshot())
    }

    /// 필드의 첫 번째 값을 반환합니다.
    pub fn get(&self, key: &str, id: CacheId) -> Option<String> {
        self.entry(id)
            .and_then(|entry| entry.with_state(|vars| vars.get(key).map(str::to_owned)))
    }

    /// id의 필드 이름 표 (캡처 그룹 순서)
    pub fn field_names(&self, id: CacheId) -> Option<Vec<String>> {
        self.entry(id).map(|entry| entry.field_names().to_vec())
    }

    /// id의 전개된 정규식
    pub fn expression(&self, id: CacheId) -> Option<String> {
        self.entry(id).map(|entry| entry.expression().to_owned())
    }

    /// id의 추출 결과만 비웁니다. 컴파일된 정규식은 유지됩니다.
    pub fn reset(&self, id: CacheId) {
        if let Some(entry) = self.entry(id) {
            entry.reset();
        }
    }

    /// 사용자 패턴과 캐시 전체를 비웁니다. 내장 패턴은 유지됩니다.
    pub fn clear(&self) {
        self.registry.write().clear_external();
        self.cache.write().clear();
    }

    /// 원시 정규식 하나로 즉석 매칭합니다 (캐시하지 않음).
    ///
    /// 캡처 그룹은 위치 순서대로 `_1`, `_2`, ... 필드가 됩니다.
    /// 매칭 실패는 `Ok(None)`입니다.
    pub fn parse_with(&self, text: &str, regex: &str) -> Result<Option<Variables>, EngineError> {
        let compiled = self
            .options
            .compile(regex)
            .map_err(|e| EngineError::Compile {
                id: cache::cache_id(regex, &[]),
                reason: e.to_string(),
            })?;

        let Some(captures) = compiled.captures(text) else {
            record_match(false);
            return Ok(None);
        };

        let mut vars = Variables::new();
        for (index, group) in captures.iter().enumerate().skip(1) {
            if let Some(m) = group.filter(|m| !m.as_str().is_empty()) {
                vars.insert(&format!("_{index}"), m.as_str());
            }
        }
        record_match(true);
        Ok(Some(vars))
    }

    /// 이 인스턴스가 실제로 정규식을 컴파일한 횟수
    pub fn compilations(&self) -> u64 {
        self.compilations.load(Ordering::Relaxed)
    }

    /// 캐시 항목 수
    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    /// id가 캐시에 있는지 확인합니다.
    pub fn contains(&self, id: CacheId) -> bool {
        self.cache.read().contains_key(&id)
    }

    fn entry(&self, id: CacheId) -> Option<Arc<CacheEntry>> {
        self.cache.read().get(&id).cloned()
    }
}

impl Default for Grok {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Grok {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("Grok")
            .field("builtin_patterns", &registry.internal_len())
            .field("user_patterns", &registry.external_len())
            .field("cached", &self.cache_len())
            .field("compilations", &self.compilations())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

fn record_match(matched: bool) {
    let result = if matched { "matched" } else { "unmatched" };
    metrics::counter!(m::GROK_MATCHES_TOTAL, m::LABEL_RESULT => result).increment(1);
}
