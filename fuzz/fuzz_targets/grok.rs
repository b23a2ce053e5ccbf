#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lognorm_engine::Grok;
use serde_json::{Map, Value};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 사용자 패턴 (최대 8개로 제한)
    patterns: Vec<(String, String)>,
    /// 빌드할 식
    expression: String,
    /// 매칭 대상 텍스트
    text: String,
}

fuzz_target!(|input: FuzzInput| {
    let grok = Grok::new();

    let document: Map<String, Value> = input
        .patterns
        .into_iter()
        .take(8)
        .map(|(name, body)| (name, Value::String(body)))
        .collect();
    grok.patterns(&Value::Object(document));

    // 전개/컴파일 실패해도 크래시는 안 됨
    let Ok(id) = grok.build(&input.expression) else {
        return;
    };

    // 같은 식은 같은 id를 받아야 한다
    assert_eq!(grok.build(&input.expression).ok(), Some(id));

    let matched = grok.parse(&input.text, id);
    assert_eq!(matched, grok.extract(&input.text, id).is_some());
    let _ = grok.dump(id);
});
