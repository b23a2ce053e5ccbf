//! RFC 5424 Structured Data 파싱 및 직렬화
//!
//! 형식: `[sd-id param1="value1" param2="value2"][sd-id2 ...]`
//!
//! 값 안의 `"`, `\`, `]`는 백슬래시로 이스케이프됩니다.

use std::collections::BTreeMap;

use tracing::debug;

/// SD-ID → (PARAM-NAME → PARAM-VALUE)
pub type StructuredData = BTreeMap<String, BTreeMap<String, String>>;

/// Structured Data 텍스트를 파싱합니다.
///
/// NILVALUE(`-`)는 빈 결과입니다. SD-ID가 비어 있는 블록은 버립니다.
/// 같은 SD-ID가 반복되면 파라미터를 합칩니다.
pub(crate) fn parse(text: &str) -> StructuredData {
    let mut data = StructuredData::new();
    if text == "-" {
        return data;
    }

    let mut chars = text.chars().peekable();

    while chars.peek() == Some(&'[') {
        chars.next();

        // SD-ID 추출 (']' 또는 공백 전까지)
        let mut sd_id = String::new();
        while let Some(&ch) = chars.peek() {
            if ch == ']' || ch.is_whitespace() {
                break;
            }
            sd_id.push(ch);
            chars.next();
        }

        // SD-PARAM 파싱 (param="value" 형태)
        let mut params = BTreeMap::new();
        loop {
            match chars.peek() {
                None => break,
                Some(']') => {
                    chars.next();
                    break;
                }
                Some(ch) if ch.is_whitespace() => {
                    chars.next();
                }
                Some(_) => {
                    let mut name = String::new();
                    while let Some(&ch) = chars.peek() {
                        if ch == '=' || ch == ']' || ch.is_whitespace() {
                            break;
                        }
                        name.push(ch);
                        chars.next();
                    }

                    if chars.peek() != Some(&'=') {
                        if name.is_empty() {
                            chars.next();
                        }
                        continue;
                    }
                    chars.next();

                    let value = if chars.peek() == Some(&'"') {
                        chars.next();
                        let mut value = String::new();
                        while let Some(ch) = chars.next() {
                            match ch {
                                '\\' => match chars.next() {
                                    Some(esc @ ('"' | '\\' | ']')) => value.push(esc),
                                    Some(other) => {
                                        value.push('\\');
                                        value.push(other);
                                    }
                                    None => value.push('\\'),
                                },
                                '"' => break,
                                _ => value.push(ch),
                            }
                        }
                        value
                    } else {
                        // 따옴표 없는 값은 공백/']' 전까지 관대하게 허용
                        let mut value = String::new();
                        while let Some(&ch) = chars.peek() {
                            if ch == ']' || ch.is_whitespace() {
                                break;
                            }
                            value.push(ch);
                            chars.next();
                        }
                        value
                    };

                    if !name.is_empty() {
                        params.insert(name, value);
                    }
                }
            }
        }

        if sd_id.is_empty() {
            debug!("dropping structured data block with empty SD-ID");
            continue;
        }
        data.entry(sd_id).or_default().extend(params);
    }

    data
}

/// Structured Data를 텍스트로 직렬화합니다. 비어 있으면 `-`입니다.
pub(crate) fn render(data: &StructuredData) -> String {
    let mut out = String::new();
    for (sd_id, params) in data {
        if sd_id.is_empty() {
            continue;
        }
        out.push('[');
        out.push_str(sd_id);
        for (name, value) in params {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            for ch in value.chars() {
                if matches!(ch, '"' | '\\' | ']') {
                    out.push('\\');
                }
                out.push(ch);
            }
            out.push('"');
        }
        out.push(']');
    }

    if out.is_empty() {
        out.push('-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nilvalue_is_empty() {
        assert!(parse("-").is_empty());
        assert_eq!(render(&StructuredData::new()), "-");
    }

    #[test]
    fn single_block() {
        let sd = parse(r#"[exampleSDID@32473 iut="3" eventSource="Application" eventID="1011"]"#);
        let block = &sd["exampleSDID@32473"];
        assert_eq!(block["iut"], "3");
        assert_eq!(block["eventSource"], "Application");
        assert_eq!(block["eventID"], "1011");
    }

    #[test]
    fn multiple_blocks() {
        let sd = parse(r#"[a@1 x="1"][b@2 y="2"]"#);
        assert_eq!(sd.len(), 2);
        assert_eq!(sd["a@1"]["x"], "1");
        assert_eq!(sd["b@2"]["y"], "2");
    }

    #[test]
    fn block_without_params() {
        let sd = parse("[origin]");
        assert!(sd["origin"].is_empty());
    }

    #[test]
    fn escaped_characters_in_value() {
        let sd = parse(r#"[id msg="say \"hi\" \\ [x\]" other="a\nb"]"#);
        assert_eq!(sd["id"]["msg"], r#"say "hi" \ [x]"#);
        // 정의되지 않은 이스케이프는 그대로 둠
        assert_eq!(sd["id"]["other"], r"a\nb");
    }

    #[test]
    fn value_with_equals_and_spaces() {
        let sd = parse(r#"[id q="a=b c"]"#);
        assert_eq!(sd["id"]["q"], "a=b c");
    }

    #[test]
    fn empty_value() {
        let sd = parse(r#"[id k=""]"#);
        assert_eq!(sd["id"]["k"], "");
    }

    #[test]
    fn duplicate_ids_merge() {
        let sd = parse(r#"[id a="1"][id b="2"]"#);
        assert_eq!(sd["id"].len(), 2);
    }

    #[test]
    fn empty_id_block_is_dropped() {
        let sd = parse(r#"[ a="1"][ok]"#);
        assert_eq!(sd.len(), 1);
        assert!(sd.contains_key("ok"));
    }

    #[test]
    fn malformed_params_do_not_loop() {
        let sd = parse("[id = =x novalue ]");
        assert!(sd.contains_key("id"));
    }

    #[test]
    fn render_escapes_and_reparses() {
        let mut sd = StructuredData::new();
        sd.entry("id@1".to_owned())
            .or_default()
            .insert("k".to_owned(), r#"q"b\s]"#.to_owned());
        let text = render(&sd);
        assert_eq!(text, r#"[id@1 k="q\"b\\s\]"]"#);
        assert_eq!(parse(&text), sd);
    }
}
