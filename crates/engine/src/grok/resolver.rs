//! Grok 식 전개기
//!
//! `%{NAME}` / `%{NAME:alias}` 플레이스홀더를 레지스트리의 본문으로 치환하여
//! 하나의 평탄한 정규식을 만듭니다. 재귀 호출 대신 명시적 프레임 스택으로
//! 깊이 우선 전개하며, 스택에 이미 있는 이름을 다시 만나면 순환으로 보고합니다.
//!
//! 출력 정규식의 캡처 그룹은 모두 이름 없는 위치 기반 그룹이며, 여는 괄호의
//! 순서대로 `field_names`와 1:1로 대응합니다.
//!
//! - 별칭이 있는 플레이스홀더 → `( ... )` + 필드 이름 추가
//! - 별칭이 없는 플레이스홀더 → `(?: ... )`
//! - 인라인 `(?<name>...)` / `(?P<name>...)` → `( ... )` + 필드 이름 추가
//! - 그 외의 맨 괄호 `( ... )` → `(?: ... )`

use super::registry::PatternRegistry;
use crate::error::ResolveError;

/// 최상위 식을 가리키는 프레임 이름
const ROOT: &str = "<expression>";

/// 전개 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// 평탄화된 정규식
    pub regex: String,
    /// 캡처 그룹 순서대로의 필드 이름 (중복 허용)
    pub field_names: Vec<String>,
}

struct Frame<'a> {
    name: &'a str,
    body: &'a str,
    pos: usize,
    open_groups: usize,
}

impl<'a> Frame<'a> {
    fn new(name: &'a str, body: &'a str) -> Self {
        Self {
            name,
            body,
            pos: 0,
            open_groups: 0,
        }
    }
}

enum Step<'a> {
    Placeholder {
        name: &'a str,
        alias: Option<&'a str>,
    },
    Done,
}

/// 전개 한도
#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    /// 플레이스홀더 중첩 최대 깊이
    pub max_depth: usize,
    /// 전개된 정규식 최대 길이 (바이트)
    pub max_size: usize,
}

/// Grok 식을 정규식으로 전개합니다.
///
/// 출력 길이는 한 프레임을 처리할 때마다 검사하므로, 한도를 넘는 순간
/// 본문 하나 분량 이상 더 자라지 않습니다.
pub(crate) fn resolve(
    expression: &str,
    registry: &PatternRegistry,
    limits: Limits,
) -> Result<Resolved, ResolveError> {
    if expression.is_empty() {
        return Err(ResolveError::EmptyExpression);
    }

    let mut regex = String::with_capacity(expression.len() * 4);
    let mut field_names = Vec::new();
    let mut stack = vec![Frame::new(ROOT, expression)];

    while let Some(frame) = stack.last_mut() {
        let step = scan(frame, &mut regex, &mut field_names)?;
        if regex.len() > limits.max_size {
            return Err(ResolveError::TooLarge {
                size: regex.len(),
                max: limits.max_size,
            });
        }
        match step {
            Step::Placeholder { name, alias } => {
                if let Some(start) = stack.iter().position(|f| f.name == name) {
                    let mut chain: Vec<String> =
                        stack[start..].iter().map(|f| f.name.to_owned()).collect();
                    chain.push(name.to_owned());
                    return Err(ResolveError::Cycle { chain });
                }
                if stack.len() > limits.max_depth {
                    return Err(ResolveError::DepthExceeded {
                        depth: limits.max_depth,
                    });
                }
                let body = registry
                    .lookup(name)
                    .ok_or_else(|| ResolveError::Undefined {
                        name: name.to_owned(),
                    })?;

                match alias {
                    Some(alias) => {
                        regex.push('(');
                        field_names.push(alias.to_owned());
                    }
                    None => regex.push_str("(?:"),
                }
                stack.push(Frame::new(name, body));
            }
            Step::Done => {
                stack.pop();
                if !stack.is_empty() {
                    regex.push(')');
                }
            }
        }
    }

    Ok(Resolved { regex, field_names })
}

/// 참조를 따라가지 않고 한 본문의 문법만 검사합니다.
///
/// 괄호/문자 클래스 균형과 플레이스홀더 형식을 확인합니다.
/// 참조된 패턴이 아직 없어도 실패하지 않습니다.
pub(crate) fn validate(name: &str, body: &str) -> Result<(), ResolveError> {
    if body.is_empty() {
        return Err(ResolveError::EmptyExpression);
    }
    let mut frame = Frame::new(name, body);
    let mut sink = String::with_capacity(body.len());
    let mut fields = Vec::new();
    loop {
        match scan(&mut frame, &mut sink, &mut fields)? {
            Step::Placeholder { .. } => continue,
            Step::Done => return Ok(()),
        }
    }
}

/// 프레임을 다음 플레이스홀더나 끝까지 복사합니다.
fn scan<'a>(
    frame: &mut Frame<'a>,
    out: &mut String,
    fields: &mut Vec<String>,
) -> Result<Step<'a>, ResolveError> {
    let body = frame.body;
    let bytes = body.as_bytes();

    while frame.pos < bytes.len() {
        let start = frame.pos;
        match bytes[start] {
            b'\\' => {
                let escaped = body[start + 1..].chars().next().ok_or_else(|| {
                    ResolveError::Unbalanced {
                        pattern: frame.name.to_owned(),
                        reason: "trailing backslash".to_owned(),
                    }
                })?;
                let end = start + 1 + escaped.len_utf8();
                out.push_str(&body[start..end]);
                frame.pos = end;
            }
            b'[' => {
                frame.pos = copy_class(frame.name, body, start, out)?;
            }
            b'(' => {
                frame.open_groups += 1;
                let rest = &body[start + 1..];
                if let Some(after) = named_group_start(rest) {
                    let end = after.find('>').ok_or_else(|| ResolveError::Unbalanced {
                        pattern: frame.name.to_owned(),
                        reason: "unterminated group name".to_owned(),
                    })?;
                    let group = &after[..end];
                    if !is_valid_name(group) {
                        return Err(ResolveError::InvalidPlaceholder {
                            placeholder: format!("(?<{group}>"),
                        });
                    }
                    out.push('(');
                    fields.push(group.to_owned());
                    frame.pos = start + 1 + (rest.len() - after.len()) + end + 1;
                } else if rest.starts_with('?') {
                    out.push('(');
                    frame.pos = start + 1;
                } else {
                    out.push_str("(?:");
                    frame.pos = start + 1;
                }
            }
            b')' => {
                if frame.open_groups == 0 {
                    return Err(ResolveError::Unbalanced {
                        pattern: frame.name.to_owned(),
                        reason: format!("unmatched ')' at offset {start}"),
                    });
                }
                frame.open_groups -= 1;
                out.push(')');
                frame.pos = start + 1;
            }
            b'%' if bytes.get(start + 1) == Some(&b'{') => {
                let close = body[start + 2..].find('}').map(|i| i + start + 2).ok_or_else(
                    || ResolveError::InvalidPlaceholder {
                        placeholder: body[start..].to_owned(),
                    },
                )?;
                frame.pos = close + 1;
                let (name, alias) = parse_placeholder(&body[start + 2..close]).ok_or_else(
                    || ResolveError::InvalidPlaceholder {
                        placeholder: body[start..=close].to_owned(),
                    },
                )?;
                return Ok(Step::Placeholder { name, alias });
            }
            _ => {
                let ch = body[start..].chars().next().unwrap_or_default();
                out.push(ch);
                frame.pos = start + ch.len_utf8().max(1);
            }
        }
    }

    if frame.open_groups != 0 {
        return Err(ResolveError::Unbalanced {
            pattern: frame.name.to_owned(),
            reason: format!("{} unclosed group(s)", frame.open_groups),
        });
    }
    Ok(Step::Done)
}

/// `[`에서 시작하는 문자 클래스를 그대로 복사하고 닫는 `]` 다음 위치를 반환합니다.
///
/// 여는 `[` 또는 `[^` 바로 뒤의 `]`는 리터럴입니다. 이스케이프와 중첩 클래스
/// (`[[:alpha:]]`)를 건너뜁니다.
fn copy_class(
    name: &str,
    body: &str,
    start: usize,
    out: &mut String,
) -> Result<usize, ResolveError> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'[' => {
                depth += 1;
                i += 1;
                if bytes.get(i) == Some(&b'^') {
                    i += 1;
                }
                if bytes.get(i) == Some(&b']') {
                    i += 1;
                }
            }
            b'\\' => i += 2,
            b']' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    out.push_str(&body[start..i]);
                    return Ok(i);
                }
            }
            _ => i += 1,
        }
    }

    Err(ResolveError::Unbalanced {
        pattern: name.to_owned(),
        reason: format!("unterminated character class at offset {start}"),
    })
}

/// `(` 다음 텍스트가 이름 있는 그룹이면 이름 시작 위치를 반환합니다.
///
/// `(?<=`, `(?<!` 후방 탐색은 이름 있는 그룹이 아닙니다.
fn named_group_start(rest: &str) -> Option<&str> {
    if let Some(after) = rest.strip_prefix("?P<") {
        return Some(after);
    }
    rest.strip_prefix("?<")
        .filter(|after| !after.starts_with('=') && !after.starts_with('!'))
}

/// `NAME`, `NAME:alias`, `NAME:alias:type` 형식을 해석합니다. 타입 힌트는 무시합니다.
fn parse_placeholder(inner: &str) -> Option<(&str, Option<&str>)> {
    let mut parts = inner.splitn(3, ':');
    let name = parts.next()?;
    if !is_valid_name(name) {
        return None;
    }
    match parts.next() {
        None => Some((name, None)),
        Some(alias) if !alias.is_empty() && !alias.contains(char::is_whitespace) => {
            Some((name, Some(alias)))
        }
        Some(_) => None,
    }
}

/// 패턴/그룹 이름 규칙: 비어 있지 않은 `[A-Za-z0-9_]`
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
