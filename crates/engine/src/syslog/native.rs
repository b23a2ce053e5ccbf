//! NATIVE 모드: 문자열을 직접 스캔하는 필드 추출기
//!
//! REGEXP 모드의 식과 같은 결과를 내도록 백트래킹 지점을 그대로 따라갑니다.
//! 공백 판정은 `char::is_whitespace` (정규식 `\s`와 같은 집합)입니다.

use super::extract::{DateKind, FieldExtractor, RawFields, non_empty};

/// 직접 스캔 추출기
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct NativeExtractor;

impl FieldExtractor for NativeExtractor {
    fn rfc5424(&self, line: &str) -> Option<RawFields> {
        let (pri, version_start) = pri(line)?;

        // VERSION: 0으로 시작하지 않는 1~3자리 숫자
        let version_end = digits_end(line, version_start);
        if !(1..=3).contains(&(version_end - version_start))
            || line.as_bytes()[version_start] == b'0'
        {
            return None;
        }

        let ts_start = require_ws(line, version_end)?;
        let (timestamp, ts_end) = if line[ts_start..].starts_with('-') {
            (None, ts_start + 1)
        } else {
            let end = match_iso(line, ts_start)?;
            (Some(&line[ts_start..end]), end)
        };

        let (host, host_end) = token(line, ts_end)?;
        let (app, app_end) = token(line, host_end)?;
        let (pid, pid_end) = token(line, app_end)?;
        let (msgid, mut pos) = token(line, pid_end)?;

        // STRUCTURED-DATA: 뒤에 공백이나 끝이 와야 인정
        let mut sd = None;
        let sd_start = skip_ws(line, pos);
        if sd_start > pos {
            if let Some(sd_end) = match_sd(line, sd_start) {
                if at_ws_or_end(line, sd_end) {
                    sd = Some(&line[sd_start..sd_end]);
                    pos = sd_end;
                }
            }
        }

        let msg_start = skip_ws(line, pos);
        let message = if msg_start > pos {
            non_empty(&line[msg_start..])
        } else {
            None
        };

        Some(RawFields {
            pri: pri.to_owned(),
            version: non_empty(&line[version_start..version_end]),
            timestamp: timestamp.and_then(non_empty),
            host: non_empty(host),
            app: non_empty(app),
            pid: non_empty(pid),
            msgid: non_empty(msgid),
            sd: sd.and_then(non_empty),
            message,
        })
    }

    fn rfc3164(&self, line: &str) -> Option<RawFields> {
        let (pri, mut pos) = pri(line)?;
        let mut fields = RawFields {
            pri: pri.to_owned(),
            ..RawFields::default()
        };

        if let Some((ts_end, host_start, host_end, next)) = timestamp_and_host(line, pos) {
            fields.timestamp = non_empty(&line[pos..ts_end]);
            fields.host = non_empty(&line[host_start..host_end]);
            pos = next;
        }

        if let Some((app_end, pid, next)) = app_tag(line, pos) {
            fields.app = non_empty(&line[pos..app_end]);
            fields.pid = pid.and_then(non_empty);
            pos = next;
        }

        fields.message = non_empty(&line[pos..]);
        Some(fields)
    }

    fn date_kind(&self, text: &str) -> Option<DateKind> {
        if let Some((end, with_year)) = match_bsd(text, 0) {
            if end == text.len() || with_year == Some(text.len()) {
                return Some(DateKind::Bsd);
            }
        }
        if match_plain(text, 0) == Some(text.len()) {
            return Some(DateKind::Plain);
        }
        if match_iso(text, 0) == Some(text.len()) {
            return Some(DateKind::Iso);
        }
        None
    }
}

// --- 공통 스캐너 ---

/// `<PRI>`: 1~3자리 숫자. PRI 텍스트와 `>` 다음 위치를 반환합니다.
fn pri(line: &str) -> Option<(&str, usize)> {
    if !line.starts_with('<') {
        return None;
    }
    let end = digits_end(line, 1);
    if !(1..=3).contains(&(end - 1)) || line.as_bytes().get(end) != Some(&b'>') {
        return None;
    }
    Some((&line[1..end], end + 1))
}

/// `pos`부터 이어지는 ASCII 숫자의 끝
fn digits_end(line: &str, pos: usize) -> usize {
    line.as_bytes()[pos..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(line.len(), |n| pos + n)
}

/// `pos`부터 이어지는 공백의 끝
fn skip_ws(line: &str, pos: usize) -> usize {
    line[pos..]
        .find(|c: char| !c.is_whitespace())
        .map_or(line.len(), |n| pos + n)
}

/// `pos`부터 이어지는 비공백 토큰의 끝
fn token_end(line: &str, pos: usize) -> usize {
    line[pos..]
        .find(char::is_whitespace)
        .map_or(line.len(), |n| pos + n)
}

/// 최소 한 글자의 공백을 요구하고 그 다음 위치를 반환합니다.
fn require_ws(line: &str, pos: usize) -> Option<usize> {
    let next = skip_ws(line, pos);
    (next > pos).then_some(next)
}

/// `\s+(\S+)`: 공백 뒤의 토큰과 그 끝 위치
fn token(line: &str, pos: usize) -> Option<(&str, usize)> {
    let start = require_ws(line, pos)?;
    let end = token_end(line, start);
    (end > start).then(|| (&line[start..end], end))
}

fn at_ws_or_end(line: &str, pos: usize) -> bool {
    line[pos..].chars().next().is_none_or(char::is_whitespace)
}

/// 정확히 `n`자리 숫자
fn fixed_digits(line: &str, pos: usize, n: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    let end = pos + n;
    (end <= bytes.len() && bytes[pos..end].iter().all(u8::is_ascii_digit)).then_some(end)
}

fn literal(line: &str, pos: usize, byte: u8) -> Option<usize> {
    (line.as_bytes().get(pos) == Some(&byte)).then_some(pos + 1)
}

/// `hh:mm:ss`
fn clock(line: &str, pos: usize) -> Option<usize> {
    let pos = fixed_digits(line, pos, 2)?;
    let pos = literal(line, pos, b':')?;
    let pos = fixed_digits(line, pos, 2)?;
    let pos = literal(line, pos, b':')?;
    fixed_digits(line, pos, 2)
}

/// `yyyy-mm-dd`
fn calendar(line: &str, pos: usize) -> Option<usize> {
    let pos = fixed_digits(line, pos, 4)?;
    let pos = literal(line, pos, b'-')?;
    let pos = fixed_digits(line, pos, 2)?;
    let pos = literal(line, pos, b'-')?;
    fixed_digits(line, pos, 2)
}

// --- 날짜 형식 ---

/// `Mon +d{1,2} hh:mm:ss( yyyy)?`
///
/// 연도 없는 끝 위치와, 연도가 붙을 수 있으면 연도 포함 끝 위치를 반환합니다.
fn match_bsd(line: &str, pos: usize) -> Option<(usize, Option<usize>)> {
    let bytes = line.as_bytes();
    let month_end = pos + 3;
    if month_end > bytes.len() || !bytes[pos..month_end].iter().all(u8::is_ascii_alphabetic) {
        return None;
    }

    let day_start = month_end
        + bytes[month_end..]
            .iter()
            .take_while(|&&b| b == b' ')
            .count();
    if day_start == month_end {
        return None;
    }
    let day_len = bytes[day_start..]
        .iter()
        .take(2)
        .take_while(|b| b.is_ascii_digit())
        .count();
    if day_len == 0 {
        return None;
    }
    let pos = literal(line, day_start + day_len, b' ')?;
    let end = clock(line, pos)?;

    let with_year = literal(line, end, b' ').and_then(|p| fixed_digits(line, p, 4));
    Some((end, with_year))
}

/// `yyyy-mm-dd hh:mm:ss`
fn match_plain(line: &str, pos: usize) -> Option<usize> {
    let pos = calendar(line, pos)?;
    let pos = literal(line, pos, b' ')?;
    clock(line, pos)
}

/// `yyyy-mm-ddThh:mm:ss(.f+)?(Z|[+-]hh:mm)`
fn match_iso(line: &str, pos: usize) -> Option<usize> {
    let pos = calendar(line, pos)?;
    let pos = literal(line, pos, b'T')?;
    let mut pos = clock(line, pos)?;

    if let Some(frac_start) = literal(line, pos, b'.') {
        let frac_end = digits_end(line, frac_start);
        if frac_end > frac_start {
            pos = frac_end;
        }
    }

    match line.as_bytes().get(pos) {
        Some(b'Z') => Some(pos + 1),
        Some(b'+' | b'-') => {
            let p = fixed_digits(line, pos + 1, 2)?;
            let p = literal(line, p, b':')?;
            fixed_digits(line, p, 2)
        }
        _ => None,
    }
}

// --- RFC 3164 ---

/// `(TS)\s+(\S+)(\s+|$)`. 날짜 후보를 순서대로 시도합니다.
///
/// (타임스탬프 끝, 호스트 시작, 호스트 끝, 다음 위치)를 반환합니다.
fn timestamp_and_host(line: &str, pos: usize) -> Option<(usize, usize, usize, usize)> {
    let candidates: [Option<usize>; 2] = if let Some((end, with_year)) = match_bsd(line, pos) {
        [with_year, Some(end)]
    } else if let Some(end) = match_plain(line, pos) {
        [Some(end), None]
    } else {
        [match_iso(line, pos), None]
    };

    candidates.into_iter().flatten().find_map(|ts_end| {
        let host_start = require_ws(line, ts_end)?;
        let host_end = token_end(line, host_start);
        (host_end > host_start).then(|| (ts_end, host_start, host_end, skip_ws(line, host_end)))
    })
}

/// `APP([PID])?:(\s+|$)`. APP에는 공백, `[`, `]`, `:`가 올 수 없습니다.
///
/// (APP 끝, PID, 다음 위치)를 반환합니다.
fn app_tag(line: &str, pos: usize) -> Option<(usize, Option<&str>, usize)> {
    let app_end = line[pos..]
        .find(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | ':'))
        .map_or(line.len(), |n| pos + n);
    if app_end == pos {
        return None;
    }

    let mut cursor = app_end;
    let mut pid = None;
    if let Some(pid_start) = literal(line, cursor, b'[') {
        let pid_end = digits_end(line, pid_start);
        if pid_end == pid_start {
            return None;
        }
        cursor = literal(line, pid_end, b']')?;
        pid = Some(&line[pid_start..pid_end]);
    }

    let after_colon = literal(line, cursor, b':')?;
    let next = skip_ws(line, after_colon);
    if next == after_colon && after_colon != line.len() {
        return None;
    }
    Some((app_end, pid, next))
}

// --- RFC 5424 STRUCTURED-DATA ---

/// `-` 또는 하나 이상의 `[...]` 블록. 끝 위치를 반환합니다.
fn match_sd(line: &str, start: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    if bytes.get(start) == Some(&b'-') {
        return Some(start + 1);
    }

    let mut pos = start;
    while bytes.get(pos) == Some(&b'[') {
        match sd_block_end(bytes, pos) {
            Some(end) => pos = end,
            None => break,
        }
    }
    (pos > start).then_some(pos)
}

/// `[`에서 시작하는 블록 하나의 끝(`]` 다음) 위치.
///
/// 따옴표 안의 `]`를 건너뜁니다. 백슬래시 이스케이프는 따옴표 안에서만 유효하며,
/// 밖의 `\`는 SD-NAME의 일반 문자입니다.
fn sd_block_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    let mut quoted = false;
    loop {
        match *bytes.get(i)? {
            b'\\' if quoted => {
                bytes.get(i + 1)?;
                i += 2;
            }
            b'"' => {
                quoted = !quoted;
                i += 1;
            }
            b']' if !quoted => return Some(i + 1),
            _ => i += 1,
        }
    }
}
