//! CSV 리더/라이터와 코덱
//!
//! RFC 4180 방식의 따옴표 처리를 따릅니다.
//!
//! - 구분자, `"`, 줄바꿈을 포함한 필드는 `"`로 감쌉니다
//! - 따옴표 필드 안의 `""`는 `"` 하나입니다
//! - 빈 줄은 건너뜁니다
//!
//! 헤더를 쓰면 첫 행이 열 이름이 되고 나머지 행은 객체로 내보냅니다.

use lognorm_core::error::LognormError;
use lognorm_core::{Document, DocumentCodec, Format};
use serde_json::{Map, Value};
use tracing::warn;

use super::scalar_text;
use crate::error::EngineError;

/// 기본 구분자
pub const DEFAULT_DELIMITER: char = ',';

/// 파싱된 CSV 표
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Csv {
    header: bool,
    rows: Vec<Vec<String>>,
}

impl Csv {
    /// 첫 행을 헤더로 쓸지 지정하여 빈 표를 만듭니다.
    pub fn new(header: bool) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn has_header(&self) -> bool {
        self.header
    }

    /// 텍스트를 파싱하여 행을 채웁니다. 이전 행은 지워집니다.
    ///
    /// 파싱한 행 수를 반환합니다. 닫히지 않은 따옴표는 여는 따옴표 위치로
    /// 에러를 보고하고, 표는 비어 있는 상태로 남습니다.
    pub fn parse(&mut self, text: &str, delimiter: char) -> Result<usize, EngineError> {
        check_delimiter(delimiter)?;
        self.rows.clear();

        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = Field::default();
        let mut chars = text.char_indices().peekable();
        let mut quote_start = None;

        while let Some((offset, ch)) = chars.next() {
            if quote_start.is_some() {
                if ch == '"' {
                    if chars.peek().map(|&(_, c)| c) == Some('"') {
                        field.text.push('"');
                        chars.next();
                    } else {
                        quote_start = None;
                    }
                } else {
                    field.text.push(ch);
                }
                continue;
            }

            match ch {
                '"' if field.text.is_empty() => {
                    quote_start = Some(offset);
                    field.quoted = true;
                }
                c if c == delimiter => row.push(field.take()),
                '\r' if chars.peek().map(|&(_, c)| c) == Some('\n') => {}
                '\n' => finish_row(&mut rows, &mut row, &mut field),
                _ => field.text.push(ch),
            }
        }

        if let Some(offset) = quote_start {
            return Err(EngineError::Decode {
                format: Format::Csv.as_str().to_owned(),
                offset,
                reason: "unterminated quoted field".to_owned(),
            });
        }
        finish_row(&mut rows, &mut row, &mut field);

        self.rows = rows;
        Ok(self.rows.len())
    }

    /// 한 행을 텍스트로 출력합니다 (줄바꿈 없음).
    pub fn row(&self, index: usize, delimiter: char) -> Option<String> {
        self.rows
            .get(index)
            .map(|row| render_row(row, delimiter))
    }

    /// 전체 표를 텍스트로 출력합니다. 행마다 `\n`으로 끝납니다.
    pub fn render(&self, delimiter: char) -> String {
        self.rows
            .iter()
            .map(|row| render_row(row, delimiter) + "\n")
            .collect()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// 표를 문서로 내보냅니다.
    ///
    /// 헤더가 있으면 데이터 행마다 `{열 이름: 값}` 객체의 배열입니다.
    /// 헤더보다 긴 행의 남는 셀은 `_N`(1부터 시작하는 열 번호) 키를 받습니다.
    /// 헤더가 없으면 문자열 배열의 배열입니다.
    pub fn dump(&self) -> Document {
        if !self.header {
            return Value::Array(
                self.rows
                    .iter()
                    .map(|row| Value::Array(row.iter().map(|c| Value::from(c.as_str())).collect()))
                    .collect(),
            );
        }

        let Some((names, data)) = self.rows.split_first() else {
            return Value::Array(Vec::new());
        };
        let objects = data
            .iter()
            .map(|row| {
                let mut object = Map::new();
                for (index, cell) in row.iter().enumerate() {
                    let key = names
                        .get(index)
                        .cloned()
                        .unwrap_or_else(|| format!("_{}", index + 1));
                    object.insert(key, Value::from(cell.as_str()));
                }
                for name in names.iter().skip(row.len()) {
                    object.insert(name.clone(), Value::from(""));
                }
                Value::Object(object)
            })
            .collect();
        Value::Array(objects)
    }

    /// 문서로 표를 채웁니다.
    ///
    /// 객체 배열이면 헤더를 켜고 키가 처음 나타난 순서로 열을 만듭니다.
    /// 배열의 배열이면 헤더 없이 그대로 행이 됩니다. 스칼라가 아닌 셀이 있거나
    /// 모양이 섞여 있으면 `false`이며 표는 바뀌지 않습니다.
    pub fn load(&mut self, document: &Document) -> bool {
        let Some(items) = document.as_array() else {
            warn!("csv document is not an array, ignoring");
            return false;
        };

        let loaded = if items.iter().all(Value::is_object) && !items.is_empty() {
            load_objects(items).map(|rows| (true, rows))
        } else if items.iter().all(Value::is_array) {
            load_arrays(items).map(|rows| (false, rows))
        } else {
            None
        };

        match loaded {
            Some((header, rows)) => {
                self.header = header;
                self.rows = rows;
                true
            }
            None => {
                warn!("csv document has mixed or nested values, ignoring");
                false
            }
        }
    }
}

/// 읽는 중인 필드. 따옴표로 감싼 빈 필드는 빈 줄과 구분됩니다.
#[derive(Default)]
struct Field {
    text: String,
    quoted: bool,
}

impl Field {
    fn take(&mut self) -> String {
        self.quoted = false;
        std::mem::take(&mut self.text)
    }
}

fn finish_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, field: &mut Field) {
    if row.is_empty() && field.text.is_empty() && !field.quoted {
        return;
    }
    row.push(field.take());
    rows.push(std::mem::take(row));
}

fn check_delimiter(delimiter: char) -> Result<(), EngineError> {
    if matches!(delimiter, '"' | '\r' | '\n') {
        return Err(EngineError::Config {
            field: "csv.delimiter".to_owned(),
            reason: format!("{delimiter:?} cannot be used as a delimiter"),
        });
    }
    Ok(())
}

fn render_row(row: &[String], delimiter: char) -> String {
    let mut out = String::new();
    for (index, cell) in row.iter().enumerate() {
        if index > 0 {
            out.push(delimiter);
        }
        let quote = (cell.is_empty() && row.len() == 1)
            || cell.contains(|c: char| c == delimiter || matches!(c, '"' | '\r' | '\n'));
        if quote {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out
}

fn load_objects(items: &[Value]) -> Option<Vec<Vec<String>>> {
    let mut names: Vec<String> = Vec::new();
    for object in items.iter().filter_map(Value::as_object) {
        for key in object.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let mut rows = vec![names.clone()];
    for object in items.iter().filter_map(Value::as_object) {
        let row = names
            .iter()
            .map(|name| object.get(name).map_or(Some(String::new()), scalar_text))
            .collect::<Option<Vec<_>>>()?;
        rows.push(row);
    }
    Some(rows)
}

fn load_arrays(items: &[Value]) -> Option<Vec<Vec<String>>> {
    items
        .iter()
        .filter_map(Value::as_array)
        .map(|cells| cells.iter().map(scalar_text).collect::<Option<Vec<_>>>())
        .collect()
}

/// CSV 코덱
#[derive(Debug, Clone)]
pub struct CsvCodec {
    delimiter: char,
    header: bool,
}

impl CsvCodec {
    /// 구분자와 헤더 사용 여부로 코덱을 만듭니다.
    pub fn new(delimiter: char, header: bool) -> Result<Self, EngineError> {
        check_delimiter(delimiter)?;
        Ok(Self { delimiter, header })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }
}

impl Default for CsvCodec {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            header: true,
        }
    }
}

impl DocumentCodec for CsvCodec {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn decode(&self, text: &str) -> Result<Document, LognormError> {
        let mut csv = Csv::new(self.header);
        csv.parse(text, self.delimiter)?;
        Ok(csv.dump())
    }

    fn encode(&self, document: &Document) -> Result<String, LognormError> {
        let mut csv = Csv::new(self.header);
        if !csv.load(document) {
            return Err(EngineError::Encode {
                format: Format::Csv.as_str().to_owned(),
                reason: "expected an array of flat objects or an array of arrays".to_owned(),
            }
            .into());
        }
        Ok(csv.render(self.delimiter))
    }
}
