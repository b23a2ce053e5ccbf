//! 필드 추출 전략 공통 인터페이스
//!
//! NATIVE(직접 스캔)와 REGEXP(Grok 식) 두 전략은 같은 [`RawFields`]를 만들어야
//! 합니다. 문자열 → 타입 변환과 검증은 전략 밖에서 한 번만 수행합니다.

/// 타임스탬프 텍스트 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateKind {
    /// `Mon dd hh:mm:ss` 또는 `Mon dd hh:mm:ss yyyy`
    Bsd,
    /// `yyyy-mm-dd hh:mm:ss`
    Plain,
    /// `yyyy-mm-ddThh:mm:ss[.frac](Z|±hh:mm)`
    Iso,
}

/// 프레이밍에서 잘라낸 원시 필드
///
/// 빈 문자열은 `None`으로 표현합니다. `-` 같은 NILVALUE 해석은 하지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RawFields {
    pub pri: String,
    pub version: Option<String>,
    pub timestamp: Option<String>,
    pub host: Option<String>,
    pub app: Option<String>,
    pub pid: Option<String>,
    pub msgid: Option<String>,
    pub sd: Option<String>,
    pub message: Option<String>,
}

/// 프레이밍별 원시 필드 추출기
pub(crate) trait FieldExtractor: Send + Sync {
    /// RFC 5424 프레이밍으로 추출합니다. 맞지 않으면 `None`.
    fn rfc5424(&self, line: &str) -> Option<RawFields>;

    /// RFC 3164 프레이밍으로 추출합니다. 맞지 않으면 `None`.
    fn rfc3164(&self, line: &str) -> Option<RawFields>;

    /// 타임스탬프 텍스트의 형식을 판별합니다.
    fn date_kind(&self, text: &str) -> Option<DateKind>;
}

/// 빈 문자열을 `None`으로
pub(crate) fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}
