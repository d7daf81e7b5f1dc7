//! Node title validation.
//!
//! Titles double as file-system-like names, so the characters
//! `\ / : * ? " < > |` are rejected. The length limit is counted in code
//! points: 254 when the title consists solely of CJK ideographs, 255
//! otherwise.

/// Characters a title may not contain.
pub const FORBIDDEN_TITLE_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Length limit for titles that are not purely CJK.
pub const MAX_TITLE_LEN: usize = 255;

/// Length limit for titles made only of CJK ideographs.
pub const MAX_CJK_TITLE_LEN: usize = 254;

/// Why a title was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TitleError {
    /// The title is empty.
    #[error("title must not be empty")]
    Empty,

    /// The title contains forbidden characters (deduplicated, in order of
    /// first appearance).
    #[error("title must not contain {}", format_chars(.0))]
    ForbiddenCharacters(Vec<char>),

    /// The title is longer than its limit.
    #[error("title is {len} characters long, the limit is {limit}")]
    TooLong { len: usize, limit: usize },
}

fn format_chars(chars: &[char]) -> String {
    chars
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns `true` for CJK unified ideographs (including extensions and
/// compatibility ideographs).
pub fn is_cjk_ideograph(c: char) -> bool {
    matches!(
        c as u32,
        0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xF900..=0xFAFF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2EBEF
            | 0x2F800..=0x2FA1F
            | 0x30000..=0x3134F
    )
}

/// The length limit that applies to `text`.
pub fn title_limit(text: &str) -> usize {
    if !text.is_empty() && text.chars().all(is_cjk_ideograph) {
        MAX_CJK_TITLE_LEN
    } else {
        MAX_TITLE_LEN
    }
}

/// Checks a title against the character and length rules.
pub fn validate_title(text: &str) -> Result<(), TitleError> {
    if text.is_empty() {
        return Err(TitleError::Empty);
    }

    let mut forbidden: Vec<char> = Vec::new();
    for c in text.chars().filter(|c| FORBIDDEN_TITLE_CHARS.contains(c)) {
        if !forbidden.contains(&c) {
            forbidden.push(c);
        }
    }
    if !forbidden.is_empty() {
        return Err(TitleError::ForbiddenCharacters(forbidden));
    }

    let len = text.chars().count();
    let limit = title_limit(text);
    if len > limit {
        return Err(TitleError::TooLong { len, limit });
    }
    Ok(())
}

/// Strips forbidden characters, then truncates to the applicable limit.
pub fn sanitize_title(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !FORBIDDEN_TITLE_CHARS.contains(c))
        .collect();
    let limit = title_limit(&stripped);
    stripped.chars().take(limit).collect()
}
