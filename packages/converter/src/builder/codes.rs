//! Inline code lists in a `values` cell, e.g. `1=Buy 2=Sell 3="Buy minus"`.

use std::sync::LazyLock;

use regex::Regex;

/// One `code=name` token, anchored at the start of the remaining text.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*([^\s="]+)\s*=\s*(?:"([^"]*)"|([^\s"]+))"#).expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineCode {
    pub value: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineCodes {
    pub codes: Vec<InlineCode>,
    /// Text after the last matched token, when it is not blank.
    pub remainder: Option<String>,
}

/// Whether `text` starts with a `code=name` token.
#[must_use]
pub fn looks_like_codes(text: &str) -> bool {
    CODE_PATTERN.is_match(text)
}

/// Split a values cell into codes.
///
/// # Examples
/// ```
/// use mdorchestra_converter::builder::parse_inline_codes;
///
/// let parsed = parse_inline_codes("1=Buy 2=");
/// assert_eq!(parsed.codes.len(), 1);
/// assert_eq!(parsed.codes[0].name, "Buy");
/// assert_eq!(parsed.remainder.as_deref(), Some("2="));
/// ```
#[must_use]
pub fn parse_inline_codes(text: &str) -> InlineCodes {
    let mut codes = Vec::new();
    let mut rest = text;
    while let Some(captures) = CODE_PATTERN.captures(rest) {
        let value = captures.get(1).map_or("", |m| m.as_str());
        let name = captures
            .get(2)
            .or_else(|| captures.get(3))
            .map_or("", |m| m.as_str());
        codes.push(InlineCode {
            value: value.to_string(),
            name: name.trim().to_string(),
        });
        let end = captures.get(0).map_or(rest.len(), |m| m.end());
        rest = &rest[end..];
    }

    let remainder = rest.trim();
    InlineCodes {
        codes,
        remainder: (!remainder.is_empty()).then(|| remainder.to_string()),
    }
}
