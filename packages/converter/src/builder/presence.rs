//! Presence cells (`required`, `constant`, `required when X`, `constant assign`)
//! and how they combine with the `values` cell of a member row.

use thiserror::Error;

use super::codes::looks_like_codes;
use crate::repository::{Presence, PresenceRule};

const WHEN: &str = "when";
const ASSIGN: &str = "assign";

/// Malformed content in a single table cell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    #[error("Unknown presence '{0}'")]
    UnknownPresence(String),

    #[error("Presence '{0} when' has no condition")]
    MissingWhenExpression(String),

    #[error("Presence 'assign' has no expression in the values cell")]
    MissingAssignExpression,

    #[error("Unparsed code values '{0}'")]
    UnmatchedCodes(String),
}

/// Presence of a member row after combining its presence and values cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPresence {
    pub presence: Presence,
    pub rules: Vec<PresenceRule>,
    /// Fixed value of a constant.
    pub value: Option<String>,
    pub assign: Option<String>,
    /// Inline code list left for the caller to turn into a code set.
    pub codes: Option<String>,
}

/// Text following the first `n` whitespace-separated tokens, trimmed.
fn skip_tokens(text: &str, n: usize) -> &str {
    let mut rest = text.trim_start();
    for _ in 0..n {
        rest = rest
            .split_once(char::is_whitespace)
            .map_or("", |(_, r)| r)
            .trim_start();
    }
    rest.trim_end()
}

fn is_token(token: Option<&str>, keyword: &str) -> bool {
    token.is_some_and(|t| t.eq_ignore_ascii_case(keyword))
}

/// Parse the presence and values cells of a member row.
///
/// Errors are returned next to a best-effort result; a cell that cannot be
/// parsed leaves the presence at its default.
///
/// # Examples
/// ```
/// use mdorchestra_converter::builder::parse_presence;
/// use mdorchestra_converter::repository::Presence;
///
/// let (parsed, errors) = parse_presence(Some("required when OrdType=2"), None);
/// assert!(errors.is_empty());
/// assert_eq!(parsed.presence, Presence::Optional);
/// assert_eq!(parsed.rules[0].presence, Presence::Required);
/// assert_eq!(parsed.rules[0].when, "OrdType=2");
/// ```
#[must_use]
pub fn parse_presence(
    presence: Option<&str>,
    values: Option<&str>,
) -> (MemberPresence, Vec<CellError>) {
    let mut parsed = MemberPresence::default();
    let mut errors = Vec::new();
    let presence = presence.map(str::trim).unwrap_or_default();
    let values = values.map(str::trim).filter(|v| !v.is_empty());

    let tokens: Vec<&str> = presence.split_whitespace().collect();
    let mut values_consumed = false;

    if let Some(&first) = tokens.first() {
        match Presence::from_keyword(first) {
            Some(keyword) => {
                let second = tokens.get(1).copied();
                if is_token(second, WHEN) {
                    let condition = skip_tokens(presence, 2);
                    if condition.is_empty() {
                        errors.push(CellError::MissingWhenExpression(first.to_string()));
                    } else {
                        parsed.rules.push(PresenceRule {
                            presence: keyword,
                            when: condition.to_string(),
                        });
                    }
                } else if is_token(second, ASSIGN) {
                    parsed.presence = keyword;
                    values_consumed = true;
                    match values.map(strip_assign).filter(|v| !v.is_empty()) {
                        Some(expression) => parsed.assign = Some(expression.to_string()),
                        None => errors.push(CellError::MissingAssignExpression),
                    }
                } else if let Some(extra) = second {
                    errors.push(CellError::UnknownPresence(extra.to_string()));
                    parsed.presence = keyword;
                } else {
                    parsed.presence = keyword;
                }
            }
            None => errors.push(CellError::UnknownPresence(presence.to_string())),
        }
    }

    if let Some(values) = values.filter(|_| !values_consumed) {
        if is_token(values.split_whitespace().next(), ASSIGN) {
            let expression = skip_tokens(values, 1);
            if expression.is_empty() {
                errors.push(CellError::MissingAssignExpression);
            } else {
                parsed.assign = Some(expression.to_string());
            }
        } else if looks_like_codes(values) {
            parsed.codes = Some(values.to_string());
        } else {
            parsed.presence = Presence::Constant;
            parsed.value = Some(values.to_string());
        }
    }

    (parsed, errors)
}

fn strip_assign(values: &str) -> &str {
    if is_token(values.split_whitespace().next(), ASSIGN) {
        skip_tokens(values, 1)
    } else {
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_absent_is_optional() {
        let (parsed, errors) = parse_presence(None, None);
        assert_eq!(parsed, MemberPresence::default());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_keyword_case_insensitive() {
        let (parsed, _) = parse_presence(Some("Required"), None);
        assert_eq!(parsed.presence, Presence::Required);
    }

    #[test]
    fn test_when_keeps_original_spacing() {
        let (parsed, errors) = parse_presence(Some("forbidden  when  Side = 1 and Qty>0"), None);
        assert!(errors.is_empty());
        assert_eq!(parsed.presence, Presence::Optional);
        assert_eq!(
            parsed.rules,
            vec![PresenceRule {
                presence: Presence::Forbidden,
                when: "Side = 1 and Qty>0".to_string(),
            }]
        );
    }

    #[test]
    fn test_when_without_condition() {
        let (parsed, errors) = parse_presence(Some("required when"), None);
        assert!(parsed.rules.is_empty());
        assert_eq!(
            errors,
            vec![CellError::MissingWhenExpression("required".to_string())]
        );
    }

    #[test]
    fn test_assign_in_presence_takes_values() {
        let (parsed, errors) = parse_presence(Some("constant assign"), Some("OrderQty * Price"));
        assert!(errors.is_empty());
        assert_eq!(parsed.presence, Presence::Constant);
        assert_eq!(parsed.assign.as_deref(), Some("OrderQty * Price"));
        assert_eq!(parsed.value, None);
    }

    #[test]
    fn test_assign_leading_values() {
        let (parsed, errors) = parse_presence(Some("required"), Some("assign $now"));
        assert!(errors.is_empty());
        assert_eq!(parsed.presence, Presence::Required);
        assert_eq!(parsed.assign.as_deref(), Some("$now"));
    }

    #[test]
    fn test_assign_without_values() {
        let (_, errors) = parse_presence(Some("required assign"), None);
        assert_eq!(errors, vec![CellError::MissingAssignExpression]);
    }

    #[test]
    fn test_bare_literal_is_constant() {
        let (parsed, errors) = parse_presence(None, Some("FIXT.1.1"));
        assert!(errors.is_empty());
        assert_eq!(parsed.presence, Presence::Constant);
        assert_eq!(parsed.value.as_deref(), Some("FIXT.1.1"));
    }

    #[test]
    fn test_codes_left_for_caller() {
        let (parsed, _) = parse_presence(Some("required"), Some("1=Buy 2=Sell"));
        assert_eq!(parsed.presence, Presence::Required);
        assert_eq!(parsed.codes.as_deref(), Some("1=Buy 2=Sell"));
    }

    #[test]
    fn test_unknown_keyword_defaults() {
        let (parsed, errors) = parse_presence(Some("mandatory"), None);
        assert_eq!(parsed.presence, Presence::Optional);
        assert_eq!(errors, vec![CellError::UnknownPresence("mandatory".to_string())]);
    }
}
