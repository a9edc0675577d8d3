//! Codec for the textual list literals stored in the similarity source.
//!
//! The precomputation step serializes its list-valued columns as quoted
//! bracket literals, e.g. `['Heat', "Léon: The Professional"]` and
//! `[0.91, 0.88]`. Loading must round-trip that exact syntax, including
//! escaped quotes and commas inside titles.

use crate::error::{DataError, Result};

fn err(literal: &str, reason: &str) -> DataError {
    DataError::ListLiteral {
        literal: literal.to_string(),
        reason: reason.to_string(),
    }
}

fn strip_brackets(raw: &str) -> Result<&str> {
    raw.trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| err(raw, "expected a bracketed list"))
}

/// Parse a list literal of single- or double-quoted strings.
pub fn parse_string_list(raw: &str) -> Result<Vec<String>> {
    let inner = strip_brackets(raw)?;
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        let Some(&quote) = chars.peek() else { break };
        if quote != '\'' && quote != '"' {
            return Err(err(raw, "expected a quoted item"));
        }
        chars.next();

        let mut item = String::new();
        loop {
            match chars.next() {
                Some('\\') => match chars.next() {
                    Some('n') => item.push('\n'),
                    Some('t') => item.push('\t'),
                    Some('r') => item.push('\r'),
                    Some(c) => item.push(c),
                    None => return Err(err(raw, "unterminated escape")),
                },
                Some(c) if c == quote => break,
                Some(c) => item.push(c),
                None => return Err(err(raw, "unterminated string")),
            }
        }
        items.push(item);

        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return Err(err(raw, "expected ',' between items")),
        }
    }

    Ok(items)
}

/// Parse a list literal of numbers.
pub fn parse_number_list(raw: &str) -> Result<Vec<f64>> {
    let inner = strip_brackets(raw)?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    // A trailing comma leaves one empty segment behind.
    if parts.last() == Some(&"") {
        parts.pop();
    }

    parts
        .into_iter()
        .map(|part| {
            part.parse::<f64>()
                .map_err(|e| err(raw, &format!("bad number {part:?}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_double_quoted_strings() {
        let items = parse_string_list(r#"['The Matrix', "Blade Runner"]"#).unwrap();
        assert_eq!(items, vec!["The Matrix", "Blade Runner"]);
    }

    #[test]
    fn keeps_commas_inside_titles() {
        let items = parse_string_list("['The Good, the Bad and the Ugly', 'Heat']").unwrap();
        assert_eq!(items, vec!["The Good, the Bad and the Ugly", "Heat"]);
    }

    #[test]
    fn handles_escaped_quotes() {
        let items = parse_string_list(r"['Ocean\'s Eleven']").unwrap();
        assert_eq!(items, vec!["Ocean's Eleven"]);
    }

    #[test]
    fn accepts_empty_list_and_trailing_comma() {
        assert!(parse_string_list("[]").unwrap().is_empty());
        assert_eq!(parse_string_list("['Heat',]").unwrap(), vec!["Heat"]);
        assert_eq!(parse_number_list("[]").unwrap(), Vec::<f64>::new());
        assert_eq!(parse_number_list("[0.5,]").unwrap(), vec![0.5]);
    }

    #[test]
    fn parses_numbers() {
        let scores = parse_number_list("[0.91, 0.88, 1]").unwrap();
        assert_eq!(scores, vec![0.91, 0.88, 1.0]);
    }

    #[test]
    fn rejects_malformed_literals() {
        assert!(parse_string_list("not a list").is_err());
        assert!(parse_string_list("['unterminated]").is_err());
        assert!(parse_string_list("[unquoted]").is_err());
        assert!(parse_string_list("['a' 'b']").is_err());
        assert!(parse_number_list("[0.9, oops]").is_err());
    }
}
