//! Shared value grammars: quoted strings, `[a, b, c]` array values, and the
//! `yAxes` series->axis map.
//!
//! All entry points are permissive: an unparsable value degrades to the
//! closest sensible default instead of erroring, so one bad instruction never
//! aborts a render.

use log::warn;
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::map,
    error::ParseError,
    multi::separated_list0,
    sequence::{delimited, separated_pair},
    IResult,
};
use std::collections::BTreeMap;

/// Strip one surrounding pair of double quotes, if present. Interior
/// characters are not unescaped.
pub fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Wrap a parser to eat surrounding whitespace.
fn ws<'a, O, E: ParseError<&'a str>, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: FnMut(&'a str) -> IResult<&'a str, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

fn double_quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c| c != '"'), char('"'))(input)
}

fn single_quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('\''), take_while(|c| c != '\''), char('\''))(input)
}

/// One array element: a quoted string or bare text up to the next comma.
fn array_element(input: &str) -> IResult<&str, String> {
    alt((
        map(double_quoted, str::to_string),
        map(single_quoted, str::to_string),
        map(take_while1(|c| c != ','), |s: &str| s.trim().to_string()),
    ))(input)
}

fn array_elements(input: &str) -> IResult<&str, Vec<String>> {
    separated_list0(ws(char(',')), ws(array_element))(input)
}

/// Parse a `series`/`legends` value. A `[a, b, c]` form splits on top-level
/// commas with each element trimmed and unquoted; a bare value is a
/// single-element list.
pub fn parse_array(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    let inner = match trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
    {
        Some(inner) => inner,
        None => return vec![trim_element(trimmed)],
    };

    match array_elements(inner) {
        Ok(("", items)) => items,
        _ => {
            warn!("unparsable array value '{}', splitting on commas", value);
            inner.split(',').map(trim_element).collect()
        }
    }
}

fn trim_element(s: &str) -> String {
    s.trim().trim_matches(|c| c == '"' || c == '\'').to_string()
}

/// One `"series":"axis"` pair; both sides may also be bare words.
fn axis_pair(input: &str) -> IResult<&str, (String, String)> {
    separated_pair(
        alt((
            map(double_quoted, str::to_string),
            map(
                take_while1(|c: char| c != ':' && c != ',' && c != '}'),
                |s: &str| s.trim().to_string(),
            ),
        )),
        ws(char(':')),
        alt((
            map(double_quoted, str::to_string),
            map(
                take_while1(|c: char| c != ',' && c != '}'),
                |s: &str| s.trim().to_string(),
            ),
        )),
    )(input)
}

fn axis_map(input: &str) -> IResult<&str, Vec<(String, String)>> {
    delimited(
        ws(char('{')),
        separated_list0(ws(char(',')), axis_pair),
        ws(char('}')),
    )(input)
}

/// Parse the `yAxes` instruction value (`{"series":"axisId", ...}`) into a
/// series -> axis id map. Unparsable input yields an empty map.
pub fn parse_axis_map(value: &str) -> BTreeMap<String, String> {
    match axis_map(value.trim()) {
        Ok(("", pairs)) => pairs.into_iter().collect(),
        _ => {
            warn!("unparsable yAxes value '{}', ignoring", value);
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote("\"unterminated"), "\"unterminated");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn test_parse_array_bare_value() {
        assert_eq!(parse_array("sales"), vec!["sales"]);
        assert_eq!(parse_array("  sales  "), vec!["sales"]);
    }

    #[test]
    fn test_parse_array_bracketed() {
        assert_eq!(parse_array("[a, b, c]"), vec!["a", "b", "c"]);
        assert_eq!(parse_array("[\"a\", 'b']"), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_array_quoted_element_with_comma() {
        assert_eq!(
            parse_array(r#"["Total, net", other]"#),
            vec!["Total, net", "other"]
        );
    }

    #[test]
    fn test_parse_array_empty() {
        assert!(parse_array("[]").is_empty());
    }

    #[test]
    fn test_parse_axis_map() {
        let axes = parse_axis_map(r#"{"sales":"y", "margin":"pct"}"#);
        assert_eq!(axes.len(), 2);
        assert_eq!(axes.get("margin").map(String::as_str), Some("pct"));
    }

    #[test]
    fn test_parse_axis_map_bare_words() {
        let axes = parse_axis_map("{sales: y1}");
        assert_eq!(axes.get("sales").map(String::as_str), Some("y1"));
    }

    #[test]
    fn test_parse_axis_map_malformed() {
        assert!(parse_axis_map("not a map").is_empty());
        assert!(parse_axis_map("{unclosed").is_empty());
    }
}
