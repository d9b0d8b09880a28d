//! Formatting parser: the nested brace mini-language carried by the
//! `formatting` instruction.
//!
//! The blob looks like JSON but is not: keys are bare, values may be quoted
//! or not, and the `yAxis` entry interleaves `id:"a"` markers with bare
//! `{...}` config groups. Everything is parsed with one top-level splitter
//! (states: normal / in-quotes / brace depth n) applied recursively to nested
//! groups. Parsing is total: a malformed sub-value leaves its option at the
//! default and the rest of the blob still parses.

use crate::parser::values::unquote;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Style applied to every Nth row (1-based) of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPattern {
    pub index: usize,
    pub style: String,
}

/// Style applied to columns whose name contains a substring, and their cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPattern {
    pub name_contains: String,
    pub style: String,
}

/// Placement of value/percentage annotations on a pie chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePosition {
    Inside,
    Outside,
    Legend,
}

impl ValuePosition {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "inside" => Some(ValuePosition::Inside),
            "outside" => Some(ValuePosition::Outside),
            "legend" => Some(ValuePosition::Legend),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValuePosition::Inside => "inside",
            ValuePosition::Outside => "outside",
            ValuePosition::Legend => "legend",
        }
    }
}

/// Configuration of one named Y axis from the `yAxis` sub-map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisOptions {
    pub position: Option<String>,
    pub title: Option<String>,
    pub color: Option<String>,
}

/// Parsed formatting options. Every field is optional; absence means the
/// representation-specific default applies downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Formatting {
    pub row_pattern: Option<RowPattern>,
    pub column_pattern: Option<ColumnPattern>,
    pub title: Option<String>,
    pub show_legend: Option<bool>,
    pub show_points: Option<bool>,
    pub horizontal: Option<bool>,
    pub stacked: Option<bool>,
    pub doughnut: Option<bool>,
    pub show_values: Option<bool>,
    pub show_percentages: Option<bool>,
    pub value_position: Option<ValuePosition>,
    pub border_width: Option<u32>,
    pub tension: Option<u32>,
    /// `backgroundColor{i}` overrides, keyed by index.
    pub background_overrides: HashMap<usize, String>,
    /// `borderColor{i}` overrides, keyed by index.
    pub border_overrides: HashMap<usize, String>,
    /// `yAxis` sub-map: axis id -> options, in sorted id order.
    pub axes: BTreeMap<String, AxisOptions>,
}

/// Parse a formatting blob. Never fails; unrecognized keys and unparsable
/// values are skipped.
pub fn parse(raw: &str) -> Formatting {
    let mut options = Formatting::default();
    let body = strip_braces(raw.trim());

    for segment in split_segments(body, ',') {
        let (key, value) = split_key(segment);
        let Some(key) = key else {
            debug!("formatting segment without key ignored: '{}'", segment.trim());
            continue;
        };

        match key {
            "row" => options.row_pattern = parse_row(value),
            "column" => options.column_pattern = parse_column(value),
            "yAxis" => options.axes = parse_axes(value),
            "title" => options.title = Some(unquote(value).to_string()),
            "showLegend" => options.show_legend = parse_bool(value),
            "showPoints" => options.show_points = parse_bool(value),
            "horizontal" => options.horizontal = parse_bool(value),
            "stacked" => options.stacked = parse_bool(value),
            "doughnut" => options.doughnut = parse_bool(value),
            "showValues" => options.show_values = parse_bool(value),
            "showPercentages" => options.show_percentages = parse_bool(value),
            "valuePosition" => options.value_position = ValuePosition::parse(unquote(value)),
            "borderWidth" => options.border_width = value.parse().ok(),
            "tension" => options.tension = value.parse().ok(),
            _ => {
                if let Some(index) = indexed_key(key, "backgroundColor") {
                    options
                        .background_overrides
                        .insert(index, unquote(value).to_string());
                } else if let Some(index) = indexed_key(key, "borderColor") {
                    options
                        .border_overrides
                        .insert(index, unquote(value).to_string());
                } else {
                    debug!("unrecognized formatting key '{}' ignored", key);
                }
            }
        }
    }

    options
}

/// `row:{index:N, style:"S"}`; both parts required.
fn parse_row(value: &str) -> Option<RowPattern> {
    let mut index = None;
    let mut style = None;
    for segment in split_segments(strip_braces(value.trim()), ',') {
        match split_key(segment) {
            (Some("index"), v) => index = v.parse::<usize>().ok(),
            (Some("style"), v) => style = non_empty(unquote(v)),
            _ => {}
        }
    }
    Some(RowPattern {
        index: index?,
        style: style?,
    })
}

/// `column:{nameContains:"S", style:"S"}`; both parts required.
fn parse_column(value: &str) -> Option<ColumnPattern> {
    let mut name_contains = None;
    let mut style = None;
    for segment in split_segments(strip_braces(value.trim()), ',') {
        match split_key(segment) {
            (Some("nameContains"), v) => name_contains = non_empty(unquote(v)),
            (Some("style"), v) => style = non_empty(unquote(v)),
            _ => {}
        }
    }
    Some(ColumnPattern {
        name_contains: name_contains?,
        style: style?,
    })
}

/// `yAxis:{id:"a",{position:"right",title:"T",color:"C"}, id:"b",{...}}`.
/// An `id` marker opens an axis entry; the following keyless brace group
/// configures it.
fn parse_axes(value: &str) -> BTreeMap<String, AxisOptions> {
    let mut axes = BTreeMap::new();
    let mut current: Option<String> = None;

    for segment in split_segments(strip_braces(value.trim()), ',') {
        match split_key(segment) {
            (Some("id"), v) => {
                let id = unquote(v).to_string();
                axes.entry(id.clone()).or_insert_with(AxisOptions::default);
                current = Some(id);
            }
            (None, group) => {
                let Some(id) = current.as_ref() else {
                    debug!("yAxis config group without preceding id ignored");
                    continue;
                };
                let entry = axes.entry(id.clone()).or_default();
                for part in split_segments(strip_braces(group.trim()), ',') {
                    match split_key(part) {
                        (Some("position"), v) => entry.position = Some(unquote(v).to_string()),
                        (Some("title"), v) => entry.title = Some(unquote(v).to_string()),
                        (Some("color"), v) => entry.color = Some(unquote(v).to_string()),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    axes
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Keys like `backgroundColor3`: the prefix followed by a non-empty decimal
/// index.
fn indexed_key(key: &str, prefix: &str) -> Option<usize> {
    key.strip_prefix(prefix)?.parse().ok()
}

/// `true`/`false`, case-insensitive. Anything else is no value at all.
fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Remove one enclosing `{...}` pair, if present.
fn strip_braces(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('{') && value.ends_with('}') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Split on `sep` at brace depth zero, outside double quotes. Nested brace
/// groups pass through whole; empty segments are dropped.
fn split_segments(body: &str, sep: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;
    let mut prev = '\0';

    for (i, c) in body.char_indices() {
        match c {
            '"' if prev != '\\' => in_quotes = !in_quotes,
            '{' if !in_quotes => depth += 1,
            '}' if !in_quotes => depth = depth.saturating_sub(1),
            c if c == sep && !in_quotes && depth == 0 => {
                if !body[start..i].trim().is_empty() {
                    segments.push(&body[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
        prev = c;
    }

    if !body[start..].trim().is_empty() {
        segments.push(&body[start..]);
    }
    segments
}

/// Split a segment at its first top-level `:` into key and value. A segment
/// with no top-level colon (e.g. a bare `{...}` group) has no key.
fn split_key(segment: &str) -> (Option<&str>, &str) {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut prev = '\0';

    for (i, c) in segment.char_indices() {
        match c {
            '"' if prev != '\\' => in_quotes = !in_quotes,
            '{' if !in_quotes => depth += 1,
            '}' if !in_quotes => depth = depth.saturating_sub(1),
            ':' if !in_quotes && depth == 0 => {
                return (Some(segment[..i].trim()), segment[i + 1..].trim());
            }
            _ => {}
        }
        prev = c;
    }

    (None, segment.trim())
}
