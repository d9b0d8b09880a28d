//! Instruction parser: the semicolon-delimited `key=value` mini-language
//! inside a token body.

use crate::chart::{Representation, SortDirection, SortSpec};
use crate::parser::formatting::{self, Formatting};
use crate::parser::values;
use std::collections::{BTreeMap, HashMap};

/// Instruction keys recognized by downstream stages. Unknown keys are kept in
/// the map but never read.
pub const KEY_QUERY: &str = "query";
pub const KEY_REPRESENTATION: &str = "representation";
pub const KEY_SERIES: &str = "series";
pub const KEY_LEGENDS: &str = "legends";
pub const KEY_GROUP_BY: &str = "groupBy";
pub const KEY_Y_AXES: &str = "yAxes";
pub const KEY_FORMATTING: &str = "formatting";
pub const KEY_SORT_BY: &str = "sortBy";
pub const KEY_SORT_DIRECTION: &str = "sortDirection";

/// Parsed instruction set of one token: case-sensitive keys, last duplicate
/// wins, values unquoted of one surrounding pair of double quotes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructionSet {
    map: HashMap<String, String>,
}

impl InstructionSet {
    /// Parse a token body. Malformed segments (no `=`, or `=` first) are
    /// skipped; parsing itself never fails.
    ///
    /// Splitting runs an explicit-state scan: a `;` only separates
    /// instructions when the scanner is outside double quotes (a `"` preceded
    /// by `\` does not toggle) and at brace depth zero, so quoted queries and
    /// `formatting={...}` blobs pass through intact.
    pub fn parse(body: &str) -> Self {
        let mut map = HashMap::new();

        for segment in split_instructions(body) {
            let segment = segment.trim();
            let Some(eq) = segment.find('=') else {
                continue;
            };
            if eq == 0 {
                continue;
            }
            let key = segment[..eq].trim();
            if key.is_empty() {
                continue;
            }
            let value = values::unquote(segment[eq + 1..].trim());
            map.insert(key.to_string(), value.to_string());
        }

        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn query(&self) -> Option<&str> {
        self.get(KEY_QUERY)
    }

    pub fn representation(&self) -> Representation {
        Representation::from_instruction(self.get(KEY_REPRESENTATION))
    }

    /// Series column names: a bare value or a `[a, b, c]` array.
    /// `None` when the instruction is absent (the caller applies the
    /// second-column default against its table).
    pub fn series(&self) -> Option<Vec<String>> {
        self.get(KEY_SERIES).map(values::parse_array)
    }

    /// Legend column name: only the first entry of an array value is used.
    pub fn legends(&self) -> Option<String> {
        self.get(KEY_LEGENDS)
            .map(values::parse_array)
            .and_then(|names| names.into_iter().next())
    }

    pub fn group_by(&self) -> Option<&str> {
        self.get(KEY_GROUP_BY)
    }

    /// Series name -> axis id map from the `yAxes` instruction.
    /// Empty when absent or unparsable.
    pub fn y_axes(&self) -> BTreeMap<String, String> {
        match self.get(KEY_Y_AXES) {
            Some(raw) => values::parse_axis_map(raw),
            None => BTreeMap::new(),
        }
    }

    /// Sort directive carried into the chart specification. `None` without a
    /// `sortBy` instruction; the direction falls back to the representation's
    /// default when absent or unparsable.
    pub fn sort(&self, legend: &str, default_direction: SortDirection) -> Option<SortSpec> {
        let by = self.get(KEY_SORT_BY)?;
        let direction = self
            .get(KEY_SORT_DIRECTION)
            .and_then(SortDirection::parse)
            .unwrap_or(default_direction);
        Some(SortSpec {
            by: by.to_string(),
            direction,
            legend: legend.to_string(),
        })
    }

    /// Parsed formatting options; all-default when the instruction is absent.
    pub fn formatting(&self) -> Formatting {
        match self.get(KEY_FORMATTING) {
            Some(raw) => formatting::parse(raw),
            None => Formatting::default(),
        }
    }
}

/// Split a token body on top-level semicolons.
///
/// State: inside-quotes flag plus a brace depth counter (a counter rather
/// than the historical boolean, so one mis-nested level cannot flip the
/// scanner inside-out).
fn split_instructions(body: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut depth = 0usize;
    let mut start = 0;
    let mut prev = '\0';

    for (i, c) in body.char_indices() {
        match c {
            '"' if prev != '\\' => in_quotes = !in_quotes,
            '{' if !in_quotes => depth += 1,
            '}' if !in_quotes => depth = depth.saturating_sub(1),
            ';' if !in_quotes && depth == 0 => {
                segments.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        prev = c;
    }

    if start < body.len() {
        segments.push(&body[start..]);
    }
    segments
}
