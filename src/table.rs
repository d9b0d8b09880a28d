//! Table transformer: tabular result + formatting options -> declarative
//! table specification. No sorting or filtering happens here; rows keep
//! strict source order.

use crate::data::TableData;
use crate::parser::Formatting;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCell {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

/// Declarative table: headers plus rows in source order, annotated with the
/// formatting patterns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TableRow>,
}

/// Build a table specification.
///
/// Column-pattern styles attach to every header whose name contains the
/// configured substring (case-sensitive) and to each cell under it.
/// Row-pattern styles attach to every Nth row, 1-based; a pattern index of 0
/// is ignored.
pub fn build(data: &TableData, formatting: &Formatting) -> TableSpec {
    let column_style = |name: &str| -> Option<String> {
        formatting
            .column_pattern
            .as_ref()
            .filter(|p| name.contains(&p.name_contains))
            .map(|p| p.style.clone())
    };

    let columns: Vec<TableColumn> = data
        .columns
        .iter()
        .map(|name| TableColumn {
            name: name.clone(),
            style: column_style(name),
        })
        .collect();

    let rows = data
        .rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            let style = formatting
                .row_pattern
                .as_ref()
                .filter(|p| p.index != 0 && (row_index + 1) % p.index == 0)
                .map(|p| p.style.clone());

            let cells = row
                .iter()
                .enumerate()
                .map(|(i, text)| TableCell {
                    text: text.clone(),
                    style: data.columns.get(i).and_then(|name| column_style(name)),
                })
                .collect();

            TableRow { cells, style }
        })
        .collect();

    TableSpec { columns, rows }
}
