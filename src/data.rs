use anyhow::{anyhow, Result};
use serde_json::Value;
use std::io::Read;

/// Tabular query result: ordered column names and ordered rows of cells.
///
/// Cells are kept as strings; numeric interpretation happens in the chart
/// transformer. Column names are unique in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Resolve a column name to its index, case-insensitively.
    /// First match wins, mirroring result-set column order.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Read a table from CSV text with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let columns: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if columns.is_empty() {
            return Err(anyhow!("CSV result has no header row"));
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        Ok(Self { columns, rows })
    }

    /// Create a table from a JSON array of objects, keyed by the first
    /// object's fields.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        if array.is_empty() {
            return Err(anyhow!("Input data array is empty"));
        }

        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;

        let columns: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            let mut row = Vec::new();
            for column in &columns {
                let val_str = match obj.get(column) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(Value::Null) | None => "".to_string(),
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", column)),
                };
                row.push(val_str);
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index_case_insensitive() {
        let data = TableData::new(vec!["Year".to_string(), "Sales".to_string()], vec![]);
        assert_eq!(data.column_index("year"), Some(0));
        assert_eq!(data.column_index("SALES"), Some(1));
        assert_eq!(data.column_index("missing"), None);
    }

    #[test]
    fn test_from_csv() {
        let csv = "year,sales\n2023,100\n2024,150\n";
        let data = TableData::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(data.columns, vec!["year", "sales"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[1], vec!["2024", "150"]);
    }

    #[test]
    fn test_from_json() {
        let value: Value =
            serde_json::from_str(r#"[{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]"#).unwrap();
        let data = TableData::from_json(&value).unwrap();
        assert_eq!(data.columns.len(), 2);
        assert_eq!(data.rows.len(), 2);
    }
}
