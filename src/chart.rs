use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// Representation kinds
// =============================================================================

/// Requested visual form of a token's result set.
///
/// Unrecognized or absent `representation` values fall back to `Table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Table,
    Bar,
    Line,
    Pie,
}

impl Representation {
    /// Parse the `representation` instruction value (compared lowercased).
    pub fn from_instruction(value: Option<&str>) -> Self {
        match value.map(|v| v.to_lowercase()).as_deref() {
            Some("barchart") => Representation::Bar,
            Some("linechart") => Representation::Line,
            Some("piechart") => Representation::Pie,
            _ => Representation::Table,
        }
    }

    /// Prefix used for generated markup element ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Representation::Table => "datatable",
            Representation::Bar => "barchart",
            Representation::Line => "linechart",
            Representation::Pie => "piechart",
        }
    }

    /// Default chart title when formatting supplies none.
    pub fn default_title(&self) -> &'static str {
        match self {
            Representation::Table => "Table",
            Representation::Bar => "Bar Chart",
            Representation::Line => "Line Chart",
            Representation::Pie => "Pie Chart",
        }
    }
}

// =============================================================================
// Sort directive
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse `asc`/`desc` case-insensitively; anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Sorting is carried as metadata; the consuming chart library reorders
/// labels and values at render time. Sorting by the legend column compares
/// numerically when both labels parse as numbers, else as locale strings;
/// sorting by a series name compares that series' data values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortSpec {
    pub by: String,
    pub direction: SortDirection,
    /// Legend column name, so the consumer can tell label-sorts from
    /// series-value-sorts.
    pub legend: String,
}

// =============================================================================
// Bar / line chart specification
// =============================================================================

/// One plotted series: values aligned 1:1 with the chart's label sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub background_color: String,
    pub border_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    /// Secondary Y-axis binding; absent means the primary axis.
    #[serde(rename = "yAxisID", skip_serializing_if = "Option::is_none")]
    pub y_axis_id: Option<String>,
}

/// Configuration for one non-primary Y axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisConfig {
    pub position: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Declarative bar or line chart: labels plus one dataset per series (or per
/// series x group when grouping is active). Every dataset's value sequence
/// has the same length as `labels`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    /// Non-primary axis id -> configuration, in sorted id order.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub axes: BTreeMap<String, AxisConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
}

// =============================================================================
// Pie chart specification
// =============================================================================

/// Declarative pie chart: one value and one color pair per slice, aligned
/// with `labels`. A grouped pie query produces one `PieSpec` per distinct
/// group value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSpec {
    /// Group value this pie belongs to, when grouping split the result set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub background_colors: Vec<String>,
    pub border_colors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_representation_from_instruction() {
        assert_eq!(
            Representation::from_instruction(Some("barchart")),
            Representation::Bar
        );
        assert_eq!(
            Representation::from_instruction(Some("PieChart")),
            Representation::Pie
        );
        assert_eq!(
            Representation::from_instruction(Some("scatter")),
            Representation::Table
        );
        assert_eq!(Representation::from_instruction(None), Representation::Table);
    }

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!(SortDirection::parse("ASC"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::parse("desc"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse("sideways"), None);
    }

    #[test]
    fn test_dataset_serializes_camel_case() {
        let ds = Dataset {
            label: "sales".to_string(),
            data: vec![1.0, 2.0],
            background_color: "#fff".to_string(),
            border_color: "#000".to_string(),
            border_width: Some(1),
            tension: None,
            point_radius: None,
            fill: None,
            y_axis_id: Some("y1".to_string()),
        };
        let json = serde_json::to_value(&ds).unwrap();
        assert_eq!(json["backgroundColor"], "#fff");
        assert_eq!(json["borderWidth"], 1);
        assert_eq!(json["yAxisID"], "y1");
        assert!(json.get("tension").is_none());
    }
}
