//! Chart data transformer: tabular result + instruction set -> declarative
//! chart specification.
//!
//! All shaping is deterministic: group and bar-label orders come from sorted
//! unique passes, colors cycle the fixed palettes by index, and axis maps are
//! sorted by id. Unknown columns degrade (a missing series is skipped, a
//! missing legend falls back to the first column, a missing groupBy disables
//! grouping) instead of failing the render.

use crate::chart::{AxisConfig, ChartSpec, Dataset, PieSpec, Representation, SortDirection};
use crate::data::TableData;
use crate::palette;
use crate::parser::InstructionSet;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Primary axis id; datasets bound to it carry no explicit axis reference.
const PRIMARY_AXIS: &str = "y";

/// Column bindings shared by every chart kind.
struct ResolvedColumns {
    /// Legend column index; falls back to 0 when the requested name is
    /// unknown.
    legend_idx: usize,
    /// Requested legend column name (carried into the sort directive).
    legend_name: String,
    /// Resolved series columns as (instruction name, column index).
    series: Vec<(String, usize)>,
    group_idx: Option<usize>,
}

fn resolve_columns(data: &TableData, instructions: &InstructionSet) -> ResolvedColumns {
    let series_names = match instructions.series() {
        Some(names) => names,
        // Default series: the second result column.
        None => match data.columns.get(1) {
            Some(second) => vec![second.clone()],
            None => {
                warn!("result set has no second column to use as default series");
                Vec::new()
            }
        },
    };

    let series = series_names
        .into_iter()
        .filter_map(|name| match data.column_index(&name) {
            Some(idx) => Some((name, idx)),
            None => {
                warn!("series column '{}' not found, skipping", name);
                None
            }
        })
        .collect();

    let legend_name = instructions
        .legends()
        .or_else(|| data.columns.first().cloned())
        .unwrap_or_default();
    let legend_idx = data.column_index(&legend_name).unwrap_or_else(|| {
        warn!("legend column '{}' not found, using first column", legend_name);
        0
    });

    let group_idx = instructions.group_by().and_then(|name| {
        let idx = data.column_index(name);
        if idx.is_none() {
            warn!("groupBy column '{}' not found, grouping disabled", name);
        }
        idx
    });

    ResolvedColumns {
        legend_idx,
        legend_name,
        series,
        group_idx,
    }
}

/// Build a bar or line chart specification.
pub fn build_xy(kind: Representation, data: &TableData, instructions: &InstructionSet) -> ChartSpec {
    debug_assert!(matches!(kind, Representation::Bar | Representation::Line));

    let formatting = instructions.formatting();
    let cols = resolve_columns(data, instructions);
    let y_axes = instructions.y_axes();
    let sort = instructions.sort(&cols.legend_name, SortDirection::Asc);

    // Bar charts plot against the sorted unique legend values; line charts
    // keep one label per row in source order. Grouping always aligns values
    // on the sorted unique set, since rows of one group cover only part of
    // the legend domain.
    let unique_labels = sorted_unique(data, cols.legend_idx);
    let labels: Vec<String> = if cols.group_idx.is_some() || kind == Representation::Bar {
        unique_labels
    } else {
        data.rows
            .iter()
            .map(|row| cell_str(row, cols.legend_idx).to_string())
            .collect()
    };

    let mut datasets = Vec::new();

    if let Some(group_idx) = cols.group_idx {
        let groups = sorted_unique(data, group_idx);
        let multi_series = cols.series.len() > 1;

        for (series_name, col) in &cols.series {
            for (category_index, group_value) in groups.iter().enumerate() {
                let mut by_label: HashMap<&str, f64> =
                    labels.iter().map(|l| (l.as_str(), 0.0)).collect();
                for row in &data.rows {
                    if cell_str(row, group_idx) != group_value {
                        continue;
                    }
                    if let Some(slot) = by_label.get_mut(cell_str(row, cols.legend_idx)) {
                        *slot = cell_number(row, *col);
                    }
                }
                let values = labels.iter().map(|l| by_label[l.as_str()]).collect();

                let label = if multi_series {
                    format!("{} - {}", series_name, group_value)
                } else {
                    group_value.clone()
                };

                datasets.push(make_dataset(
                    kind,
                    label,
                    values,
                    category_index,
                    &formatting,
                    axis_for(&y_axes, series_name),
                ));
            }
        }
    } else {
        for (series_index, (series_name, col)) in cols.series.iter().enumerate() {
            let values: Vec<f64> = if kind == Representation::Bar {
                // Values are looked up per unique label; a later row for the
                // same label overwrites the earlier one.
                let mut by_label: HashMap<&str, f64> =
                    labels.iter().map(|l| (l.as_str(), 0.0)).collect();
                for row in &data.rows {
                    if let Some(slot) = by_label.get_mut(cell_str(row, cols.legend_idx)) {
                        *slot = cell_number(row, *col);
                    }
                }
                labels.iter().map(|l| by_label[l.as_str()]).collect()
            } else {
                data.rows.iter().map(|row| cell_number(row, *col)).collect()
            };

            datasets.push(make_dataset(
                kind,
                series_name.clone(),
                values,
                series_index,
                &formatting,
                axis_for(&y_axes, series_name),
            ));
        }
    }

    ChartSpec {
        labels,
        datasets,
        axes: axis_configs(&y_axes, &formatting),
        sort,
    }
}

/// Build pie chart specifications: a single pie, or one pie per distinct
/// group value when `groupBy` is set.
pub fn build_pie(data: &TableData, instructions: &InstructionSet) -> Vec<PieSpec> {
    let formatting = instructions.formatting();
    let cols = resolve_columns(data, instructions);
    let sort = instructions.sort(&cols.legend_name, SortDirection::Desc);

    // Pie charts plot exactly one series.
    let Some((_, value_col)) = cols.series.first() else {
        warn!("no usable series column for pie chart, skipping");
        return Vec::new();
    };
    let value_col = *value_col;

    let build_one = |group: Option<String>, rows: Vec<&Vec<String>>| -> PieSpec {
        let mut labels = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        let mut background_colors = Vec::with_capacity(rows.len());
        let mut border_colors = Vec::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate() {
            labels.push(cell_str(row, cols.legend_idx).to_string());
            values.push(cell_number(row, value_col));
            background_colors.push(
                override_or(&formatting.background_overrides, i, palette::background(i)),
            );
            border_colors.push(override_or(&formatting.border_overrides, i, palette::border(i)));
        }

        PieSpec {
            group,
            labels,
            values,
            background_colors,
            border_colors,
            sort: sort.clone(),
        }
    };

    match cols.group_idx {
        Some(group_idx) => sorted_unique(data, group_idx)
            .into_iter()
            .map(|group_value| {
                let rows = data
                    .rows
                    .iter()
                    .filter(|row| cell_str(row, group_idx) == group_value)
                    .collect();
                build_one(Some(group_value), rows)
            })
            .collect(),
        None => vec![build_one(None, data.rows.iter().collect())],
    }
}

fn make_dataset(
    kind: Representation,
    label: String,
    data: Vec<f64>,
    color_index: usize,
    formatting: &crate::parser::Formatting,
    y_axis_id: Option<String>,
) -> Dataset {
    let (background, border) = match kind {
        // Line datasets draw fill and stroke in the same opaque color.
        Representation::Line => (palette::line(color_index), palette::line(color_index)),
        _ => (
            palette::background(color_index),
            palette::border(color_index),
        ),
    };

    let (border_width, tension, point_radius, fill) = match kind {
        Representation::Bar => (Some(formatting.border_width.unwrap_or(1)), None, None, None),
        Representation::Line => (
            None,
            Some(f64::from(formatting.tension.unwrap_or(0)) / 100.0),
            Some(if formatting.show_points.unwrap_or(true) { 3 } else { 0 }),
            Some(false),
        ),
        _ => (None, None, None, None),
    };

    Dataset {
        label,
        data,
        background_color: override_or(&formatting.background_overrides, color_index, background),
        border_color: override_or(&formatting.border_overrides, color_index, border),
        border_width,
        tension,
        point_radius,
        fill,
        y_axis_id,
    }
}

/// Axis binding for a series; the primary axis stays implicit.
fn axis_for(y_axes: &BTreeMap<String, String>, series_name: &str) -> Option<String> {
    y_axes
        .get(series_name)
        .filter(|id| id.as_str() != PRIMARY_AXIS)
        .cloned()
}

/// Configuration for every non-primary axis id referenced by `yAxes`,
/// filled from the formatting `yAxis` sub-map with right-hand placement and
/// the id itself as fallback title.
fn axis_configs(
    y_axes: &BTreeMap<String, String>,
    formatting: &crate::parser::Formatting,
) -> BTreeMap<String, AxisConfig> {
    let mut configs = BTreeMap::new();
    for id in y_axes.values() {
        if id == PRIMARY_AXIS || configs.contains_key(id) {
            continue;
        }
        let opts = formatting.axes.get(id);
        configs.insert(
            id.clone(),
            AxisConfig {
                position: opts
                    .and_then(|o| o.position.clone())
                    .unwrap_or_else(|| "right".to_string()),
                title: opts
                    .and_then(|o| o.title.clone())
                    .unwrap_or_else(|| id.clone()),
                color: opts.and_then(|o| o.color.clone()),
            },
        );
    }
    configs
}

fn override_or(overrides: &HashMap<usize, String>, index: usize, fallback: &str) -> String {
    overrides
        .get(&index)
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

/// Distinct values of one column, sorted lexicographically.
fn sorted_unique(data: &TableData, col: usize) -> Vec<String> {
    let set: BTreeSet<&str> = data.rows.iter().map(|row| cell_str(row, col)).collect();
    set.into_iter().map(str::to_string).collect()
}

fn cell_str(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

/// Lenient numeric read: an unparsable cell contributes zero.
fn cell_number(row: &[String], col: usize) -> f64 {
    let raw = cell_str(row, col);
    raw.trim().parse().unwrap_or_else(|_| {
        debug!("cell '{}' is not numeric, using 0", raw);
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::InstructionSet;

    fn table() -> TableData {
        TableData::new(
            vec!["label".to_string(), "value".to_string()],
            vec![
                vec!["b".to_string(), "1".to_string()],
                vec!["a".to_string(), "2".to_string()],
                vec!["a".to_string(), "3".to_string()],
            ],
        )
    }

    fn sales_by_region() -> TableData {
        TableData::new(
            vec![
                "year".to_string(),
                "sales".to_string(),
                "region".to_string(),
            ],
            vec![
                vec!["2023".to_string(), "10".to_string(), "north".to_string()],
                vec!["2024".to_string(), "20".to_string(), "north".to_string()],
                vec!["2023".to_string(), "30".to_string(), "south".to_string()],
            ],
        )
    }

    #[test]
    fn test_bar_labels_sorted_and_deduplicated() {
        let instr = InstructionSet::parse("query=x");
        let spec = build_xy(Representation::Bar, &table(), &instr);
        assert_eq!(spec.labels, vec!["a", "b"]);
        assert_eq!(spec.datasets.len(), 1);
        // The duplicate "a" row later in the data wins.
        assert_eq!(spec.datasets[0].data, vec![3.0, 1.0]);
    }

    #[test]
    fn test_line_labels_keep_row_order_with_duplicates() {
        let instr = InstructionSet::parse("query=x");
        let spec = build_xy(Representation::Line, &table(), &instr);
        assert_eq!(spec.labels, vec!["b", "a", "a"]);
        assert_eq!(spec.datasets[0].data, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_default_series_is_second_column() {
        let instr = InstructionSet::parse("query=x");
        let spec = build_xy(Representation::Bar, &table(), &instr);
        assert_eq!(spec.datasets[0].label, "value");
    }

    #[test]
    fn test_missing_series_column_skipped() {
        let instr = InstructionSet::parse("query=x;series=[value, nonsense]");
        let spec = build_xy(Representation::Bar, &table(), &instr);
        assert_eq!(spec.datasets.len(), 1);
        assert_eq!(spec.datasets[0].label, "value");
    }

    #[test]
    fn test_unknown_legend_falls_back_to_first_column() {
        let instr = InstructionSet::parse("query=x;legends=bogus");
        let spec = build_xy(Representation::Bar, &table(), &instr);
        assert_eq!(spec.labels, vec!["a", "b"]);
    }

    #[test]
    fn test_column_matching_is_case_insensitive() {
        let instr = InstructionSet::parse("query=x;series=VALUE;legends=LABEL");
        let spec = build_xy(Representation::Bar, &table(), &instr);
        assert_eq!(spec.datasets.len(), 1);
        assert_eq!(spec.datasets[0].label, "VALUE");
    }

    #[test]
    fn test_grouped_bar_one_dataset_per_group() {
        let instr = InstructionSet::parse("query=x;series=sales;groupBy=region");
        let spec = build_xy(Representation::Bar, &sales_by_region(), &instr);
        assert_eq!(spec.labels, vec!["2023", "2024"]);
        assert_eq!(spec.datasets.len(), 2);
        // Single series: dataset label is the group value alone.
        assert_eq!(spec.datasets[0].label, "north");
        assert_eq!(spec.datasets[0].data, vec![10.0, 20.0]);
        // "south" has no 2024 row: zero-filled.
        assert_eq!(spec.datasets[1].label, "south");
        assert_eq!(spec.datasets[1].data, vec![30.0, 0.0]);
    }

    #[test]
    fn test_grouped_multi_series_label_combines_names() {
        let data = TableData::new(
            vec![
                "year".to_string(),
                "sales".to_string(),
                "costs".to_string(),
                "region".to_string(),
            ],
            vec![vec![
                "2023".to_string(),
                "10".to_string(),
                "4".to_string(),
                "north".to_string(),
            ]],
        );
        let instr = InstructionSet::parse("query=x;series=[sales, costs];groupBy=region");
        let spec = build_xy(Representation::Bar, &data, &instr);
        assert_eq!(spec.datasets.len(), 2);
        assert_eq!(spec.datasets[0].label, "sales - north");
        assert_eq!(spec.datasets[1].label, "costs - north");
    }

    #[test]
    fn test_unknown_group_by_disables_grouping() {
        let instr = InstructionSet::parse("query=x;series=sales;groupBy=bogus");
        let spec = build_xy(Representation::Bar, &sales_by_region(), &instr);
        assert_eq!(spec.datasets.len(), 1);
        assert_eq!(spec.datasets[0].label, "sales");
    }

    #[test]
    fn test_color_cycling_and_override() {
        // Ten series over one value column name each: force palette wrap.
        let columns: Vec<String> = std::iter::once("label".to_string())
            .chain((0..10).map(|i| format!("s{}", i)))
            .collect();
        let row: Vec<String> = std::iter::once("x".to_string())
            .chain((0..10).map(|i| i.to_string()))
            .collect();
        let data = TableData::new(columns, vec![row]);
        let series: Vec<String> = (0..10).map(|i| format!("s{}", i)).collect();
        let instr = InstructionSet::parse(&format!(
            "query=x;series=[{}];formatting={{backgroundColor3:\"#fff\"}}",
            series.join(", ")
        ));
        let spec = build_xy(Representation::Bar, &data, &instr);
        assert_eq!(spec.datasets.len(), 10);
        assert_eq!(spec.datasets[8].background_color, palette::BACKGROUND[0]);
        assert_eq!(spec.datasets[9].border_color, palette::BORDER[1]);
        assert_eq!(spec.datasets[3].background_color, "#fff");
        // Only index 3's background is overridden.
        assert_eq!(spec.datasets[3].border_color, palette::BORDER[3]);
        assert_eq!(spec.datasets[2].background_color, palette::BACKGROUND[2]);
    }

    #[test]
    fn test_line_dataset_extras() {
        let instr = InstructionSet::parse(
            "query=x;formatting={tension:40, showPoints:false}",
        );
        let spec = build_xy(Representation::Line, &table(), &instr);
        let ds = &spec.datasets[0];
        assert_eq!(ds.tension, Some(0.4));
        assert_eq!(ds.point_radius, Some(0));
        assert_eq!(ds.fill, Some(false));
        assert_eq!(ds.border_width, None);
        assert_eq!(ds.background_color, ds.border_color);
    }

    #[test]
    fn test_y_axes_assignment_and_config() {
        let data = TableData::new(
            vec![
                "year".to_string(),
                "sales".to_string(),
                "margin".to_string(),
            ],
            vec![vec!["2023".to_string(), "10".to_string(), "0.4".to_string()]],
        );
        let instr = InstructionSet::parse(
            "query=x;series=[sales, margin];yAxes={\"sales\":\"y\", \"margin\":\"pct\"};formatting={yAxis:{id:\"pct\",{position:\"left\",title:\"Margin %\"}}}",
        );
        let spec = build_xy(Representation::Bar, &data, &instr);
        assert_eq!(spec.datasets[0].y_axis_id, None); // primary axis
        assert_eq!(spec.datasets[1].y_axis_id.as_deref(), Some("pct"));
        let axis = &spec.axes["pct"];
        assert_eq!(axis.position, "left");
        assert_eq!(axis.title, "Margin %");
        assert!(!spec.axes.contains_key("y"));
    }

    #[test]
    fn test_y_axes_defaults_position_and_title() {
        let instr = InstructionSet::parse("query=x;series=value;yAxes={\"value\":\"y2\"}");
        let spec = build_xy(Representation::Bar, &table(), &instr);
        let axis = &spec.axes["y2"];
        assert_eq!(axis.position, "right");
        assert_eq!(axis.title, "y2");
        assert_eq!(axis.color, None);
    }

    #[test]
    fn test_sort_directive_defaults() {
        let instr = InstructionSet::parse("query=x;sortBy=value");
        let spec = build_xy(Representation::Bar, &table(), &instr);
        let sort = spec.sort.unwrap();
        assert_eq!(sort.by, "value");
        assert_eq!(sort.direction, SortDirection::Asc);
        assert_eq!(sort.legend, "label");

        let pies = build_pie(&table(), &instr);
        assert_eq!(pies[0].sort.as_ref().unwrap().direction, SortDirection::Desc);
    }

    #[test]
    fn test_pie_single_chart() {
        let instr = InstructionSet::parse("query=x");
        let pies = build_pie(&table(), &instr);
        assert_eq!(pies.len(), 1);
        let pie = &pies[0];
        assert_eq!(pie.group, None);
        assert_eq!(pie.labels, vec!["b", "a", "a"]);
        assert_eq!(pie.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(pie.background_colors[1], palette::BACKGROUND[1]);
    }

    #[test]
    fn test_grouped_pie_one_chart_per_group() {
        let instr = InstructionSet::parse("query=x;series=sales;groupBy=region");
        let pies = build_pie(&sales_by_region(), &instr);
        assert_eq!(pies.len(), 2);
        assert_eq!(pies[0].group.as_deref(), Some("north"));
        assert_eq!(pies[0].labels, vec!["2023", "2024"]);
        assert_eq!(pies[0].values, vec![10.0, 20.0]);
        assert_eq!(pies[1].group.as_deref(), Some("south"));
        assert_eq!(pies[1].values, vec![30.0]);
        // Color cycling restarts per group.
        assert_eq!(pies[1].background_colors[0], palette::BACKGROUND[0]);
    }

    #[test]
    fn test_pie_uses_first_series_only() {
        let instr = InstructionSet::parse("query=x;series=[value, label]");
        let pies = build_pie(&table(), &instr);
        assert_eq!(pies.len(), 1);
        assert_eq!(pies[0].values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_pie_without_usable_series_is_empty() {
        let instr = InstructionSet::parse("query=x;series=bogus");
        assert!(build_pie(&table(), &instr).is_empty());
    }

    #[test]
    fn test_non_numeric_cells_read_as_zero() {
        let data = TableData::new(
            vec!["label".to_string(), "value".to_string()],
            vec![vec!["a".to_string(), "n/a".to_string()]],
        );
        let instr = InstructionSet::parse("query=x");
        let spec = build_xy(Representation::Line, &data, &instr);
        assert_eq!(spec.datasets[0].data, vec![0.0]);
    }

    #[test]
    fn test_determinism() {
        let instr = InstructionSet::parse(
            "query=x;series=[sales];groupBy=region;sortBy=year;yAxes={\"sales\":\"y2\"}",
        );
        let a = build_xy(Representation::Bar, &sales_by_region(), &instr);
        let b = build_xy(Representation::Bar, &sales_by_region(), &instr);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
