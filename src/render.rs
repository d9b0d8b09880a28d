//! Markup emission: each specification becomes an HTML fragment carrying the
//! declarative configuration for a browser-side table/chart library.
//!
//! Charts render as a container with a `<canvas>` plus a JSON config block
//! the page script feeds to the chart library; tables render as plain HTML
//! with the style annotations inlined. Element ids are supplied by the
//! assembler, so output is a pure function of its inputs.

use crate::chart::{ChartSpec, PieSpec, Representation};
use crate::parser::formatting::ValuePosition;
use crate::parser::Formatting;
use crate::table::TableSpec;
use serde_json::{json, Value};
use std::fmt::Write;

/// Escape text for interpolation into HTML body or attribute positions.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn style_attr(style: &Option<String>) -> String {
    match style {
        Some(s) => format!(" style=\"{}\"", escape_html(s)),
        None => String::new(),
    }
}

/// Render a table specification as an HTML table.
pub fn table(spec: &TableSpec, id: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<table id=\"{}\" class=\"display\" style=\"width:100%\"><thead><tr>",
        id
    );

    for column in &spec.columns {
        let _ = write!(
            html,
            "<th{}>{}</th>",
            style_attr(&column.style),
            escape_html(&column.name)
        );
    }
    html.push_str("</tr></thead><tbody>");

    for row in &spec.rows {
        let _ = write!(html, "<tr{}>", style_attr(&row.style));
        for cell in &row.cells {
            let _ = write!(
                html,
                "<td{}>{}</td>",
                style_attr(&cell.style),
                escape_html(&cell.text)
            );
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table>");
    html
}

/// Render a bar or line chart: container, canvas, and the JSON config block.
pub fn chart(
    kind: Representation,
    spec: &ChartSpec,
    formatting: &Formatting,
    id: &str,
) -> String {
    let config = chart_config(kind, spec, formatting);
    format!(
        "<div class=\"report-chart\" style=\"width:100%; height:400px;\"><canvas id=\"{id}\"></canvas></div>\n\
         <script type=\"application/json\" data-chart=\"{id}\">{config}</script>"
    )
}

fn chart_config(kind: Representation, spec: &ChartSpec, formatting: &Formatting) -> Value {
    let title = formatting
        .title
        .clone()
        .unwrap_or_else(|| kind.default_title().to_string());

    let mut scales = json!({
        "x": {"display": true},
        "y": {"display": true, "beginAtZero": true},
    });
    if kind == Representation::Bar {
        scales["x"] = json!({
            "type": "category",
            "display": true,
            "grid": {"offset": false},
            "ticks": {"autoSkip": false},
        });
        scales["y"]["stacked"] = json!(formatting.stacked.unwrap_or(false));
    }
    for (axis_id, axis) in &spec.axes {
        let mut axis_value = json!({
            "display": true,
            "position": axis.position,
            "title": {"display": true, "text": axis.title},
        });
        if let Some(color) = &axis.color {
            axis_value["ticks"] = json!({"color": color});
        }
        scales[axis_id.as_str()] = axis_value;
    }

    let mut options = json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "scales": scales,
        "plugins": {
            "legend": {"display": true, "position": "top"},
            "title": {"display": true, "text": title},
        },
    });
    if kind == Representation::Bar {
        options["indexAxis"] = if formatting.horizontal.unwrap_or(false) {
            json!("y")
        } else {
            json!("x")
        };
    }

    let mut config = json!({
        "type": match kind {
            Representation::Bar => "bar",
            _ => "line",
        },
        "data": {"labels": spec.labels, "datasets": spec.datasets},
        "options": options,
    });
    if let Some(sort) = &spec.sort {
        config["sort"] = json!(sort);
    }
    config
}

/// Render pie chart specifications: a single chart, or a wrapping grid with
/// one titled chart per group.
pub fn pies(specs: &[PieSpec], formatting: &Formatting, id: &str) -> String {
    match specs {
        [] => "<div class=\"report-chart report-chart-empty\"></div>".to_string(),
        [single] if single.group.is_none() => {
            let config = pie_config(single, formatting);
            format!(
                "<div class=\"report-chart\" style=\"width:100%; height:400px;\"><canvas id=\"{id}\"></canvas></div>\n\
                 <script type=\"application/json\" data-chart=\"{id}\">{config}</script>"
            )
        }
        grouped => {
            let mut html = String::from(
                "<div class=\"report-chart-grid\" style=\"width:100%; display:flex; flex-wrap:wrap; justify-content:center;\">",
            );
            for (group_index, spec) in grouped.iter().enumerate() {
                let chart_id = format!("{}_{}", id, group_index);
                let heading = spec.group.as_deref().unwrap_or_default();
                let config = pie_config(spec, formatting);
                let _ = write!(
                    html,
                    "<div style=\"flex: 1; min-width: 300px; max-width: 500px; margin: 10px;\">\
                     <h3 style=\"text-align: center;\">{}</h3>\
                     <div style=\"height: 300px;\"><canvas id=\"{chart_id}\"></canvas></div>\n\
                     <script type=\"application/json\" data-chart=\"{chart_id}\">{config}</script>\
                     </div>",
                    escape_html(heading)
                );
            }
            html.push_str("</div>");
            html
        }
    }
}

fn pie_config(spec: &PieSpec, formatting: &Formatting) -> Value {
    let title = formatting
        .title
        .clone()
        .unwrap_or_else(|| Representation::Pie.default_title().to_string());
    let value_position = formatting
        .value_position
        .unwrap_or(ValuePosition::Legend);

    let mut config = json!({
        "type": if formatting.doughnut.unwrap_or(false) { "doughnut" } else { "pie" },
        "data": {
            "labels": spec.labels,
            "datasets": [{
                "data": spec.values,
                "backgroundColor": spec.background_colors,
                "borderColor": spec.border_colors,
                "borderWidth": 1,
            }],
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": {
                "legend": {"display": formatting.show_legend.unwrap_or(true), "position": "right"},
                "title": {"display": true, "text": title},
            },
        },
        "valueLabels": {
            "showValues": formatting.show_values.unwrap_or(true),
            "showPercentages": formatting.show_percentages.unwrap_or(true),
            "position": value_position.as_str(),
        },
    });
    if let Some(sort) = &spec.sort {
        config["sort"] = json!(sort);
    }
    config
}
