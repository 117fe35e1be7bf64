//! Terminal and JSON rendering of a [`Report`].

use colored::*;
use serde::Serialize;
use serde_json::json;

use crate::engine::findings::{FindingRow, Severity};
use crate::engine::flatten::FlattenedRuleRow;
use crate::engine::summary::SummaryRow;
use crate::engine::{OutputShape, Report};
use crate::error::Result;
use crate::model::PLACEHOLDER;

/// A row with a fixed column order.
pub trait Tabular {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;

    /// Severity used to color the row, if any.
    fn severity(&self) -> Option<Severity> {
        None
    }
}

fn dash_or<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| v.to_string())
}

impl Tabular for SummaryRow {
    const HEADERS: &'static [&'static str] = &[
        "Security Group Name",
        "Security Group ID",
        "SG Description",
        "Region",
        "Usage",
        "Resource Name",
        "Resource ID",
        "Resource Type",
        "ENI ID",
        "Private IP",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.group_name.clone(),
            self.group_id.clone(),
            self.group_description.clone(),
            self.region.clone(),
            self.usage.to_string(),
            self.resource_name.clone(),
            self.resource_id.clone(),
            dash_or(self.resource_kind),
            self.interface_id.clone(),
            self.private_ip.clone(),
        ]
    }
}

impl Tabular for FlattenedRuleRow {
    const HEADERS: &'static [&'static str] = &[
        "Security Group Name",
        "Security Group ID",
        "SG Description",
        "Region",
        "Usage",
        "Direction",
        "Protocol",
        "Port Range",
        "Src Origin",
        "Src Parsed",
        "Des Origin",
        "Des Parsed",
        "Rules Src/Dst Description",
        "Resource Name",
        "Resource ID",
        "Resource Type",
        "ENI ID",
        "Private IP",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.group_name.clone(),
            self.group_id.clone(),
            self.group_description.clone(),
            self.region.clone(),
            self.usage.to_string(),
            dash_or(self.direction),
            self.protocol.clone(),
            self.port_range.clone(),
            self.source.clone(),
            self.source_parsed.clone(),
            self.destination.clone(),
            self.destination_parsed.clone(),
            self.origin_description.clone(),
            self.resource_name.clone(),
            self.resource_id.clone(),
            dash_or(self.resource_kind),
            self.interface_id.clone(),
            self.private_ip.clone(),
        ]
    }
}

impl Tabular for FindingRow {
    const HEADERS: &'static [&'static str] = &[
        "Findings",
        "Security Group Name",
        "Direction",
        "Protocol",
        "Port Range",
        "Src Parsed",
        "Des Parsed",
        "Rules Src/Dst Description",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.findings.clone(),
            self.group_name.clone(),
            self.direction.clone(),
            self.protocol.clone(),
            self.port_range.clone(),
            self.source_parsed.clone(),
            self.destination_parsed.clone(),
            self.origin_description.clone(),
        ]
    }

    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }
}

fn paint(text: &str, severity: Option<Severity>) -> ColoredString {
    match severity {
        Some(Severity::Critical) => text.red().bold(),
        Some(Severity::High) => text.yellow().bold(),
        Some(Severity::Medium) => text.bright_yellow(),
        Some(Severity::Low) => text.bright_black(),
        None => text.normal(),
    }
}

/// Aligned column table. The first column takes the row's severity color.
pub fn table<T: Tabular>(rows: &[T]) -> String {
    let cells: Vec<Vec<String>> = rows.iter().map(T::cells).collect();
    let mut widths: Vec<usize> = T::HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let pad = |text: &str, width: usize| format!("{:<width$}", text, width = width);
    let mut out = String::new();

    let header: Vec<String> = T::HEADERS
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(*h, *w).cyan().bold().to_string())
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    out.push_str(&rule.join("  ").bright_black().to_string());
    out.push('\n');

    for (row, line) in rows.iter().zip(&cells) {
        let severity = row.severity();
        let rendered: Vec<String> = line
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                let padded = pad(cell, *w);
                if i == 0 {
                    paint(&padded, severity).to_string()
                } else {
                    padded
                }
            })
            .collect();
        out.push_str(rendered.join("  ").trim_end());
        out.push('\n');
    }

    out
}

/// Render one shape of the report as a text table.
pub fn render_text(report: &Report, shape: OutputShape) -> String {
    match shape {
        OutputShape::Summary => table(&report.summary),
        OutputShape::Detail => table(&report.detail),
        OutputShape::Findings => table(&report.findings),
    }
}

fn rows_json<T: Serialize>(rows: &[T]) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(rows)?)
}

/// One shape of the report as a JSON object: region, shape, rows, and
/// per-severity counts for findings.
pub fn report_json(report: &Report, shape: OutputShape) -> Result<serde_json::Value> {
    let rows = match shape {
        OutputShape::Summary => rows_json(&report.summary)?,
        OutputShape::Detail => rows_json(&report.detail)?,
        OutputShape::Findings => rows_json(&report.findings)?,
    };

    let mut output = json!({
        "region": report.region,
        "shape": shape,
        "rows": rows,
    });
    if shape == OutputShape::Findings {
        output["critical"] = json!(report.count(Severity::Critical));
        output["high"] = json!(report.count(Severity::High));
        output["medium"] = json!(report.count(Severity::Medium));
        output["low"] = json!(report.count(Severity::Low));
    }

    Ok(output)
}

/// Render one shape of the report as pretty JSON.
pub fn render_json(report: &Report, shape: OutputShape) -> Result<String> {
    Ok(serde_json::to_string_pretty(&report_json(report, shape)?)?)
}

/// Render several regions' reports as one pretty JSON array.
pub fn render_json_all(reports: &[Report], shape: OutputShape) -> Result<String> {
    let values = reports
        .iter()
        .map(|r| report_json(r, shape))
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::to_string_pretty(&values)?)
}
