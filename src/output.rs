//! Output formatting and persistence for rosters and class lists.
//!
//! Supports terminal tables, JSON reports, and CSV export.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::grading::AggregationPolicy;
use crate::roster::{ClassInfo, FetchFailure, Page, Roster};
use crate::services::grading_api::UniversityClass;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// JSON document describing one rendered roster page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub class: &'a ClassInfo,
    pub policy: AggregationPolicy,
    pub page: Page<'a>,
    pub failures: &'a [FetchFailure],
}

impl<'a> RosterReport<'a> {
    pub fn new(roster: &'a Roster, page: Page<'a>) -> Self {
        Self {
            generated_at: Utc::now(),
            class: &roster.class,
            policy: roster.policy,
            page,
            failures: &roster.failures,
        }
    }
}

const ROSTER_HEADERS: [&str; 6] = [
    "Student ID",
    "Student Name",
    "Class ID",
    "Class Name",
    "Semester",
    "Final Grade",
];

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Renders one page of a roster as a terminal table with a page footer.
pub fn render_roster_table(page: &Page<'_>) -> String {
    let mut table = new_table();
    table.set_header(ROSTER_HEADERS.to_vec());
    for row in page.rows {
        table.add_row(vec![
            row.student_id.clone(),
            row.student_name.clone(),
            row.class_id.clone(),
            row.class_name.clone(),
            row.semester.clone(),
            row.final_grade.to_string(),
        ]);
    }
    format!(
        "{table}\nPage {} of {} ({} rows, {} per page)",
        page.page, page.total_pages, page.total_rows, page.page_size
    )
}

/// Renders the semester's classes as a terminal table.
pub fn render_class_table(classes: &[UniversityClass]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Class ID", "Title", "Semester", "Status"]);
    for class in classes {
        table.add_row(vec![
            class.class_id.clone(),
            class.title.clone(),
            class.semester.clone(),
            class.status.clone().unwrap_or_default(),
        ]);
    }
    table.to_string()
}

pub fn render_report_json(report: &RosterReport<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Writes the page's rows as CSV, with a header line.
pub fn write_csv<W: Write>(writer: W, page: &Page<'_>) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in page.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn render_csv(page: &Page<'_>) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, page)?;
    Ok(String::from_utf8(buf)?)
}

/// Renders `page` in `format`.
pub fn render(format: OutputFormat, roster: &Roster, page: Page<'_>) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_roster_table(&page)),
        OutputFormat::Json => render_report_json(&RosterReport::new(roster, page)),
        OutputFormat::Csv => render_csv(&page),
    }
}

/// Writes rendered output to `path`, replacing any existing file.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    debug!(path = %path.display(), bytes = content.len(), "Writing output file");
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    info!(path = %path.display(), "Output written");
    Ok(())
}
