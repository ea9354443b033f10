//! The record of one organization run and the artifacts rendered from it.
//!
//! A [`RunReport`] is created empty when a run starts, filled in by the engine
//! as files are moved, and handed to the caller once the run completes.
//! Rendering (HTML or JSON) is a pure step over the finished report.

use crate::error::SorterError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Filename prefix shared by every report artifact.
pub const REPORT_FILE_PREFIX: &str = "_Organization_Report_";

/// One successfully moved file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    /// Filename in the source folder.
    pub source_name: String,
    /// Destination folder name.
    pub destination_folder: String,
    /// Filename inside the destination folder, after collision avoidance.
    pub destination_name: String,
}

impl MoveRecord {
    /// True when collision avoidance had to pick a different name.
    pub fn was_renamed(&self) -> bool {
        self.source_name != self.destination_name
    }
}

/// A scanned file that could not be moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMove {
    pub source_name: String,
    pub reason: String,
}

/// Everything that happened during one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source_folder: PathBuf,
    pub total_files_scanned: usize,
    pub moved_count: usize,
    /// Folders this run had to create, sorted.
    pub created_folders: BTreeSet<String>,
    /// Moves in the order they happened.
    pub move_log: Vec<MoveRecord>,
    pub failed: Vec<FailedMove>,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl RunReport {
    pub(crate) fn new(source_folder: PathBuf) -> Self {
        Self {
            source_folder,
            total_files_scanned: 0,
            moved_count: 0,
            created_folders: BTreeSet::new(),
            move_log: Vec::new(),
            failed: Vec::new(),
            started_at: Local::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record_move(&mut self, record: MoveRecord) {
        self.moved_count += 1;
        self.move_log.push(record);
    }

    pub(crate) fn record_failure(&mut self, source_name: String, reason: String) {
        self.failed.push(FailedMove {
            source_name,
            reason,
        });
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Some(Local::now());
        self
    }

    /// Number of moved files per destination folder.
    pub fn folder_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.move_log {
            *counts.entry(record.destination_folder.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const REPORT_STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; background-color: #fdfdfd; color: #333; }
h1, h2 { border-bottom: 2px solid #007bff; padding-bottom: 5px; }
ul { list-style-type: none; padding: 0; }
li { background: #f4f4f4; margin: 5px 0; padding: 10px; border-left: 5px solid #007bff; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { padding: 12px; border: 1px solid #ddd; text-align: left; }
th { background-color: #007bff; color: white; }
tr:nth-child(even) { background-color: #f2f2f2; }
";

/// Renders the report as a standalone HTML page.
pub fn render_html(report: &RunReport) -> String {
    let generated_at = report.finished_at.unwrap_or_else(Local::now);

    let created = if report.created_folders.is_empty() {
        "None".to_string()
    } else {
        report
            .created_folders
            .iter()
            .map(|f| escape_html(f))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut rows = String::new();
    for record in &report.move_log {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&record.source_name),
            escape_html(&record.destination_folder),
            escape_html(&record.destination_name),
        ));
    }

    let mut failures = String::new();
    if !report.failed.is_empty() {
        failures.push_str("<h2>Files Not Moved</h2>\n<table>\n<tr><th>File</th><th>Reason</th></tr>\n");
        for failure in &report.failed {
            failures.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                escape_html(&failure.source_name),
                escape_html(&failure.reason),
            ));
        }
        failures.push_str("</table>\n");
    }

    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"UTF-8\">
<title>Organization Report</title>
<style>
{style}</style>
</head>
<body>
<h1>Organization Report</h1>
<p><strong>Source folder:</strong> {source}</p>
<p><strong>Date:</strong> {date}</p>
<h2>Summary</h2>
<ul>
<li><strong>Files scanned:</strong> {scanned}</li>
<li><strong>Files moved:</strong> {moved}</li>
<li><strong>Folders created:</strong> {created_count} ({created})</li>
</ul>
<h2>Move Log</h2>
<table>
<tr><th>Original File</th><th>Destination Folder</th><th>New Name</th></tr>
{rows}</table>
{failures}</body>
</html>
",
        style = REPORT_STYLE,
        source = escape_html(&report.source_folder.display().to_string()),
        date = generated_at.format("%Y-%m-%d %H:%M:%S"),
        scanned = report.total_files_scanned,
        moved = report.moved_count,
        created_count = report.created_folders.len(),
        created = created,
        rows = rows,
        failures = failures,
    )
}

fn report_path(report: &RunReport, dir: &Path, extension: &str) -> PathBuf {
    let stamp = report.finished_at.unwrap_or_else(Local::now);
    dir.join(format!(
        "{}{}.{}",
        REPORT_FILE_PREFIX,
        stamp.format("%Y-%m-%d_%H%M%S"),
        extension
    ))
}

fn write_artifact(path: PathBuf, contents: &str) -> Option<PathBuf> {
    match fs::write(&path, contents) {
        Ok(()) => {
            log::info!("Report written to {}", path.display());
            Some(path)
        }
        Err(e) => {
            log::error!("{}", SorterError::ReportWrite { path, source: e });
            None
        }
    }
}

/// Writes the HTML report into `dir`.
///
/// Returns the written path, or `None` (after logging) if writing failed.
pub fn write_html_report(report: &RunReport, dir: &Path) -> Option<PathBuf> {
    write_artifact(report_path(report, dir, "html"), &render_html(report))
}

/// Writes the JSON export of the report into `dir`.
///
/// Returns the written path, or `None` (after logging) if writing failed.
pub fn write_json_report(report: &RunReport, dir: &Path) -> Option<PathBuf> {
    match report.to_json() {
        Ok(json) => write_artifact(report_path(report, dir, "json"), &json),
        Err(e) => {
            log::error!("Could not serialize report: {}", e);
            None
        }
    }
}

/// True for filenames produced by [`write_html_report`] or [`write_json_report`].
pub fn is_report_file(file_name: &str) -> bool {
    file_name.starts_with(REPORT_FILE_PREFIX)
        && (file_name.ends_with(".html") || file_name.ends_with(".json"))
}
