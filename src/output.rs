//! Terminal output for the command-line front end.
//!
//! All styling lives here so the rest of the CLI only says *what* to print.

use crate::engine::PlannedMove;
use crate::report::RunReport;
use crate::rules::RuleSet;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Prints styled messages, progress bars and summary tables.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use filesorter::output::OutputFormatter;
    /// OutputFormatter::success("Rules saved");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar sized once the engine reports its file count.
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(0);
        // The template is a constant; a parse failure would fall back to the default bar.
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Prints the per-folder counts of a completed run.
    pub fn summary_table(report: &RunReport) {
        Self::header("SUMMARY");
        Self::print_counts(&report.folder_counts(), report.moved_count);

        println!(
            "\nScanned {} {}, moved {}, failed {}.",
            report.total_files_scanned,
            plural(report.total_files_scanned),
            report.moved_count.to_string().green(),
            report.failed.len().to_string().red(),
        );
        if !report.created_folders.is_empty() {
            let created: Vec<&str> = report.created_folders.iter().map(String::as_str).collect();
            println!("Created folders: {}", created.join(", "));
        }
    }

    /// Prints what a dry run would do, followed by per-folder counts.
    pub fn preview_table(plan: &[PlannedMove]) {
        for planned in plan {
            println!(" - {}", planned.source_name);
            println!("   → Would move to {}/", planned.destination_folder);
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for planned in plan {
            *counts.entry(planned.destination_folder.as_str()).or_insert(0) += 1;
        }
        Self::header("DRY RUN SUMMARY");
        Self::print_counts(&counts, plan.len());
    }

    fn print_counts(counts: &BTreeMap<&str, usize>, total: usize) {
        let width = counts.keys().map(|name| name.len()).max().unwrap_or(0).max(6);

        println!("{:<width$} | {}", "Folder".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));
        for (folder, count) in counts {
            println!(
                "{:<width$} | {} {}",
                folder,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            plural(total),
            width = width
        );
    }

    /// Lists rules in priority order.
    pub fn rules_list(rules: &RuleSet) {
        if rules.is_empty() {
            Self::info("No rules defined; files are sorted by extension.");
            return;
        }
        for (position, rule) in rules.rules().iter().enumerate() {
            let tokens: Vec<&str> = rule.matchers.iter().map(|m| m.token()).collect();
            println!(
                "{:>3}. {} ← {}",
                position + 1,
                rule.folder.bold(),
                tokens.join(", ")
            );
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
