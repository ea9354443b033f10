//! Command-line front end for filesorter.
//!
//! This module is the startup collaborator and the observer of a run:
//! - resolves the configuration and rule file paths once
//! - runs the engine on a worker thread and renders its events
//! - writes the report artifacts of a completed run
//! - manages the saved rule set

use crate::config::AppConfig;
use crate::engine::{EngineEvent, EngineOptions, OrganizeEngine, RunOutcome, preview};
use crate::output::OutputFormatter;
use crate::report::{RunReport, write_html_report, write_json_report};
use crate::rule_store::RuleStore;
use crate::rules::{Rule, is_valid_folder_name};
use colored::*;
use std::path::{Path, PathBuf};

/// A command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortCommand {
    /// Sort the files of a folder.
    Organize {
        dir: PathBuf,
        /// Only show where files would go.
        dry_run: bool,
        /// Write report artifacts after a completed run.
        write_report: bool,
    },
    /// Print the saved rules in priority order.
    ShowRules,
    /// Replace the saved rules with the contents of a rule file in either shape.
    ImportRules { file: PathBuf },
    /// Append a rule with the lowest priority.
    AddRule { folder: String, tokens: Vec<String> },
}

/// Runs a command using the default configuration lookup.
pub fn run_cli(command: SortCommand) -> Result<(), String> {
    run_cli_with_config(command, None, None)
}

/// Runs a command with an optional configuration file and rule file override.
///
/// ```no_run
/// use filesorter::cli::{SortCommand, run_cli_with_config};
/// use std::path::{Path, PathBuf};
///
/// let command = SortCommand::Organize {
///     dir: PathBuf::from("/home/me/Downloads"),
///     dry_run: true,
///     write_report: false,
/// };
/// if let Err(e) = run_cli_with_config(command, None, Some(Path::new("rules.json"))) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli_with_config(
    command: SortCommand,
    config_path: Option<&Path>,
    rules_path: Option<&Path>,
) -> Result<(), String> {
    let config = AppConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let store = RuleStore::new(config.rules_path(rules_path));

    match command {
        SortCommand::Organize {
            dir,
            dry_run,
            write_report,
        } => {
            if dry_run {
                organize_dry_run(&dir, &config, &store)
            } else {
                organize_directory(&dir, &config, &store, write_report).map(|_| ())
            }
        }
        SortCommand::ShowRules => {
            OutputFormatter::header(&format!("Rules ({})", store.path().display()));
            OutputFormatter::rules_list(&store.load());
            Ok(())
        }
        SortCommand::ImportRules { file } => import_rules(&file, &store),
        SortCommand::AddRule { folder, tokens } => add_rule(&store, &folder, &tokens),
    }
}

fn engine_options(config: &AppConfig, store: &RuleStore) -> Result<EngineOptions, String> {
    let filters = config
        .filters
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    Ok(EngineOptions {
        rules: store.load(),
        filters,
    })
}

/// Organizes `dir`, rendering progress as the worker reports it.
///
/// Returns the report of a completed run, `None` if it was cancelled, and an
/// error if the folder could not be organized at all.
pub fn organize_directory(
    dir: &Path,
    config: &AppConfig,
    store: &RuleStore,
    write_report: bool,
) -> Result<Option<RunReport>, String> {
    OutputFormatter::info(&format!("Organizing contents of: {}", dir.display()));

    let options = engine_options(config, store)?;
    let handle = OrganizeEngine::new(options).spawn(dir);
    let pb = OutputFormatter::create_progress_bar();

    for event in handle.events() {
        match event {
            EngineEvent::TotalFiles(total) => {
                pb.set_length(total as u64);
                pb.set_message(format!("{} files found", total));
            }
            EngineEvent::Progress(done) => pb.set_position(done as u64),
            EngineEvent::Log(message) => pb.println(format!("{} {}", "✓".green(), message)),
            EngineEvent::Error(message) => pb.println(format!("{} {}", "✗".red(), message)),
            EngineEvent::Cancelled(message) => pb.abandon_with_message(message),
            EngineEvent::Done(message) => pb.finish_with_message(message),
        }
    }

    match handle.join() {
        RunOutcome::Completed(report) => {
            OutputFormatter::summary_table(&report);
            if !report.failed.is_empty() {
                OutputFormatter::warning("Some files could not be moved. Please review errors above.");
            }
            if write_report {
                write_reports(&report, config);
            }
            Ok(Some(report))
        }
        RunOutcome::Cancelled => {
            OutputFormatter::warning("Organization cancelled. Files already moved stay in place.");
            Ok(None)
        }
        RunOutcome::Fatal(e) => Err(format!("Error: {}", e)),
    }
}

fn write_reports(report: &RunReport, config: &AppConfig) {
    let dir = config
        .report
        .dir
        .clone()
        .unwrap_or_else(|| report.source_folder.clone());

    let mut written = Vec::new();
    if config.report.html {
        written.push(write_html_report(report, &dir));
    }
    if config.report.json {
        written.push(write_json_report(report, &dir));
    }

    for path in written {
        match path {
            Some(path) => OutputFormatter::success(&format!("Report saved to {}", path.display())),
            None => OutputFormatter::warning("Could not write the report; see the log for details."),
        }
    }
}

/// Shows where every file would go without touching anything.
fn organize_dry_run(dir: &Path, config: &AppConfig, store: &RuleStore) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", dir.display()));

    let options = engine_options(config, store)?;
    let plan = preview(dir, &options).map_err(|e| format!("Error: {}", e))?;

    if plan.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    OutputFormatter::preview_table(&plan);
    OutputFormatter::success("Dry run complete. No files were modified.");
    Ok(())
}

fn import_rules(file: &Path, store: &RuleStore) -> Result<(), String> {
    let rules = RuleStore::new(file)
        .try_load()
        .map_err(|e| format!("Error importing rules: {}", e))?;
    store
        .save(&rules)
        .map_err(|e| format!("Error saving rules: {}", e))?;
    OutputFormatter::success(&format!(
        "Imported {} rules into {}",
        rules.len(),
        store.path().display()
    ));
    Ok(())
}

fn add_rule(store: &RuleStore, folder: &str, tokens: &[String]) -> Result<(), String> {
    let rule = Rule::new(folder, tokens);
    if !is_valid_folder_name(&rule.folder) {
        return Err(format!("'{}' is not a valid folder name", folder.trim()));
    }
    if rule.matchers.is_empty() {
        return Err("A rule needs at least one keyword or extension".to_string());
    }

    let mut rules = store.load();
    let folder = rule.folder.clone();
    rules.push(rule);
    store
        .save(&rules)
        .map_err(|e| format!("Error saving rules: {}", e))?;
    OutputFormatter::success(&format!("Added rule for {} ({} rules total)", folder, rules.len()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_add_rule_appends_with_lowest_priority() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RuleStore::new(temp_dir.path().join("rules.json"));

        add_rule(&store, "invoices", &["invoice".to_string()]).unwrap();
        add_rule(&store, "docs", &[".pdf".to_string()]).unwrap();

        let rules = store.load();
        assert_eq!(rules.rules()[0].folder, "INVOICES");
        assert_eq!(rules.rules()[1].folder, "DOCS");
    }

    #[test]
    fn test_add_rule_rejects_empty_tokens() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RuleStore::new(temp_dir.path().join("rules.json"));

        assert!(add_rule(&store, "docs", &[" ".to_string()]).is_err());
        assert!(add_rule(&store, "  ", &["x".to_string()]).is_err());
    }

    #[test]
    fn test_add_rule_rejects_paths_as_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RuleStore::new(temp_dir.path().join("rules.json"));

        assert!(add_rule(&store, "../outside", &["x".to_string()]).is_err());
        assert!(add_rule(&store, "..", &["x".to_string()]).is_err());
        assert!(add_rule(&store, "a/b", &["x".to_string()]).is_err());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_import_converts_legacy_mapping() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let legacy = temp_dir.path().join("legacy.json");
        fs::write(&legacy, r#"{ "Images": ["png"] }"#).unwrap();
        let store = RuleStore::new(temp_dir.path().join("rules.json"));

        import_rules(&legacy, &store).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            saved,
            serde_json::json!([{ "folder": "IMAGES", "keywords": [".png"] }])
        );
    }

    #[test]
    fn test_import_missing_file_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RuleStore::new(temp_dir.path().join("rules.json"));
        assert!(import_rules(&temp_dir.path().join("nope.json"), &store).is_err());
        assert!(!store.path().exists());
    }
}
