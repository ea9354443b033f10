//! Rule suggestions from an outside service.
//!
//! The engine never calls a suggester. Callers ask for a suggestion, show it
//! to the user and, if accepted, save it with the rule store before running
//! the engine.

use crate::error::{Result, SorterError};
use crate::rules::RuleSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Most filenames offered to a suggester in one request.
pub const MAX_SUGGESTION_FILES: usize = 150;

/// Something that proposes a rule set from filenames and a free-text request.
pub trait RuleSuggester {
    /// Returns proposed rules, or a human-readable reason for failing.
    fn suggest(&self, filenames: &[String], request: &str) -> std::result::Result<RuleSet, String>;
}

/// Result of asking a [`RuleSuggester`] for rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    /// The suggester proposed at least one rule.
    Rules(RuleSet),
    /// There was nothing to suggest, or the suggester proposed no rules.
    Empty,
    /// The request could not be served.
    Failed(String),
}

/// Collects the filenames of `dir` for a suggestion request.
fn suggestion_filenames(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(SorterError::InvalidSource {
            path: PathBuf::from(dir),
        });
    }

    Ok(fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| match entry.file_type() {
            Ok(file_type) => file_type.is_file(),
            Err(e) => {
                log::warn!("Cannot read file type of {}: {}", entry.path().display(), e);
                false
            }
        })
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .take(MAX_SUGGESTION_FILES)
        .collect())
}

/// Asks `suggester` for rules for the files in `dir`.
///
/// Never fails: an invalid folder or a suggester error becomes
/// [`SuggestionOutcome::Failed`], and an empty folder returns
/// [`SuggestionOutcome::Empty`] without calling the suggester.
pub fn request_suggestion(
    suggester: &dyn RuleSuggester,
    dir: &Path,
    request: &str,
) -> SuggestionOutcome {
    let filenames = match suggestion_filenames(dir) {
        Ok(names) => names,
        Err(e) => {
            log::error!("{}", e);
            return SuggestionOutcome::Failed(e.to_string());
        }
    };

    if filenames.is_empty() {
        return SuggestionOutcome::Empty;
    }

    match suggester.suggest(&filenames, request) {
        Ok(rules) if rules.is_empty() => SuggestionOutcome::Empty,
        Ok(rules) => SuggestionOutcome::Rules(rules),
        Err(reason) => {
            log::error!("Rule suggestion failed: {}", reason);
            SuggestionOutcome::Failed(reason)
        }
    }
}

/// Parses a text response holding a JSON rule list.
///
/// Markdown code fences around the JSON are removed first. Only the list
/// shape is accepted, and rules with unsafe folder names are dropped.
pub fn parse_suggestion_response(text: &str) -> Result<RuleSet> {
    let cleaned = text
        .trim()
        .replace("```json", "")
        .replace("```", "");
    let cleaned = cleaned.trim();

    if !cleaned.starts_with('[') {
        return Err(SorterError::RulesParse {
            path: PathBuf::new(),
            reason: "suggestion is not a JSON list of rules".to_string(),
        });
    }
    let mut rules: RuleSet = serde_json::from_str(cleaned)?;
    rules.retain_valid_folders();
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct FixedSuggester {
        response: std::result::Result<RuleSet, String>,
        seen: RefCell<Vec<String>>,
    }

    impl FixedSuggester {
        fn new(response: std::result::Result<RuleSet, String>) -> Self {
            Self {
                response,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl RuleSuggester for FixedSuggester {
        fn suggest(
            &self,
            filenames: &[String],
            _request: &str,
        ) -> std::result::Result<RuleSet, String> {
            self.seen.borrow_mut().extend(filenames.iter().cloned());
            self.response.clone()
        }
    }

    fn folder_with(names: &[&str]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for name in names {
            fs::write(temp_dir.path().join(name), "x").expect("Failed to write file");
        }
        temp_dir
    }

    #[test]
    fn test_rules_are_returned() {
        let dir = folder_with(&["invoice_1.pdf"]);
        let rules = RuleSet::new(vec![Rule::new("invoices", ["invoice"])]);
        let suggester = FixedSuggester::new(Ok(rules.clone()));

        let outcome = request_suggestion(&suggester, dir.path(), "sort my invoices");
        assert_eq!(outcome, SuggestionOutcome::Rules(rules));
        assert_eq!(*suggester.seen.borrow(), vec!["invoice_1.pdf".to_string()]);
    }

    #[test]
    fn test_empty_folder_skips_suggester() {
        let dir = folder_with(&[]);
        let suggester = FixedSuggester::new(Err("should not be called".to_string()));

        assert_eq!(
            request_suggestion(&suggester, dir.path(), "tidy up"),
            SuggestionOutcome::Empty
        );
        assert!(suggester.seen.borrow().is_empty());
    }

    #[test]
    fn test_no_rules_is_empty() {
        let dir = folder_with(&["a.txt"]);
        let suggester = FixedSuggester::new(Ok(RuleSet::default()));
        assert_eq!(
            request_suggestion(&suggester, dir.path(), "tidy up"),
            SuggestionOutcome::Empty
        );
    }

    #[test]
    fn test_suggester_error_is_failed() {
        let dir = folder_with(&["a.txt"]);
        let suggester = FixedSuggester::new(Err("service unavailable".to_string()));
        assert_eq!(
            request_suggestion(&suggester, dir.path(), "tidy up"),
            SuggestionOutcome::Failed("service unavailable".to_string())
        );
    }

    #[test]
    fn test_invalid_folder_is_failed() {
        let suggester = FixedSuggester::new(Ok(RuleSet::default()));
        let outcome = request_suggestion(&suggester, Path::new("/non/existent"), "tidy up");
        assert!(matches!(outcome, SuggestionOutcome::Failed(_)));
    }

    #[test]
    fn test_filenames_are_capped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for i in 0..(MAX_SUGGESTION_FILES + 10) {
            fs::write(temp_dir.path().join(format!("file_{}.txt", i)), "x")
                .expect("Failed to write file");
        }
        let suggester = FixedSuggester::new(Ok(RuleSet::default()));

        request_suggestion(&suggester, temp_dir.path(), "tidy up");
        assert_eq!(suggester.seen.borrow().len(), MAX_SUGGESTION_FILES);
    }

    #[test]
    fn test_parse_fenced_response() {
        let text = "```json\n[{ \"folder\": \"Reports\", \"keywords\": [\"report\", \".PDF\"] }]\n```";
        let rules = parse_suggestion_response(text).unwrap();
        assert_eq!(rules.rules()[0].folder, "REPORTS");
        assert_eq!(rules.rules()[0].matchers.len(), 2);
    }

    #[test]
    fn test_parse_rejects_mapping_and_prose() {
        assert!(parse_suggestion_response(r#"{ "Images": ["png"] }"#).is_err());
        assert!(parse_suggestion_response("Sorry, I cannot help with that.").is_err());
        assert!(parse_suggestion_response("[{ \"folder\": 1 }]").is_err());
    }

    #[test]
    fn test_parse_drops_unsafe_folders() {
        let text = r#"[
            { "folder": "../outside", "keywords": ["a"] },
            { "folder": "/tmp", "keywords": ["b"] },
            { "folder": "Reports", "keywords": ["report"] }
        ]"#;
        let rules = parse_suggestion_response(text).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.rules()[0].folder, "REPORTS");
    }
}
