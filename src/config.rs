//! Application configuration loaded from TOML.
//!
//! The configuration is resolved once at startup and handed to the engine as
//! plain values; nothing in the engine looks up configuration paths itself.
//!
//! # Configuration File Format
//!
//! ```toml
//! [rules]
//! path = "/home/me/.config/filesorter/rules.json"
//!
//! [report]
//! html = true
//! json = false
//!
//! [filters]
//! enable_hidden_files = true
//! skip_report_files = false
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part"]
//! extensions = ["crdownload"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::error::{Result, SorterError};
use crate::report::is_report_file;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".filesorterrc.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rules: RulesSection,
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Where the rule file lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesSection {
    /// Explicit rule file path. Falls back to the per-user default when unset.
    pub path: Option<PathBuf>,
}

/// Which report artifacts to write after a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    #[serde(default = "default_true")]
    pub html: bool,
    #[serde(default)]
    pub json: bool,
    /// Output directory for reports. Defaults to the organized folder.
    pub dir: Option<PathBuf>,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            html: true,
            json: false,
            dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Scan filters deciding which files take part in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether files starting with "." are scanned.
    #[serde(default = "default_true")]
    pub enable_hidden_files: bool,

    /// Whether report files written by earlier runs are left in place.
    #[serde(default)]
    pub skip_report_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist that overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            skip_report_files: false,
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames (e.g. "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,
    /// Glob patterns matched against the filename (e.g. "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Extensions without the dot, case-insensitive.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Regular expressions matched against the filename.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl AppConfig {
    /// Loads configuration, trying in order:
    /// 1. `config_path` when given (must exist)
    /// 2. `.filesorterrc.toml` in the current directory
    /// 3. `~/.config/filesorter/config.toml`
    /// 4. built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(user_config) = user_config_dir().map(|d| d.join("config.toml"))
            && user_config.exists()
        {
            return Self::load_from_file(&user_config);
        }

        log::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Loads configuration from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SorterError::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SorterError::ConfigInvalid(e.to_string()))
    }

    /// Resolves the rule file path: explicit override, then `[rules].path`,
    /// then the per-user default, then a file in the current directory.
    pub fn rules_path(&self, override_path: Option<&Path>) -> PathBuf {
        if let Some(path) = override_path {
            return path.to_path_buf();
        }
        if let Some(path) = &self.rules.path {
            return path.clone();
        }
        user_config_dir()
            .map(|d| d.join("rules.json"))
            .unwrap_or_else(|| PathBuf::from("filesorter-rules.json"))
    }
}

/// `~/.config/filesorter`, when a home directory is known.
fn user_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("filesorter"))
}

impl FilterRules {
    /// Compiles the filter patterns for matching.
    pub fn compile(&self) -> Result<CompiledFilters> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled scan filters.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    skip_report_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl Default for CompiledFilters {
    /// Filters that let every file through.
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            skip_report_files: false,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|_| SorterError::InvalidGlobPattern(p.clone())))
        .collect()
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| SorterError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            skip_report_files: rules.skip_report_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Decides whether a file with this name is scanned.
    ///
    /// Include patterns win outright; otherwise the hidden-file and report
    /// switches, exact names, extensions, globs and regexes are checked in
    /// turn.
    pub fn should_include(&self, file_name: &str) -> bool {
        if self.include_patterns.iter().any(|p| p.matches(file_name)) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.skip_report_files && is_report_file(file_name) {
            return false;
        }

        if self.exclude_filenames.contains(file_name) {
            return false;
        }

        if let Some(ext) = Path::new(file_name).extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self.exclude_patterns.iter().any(|p| p.matches(file_name)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(exclude: ExcludeRules) -> CompiledFilters {
        FilterRules {
            exclude,
            ..Default::default()
        }
        .compile()
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.filters.enable_hidden_files);
        assert!(config.report.html);
        assert!(!config.report.json);
        assert!(config.rules.path.is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert!(config.report.html);
        assert!(config.filters.enable_hidden_files);
    }

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_toml(
            r#"
            [rules]
            path = "/tmp/rules.json"

            [report]
            html = false
            json = true

            [filters]
            enable_hidden_files = false

            [filters.exclude]
            extensions = ["part"]
            "#,
        )
        .unwrap();

        assert_eq!(config.rules.path, Some(PathBuf::from("/tmp/rules.json")));
        assert!(!config.report.html);
        assert!(config.report.json);
        assert!(!config.filters.enable_hidden_files);
        assert_eq!(config.filters.exclude.extensions, vec!["part"]);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result = AppConfig::from_toml("[report\nhtml = ");
        assert!(matches!(result, Err(SorterError::ConfigInvalid(_))));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let result = AppConfig::load(Some(Path::new("/non/existent/filesorter.toml")));
        assert!(matches!(result, Err(SorterError::ConfigNotFound(_))));
    }

    #[test]
    fn test_rules_path_precedence() {
        let mut config = AppConfig::default();
        config.rules.path = Some(PathBuf::from("/configured/rules.json"));

        assert_eq!(
            config.rules_path(Some(Path::new("/cli/rules.json"))),
            PathBuf::from("/cli/rules.json")
        );
        assert_eq!(
            config.rules_path(None),
            PathBuf::from("/configured/rules.json")
        );
    }

    #[test]
    fn test_default_filters_include_everything() {
        let compiled = CompiledFilters::default();
        assert!(compiled.should_include(".DS_Store"));
        assert!(compiled.should_include("report.pdf"));
    }

    #[test]
    fn test_hidden_files_can_be_disabled() {
        let compiled = FilterRules {
            enable_hidden_files: false,
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert!(!compiled.should_include(".DS_Store"));
        assert!(compiled.should_include("photo.png"));
    }

    #[test]
    fn test_report_files_are_scanned_unless_skipped() {
        let report = "_Organization_Report_2024-01-01_120000.html";
        assert!(CompiledFilters::default().should_include(report));

        let config = AppConfig::from_toml("[filters]\nskip_report_files = true\n").unwrap();
        let compiled = config.filters.compile().unwrap();
        assert!(!compiled.should_include(report));
        assert!(compiled.should_include("report.html"));
    }

    #[test]
    fn test_exclude_filenames_and_extensions() {
        let compiled = filters(ExcludeRules {
            filenames: vec!["Thumbs.db".to_string()],
            extensions: vec![".PART".to_string(), "tmp".to_string()],
            ..Default::default()
        });

        assert!(!compiled.should_include("Thumbs.db"));
        assert!(!compiled.should_include("movie.mkv.part"));
        assert!(!compiled.should_include("scratch.TMP"));
        assert!(compiled.should_include("movie.mkv"));
    }

    #[test]
    fn test_exclude_glob_and_regex() {
        let compiled = filters(ExcludeRules {
            patterns: vec!["~$*".to_string()],
            regex: vec![r"^\d{8}_draft".to_string()],
            ..Default::default()
        });

        assert!(!compiled.should_include("~$budget.xlsx"));
        assert!(!compiled.should_include("20240101_draft.docx"));
        assert!(compiled.should_include("budget.xlsx"));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let compiled = FilterRules {
            enable_hidden_files: false,
            exclude: ExcludeRules {
                extensions: vec!["log".to_string()],
                ..Default::default()
            },
            include: IncludeRules {
                patterns: vec![".keep*".to_string(), "important.log".to_string()],
            },
            ..Default::default()
        }
        .compile()
        .unwrap();

        assert!(compiled.should_include(".keepme"));
        assert!(compiled.should_include("important.log"));
        assert!(!compiled.should_include("debug.log"));
        assert!(!compiled.should_include(".other"));
    }

    #[test]
    fn test_invalid_patterns_are_errors() {
        let bad_glob = FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["[unclosed".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            bad_glob.compile(),
            Err(SorterError::InvalidGlobPattern(_))
        ));

        let bad_regex = FilterRules {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            bad_regex.compile(),
            Err(SorterError::InvalidRegexPattern { .. })
        ));
    }
}
