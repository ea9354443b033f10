//! Classification rules and filename resolution.
//!
//! A [`RuleSet`] is an ordered list of [`Rule`]s. Each rule names a destination
//! folder and carries matcher tokens: tokens starting with `.` match the end of
//! a filename, any other token matches anywhere inside it. Matching is
//! case-insensitive and the first rule with a matching token wins.
//!
//! # Examples
//!
//! ```
//! use filesorter::rules::{Rule, RuleSet, resolve};
//!
//! let rules = RuleSet::new(vec![Rule::new("invoices", ["invoice", "receipt"])]);
//! assert_eq!(resolve("Invoice_2023.pdf", &rules), "INVOICES");
//! assert_eq!(resolve("report.pdf", &rules), "PDF");
//! assert_eq!(resolve("Makefile", &rules), "NO_EXTENSION");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// Folder used for files that match no rule and have no extension.
pub const NO_EXTENSION_FOLDER: &str = "NO_EXTENSION";

/// Returns true if `name` is a single plain folder name.
///
/// Empty names, `.`, `..`, absolute paths, drive prefixes and anything with a
/// path separator are rejected, so a destination always stays directly
/// inside the source folder.
pub fn is_valid_folder_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// A single matcher token inside a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Matcher {
    /// Matches filenames ending with this suffix, including the leading dot.
    Extension(String),
    /// Matches filenames containing this text.
    Keyword(String),
}

impl Matcher {
    /// Parses a raw token. Tokens are lower-cased; a leading `.` makes an
    /// extension matcher.
    pub fn parse(token: &str) -> Self {
        let token = token.trim().to_lowercase();
        if token.starts_with('.') {
            Matcher::Extension(token)
        } else {
            Matcher::Keyword(token)
        }
    }

    /// Tests this matcher against an already lower-cased filename.
    pub fn matches(&self, filename_lower: &str) -> bool {
        match self {
            Matcher::Extension(suffix) => filename_lower.ends_with(suffix.as_str()),
            Matcher::Keyword(keyword) => filename_lower.contains(keyword.as_str()),
        }
    }

    /// Returns the token text as written in the rule file.
    pub fn token(&self) -> &str {
        match self {
            Matcher::Extension(t) | Matcher::Keyword(t) => t,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Matcher::Extension(t) => t.len() <= 1,
            Matcher::Keyword(t) => t.is_empty(),
        }
    }
}

impl From<String> for Matcher {
    fn from(token: String) -> Self {
        Matcher::parse(&token)
    }
}

impl From<Matcher> for String {
    fn from(matcher: Matcher) -> Self {
        match matcher {
            Matcher::Extension(t) | Matcher::Keyword(t) => t,
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A destination folder together with the tokens that select it.
///
/// Serializes as `{ "folder": "...", "keywords": ["...", ...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRule")]
pub struct Rule {
    /// Destination folder name, upper-cased.
    pub folder: String,
    /// Matcher tokens, tried in order.
    #[serde(rename = "keywords")]
    pub matchers: Vec<Matcher>,
}

#[derive(Deserialize)]
struct RawRule {
    folder: String,
    #[serde(default)]
    keywords: Vec<Matcher>,
}

impl From<RawRule> for Rule {
    fn from(raw: RawRule) -> Self {
        Rule::from_matchers(raw.folder, raw.keywords)
    }
}

impl Rule {
    /// Creates a rule from a folder name and raw tokens.
    pub fn new<I, S>(folder: impl AsRef<str>, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let matchers = tokens
            .into_iter()
            .map(|t| Matcher::parse(t.as_ref()))
            .collect();
        Self::from_matchers(folder, matchers)
    }

    fn from_matchers(folder: impl AsRef<str>, matchers: Vec<Matcher>) -> Self {
        Self {
            folder: folder.as_ref().trim().to_uppercase(),
            // An empty keyword would match every filename.
            matchers: matchers.into_iter().filter(|m| !m.is_empty()).collect(),
        }
    }

    /// Returns true if any of this rule's tokens matches the filename.
    /// A rule without tokens never matches.
    pub fn matches(&self, filename_lower: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(filename_lower))
    }
}

/// An ordered collection of rules; earlier rules take priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Appends a rule with the lowest priority.
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Removes rules whose folder fails [`is_valid_folder_name`], logging each
    /// one. Returns how many were removed.
    pub fn retain_valid_folders(&mut self) -> usize {
        let before = self.rules.len();
        self.rules.retain(|rule| {
            let valid = is_valid_folder_name(&rule.folder);
            if !valid {
                log::warn!("Ignoring rule with invalid folder name '{}'", rule.folder);
            }
            valid
        });
        before - self.rules.len()
    }

    /// Returns the first rule matching the filename, if any.
    pub fn find_match(&self, filename: &str) -> Option<&Rule> {
        let filename_lower = filename.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&filename_lower))
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Resolves the destination folder for a filename.
///
/// The first matching rule wins. Without a match the upper-cased extension is
/// used, or [`NO_EXTENSION_FOLDER`] when the file has none. Resolution never
/// fails.
pub fn resolve(filename: &str, rules: &RuleSet) -> String {
    if let Some(rule) = rules.find_match(filename) {
        return rule.folder.clone();
    }
    extension_folder(filename)
}

/// Folder name derived from the filename's extension alone.
pub fn extension_folder(filename: &str) -> String {
    match Path::new(filename).extension() {
        Some(ext) if !ext.is_empty() => ext.to_string_lossy().to_uppercase(),
        _ => NO_EXTENSION_FOLDER.to_string(),
    }
}
