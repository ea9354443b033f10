//! filesorter - sort the files of a folder into destination subfolders
//!
//! Files are classified by ordered keyword or extension rules, falling back to
//! their extension. Moves never overwrite existing files, progress is reported
//! as a stream of events, runs can be cancelled between files, and a completed
//! run yields a report of every move.

pub mod cli;
pub mod collision;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod report;
pub mod rule_store;
pub mod rules;
pub mod suggest;

pub use collision::unique_path;
pub use config::{AppConfig, CompiledFilters, FilterRules};
pub use engine::{CancelToken, EngineEvent, EngineOptions, EventSink, OrganizeEngine, RunHandle, RunOutcome};
pub use error::{Result, SorterError};
pub use report::{MoveRecord, RunReport};
pub use rule_store::RuleStore;
pub use rules::{Matcher, Rule, RuleSet, resolve};
pub use suggest::{RuleSuggester, SuggestionOutcome, request_suggestion};

pub use cli::{SortCommand, run_cli};
