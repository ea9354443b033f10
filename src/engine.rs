//! The organize engine: scans a folder, resolves every file against the rule
//! set, moves it without overwriting anything, and records the run.
//!
//! The engine is synchronous. It reports what it is doing through an
//! [`EventSink`], and checks a [`CancelToken`] once before each file. Use
//! [`OrganizeEngine::spawn`] to run it on a worker thread and receive events
//! over a channel.
//!
//! # Examples
//!
//! ```no_run
//! use filesorter::engine::{EngineEvent, EngineOptions, OrganizeEngine};
//! use filesorter::rules::{Rule, RuleSet};
//!
//! let rules = RuleSet::new(vec![Rule::new("invoices", ["invoice"])]);
//! let handle = OrganizeEngine::new(EngineOptions::with_rules(rules)).spawn("/path/to/folder");
//!
//! for event in handle.events() {
//!     if let EngineEvent::Log(message) = event {
//!         println!("{}", message);
//!     }
//! }
//!
//! if let Some(report) = handle.join().into_report() {
//!     println!("Moved {} of {} files", report.moved_count, report.total_files_scanned);
//! }
//! ```

use crate::collision::unique_path;
use crate::config::CompiledFilters;
use crate::error::{Result, SorterError};
use crate::report::{MoveRecord, RunReport};
use crate::rules::{RuleSet, is_valid_folder_name, resolve};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Progress and status notifications, emitted in run order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Number of files found by the scan.
    TotalFiles(usize),
    /// Number of files processed so far (1-based), moved or not.
    Progress(usize),
    /// A file was moved.
    Log(String),
    /// A file could not be moved, or the source folder is invalid.
    Error(String),
    /// The run stopped because cancellation was requested.
    Cancelled(String),
    /// Every file was processed.
    Done(String),
}

impl EngineEvent {
    /// Short name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::TotalFiles(_) => "total_files",
            EngineEvent::Progress(_) => "progress",
            EngineEvent::Log(_) => "log",
            EngineEvent::Error(_) => "error",
            EngineEvent::Cancelled(_) => "cancelled",
            EngineEvent::Done(_) => "done",
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::TotalFiles(n) | EngineEvent::Progress(n) => {
                write!(f, "{}({})", self.kind(), n)
            }
            EngineEvent::Log(m)
            | EngineEvent::Error(m)
            | EngineEvent::Cancelled(m)
            | EngineEvent::Done(m) => write!(f, "{}: {}", self.kind(), m),
        }
    }
}

/// Receiver side of the engine's event stream.
pub trait EventSink {
    fn emit(&self, event: EngineEvent);
}

impl EventSink for Sender<EngineEvent> {
    fn emit(&self, event: EngineEvent) {
        // A dropped receiver only means nobody is watching.
        let _ = self.send(event);
    }
}

/// Shared flag used to request cancellation of a running organization.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every file was processed.
    Completed(RunReport),
    /// Cancellation was requested. Files moved before that stay moved and no
    /// report is produced.
    Cancelled,
    /// The source folder could not be scanned. Nothing was touched.
    Fatal(SorterError),
}

impl RunOutcome {
    /// The final report, present only for completed runs.
    pub fn into_report(self) -> Option<RunReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            RunOutcome::Cancelled | RunOutcome::Fatal(_) => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

/// Everything the engine needs, resolved by the caller before the run.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub rules: RuleSet,
    pub filters: CompiledFilters,
}

impl EngineOptions {
    /// Options with the given rules and filters that let every file through.
    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            rules,
            filters: CompiledFilters::default(),
        }
    }
}

/// A file found by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
}

/// A resolution computed without moving anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source_name: String,
    pub destination_folder: String,
}

/// Lists the regular files directly inside `source`, in directory order.
///
/// Subdirectories, symlinks and files rejected by `filters` are skipped.
/// Entries that cannot be read are logged and skipped.
pub fn scan(source: &Path, filters: &CompiledFilters) -> Result<Vec<FileEntry>> {
    if !source.is_dir() {
        return Err(SorterError::InvalidSource {
            path: source.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(source)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Unreadable entry in {}: {}", source.display(), e);
                continue;
            }
        };
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                log::warn!("Cannot read file type of {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if !file_type.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !filters.should_include(&name) {
            log::debug!("Skipping {}", name);
            continue;
        }
        files.push(FileEntry {
            name,
            path: entry.path(),
        });
    }
    Ok(files)
}

/// Resolves every file in `source` without creating folders or moving files.
pub fn preview(source: &Path, options: &EngineOptions) -> Result<Vec<PlannedMove>> {
    Ok(scan(source, &options.filters)?
        .into_iter()
        .map(|file| PlannedMove {
            destination_folder: resolve(&file.name, &options.rules),
            source_name: file.name,
        })
        .collect())
}

/// Channel end and worker thread of a spawned run.
pub struct RunHandle {
    events: Receiver<EngineEvent>,
    cancel: CancelToken,
    worker: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// Events from the worker, in emission order. Iteration ends when the
    /// worker finishes.
    pub fn events(&self) -> &Receiver<EngineEvent> {
        &self.events
    }

    /// Requests cancellation; the worker stops before its next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Waits for the worker and returns how the run ended.
    pub fn join(self) -> RunOutcome {
        self.worker.join().unwrap_or_else(|_| {
            RunOutcome::Fatal(SorterError::Io(io::Error::other(
                "organize worker panicked",
            )))
        })
    }
}

/// Moves the files of one folder into rule-selected subfolders.
pub struct OrganizeEngine {
    options: EngineOptions,
}

impl OrganizeEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Runs the engine on a new thread, streaming events over a channel.
    pub fn spawn(self, source: impl Into<PathBuf>) -> RunHandle {
        let source = source.into();
        let (sender, events) = mpsc::channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        let worker = thread::spawn(move || self.run(&source, &worker_cancel, &sender));

        RunHandle {
            events,
            cancel,
            worker,
        }
    }

    /// Organizes `source`, blocking until done.
    ///
    /// Emits `TotalFiles` after the scan; then for each file either `Log` or
    /// `Error`, followed by `Progress`; and finally `Done`. If the folder
    /// cannot be scanned an `Error` is emitted and the run ends as
    /// [`RunOutcome::Fatal`]. If `cancel` is set before a file, `Cancelled` is
    /// emitted and the run ends as [`RunOutcome::Cancelled`].
    pub fn run(&self, source: &Path, cancel: &CancelToken, events: &impl EventSink) -> RunOutcome {
        log::info!("Organizing {}", source.display());

        let files = match scan(source, &self.options.filters) {
            Ok(files) => files,
            Err(e) => {
                log::error!("{}", e);
                events.emit(EngineEvent::Error(e.to_string()));
                return RunOutcome::Fatal(e);
            }
        };

        let mut report = RunReport::new(source.to_path_buf());
        report.total_files_scanned = files.len();
        events.emit(EngineEvent::TotalFiles(files.len()));

        for (index, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                log::info!("Cancelled after {} of {} files", index, files.len());
                events.emit(EngineEvent::Cancelled(
                    "Operation cancelled by user.".to_string(),
                ));
                return RunOutcome::Cancelled;
            }

            match self.organize_file(source, file, &mut report.created_folders) {
                Ok(record) => {
                    events.emit(EngineEvent::Log(move_message(&record)));
                    report.record_move(record);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    events.emit(EngineEvent::Error(e.to_string()));
                    report.record_failure(file.name.clone(), e.to_string());
                }
            }

            events.emit(EngineEvent::Progress(index + 1));
        }

        log::info!(
            "Moved {} of {} files from {}",
            report.moved_count,
            report.total_files_scanned,
            source.display()
        );
        events.emit(EngineEvent::Done("Organization complete.".to_string()));
        RunOutcome::Completed(report.finish())
    }

    /// Resolves, prepares the destination folder and moves a single file.
    fn organize_file(
        &self,
        source: &Path,
        file: &FileEntry,
        created_folders: &mut BTreeSet<String>,
    ) -> Result<MoveRecord> {
        let folder = resolve(&file.name, &self.options.rules);
        log::debug!("{} -> {}", file.name, folder);
        if !is_valid_folder_name(&folder) {
            return Err(SorterError::InvalidFolderName { folder });
        }

        let destination_dir = source.join(&folder);
        if !destination_dir.is_dir() {
            fs::create_dir(&destination_dir).map_err(|e| SorterError::DirectoryCreation {
                path: destination_dir.clone(),
                source: e,
            })?;
            created_folders.insert(folder.clone());
        }

        let destination = unique_path(&destination_dir, &file.name);
        move_file(&file.path, &destination).map_err(|e| SorterError::FileMove {
            from: file.path.clone(),
            to: destination.clone(),
            source: e,
        })?;

        Ok(MoveRecord {
            source_name: file.name.clone(),
            destination_folder: folder,
            destination_name: destination
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.name.clone()),
        })
    }
}

fn move_message(record: &MoveRecord) -> String {
    if record.was_renamed() {
        format!(
            "Moved '{}' to '{}' as '{}'.",
            record.source_name, record.destination_folder, record.destination_name
        )
    } else {
        format!(
            "Moved '{}' to '{}'.",
            record.source_name, record.destination_folder
        )
    }
}

/// Renames `from` to `to`, copying across filesystems when needed.
///
/// Either the file ends up at `to` and is gone from `from`, or `from` is left
/// as it was and no partial copy remains at `to`.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!("Rename across devices, copying {}", from.display());
            if let Err(copy_error) = fs::copy(from, to) {
                let _ = fs::remove_file(to);
                return Err(copy_error);
            }
            if let Err(remove_error) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(remove_error);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
