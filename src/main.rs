use clap::{Parser, Subcommand};
use filesorter::cli::{SortCommand, run_cli_with_config};
use filesorter::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;

/// Sort the files of a folder into subfolders by keyword or extension rules.
#[derive(Parser)]
#[command(name = "filesorter", version, about)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Rule file path, overriding the configuration
    #[arg(short, long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Move the files of a folder into destination subfolders
    Organize {
        /// Folder to organize
        dir: PathBuf,
        /// Show where files would go without moving anything
        #[arg(long)]
        dry_run: bool,
        /// Do not write report files
        #[arg(long)]
        no_report: bool,
    },
    /// Manage the saved rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// Print the rules in priority order
    Show,
    /// Replace the rules with a rule file (list or legacy mapping shape)
    Import {
        file: PathBuf,
    },
    /// Append a rule with the lowest priority
    Add {
        /// Destination folder name
        folder: String,
        /// Keywords, or extensions starting with "."
        #[arg(required = true)]
        tokens: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let command = match cli.command {
        Commands::Organize {
            dir,
            dry_run,
            no_report,
        } => SortCommand::Organize {
            dir,
            dry_run,
            write_report: !no_report,
        },
        Commands::Rules { action } => match action {
            RulesAction::Show => SortCommand::ShowRules,
            RulesAction::Import { file } => SortCommand::ImportRules { file },
            RulesAction::Add { folder, tokens } => SortCommand::AddRule { folder, tokens },
        },
    };

    match run_cli_with_config(command, cli.config.as_deref(), cli.rules.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
