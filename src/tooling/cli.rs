//! CLI Tooling
//!
//! Command-line interface for all chronofold operations. Every command works
//! on one repository directory, given by `--repository` (default: current
//! directory).

use crate::config::{ChronofoldConfig, ConfigLoader};
use crate::consistency::{Checker, Fixer};
use crate::date::FileDateExtractor;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::organize::{OrganizeOptions, Organizer, ReorganizePolicy};
use crate::report::format::{
    format_check_text, format_mark_text, format_organize_text, format_repair_text,
    format_status_text,
};
use crate::report::{CheckOutput, MarkOutput, OrganizeOutput, RepairOutput, StatusOutput};
use crate::repository::{parse_folder_size, Repository};
use crate::tooling::progress::ProgressBar;
use crate::transfer::TransferMode;
use crate::tree::GraphCache;
use crate::types::MARKER_FILE_NAME;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// chronofold - time-partitioned file organizer
#[derive(Parser)]
#[command(name = "chronofold", version)]
#[command(about = "Organize files into date folders that split and merge around a size threshold")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repository root directory
    #[arg(long, default_value = ".")]
    pub repository: PathBuf,

    /// Configuration file path (overrides the global config file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging settings from the config file with command line flags applied
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
            config.output = "stderr".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a repository in the repository directory
    Init {
        /// Maximum number of files per folder before it is split
        #[arg(value_parser = parse_folder_size_arg)]
        folder_size: Option<usize>,
    },
    /// Copy or move files from a source directory into the repository
    Organize {
        /// Directory to read files from (recursively)
        source: PathBuf,
        /// Move files instead of copying them
        #[arg(long = "move")]
        move_files: bool,
        /// Replace files with the same name and date instead of skipping them
        #[arg(long)]
        replace: bool,
        /// Only accept files with this extension (repeatable)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,
        /// Derive dates again even for files carrying the processed marker
        #[arg(long)]
        ignore_mark: bool,
        /// Split overflowing folders once after all files are placed
        #[arg(long)]
        deferred: bool,
    },
    /// Show repository properties and folder statistics
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Set repository properties (key=value)
    Set {
        #[arg(required = true, value_name = "KEY=VALUE")]
        properties: Vec<String>,
    },
    /// Remove the repository marker and the empty error folder
    Delete {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Check the repository for consistency violations
    Check {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Repair consistency violations
    Repair {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Stamp every file with its processed marker
    Mark,
}

fn parse_folder_size_arg(value: &str) -> Result<usize, String> {
    parse_folder_size(value).map_err(|e| e.to_string())
}

/// CLI context holding the loaded config and the graphs scanned so far
pub struct CliContext {
    repository_root: PathBuf,
    config: ChronofoldConfig,
    graphs: GraphCache,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(repository_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_with_override(config_path.as_deref())?;
        Ok(Self::with_config(repository_root, config))
    }

    pub fn with_config(repository_root: PathBuf, config: ChronofoldConfig) -> Self {
        Self {
            repository_root,
            config,
            graphs: GraphCache::new(),
        }
    }

    pub fn config(&self) -> &ChronofoldConfig {
        &self.config
    }

    pub fn repository_root(&self) -> &Path {
        &self.repository_root
    }

    /// Execute a CLI command
    pub fn execute(&mut self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = name, repository = %self.repository_root.display(), "Command started");
        let result = self.execute_inner(command);
        info!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&mut self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Init { folder_size } => self.handle_init(*folder_size),
            Commands::Organize {
                source,
                move_files,
                replace,
                extensions,
                ignore_mark,
                deferred,
            } => {
                let mut options = OrganizeOptions {
                    mode: TransferMode::new(*move_files, *replace),
                    extensions: if extensions.is_empty() {
                        self.config.organize.extensions.clone()
                    } else {
                        extensions.clone()
                    },
                    policy: self.config.organize.reorganize,
                };
                if *deferred {
                    options.policy = ReorganizePolicy::Deferred;
                }
                let ignore_mark = *ignore_mark || self.config.organize.ignore_mark;
                self.handle_organize(source, &options, ignore_mark)
            }
            Commands::Status { format } => self.handle_status(format),
            Commands::Set { properties } => self.handle_set(properties),
            Commands::Delete { yes } => self.handle_delete(*yes),
            Commands::Check { format } => self.handle_check(format),
            Commands::Repair { format } => self.handle_repair(format),
            Commands::Mark => self.handle_mark(),
        }
    }

    fn handle_init(&mut self, folder_size: Option<usize>) -> Result<String, ApiError> {
        let repository = Repository::init(&self.repository_root, folder_size)?;
        self.graphs.invalidate(repository.root());
        Ok(format!(
            "Initialized repository at {} with folderSize={}",
            repository.root().display(),
            repository.threshold()
        ))
    }

    fn handle_organize(
        &mut self,
        source: &Path,
        options: &OrganizeOptions,
        ignore_mark: bool,
    ) -> Result<String, ApiError> {
        let repository = self.open_valid()?;
        if !source.is_dir() {
            return Err(ApiError::InvalidArgument(format!(
                "source {} is not a directory",
                source.display()
            )));
        }
        let dates = FileDateExtractor::new().ignoring_marks(ignore_mark);
        let graph = self.graphs.get(repository.root())?;

        let mut bar = ProgressBar::new("organize", None);
        let report = Organizer::new(graph, &dates, repository.threshold())
            .organize(source, options, &mut |n| bar.update(n))?;
        bar.finish();

        let mode = serde_json::to_value(options.mode)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Ok(format_organize_text(&OrganizeOutput::new(
            repository.root(),
            source,
            &mode,
            &report,
        )))
    }

    fn handle_status(&mut self, format: &str) -> Result<String, ApiError> {
        let output = if !self.repository_root.join(MARKER_FILE_NAME).is_file() {
            StatusOutput {
                path: self.repository_root.display().to_string(),
                initialized: false,
                valid: false,
                properties: None,
                stats: None,
            }
        } else {
            let repository = Repository::open(&self.repository_root)?;
            let stats = self.graphs.get(repository.root())?.stats();
            StatusOutput {
                path: repository.root().display().to_string(),
                initialized: true,
                valid: Repository::is_valid(repository.root()),
                properties: Some(repository.properties().clone()),
                stats: Some(stats),
            }
        };
        render(format, &output, format_status_text)
    }

    fn handle_set(&mut self, properties: &[String]) -> Result<String, ApiError> {
        let mut repository = self.open_valid()?;
        repository.set_properties(properties)?;
        Ok(format!(
            "Updated {}: folderSize={}",
            repository.root().display(),
            repository.threshold()
        ))
    }

    fn handle_delete(&mut self, yes: bool) -> Result<String, ApiError> {
        let repository = self.open_valid()?;
        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Delete repository at {}? Organized files are kept.",
                    repository.root().display()
                ))
                .default(false)
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Deletion cancelled".to_string());
            }
        }

        let root = repository.root().to_path_buf();
        self.graphs.invalidate(&root);
        let error_folder_removed = repository.delete()?;
        let mut out = format!("Deleted repository at {}", root.display());
        if !error_folder_removed {
            out.push_str("\nThe error folder still holds files and was kept.");
        }
        Ok(out)
    }

    fn handle_check(&mut self, format: &str) -> Result<String, ApiError> {
        let repository = Repository::open(&self.repository_root)?;
        let dates = FileDateExtractor::new();
        let graph = self.graphs.get(repository.root())?;

        let mut bar = ProgressBar::new("check", Some(graph.stats().folders + 1));
        let report = Checker::new(graph, &dates, repository.threshold())
            .check_all(&mut |n| bar.update(n))?;
        bar.finish();

        render(format, &CheckOutput::from_report(graph, &report), format_check_text)
    }

    fn handle_repair(&mut self, format: &str) -> Result<String, ApiError> {
        let repository = Repository::open(&self.repository_root)?;
        let threshold = repository.threshold();
        let dates = FileDateExtractor::new();
        let graph = self.graphs.get(repository.root())?;

        let before = Checker::new(graph, &dates, threshold).check_all(&mut |_| {})?;
        if before.is_clean() {
            return render(
                format,
                &RepairOutput::nothing_to_repair(repository.root()),
                format_repair_text,
            );
        }

        let mut bar = ProgressBar::new("repair", Some(before.total()));
        let fix = Fixer::new(graph, &dates, threshold).fix(&before, &mut |n| bar.update(n))?;
        bar.finish();

        let after = Checker::new(graph, &dates, threshold).check_all(&mut |_| {})?;
        let after = CheckOutput::from_report(graph, &after);
        render(
            format,
            &RepairOutput::from_fix(repository.root(), &fix, after),
            format_repair_text,
        )
    }

    fn handle_mark(&mut self) -> Result<String, ApiError> {
        let repository = self.open_valid()?;
        let dates = FileDateExtractor::new().ignoring_marks(true);
        let graph = self.graphs.get(repository.root())?;

        let mut bar = ProgressBar::new("mark", Some(graph.total_files()));
        let report = Organizer::new(graph, &dates, repository.threshold())
            .mark_all(&mut |n| bar.update(n))?;
        bar.finish();

        Ok(format_mark_text(&MarkOutput::new(repository.root(), &report)))
    }

    /// Open the repository and require both marker and error folder
    fn open_valid(&self) -> Result<Repository, ApiError> {
        let repository = Repository::open(&self.repository_root)?;
        repository.require_valid()?;
        Ok(repository)
    }
}

fn render<T: Serialize>(
    format: &str,
    output: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<String, ApiError> {
    match format {
        "json" => serde_json::to_string_pretty(output)
            .map_err(|e| ApiError::InvalidArgument(format!("Failed to serialize output: {}", e))),
        "text" => Ok(text(output)),
        other => Err(ApiError::InvalidArgument(format!(
            "Invalid format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Organize { .. } => "organize",
        Commands::Status { .. } => "status",
        Commands::Set { .. } => "set",
        Commands::Delete { .. } => "delete",
        Commands::Check { .. } => "check",
        Commands::Repair { .. } => "repair",
        Commands::Mark => "mark",
    }
}
