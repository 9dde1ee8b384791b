//! Command-line argument parsing for studybuddy

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// studybuddy - answer questions from your own lesson files
#[derive(Parser, Debug)]
#[command(name = "studybuddy")]
#[command(version)]
#[command(about = "Lesson-grounded study tutor", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Chunk and embed the lessons folder into the index files
    Build {
        /// Lessons folder (overrides index.lessons_dir)
        #[arg(long)]
        lessons: Option<PathBuf>,
    },

    /// Interactive tutoring session (default)
    Chat,

    /// Ask a single question and exit
    Ask {
        #[arg(value_name = "QUESTION", required = true)]
        question: Vec<String>,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// The subcommand to run; chat when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }
}

impl Verbosity {
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "studybuddy=debug,info",
            Verbosity::VeryVerbose => "studybuddy=trace,debug",
        }
    }

    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
