//! This module contains the command-line interface [`Cli`] parser for running the attendance
//! site and inspecting its records.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(version, about = "Lecture attendance for students, teachers, and an admin")]
pub struct Cli {
    /// Settings file to read instead of `config.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// What to do. Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run the web server.
    Serve,

    /// Create or upgrade the database schema, then exit.
    Migrate,

    /// Show every student in a section.
    Roster {
        #[arg(long)]
        sem: String,
        #[arg(long)]
        stream: String,
        #[arg(long)]
        division: String,
    },

    /// Show a student's attendance per subject.
    Summary {
        #[arg(long)]
        email: String,
    },
}
