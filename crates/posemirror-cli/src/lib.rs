//! posemirror CLI
//!
//! Command-line interface for replaying recorded pose streams through a
//! comparison session and inspecting single pose pairs.
//!
//! # Features
//!
//! - **replay**: Drive a session from a live and a reference recording
//! - **compare**: Per-part breakdown for one pose pair
//! - **config**: Print or write a session configuration
//! - **version**: Display version information
//!
//! # Usage
//!
//! ```bash
//! # Replay a practice run against the instructor at half speed
//! posemirror replay --live me.jsonl --reference coach.jsonl --reference-rate 0.5
//!
//! # Which joint is furthest off in this frame?
//! posemirror compare --live me.json --reference coach.json --metric angle
//!
//! # Start a config file from the defaults
//! posemirror config --output posemirror.json
//! ```

use clap::{Parser, Subcommand};

pub mod compare;
pub mod display;
pub mod feed;
pub mod recording;
pub mod replay;
pub mod settings;

/// posemirror Command Line Interface
#[derive(Parser, Debug)]
#[command(name = "posemirror")]
#[command(author, version, about = "Compare a live pose stream against a reference and coach the difference")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a live and a reference recording through a session
    Replay(replay::ReplayArgs),

    /// Compare one live pose against one reference pose
    Compare(compare::CompareArgs),

    /// Print or write the session configuration
    Config(settings::ConfigArgs),

    /// Display version information
    Version,
}
