//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Taxonomy facet tree: reveal active filter paths by lazy expansion
#[derive(Parser, Debug)]
#[command(name = "taxotree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file, layered over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bootstrap the facet and print the visible tree
    Tree {
        /// Taxonomy JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Active filter path, e.g. "|A|B" (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// Bootstrap, then expand or contract nodes like a user click
    Toggle {
        /// Taxonomy JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node ids to toggle, in order
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
        /// Active filter path (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// Show the path prefixes derived from filters
    Prefixes {
        /// Active filter path (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print effective settings as TOML
    Show,
    /// Print the global config file location
    Path,
}
