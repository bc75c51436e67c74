//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Generate a cross-linked wiki from a library of YAML lore documents
#[derive(Parser, Debug)]
#[command(name = "lorewiki")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Project config file (default: ./wiki.toml)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the site: tree, links, timeline and rewritten pages
    Build {
        #[command(flatten)]
        dirs: DirArgs,
    },

    /// Print the navigation tree
    Tree {
        #[command(flatten)]
        dirs: DirArgs,
    },

    /// Print the link index in matching order
    Links {
        #[command(flatten)]
        dirs: DirArgs,
    },

    /// Print the merged timeline
    Timeline {
        #[command(flatten)]
        dirs: DirArgs,
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

/// Directory overrides shared by the library commands.
#[derive(clap::Args, Debug, Default)]
pub struct DirArgs {
    /// Library directory with the YAML documents
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub lib: Option<PathBuf>,

    /// Output directory of the generated site
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
