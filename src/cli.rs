//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quire static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Config file name (default: quire.toml)
    #[arg(short = 'C', long, default_value = "quire.toml", global = true)]
    pub config: PathBuf,

    /// Regenerate the sitemap and sync assets even for partial builds
    #[arg(short, long, global = true)]
    pub generate_sitemap: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build HTML; with no files, a full build with sitemap and assets
    Build {
        /// Page sources to rebuild (e.g. `posts/hello.page`)
        files: Vec<PathBuf>,
    },

    /// Build, then watch for changes and serve the output directory
    Dev {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create new page sources, then regenerate the sitemap
    New {
        /// Page file to create
        file: PathBuf,

        /// More page files to create
        more: Vec<PathBuf>,
    },

    /// Remove the output directory
    Clean,

    /// Regenerate the sitemap file from all pages
    GenSitemap,

    /// Write a config file, a layout and an index page
    Init,
}
