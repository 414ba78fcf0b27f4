use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "markmatch")]
#[command(author, version)]
#[command(about = "Parse Markdown and GitHub Flavored Markdown into an mdast-style syntax tree")]
#[command(after_help = "\
EXAMPLES:

    # Print the syntax tree of a file
    markmatch parse README.md

    # Read from stdin and keep source positions
    cat README.md | markmatch parse --positions

    # Use custom config
    markmatch parse --config custom.toml README.md

CONFIGURATION:

markmatch looks for configuration files in this order:
  1. Explicit --config path
  2. markmatch.toml or .markmatch.toml in current/parent directories
  3. ~/.config/markmatch/config.toml (XDG)
  4. Built-in defaults

Example .markmatch.toml:

    flavor = \"gfm\"

    [extensions]
    footnotes = false

    [options]
    reserve_positions = true")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, global = true)]
    #[arg(
        long_help = "Path to a custom configuration file. If not specified, markmatch will \
        search for .markmatch.toml or markmatch.toml in the current directory and its parents, \
        then fall back to ~/.config/markmatch/config.toml."
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a document and print its syntax tree as JSON
    #[command(after_help = "\
EXAMPLES:

    # Parse a file
    markmatch parse document.md

    # Parse from stdin
    echo '# Title' | markmatch parse")]
    Parse {
        /// Input file (stdin if not provided)
        file: Option<PathBuf>,

        /// Attach source positions to every node
        #[arg(long)]
        positions: bool,
    },
}
