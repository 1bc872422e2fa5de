//! CLI definitions: argument parsing, subcommands, and help text.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

use chat_math::MathConfigInput;

pub use clap_complete::generate;

const AFTER_HELP: &str = "\
EXAMPLES:
  chat-math -m 'Area: $$\\pi r^2$$'          Render a message, print JSON summary
  echo 'x = \\[a+b\\]' | chat-math          Read the message from stdin
  chat-math -m - --out-dir out/             Also write math-N.png files to out/
  chat-math -m '$$x$$' --tokens             Show tokens only, no rendering
  chat-math config                          Show config path and resolved settings
  chat-math completions bash                Generate bash completions

ENVIRONMENT:
  CHAT_MATH_RENDER_CMD           Typesetting command (expression on stdin, PNG on stdout)
  CHAT_MATH_RENDER_TIMEOUT_SECS  Per-expression render timeout
  CHAT_MATH_ENABLED, CHAT_MATH_DELIMITERS, CHAT_MATH_EXCLUDE_CODE,
  CHAT_MATH_MAX_EXPRESSIONS, CHAT_MATH_MAX_CHARS, CHAT_MATH_MAX_WIDTH
";

/// Command-line arguments for the application.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Render math formulas in chat messages to images",
    after_help = AFTER_HELP
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Message text ('-' or omitted reads stdin)
    #[arg(short = 'm', long)]
    pub message: Option<String>,

    /// Config file (JSON); defaults to config.json in the config directory
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Write rendered images to this directory
    #[arg(short = 'o', long)]
    pub out_dir: Option<PathBuf>,

    /// Include base64 image data in the JSON output
    #[arg(long)]
    pub embed: bool,

    /// Print the token sequence instead of rendering
    #[arg(long)]
    pub tokens: bool,

    /// Disable math rendering (message passes through as text)
    #[arg(long)]
    pub disable: bool,

    /// Delimiter kinds to detect (dollars, brackets)
    #[arg(long, value_delimiter = ',', global = true)]
    pub delimiters: Option<Vec<String>>,

    /// Detect delimiters inside code spans too
    #[arg(long, global = true)]
    pub include_code: bool,

    /// Maximum rendered images per message
    #[arg(long, global = true)]
    pub max_expressions: Option<i64>,

    /// Maximum characters per expression
    #[arg(long, global = true)]
    pub max_chars: Option<i64>,

    /// Maximum image width in pixels
    #[arg(long, global = true)]
    pub max_width: Option<i64>,

    /// Increase log verbosity (use multiple times for debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce log output (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show config path, resolved settings, and renderer command
    Config,
    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        #[arg(value_parser = clap::value_parser!(Shell))]
        shell: Shell,
    },
}

impl Args {
    /// Log level based on -v/-q flags: error, warn, info, or debug.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose >= 2 {
            "debug"
        } else if self.verbose >= 1 {
            "info"
        } else {
            "warn"
        }
    }

    /// Config values set on the command line; unset flags leave file/env values alone.
    pub fn overrides(&self) -> MathConfigInput {
        MathConfigInput {
            enabled: self.disable.then_some(false),
            delimiters: self.delimiters.clone(),
            exclude_code: self.include_code.then_some(false),
            max_expressions_per_reply: self.max_expressions,
            max_chars_per_expression: self.max_chars,
            max_image_width_px: self.max_width,
        }
    }
}
