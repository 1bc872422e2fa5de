//! Application run modes: logger init, message rendering, config display.

use std::io;

use clap::CommandFactory;
use clap_complete::Shell;

use chat_math::core::app;
use chat_math::core::config::{self, ConfigError, MathConfigInput};
use chat_math::core::math::export::{self, Summary};
use chat_math::core::math::{self, DefaultRenderer, MathEngine};
use chat_math::core::paths;

use crate::cli::{self, Args};

/// Initialize env_logger on stderr so stdout stays machine-readable.
pub fn init_logger(args: &Args) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level()),
    )
    .try_init();
}

/// File/env configuration with command-line overrides applied.
pub fn load_config(args: &Args) -> Result<MathConfigInput, ConfigError> {
    let mut input = config::load(args.config.as_deref())?;
    input.overlay(args.overrides());
    Ok(input)
}

fn read_message(args: &Args) -> io::Result<String> {
    match args.message.as_deref() {
        Some("-") | None => {
            let text = io::read_to_string(io::stdin())?;
            let trimmed = text.strip_suffix('\n').unwrap_or(&text);
            Ok(trimmed.strip_suffix('\r').unwrap_or(trimmed).to_string())
        }
        Some(message) => Ok(message.to_string()),
    }
}

/// Render one message and print the JSON summary (or the tokens with `--tokens`).
pub async fn run_message(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let input = load_config(args)?;
    let message = read_message(args)?;

    if args.tokens {
        let tokens = math::tokenize(&message, &config::resolve(&input));
        println!("{}", export::tokens_to_json(&tokens)?);
        return Ok(());
    }

    let result = math::render_math_segments(&message, &input, &DefaultRenderer).await;
    log::info!(
        "Rendered {} of {} segment(s) as images",
        result.image_count(),
        result.segments.len()
    );
    if let Some(dir) = &args.out_dir {
        export::write_images(&result, dir)?;
    }
    println!("{}", Summary::new(&result, args.embed).to_json_pretty()?);
    Ok(())
}

/// Run the `config` command: display config path, resolved settings, and renderer.
pub fn run_config(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config_file = args.config.clone().or_else(paths::config_file);
    let config_status = match &config_file {
        Some(p) if p.is_file() => format!("{} (found)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "—".to_string(),
    };
    let cache_dir = paths::cache_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "—".to_string());
    let resolved = config::resolve(&load_config(args)?);
    let engine = MathEngine::global();

    println!("Config:   {}", config_status);
    println!("Cache:    {}", cache_dir);
    println!(
        "Renderer: {} (timeout {}s)",
        engine.command_line(),
        engine.timeout().as_secs()
    );
    println!("Settings:");
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

/// Print a completion script for `shell` to stdout.
pub fn run_completions(shell: Shell) {
    let mut cmd = Args::command();
    cli::generate(shell, &mut cmd, app::NAME, &mut io::stdout());
}
