//! Default renderer: an external typesetting command driven through a lazily
//! initialized, process-wide engine.
//!
//! The command reads the expression on stdin and writes a PNG to stdout. Output
//! wider than the requested maximum is downscaled (never upscaled) and re-encoded.

use std::env;
use std::future::Future;
use std::io::{self, Cursor};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::render::{RenderError, Renderer};
use crate::core::app;

/// Command used when `CHAT_MATH_RENDER_CMD` is unset.
pub const DEFAULT_RENDER_COMMAND: &str = "tex2png";
/// Timeout used when `CHAT_MATH_RENDER_TIMEOUT_SECS` is unset or invalid.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(20);

static ENGINE: OnceLock<MathEngine> = OnceLock::new();

/// Typesetting command plus per-call timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathEngine {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl MathEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// The process-wide engine, configured from the environment on first use.
    pub fn global() -> &'static MathEngine {
        ENGINE.get_or_init(|| {
            let engine = Self::from_env_lookup(|key| env::var(key).ok());
            log::debug!(
                "Math engine initialized: {} (timeout {:?})",
                engine.command_line(),
                engine.timeout
            );
            engine
        })
    }

    /// Build from `CHAT_MATH_RENDER_CMD` and `CHAT_MATH_RENDER_TIMEOUT_SECS`.
    pub fn from_env_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", app::ENV_PREFIX, name));
        let command = var("RENDER_CMD")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RENDER_COMMAND.to_string());
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();
        let timeout = var("RENDER_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RENDER_TIMEOUT);
        Self::new(program, parts.collect(), timeout)
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the command once and return its raw stdout.
    pub async fn run(&self, expression: &str) -> Result<Vec<u8>, RenderError> {
        if self.program.is_empty() {
            return Err(RenderError::NoCommand);
        }
        tokio::time::timeout(self.timeout, self.run_command(expression))
            .await
            .map_err(|_| RenderError::Timeout(self.timeout))?
    }

    async fn run_command(&self, expression: &str) -> Result<Vec<u8>, RenderError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // The command may exit without reading stdin.
            if let Err(e) = stdin.write_all(expression.as_bytes()).await
                && e.kind() != io::ErrorKind::BrokenPipe
            {
                return Err(e.into());
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        Ok(output.stdout)
    }
}

impl Renderer for MathEngine {
    fn render(
        &self,
        expression: &str,
        max_width_px: u32,
    ) -> impl Future<Output = Result<Vec<u8>, RenderError>> + Send {
        async move {
            let raw = self.run(expression).await?;
            fit_width(&raw, max_width_px)
        }
    }
}

/// Renders through [`MathEngine::global`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRenderer;

impl Renderer for DefaultRenderer {
    fn render(
        &self,
        expression: &str,
        max_width_px: u32,
    ) -> impl Future<Output = Result<Vec<u8>, RenderError>> + Send {
        MathEngine::global().render(expression, max_width_px)
    }
}

/// Decode `raw`, downscale to `max_width_px` preserving aspect ratio when wider,
/// and return PNG bytes. Images that already fit are returned untouched.
pub fn fit_width(raw: &[u8], max_width_px: u32) -> Result<Vec<u8>, RenderError> {
    let img = image::load_from_memory(raw).map_err(|e| RenderError::Decode(e.to_string()))?;
    let (w, h) = (img.width(), img.height());
    let max_width_px = max_width_px.max(1);
    if w <= max_width_px {
        return Ok(raw.to_vec());
    }
    let ratio = max_width_px as f64 / w as f64;
    let new_h = ((h as f64 * ratio).round() as u32).max(1);
    let img = img.resize_exact(max_width_px, new_h, image::imageops::FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}
