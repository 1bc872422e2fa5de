//! Renderer seam: turns a math expression into image bytes.

use std::future::Future;
use std::io;
use std::time::Duration;

/// Errors from rendering a single expression. Always recovered by the segment
/// builder; never returned to callers of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Renderer command is empty")]
    NoCommand,
    #[error("Failed to start renderer {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Renderer I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Renderer timed out after {0:?}")]
    Timeout(Duration),
    #[error("Renderer produced no output")]
    EmptyOutput,
    #[error("Could not decode rendered image: {0}")]
    Decode(String),
    #[error("Could not encode rendered image: {0}")]
    Encode(String),
    #[error("{0}")]
    Other(String),
}

/// Renders an expression to image bytes no wider than `max_width_px`.
/// Failure is signalled with an error, never with empty bytes.
pub trait Renderer: Sync {
    fn render(
        &self,
        expression: &str,
        max_width_px: u32,
    ) -> impl Future<Output = Result<Vec<u8>, RenderError>> + Send;
}

impl<R: Renderer> Renderer for &R {
    fn render(
        &self,
        expression: &str,
        max_width_px: u32,
    ) -> impl Future<Output = Result<Vec<u8>, RenderError>> + Send {
        (**self).render(expression, max_width_px)
    }
}

/// Adapts an async closure `(expression, max_width_px) -> Result<bytes>` into a [`Renderer`].
pub struct FnRenderer<F>(pub F);

impl<F, Fut> Renderer for FnRenderer<F>
where
    F: Fn(String, u32) -> Fut + Sync,
    Fut: Future<Output = Result<Vec<u8>, RenderError>> + Send,
{
    fn render(
        &self,
        expression: &str,
        max_width_px: u32,
    ) -> impl Future<Output = Result<Vec<u8>, RenderError>> + Send {
        (self.0)(expression.to_string(), max_width_px)
    }
}
