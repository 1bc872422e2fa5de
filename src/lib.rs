//! # chat-math
//!
//! Splits chat messages into plain-text and rendered-formula segments.
//!
//! Formulas delimited by `$$...$$` or `\[...\]` outside code spans are rendered
//! to PNG images through a [`Renderer`], subject to per-reply count and
//! per-expression length limits. Anything not rendered stays as literal text.

pub mod core;

pub use crate::core::config::{MathConfigInput, ResolvedConfig};
pub use crate::core::math::{
    DefaultRenderer, FnRenderer, MathRenderResult, RenderError, Renderer, Segment,
    render_math_segments,
};
