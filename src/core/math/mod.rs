//! Math segmentation pipeline: find delimited formulas in a chat message, render
//! the ones within reply limits, and keep everything else as literal text.

mod code_spans;
mod delimiter;
pub mod engine;
pub mod export;
mod render;
mod segments;
mod tokenizer;

pub use code_spans::CodeSpanIndex;
pub use delimiter::{
    BRACKETS, DOLLARS, DelimiterKind, DelimiterSpec, Opening, active_delimiters,
    find_closing_index, find_next_opening,
};
pub use engine::{DefaultRenderer, MathEngine};
pub use render::{FnRenderer, RenderError, Renderer};
pub use segments::{
    IMAGE_FILE_EXTENSION, IMAGE_FILE_PREFIX, MathRenderResult, Segment, build_segments,
    image_file_name, render_math_segments, render_with_config,
};
pub use tokenizer::{Token, has_formula, tokenize};

#[cfg(test)]
mod tests;
