//! Segment builder: applies reply limits to formula tokens, renders the ones in
//! budget, and falls back to literal text for everything else.

use super::render::Renderer;
use super::tokenizer::{Token, has_formula, tokenize};
use crate::core::config::{self, MathConfigInput, ResolvedConfig};

/// File name prefix of rendered formula images.
pub const IMAGE_FILE_PREFIX: &str = "math-";
/// File extension of rendered formula images.
pub const IMAGE_FILE_EXTENSION: &str = "png";

const LOG_EXPRESSION_MAX_CHARS: usize = 120;

/// A piece of the outgoing reply: literal text or a rendered formula image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text {
        content: String,
    },
    MathImage {
        /// Delimited source of the formula, markers included.
        formula_text: String,
        expression: String,
        image: Vec<u8>,
        file_name: String,
    },
}

impl Segment {
    /// Text content, or the formula source for image segments.
    pub fn literal(&self) -> &str {
        match self {
            Segment::Text { content } => content,
            Segment::MathImage { formula_text, .. } => formula_text,
        }
    }

    pub fn is_math_image(&self) -> bool {
        matches!(self, Segment::MathImage { .. })
    }
}

/// Outcome of running the pipeline over one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathRenderResult {
    pub segments: Vec<Segment>,
    pub has_math_images: bool,
    pub config: ResolvedConfig,
}

impl MathRenderResult {
    fn plain(text: &str, config: ResolvedConfig) -> Self {
        Self {
            segments: vec![Segment::Text {
                content: text.to_string(),
            }],
            has_math_images: false,
            config,
        }
    }

    /// Number of math-image segments.
    pub fn image_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_math_image()).count()
    }

    /// Concatenated literals; equals the input message.
    pub fn literal_text(&self) -> String {
        self.segments.iter().map(Segment::literal).collect()
    }
}

/// Resolve `input` and run the whole pipeline on `text`.
///
/// Never fails: disabled config, empty text, and text without formulas yield a
/// single text segment; render failures degrade to literal text.
pub async fn render_math_segments<R: Renderer>(
    text: &str,
    input: &MathConfigInput,
    renderer: &R,
) -> MathRenderResult {
    render_with_config(text, config::resolve(input), renderer).await
}

/// Like [`render_math_segments`] with an already resolved config.
pub async fn render_with_config<R: Renderer>(
    text: &str,
    config: ResolvedConfig,
    renderer: &R,
) -> MathRenderResult {
    if !config.enabled || text.is_empty() {
        return MathRenderResult::plain(text, config);
    }
    let tokens = tokenize(text, &config);
    if !has_formula(&tokens) {
        return MathRenderResult::plain(text, config);
    }
    let segments = build_segments(text, &config, tokens, renderer).await;
    let has_math_images = segments.iter().any(Segment::is_math_image);
    MathRenderResult {
        segments,
        has_math_images,
        config,
    }
}

/// Turn tokens into segments. Formulas are rendered one at a time, in order,
/// so image file names follow source order.
pub async fn build_segments<R: Renderer>(
    text: &str,
    config: &ResolvedConfig,
    tokens: Vec<Token>,
    renderer: &R,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rendered = 0usize;

    for token in tokens {
        let (raw_text, expression) = match token {
            Token::Text { content } => {
                push_text(&mut segments, &content);
                continue;
            }
            Token::Formula {
                raw_text,
                expression,
            } => (raw_text, expression),
        };

        if rendered >= config.max_expressions_per_reply {
            log::debug!(
                "Math expression limit ({}) reached, keeping text",
                config.max_expressions_per_reply
            );
            push_text(&mut segments, &raw_text);
            continue;
        }
        if expression.chars().count() > config.max_chars_per_expression {
            log::debug!(
                "Math expression longer than {} chars, keeping text",
                config.max_chars_per_expression
            );
            push_text(&mut segments, &raw_text);
            continue;
        }

        match renderer
            .render(&expression, config.max_image_width_px)
            .await
        {
            Ok(image) if !image.is_empty() => {
                rendered += 1;
                segments.push(Segment::MathImage {
                    formula_text: raw_text,
                    expression,
                    image,
                    file_name: image_file_name(rendered),
                });
            }
            Ok(_) => {
                log::warn!(
                    "Math render returned no image for {}",
                    sanitize_for_log(&expression)
                );
                push_text(&mut segments, &raw_text);
            }
            Err(e) => {
                log::warn!(
                    "Math render failed for {}: {}",
                    sanitize_for_log(&expression),
                    e
                );
                push_text(&mut segments, &raw_text);
            }
        }
    }

    if segments.is_empty() {
        segments.push(Segment::Text {
            content: text.to_string(),
        });
    }
    segments
}

/// File name for the `ordinal`-th rendered image (1-based).
pub fn image_file_name(ordinal: usize) -> String {
    format!("{IMAGE_FILE_PREFIX}{ordinal}.{IMAGE_FILE_EXTENSION}")
}

/// Collapse whitespace runs and truncate, so one log record stays on one line.
pub(crate) fn sanitize_for_log(expression: &str) -> String {
    let collapsed = expression.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= LOG_EXPRESSION_MAX_CHARS {
        return collapsed;
    }
    let mut out: String = collapsed.chars().take(LOG_EXPRESSION_MAX_CHARS).collect();
    out.push('…');
    out
}

/// Append text, extending a trailing text segment instead of starting a new one.
fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text { content }) = segments.last_mut() {
        content.push_str(text);
    } else {
        segments.push(Segment::Text {
            content: text.to_string(),
        });
    }
}
