//! Hand-off of a [`MathRenderResult`]: image files on disk and a JSON summary.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde::Serialize;

use super::segments::{MathRenderResult, Segment};
use super::tokenizer::Token;
use crate::core::config::ResolvedConfig;

/// Errors when writing images or serializing a summary.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON view of a render result. Image bytes are omitted unless embedded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary<'a> {
    pub config: &'a ResolvedConfig,
    pub has_math_images: bool,
    pub segments: Vec<SegmentSummary<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SegmentSummary<'a> {
    Text {
        content: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    MathImage {
        formula_text: &'a str,
        expression: &'a str,
        file_name: &'a str,
        bytes: usize,
        /// Base64 PNG data.
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
}

impl<'a> Summary<'a> {
    pub fn new(result: &'a MathRenderResult, embed: bool) -> Self {
        let segments = result
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Text { content } => SegmentSummary::Text { content },
                Segment::MathImage {
                    formula_text,
                    expression,
                    image,
                    file_name,
                } => SegmentSummary::MathImage {
                    formula_text,
                    expression,
                    file_name,
                    bytes: image.len(),
                    data: embed.then(|| B64.encode(image)),
                },
            })
            .collect();
        Self {
            config: &result.config,
            has_math_images: result.has_math_images,
            segments,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Pretty JSON array of tokens.
pub fn tokens_to_json(tokens: &[Token]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(tokens)?)
}

/// Write every math-image segment to `dir/<file_name>`, creating `dir` if needed.
/// Returns the written paths in segment order.
pub fn write_images(result: &MathRenderResult, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    let mut written = Vec::new();
    for segment in &result.segments {
        let Segment::MathImage {
            image, file_name, ..
        } = segment
        else {
            continue;
        };
        if written.is_empty() {
            fs::create_dir_all(dir).map_err(|source| ExportError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let path = dir.join(file_name);
        fs::write(&path, image).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        log::info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MathRenderResult {
        MathRenderResult {
            segments: vec![
                Segment::Text {
                    content: "A ".into(),
                },
                Segment::MathImage {
                    formula_text: "$$x$$".into(),
                    expression: "x".into(),
                    image: b"png".to_vec(),
                    file_name: "math-1.png".into(),
                },
            ],
            has_math_images: true,
            config: ResolvedConfig::default(),
        }
    }

    #[test]
    fn summary_json_shape() {
        let result = sample();
        let value = serde_json::to_value(Summary::new(&result, false)).unwrap();
        assert_eq!(value["hasMathImages"], true);
        assert_eq!(value["config"]["maxExpressionsPerReply"], 8);
        assert_eq!(value["config"]["delimiterKinds"][0], "dollars");
        assert_eq!(value["segments"][0]["kind"], "text");
        assert_eq!(value["segments"][0]["content"], "A ");
        let image = &value["segments"][1];
        assert_eq!(image["kind"], "math-image");
        assert_eq!(image["formulaText"], "$$x$$");
        assert_eq!(image["fileName"], "math-1.png");
        assert_eq!(image["bytes"], 3);
        assert!(image.get("data").is_none());
    }

    #[test]
    fn summary_embeds_base64_data() {
        let result = sample();
        let value = serde_json::to_value(Summary::new(&result, true)).unwrap();
        assert_eq!(value["segments"][1]["data"], "cG5n");
    }

    #[test]
    fn tokens_json_uses_kind_tags() {
        let tokens = vec![
            Token::Text {
                content: "a".into(),
            },
            Token::Formula {
                raw_text: "$$b$$".into(),
                expression: "b".into(),
            },
        ];
        let value: serde_json::Value =
            serde_json::from_str(&tokens_to_json(&tokens).unwrap()).unwrap();
        assert_eq!(value[0]["kind"], "text");
        assert_eq!(value[1]["kind"], "formula");
        assert_eq!(value[1]["rawText"], "$$b$$");
    }

    #[test]
    fn write_images_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let written = write_images(&sample(), &out).unwrap();
        assert_eq!(written, vec![out.join("math-1.png")]);
        assert_eq!(fs::read(&written[0]).unwrap(), b"png");
    }

    #[test]
    fn write_images_without_images_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("unused");
        let result = MathRenderResult {
            segments: vec![Segment::Text {
                content: "plain".into(),
            }],
            has_math_images: false,
            config: ResolvedConfig::default(),
        };
        assert!(write_images(&result, &out).unwrap().is_empty());
        assert!(!out.exists());
    }
}
