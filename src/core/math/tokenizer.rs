//! Split a message into an ordered sequence of text and formula tokens.

use serde::Serialize;

use super::code_spans::CodeSpanIndex;
use super::delimiter::{active_delimiters, find_closing_index, find_next_opening};
use crate::core::config::ResolvedConfig;

/// A run of plain text or a delimited formula. Concatenating every token's
/// `content` / `raw_text` in order reproduces the input exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Token {
    Text {
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    Formula {
        /// Full delimited substring, markers included.
        raw_text: String,
        /// Substring strictly between the markers.
        expression: String,
    },
}

impl Token {
    /// The source text this token covers.
    pub fn source(&self) -> &str {
        match self {
            Token::Text { content } => content,
            Token::Formula { raw_text, .. } => raw_text,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, Token::Formula { .. })
    }
}

/// Tokenize `text` with the delimiters and code exclusion from `config`.
///
/// An opening marker without a matching closer turns the rest of the text,
/// marker included, into literal text.
pub fn tokenize(text: &str, config: &ResolvedConfig) -> Vec<Token> {
    let delimiters = active_delimiters(&config.delimiter_kinds);
    if delimiters.is_empty() || text.is_empty() {
        return vec![Token::Text {
            content: text.to_string(),
        }];
    }

    let code_index = config.exclude_code.then(|| CodeSpanIndex::build(text));
    let code = code_index.as_ref();

    let mut tokens = Vec::new();
    let mut cursor = 0;
    while let Some(opening) = find_next_opening(text, cursor, &delimiters, code) {
        push_text(&mut tokens, &text[cursor..opening.index]);

        let expression_start = opening.expression_start();
        let Some(close) = find_closing_index(text, expression_start, &opening.delimiter, code)
        else {
            push_text(&mut tokens, &text[opening.index..]);
            return tokens;
        };

        let end = close + opening.delimiter.close.len();
        tokens.push(Token::Formula {
            raw_text: text[opening.index..end].to_string(),
            expression: text[expression_start..close].to_string(),
        });
        cursor = end;
    }
    push_text(&mut tokens, &text[cursor..]);
    tokens
}

/// Whether any token is a formula.
pub fn has_formula(tokens: &[Token]) -> bool {
    tokens.iter().any(Token::is_formula)
}

/// Append text, extending a trailing text token instead of starting a new one.
fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Text { content }) = tokens.last_mut() {
        content.push_str(text);
    } else {
        tokens.push(Token::Text {
            content: text.to_string(),
        });
    }
}
