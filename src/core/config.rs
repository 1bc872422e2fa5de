//! Math rendering configuration: partial user input, resolution to defaults, and loading.
//!
//! Resolution never fails: missing or invalid values silently fall back to defaults.
//! Only reading an explicitly requested config file can produce a [`ConfigError`].

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::app;
use crate::core::math::DelimiterKind;
use crate::core::paths;

/// Default cap on rendered images per reply.
pub const DEFAULT_MAX_EXPRESSIONS_PER_REPLY: usize = 8;
/// Default cap on expression length, in characters.
pub const DEFAULT_MAX_CHARS_PER_EXPRESSION: usize = 1200;
/// Default cap on rendered image width, in pixels.
pub const DEFAULT_MAX_IMAGE_WIDTH_PX: u32 = 2048;

/// User-supplied configuration. Every field is optional; values of the wrong
/// JSON type are treated as missing rather than rejecting the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MathConfigInput {
    #[serde(deserialize_with = "lenient_bool")]
    pub enabled: Option<bool>,
    #[serde(deserialize_with = "lenient_names")]
    pub delimiters: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_bool")]
    pub exclude_code: Option<bool>,
    #[serde(deserialize_with = "lenient_number")]
    pub max_expressions_per_reply: Option<i64>,
    #[serde(deserialize_with = "lenient_number")]
    pub max_chars_per_expression: Option<i64>,
    #[serde(deserialize_with = "lenient_number")]
    pub max_image_width_px: Option<i64>,
}

/// Fully-defaulted configuration used by the tokenizer and segment builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub enabled: bool,
    /// Active delimiter kinds in canonical order, without duplicates.
    pub delimiter_kinds: Vec<DelimiterKind>,
    pub exclude_code: bool,
    pub max_expressions_per_reply: usize,
    pub max_chars_per_expression: usize,
    pub max_image_width_px: u32,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve(&MathConfigInput::default())
    }
}

/// Normalize user input into a [`ResolvedConfig`].
pub fn resolve(input: &MathConfigInput) -> ResolvedConfig {
    ResolvedConfig {
        enabled: input.enabled.unwrap_or(true),
        delimiter_kinds: resolve_kinds(input.delimiters.as_deref()),
        exclude_code: input.exclude_code.unwrap_or(true),
        max_expressions_per_reply: positive(
            input.max_expressions_per_reply,
            DEFAULT_MAX_EXPRESSIONS_PER_REPLY,
        ),
        max_chars_per_expression: positive(
            input.max_chars_per_expression,
            DEFAULT_MAX_CHARS_PER_EXPRESSION,
        ),
        max_image_width_px: positive(input.max_image_width_px, DEFAULT_MAX_IMAGE_WIDTH_PX),
    }
}

fn resolve_kinds(names: Option<&[String]>) -> Vec<DelimiterKind> {
    let requested: Vec<DelimiterKind> = names
        .unwrap_or_default()
        .iter()
        .filter_map(|name| DelimiterKind::from_name(name))
        .collect();
    if requested.is_empty() {
        return DelimiterKind::ALL.to_vec();
    }
    DelimiterKind::ALL
        .into_iter()
        .filter(|kind| requested.contains(kind))
        .collect()
}

fn positive<T: TryFrom<i64>>(value: Option<i64>, default: T) -> T {
    value
        .filter(|n| *n >= 1)
        .and_then(|n| T::try_from(n).ok())
        .unwrap_or(default)
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(Value::deserialize(d)?.as_bool())
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(number_from_value(&Value::deserialize(d)?))
}

fn lenient_names<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    let names = match Value::deserialize(d)? {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(s) => split_names(&s),
        _ => return Ok(None),
    };
    Ok(Some(names))
}

/// Finite numbers are floored; everything else is rejected.
fn number_from_value(value: &Value) -> Option<i64> {
    let n = value.as_f64()?;
    n.is_finite().then(|| n.floor() as i64)
}

fn split_names(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_env_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_env_number(s: &str) -> Option<i64> {
    let n: f64 = s.trim().parse().ok()?;
    n.is_finite().then(|| n.floor() as i64)
}

impl MathConfigInput {
    /// Replace fields with those set in `other`.
    pub fn overlay(&mut self, other: MathConfigInput) {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.delimiters.is_some() {
            self.delimiters = other.delimiters;
        }
        if other.exclude_code.is_some() {
            self.exclude_code = other.exclude_code;
        }
        if other.max_expressions_per_reply.is_some() {
            self.max_expressions_per_reply = other.max_expressions_per_reply;
        }
        if other.max_chars_per_expression.is_some() {
            self.max_chars_per_expression = other.max_chars_per_expression;
        }
        if other.max_image_width_px.is_some() {
            self.max_image_width_px = other.max_image_width_px;
        }
    }

    /// Build an input from `CHAT_MATH_*` variables returned by `lookup`.
    /// Unparseable values are left unset.
    pub fn from_env_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", app::ENV_PREFIX, name));
        MathConfigInput {
            enabled: var("ENABLED").as_deref().and_then(parse_env_bool),
            delimiters: var("DELIMITERS").map(|s| split_names(&s)),
            exclude_code: var("EXCLUDE_CODE").as_deref().and_then(parse_env_bool),
            max_expressions_per_reply: var("MAX_EXPRESSIONS").as_deref().and_then(parse_env_number),
            max_chars_per_expression: var("MAX_CHARS").as_deref().and_then(parse_env_number),
            max_image_width_px: var("MAX_WIDTH").as_deref().and_then(parse_env_number),
        }
    }
}

/// Errors when reading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a JSON config file.
pub fn read_file(path: &Path) -> Result<MathConfigInput, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration: the explicit file (or the default config file when it exists),
/// then `CHAT_MATH_*` environment overrides.
pub fn load(path: Option<&Path>) -> Result<MathConfigInput, ConfigError> {
    let mut input = match path {
        Some(p) => read_file(p)?,
        None => match paths::config_file() {
            Some(p) if p.is_file() => read_file(&p)?,
            _ => MathConfigInput::default(),
        },
    };
    input.overlay(MathConfigInput::from_env_lookup(|key| env::var(key).ok()));
    Ok(input)
}
