//! Format-specific handlers for target documents
//!
//! Each handler implements [`FormatHandler`] to turn file content into a
//! [`TargetConfig`] and back. Rendering is deterministic: the same config
//! always produces byte-identical output.
//!
//! [`FormatHandler::render_over`] renders on top of the previous file
//! content instead: entries and top-level keys that are still present keep
//! their original text, comments and quoting included.

pub mod json;
pub mod yaml;

use modesync_fs::NormalizedPath;
use serde_json::Value;

use crate::{Result, TargetConfig};

/// Handler for format-specific target parsing and rendering
pub trait FormatHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Parse file content. Empty or whitespace-only content is an empty config.
    fn parse(&self, content: &str) -> Result<TargetConfig>;

    /// Render a config to file content.
    fn render(&self, config: &TargetConfig) -> Result<String>;

    /// Render `config` over `previous`, reusing the original text of every
    /// entry that is carried over unchanged.
    fn render_over(&self, previous: &str, config: &TargetConfig) -> Result<String> {
        let _ = previous;
        self.render(config)
    }
}

/// Accept a spliced document only if it reads back as `config`; otherwise
/// fall back to a full render.
fn checked(
    handler: &dyn FormatHandler,
    spliced: Option<String>,
    config: &TargetConfig,
) -> Result<String> {
    match spliced {
        Some(text) if handler.parse(&text).ok().as_ref() == Some(config) => Ok(text),
        Some(_) => {
            tracing::warn!(format = handler.name(), "Spliced target did not read back, rendering in full");
            handler.render(config)
        }
        None => {
            tracing::debug!(format = handler.name(), "Previous layout not recognized, rendering in full");
            handler.render(config)
        }
    }
}

/// Original text of the previous entries, handed out once per match.
struct EntrySpans<'a> {
    spans: Vec<Option<(&'a Value, &'a str)>>,
}

impl<'a> EntrySpans<'a> {
    fn new(entries: &'a [Value], texts: Vec<&'a str>) -> Self {
        Self {
            spans: entries.iter().zip(texts).map(Some).collect(),
        }
    }

    /// Text of the first unused previous entry equal to `entry`.
    fn take(&mut self, entry: &Value) -> Option<&'a str> {
        let slot = self
            .spans
            .iter_mut()
            .find(|slot| matches!(slot, Some((value, _)) if *value == entry))?;
        slot.take().map(|(_, text)| text)
    }
}

/// `.json` targets are JSON; everything else, including `.roomodes`, is YAML.
pub fn handler_for(path: &NormalizedPath) -> Box<dyn FormatHandler> {
    match path.extension().map(str::to_lowercase).as_deref() {
        Some("json") => Box::new(JsonFormatHandler::new()),
        _ => Box::new(YamlFormatHandler::new()),
    }
}

pub use json::JsonFormatHandler;
pub use yaml::YamlFormatHandler;
