//! YAML target handler
//!
//! Parses through `serde_yaml` into JSON values so both formats share one
//! in-memory model. A JSON document is valid YAML, so a `.roomodes` file
//! written as JSON by hand parses here too.
//!
//! Rendering over an existing file works on lines: top-level keys start at
//! column zero, and `customModes` items start with `- ` at the sequence
//! indent. Comment and blank lines in front of an item travel with it.

use super::{EntrySpans, FormatHandler, checked};
use crate::{Error, MANAGED_KEY, MODES_KEY, Result, TargetConfig};
use serde_json::{Map, Value};

#[derive(Debug, Default, Clone)]
pub struct YamlFormatHandler;

impl YamlFormatHandler {
    pub fn new() -> Self {
        Self
    }
}

impl FormatHandler for YamlFormatHandler {
    fn name(&self) -> &'static str {
        "YAML"
    }

    fn parse(&self, content: &str) -> Result<TargetConfig> {
        if content.trim().is_empty() {
            return Ok(TargetConfig::new());
        }
        let value: Value = serde_yaml::from_str(content).map_err(|e| Error::Parse {
            format: self.name(),
            message: e.to_string(),
        })?;
        TargetConfig::from_value(value)
    }

    fn render(&self, config: &TargetConfig) -> Result<String> {
        serde_yaml::to_string(&config.to_value()).map_err(|e| Error::Render {
            format: self.name(),
            message: e.to_string(),
        })
    }

    fn render_over(&self, previous: &str, config: &TargetConfig) -> Result<String> {
        let spliced = self
            .parse(previous)
            .ok()
            .and_then(|before| splice(previous, &before, config));
        checked(self, spliced, config)
    }
}

/// Key of a `key: ...` line at column zero.
fn top_level_key(line: &str) -> Option<&str> {
    let first = line.chars().next()?;
    if first.is_whitespace() || matches!(first, '#' | '-' | '.' | '{' | '[') {
        return None;
    }
    let (key, _) = line.split_once(':')?;
    Some(key.trim().trim_matches(|c| c == '"' || c == '\''))
}

fn is_trivia(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// The `customModes` block of a previous document.
#[derive(Debug, Default)]
struct Sequence {
    /// Original key line, when it introduced a block sequence.
    head: Option<String>,
    indent: usize,
    items: Vec<String>,
    /// Comment and blank lines after the last item.
    tail: String,
}

fn scan_sequence(lines: &[&str]) -> Option<Sequence> {
    let (head, body) = lines.split_first()?;
    let (_, value) = head.split_once(':')?;
    let value = value.trim();
    let block = value.is_empty() || value.starts_with('#');
    let empty_flow = ["[]", "~", "null"].contains(&value)
        || value.starts_with("[] #")
        || value.starts_with("[]#");
    if !block && !empty_flow {
        return None;
    }

    let mut sequence = Sequence {
        head: block.then(|| head.to_string()),
        ..Default::default()
    };
    let mut indent = None;
    let mut current: Option<String> = None;
    let mut pending = String::new();
    for line in body {
        if is_trivia(line) {
            pending.push_str(line);
            continue;
        }
        if empty_flow {
            return None;
        }
        let depth = indent_of(line);
        let rest = &line[depth..];
        let starts_item = rest.starts_with("- ") || rest.trim_end() == "-";
        let seq_indent = *indent.get_or_insert(depth);
        if depth < seq_indent || (!starts_item && (depth == seq_indent || current.is_none())) {
            return None;
        }
        if depth == seq_indent {
            if let Some(item) = current.take() {
                sequence.items.push(item);
            }
            let mut item = std::mem::take(&mut pending);
            item.push_str(line);
            current = Some(item);
        } else if let Some(item) = current.as_mut() {
            item.push_str(&std::mem::take(&mut pending));
            item.push_str(line);
        }
    }
    sequence.items.extend(current);
    sequence.indent = indent.unwrap_or(0);
    sequence.tail = pending;
    Some(sequence)
}

/// One sequence item rendered fresh at `indent`.
fn fresh_item(entry: &Value, indent: usize) -> Option<String> {
    let text = serde_yaml::to_string(std::slice::from_ref(entry)).ok()?;
    let pad = " ".repeat(indent);
    Some(
        text.split_inclusive('\n')
            .map(|line| {
                if line.trim().is_empty() {
                    line.to_string()
                } else {
                    format!("{}{}", pad, line)
                }
            })
            .collect(),
    )
}

fn render_marker(config: &TargetConfig) -> Option<String> {
    if config.managed.is_empty() {
        return Some(String::new());
    }
    let marker: Map<String, Value> = config
        .managed
        .iter()
        .map(|(slug, checksum)| (slug.clone(), Value::String(checksum.clone())))
        .collect();
    let mut doc = Map::new();
    doc.insert(MANAGED_KEY.into(), Value::Object(marker));
    serde_yaml::to_string(&Value::Object(doc)).ok()
}

/// Rebuild `previous` around the new entries. `None` when its layout is not
/// one this can follow.
fn splice(previous: &str, before: &TargetConfig, config: &TargetConfig) -> Option<String> {
    if before.extra != config.extra {
        return None;
    }
    let mut text = previous.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    let lines: Vec<&str> = text.split_inclusive('\n').collect();

    let mut preamble_end = lines.len();
    let mut blocks: Vec<(&str, usize, usize)> = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        if let Some(key) = top_level_key(line) {
            match blocks.last_mut() {
                Some(last) => last.2 = index,
                None => preamble_end = index,
            }
            blocks.push((key, index, lines.len()));
        }
    }

    let sequence = match blocks.iter().find(|(key, ..)| *key == MODES_KEY) {
        Some(&(_, start, end)) => scan_sequence(&lines[start..end])?,
        None if before.modes.is_empty() => Sequence::default(),
        None => return None,
    };
    if sequence.items.len() != before.modes.len()
        || (!before.managed.is_empty() && !blocks.iter().any(|(key, ..)| *key == MANAGED_KEY))
    {
        return None;
    }

    let mut spans = EntrySpans::new(&before.modes, sequence.items.iter().map(String::as_str).collect());
    let mut modes = String::new();
    if config.modes.is_empty() {
        modes.push_str(&format!("{}: []\n", MODES_KEY));
    } else {
        match &sequence.head {
            Some(head) => modes.push_str(head),
            None => modes.push_str(&format!("{}:\n", MODES_KEY)),
        }
        for entry in &config.modes {
            match spans.take(entry) {
                Some(original) => modes.push_str(original),
                None => modes.push_str(&fresh_item(entry, sequence.indent)?),
            }
        }
    }
    modes.push_str(&sequence.tail);

    let mut out: String = lines[..preamble_end].concat();
    if !blocks.iter().any(|(key, ..)| *key == MODES_KEY) {
        out.push_str(&modes);
    }
    for &(key, start, end) in &blocks {
        if key == MODES_KEY {
            out.push_str(&modes);
        } else if key == MANAGED_KEY {
            // Column-zero comments after the marker are not part of it
            for line in &lines[start + 1..end] {
                if line.starts_with('#') {
                    out.push_str(line);
                }
            }
        } else {
            out.push_str(&lines[start..end].concat());
        }
    }
    out.push_str(&render_marker(config)?);
    Some(out)
}
