//! JSON target handler
//!
//! Renders with two-space indentation and a trailing newline.
//!
//! Rendering over an existing file re-lays the top-level members with that
//! indentation but copies each kept value, and each kept `customModes`
//! element, as the original bytes.

use super::{EntrySpans, FormatHandler, checked};
use crate::{Error, MANAGED_KEY, MODES_KEY, Result, TargetConfig};
use serde_json::{Map, Value};

const INDENT: &str = "  ";
const ELEMENT_INDENT: &str = "    ";

#[derive(Debug, Default, Clone)]
pub struct JsonFormatHandler;

impl JsonFormatHandler {
    pub fn new() -> Self {
        Self
    }
}

impl FormatHandler for JsonFormatHandler {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn parse(&self, content: &str) -> Result<TargetConfig> {
        if content.trim().is_empty() {
            return Ok(TargetConfig::new());
        }
        let value: Value = serde_json::from_str(content).map_err(|e| Error::Parse {
            format: self.name(),
            message: e.to_string(),
        })?;
        TargetConfig::from_value(value)
    }

    fn render(&self, config: &TargetConfig) -> Result<String> {
        serde_json::to_string_pretty(&config.to_value())
            .map(|s| s + "\n")
            .map_err(|e| Error::Render {
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

fn skip_ws(bytes: &[u8], mut at: usize) -> usize {
    while bytes.get(at).is_some_and(u8::is_ascii_whitespace) {
        at += 1;
    }
    at
}

/// End of the string starting at `at` (one past the closing quote).
fn string_end(bytes: &[u8], at: usize) -> Option<usize> {
    let mut i = at + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// End of the value starting at `at`.
fn value_end(bytes: &[u8], at: usize) -> Option<usize> {
    match *bytes.get(at)? {
        b'"' => string_end(bytes, at),
        b'{' | b'[' => {
            let mut depth = 0usize;
            let mut i = at;
            while i < bytes.len() {
                match bytes[i] {
                    b'"' => {
                        i = string_end(bytes, i)?;
                        continue;
                    }
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth = depth.checked_sub(1)?;
                        if depth == 0 {
                            return Some(i + 1);
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            None
        }
        _ => {
            let mut i = at;
            while i < bytes.len() && !matches!(bytes[i], b',' | b'}' | b']') && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            (i > at).then_some(i)
        }
    }
}

/// A top-level member: decoded key, key as written, value as written.
struct Member<'a> {
    key: String,
    raw_key: &'a str,
    value: &'a str,
}

fn members(text: &str) -> Option<Vec<Member<'_>>> {
    let bytes = text.as_bytes();
    let mut i = skip_ws(bytes, 0);
    if bytes.get(i) != Some(&b'{') {
        return None;
    }
    i = skip_ws(bytes, i + 1);
    let mut out = Vec::new();
    if bytes.get(i) == Some(&b'}') {
        i += 1;
    } else {
        loop {
            if bytes.get(i) != Some(&b'"') {
                return None;
            }
            let key_end = string_end(bytes, i)?;
            let raw_key = &text[i..key_end];
            let key: String = serde_json::from_str(raw_key).ok()?;
            i = skip_ws(bytes, key_end);
            if bytes.get(i) != Some(&b':') {
                return None;
            }
            let start = skip_ws(bytes, i + 1);
            let end = value_end(bytes, start)?;
            out.push(Member {
                key,
                raw_key,
                value: &text[start..end],
            });
            i = skip_ws(bytes, end);
            match bytes.get(i) {
                Some(b',') => i = skip_ws(bytes, i + 1),
                Some(b'}') => {
                    i += 1;
                    break;
                }
                _ => return None,
            }
        }
    }
    (skip_ws(bytes, i) == bytes.len()).then_some(out)
}

fn elements(array: &str) -> Option<Vec<&str>> {
    let bytes = array.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let mut i = skip_ws(bytes, 1);
    let mut out = Vec::new();
    if bytes.get(i) == Some(&b']') {
        return Some(out);
    }
    loop {
        let end = value_end(bytes, i)?;
        out.push(&array[i..end]);
        i = skip_ws(bytes, end);
        match bytes.get(i) {
            Some(b',') => i = skip_ws(bytes, i + 1),
            Some(b']') => return Some(out),
            _ => return None,
        }
    }
}

/// Pretty-print `value` for a position indented by `indent`.
fn pretty_at(value: &Value, indent: &str) -> Option<String> {
    let text = serde_json::to_string_pretty(value).ok()?;
    Some(text.replace('\n', &format!("\n{}", indent)))
}

fn splice(previous: &str, before: &TargetConfig, config: &TargetConfig) -> Option<String> {
    if before.extra != config.extra {
        return None;
    }
    let members = members(previous)?;
    let texts = match members.iter().find(|m| m.key == MODES_KEY) {
        Some(member) if member.value.starts_with('[') => elements(member.value)?,
        Some(_) => return None,
        None => Vec::new(),
    };
    if texts.len() != before.modes.len() {
        return None;
    }

    let mut spans = EntrySpans::new(&before.modes, texts);
    let mut items = Vec::with_capacity(config.modes.len());
    for entry in &config.modes {
        match spans.take(entry) {
            Some(original) => items.push(original.to_string()),
            None => items.push(pretty_at(entry, ELEMENT_INDENT)?),
        }
    }
    let modes = if items.is_empty() {
        "[]".to_string()
    } else {
        format!(
            "[\n{}{}\n{}]",
            ELEMENT_INDENT,
            items.join(format!(",\n{}", ELEMENT_INDENT).as_str()),
            INDENT
        )
    };

    let mut parts = Vec::with_capacity(members.len() + 2);
    if !members.iter().any(|m| m.key == MODES_KEY) {
        parts.push(format!("{}\"{}\": {}", INDENT, MODES_KEY, modes));
    }
    for member in &members {
        if member.key == MODES_KEY {
            parts.push(format!("{}{}: {}", INDENT, member.raw_key, modes));
        } else if member.key != MANAGED_KEY {
            parts.push(format!("{}{}: {}", INDENT, member.raw_key, member.value));
        }
    }
    if !config.managed.is_empty() {
        let marker: Map<String, Value> = config
            .managed
            .iter()
            .map(|(slug, checksum)| (slug.clone(), Value::String(checksum.clone())))
            .collect();
        parts.push(format!(
            "{}\"{}\": {}",
            INDENT,
            MANAGED_KEY,
            pretty_at(&Value::Object(marker), INDENT)?
        ));
    }
    Some(format!("{{\n{}\n}}\n", parts.join(",\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_empty_content() {
        let config = JsonFormatHandler::new().parse("  \n").unwrap();
        assert!(config.modes.is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = JsonFormatHandler::new().parse("{\"customModes\": [").unwrap_err();
        assert!(matches!(err, Error::Parse { format: "JSON", .. }));
    }

    #[test]
    fn test_render_then_parse_keeps_everything() {
        let content = r#"{
  "customModes": [
    {
      "slug": "mine",
      "name": "Mine",
      "zeta": 1,
      "alpha": 2
    }
  ],
  "theme": "dark",
  "__modesync_managed__": {
    "code": "sha256:00"
  }
}
"#;
        let handler = JsonFormatHandler::new();
        let config = handler.parse(content).unwrap();
        assert!(config.managed.contains_key("code"));
        assert_eq!(handler.render(&config).unwrap(), content);
        assert!(content.contains(MANAGED_KEY));
    }

    #[test]
    fn test_render_over_keeps_foreign_element_bytes() {
        let previous = r#"{"customModes": [{"slug":"mine",   "name":"Mine"}], "theme": {"dark":true}}"#;
        let handler = JsonFormatHandler::new();
        let mut config = handler.parse(previous).unwrap();
        let code = json!({"slug": "code"});
        config.managed.insert("code".into(), crate::entry_checksum(&code));
        config.modes.insert(0, code);

        let rendered = handler.render_over(previous, &config).unwrap();

        assert_eq!(
            rendered,
            format!(
                "{{\n  \"customModes\": [\n    {{\n      \"slug\": \"code\"\n    }},\n    {{\"slug\":\"mine\",   \"name\":\"Mine\"}}\n  ],\n  \"theme\": {{\"dark\":true}},\n  \"__modesync_managed__\": {{\n    \"code\": \"{}\"\n  }}\n}}\n",
                config.managed["code"]
            )
        );
    }

    #[test]
    fn test_render_over_own_output_is_identical() {
        let handler = JsonFormatHandler::new();
        let mut config = TargetConfig::new();
        let entry = json!({"slug": "a", "groups": ["read", ["edit", {"fileRegex": "\\.md$"}]]});
        config.managed.insert("a".into(), crate::entry_checksum(&entry));
        config.modes.push(entry);
        config.modes.push(json!({"slug": "mine"}));
        config.extra.insert("theme".into(), json!("dark"));
        let rendered = handler.render(&config).unwrap();

        assert_eq!(handler.render_over(&rendered, &config).unwrap(), rendered);
        assert!(rendered.contains(MANAGED_KEY));
    }
}
