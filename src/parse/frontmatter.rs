use indexmap::IndexMap;
use serde_yaml::Value;

/// Error raised while turning a document into a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no frontmatter block found")]
    MissingFrontmatter,
    #[error("invalid frontmatter: {0}")]
    InvalidYaml(String),
    #[error("frontmatter must be a mapping")]
    NotAMapping,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {value}")]
    InvalidEnum { field: &'static str, value: String },
    #[error("{0} has the wrong type")]
    InvalidType(&'static str),
}

/// Loosely typed frontmatter: keys in document order, values undecoded
pub type RawFrontmatter = IndexMap<String, Value>;

/// Split a document into its frontmatter text and body.
///
/// The document must start with a `---` line and contain a closing `---`
/// line. The returned body is trimmed. Line endings are normalized to `\n`.
pub fn split_frontmatter(text: &str) -> Result<(String, String), ParseError> {
    let text = text.replace("\r\n", "\n");
    let rest = text
        .strip_prefix("---\n")
        .ok_or(ParseError::MissingFrontmatter)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches('\n') == "---" {
            let yaml = rest[..offset].trim_end_matches('\n').to_string();
            let body = rest[offset + line.len()..].trim().to_string();
            return Ok((yaml, body));
        }
        offset += line.len();
    }
    Err(ParseError::MissingFrontmatter)
}

/// Decode frontmatter text into a string-keyed map
pub fn decode_frontmatter(yaml: &str) -> Result<RawFrontmatter, ParseError> {
    if yaml.trim().is_empty() {
        return Err(ParseError::NotAMapping);
    }
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| ParseError::InvalidYaml(e.to_string()))?;
    let Value::Mapping(mapping) = value else {
        return Err(ParseError::NotAMapping);
    };

    let mut map = RawFrontmatter::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = scalar_text(&key).ok_or(ParseError::NotAMapping)?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Render a YAML scalar as text. Numbers keep their YAML spelling
/// (`2.1` → `"2.1"`); sequences, mappings and null yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
