//! Content types accepted for upload and their validators.

use std::fmt;
use std::str::FromStr;

use crate::error::ControlError;

/// Declared type of an uploaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Rules and decoders.
    Xml,
    /// CDB lists, one `key:value` per line.
    List,
}

impl ContentType {
    pub fn extension(self) -> &'static str {
        match self {
            ContentType::Xml => "xml",
            ContentType::List => "txt",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Xml => "application/xml",
            ContentType::List => "application/octet-stream",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for ContentType {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/xml" | "text/xml" => Ok(ContentType::Xml),
            "application/octet-stream" => Ok(ContentType::List),
            _ => Err(ControlError::UnsupportedContentType(s.to_string())),
        }
    }
}

/// Validates staged content before it is promoted. Returns the list of
/// problems found on failure.
pub trait ContentValidator {
    fn validate(&self, content_type: ContentType, content: &[u8]) -> Result<(), Vec<String>>;
}

impl<F> ContentValidator for F
where
    F: Fn(ContentType, &[u8]) -> Result<(), Vec<String>>,
{
    fn validate(&self, content_type: ContentType, content: &[u8]) -> Result<(), Vec<String>> {
        self(content_type, content)
    }
}

/// Structural checks for ruleset files: balanced XML tags, well-formed CDB
/// list lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct RulesetValidator;

impl ContentValidator for RulesetValidator {
    fn validate(&self, content_type: ContentType, content: &[u8]) -> Result<(), Vec<String>> {
        let text = std::str::from_utf8(content)
            .map_err(|e| vec![format!("content is not valid UTF-8: {e}")])?;
        let problems = match content_type {
            ContentType::Xml => check_xml(text),
            ContentType::List => check_list(text),
        };
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

/// Tag balance only; ruleset files legitimately hold several top-level
/// elements, so no single root is required.
fn check_xml(text: &str) -> Vec<String> {
    let mut problems = Vec::new();
    let mut open: Vec<(&str, usize)> = Vec::new();
    let mut rest = 0;

    while let Some(found) = text[rest..].find('<') {
        let start = rest + found;
        let line = line_of(text, start);
        let body = &text[start + 1..];

        let close_marker = if body.starts_with("!--") {
            "-->"
        } else if body.starts_with("?") {
            "?>"
        } else {
            ">"
        };
        let Some(end) = find_tag_end(body, close_marker) else {
            problems.push(format!("line {line}: unterminated markup"));
            return problems;
        };
        rest = start + 1 + end + close_marker.len();

        if close_marker != ">" || body.starts_with('!') {
            continue;
        }
        let tag = &body[..end];
        if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim();
            match open.pop() {
                Some((expected, _)) if expected == name => {}
                Some((expected, opened)) => {
                    problems.push(format!(
                        "line {line}: </{name}> closes <{expected}> opened on line {opened}"
                    ));
                    return problems;
                }
                None => {
                    problems.push(format!("line {line}: </{name}> has no opening tag"));
                    return problems;
                }
            }
        } else if !tag.trim_end().ends_with('/') {
            let name = tag.split_whitespace().next().unwrap_or_default();
            if name.is_empty() {
                problems.push(format!("line {line}: empty tag"));
                return problems;
            }
            open.push((name, line));
        }
    }

    for (name, opened) in open {
        problems.push(format!("<{name}> opened on line {opened} is never closed"));
    }
    problems
}

/// Position of `marker` in `body`, skipping quoted attribute values.
fn find_tag_end(body: &str, marker: &str) -> Option<usize> {
    if marker != ">" {
        return body.find(marker);
    }
    let mut quote: Option<char> = None;
    for (idx, ch) in body.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '>') => return Some(idx),
            (None, _) => {}
        }
    }
    None
}

fn check_list(text: &str) -> Vec<String> {
    let mut problems = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let key = if let Some(quoted) = line.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) if quoted[end + 1..].starts_with(':') => &quoted[..end],
                _ => {
                    problems.push(format!("line {}: quoted key must be followed by ':'", idx + 1));
                    continue;
                }
            }
        } else {
            match line.split_once(':') {
                Some((key, _)) => key,
                None => {
                    problems.push(format!("line {}: expected 'key:value'", idx + 1));
                    continue;
                }
            }
        };
        if key.is_empty() {
            problems.push(format!("line {}: empty key", idx + 1));
        }
    }
    problems
}
