//! Cleanup of raw model output.
//!
//! Models wrap JSON in code fences, add prose around it, and prefix chat
//! replies with role labels. Everything here is pure string handling.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Longest chat reply returned to a student, in characters.
pub const MAX_REPLY_CHARS: usize = 4000;

const ROLE_LABELS: &[&str] = &["tutor:", "assistant:", "ai:", "model:"];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no JSON value found in response")]
    NoJson,

    #[error("unterminated JSON value")]
    Unterminated,

    #[error("invalid JSON: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Pull the first JSON object or array out of `text` and deserialize it.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let body = strip_code_fences(text);

    if let Ok(value) = serde_json::from_str(body) {
        return Ok(value);
    }

    let start = body.find(['{', '[']).ok_or(ParseError::NoJson)?;
    let candidate = find_json_value(&body[start..])?;
    Ok(serde_json::from_str(candidate)?)
}

/// Contents of the first fenced block, or the trimmed input when unfenced.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let after_open = &trimmed[open + 3..];
    // Skip the language tag (```json).
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];

    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Slice of `s` covering one balanced object or array starting at index 0.
fn find_json_value(s: &str) -> Result<&str, ParseError> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&s[..=i]);
                }
            }
            _ => {}
        }
    }

    Err(ParseError::Unterminated)
}

/// Tidy a free-text tutor reply for display.
pub fn sanitize_reply(text: &str) -> String {
    let mut reply = text.trim();

    loop {
        let lower = reply.to_lowercase();
        match ROLE_LABELS.iter().find(|label| lower.starts_with(*label)) {
            Some(label) => reply = reply[label.len()..].trim_start(),
            None => break,
        }
    }

    let mut out = String::with_capacity(reply.len());
    let mut blank_run = 0;
    for line in reply.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }

    match out.char_indices().nth(MAX_REPLY_CHARS) {
        Some((cut, _)) => out[..cut].trim_end().to_string(),
        None => out.trim_end().to_string(),
    }
}

/// Trim and collapse inner whitespace. Used for titles and list items.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `clean_text` over a list, dropping entries that end up empty.
pub fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| clean_text(s))
        .filter(|s| !s.is_empty())
        .collect()
}
