//! Markdown post bodies
//!
//! The platform's composer takes plain text only, so `**bold**` spans are
//! rewritten with Mathematical Sans-Serif Bold code points. Everything else
//! passes through untouched.

use std::path::Path;

use crate::workflow::PostContent;
use crate::{Error, Result};

const BOLD_UPPER: u32 = 0x1D5D4;
const BOLD_LOWER: u32 = 0x1D5EE;
const BOLD_DIGIT: u32 = 0x1D7EC;

/// Sans-serif bold form of ASCII letters and digits
fn to_bold(c: char) -> char {
    let base = match c {
        'A'..='Z' => BOLD_UPPER + (c as u32 - 'A' as u32),
        'a'..='z' => BOLD_LOWER + (c as u32 - 'a' as u32),
        '0'..='9' => BOLD_DIGIT + (c as u32 - '0' as u32),
        _ => return c,
    };
    char::from_u32(base).unwrap_or(c)
}

/// End index of the bold span's content if one opens at `start`
fn bold_span(chars: &[char], start: usize) -> Option<usize> {
    if chars.get(start) != Some(&'*') || chars.get(start + 1) != Some(&'*') {
        return None;
    }

    let content_start = start + 2;
    let mut end = content_start;
    while end < chars.len() && chars[end] != '*' {
        end += 1;
    }

    if end > content_start && chars.get(end) == Some(&'*') && chars.get(end + 1) == Some(&'*') {
        Some(end)
    } else {
        None
    }
}

/// Rewrite `**...**` spans as Unicode bold
pub fn to_platform_text(markdown: &str) -> String {
    let chars: Vec<char> = markdown.chars().collect();
    let mut out = String::with_capacity(markdown.len());
    let mut i = 0;

    while i < chars.len() {
        match bold_span(&chars, i) {
            Some(end) => {
                out.extend(chars[i + 2..end].iter().copied().map(to_bold));
                i = end + 2;
            }
            None => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }

    out
}

/// Read a markdown file into post content
pub fn load_content<P: AsRef<Path>>(path: P) -> Result<PostContent> {
    let path = path.as_ref();
    let markdown = std::fs::read_to_string(path)
        .map_err(|e| Error::invalid_input(format!("cannot read content from {}: {}", path.display(), e)))?;
    Ok(PostContent::new(to_platform_text(&markdown)))
}
