//! Response Parser — turns a delimiter-formatted completion into a `StructuredResponse`.
//!
//! Expected layout (see `chat::prompts`):
//!
//! ```text
//! <preamble> ::Section:: <score> ::Section:: <recommendation> ::Section:: <knowledge>
//! ::Section:: <code comment> ::filename:: <name> ```<lang>\n<content>``` ...
//! ```
//!
//! The parser is strict: any structural deviation rejects the whole completion.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::chat::prompts::{CODE_FENCE, FILENAME_DELIMITER, SECTION_DELIMITER};
use crate::models::chat::{CodeArtifact, StructuredResponse};

/// Minimum number of sections after the preamble: score, recommendation, knowledge, code.
const REQUIRED_SECTIONS: usize = 4;

/// Why a completion could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected at least {REQUIRED_SECTIONS} sections, found {found}")]
    MissingSections { found: usize },

    #[error("score section contains no integer")]
    MissingScore,

    #[error("score '{0}' does not fit in an integer")]
    ScoreOutOfRange(String),

    #[error("code file #{index} is not wrapped in a code fence")]
    MissingFence { index: usize },

    #[error("code file #{index} has no line break after its language tag")]
    MissingLanguageLine { index: usize },
}

fn score_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+\b").expect("valid score regex"))
}

fn decimal_digit_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\p{Nd}$").expect("valid digit regex"))
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    decimal_digit_pattern().is_match(c.encode_utf8(&mut buf))
}

/// Numeric value of any Unicode decimal digit (`７`, `٣`, `१` ...), as `\d` matches them all.
/// Decimal digits are encoded in runs of ten ascending from zero, possibly back to back,
/// so the offset from the start of the run is the value.
fn digit_value(c: char) -> Option<u32> {
    if let Some(value) = c.to_digit(10) {
        return Some(value);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut start = c as u32;
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }
    Some((c as u32 - start) % 10)
}

/// Parses a raw completion. Returns `Err` with the first structural problem found.
pub fn parse_completion(raw: &str) -> Result<StructuredResponse, ParseError> {
    let sections: Vec<&str> = raw.split(SECTION_DELIMITER).skip(1).collect();
    if sections.len() < REQUIRED_SECTIONS {
        return Err(ParseError::MissingSections {
            found: sections.len(),
        });
    }

    let score = parse_score(sections[0])?;
    let recommendation = sections[1].trim().to_string();
    let knowledge = sections[2].trim().to_string();

    // Code is always read from the last section; extra middle sections are ignored.
    let code_section = sections[sections.len() - 1];
    let mut chunks = code_section.split(FILENAME_DELIMITER);
    let code_comment = chunks.next().unwrap_or_default().trim().to_string();

    let code = chunks
        .enumerate()
        .map(|(index, chunk)| parse_artifact(index, chunk))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StructuredResponse {
        score,
        recommendation,
        knowledge,
        code_comment,
        code,
    })
}

fn parse_score(section: &str) -> Result<i32, ParseError> {
    let token = score_pattern()
        .find(section)
        .ok_or(ParseError::MissingScore)?
        .as_str();
    token
        .chars()
        .try_fold(0i32, |acc, c| {
            let digit = i32::try_from(digit_value(c)?).ok()?;
            acc.checked_mul(10)?.checked_add(digit)
        })
        .ok_or_else(|| ParseError::ScoreOutOfRange(token.to_string()))
}

fn parse_artifact(index: usize, chunk: &str) -> Result<CodeArtifact, ParseError> {
    let mut pieces: Vec<&str> = chunk.split(CODE_FENCE).collect();
    // Text after the closing fence is never part of the artifact.
    pieces.pop();
    if pieces.len() < 2 {
        return Err(ParseError::MissingFence { index });
    }

    let file_name = pieces[0].trim().to_string();
    let fenced = pieces[1].trim_start_matches(['\r', '\n']);
    let (language, content) = fenced
        .split_once('\n')
        .ok_or(ParseError::MissingLanguageLine { index })?;

    Ok(CodeArtifact {
        file_name,
        language: language.trim().to_string(),
        content: content.to_string(),
    })
}
