//! This module is responsible for reading and rewriting `.ass` event lines.
//! It classifies lines, isolates the spoken text of dialogue events and puts
//! translations back without touching timing or styling fields.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{trace, warn};

/// Prefix identifying a dialogue event line.
pub const DIALOGUE_MARKER: &str = "Dialogue:";

/// Forced line break inside event text.
const BREAK_MARKER: &str = "\\N";

/// Zero-based index of the free text field of a dialogue event.
const TEXT_FIELD: usize = 9;

/// Shortest `{...}` span, the inline override block syntax.
static OVERRIDE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{.*?\}").unwrap());

/// Override blocks placed before any visible text.
static LEADING_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\{[^}]*\})+").unwrap());

/// Override blocks placed after the last visible text.
static TRAILING_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\{[^}]*\})+$").unwrap());

/// Result of classifying one input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A dialogue event with its translatable text located.
    Dialogue(DialogueRecord),
    /// Any other line, kept byte for byte including its terminator.
    PassThrough(String),
}

/// A normalized dialogue line plus the location of its text field.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueRecord {
    line: String,
    /// End of the preserved prefix: fields 0-8 and any leading override blocks.
    keep_end: usize,
    /// Start of the preserved suffix: trailing override blocks and the terminator.
    keep_start: usize,
    text: String,
}

impl DialogueRecord {
    /// Locate the text field of an already normalized dialogue line.
    /// Returns `None` when the line has fewer than ten comma separated fields.
    pub fn parse(line: String) -> Option<Self> {
        let text_start = line
            .match_indices(',')
            .nth(TEXT_FIELD - 1)
            .map(|(i, _)| i + 1)?;
        let text_end = terminator_start(&line);
        let field = &line[text_start..text_end];
        let lead = LEADING_TAGS.find(field).map_or(0, |m| m.end());
        let trail = TRAILING_TAGS
            .find(field)
            .map_or(field.len(), |m| m.start())
            .max(lead);
        let text = strip_override_tags(field);
        Some(Self {
            keep_end: text_start + lead,
            keep_start: text_start + trail,
            text,
            line,
        })
    }

    /// Clean text to send for translation.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether there is anything worth translating in this event.
    pub fn needs_translation(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Build the output line with `translated` in place of the text field.
    /// Fields 0-8, leading and trailing override blocks and the terminator are kept as-is.
    pub fn reassemble(&self, translated: &str) -> String {
        let tail = &self.line[self.keep_start..];
        let mut out = String::with_capacity(self.keep_end + translated.len() + tail.len());
        out.push_str(&self.line[..self.keep_end]);
        out.push_str(translated);
        out.push_str(tail);
        out
    }

    /// Give back the normalized line, used when nothing was translated.
    pub fn into_line(self) -> String {
        self.line
    }
}

/// Decide whether `line` is a dialogue event and, if so, normalize it.
pub fn classify(line: String) -> Record {
    if !line.starts_with(DIALOGUE_MARKER) {
        return Record::PassThrough(line);
    }
    match DialogueRecord::parse(line.replace(BREAK_MARKER, " ")) {
        Some(record) => {
            trace!("classify dialogue text={:?}", record.text);
            Record::Dialogue(record)
        }
        None => {
            warn!(
                "dialogue line has fewer than {} fields, copying it unchanged",
                TEXT_FIELD + 1
            );
            Record::PassThrough(line)
        }
    }
}

/// Remove every `{...}` override block. An unterminated `{` is left alone.
pub fn strip_override_tags(text: &str) -> String {
    OVERRIDE_TAG.replace_all(text, "").into_owned()
}

/// Byte offset where the `\n` or `\r\n` terminator starts.
fn terminator_start(line: &str) -> usize {
    match line.strip_suffix('\n') {
        Some(body) => body.strip_suffix('\r').unwrap_or(body).len(),
        None => line.len(),
    }
}
