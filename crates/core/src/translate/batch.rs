//! Size bounded grouping of dialogue text for batched requests.

use tracing::trace;

/// Default maximum number of texts per request.
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Default upper bound (exclusive) on the characters of one request.
pub const DEFAULT_MAX_CHARS: usize = 5000;

/// Limits applied to every batch handed to the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_items: usize,
    pub max_chars: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// Collects texts until the next one would break a limit.
#[derive(Debug)]
pub struct Accumulator {
    limits: BatchLimits,
    pending: Vec<String>,
    chars: usize,
}

impl Accumulator {
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            pending: Vec::new(),
            chars: 0,
        }
    }

    /// Add `text` to the current batch.
    /// When it does not fit, the full batch is returned for translation and
    /// `text` starts the next one, so a single oversized text still gets sent.
    pub fn offer(&mut self, text: String) -> Option<Vec<String>> {
        let len = text.chars().count();
        let fits = self.pending.len() < self.limits.max_items
            && self.chars + len < self.limits.max_chars;
        if fits || self.pending.is_empty() {
            self.chars += len;
            self.pending.push(text);
            return None;
        }
        trace!(
            "offer: flushing {} texts ({} chars)",
            self.pending.len(),
            self.chars
        );
        let full = std::mem::replace(&mut self.pending, vec![text]);
        self.chars = len;
        Some(full)
    }

    /// Hand out whatever is left once input is exhausted.
    pub fn finish(&mut self) -> Option<Vec<String>> {
        if self.pending.is_empty() {
            return None;
        }
        self.chars = 0;
        Some(std::mem::take(&mut self.pending))
    }

    /// Texts waiting in the current batch.
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
