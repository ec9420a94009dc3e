//! Translation orchestration utilities.
//! This module wires line classification, batched service calls and output writing.

use crate::ass::{self, DialogueRecord, Record};
use crate::error::{Error, Result};
use crate::files;
use async_trait::async_trait;
use batch::{Accumulator, BatchLimits};
use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, trace};

pub mod azure;
pub mod batch;

/// Translates an ordered list of texts, returning one translation per text.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `texts` preserving order. An empty slice yields an empty result.
    async fn translate(&self, texts: &[String]) -> Result<Vec<String>>;
}

/// Source and target language codes, written as `source:target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl FromStr for LanguagePair {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (source, target) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidLanguages(s.to_string()))?;
        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() || target.is_empty() || target.contains(':') {
            return Err(Error::InvalidLanguages(s.to_string()));
        }
        Ok(Self {
            source: source.to_string(),
            target: target.to_string(),
        })
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.target)
    }
}

/// How dialogue lines are sent to the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One request per dialogue line, written as soon as it comes back.
    Streaming,
    /// Batched requests, output written once the whole input has been read.
    #[default]
    Buffered,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Streaming => f.write_str("stream"),
            Mode::Buffered => f.write_str("buffer"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub mode: Mode,
    pub limits: BatchLimits,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub lines: usize,
    pub dialogue_lines: usize,
    pub translated: usize,
    pub requests: usize,
}

/// One entry of the buffered output plan.
enum Slot {
    Ready(String),
    Pending { record: DialogueRecord, result: usize },
}

/// State threaded through a single run.
struct Pipeline<'a, W: ?Sized, T: ?Sized> {
    output: &'a mut W,
    translator: &'a T,
    mode: Mode,
    stats: Stats,
    plan: Vec<Slot>,
    batch: Accumulator,
    completed: Vec<String>,
}

impl<'a, W, T> Pipeline<'a, W, T>
where
    W: Write + ?Sized,
    T: Translator + ?Sized,
{
    fn new(output: &'a mut W, translator: &'a T, options: &PipelineOptions) -> Self {
        Self {
            output,
            translator,
            mode: options.mode,
            stats: Stats::default(),
            plan: Vec::new(),
            batch: Accumulator::new(options.limits),
            completed: Vec::new(),
        }
    }

    async fn handle_line(&mut self, line: String) -> Result<()> {
        self.stats.lines += 1;
        let record = match ass::classify(line) {
            Record::PassThrough(line) => return self.emit(line),
            Record::Dialogue(record) => record,
        };
        self.stats.dialogue_lines += 1;
        if !record.needs_translation() {
            return self.emit(record.into_line());
        }
        self.stats.translated += 1;
        match self.mode {
            Mode::Streaming => self.stream_dialogue(record).await,
            Mode::Buffered => self.buffer_dialogue(record).await,
        }
    }

    /// Write a finished line now, or queue it behind pending dialogue.
    fn emit(&mut self, line: String) -> Result<()> {
        match self.mode {
            Mode::Streaming => self.write(&line),
            Mode::Buffered => {
                self.plan.push(Slot::Ready(line));
                Ok(())
            }
        }
    }

    async fn stream_dialogue(&mut self, record: DialogueRecord) -> Result<()> {
        let texts = vec![record.text().to_string()];
        let translated = self.request(&texts).await?;
        let text = translated
            .into_iter()
            .next()
            .ok_or_else(|| Error::Remote("empty translation result".into()))?;
        self.write(&record.reassemble(&text))
    }

    async fn buffer_dialogue(&mut self, record: DialogueRecord) -> Result<()> {
        let text = record.text().to_string();
        // Position of this text in the concatenation of all batch results.
        let result = self.completed.len() + self.batch.len();
        self.plan.push(Slot::Pending { record, result });
        if let Some(full) = self.batch.offer(text) {
            self.flush(full).await?;
        }
        Ok(())
    }

    async fn flush(&mut self, texts: Vec<String>) -> Result<()> {
        info!("Translating batch of {} lines", texts.len());
        let translated = self.request(&texts).await?;
        self.completed.extend(translated);
        Ok(())
    }

    async fn request(&mut self, texts: &[String]) -> Result<Vec<String>> {
        let begin = Instant::now();
        let translated = self.translator.translate(texts).await?;
        self.stats.requests += 1;
        if translated.len() != texts.len() {
            return Err(Error::Remote(format!(
                "expected {} translations, got {}",
                texts.len(),
                translated.len()
            )));
        }
        debug!(
            "translated {} texts in {} ms",
            texts.len(),
            begin.elapsed().as_millis()
        );
        Ok(translated)
    }

    /// Flush the last batch and write the buffered plan in input order.
    async fn finish(mut self) -> Result<Stats> {
        if let Some(rest) = self.batch.finish() {
            self.flush(rest).await?;
        }
        if !self.plan.is_empty() {
            info!("Writing buffered translations to output");
        }
        let plan = std::mem::take(&mut self.plan);
        for slot in plan {
            let line = match slot {
                Slot::Ready(line) => line,
                Slot::Pending { record, result } => {
                    let text = self.completed.get(result).ok_or_else(|| {
                        Error::Remote(format!("no translation for dialogue #{}", result + 1))
                    })?;
                    record.reassemble(text)
                }
            };
            self.write(&line)?;
        }
        Ok(self.stats)
    }

    fn write(&mut self, line: &str) -> Result<()> {
        self.output.write_all(line.as_bytes()).map_err(Error::Write)
    }
}

/// Translate every dialogue line read from `input` and write the result to `output`.
/// Non-dialogue lines are copied byte for byte and line order is preserved.
pub async fn process<R, W, T>(
    mut input: R,
    output: &mut W,
    translator: &T,
    options: &PipelineOptions,
) -> Result<Stats>
where
    R: BufRead,
    W: Write + ?Sized,
    T: Translator + ?Sized,
{
    info!("Starting file parsing in {} mode", options.mode);
    let mut pipeline = Pipeline::new(output, translator, options);
    loop {
        let mut line = String::new();
        if input.read_line(&mut line).map_err(Error::Read)? == 0 {
            break;
        }
        pipeline.handle_line(line).await?;
    }
    let stats = pipeline.finish().await?;
    info!(
        "Finished: {} lines, {} dialogue, {} translated in {} requests",
        stats.lines, stats.dialogue_lines, stats.translated, stats.requests
    );
    Ok(stats)
}

/// Open `input` and `output` (standard output when `None`), then run [`process`].
/// Output is flushed on every path so a failed run leaves what was written so far.
pub async fn process_file<T>(
    input: &Path,
    output: Option<&Path>,
    translator: &T,
    options: &PipelineOptions,
) -> Result<Stats>
where
    T: Translator + ?Sized,
{
    trace!("process_file input={}", input.display());
    let reader = files::open_input(input)?;
    let mut writer = files::open_output(output)?;
    let result = process(reader, &mut writer, translator, options).await;
    let flushed = writer.flush().map_err(Error::Write);
    let stats = result?;
    flushed?;
    Ok(stats)
}
