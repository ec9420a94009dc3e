//! Opening the input and output handles of a run.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::trace;

/// Output name that selects standard output instead of a file.
pub const STDOUT_NAME: &str = "stdout";

/// Buffered output, either a file or standard output.
pub type Output = BufWriter<Box<dyn Write + Send>>;

/// Whether `output` refers to standard output.
pub fn is_stdout(output: Option<&Path>) -> bool {
    output.map_or(true, |p| p.as_os_str() == STDOUT_NAME)
}

/// Open the subtitle file to translate.
pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    trace!("open_input path={}", path.display());
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Error::InputUnreadable {
            path: path.to_path_buf(),
            source,
        })
}

/// Create or truncate the output file, or use standard output.
pub fn open_output(path: Option<&Path>) -> Result<Output> {
    let sink: Box<dyn Write + Send> = match path {
        Some(path) if !is_stdout(Some(path)) => {
            trace!("open_output path={}", path.display());
            let file = File::create(path).map_err(|source| Error::OutputUnwritable {
                path: path.to_path_buf(),
                source,
            })?;
            Box::new(file)
        }
        _ => Box::new(io::stdout()),
    };
    Ok(BufWriter::new(sink))
}
