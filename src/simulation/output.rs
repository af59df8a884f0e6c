//! Line sink for emitted records
//!
//! Every worker writes whole blocks of lines under one lock, so lines from
//! different expressways never interleave.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

pub struct OutputSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

impl OutputSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Buffered sink backed by a newly created file
    pub fn create_file(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }

    pub fn stdout() -> Self {
        Self::new(BufWriter::new(io::stdout()))
    }

    /// A sink that discards everything
    pub fn sink() -> Self {
        Self::new(io::sink())
    }

    /// Write a block of complete lines
    pub fn write_block(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("output sink lock poisoned"))?;
        writer
            .write_all(text.as_bytes())
            .context("Failed to write notifications")
    }

    pub fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("output sink lock poisoned"))?;
        writer.flush().context("Failed to flush notifications")
    }
}
