//! Streams each source file into a staging buffer with imports stripped.
//!
//! Files are read one line at a time; nothing here holds a whole file in
//! memory. Staging buffers are temporary files removed when dropped, so an
//! early return anywhere in the run leaves nothing behind.

use crate::classifier::{Classification, HeaderSet, ImportClassifier, RemovedSet};
use crate::error::{MergeWarning, PressError, Result};
use crate::utils::is_blank;
use content_inspector::{ContentType, inspect};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

/// Text of the first blank line seen in the run, e.g. `"\n"` or `"\r\n"`.
///
/// Set once; later blank lines never change it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineEnding {
    text: Option<String>,
}

impl LineEnding {
    pub fn observe(&mut self, line: &[u8]) {
        if self.text.is_none() && !line.is_empty() && is_blank(line) {
            self.text = Some(String::from_utf8_lossy(line).into_owned());
        }
    }

    pub fn get(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Blank separator line; empty when no blank line was ever seen.
    pub fn separator(&self) -> &[u8] {
        self.text.as_deref().unwrap_or("").as_bytes()
    }

    /// Terminator for lines we emit ourselves.
    pub fn terminator(&self) -> &[u8] {
        self.text.as_deref().unwrap_or("\n").as_bytes()
    }
}

/// State accumulated across every file of a run.
#[derive(Debug, Default)]
pub struct MergeContext {
    pub header: HeaderSet,
    pub removed: RemovedSet,
    pub line_ending: LineEnding,
    pub warnings: Vec<MergeWarning>,
}

impl MergeContext {
    /// Logs the warning and keeps it for the report.
    pub fn warn(&mut self, warning: MergeWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    fn absorb(&mut self, scan: FileScan) {
        for line in scan.header.lines() {
            self.header.insert(line);
        }
        for line in scan.removed.lines() {
            self.removed.insert(line);
        }
        self.line_ending = scan.line_ending;
    }
}

/// What one file contributes to the shared context. Only folded into the
/// [`MergeContext`] once the whole file has been read.
struct FileScan {
    header: HeaderSet,
    removed: RemovedSet,
    line_ending: LineEnding,
}

impl FileScan {
    fn new(ctx: &MergeContext) -> Self {
        Self {
            header: HeaderSet::default(),
            removed: RemovedSet::default(),
            line_ending: ctx.line_ending.clone(),
        }
    }
}

/// Import-stripped contents of one source file.
///
/// Only the path is held between staging and assembly; no descriptor stays
/// open, so the number of files in a run is not bounded by the fd limit.
pub struct StagingBuffer {
    path: TempPath,
    source: PathBuf,
    lines: usize,
}

impl StagingBuffer {
    /// Source file this buffer was staged from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Number of lines read from the source, imports included.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Opens a read handle positioned at the start of the buffer.
    pub async fn reader(&self) -> Result<BufReader<File>> {
        let file = File::open(&*self.path)
            .await
            .map_err(|e| PressError::io("Failed to reopen staging buffer", e))?;
        Ok(BufReader::new(file))
    }
}

fn create_staging_file() -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("srcpress-")
        .suffix(".press")
        .tempfile()
        .map_err(|e| PressError::io("Failed to create staging buffer", e))
}

/// Closes the staging file, keeping only its path.
fn seal(file: NamedTempFile, source: &Path, lines: usize) -> StagingBuffer {
    StagingBuffer {
        path: file.into_temp_path(),
        source: source.to_path_buf(),
        lines,
    }
}

pub struct StreamMerger<'a> {
    classifier: &'a ImportClassifier,
}

impl<'a> StreamMerger<'a> {
    pub fn new(classifier: &'a ImportClassifier) -> Self {
        Self { classifier }
    }

    /// Stages one file. An unreadable or binary source yields an empty
    /// buffer and a warning, and leaves `ctx` otherwise untouched; only
    /// staging I/O failures are errors.
    pub async fn stage_file(&self, path: &Path, ctx: &mut MergeContext) -> Result<StagingBuffer> {
        debug!("Staging file: {}", path.display());

        match File::open(path).await {
            Ok(file) => self.stage_from(path, BufReader::new(file), ctx).await,
            Err(e) => skip(path, ctx, unreadable(path, &e)),
        }
    }

    async fn stage_from<R>(
        &self,
        path: &Path,
        mut source: R,
        ctx: &mut MergeContext,
    ) -> Result<StagingBuffer>
    where
        R: AsyncBufRead + Unpin,
    {
        let file = create_staging_file()?;
        let handle = file
            .as_file()
            .try_clone()
            .map_err(|e| PressError::io("Failed to open staging buffer", e))?;
        let mut out = BufWriter::new(File::from_std(handle));
        let mut scan = FileScan::new(ctx);

        match self.copy_lines(&mut source, &mut out, &mut scan).await {
            Ok(lines) => {
                out.flush()
                    .await
                    .map_err(|e| PressError::io("Failed to flush staging buffer", e))?;
                drop(out);
                debug!("Staged {lines} line(s) from {}", path.display());
                ctx.absorb(scan);
                Ok(seal(file, path, lines))
            }
            Err(SourceError::Binary) => skip(
                path,
                ctx,
                MergeWarning::BinaryFile {
                    path: path.to_path_buf(),
                },
            ),
            // Whatever was staged before the failure is dropped with `file`.
            Err(SourceError::Read(e)) => skip(path, ctx, unreadable(path, &e)),
            Err(SourceError::Stage(e)) => Err(e),
        }
    }

    async fn copy_lines<R>(
        &self,
        reader: &mut R,
        out: &mut BufWriter<File>,
        scan: &mut FileScan,
    ) -> std::result::Result<usize, SourceError>
    where
        R: AsyncBufRead + Unpin,
    {
        let head = reader.fill_buf().await.map_err(SourceError::Read)?;
        if !head.is_empty() && inspect(head) == ContentType::BINARY {
            return Err(SourceError::Binary);
        }

        let mut line = Vec::new();
        let mut count = 0;
        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(SourceError::Read)?;
            if read == 0 {
                break;
            }
            count += 1;

            scan.line_ending.observe(&line);

            let text = String::from_utf8_lossy(&line);
            if !self.keep_line(&text, scan) {
                continue;
            }

            write_all(out, &line).await?;
            if !line.ends_with(b"\n") {
                write_all(out, scan.line_ending.terminator()).await?;
            }
        }

        Ok(count)
    }

    fn keep_line(&self, text: &str, scan: &mut FileScan) -> bool {
        match self.classifier.classify(text) {
            Classification::Keep => true,
            Classification::Local(import) => {
                scan.removed.insert(import);
                false
            }
            Classification::External(import) => {
                scan.header.insert(import);
                false
            }
        }
    }
}

fn unreadable(path: &Path, err: &std::io::Error) -> MergeWarning {
    MergeWarning::UnreadableFile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Records the warning and hands back an empty buffer for `path`.
fn skip(path: &Path, ctx: &mut MergeContext, warning: MergeWarning) -> Result<StagingBuffer> {
    ctx.warn(warning);
    Ok(seal(create_staging_file()?, path, 0))
}

enum SourceError {
    Binary,
    Read(std::io::Error),
    Stage(PressError),
}

async fn write_all(
    out: &mut BufWriter<File>,
    bytes: &[u8],
) -> std::result::Result<(), SourceError> {
    out.write_all(bytes)
        .await
        .map_err(|e| SourceError::Stage(PressError::io("Failed to write staging buffer", e)))
}
