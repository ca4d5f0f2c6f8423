use crate::classifier::HeaderSet;
use crate::error::{PressError, Result};
use crate::merger::{LineEnding, StagingBuffer};
use crate::utils::{is_blank, unique_output_path};
use log::debug;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufWriter};

/// Assembles the merged output: header, separator, then each body.
///
/// Output goes to a temporary file next to the destination and is moved
/// into place by [`OutputWriter::finish`], so a failed run never leaves a
/// half-written result under the final name.
pub struct OutputWriter {
    writer: BufWriter<File>,
    pending: NamedTempFile,
    target: PathBuf,
    replace: bool,
}

impl OutputWriter {
    /// Picks the final name for `target` and opens a pending output.
    ///
    /// With `override_output` an existing file is replaced; otherwise a
    /// numbered sibling such as `out1.rb` is chosen.
    pub fn create(target: &Path, override_output: bool) -> Result<Self> {
        let target = if override_output {
            target.to_path_buf()
        } else {
            unique_output_path(target)
        };

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix(".srcpress-");
        // Same mode as any freshly created file once the umask applies.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let pending = builder.tempfile_in(dir).map_err(|e| {
            PressError::io(format!("Failed to create output in {}", dir.display()), e)
        })?;
        let file = pending
            .as_file()
            .try_clone()
            .map_err(|e| PressError::io("Failed to open output file", e))?;

        debug!("Writing output to {}", target.display());
        Ok(Self {
            writer: BufWriter::new(File::from_std(file)),
            pending,
            target,
            replace: override_output,
        })
    }

    /// Final path the output will be moved to.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Writes every hoisted import followed by one separator line.
    pub async fn write_header(&mut self, header: &HeaderSet, ending: &LineEnding) -> Result<()> {
        for line in header.lines() {
            self.write(line.as_bytes()).await?;
            self.write(ending.terminator()).await?;
        }
        self.write(ending.separator()).await
    }

    /// Copies one staged body without its leading blank lines, then a
    /// separator if the body did not already end on a blank line. The
    /// buffer is deleted once copied.
    pub async fn write_body(&mut self, buffer: StagingBuffer, ending: &LineEnding) -> Result<()> {
        debug!("Appending body of {}", buffer.source().display());

        let mut reader = buffer.reader().await?;
        let mut line = Vec::new();
        let mut started = false;
        let mut last_blank = true;
        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line).await.map_err(|e| {
                PressError::io(
                    format!("Failed to read staged {}", buffer.source().display()),
                    e,
                )
            })?;
            if read == 0 {
                break;
            }

            last_blank = is_blank(&line);
            if !started && last_blank {
                continue;
            }
            started = true;
            self.write(&line).await?;
        }

        if !last_blank {
            self.write(ending.separator()).await?;
        }

        drop(reader);
        drop(buffer);
        Ok(())
    }

    /// Flushes and moves the output to its final name.
    pub async fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .await
            .map_err(|e| PressError::io("Failed to flush output", e))?;
        drop(self.writer);

        let persisted = if self.replace {
            self.pending.persist(&self.target)
        } else {
            self.pending.persist_noclobber(&self.target)
        };
        persisted.map_err(|e| {
            PressError::io(format!("Failed to write {}", self.target.display()), e.error)
        })?;

        Ok(self.target)
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.writer
            .write_all(bytes)
            .await
            .map_err(|e| PressError::io("Failed to write output", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ImportClassifier;
    use crate::filewalker::ResolvedFileList;
    use crate::merger::{MergeContext, StreamMerger};
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn header_then_separator_then_trimmed_bodies() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.rb");
        let b = dir.path().join("b.rb");
        fs::write(&a, "require \"json\"\n\n\nclass A\nend\n").unwrap();
        fs::write(&b, "class B\nend\n\n").unwrap();

        let keywords = vec!["require".to_string()];
        let classifier =
            ImportClassifier::new(&keywords, &ResolvedFileList::new(vec![a.clone(), b.clone()]));
        let merger = StreamMerger::new(&classifier);
        let mut ctx = MergeContext::default();
        let first = merger.stage_file(&a, &mut ctx).await.unwrap();
        let second = merger.stage_file(&b, &mut ctx).await.unwrap();

        let out = dir.path().join("out.rb");
        let mut writer = OutputWriter::create(&out, false).unwrap();
        writer.write_header(&ctx.header, &ctx.line_ending).await.unwrap();
        writer.write_body(first, &ctx.line_ending).await.unwrap();
        writer.write_body(second, &ctx.line_ending).await.unwrap();
        let written = writer.finish().await.unwrap();

        assert_eq!(written, out);
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "require \"json\"\n\nclass A\nend\n\nclass B\nend\n\n"
        );
    }

    #[tokio::test]
    async fn existing_output_is_kept_without_override() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.rb");
        fs::write(&out, "original").unwrap();

        let writer = OutputWriter::create(&out, false).unwrap();
        assert_eq!(writer.target(), dir.path().join("out1.rb"));
        let written = writer.finish().await.unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "original");
        assert!(written.exists());
    }

    #[tokio::test]
    async fn existing_output_is_replaced_with_override() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.rb");
        fs::write(&out, "original").unwrap();

        let mut writer = OutputWriter::create(&out, true).unwrap();
        writer.write(b"fresh\n").await.unwrap();
        let written = writer.finish().await.unwrap();

        assert_eq!(written, out);
        assert_eq!(fs::read_to_string(&out).unwrap(), "fresh\n");
        // Only the output remains; no pending files are left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn unset_line_ending_emits_no_separator() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.txt");

        let mut header = HeaderSet::default();
        header.insert("import os");
        let mut writer = OutputWriter::create(&out, false).unwrap();
        writer
            .write_header(&header, &LineEnding::default())
            .await
            .unwrap();
        writer.finish().await.unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "import os\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_gets_regular_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let reference = dir.path().join("reference.txt");
        fs::write(&reference, "").unwrap();
        let out = dir.path().join("out.rb");

        let writer = OutputWriter::create(&out, true).unwrap();
        let written = writer.finish().await.unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&written), mode(&reference));
    }
}
