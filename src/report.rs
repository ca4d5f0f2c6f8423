use crate::classifier::RemovedSet;
use crate::error::MergeWarning;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a completed merge.
#[derive(Debug)]
pub struct MergeReport {
    pub output: PathBuf,
    pub files: usize,
    pub lines: usize,
    pub elapsed: Duration,
    pub removed: RemovedSet,
    pub warnings: Vec<MergeWarning>,
    /// First configured import keyword, used to word the removal note.
    pub keyword: Option<String>,
}

impl MergeReport {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Summary printed after a run unless silenced.
    pub fn summary(&self) -> String {
        let mut text = String::new();

        if !self.removed.is_empty() {
            text.push_str("\nRemoved lines:\n");
            for line in self.removed.lines() {
                text.push_str(&format!(" - {line}\n"));
            }
            text.push_str(&format!(
                "\nThey are believed to be local {} statements.\nPlease verify that is the case.\n",
                self.keyword.as_deref().unwrap_or("import")
            ));
        }

        text.push_str(&format!(
            "\nProcess completed ({} files, {} lines) in {:.2}ms - output in {}\n",
            self.files,
            self.lines,
            self.elapsed_ms(),
            self.output.display()
        ));
        text
    }
}
