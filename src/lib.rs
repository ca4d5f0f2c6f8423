//! # srcpress Library
//!
//! Merges an ordered set of source files into a single file. Import
//! statements are pulled out of every file: those referring to another
//! merged file are dropped, the rest are hoisted into a deduplicated header.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use srcpress::{load_config, run_press};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config(Path::new(".press.yml"))?;
//!     let report = run_press(&config).await?;
//!     print!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! Configs can also be built in code:
//!
//! ```rust,no_run
//! use srcpress::{MergeConfig, run_press};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MergeConfig {
//!         output_file: Some(PathBuf::from("bundle.rb")),
//!         override_output: true,
//!         import_keywords: vec!["require".into(), "require_relative".into()],
//!         file_order: vec![PathBuf::from("lib"), PathBuf::from("main.rb")],
//!     };
//!     run_press(&config).await?;
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod filewalker;
pub mod merger;
pub mod report;
pub mod utils;
pub mod writer;

pub use cli::CliArgs;
pub use config::{DEFAULT_CONFIG_FILE, MergeConfig, generate_config, load_config};
pub use error::{MergeWarning, PressError, Result};
pub use filewalker::{ResolvedFileList, resolve_paths};
pub use report::MergeReport;
pub use writer::OutputWriter;

use classifier::ImportClassifier;
use filewalker::check_extensions;
use log::info;
use merger::{MergeContext, StreamMerger};
use std::time::Instant;
use utils::default_output_name;

/// Runs a full merge described by `config`.
///
/// Unresolvable entries and an empty file list are fatal. Everything else
/// that goes wrong with an individual source file is recorded as a warning
/// in the returned report.
pub async fn run_press(config: &MergeConfig) -> Result<MergeReport> {
    let start = Instant::now();

    let resolution = resolve_paths(&config.file_order);
    if !resolution.unresolved.is_empty() {
        return Err(PressError::UnresolvedPaths(resolution.unresolved));
    }
    let files = resolution.files;
    if files.is_empty() {
        return Err(PressError::NoFilesResolved);
    }
    info!("Merging {} file(s)", files.len());

    let mut ctx = MergeContext::default();
    if let Some(warning) = check_extensions(&files) {
        ctx.warn(warning);
    }

    let classifier = ImportClassifier::new(&config.import_keywords, &files);
    if !classifier.is_enabled() {
        ctx.warn(MergeWarning::ImportDetectionDisabled);
    }

    let merger = StreamMerger::new(&classifier);
    let mut buffers = Vec::with_capacity(files.len());
    let mut lines = 0;
    for path in files.files() {
        let buffer = merger.stage_file(path, &mut ctx).await?;
        lines += buffer.lines();
        buffers.push(buffer);
    }

    let target = config
        .output_file
        .clone()
        .unwrap_or_else(|| default_output_name(&files.extension()));
    let mut writer = OutputWriter::create(&target, config.override_output)?;
    writer.write_header(&ctx.header, &ctx.line_ending).await?;
    for buffer in buffers {
        writer.write_body(buffer, &ctx.line_ending).await?;
    }
    let output = writer.finish().await?;
    info!("Wrote {}", output.display());

    Ok(MergeReport {
        output,
        files: files.len(),
        lines,
        elapsed: start.elapsed(),
        removed: ctx.removed,
        warnings: ctx.warnings,
        keyword: config.import_keywords.first().cloned(),
    })
}
