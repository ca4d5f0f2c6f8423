//! Import statement detection.
//!
//! A line is an import when its first whitespace-separated token is one of
//! the configured keywords. Imports whose arguments name a file that is part
//! of the merge are *local* and dropped; everything else is *external* and
//! hoisted into the header.

use crate::filewalker::ResolvedFileList;
use log::debug;
use std::collections::HashSet;

/// What to do with a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Not an import; the line stays in the body.
    Keep,
    /// Import of a file being merged. Carries the trimmed line.
    Local(&'a str),
    /// Import of something outside the merge. Carries the trimmed line.
    External(&'a str),
}

pub struct ImportClassifier {
    keywords: Vec<String>,
    targets: Vec<String>,
}

impl ImportClassifier {
    pub fn new(keywords: &[String], files: &ResolvedFileList) -> Self {
        Self {
            keywords: keywords.to_vec(),
            targets: files
                .files()
                .iter()
                .map(|p| p.to_string_lossy().to_lowercase())
                .collect(),
        }
    }

    /// Import detection is off when no keywords are configured.
    pub fn is_enabled(&self) -> bool {
        !self.keywords.is_empty()
    }

    pub fn classify<'a>(&self, line: &'a str) -> Classification<'a> {
        if !self.is_enabled() {
            return Classification::Keep;
        }

        let trimmed = line.trim();
        let mut tokens = trimmed.split_whitespace();
        let Some(first) = tokens.next() else {
            return Classification::Keep;
        };
        if !self.keywords.iter().any(|k| k == first) {
            return Classification::Keep;
        }

        // A token that cleans down to nothing (e.g. `.`) matches every path.
        let local = tokens
            .map(clean_token)
            .any(|token| self.targets.iter().any(|target| target.contains(&token)));

        if local {
            debug!("local import: {trimmed}");
            Classification::Local(trimmed)
        } else {
            debug!("external import: {trimmed}");
            Classification::External(trimmed)
        }
    }
}

/// Drops quotes and leading relative-path dots, then lower-cases.
fn clean_token(token: &str) -> String {
    token
        .replace(['"', '\''], "")
        .trim_start_matches('.')
        .to_lowercase()
}

/// External import lines in first-seen order, without duplicates.
#[derive(Debug, Default, Clone)]
pub struct HeaderSet {
    lines: Vec<String>,
    seen: HashSet<String>,
}

impl HeaderSet {
    /// Returns `false` when the line was already present.
    pub fn insert(&mut self, line: &str) -> bool {
        if self.seen.contains(line) {
            return false;
        }
        self.seen.insert(line.to_string());
        self.lines.push(line.to_string());
        true
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Local import lines that were dropped, kept for reporting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RemovedSet {
    lines: Vec<String>,
}

impl RemovedSet {
    pub fn insert(&mut self, line: &str) {
        if !self.lines.iter().any(|l| l == line) {
            self.lines.push(line.to_string());
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn classifier(keywords: &[&str], files: &[&str]) -> ImportClassifier {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
        let files = ResolvedFileList::new(files.iter().map(PathBuf::from).collect());
        ImportClassifier::new(&keywords, &files)
    }

    #[test]
    fn non_import_lines_are_kept() {
        let c = classifier(&["require"], &["/src/a.rb"]);
        assert_eq!(c.classify("puts 'hi'\n"), Classification::Keep);
        assert_eq!(c.classify("\n"), Classification::Keep);
        // Keyword must be the whole first token.
        assert_eq!(c.classify("required = true\n"), Classification::Keep);
    }

    #[test]
    fn import_of_merged_file_is_local() {
        let c = classifier(&["require", "require_relative"], &["/src/lib/C1.rb"]);
        assert_eq!(
            c.classify("  require_relative \"C1\"\n"),
            Classification::Local("require_relative \"C1\"")
        );
        assert_eq!(
            c.classify("require '../lib/c1'"),
            Classification::Local("require '../lib/c1'")
        );
    }

    #[test]
    fn import_of_unknown_target_is_external() {
        let c = classifier(&["require"], &["/src/a.rb"]);
        assert_eq!(
            c.classify("require \"yaml\"\r\n"),
            Classification::External("require \"yaml\"")
        );
    }

    #[test]
    fn include_keyword_with_hash() {
        let c = classifier(&["#include"], &["/proj/util.h"]);
        assert_eq!(
            c.classify("#include \"util.h\""),
            Classification::Local("#include \"util.h\"")
        );
        assert_eq!(
            c.classify("#include <stdio.h>"),
            Classification::External("#include <stdio.h>")
        );
    }

    #[test]
    fn bare_dot_argument_counts_as_local() {
        let c = classifier(&["from"], &["/proj/pkg/mod.py"]);
        assert_eq!(
            c.classify("from . import os"),
            Classification::Local("from . import os")
        );
        assert_eq!(
            c.classify("from .. import util"),
            Classification::Local("from .. import util")
        );
    }

    #[test]
    fn no_keywords_disables_detection() {
        let c = classifier(&[], &["/src/a.rb"]);
        assert!(!c.is_enabled());
        assert_eq!(c.classify("require 'a'"), Classification::Keep);
    }

    #[test]
    fn header_set_deduplicates_in_first_seen_order() {
        let mut header = HeaderSet::default();
        assert!(header.insert("require \"yaml\""));
        assert!(header.insert("require \"json\""));
        assert!(!header.insert("require \"yaml\""));
        assert_eq!(header.lines(), &["require \"yaml\"", "require \"json\""]);
    }

    #[test]
    fn removed_set_records_each_line_once() {
        let mut removed = RemovedSet::default();
        removed.insert("require 'b'");
        removed.insert("require 'b'");
        assert_eq!(removed.lines(), &["require 'b'"]);
    }
}
