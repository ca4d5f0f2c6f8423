//! Loading and generating `.press.yml` configuration files.
//!
//! The YAML document is deserialized into [`PressFile`], which mirrors the
//! on-disk shape, and then validated once into a [`MergeConfig`] that the
//! merge engine consumes.

use crate::error::{PressError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Conventional config filename looked up when none is given.
pub const DEFAULT_CONFIG_FILE: &str = ".press.yml";

/// Template written by `srcpress gen-config`.
pub const DEFAULT_TEMPLATE: &str = r#"# srcpress configuration file

# Name + extension of compiled file.
# Can be left as null/blank
OutputFile: null

# When set to true, overrides output file if it's
# already in the directory.
OverrideOutput: false

# Language specific file/library import keywords.
# ie:
# Ruby   - 'require', 'require_relative'
# Python - 'import', 'from'
# C/C++  - '#include'
# Can be left as null/blank
ImportKeywords:
  - null

# Relative/full path to files in the order
# in which they should appear in the compiled file.
#
# If the order is unimportant, please include a path
# to the directory/directories containing the files.
FileOrder:
  - null
"#;

/// Raw config document as written by the user.
///
/// Every key is optional and list items may be `null`, which is what the
/// generated template contains.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PressFile {
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub override_output: Option<bool>,
    #[serde(default)]
    pub import_keywords: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub file_order: Option<Vec<Option<String>>>,
}

/// Validated settings for a single merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeConfig {
    /// Explicit output path; `None` means `out` plus the first file's extension.
    pub output_file: Option<PathBuf>,
    /// Replace an existing output file instead of picking a fresh name.
    pub override_output: bool,
    /// Leading tokens that mark a line as an import, in configured order.
    pub import_keywords: Vec<String>,
    /// Raw file or directory entries, in merge order.
    pub file_order: Vec<PathBuf>,
}

impl PressFile {
    /// Checks the document and converts it into a [`MergeConfig`].
    pub fn validate(self) -> Result<MergeConfig> {
        let file_order = self.file_order.ok_or(PressError::NoFileOrder)?;

        let output_file = self
            .output_file
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let mut import_keywords: Vec<String> = Vec::new();
        for keyword in self.import_keywords.unwrap_or_default().into_iter().flatten() {
            let keyword = keyword.trim().to_string();
            if !keyword.is_empty() && !import_keywords.contains(&keyword) {
                import_keywords.push(keyword);
            }
        }

        // A null entry stays in the list so it is reported as unresolved.
        let file_order = file_order
            .into_iter()
            .map(|entry| PathBuf::from(entry.unwrap_or_else(|| "null".to_string())))
            .collect();

        Ok(MergeConfig {
            output_file,
            override_output: self.override_output.unwrap_or(false),
            import_keywords,
            file_order,
        })
    }
}

/// Reads and validates the config file at `path`.
pub fn load_config(path: &Path) -> Result<MergeConfig> {
    if !path.is_file() {
        return Err(PressError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| PressError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&content, path)
}

/// Parses config text; `path` is only used for error messages.
pub fn parse_config_str(content: &str, path: &Path) -> Result<MergeConfig> {
    if content.trim().is_empty() {
        return PressFile::default().validate();
    }

    let document: PressFile =
        serde_yaml::from_str(content).map_err(|source| PressError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

    document.validate()
}

/// Writes [`DEFAULT_TEMPLATE`] to `path`, refusing to overwrite.
pub fn generate_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(PressError::ConfigExists {
            path: path.to_path_buf(),
        });
    }

    std::fs::write(path, DEFAULT_TEMPLATE)
        .map_err(|e| PressError::io(format!("Failed to write {}", path.display()), e))
}
