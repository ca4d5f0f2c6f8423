use std::path::PathBuf;

/// Fatal errors surfaced by the library.
///
/// The binary wraps these with `anyhow` and decides whether to terminate.
/// Recoverable conditions are reported as [`MergeWarning`] instead.
#[derive(Debug, thiserror::Error)]
pub enum PressError {
    #[error("Could not load config file, {path}\n       Use `srcpress gen-config` to generate a template config file")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path} already in directory")]
    ConfigExists { path: PathBuf },

    #[error("No files to load")]
    NoFileOrder,

    #[error("Could not load file(s):{}", list_lines(.0))]
    UnresolvedPaths(Vec<String>),

    #[error("No files resolved from FileOrder")]
    NoFilesResolved,

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PressError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Non-fatal conditions collected during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    /// Files whose extension differs from the first resolved file.
    ExtensionMismatch { expected: String, files: Vec<String> },
    /// A resolved file could not be read; it contributed no lines.
    UnreadableFile { path: PathBuf, reason: String },
    /// A resolved file looked binary and was skipped.
    BinaryFile { path: PathBuf },
    /// No import keywords configured, so nothing is stripped.
    ImportDetectionDisabled,
}

impl std::fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExtensionMismatch { expected, files } => write!(
                f,
                "Trying to compile multiple extensions (expected {expected}), found:{}",
                list_lines(files)
            ),
            Self::UnreadableFile { path, reason } => {
                write!(f, "Could not load {} - {reason}", path.display())
            }
            Self::BinaryFile { path } => {
                write!(f, "Skipping binary file {}", path.display())
            }
            Self::ImportDetectionDisabled => {
                write!(f, "ImportKeywords left empty in config file")
            }
        }
    }
}

fn list_lines(items: &[String]) -> String {
    items.iter().map(|item| format!("\n - {item}")).collect()
}

/// Result type alias using PressError.
pub type Result<T> = std::result::Result<T, PressError>;
