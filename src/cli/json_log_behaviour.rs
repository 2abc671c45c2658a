use std::path::PathBuf;

/// Where structured (JSON) log lines go.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum JsonLogBehaviour {
    /// Human-readable logs only.
    #[default]
    None,
    /// JSON lines on stderr instead of the human format.
    Stderr,
    /// Human-readable logs on stderr plus JSON lines appended to a file.
    File(PathBuf),
}
