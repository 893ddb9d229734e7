//! Best-effort discovery of the repository a task was working in

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Only the head of the log is scanned for the marker
const MARKER_SCAN_BYTES: u64 = 10 * 1024;

const WORKING_DIR_MARKER: &str = "# Current Working Directory (";

/// Files whose presence marks a repository root
const REPO_MARKERS: [&str; 4] = [".git", "go.mod", "package.json", ".gitignore"];

/// Working directory recorded in the task log, verbatim.
///
/// `None` when the file cannot be read or the marker is absent.
pub fn resolve_working_directory(log_path: &Path) -> Option<String> {
    let mut head = Vec::new();
    let read = File::open(log_path).and_then(|file| file.take(MARKER_SCAN_BYTES).read_to_end(&mut head));
    if let Err(e) = read {
        tracing::debug!(path = %log_path.display(), error = %e, "cannot read log for working directory");
        return None;
    }

    let content = String::from_utf8_lossy(&head);
    let found = find_working_directory(&content);
    match &found {
        Some(dir) => tracing::debug!(working_dir = %dir, "extracted working directory"),
        None => tracing::debug!(path = %log_path.display(), "working directory marker not found"),
    }
    found
}

fn find_working_directory(content: &str) -> Option<String> {
    let start = content.find(WORKING_DIR_MARKER)? + WORKING_DIR_MARKER.len();
    let rest = &content[start..];
    let end = rest.find(')')?;
    Some(rest[..end].to_string())
}

/// Walk up from `start` to the first directory holding a repository marker.
///
/// Non-authoritative; only used when explicitly requested.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| REPO_MARKERS.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}
