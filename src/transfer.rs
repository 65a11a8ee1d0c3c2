//! File transfer modes and collision-free target names

use crate::date::{truncate_to_seconds, DateSource};
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::Path;

/// How a file is brought into the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferMode {
    /// Copy, failing when the target exists
    Copy,
    /// Copy, overwriting an existing target
    CopyReplace,
    /// Move, failing when the target exists
    Move,
    /// Move, overwriting an existing target
    MoveReplace,
}

impl TransferMode {
    pub fn new(move_files: bool, replace: bool) -> Self {
        match (move_files, replace) {
            (false, false) => TransferMode::Copy,
            (false, true) => TransferMode::CopyReplace,
            (true, false) => TransferMode::Move,
            (true, true) => TransferMode::MoveReplace,
        }
    }

    pub fn moves(self) -> bool {
        matches!(self, TransferMode::Move | TransferMode::MoveReplace)
    }

    pub fn replaces(self) -> bool {
        matches!(self, TransferMode::CopyReplace | TransferMode::MoveReplace)
    }

    /// Transfer `from` to `to`.
    ///
    /// Equal paths are rejected for every mode. Copies keep the source's
    /// modification time.
    pub fn execute(self, from: &Path, to: &Path) -> io::Result<()> {
        if from == to {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "source and target are the same file",
            ));
        }
        if !self.replaces() && fs::symlink_metadata(to).is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "target file already exists",
            ));
        }
        if self.moves() {
            move_file(from, to)
        } else {
            copy_file(from, to)
        }
    }
}

fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    let modified = fs::metadata(from)?.modified()?;
    fs::copy(from, to)?;
    File::options().write(true).open(to)?.set_modified(modified)
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(e),
        // different filesystems
        Err(_) => {
            copy_file(from, to)?;
            fs::remove_file(from)
        }
    }
}

/// Pick a name for `name` inside `dir` that does not clobber a different file.
///
/// An existing file with the same timestamp (to the second) counts as the same
/// file and keeps its name. Otherwise `stem(1).ext`, `stem(2).ext`, ... are
/// tried in order.
pub fn resolve_file_name(
    dir: &Path,
    name: &str,
    ts: Option<&Timestamp>,
    dates: &dyn DateSource,
) -> String {
    let wanted = ts.map(truncate_to_seconds);
    let is_free = |candidate: &str| {
        let path = dir.join(candidate);
        fs::symlink_metadata(&path).is_err()
            || dates.date_of(&path).map(|t| truncate_to_seconds(&t)) == wanted
    };
    if is_free(name) {
        return name.to_string();
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());
    let mut count = 1u64;
    loop {
        let candidate = match &extension {
            Some(ext) => format!("{}({}).{}", stem, count, ext),
            None => format!("{}({})", stem, count),
        };
        if is_free(&candidate) {
            return candidate;
        }
        count += 1;
    }
}
