//! Staged atomic writes with file locking
//!
//! A write is split in two steps so callers can observe the point between
//! them: [`stage`] puts the complete content into a temporary file next to
//! the destination, [`StagedWrite::commit`] renames it over the destination.
//! Dropping an uncommitted stage removes the temporary file and leaves the
//! destination untouched.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// A fully written temporary file waiting to replace its destination.
#[derive(Debug)]
pub struct StagedWrite {
    temp_path: PathBuf,
    destination: PathBuf,
    committed: bool,
}

impl StagedWrite {
    /// Location of the temporary file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Atomically rename the staged file over the destination.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp_path, &self.destination)
            .map_err(|e| Error::io(&self.destination, e))?;
        self.committed = true;
        tracing::debug!(path = %self.destination.display(), "committed staged write");
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed && fs::remove_file(&self.temp_path).is_ok() {
            tracing::debug!(path = %self.temp_path.display(), "discarded staged write");
        }
    }
}

/// Check that the directory holding `path` exists and is a directory.
///
/// Unlike a plain `create_dir_all`, a missing directory is reported as
/// [`Error::DestinationUnavailable`]: targets live inside directories owned
/// by other programs and must never be conjured into existence.
pub fn ensure_destination_dir(path: &NormalizedPath) -> Result<PathBuf> {
    let native = path.to_native();
    let parent = match native.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.is_dir() {
        return Err(Error::destination_unavailable(
            &native,
            format!("directory {} does not exist", parent.display()),
        ));
    }
    Ok(parent)
}

/// Write `content` into a temporary file beside `path`.
///
/// The temporary file is flushed to disk under an exclusive advisory lock
/// before this returns, so a later [`StagedWrite::commit`] only has to rename.
pub fn stage(path: &NormalizedPath, content: &[u8]) -> Result<StagedWrite> {
    let destination = path.to_native();
    ensure_destination_dir(path)?;

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or("target"),
        std::process::id()
    );
    let temp_path = destination.with_file_name(&temp_name);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| {
            Error::destination_unavailable(&destination, format!("cannot create temporary file: {}", e))
        })?;

    // From here on the Drop impl cleans up the temp file on any error.
    let staged = StagedWrite {
        temp_path,
        destination,
        committed: false,
    };
    write_locked(&file, &staged, content)?;
    Ok(staged)
}

fn write_locked(mut file: &File, staged: &StagedWrite, content: &[u8]) -> Result<()> {
    FileExt::lock_exclusive(file).map_err(|_| Error::LockFailed {
        path: staged.destination.clone(),
    })?;
    file.write_all(content)
        .map_err(|e| Error::io(&staged.temp_path, e))?;
    file.sync_all()
        .map_err(|e| Error::io(&staged.temp_path, e))?;
    FileExt::unlock(file).map_err(|_| Error::LockFailed {
        path: staged.destination.clone(),
    })?;
    Ok(())
}

/// Write content atomically: stage, then commit.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    stage(path, content)?.commit()
}

/// Write text content atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native = path.to_native();
    fs::read_to_string(&native).map_err(|e| Error::io(&native, e))
}

/// Read a file that may legitimately be absent.
pub fn read_optional_text(path: &NormalizedPath) -> Result<Option<String>> {
    let native = path.to_native();
    match fs::read_to_string(&native) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(&native, e)),
    }
}
