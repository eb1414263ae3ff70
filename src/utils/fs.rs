//! Filesystem primitives used while preparing the working directory

use std::fs;
use std::io;
use std::path::Path;

/// True when something other than a directory exists at `path`.
/// Symlinks are followed, so a link to a directory counts as a directory.
pub fn file_exists(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => !meta.is_dir(),
        Err(_) => false,
    }
}

pub fn directory_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Remove a file, symlink or directory tree. Missing paths are not an error.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Empty `path` but keep the directory itself; it may be the process cwd.
pub fn remove_dir_contents(path: &Path) -> io::Result<()> {
    for entry in fs::read_dir(path)? {
        remove_path(&entry?.path())?;
    }
    Ok(())
}
