// src/fs/mod.rs

//! Filesystem access used by the shell runner.
//!
//! Kept behind a trait so script creation and output capture can be tested
//! against [`mock::MockFileSystem`] without touching disk.

use std::fmt::Debug;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncWrite;

pub mod mock;

/// Permissions for captured output files: owner read/write only.
pub const OUTPUT_FILE_MODE: u32 = 0o600;

/// Permissions for generated script files: owner read/write/execute only.
pub const SCRIPT_FILE_MODE: u32 = 0o700;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    /// Create or truncate `path` and write `contents`. The parent directory
    /// must already exist.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Open `path` for appending, creating it with owner-only permissions if
    /// it does not exist.
    fn open_append(&self, path: &Path) -> Result<Box<dyn AsyncWrite + Send + Unpin>>;

    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path).with_context(|| format!("opening file {:?}", path))?;
        Ok(Box::new(file))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        restrict_mode(&mut options, SCRIPT_FILE_MODE);

        let mut file = options
            .open(path)
            .with_context(|| format!("creating file {:?}", path))?;
        enforce_mode(&file, SCRIPT_FILE_MODE)
            .with_context(|| format!("setting permissions on {:?}", path))?;
        file.write_all(contents)
            .with_context(|| format!("writing to file {:?}", path))?;
        file.flush()
            .with_context(|| format!("flushing file {:?}", path))?;
        Ok(())
    }

    fn open_append(&self, path: &Path) -> Result<Box<dyn AsyncWrite + Send + Unpin>> {
        let mut options = fs::OpenOptions::new();
        options.append(true).create(true);
        restrict_mode(&mut options, OUTPUT_FILE_MODE);

        let file = options
            .open(path)
            .with_context(|| format!("opening {:?} for append", path))?;
        enforce_mode(&file, OUTPUT_FILE_MODE)
            .with_context(|| format!("setting permissions on {:?}", path))?;
        Ok(Box::new(tokio::fs::File::from_std(file)))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[cfg(unix)]
fn restrict_mode(options: &mut fs::OpenOptions, mode: u32) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(mode);
}

#[cfg(not(unix))]
fn restrict_mode(_options: &mut fs::OpenOptions, _mode: u32) {}

/// `OpenOptions::mode` only applies on creation; a file left behind by an
/// earlier run keeps whatever it had unless reset here.
#[cfg(unix)]
fn enforce_mode(file: &fs::File, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn enforce_mode(_file: &fs::File, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
