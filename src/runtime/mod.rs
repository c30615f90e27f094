//! Process environment and file system access behind a mockable trait.
//!
//! - `env` - Environment variables and the home directory
//! - `fs` - Reads of executables, directory listings and removal

mod env;
mod fs;

use anyhow::Result;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment

    /// Value of `key`, or `None` when unset or empty.
    fn env_value(&self, key: &str) -> Option<String>;
    /// Entries of a path list variable such as `GOPATH`, empty ones skipped.
    fn env_paths(&self, key: &str) -> Vec<PathBuf>;
    fn home_dir(&self) -> Option<PathBuf>;

    // File System
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn is_dir(&self, path: &Path) -> bool;
    /// Entries of `path`, sorted by name.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn remove(&self, path: &Path) -> Result<()>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_value(&self, key: &str) -> Option<String> {
        self.env_value_impl(key)
    }

    fn env_paths(&self, key: &str) -> Vec<PathBuf> {
        self.env_paths_impl(key)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.read_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.remove_impl(path)
    }
}
