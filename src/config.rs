// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::ffi::OsStr;
use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

use crate::Error;
use crate::ErrorKind;

/// How the current file and its backup slots are treated when the writer opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Create the current file or truncate it, and delete every backup slot.
    CreateOrTruncate,
    /// Like [`OpenMode::CreateOrTruncate`], but fail if the current file already exists.
    CreateNew,
    /// Like [`OpenMode::CreateOrTruncate`], but fail if the current file does not exist.
    TruncateExisting,
    /// Open or create the current file, append to it, and resume slot numbering from the
    /// backups found on disk.
    #[default]
    OpenOrAppend,
    /// Like [`OpenMode::OpenOrAppend`], but fail if the current file does not exist.
    OpenExisting,
}

impl OpenMode {
    /// Whether this mode discards any previous content and backups.
    pub fn is_fresh(self) -> bool {
        matches!(
            self,
            OpenMode::CreateOrTruncate | OpenMode::CreateNew | OpenMode::TruncateExisting
        )
    }
}

/// The immutable configuration of a [`RotatingWriter`](crate::RotatingWriter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    directory: PathBuf,
    base: OsString,
    extension: OsString,
    max_file_length: u64,
    max_backup_count: usize,
    split_writes: bool,
    decimal_width: usize,
}

impl RotationConfig {
    /// Validate the limits and split `path` into an absolute directory, base name and extension.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::InvalidConfiguration`] error if either:
    ///
    /// * `max_file_length` or `max_backup_count` is zero.
    /// * `path` has no file name.
    ///
    /// Return an [`ErrorKind::Io`] error if the working directory cannot be determined for a
    /// relative `path`.
    pub fn new(
        path: impl AsRef<Path>,
        max_file_length: u64,
        max_backup_count: usize,
        split_writes: bool,
    ) -> Result<Self, Error> {
        let path = path.as_ref();

        if max_file_length == 0 {
            return Err(Error::new(
                ErrorKind::InvalidConfiguration,
                "invalid maximum file length",
            )
            .with_context("max_file_length", max_file_length));
        }
        if max_backup_count == 0 {
            return Err(Error::new(
                ErrorKind::InvalidConfiguration,
                "invalid maximum backup count",
            )
            .with_context("max_backup_count", max_backup_count));
        }

        let (base, extension) = match (path.file_name(), path.file_stem()) {
            (Some(_), Some(stem)) => {
                let extension = match path.extension() {
                    None => OsString::new(),
                    Some(ext) => {
                        let mut dotted = OsString::from(".");
                        dotted.push(ext);
                        dotted
                    }
                };
                (stem.to_os_string(), extension)
            }
            _ => {
                return Err(
                    Error::new(ErrorKind::InvalidConfiguration, "path has no file name")
                        .with_context("path", path.display()),
                );
            }
        };

        // resolved once so a later change of working directory does not move the files
        let full_path = std::path::absolute(path).map_err(|err| {
            Error::new(ErrorKind::Io, "failed to resolve path")
                .with_context("path", path.display())
                .with_source(err)
        })?;
        let directory = full_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            directory,
            base,
            extension,
            max_file_length,
            max_backup_count,
            split_writes,
            decimal_width: decimal_width(max_backup_count),
        })
    }

    /// The directory holding the current file and its backups.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The file name of the current file without its extension.
    pub fn base(&self) -> &OsStr {
        &self.base
    }

    /// The extension of the current file including the leading dot, or empty.
    pub fn extension(&self) -> &OsStr {
        &self.extension
    }

    /// The size in bytes at which the current file is archived.
    pub fn max_file_length(&self) -> u64 {
        self.max_file_length
    }

    /// The number of backup slots.
    pub fn max_backup_count(&self) -> usize {
        self.max_backup_count
    }

    /// Whether a write may straddle a rotation boundary.
    pub fn split_writes(&self) -> bool {
        self.split_writes
    }

    /// The number of digits in a backup slot index.
    pub fn decimal_width(&self) -> usize {
        self.decimal_width
    }

    /// The path of the current file.
    pub fn current_path(&self) -> PathBuf {
        let mut filename = self.base.clone();
        filename.push(&self.extension);
        self.directory.join(filename)
    }

    /// The path of the backup slot `index`, e.g., `logs/app007.log`.
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut filename = self.base.clone();
        filename.push(format!("{index:0width$}", width = self.decimal_width));
        filename.push(&self.extension);
        self.directory.join(filename)
    }
}

/// The number of decimal digits used to name backup slots `0..max_backup_count`.
pub(crate) fn decimal_width(max_backup_count: usize) -> usize {
    let mut width = 1;
    let mut threshold: u128 = 10;
    while threshold < max_backup_count as u128 {
        width += 1;
        threshold *= 10;
    }
    width
}
