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

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::BufWriter;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::Error;
use crate::ErrorKind;
use crate::config::OpenMode;
use crate::config::RotationConfig;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

const LOG_TARGET: &str = "cyclefile";

/// A write-only file that is archived into a ring of backup slots once it reaches its maximum
/// length.
#[derive(Debug)]
pub struct RotatingWriter {
    state: State,
    writer: BufWriter<File>,
}

impl RotatingWriter {
    /// Creates a new [`RotatingWriterBuilder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use cyclefile::RotatingWriter;
    ///
    /// let builder = RotatingWriter::builder("logs/app.log", 1024 * 1024, 10);
    /// ```
    #[must_use]
    pub fn builder(
        path: impl Into<PathBuf>,
        max_file_length: u64,
        max_backup_count: usize,
    ) -> RotatingWriterBuilder {
        RotatingWriterBuilder::new(path, max_file_length, max_backup_count)
    }

    /// Write `count` bytes of `buf` starting at `offset`, rotating as many times as needed.
    ///
    /// A `count` reaching past the end of `buf` is clamped to the bytes available.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::BufferExceedsCapacity`] error if splitting is disabled and the
    /// bytes cannot fit in an empty file; nothing is written in that case. Failures of the
    /// underlying file are returned as [`ErrorKind::Io`].
    pub fn write_slice(&mut self, buf: &[u8], offset: usize, count: usize) -> Result<(), Error> {
        let available = buf.get(offset..).unwrap_or_default();
        let pending = &available[..count.min(available.len())];
        let mut committed = 0;
        self.write_segments(pending, &mut committed)
    }

    /// Write `pending`, counting every byte accepted by the current file into `committed`,
    /// including the ones accepted before an error.
    fn write_segments(&mut self, mut pending: &[u8], committed: &mut usize) -> Result<(), Error> {
        let max_file_length = self.state.config.max_file_length();

        // every pass either finishes or rotates to an empty file, which the remaining bytes
        // then fill by at most `max_file_length`
        loop {
            let position = self.state.position;
            if position.saturating_add(pending.len() as u64) <= max_file_length {
                return self.commit(pending, committed);
            }

            if self.state.config.split_writes() {
                // strictly less than `pending.len()` since the bytes do not fit
                let partial = max_file_length.saturating_sub(position) as usize;
                let (head, tail) = pending.split_at(partial);
                self.commit(head, committed)?;
                pending = tail;
            } else if pending.len() as u64 > max_file_length {
                return Err(Error::new(
                    ErrorKind::BufferExceedsCapacity,
                    "buffer size exceeds maximum file length",
                )
                .with_context("count", pending.len())
                .with_context("max_file_length", max_file_length));
            }

            self.rotate()?;
        }
    }

    /// Always `false`; the stream is write-only.
    pub fn can_read(&self) -> bool {
        false
    }

    /// The number of bytes in the current file, including bytes not yet flushed.
    pub fn position(&self) -> u64 {
        self.state.position
    }

    /// The backup slot the next rotation archives into.
    pub fn next_slot(&self) -> usize {
        self.state.next_slot
    }

    /// The configuration this writer was built with.
    pub fn config(&self) -> &RotationConfig {
        &self.state.config
    }

    /// Flush and close the current file.
    ///
    /// Dropping the writer flushes as well, but reports failures to the trap instead.
    pub fn close(mut self) -> Result<(), Error> {
        self.writer.flush().map_err(|err| {
            Error::new(ErrorKind::Io, "failed to flush current file").with_source(err)
        })
    }

    /// `position` advances by what the buffer accepts on each call, so a failure midway leaves
    /// it equal to the bytes actually handed to the current file.
    fn commit(&mut self, mut bytes: &[u8], committed: &mut usize) -> Result<(), Error> {
        if bytes.is_empty() {
            return Ok(());
        }

        let len = bytes.len();
        while !bytes.is_empty() {
            let err = match self.writer.write(bytes) {
                Ok(0) => io::Error::from(io::ErrorKind::WriteZero),
                Ok(n) => {
                    self.state.position += n as u64;
                    *committed += n;
                    bytes = &bytes[n..];
                    continue;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => err,
            };
            return Err(Error::new(ErrorKind::Io, "failed to write current file")
                .with_context("path", self.state.current_path.display())
                .with_context("position", self.state.position)
                .with_source(err));
        }

        log::trace!(
            target: LOG_TARGET,
            "wrote {len} bytes, current file at {}",
            self.state.position
        );
        Ok(())
    }

    /// Archive the current file into the next slot and start over with an empty file.
    ///
    /// The slot only advances once every step has succeeded; the current file is truncated
    /// only after its content has been copied.
    fn rotate(&mut self) -> Result<(), Error> {
        let current = &self.state.current_path;
        let slot = self.state.next_slot;
        let backup = self.state.config.backup_path(slot);

        self.writer.flush().map_err(|err| {
            Error::new(ErrorKind::Io, "failed to flush current file")
                .with_context("path", current.display())
                .with_source(err)
        })?;

        fs::copy(current, &backup).map_err(|err| {
            Error::new(ErrorKind::Io, "failed to archive current file")
                .with_context("path", current.display())
                .with_context("backup", backup.display())
                .with_source(err)
        })?;

        let file = self.writer.get_mut();
        file.set_len(0)
            .and_then(|()| file.seek(SeekFrom::Start(0)))
            .map_err(|err| {
                Error::new(ErrorKind::Io, "failed to truncate current file")
                    .with_context("path", current.display())
                    .with_source(err)
            })?;

        log::debug!(
            target: LOG_TARGET,
            "archived {} bytes into backup slot {slot}: {}",
            self.state.position,
            backup.display()
        );

        self.state.position = 0;
        self.state.next_slot = (slot + 1) % self.state.config.max_backup_count();
        Ok(())
    }
}

impl Write for RotatingWriter {
    /// Report a short write when some bytes were accepted before an error; the next call
    /// surfaces the error without writing anything.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut committed = 0;
        match self.write_segments(buf, &mut committed) {
            Ok(()) => Ok(buf.len()),
            Err(_) if committed > 0 => Ok(committed),
            Err(err) => Err(err.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Read for RotatingWriter {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        let err = Error::new(
            ErrorKind::UnsupportedOperation,
            "rotating writer is write-only",
        );
        Err(err.into())
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        if let Err(err) = self.writer.flush() {
            let err = Error::new(ErrorKind::Io, "failed to flush current file on dropped")
                .with_source(err);
            self.state.trap.trap(&err);
        }
    }
}

/// A builder for configuring [`RotatingWriter`].
#[derive(Debug)]
pub struct RotatingWriterBuilder {
    // required
    path: PathBuf,
    max_file_length: u64,
    max_backup_count: usize,

    // has default
    mode: OpenMode,
    split_writes: bool,
    buffer_size: usize,
    trap: Box<dyn Trap>,
}

impl RotatingWriterBuilder {
    /// Creates a new [`RotatingWriterBuilder`].
    ///
    /// `path` names the current file; backups live next to it. Limits are validated on
    /// [`build`](RotatingWriterBuilder::build).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_file_length: u64, max_backup_count: usize) -> Self {
        Self {
            path: path.into(),
            max_file_length,
            max_backup_count,
            mode: OpenMode::default(),
            split_writes: true,
            buffer_size: 4096,
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the open mode.
    ///
    /// Default to [`OpenMode::OpenOrAppend`].
    #[must_use]
    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set whether a write may be split across a rotation.
    ///
    /// When disabled, a write that does not fit triggers a rotation first and lands whole in
    /// the fresh file. Default to `true`.
    #[must_use]
    pub fn split_writes(mut self, split: bool) -> Self {
        self.split_writes = split;
        self
    }

    /// Set the capacity of the in-memory write buffer. `0` writes straight through.
    ///
    /// Default to 4 KiB.
    #[must_use]
    pub fn buffer_size(mut self, n: usize) -> Self {
        self.buffer_size = n;
        self
    }

    /// Set the trap for errors raised when the writer is dropped.
    ///
    /// Default to [`DefaultTrap`].
    #[must_use]
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Builds the [`RotatingWriter`].
    ///
    /// # Errors
    ///
    /// Return an error if either:
    ///
    /// * A limit is zero or the path has no file name.
    /// * The current file cannot be opened in the configured mode.
    /// * A backup slot cannot be deleted or checked.
    pub fn build(self) -> Result<RotatingWriter, Error> {
        let Self {
            path,
            max_file_length,
            max_backup_count,
            mode,
            split_writes,
            buffer_size,
            trap,
        } = self;

        let config = RotationConfig::new(&path, max_file_length, max_backup_count, split_writes)?;
        let (state, file) = State::new(config, mode, trap)?;
        let writer = BufWriter::with_capacity(buffer_size, file);
        Ok(RotatingWriter { state, writer })
    }
}

#[derive(Debug)]
struct State {
    config: RotationConfig,
    current_path: PathBuf,
    position: u64,
    next_slot: usize,
    trap: Box<dyn Trap>,
}

impl State {
    fn new(
        config: RotationConfig,
        mode: OpenMode,
        trap: Box<dyn Trap>,
    ) -> Result<(Self, File), Error> {
        let current_path = config.current_path();
        let mut file = open_current(&current_path, mode)?;

        let mut state = State {
            config,
            current_path,
            position: 0,
            next_slot: 0,
            trap,
        };

        if mode.is_fresh() {
            state.clear_backups()?;
        } else {
            state.next_slot = state.resume_slot()?;
            state.position = file.seek(SeekFrom::End(0)).map_err(|err| {
                Error::new(ErrorKind::Io, "failed to seek to the end of current file")
                    .with_context("path", state.current_path.display())
                    .with_source(err)
            })?;
        }

        Ok((state, file))
    }

    fn clear_backups(&self) -> Result<(), Error> {
        for index in 0..self.config.max_backup_count() {
            let backup = self.config.backup_path(index);
            match fs::remove_file(&backup) {
                Ok(()) => {
                    log::debug!(target: LOG_TARGET, "deleted backup: {}", backup.display());
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(Error::new(ErrorKind::Io, "failed to delete backup")
                        .with_context("backup", backup.display())
                        .with_source(err));
                }
            }
        }
        Ok(())
    }

    /// The slot after the highest-numbered backup found on disk, wrapping to 0.
    ///
    /// Recency is not considered: after a wrap the resumed slot may not hold the oldest backup.
    fn resume_slot(&self) -> Result<usize, Error> {
        let count = self.config.max_backup_count();

        let mut next_slot = 0;
        for index in 0..count {
            let backup = self.config.backup_path(index);
            let exists = fs::exists(&backup).map_err(|err| {
                Error::new(ErrorKind::Io, "failed to check backup")
                    .with_context("backup", backup.display())
                    .with_source(err)
            })?;
            if exists {
                next_slot = index + 1;
            }
        }
        if next_slot == count {
            next_slot = 0;
        }

        log::debug!(
            target: LOG_TARGET,
            "resuming {} at backup slot {next_slot}",
            self.current_path.display()
        );
        Ok(next_slot)
    }
}

fn open_current(path: &Path, mode: OpenMode) -> Result<File, Error> {
    let mut options = OpenOptions::new();
    options.write(true);
    match mode {
        OpenMode::CreateOrTruncate => {
            options.create(true).truncate(true);
        }
        OpenMode::CreateNew => {
            options.create_new(true);
        }
        OpenMode::TruncateExisting => {
            options.truncate(true);
        }
        OpenMode::OpenOrAppend => {
            options.create(true);
        }
        OpenMode::OpenExisting => {}
    }

    options.open(path).map_err(|err| {
        Error::new(ErrorKind::Io, "failed to open current file")
            .with_context("path", path.display())
            .with_context("mode", format!("{mode:?}"))
            .with_source(err)
    })
}
