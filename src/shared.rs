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

use std::io;
use std::io::Write;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::Error;
use crate::ErrorKind;
use crate::RotatingWriter;

/// A [`RotatingWriter`] behind a mutex, for callers that share one writer across threads.
///
/// Every call holds the lock for its whole duration, so a record passed to
/// [`write_line`](SharedWriter::write_line) is never interleaved with another.
///
/// # Examples
///
/// ```
/// use cyclefile::RotatingWriter;
/// use cyclefile::SharedWriter;
///
/// let dir = tempfile::tempdir().unwrap();
/// let writer = RotatingWriter::builder(dir.path().join("app.log"), 4096, 8)
///     .build()
///     .unwrap();
///
/// let shared = SharedWriter::new(writer);
/// std::thread::scope(|s| {
///     s.spawn(|| shared.write_line(b"from a thread").unwrap());
///     s.spawn(|| shared.write_line(b"from another").unwrap());
/// });
/// ```
#[derive(Debug)]
pub struct SharedWriter {
    writer: Mutex<RotatingWriter>,
}

impl SharedWriter {
    /// Wrap a writer.
    pub fn new(writer: RotatingWriter) -> Self {
        let writer = Mutex::new(writer);
        Self { writer }
    }

    /// Write `bytes` followed by a newline as a single write.
    pub fn write_line(&self, bytes: &[u8]) -> Result<(), Error> {
        let mut line = Vec::with_capacity(bytes.len() + 1);
        line.extend_from_slice(bytes);
        line.push(b'\n');

        let mut writer = self.writer();
        writer.write_slice(&line, 0, line.len())
    }

    /// Flush the buffered bytes to the current file.
    pub fn flush(&self) -> Result<(), Error> {
        let mut writer = self.writer();
        writer.flush().map_err(|err| {
            Error::new(ErrorKind::Io, "failed to flush current file").with_source(err)
        })
    }

    /// The backup slot the next rotation archives into.
    pub fn next_slot(&self) -> usize {
        self.writer().next_slot()
    }

    /// The number of bytes in the current file.
    pub fn position(&self) -> u64 {
        self.writer().position()
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> RotatingWriter {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn writer(&self) -> MutexGuard<'_, RotatingWriter> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl From<RotatingWriter> for SharedWriter {
    fn from(writer: RotatingWriter) -> Self {
        SharedWriter::new(writer)
    }
}

impl Write for &SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer().flush()
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer().flush()
    }
}
