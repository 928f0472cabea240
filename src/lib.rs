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

//! A size-bounded, write-only file that archives itself into a fixed ring of backup files.
//!
//! # Overview
//!
//! All writes go to a single current file. When a write would push it past the configured
//! maximum length, the current file is copied into the next backup slot, truncated, and
//! writing continues. Backups are named after the current file with a zero-padded slot index,
//! e.g., `app.log` is archived into `app0.log`, `app1.log`, ... and slots are reused round-robin.
//!
//! Reopening with [`OpenMode::OpenOrAppend`] appends to the existing current file and resumes
//! after the highest-numbered backup on disk.
//!
//! # Examples
//!
//! ```
//! use std::io::Write;
//!
//! use cyclefile::OpenMode;
//! use cyclefile::RotatingWriter;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut writer = RotatingWriter::builder(dir.path().join("log.txt"), 10, 2)
//!     .mode(OpenMode::CreateOrTruncate)
//!     .build()
//!     .unwrap();
//!
//! writer.write_all(b"ABCDEFGHIJKL").unwrap();
//! writer.flush().unwrap();
//!
//! assert_eq!(std::fs::read(dir.path().join("log0.txt")).unwrap(), b"ABCDEFGHIJ");
//! assert_eq!(std::fs::read(dir.path().join("log.txt")).unwrap(), b"KL");
//! assert_eq!(writer.next_slot(), 1);
//! ```
//!
//! A writer has a single owner. Wrap it in a [`SharedWriter`] to write from several threads.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use self::config::OpenMode;
pub use self::config::RotationConfig;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::error::Result;
pub use self::shared::SharedWriter;
pub use self::trap::DefaultTrap;
pub use self::trap::Trap;
pub use self::writer::RotatingWriter;
pub use self::writer::RotatingWriterBuilder;

mod config;
mod error;
mod shared;
pub mod trap;
mod writer;
