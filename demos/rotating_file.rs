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

use std::io::Write;

use cyclefile::OpenMode;
use cyclefile::RotatingWriter;

fn main() {
    std::fs::create_dir_all("logs").unwrap();

    let mut writer = RotatingWriter::builder("logs/example.log", 1024, 10)
        .mode(OpenMode::OpenOrAppend)
        .split_writes(false)
        .build()
        .unwrap();

    println!(
        "appending to {} at byte {}, next backup slot {}",
        writer.config().current_path().display(),
        writer.position(),
        writer.next_slot()
    );

    let repeat = 100;

    for i in 0..repeat {
        writeln!(writer, "record {i}: {}", "lorem ipsum ".repeat(i % 8)).unwrap();
    }

    println!(
        "wrote {repeat} records, next backup slot {}",
        writer.next_slot()
    );
    writer.close().unwrap();
}
