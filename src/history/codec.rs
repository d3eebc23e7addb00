// Copyright 2025 Fernando Borretti
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

//! The on-disk schema of a review log. Each row has exactly four fields and
//! no header row is written or expected:
//!
//! ```text
//! checksum,timestamp,success,recall
//! ```
//!
//! `timestamp` is in milliseconds since the epoch, `success` is `0` or `1`,
//! and `recall` is the card's interval in days at review time.

use csv::ReaderBuilder;
use csv::StringRecord;
use csv::WriterBuilder;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::checksum::Checksum;
use crate::types::review::LogRow;
use crate::types::review::ReviewRecord;
use crate::types::timestamp::Timestamp;

const FIELD_COUNT: usize = 4;

/// Encode a row as a single newline-terminated line.
pub fn encode_row(row: &LogRow) -> Fallible<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    let timestamp = row.record.timestamp.into_millis().to_string();
    let success = if row.record.success { "1" } else { "0" };
    let recall = row.record.recall.to_string();
    writer.write_record([
        row.checksum.as_str(),
        timestamp.as_str(),
        success,
        recall.as_str(),
    ])?;
    writer
        .into_inner()
        .map_err(|e| ErrorReport::new(format!("CSV error: {e}")))
}

/// Decode a single CSV record into a row. The checksum is taken verbatim;
/// surrounding whitespace is ignored only in the integer fields.
pub fn decode_record(record: &StringRecord) -> Fallible<LogRow> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    if record.len() != FIELD_COUNT {
        return Err(ErrorReport::new(format!(
            "line {line}: expected {FIELD_COUNT} fields, found {}",
            record.len()
        )));
    }
    let checksum = Checksum::new(&record[0]);
    let timestamp: i64 = parse_field(&record[1], "timestamp", line)?;
    let success: i64 = parse_field(&record[2], "success", line)?;
    let recall: u32 = parse_field(&record[3], "recall", line)?;
    Ok(LogRow {
        checksum,
        record: ReviewRecord {
            timestamp: Timestamp::from_millis(timestamp),
            success: success != 0,
            recall,
        },
    })
}

fn parse_field<T: std::str::FromStr<Err = std::num::ParseIntError>>(
    value: &str,
    name: &str,
    line: u64,
) -> Fallible<T> {
    value
        .trim()
        .parse()
        .map_err(|e| ErrorReport::new(format!("line {line}: invalid {name} {value:?}: {e}")))
}

/// Decode the contents of an entire log file. A single bad row fails the
/// whole file.
pub fn decode_rows(content: &[u8]) -> Fallible<Vec<LogRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(decode_record(&record)?);
    }
    Ok(rows)
}
