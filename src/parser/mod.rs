pub mod record;

pub use record::*;

use tracing::trace;

use crate::error::Result;
use crate::source::SourceFile;

/// Decode a source file and keep the rows that describe an `R`.
///
/// Returns the parsed records and the number of rows dropped.
pub fn parse_file<R: LevelRecord>(source: &SourceFile) -> Result<(Vec<R>, u64)> {
    let mut records = Vec::new();
    let mut dropped = 0u64;

    for row in source.rows()? {
        let row = row?;
        match R::parse(&row) {
            Some(record) => records.push(record),
            None => {
                dropped += 1;
                trace!(level = %R::LEVEL, fields = row.len(), "row dropped");
            }
        }
    }

    Ok((records, dropped))
}
