use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use super::files::{Compression, SourceFile};
use crate::error::{GeoError, Result};

/// One CSV row; fields are decoded to text lazily by the parsers
#[derive(Debug, Clone)]
pub struct Row {
    record: ByteRecord,
}

impl Row {
    pub fn from_fields<T: AsRef<[u8]>>(fields: &[T]) -> Self {
        let mut record = ByteRecord::new();
        for field in fields {
            record.push_field(field.as_ref());
        }
        Self { record }
    }

    /// Field text; missing columns read as empty, invalid UTF-8 is replaced
    pub fn field(&self, idx: usize) -> Cow<'_, str> {
        self.record
            .get(idx)
            .map(String::from_utf8_lossy)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }
}

/// Lazy row iterator over one opened source file
pub struct Rows {
    path: PathBuf,
    inner: ByteRecordsIntoIter<Box<dyn Read>>,
}

impl Iterator for Rows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.inner.next()? {
            Ok(record) => record,
            Err(err) => return Some(Err(classify(&self.path, err))),
        };
        Some(check_boundaries(&self.path, record).map(|record| Row { record }))
    }
}

/// Location rows never span lines, so a line break inside a field means a
/// quote was left open and every following row was swallowed into it.
fn check_boundaries(path: &Path, record: ByteRecord) -> Result<ByteRecord> {
    let broken = record
        .iter()
        .position(|field| field.contains(&b'\n') || field.contains(&b'\r'));
    match broken {
        None => Ok(record),
        Some(idx) => Err(GeoError::Format {
            path: path.to_path_buf(),
            line: record.position().map_or(0, |pos| pos.line()),
            reason: format!("unterminated quote in field {}", idx + 1),
        }),
    }
}

impl SourceFile {
    /// Open the file afresh and stream its rows, header excluded
    pub fn rows(&self) -> Result<Rows> {
        let reader = open_stream(&self.path, self.compression)?;
        let inner = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(b',')
            .quote(b'"')
            .from_reader(reader)
            .into_byte_records();
        Ok(Rows {
            path: self.path.clone(),
            inner,
        })
    }

    /// Read all rows into memory
    pub fn read_all(&self) -> Result<Vec<Row>> {
        self.rows()?.collect()
    }
}

fn open_stream(path: &Path, compression: Compression) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|source| GeoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    match compression {
        Compression::Bzip2 => Ok(Box::new(bzip2::read::MultiBzDecoder::new(reader))),
        Compression::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
        Compression::Zip => {
            let bytes = read_zip_csv(path, reader)?;
            Ok(Box::new(Cursor::new(bytes)))
        }
        Compression::None => Ok(Box::new(reader)),
    }
}

/// Extract the first `.csv` entry of a zip archive
fn read_zip_csv(path: &Path, reader: BufReader<File>) -> Result<Vec<u8>> {
    let decompress_err = |source: io::Error| GeoError::Decompress {
        path: path.to_path_buf(),
        source,
    };
    let invalid = |err: zip::result::ZipError| io::Error::new(io::ErrorKind::InvalidData, err);

    let mut archive = ZipArchive::new(reader).map_err(|e| decompress_err(invalid(e)))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| decompress_err(invalid(e)))?;
        if !entry.name().ends_with(".csv") {
            continue;
        }
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes).map_err(decompress_err)?;
        return Ok(bytes);
    }

    Err(decompress_err(io::Error::new(
        io::ErrorKind::NotFound,
        "archive contains no .csv entry",
    )))
}

fn classify(path: &Path, err: csv::Error) -> GeoError {
    let io_source = match err.kind() {
        csv::ErrorKind::Io(io_err) => Some(io::Error::new(io_err.kind(), io_err.to_string())),
        _ => None,
    };
    match io_source {
        Some(source) => GeoError::Decompress {
            path: path.to_path_buf(),
            source,
        },
        None => GeoError::Format {
            path: path.to_path_buf(),
            line: err.position().map_or(0, |pos| pos.line()),
            reason: err.to_string(),
        },
    }
}
