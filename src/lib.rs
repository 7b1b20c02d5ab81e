//! Typed records to and from CSV rows, one record per call.
//!
//! - Decode: the first row is the header; each later row fills the fields of
//!   a record (or the entries of a string map) whose names match a column.
//! - Encode: the first record fixes the columns; every later record fills the
//!   columns it shares with it.
//! - Sync path: [`Decoder`] / [`Encoder`] over `std::io`.
//! - Async path: [`AsyncDecoder`] / [`AsyncEncoder`] over tokio, plus
//!   gzip/zstd and charset handling for local files ([`open_decoder`]).
//!
//! ```
//! use csv_records::{impl_record, Decoder};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Row {
//!     foo: String,
//!     bar: String,
//! }
//! impl_record!(Row { foo => "Foo", bar => "Bar" });
//!
//! let mut d = Decoder::new("Foo,Bar\na,\n,b\n".as_bytes());
//! let rows: Vec<Row> = d.records().collect::<Result<_, _>>()?;
//! assert_eq!(rows[1].bar, "b");
//! assert!(!d.skip_next()?);
//! # Ok::<(), csv_records::CsvRecordError>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
//
mod codec;
mod coerce;
mod decode;
mod encode;
mod header;
mod io;
mod options;
mod record;
mod stream;

pub use crate::coerce::{Cell, CoerceError, Kind, Value};
pub use crate::decode::{decode_record, DecodeTarget, Decoder, Records};
pub use crate::encode::{encode_record, EncodeSource, Encoder};
pub use crate::header::{HeaderIndex, Row};
pub use crate::io::{build_row_reader, open_decoder, reader_from_path, ByteSource, StreamMeta};
pub use crate::options::{DecodeOptions, EncodeOptions};
pub use crate::record::{FieldDecl, Record, Shape};
pub use crate::stream::{AsyncDecoder, AsyncEncoder};

#[doc(hidden)]
pub use crate::record::tag_or_empty as __tag_or_empty;

use thiserror::Error;

/// Error type returned by this crate.
///
/// End of stream is not an error: decode calls return `Ok(false)` instead.
#[derive(Debug, Error)]
pub enum CsvRecordError {
    /// A record type's declared fields disagree with the fields it exposes.
    #[error("record shape error: {0}")]
    Shape(String),
    /// The stream ended before a header row was read.
    #[error("error reading headers: no header row")]
    MissingHeader,
    #[error("map key must be text, got {0}")]
    KeyType(Kind),
    #[error("map value must be text, got {0}")]
    ValueType(Kind),
    #[error("field `{field}`: {source}")]
    Coerce {
        field: String,
        #[source]
        source: CoerceError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    CsvAsync(#[from] csv_async::Error),
}

impl CsvRecordError {
    /// Unsupported field kind or failed conversion.
    pub fn is_type_error(&self) -> bool {
        matches!(self, CsvRecordError::Coerce { .. })
    }
}

pub type CsvResult<T> = std::result::Result<T, CsvRecordError>;
