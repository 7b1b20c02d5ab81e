//! Decode direction: header binding and field resolution.
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::io;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::coerce::{Cell, Kind};
use crate::header::{HeaderIndex, Row};
use crate::options::DecodeOptions;
use crate::record::Record;
use crate::{CsvRecordError, CsvResult};

/// A value the decoder can populate from one row.
pub trait DecodeTarget {
    fn populate(&mut self, header: &HeaderIndex, row: &Row<'_>) -> CsvResult<()>;
}

/// Populates the fields of `record` whose names appear in `header`.
///
/// Fields without a column keep their current value. On a coercion failure
/// the fields already set stay set.
pub fn decode_record<R: Record>(record: &mut R, header: &HeaderIndex, row: &Row<'_>) -> CsvResult<()> {
    let shape = R::shape();
    let mut cells = record.cells_mut();
    if cells.len() != shape.fields().len() {
        return Err(CsvRecordError::Shape(format!(
            "{} declares {} fields but exposes {}",
            std::any::type_name::<R>(),
            shape.fields().len(),
            cells.len()
        )));
    }

    for (decl, cell) in shape.fields().iter().zip(cells.iter_mut()) {
        if decl.is_excluded() {
            continue;
        }
        let Some(position) = header.position(decl.name()) else {
            // Unmapped field
            continue;
        };
        cell.decode_cell(row.get(position), decl.omit_empty())
            .map_err(|source| CsvRecordError::Coerce {
                field: decl.name().to_string(),
                source,
            })?;
    }
    Ok(())
}

fn check_map_kinds<K, V>() -> CsvResult<()>
where
    K: Cell + Default,
    V: Cell + Default,
{
    let key = K::default().kind();
    if key != Kind::Text {
        return Err(CsvRecordError::KeyType(key));
    }
    let value = V::default().kind();
    if value != Kind::Text {
        return Err(CsvRecordError::ValueType(value));
    }
    Ok(())
}

fn merge_row<K, V>(
    header: &HeaderIndex,
    row: &Row<'_>,
    mut insert: impl FnMut(K, V),
) -> CsvResult<()>
where
    K: Cell,
    V: Cell,
{
    // Cells past the end of a short row have no entry.
    for (name, position) in header.positions().filter(|&(_, p)| p < row.len()) {
        let coerce = |source| CsvRecordError::Coerce {
            field: name.to_string(),
            source,
        };
        let key = K::parse_cell(name).map_err(coerce)?;
        let value = V::parse_cell(row.get(position)).map_err(coerce)?;
        insert(key, value);
    }
    Ok(())
}

impl<K, V, S> DecodeTarget for HashMap<K, V, S>
where
    K: Cell + Default + Eq + Hash,
    V: Cell + Default,
    S: BuildHasher,
{
    fn populate(&mut self, header: &HeaderIndex, row: &Row<'_>) -> CsvResult<()> {
        check_map_kinds::<K, V>()?;
        merge_row(header, row, |k, v| {
            self.insert(k, v);
        })
    }
}

impl<K, V> DecodeTarget for BTreeMap<K, V>
where
    K: Cell + Default + Ord,
    V: Cell + Default,
{
    fn populate(&mut self, header: &HeaderIndex, row: &Row<'_>) -> CsvResult<()> {
        check_map_kinds::<K, V>()?;
        merge_row(header, row, |k, v| {
            self.insert(k, v);
        })
    }
}

pub(crate) enum Step {
    /// Row went to skipping or header binding.
    Consumed,
    Data,
    End,
}

/// Header acquisition state shared by the sync and async decoders.
#[derive(Debug, Default)]
pub(crate) struct HeaderBinding {
    header: Option<HeaderIndex>,
    skipped: usize,
    exhausted: bool,
}

impl HeaderBinding {
    pub(crate) fn header(&self) -> Option<&HeaderIndex> {
        self.header.as_ref()
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Feeds the result of one row-source read.
    ///
    /// Running out of rows before a header is bound is an error, and stays
    /// one on every later call.
    pub(crate) fn feed(&mut self, row: Option<Row<'_>>, options: &DecodeOptions) -> CsvResult<Step> {
        let Some(row) = row else {
            if self.header.is_none() {
                return Err(CsvRecordError::MissingHeader);
            }
            debug!("row source exhausted");
            self.exhausted = true;
            return Ok(Step::End);
        };
        if self.header.is_some() {
            return Ok(Step::Data);
        }
        if self.skipped < options.skip_rows {
            self.skipped += 1;
            debug!(skipped = self.skipped, "skipped leading row");
            return Ok(Step::Consumed);
        }
        let header = HeaderIndex::new(row.iter());
        debug!(columns = header.len(), "header bound");
        self.header = Some(header);
        Ok(Step::Consumed)
    }
}

/// Reads CSV rows from an `io::Read` and decodes them one at a time.
///
/// The first row is the header. It maps column names to positions and is
/// never handed to the caller.
pub struct Decoder<R> {
    pending: Option<R>,
    rows: Option<csv::Reader<R>>,
    options: DecodeOptions,
    binding: HeaderBinding,
    record: csv::StringRecord,
}

impl<R: io::Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            pending: Some(reader),
            rows: None,
            options: DecodeOptions::default(),
            binding: HeaderBinding::default(),
            record: csv::StringRecord::new(),
        }
    }

    /// Replaces the decode options. Chainable; ignored once reading started.
    pub fn opts(mut self, options: DecodeOptions) -> Self {
        if self.rows.is_some() {
            warn!("decode options ignored: rows already read");
            return self;
        }
        self.options = options;
        self
    }

    /// Header bound by the first call, if any.
    pub fn header(&self) -> Option<&HeaderIndex> {
        self.binding.header()
    }

    /// Decodes the next row into `target`.
    ///
    /// Returns `Ok(false)` at end of stream, and again on every later call.
    /// The row is consumed even when coercion fails.
    pub fn decode_next<T>(&mut self, target: &mut T) -> CsvResult<bool>
    where
        T: DecodeTarget + ?Sized,
    {
        if !self.advance()? {
            return Ok(false);
        }
        let Some(header) = self.binding.header() else {
            return Ok(false);
        };
        let row = Row::new(self.record.iter(), self.options.trim_leading_space);
        target.populate(header, &row)?;
        Ok(true)
    }

    /// Consumes the next row without decoding it.
    ///
    /// On the first call the header is still bound, so this doubles as an
    /// end-of-stream probe.
    pub fn skip_next(&mut self) -> CsvResult<bool> {
        self.advance()
    }

    /// Iterates over the remaining rows, decoding each into a fresh `T`.
    /// The iterator ends after the first error.
    pub fn records<T>(&mut self) -> Records<'_, R, T>
    where
        T: DecodeTarget + Default,
    {
        Records {
            decoder: self,
            failed: false,
            _target: PhantomData,
        }
    }

    fn advance(&mut self) -> CsvResult<bool> {
        if self.binding.is_exhausted() {
            return Ok(false);
        }
        loop {
            let found = self.read_row()?;
            let row = found.then(|| Row::new(self.record.iter(), self.options.trim_leading_space));
            match self.binding.feed(row, &self.options)? {
                Step::Consumed => continue,
                Step::Data => return Ok(true),
                Step::End => return Ok(false),
            }
        }
    }

    fn read_row(&mut self) -> CsvResult<bool> {
        if let Some(raw) = self.pending.take() {
            self.rows = Some(self.options.reader_builder().from_reader(raw));
        }
        match self.rows.as_mut() {
            Some(rows) => Ok(rows.read_record(&mut self.record)?),
            None => Ok(false),
        }
    }
}

/// Iterator returned by [`Decoder::records`].
pub struct Records<'d, R, T> {
    decoder: &'d mut Decoder<R>,
    failed: bool,
    _target: PhantomData<fn() -> T>,
}

impl<R, T> Iterator for Records<'_, R, T>
where
    R: io::Read,
    T: DecodeTarget + Default,
{
    type Item = CsvResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut target = T::default();
        match self.decoder.decode_next(&mut target) {
            Ok(true) => Some(Ok(target)),
            Ok(false) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
