//! Encode direction: column layout freezing and row projection.
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::io;

use tracing::{debug, trace, warn};

use crate::coerce::{Cell, Kind, Value};
use crate::header::HeaderIndex;
use crate::options::EncodeOptions;
use crate::record::Record;
use crate::{CsvRecordError, CsvResult};

/// A value the encoder can turn into one row.
pub trait EncodeSource {
    /// `true` for an absent record; encoding it is a no-op.
    fn is_nil(&self) -> bool {
        false
    }

    /// Columns this value defines when it is the first one encoded.
    fn columns(&self) -> CsvResult<Vec<String>>;

    /// Writes the cells of every field whose name is a column of `header`
    /// into `row`. Returns whether any field matched.
    fn project(&self, header: &HeaderIndex, row: &mut [String]) -> CsvResult<bool>;
}

impl<S: EncodeSource + ?Sized> EncodeSource for &S {
    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }

    fn columns(&self) -> CsvResult<Vec<String>> {
        (**self).columns()
    }

    fn project(&self, header: &HeaderIndex, row: &mut [String]) -> CsvResult<bool> {
        (**self).project(header, row)
    }
}

impl<S: EncodeSource> EncodeSource for Option<S> {
    fn is_nil(&self) -> bool {
        self.as_ref().map_or(true, EncodeSource::is_nil)
    }

    fn columns(&self) -> CsvResult<Vec<String>> {
        match self {
            Some(source) => source.columns(),
            None => Ok(Vec::new()),
        }
    }

    fn project(&self, header: &HeaderIndex, row: &mut [String]) -> CsvResult<bool> {
        match self {
            Some(source) => source.project(header, row),
            None => Ok(false),
        }
    }
}

/// Writes the fields of `record` that have a column in `header` into `row`.
pub fn encode_record<R: Record>(record: &R, header: &HeaderIndex, row: &mut [String]) -> CsvResult<bool> {
    let shape = R::shape();
    let cells = record.cells();
    if cells.len() != shape.fields().len() {
        return Err(CsvRecordError::Shape(format!(
            "{} declares {} fields but exposes {}",
            std::any::type_name::<R>(),
            shape.fields().len(),
            cells.len()
        )));
    }

    let mut matched = false;
    for (decl, cell) in shape.fields().iter().zip(cells) {
        if decl.is_excluded() {
            continue;
        }
        let Some(slot) = header.position(decl.name()).and_then(|p| row.get_mut(p)) else {
            continue;
        };
        matched = true;
        *slot = cell
            .encode_cell(decl.omit_empty())
            .map_err(|source| CsvRecordError::Coerce {
                field: decl.name().to_string(),
                source,
            })?;
    }
    Ok(matched)
}

fn check_key_kind<K: Cell + Default>() -> CsvResult<()> {
    match K::default().kind() {
        Kind::Text => Ok(()),
        other => Err(CsvRecordError::KeyType(other)),
    }
}

fn key_text<K: Cell>(key: &K) -> CsvResult<String> {
    key.encode_cell(false)
        .map_err(|source| CsvRecordError::Coerce {
            field: "map key".to_string(),
            source,
        })
}

// Maps have no declaration order, so columns are sorted.
fn map_columns<'a, K>(keys: impl Iterator<Item = &'a K>) -> CsvResult<Vec<String>>
where
    K: Cell + Default + 'a,
{
    check_key_kind::<K>()?;
    let mut names = keys.map(key_text).collect::<CsvResult<Vec<_>>>()?;
    names.sort_unstable();
    Ok(names)
}

fn project_entries<'a, K>(
    entries: impl Iterator<Item = (&'a K, &'a Value)>,
    header: &HeaderIndex,
    row: &mut [String],
) -> CsvResult<bool>
where
    K: Cell + Default + 'a,
{
    check_key_kind::<K>()?;
    let mut matched = false;
    for (key, value) in entries {
        let name = key_text(key)?;
        if let Some(slot) = header.position(&name).and_then(|p| row.get_mut(p)) {
            *slot = value.to_string();
            matched = true;
        }
    }
    Ok(matched)
}

impl<K, S> EncodeSource for HashMap<K, Value, S>
where
    K: Cell + Default + Eq + Hash,
    S: BuildHasher,
{
    fn columns(&self) -> CsvResult<Vec<String>> {
        map_columns(self.keys())
    }

    fn project(&self, header: &HeaderIndex, row: &mut [String]) -> CsvResult<bool> {
        project_entries(self.iter(), header, row)
    }
}

impl<K> EncodeSource for BTreeMap<K, Value>
where
    K: Cell + Default + Ord,
{
    fn columns(&self) -> CsvResult<Vec<String>> {
        map_columns(self.keys())
    }

    fn project(&self, header: &HeaderIndex, row: &mut [String]) -> CsvResult<bool> {
        project_entries(self.iter(), header, row)
    }
}

/// Column layout of an encoder, frozen by the first non-nil record.
#[derive(Debug, Default)]
pub(crate) enum Layout {
    #[default]
    Unbound,
    Bound(HeaderIndex),
    /// First record had no columns; nothing is ever written.
    EmptyLocked,
}

impl Layout {
    pub(crate) fn header(&self) -> Option<&HeaderIndex> {
        match self {
            Layout::Bound(header) => Some(header),
            _ => None,
        }
    }

    /// Freezes the layout on the first call. Returns the header row to write,
    /// if one is due.
    pub(crate) fn bind<S>(&mut self, source: &S, skip_header: bool) -> CsvResult<Option<Vec<String>>>
    where
        S: EncodeSource + ?Sized,
    {
        if !matches!(self, Layout::Unbound) {
            return Ok(None);
        }
        let columns = source.columns()?;
        if columns.is_empty() {
            warn!("first record has no mappable fields; all output suppressed");
            *self = Layout::EmptyLocked;
            return Ok(None);
        }
        debug!(columns = columns.len(), "encoder columns bound");
        let header_row = (!skip_header).then(|| columns.clone());
        *self = Layout::Bound(HeaderIndex::new(columns));
        Ok(header_row)
    }

    /// Builds the row for `source`, or `None` when it shares no column.
    pub(crate) fn project<S>(&self, source: &S) -> CsvResult<Option<Vec<String>>>
    where
        S: EncodeSource + ?Sized,
    {
        let Layout::Bound(header) = self else {
            return Ok(None);
        };
        let mut row = vec![String::new(); header.len()];
        if !source.project(header, &mut row)? {
            trace!("record shares no columns with the header; not written");
            return Ok(None);
        }
        Ok(Some(row))
    }
}

/// Encodes records into CSV rows on an `io::Write`.
///
/// The first record fixes the columns. Later records fill whichever of those
/// columns they share and leave the rest blank; their other fields are
/// dropped. Every written row is flushed before the call returns.
pub struct Encoder<W: io::Write> {
    pending: Option<W>,
    sink: Option<csv::Writer<W>>,
    options: EncodeOptions,
    layout: Layout,
}

impl<W: io::Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            pending: Some(writer),
            sink: None,
            options: EncodeOptions::default(),
            layout: Layout::default(),
        }
    }

    /// Replaces the encode options. Chainable; ignored once the columns are bound.
    pub fn opts(mut self, options: EncodeOptions) -> Self {
        if self.sink.is_some() || !matches!(self.layout, Layout::Unbound) {
            warn!("encode options ignored: columns already bound");
            return self;
        }
        self.options = options;
        self
    }

    /// Columns frozen by the first record, if any.
    pub fn header(&self) -> Option<&HeaderIndex> {
        self.layout.header()
    }

    /// Encodes `source` as the next row.
    pub fn encode_next<S>(&mut self, source: &S) -> CsvResult<()>
    where
        S: EncodeSource + ?Sized,
    {
        if source.is_nil() {
            return Ok(());
        }
        if let Some(header) = self.layout.bind(source, self.options.skip_header)? {
            self.write_row(&header)?;
        }
        if let Some(row) = self.layout.project(source)? {
            self.write_row(&row)?;
            if let Some(sink) = self.sink.as_mut() {
                sink.flush()?;
            }
        }
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> CsvResult<W> {
        if let Some(raw) = self.pending {
            return Ok(raw);
        }
        match self.sink {
            Some(sink) => sink
                .into_inner()
                .map_err(|e| CsvRecordError::Io(e.into_error())),
            None => Err(CsvRecordError::Io(io::Error::other("encoder has no writer"))),
        }
    }

    fn write_row(&mut self, row: &[String]) -> CsvResult<()> {
        if let Some(raw) = self.pending.take() {
            self.sink = Some(self.options.writer_builder().from_writer(raw));
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.write_record(row)?;
        }
        Ok(())
    }
}
