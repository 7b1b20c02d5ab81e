//! Async decoder and encoder over `csv_async`, for tokio readers and writers.
//!
//! Resolution rules are the same as [`Decoder`](crate::Decoder) and
//! [`Encoder`](crate::Encoder); only the row source and sink await.
use csv_async::{AsyncReader, AsyncWriter, StringRecord};
use futures::Stream;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::warn;

use crate::decode::{DecodeTarget, HeaderBinding, Step};
use crate::encode::{EncodeSource, Layout};
use crate::header::{HeaderIndex, Row};
use crate::options::{DecodeOptions, EncodeOptions};
use crate::CsvResult;

pub struct AsyncDecoder<R: AsyncRead + Unpin + Send> {
    pending: Option<R>,
    rows: Option<AsyncReader<R>>,
    options: DecodeOptions,
    binding: HeaderBinding,
    record: StringRecord,
}

impl<R> AsyncDecoder<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            pending: Some(reader),
            rows: None,
            options: DecodeOptions::default(),
            binding: HeaderBinding::default(),
            record: StringRecord::new(),
        }
    }

    pub fn opts(mut self, options: DecodeOptions) -> Self {
        if self.rows.is_some() {
            warn!("decode options ignored: rows already read");
            return self;
        }
        self.options = options;
        self
    }

    pub fn header(&self) -> Option<&HeaderIndex> {
        self.binding.header()
    }

    /// See [`Decoder::decode_next`](crate::Decoder::decode_next).
    pub async fn decode_next<T>(&mut self, target: &mut T) -> CsvResult<bool>
    where
        T: DecodeTarget + ?Sized,
    {
        if !self.advance().await? {
            return Ok(false);
        }
        let Some(header) = self.binding.header() else {
            return Ok(false);
        };
        let row = Row::new(self.record.iter(), self.options.trim_leading_space);
        target.populate(header, &row)?;
        Ok(true)
    }

    pub async fn skip_next(&mut self) -> CsvResult<bool> {
        self.advance().await
    }

    /// Turns the decoder into a stream of records. The stream ends after the
    /// first error.
    pub fn into_stream<T>(self) -> impl Stream<Item = CsvResult<T>>
    where
        T: DecodeTarget + Default,
    {
        futures::stream::try_unfold(self, |mut decoder| async move {
            let mut target = T::default();
            let more = decoder.decode_next(&mut target).await;
            more.map(|more| more.then_some((target, decoder)))
        })
    }

    async fn advance(&mut self) -> CsvResult<bool> {
        if self.binding.is_exhausted() {
            return Ok(false);
        }
        loop {
            let found = self.read_row().await?;
            let row = found.then(|| Row::new(self.record.iter(), self.options.trim_leading_space));
            match self.binding.feed(row, &self.options)? {
                Step::Consumed => continue,
                Step::Data => return Ok(true),
                Step::End => return Ok(false),
            }
        }
    }

    async fn read_row(&mut self) -> CsvResult<bool> {
        if let Some(raw) = self.pending.take() {
            self.rows = Some(self.options.async_reader_builder().create_reader(raw));
        }
        match self.rows.as_mut() {
            Some(rows) => Ok(rows.read_record(&mut self.record).await?),
            None => Ok(false),
        }
    }
}

pub struct AsyncEncoder<W: AsyncWrite + Unpin + Send> {
    pending: Option<W>,
    sink: Option<AsyncWriter<W>>,
    options: EncodeOptions,
    layout: Layout,
}

impl<W> AsyncEncoder<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            pending: Some(writer),
            sink: None,
            options: EncodeOptions::default(),
            layout: Layout::default(),
        }
    }

    pub fn opts(mut self, options: EncodeOptions) -> Self {
        if self.sink.is_some() || !matches!(self.layout, Layout::Unbound) {
            warn!("encode options ignored: columns already bound");
            return self;
        }
        self.options = options;
        self
    }

    pub fn header(&self) -> Option<&HeaderIndex> {
        self.layout.header()
    }

    /// See [`Encoder::encode_next`](crate::Encoder::encode_next).
    pub async fn encode_next<S>(&mut self, source: &S) -> CsvResult<()>
    where
        S: EncodeSource + ?Sized,
    {
        if source.is_nil() {
            return Ok(());
        }
        if let Some(header) = self.layout.bind(source, self.options.skip_header)? {
            self.write_row(&header).await?;
        }
        if let Some(row) = self.layout.project(source)? {
            self.write_row(&row).await?;
            if let Some(sink) = self.sink.as_mut() {
                sink.flush().await?;
            }
        }
        Ok(())
    }

    async fn write_row(&mut self, row: &[String]) -> CsvResult<()> {
        if let Some(raw) = self.pending.take() {
            self.sink = Some(self.options.async_writer_builder().create_writer(raw));
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.write_record(row).await?;
        }
        Ok(())
    }
}
