use csv_async::{AsyncReaderBuilder, AsyncWriterBuilder};

const DEFAULT_DELIMITER: u8 = b',';

/// Options that modify decoding. Every field defaults to "off" / comma.
///
/// Tokenizer settings take effect only if applied before the first row is
/// read; the header is frozen by then.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Field delimiter (`,` when `None`).
    pub delimiter: Option<u8>,
    /// Lines starting with this byte are skipped.
    pub comment: Option<u8>,
    /// Accept stray quotes inside unquoted fields. The tokenizer already
    /// does, so this only records intent.
    pub lazy_quotes: bool,
    /// Trim leading whitespace from every cell, header included.
    pub trim_leading_space: bool,
    /// Rows discarded before the header row. They must still tokenize.
    pub skip_rows: usize,
}

impl DecodeOptions {
    pub(crate) fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut rb = csv::ReaderBuilder::new();
        rb.delimiter(self.delimiter.unwrap_or(DEFAULT_DELIMITER))
            .has_headers(false) // header is bound by the decoder
            .flexible(true) // rows may be shorter or longer than the header
            .comment(self.comment);
        rb
    }

    pub(crate) fn async_reader_builder(&self) -> AsyncReaderBuilder {
        let mut rb = AsyncReaderBuilder::new();
        rb.delimiter(self.delimiter.unwrap_or(DEFAULT_DELIMITER))
            .has_headers(false)
            .flexible(true)
            .comment(self.comment)
            // Larger internal buffer reduces syscalls and allocator churn
            .buffer_capacity(1 << 20);
        rb
    }
}

/// Options that modify encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Field delimiter (`,` when `None`).
    pub delimiter: Option<u8>,
    /// Do not write the header row.
    pub skip_header: bool,
    /// Terminate rows with `\r\n` instead of `\n`.
    pub use_crlf: bool,
}

impl EncodeOptions {
    pub(crate) fn writer_builder(&self) -> csv::WriterBuilder {
        let mut wb = csv::WriterBuilder::new();
        wb.delimiter(self.delimiter.unwrap_or(DEFAULT_DELIMITER))
            .terminator(if self.use_crlf {
                csv::Terminator::CRLF
            } else {
                csv::Terminator::Any(b'\n')
            });
        wb
    }

    pub(crate) fn async_writer_builder(&self) -> AsyncWriterBuilder {
        let mut wb = AsyncWriterBuilder::new();
        wb.delimiter(self.delimiter.unwrap_or(DEFAULT_DELIMITER))
            .terminator(if self.use_crlf {
                csv_async::Terminator::CRLF
            } else {
                csv_async::Terminator::Any(b'\n')
            });
        wb
    }
}
