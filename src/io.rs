use crate::codec::Utf8Transcoder;
use crate::stream::AsyncDecoder;
use crate::CsvResult;
use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

/// Boxed byte source handed to the async decoder.
pub type ByteSource = Box<dyn AsyncRead + Unpin + Send>;

#[derive(Debug, Clone)]
pub struct StreamMeta {
    /// e.g. "application/gzip" or "text/csv"
    pub content_type: String,
    /// e.g. "gzip", "zstd", or empty
    pub content_encoding: String,
    /// file name, used for extension fallback
    pub name_hint: String,
    /// character encoding of the rows (UTF-8 by default)
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for StreamMeta {
    fn default() -> Self {
        Self {
            content_type: String::new(),
            content_encoding: String::new(),
            name_hint: String::new(),
            charset: encoding_rs::UTF_8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    Gzip,
    Zstd,
    Plain,
}

impl StreamMeta {
    // encoding -> type -> extension
    fn compression(&self) -> Compression {
        let ce = self.content_encoding.to_ascii_lowercase();
        let ct = self.content_type.to_ascii_lowercase();
        let listed = |name: &str| ce.split(',').any(|s| s.trim() == name);

        if listed("gzip")
            || matches!(ct.as_str(), "application/gzip" | "application/x-gzip")
            || self.name_hint.ends_with(".gz")
        {
            Compression::Gzip
        } else if listed("zstd") || ct == "application/zstd" || self.name_hint.ends_with(".zst") {
            Compression::Zstd
        } else {
            Compression::Plain
        }
    }
}

/// Wraps a raw byte source with optional decompression and UTF-8 transcoding
/// so it can feed an [`AsyncDecoder`].
pub fn build_row_reader<R>(raw: R, meta: &StreamMeta) -> ByteSource
where
    R: AsyncRead + Unpin + Send + 'static,
{
    // Use a larger buffer for fewer syscalls (1 MiB)
    let buf = BufReader::with_capacity(1 << 20, raw);
    let decompressed: ByteSource = match meta.compression() {
        Compression::Gzip => Box::new(GzipDecoder::new(buf)),
        Compression::Zstd => Box::new(ZstdDecoder::new(buf)),
        Compression::Plain => Box::new(buf),
    };

    if meta.charset == encoding_rs::UTF_8 {
        return decompressed;
    }
    let framed = FramedRead::new(decompressed, Utf8Transcoder::new(meta.charset));
    Box::new(StreamReader::new(framed))
}

/// Opens a local file, guessing compression from its extension.
pub async fn reader_from_path(path: &Path) -> CsvResult<(ByteSource, StreamMeta)> {
    let file = File::open(path).await?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let mut meta = StreamMeta {
        name_hint: name,
        ..Default::default()
    };
    match path.extension().and_then(|s| s.to_str()).unwrap_or_default() {
        "gz" => {
            meta.content_type = "application/gzip".into();
            meta.content_encoding = "gzip".into();
        }
        "zst" => {
            meta.content_type = "application/zstd".into();
            meta.content_encoding = "zstd".into();
        }
        _ => {
            meta.content_type = "text/csv".into();
        }
    }

    let reader = build_row_reader(file, &meta);
    Ok((reader, meta))
}

/// Decoder over a local, possibly compressed, CSV file.
pub async fn open_decoder(path: &Path) -> CsvResult<AsyncDecoder<ByteSource>> {
    let (reader, meta) = reader_from_path(path).await?;
    tracing::debug!(path = %path.display(), content_type = %meta.content_type, "opened row source");
    Ok(AsyncDecoder::new(reader))
}
