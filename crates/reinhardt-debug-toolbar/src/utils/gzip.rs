//! Gzip helpers for transparent body rewriting

use flate2::Compression;
use flate2::read::{GzDecoder, GzEncoder};
use std::io::{self, Read};

/// Default compression level, matching what most servers emit.
pub const DEFAULT_LEVEL: u32 = 6;

/// Compress `data` into a gzip member.
pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
	compress_with_level(data, DEFAULT_LEVEL)
}

/// Compress `data` with an explicit level (0-9).
pub fn compress_with_level(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
	let mut encoder = GzEncoder::new(data, Compression::new(level.min(9)));
	let mut out = Vec::with_capacity(data.len() / 2 + 32);
	encoder.read_to_end(&mut out)?;
	Ok(out)
}

/// Decompress a gzip stream.
pub fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
	let mut decoder = GzDecoder::new(data);
	let mut out = Vec::with_capacity(data.len() * 2);
	decoder.read_to_end(&mut out)?;
	Ok(out)
}

/// Returns true when a `Content-Encoding` value names gzip.
pub fn is_gzip_encoding(content_encoding: &str) -> bool {
	content_encoding.to_ascii_lowercase().contains("gzip")
}
