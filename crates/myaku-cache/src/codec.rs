//! Fixed binary serialization for cache values.
//!
//! Mirrors `myaku.datastore.serialize`'s byte layout (not its code): a
//! one-byte generation marker, then a zlib-compressed payload of
//! length-prefixed fields. Japanese text fields are encoded as UTF-16 (more
//! compact than UTF-8 for a script that's almost entirely outside the Latin
//! range); ASCII-only fields (URLs, query strings used only for lookups) and
//! fields that are themselves structural counts use UTF-8/raw integers.
//! Datetimes are 32-bit Unix timestamps. Compression is zlib at level 1
//! (`flate2::Compression::new(1)`), trading ratio for crawl-time CPU.
//!
//! A reader encountering an unrecognized generation marker treats the entry
//! as a miss ([`myaku_types::Error`]'s `SerializationMismatch` in spirit),
//! rather than erroring the request.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use time::OffsetDateTime;

use myaku_types::{Position, Query, QueryType};

use crate::cached_page::{CachedArticle, CachedSearchResult, CachedSearchResultPage};

/// The only generation this codec writes. Bumped whenever the wire layout
/// changes; a reader seeing any other byte treats the value as absent.
pub const CURRENT_GENERATION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unrecognized cache entry generation {0}, treating as miss")]
    UnknownGeneration(u8),
    #[error("truncated cache entry")]
    Truncated,
    #[error("invalid utf-16 in cache entry")]
    InvalidUtf16,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn write_timestamp(&mut self, value: OffsetDateTime) {
        self.write_u32(value.unix_timestamp().clamp(0, u32::MAX as i64) as u32);
    }

    /// Length-prefixed (u16 char count) UTF-16 field, for Japanese text.
    fn write_utf16(&mut self, value: &str) {
        let units: Vec<u16> = value.encode_utf16().collect();
        self.write_u32(units.len() as u32);
        for unit in units {
            self.buf.extend_from_slice(&unit.to_be_bytes());
        }
    }

    /// Length-prefixed (u32 byte count) UTF-8 field, for ASCII-ish fields.
    fn write_utf8(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    fn into_compressed(self) -> CodecResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(1));
        encoder.write_all(&self.buf)?;
        Ok(encoder.finish()?)
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(CodecError::Truncated);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> CodecResult<u64> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_i64(&mut self) -> CodecResult<i64> {
        Ok(i64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_timestamp(&mut self) -> CodecResult<OffsetDateTime> {
        let unix = self.read_u32()? as i64;
        Ok(OffsetDateTime::from_unix_timestamp(unix).unwrap_or(OffsetDateTime::UNIX_EPOCH))
    }

    fn read_utf16(&mut self) -> CodecResult<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len * 2)?;
        let units: Vec<u16> = bytes.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
        String::from_utf16(&units).map_err(|_| CodecError::InvalidUtf16)
    }

    fn read_utf8(&mut self) -> CodecResult<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf16).map(str::to_string)
    }
}

fn query_type_byte(query_type: QueryType) -> u8 {
    match query_type {
        QueryType::Exact => 0,
        QueryType::DefiniteAltForms => 1,
        QueryType::PossibleAltForms => 2,
    }
}

fn query_type_from_byte(byte: u8) -> CodecResult<QueryType> {
    match byte {
        0 => Ok(QueryType::Exact),
        1 => Ok(QueryType::DefiniteAltForms),
        2 => Ok(QueryType::PossibleAltForms),
        other => Err(CodecError::UnknownGeneration(other)),
    }
}

/// Encodes a page: `[generation: u8][zlib(payload)]`.
pub fn encode(page: &CachedSearchResultPage) -> CodecResult<Vec<u8>> {
    let mut w = Writer::new();
    w.write_utf16(&page.query.query_str);
    w.write_u32(page.query.page_num);
    w.write_u8(query_type_byte(page.query.query_type));
    w.write_utf8(&page.query.user_id);
    w.write_u64(page.total_results);
    w.write_u32(page.results.len() as u32);
    for result in &page.results {
        w.write_u64(result.article.article_id.get());
        w.write_utf16(&result.article.title);
        w.write_utf16(&result.article.source_name);
        w.write_utf8(&result.article.source_url);
        w.write_timestamp(result.article.publication_datetime);
        w.write_timestamp(result.article.last_updated_datetime);
        w.write_u32(result.article.tags.len() as u32);
        for tag in &result.article.tags {
            w.write_utf16(tag);
        }
        w.write_u32(result.matched_base_forms.len() as u32);
        for base_form in &result.matched_base_forms {
            w.write_utf16(base_form);
        }
        w.write_u32(result.found_positions.len() as u32);
        for position in &result.found_positions {
            w.write_u32(position.start as u32);
            w.write_u32(position.len as u32);
        }
        w.write_i64(result.quality_score);
    }

    let compressed = w.into_compressed()?;
    let mut out = Vec::with_capacity(compressed.len() + 1);
    out.push(CURRENT_GENERATION);
    out.extend(compressed);
    Ok(out)
}

/// Decodes a page previously written by [`encode`]. Returns
/// `Ok(None)` (a cache miss, not an error) for an unrecognized generation
/// byte, truncated data, or malformed strings — any of which indicate the
/// entry predates the current wire format or was corrupted in transit.
pub fn decode(bytes: &[u8]) -> CodecResult<Option<CachedSearchResultPage>> {
    let Some((&generation, rest)) = bytes.split_first() else {
        return Ok(None);
    };
    if generation != CURRENT_GENERATION {
        return Ok(None);
    }

    let mut decoder = ZlibDecoder::new(rest);
    let mut payload = Vec::new();
    if decoder.read_to_end(&mut payload).is_err() {
        return Ok(None);
    }

    match decode_payload(&payload) {
        Ok(page) => Ok(Some(page)),
        Err(CodecError::Truncated | CodecError::InvalidUtf16 | CodecError::UnknownGeneration(_)) => Ok(None),
        Err(err @ CodecError::Io(_)) => Err(err),
    }
}

fn decode_payload(payload: &[u8]) -> CodecResult<CachedSearchResultPage> {
    let mut r = Reader::new(payload);
    let query_str = r.read_utf16()?;
    let page_num = r.read_u32()?;
    let query_type = query_type_from_byte(r.read_u8()?)?;
    let user_id = r.read_utf8()?;
    let total_results = r.read_u64()?;
    let result_count = r.read_u32()? as usize;

    let mut results = Vec::with_capacity(result_count);
    for _ in 0..result_count {
        let article_id = myaku_types::ArticleId::new(r.read_u64()?);
        let title = r.read_utf16()?;
        let source_name = r.read_utf16()?;
        let source_url = r.read_utf8()?;
        let publication_datetime = r.read_timestamp()?;
        let last_updated_datetime = r.read_timestamp()?;
        let tag_count = r.read_u32()? as usize;
        let mut tags = Vec::with_capacity(tag_count);
        for _ in 0..tag_count {
            tags.push(r.read_utf16()?);
        }
        let base_form_count = r.read_u32()? as usize;
        let mut matched_base_forms = Vec::with_capacity(base_form_count);
        for _ in 0..base_form_count {
            matched_base_forms.push(r.read_utf16()?);
        }
        let position_count = r.read_u32()? as usize;
        let mut found_positions = Vec::with_capacity(position_count);
        for _ in 0..position_count {
            let start = r.read_u32()? as usize;
            let len = r.read_u32()? as usize;
            found_positions.push(Position::new(start, len));
        }
        let quality_score = r.read_i64()?;

        results.push(CachedSearchResult {
            article: CachedArticle { article_id, title, source_name, source_url, publication_datetime, last_updated_datetime, tags },
            matched_base_forms,
            found_positions,
            quality_score,
        });
    }

    Ok(CachedSearchResultPage {
        query: Query::new(query_str, page_num, query_type, user_id),
        total_results,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use myaku_types::ArticleId;

    fn sample_page() -> CachedSearchResultPage {
        CachedSearchResultPage {
            query: Query::new("走る", 1, QueryType::Exact, "user-1"),
            total_results: 3,
            results: vec![CachedSearchResult {
                article: CachedArticle {
                    article_id: ArticleId::new(7),
                    title: "タイトル".to_string(),
                    source_name: "Kakuyomu".to_string(),
                    source_url: "https://kakuyomu.jp/works/1".to_string(),
                    publication_datetime: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
                    last_updated_datetime: OffsetDateTime::from_unix_timestamp(1_700_001_000).unwrap(),
                    tags: vec!["ファンタジー".to_string()],
                },
                matched_base_forms: vec!["走る".to_string()],
                found_positions: vec![Position::new(0, 2), Position::new(50, 2)],
                quality_score: 4200,
            }],
        }
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let page = sample_page();
        let bytes = encode(&page).unwrap();
        let decoded = decode(&bytes).unwrap().unwrap();
        assert_eq!(decoded, page);
    }

    #[test]
    fn unknown_generation_is_a_miss_not_an_error() {
        let mut bytes = encode(&sample_page()).unwrap();
        bytes[0] = 0xFF;
        assert!(decode(&bytes).unwrap().is_none());
    }

    #[test]
    fn truncated_bytes_are_a_miss_not_an_error() {
        let bytes = encode(&sample_page()).unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(decode(truncated).unwrap().is_none());
    }
}
