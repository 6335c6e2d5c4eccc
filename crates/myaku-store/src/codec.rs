//! Sortable composite-key codecs for the per-query-type rank indexes.
//!
//! Mirrors the shape of milli's `heed_codec` module (see e.g.
//! `BytesRefCodec`): a zero-sized codec type implementing `BytesEncode` /
//! `BytesDecode` so a compound Rust value can be used directly as an LMDB
//! key, sorted the way LMDB sorts keys (lexicographic on the byte string).

use std::borrow::Cow;

use heed::{BoxedError, BytesDecode, BytesEncode};

use myaku_types::ArticleId;

/// `(base_form, composite_score desc, last_updated_unix desc, article_id desc)`
/// encoded so that LMDB's default ascending byte-order iteration visits
/// entries in the order the ranking index needs: best rank key first.
///
/// Descending order for an order-preserving big-endian integer encoding is
/// achieved by encoding `i64::MAX - value` (for scores, which may be
/// negative) and `u64::MAX - value` (for timestamps/ids, which are
/// non-negative), so a larger original value produces *smaller* encoded
/// bytes and therefore sorts first.
pub struct RankIndexKeyCodec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankIndexKey<'a> {
    pub base_form: &'a str,
    pub composite_score: i64,
    pub last_updated_unix: i64,
    pub article_id: ArticleId,
}

fn invert_i64(value: i64) -> u64 {
    (i64::MAX as i128 - value as i128) as u64
}

fn uninvert_i64(encoded: u64) -> i64 {
    (i64::MAX as i128 - encoded as i128) as i64
}

impl<'a> BytesEncode<'a> for RankIndexKeyCodec {
    type EItem = RankIndexKey<'a>;

    fn bytes_encode(item: &'a Self::EItem) -> Result<Cow<'a, [u8]>, BoxedError> {
        let mut bytes = Vec::with_capacity(item.base_form.len() + 1 + 8 + 8 + 8);
        bytes.extend_from_slice(item.base_form.as_bytes());
        // NUL-separate the variable-length prefix from the fixed-width
        // suffix so no base_form is a byte-prefix of another's encoding.
        bytes.push(0);
        bytes.extend_from_slice(&invert_i64(item.composite_score).to_be_bytes());
        bytes.extend_from_slice(&invert_i64(item.last_updated_unix).to_be_bytes());
        bytes.extend_from_slice(&(u64::MAX - item.article_id.get()).to_be_bytes());
        Ok(Cow::Owned(bytes))
    }
}

pub struct OwnedRankIndexKey {
    pub base_form: String,
    pub composite_score: i64,
    pub last_updated_unix: i64,
    pub article_id: ArticleId,
}

impl<'a> BytesDecode<'a> for RankIndexKeyCodec {
    type DItem = OwnedRankIndexKey;

    fn bytes_decode(bytes: &'a [u8]) -> Result<Self::DItem, BoxedError> {
        let sep = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or("malformed rank index key: missing separator")?;
        let base_form = std::str::from_utf8(&bytes[..sep])?.to_string();
        let rest = &bytes[sep + 1..];
        if rest.len() != 24 {
            return Err("malformed rank index key: wrong suffix length".into());
        }
        let composite_score = uninvert_i64(u64::from_be_bytes(rest[0..8].try_into()?));
        let last_updated_unix = uninvert_i64(u64::from_be_bytes(rest[8..16].try_into()?));
        let article_id = ArticleId::new(u64::MAX - u64::from_be_bytes(rest[16..24].try_into()?));
        Ok(OwnedRankIndexKey { base_form, composite_score, last_updated_unix, article_id })
    }
}

/// The byte prefix every `RankIndexKeyCodec` entry for `base_form` starts
/// with: the NUL separator guarantees no other base form's encoding shares
/// this prefix, so a raw-byte `prefix_iter` over this value visits exactly
/// (and only) that base form's rank entries, in best-rank-first order.
pub fn base_form_prefix(base_form: &str) -> Vec<u8> {
    let mut prefix = base_form.as_bytes().to_vec();
    prefix.push(0);
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_score_encodes_to_smaller_bytes() {
        let high = RankIndexKey {
            base_form: "走る",
            composite_score: 9000,
            last_updated_unix: 0,
            article_id: ArticleId::new(1),
        };
        let low = RankIndexKey {
            base_form: "走る",
            composite_score: 10,
            last_updated_unix: 0,
            article_id: ArticleId::new(1),
        };
        let high_bytes = RankIndexKeyCodec::bytes_encode(&high).unwrap();
        let low_bytes = RankIndexKeyCodec::bytes_encode(&low).unwrap();
        assert!(high_bytes < low_bytes);
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let key = RankIndexKey {
            base_form: "食べる",
            composite_score: -500,
            last_updated_unix: 1_700_000_000,
            article_id: ArticleId::new(42),
        };
        let bytes = RankIndexKeyCodec::bytes_encode(&key).unwrap();
        let decoded = RankIndexKeyCodec::bytes_decode(&bytes).unwrap();
        assert_eq!(decoded.base_form, "食べる");
        assert_eq!(decoded.composite_score, -500);
        assert_eq!(decoded.last_updated_unix, 1_700_000_000);
        assert_eq!(decoded.article_id, ArticleId::new(42));
    }
}
