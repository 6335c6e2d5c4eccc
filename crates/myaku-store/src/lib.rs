//! Persistent store of blogs, articles, and found lexical items.
//!
//! Backed by a single LMDB environment (via `heed`), the way `milli::Index`
//! backs a meilisearch index: one `heed::Env` holding several named typed
//! databases, opened once and cheaply cloned (heed's `Env` is an `Arc`
//! internally). Unlike `milli::Index`, which builds inverted full-text
//! indexes over arbitrary documents, `IndexStore` only ever needs to
//! resolve three kinds of lookups, so it keeps one secondary index per
//! lookup rather than a generic document store.

mod codec;
mod error;
mod schema;
mod store;

pub use codec::{base_form_prefix, OwnedRankIndexKey, RankIndexKey, RankIndexKeyCodec};
pub use error::{StoreError, StoreResult};
pub use store::{IndexStore, StoreSearchPage};
