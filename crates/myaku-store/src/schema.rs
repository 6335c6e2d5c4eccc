//! Named database handles making up the `IndexStore` schema.
//!
//! Mirrors `milli::Index`'s `db_name` module: a flat list of string
//! constants naming each LMDB sub-database, opened once at `Env` creation.

use heed::types::{SerdeJson, Str};
use heed::Database;

use myaku_types::{Article, Blog, FoundLexicalItem, QueryType};

use crate::codec::RankIndexKeyCodec;

pub mod db_name {
    pub const META: &str = "meta";
    pub const BLOGS_BY_ID: &str = "blogs-by-id";
    pub const BLOGS_BY_URL: &str = "blogs-by-url";
    pub const ARTICLES_BY_ID: &str = "articles-by-id";
    pub const ARTICLES_BY_URL: &str = "articles-by-url";
    pub const ARTICLES_BY_HASH: &str = "articles-by-hash";
    pub const ARTICLES_BY_BLOG: &str = "articles-by-blog";
    pub const FLIS_BY_ID: &str = "flis-by-id";
    pub const FLIS_BY_ARTICLE: &str = "flis-by-article";
    pub const CRAWL_SKIPS_BY_URL: &str = "crawl-skips-by-url";
    pub const RANK_INDEX_EXACT: &str = "rank-index-exact";
    pub const RANK_INDEX_DEFINITE: &str = "rank-index-definite";
    pub const RANK_INDEX_POSSIBLE: &str = "rank-index-possible";
}

pub const NUMBER_OF_DBS: u32 = 13;

pub type BEU64 = heed::types::U64<heed::byteorder::BE>;

#[derive(Clone)]
pub struct Schema {
    pub meta: Database<Str, BEU64>,

    pub blogs_by_id: Database<BEU64, SerdeJson<Blog>>,
    pub blogs_by_url: Database<Str, BEU64>,

    pub articles_by_id: Database<BEU64, SerdeJson<Article>>,
    pub articles_by_url: Database<Str, BEU64>,
    pub articles_by_hash: Database<Str, BEU64>,
    /// `blog_id` keyed list of its articles' ids: a simpler analog of
    /// milli's roaring-bitmap postings-list pattern (`word_docids` et al.),
    /// sized down since a blog's article fan-out is small compared to a
    /// full-text postings list.
    pub articles_by_blog: Database<BEU64, SerdeJson<Vec<u64>>>,

    pub flis_by_id: Database<BEU64, SerdeJson<FoundLexicalItem>>,
    pub flis_by_article: Database<BEU64, SerdeJson<Vec<u64>>>,

    pub crawl_skips_by_url: Database<Str, SerdeJson<myaku_types::CrawlSkip>>,

    pub rank_index_exact: Database<RankIndexKeyCodec, BEU64>,
    pub rank_index_definite: Database<RankIndexKeyCodec, BEU64>,
    pub rank_index_possible: Database<RankIndexKeyCodec, BEU64>,
}

impl Schema {
    pub fn create(env: &heed::Env, wtxn: &mut heed::RwTxn) -> heed::Result<Self> {
        Ok(Schema {
            meta: env.create_database(wtxn, Some(db_name::META))?,
            blogs_by_id: env.create_database(wtxn, Some(db_name::BLOGS_BY_ID))?,
            blogs_by_url: env.create_database(wtxn, Some(db_name::BLOGS_BY_URL))?,
            articles_by_id: env.create_database(wtxn, Some(db_name::ARTICLES_BY_ID))?,
            articles_by_url: env.create_database(wtxn, Some(db_name::ARTICLES_BY_URL))?,
            articles_by_hash: env.create_database(wtxn, Some(db_name::ARTICLES_BY_HASH))?,
            articles_by_blog: env.create_database(wtxn, Some(db_name::ARTICLES_BY_BLOG))?,
            flis_by_id: env.create_database(wtxn, Some(db_name::FLIS_BY_ID))?,
            flis_by_article: env.create_database(wtxn, Some(db_name::FLIS_BY_ARTICLE))?,
            crawl_skips_by_url: env.create_database(wtxn, Some(db_name::CRAWL_SKIPS_BY_URL))?,
            rank_index_exact: env.create_database(wtxn, Some(db_name::RANK_INDEX_EXACT))?,
            rank_index_definite: env.create_database(wtxn, Some(db_name::RANK_INDEX_DEFINITE))?,
            rank_index_possible: env.create_database(wtxn, Some(db_name::RANK_INDEX_POSSIBLE))?,
        })
    }

    pub fn rank_index_for(&self, query_type: QueryType) -> Database<RankIndexKeyCodec, BEU64> {
        match query_type {
            QueryType::Exact => self.rank_index_exact,
            QueryType::DefiniteAltForms => self.rank_index_definite,
            QueryType::PossibleAltForms => self.rank_index_possible,
        }
    }
}
