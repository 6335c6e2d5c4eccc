use std::path::Path;

use heed::{BytesDecode, EnvOpenOptions};
use time::OffsetDateTime;

use myaku_types::{
    Article, ArticleId, Blog, BlogId, CrawlSkip, FliId, FoundLexicalItem, Query, QueryType,
    RankKey, SearchResult, SearchResultPage, MAX_ARTICLE_TEXT_LEN, SEARCH_RESULTS_PAGE_SIZE,
};

use crate::codec::{base_form_prefix, RankIndexKey, RankIndexKeyCodec};
use crate::error::{StoreError, StoreResult};
use crate::schema::{Schema, NUMBER_OF_DBS};

const NEXT_BLOG_ID_KEY: &str = "next-blog-id";
const NEXT_ARTICLE_ID_KEY: &str = "next-article-id";
const NEXT_FLI_ID_KEY: &str = "next-fli-id";

/// The persistent store of blogs, articles, and found lexical items.
///
/// A thin, cheaply-`Clone`-able handle around a `heed::Env`, the way
/// `milli::Index` is — opening it once per process and sharing the handle
/// across crawl workers and search requests is the intended usage.
#[derive(Clone)]
pub struct IndexStore {
    env: heed::Env,
    schema: Schema,
}

/// The result of [`IndexStore::search`]: a windowed, merged set of results
/// plus the total distinct-article count for the query, exactly the shape
/// [`SearchResultPage`] needs.
pub struct StoreSearchPage {
    pub search_results: Vec<SearchResult>,
    pub total_results: u64,
}

impl IndexStore {
    /// Opens (creating if absent) the LMDB environment at `path`.
    pub fn open(path: impl AsRef<Path>, map_size: usize) -> StoreResult<Self> {
        std::fs::create_dir_all(path.as_ref())?;
        let env = unsafe {
            EnvOpenOptions::new().max_dbs(NUMBER_OF_DBS).map_size(map_size).open(path.as_ref())?
        };
        let mut wtxn = env.write_txn()?;
        let schema = Schema::create(&env, &mut wtxn)?;
        wtxn.commit()?;
        Ok(IndexStore { env, schema })
    }

    fn next_id(&self, wtxn: &mut heed::RwTxn, key: &str) -> StoreResult<u64> {
        let next = self.schema.meta.get(wtxn, key)?.unwrap_or(0) + 1;
        self.schema.meta.put(wtxn, key, &next)?;
        Ok(next)
    }

    /// Upserts a blog by `source_url`, returning its stored ID. If a blog
    /// with this `source_url` already exists, it's replaced wholesale and
    /// keeps its existing ID.
    pub fn upsert_blog(&self, blog: &mut Blog) -> StoreResult<BlogId> {
        let mut wtxn = self.env.write_txn()?;
        let id = match self.schema.blogs_by_url.get(&wtxn, &blog.source_url)? {
            Some(existing) => BlogId::new(existing),
            None => BlogId::new(self.next_id(&mut wtxn, NEXT_BLOG_ID_KEY)?),
        };
        blog.id = Some(id);
        self.schema.blogs_by_id.put(&mut wtxn, &id.get(), blog)?;
        self.schema.blogs_by_url.put(&mut wtxn, &blog.source_url, &id.get())?;
        wtxn.commit()?;
        Ok(id)
    }

    /// Inserts or upserts articles by `source_url`, enforcing the write gate
    /// from `spec.md` §4.5: an article whose `text_hash` already belongs to
    /// a *different* `source_url`, or whose Blog (if any) was not upserted
    /// first, is rejected without writing any other article in the batch.
    ///
    /// An article whose `source_url` already exists is replaced in place
    /// (same ID, per `spec.md` §3's "Blogs and Articles ... may be replaced
    /// by upsert"); its FLIs are left for the caller to replace via
    /// [`Self::replace_article_flis`], since an article write and its
    /// analysis are separate pipeline steps.
    pub fn write_articles(&self, mut articles: Vec<Article>) -> StoreResult<Vec<StoreResult<ArticleId>>> {
        let mut wtxn = self.env.write_txn()?;
        let mut results = Vec::with_capacity(articles.len());
        for article in articles.iter_mut() {
            results.push(Self::write_one_article(&self.schema, &mut wtxn, self, article));
        }
        wtxn.commit()?;
        Ok(results)
    }

    fn write_one_article(
        schema: &Schema,
        wtxn: &mut heed::RwTxn,
        store: &IndexStore,
        article: &mut Article,
    ) -> StoreResult<ArticleId> {
        if article.full_text.chars().count() > MAX_ARTICLE_TEXT_LEN {
            return Err(StoreError::ArticleTooLong {
                actual: article.full_text.chars().count(),
                cap: MAX_ARTICLE_TEXT_LEN,
            });
        }
        let existing_id = schema.articles_by_url.get(wtxn, &article.source_url)?;
        if let Some(hash_owner) = schema.articles_by_hash.get(wtxn, &article.text_hash)? {
            if Some(hash_owner) != existing_id {
                return Err(StoreError::DuplicateArticleText(article.text_hash.clone()));
            }
        }
        if let Some(blog_id) = article.blog_id {
            if schema.blogs_by_id.get(wtxn, &blog_id.get())?.is_none() {
                return Err(StoreError::BlogNotUpserted);
            }
        }

        let id = match existing_id {
            Some(existing) => ArticleId::new(existing),
            None => ArticleId::new(store.next_id(wtxn, NEXT_ARTICLE_ID_KEY)?),
        };
        article.id = Some(id);

        if let Some(existing) = existing_id {
            if let Some(old) = schema.articles_by_id.get(wtxn, &existing)? {
                if old.text_hash != article.text_hash {
                    schema.articles_by_hash.delete(wtxn, &old.text_hash)?;
                }
            }
        }

        schema.articles_by_id.put(wtxn, &id.get(), article)?;
        schema.articles_by_url.put(wtxn, &article.source_url, &id.get())?;
        schema.articles_by_hash.put(wtxn, &article.text_hash, &id.get())?;

        if existing_id.is_none() {
            if let Some(blog_id) = article.blog_id {
                let key = blog_id.get();
                let mut ids = schema.articles_by_blog.get(wtxn, &key)?.unwrap_or_default();
                ids.push(id.get());
                schema.articles_by_blog.put(wtxn, &key, &ids)?;
            }
        }
        Ok(id)
    }

    /// Inserts found lexical items, denormalizing each against its already
    /// stored article and inserting it into all three rank indexes.
    pub fn write_flis(&self, flis: Vec<FoundLexicalItem>) -> StoreResult<()> {
        let mut wtxn = self.env.write_txn()?;
        for mut fli in flis {
            self.write_one_fli(&mut wtxn, &mut fli)?;
        }
        wtxn.commit()?;
        Ok(())
    }

    fn write_one_fli(&self, wtxn: &mut heed::RwTxn, fli: &mut FoundLexicalItem) -> StoreResult<FliId> {
        let article = self
            .schema
            .articles_by_id
            .get(wtxn, &fli.article_id.get())?
            .ok_or(StoreError::ArticleNotWritten)?;
        fli.denormalize_scores(article.quality_score, article.last_updated_datetime);

        let id = FliId::new(self.next_id(wtxn, NEXT_FLI_ID_KEY)?);
        fli.id = Some(id);
        self.schema.flis_by_id.put(wtxn, &id.get(), fli)?;

        let key = fli.article_id.get();
        let mut ids = self.schema.flis_by_article.get(wtxn, &key)?.unwrap_or_default();
        ids.push(id.get());
        self.schema.flis_by_article.put(wtxn, &key, &ids)?;

        self.insert_rank_entries(wtxn, fli, id)?;
        Ok(id)
    }

    fn insert_rank_entries(&self, wtxn: &mut heed::RwTxn, fli: &FoundLexicalItem, id: FliId) -> StoreResult<()> {
        let last_updated_unix = fli.article_last_updated_datetime.unix_timestamp();
        for (query_type, score) in [
            (QueryType::Exact, fli.quality_score_exact),
            (QueryType::DefiniteAltForms, fli.quality_score_definite),
            (QueryType::PossibleAltForms, fli.quality_score_possible),
        ] {
            let db = self.schema.rank_index_for(query_type);
            let key = RankIndexKey {
                base_form: &fli.base_form,
                composite_score: score,
                last_updated_unix,
                article_id: fli.article_id,
            };
            db.put(wtxn, &key, &id.get())?;
        }
        Ok(())
    }

    fn remove_rank_entries(&self, wtxn: &mut heed::RwTxn, fli: &FoundLexicalItem) -> StoreResult<()> {
        let last_updated_unix = fli.article_last_updated_datetime.unix_timestamp();
        for (query_type, score) in [
            (QueryType::Exact, fli.quality_score_exact),
            (QueryType::DefiniteAltForms, fli.quality_score_definite),
            (QueryType::PossibleAltForms, fli.quality_score_possible),
        ] {
            let db = self.schema.rank_index_for(query_type);
            let key = RankIndexKey {
                base_form: &fli.base_form,
                composite_score: score,
                last_updated_unix,
                article_id: fli.article_id,
            };
            db.delete(wtxn, &key)?;
        }
        Ok(())
    }

    /// Deletes all FLIs for `article_id` and writes `new_flis` in their
    /// place, in one logical operation. The article's own row is untouched.
    pub fn replace_article_flis(&self, article_id: ArticleId, new_flis: Vec<FoundLexicalItem>) -> StoreResult<()> {
        let mut wtxn = self.env.write_txn()?;
        let key = article_id.get();
        if let Some(existing_ids) = self.schema.flis_by_article.get(&wtxn, &key)? {
            for fli_id in existing_ids {
                if let Some(old_fli) = self.schema.flis_by_id.get(&wtxn, &fli_id)? {
                    self.remove_rank_entries(&mut wtxn, &old_fli)?;
                    self.schema.flis_by_id.delete(&mut wtxn, &fli_id)?;
                }
            }
        }
        self.schema.flis_by_article.delete(&mut wtxn, &key)?;

        let mut new_ids = Vec::with_capacity(new_flis.len());
        for mut fli in new_flis {
            fli.article_id = article_id;
            let id = self.write_one_fli(&mut wtxn, &mut fli)?;
            new_ids.push(id.get());
        }
        wtxn.commit()?;
        Ok(())
    }

    /// Looks up the stored `last_crawled_datetime` for a URL that might be
    /// an article, a blog, or neither, for `CrawlTracker::filter_to_updated`.
    pub fn lookup_crawl_state(&self, source_url: &str) -> StoreResult<Option<(Option<OffsetDateTime>, Option<OffsetDateTime>)>> {
        let rtxn = self.env.read_txn()?;
        if let Some(article_id) = self.schema.articles_by_url.get(&rtxn, source_url)? {
            let article = self.schema.articles_by_id.get(&rtxn, &article_id)?;
            return Ok(article.map(|a| (Some(a.last_updated_datetime), a.last_crawled_datetime)));
        }
        if let Some(blog_id) = self.schema.blogs_by_url.get(&rtxn, source_url)? {
            let blog = self.schema.blogs_by_id.get(&rtxn, &blog_id)?;
            return Ok(blog.map(|b| (b.last_updated_datetime, b.last_crawled_datetime)));
        }
        Ok(None)
    }

    pub fn is_crawl_skip(&self, source_url: &str) -> StoreResult<bool> {
        let rtxn = self.env.read_txn()?;
        Ok(self.schema.crawl_skips_by_url.get(&rtxn, source_url)?.is_some())
    }

    /// Updates `last_crawled_datetime` on the stored article or blog
    /// identified by `source_url`. No-op if neither exists.
    pub fn update_last_crawled(&self, source_url: &str, when: OffsetDateTime) -> StoreResult<()> {
        let mut wtxn = self.env.write_txn()?;
        if let Some(article_id) = self.schema.articles_by_url.get(&wtxn, source_url)? {
            if let Some(mut article) = self.schema.articles_by_id.get(&wtxn, &article_id)? {
                article.last_crawled_datetime = Some(when);
                self.schema.articles_by_id.put(&mut wtxn, &article_id, &article)?;
            }
        } else if let Some(blog_id) = self.schema.blogs_by_url.get(&wtxn, source_url)? {
            if let Some(mut blog) = self.schema.blogs_by_id.get(&wtxn, &blog_id)? {
                blog.last_crawled_datetime = Some(when);
                self.schema.blogs_by_id.put(&mut wtxn, &blog_id, &blog)?;
            }
        }
        wtxn.commit()?;
        Ok(())
    }

    pub fn insert_crawl_skip(&self, skip: CrawlSkip) -> StoreResult<()> {
        let mut wtxn = self.env.write_txn()?;
        self.schema.crawl_skips_by_url.put(&mut wtxn, &skip.source_url, &skip)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Writes a new `quality_score` for an article and, if it changed,
    /// cascades the change to every FLI for that article, recomputing their
    /// composite scores and rewriting the rank index entries in place.
    pub fn update_article_score(&self, article_id: ArticleId, new_score: i64) -> StoreResult<()> {
        let mut wtxn = self.env.write_txn()?;
        let Some(mut article) = self.schema.articles_by_id.get(&wtxn, &article_id.get())? else {
            return Ok(());
        };
        if article.quality_score == new_score {
            return Ok(());
        }
        article.quality_score = new_score;
        self.schema.articles_by_id.put(&mut wtxn, &article_id.get(), &article)?;

        let key = article_id.get();
        if let Some(fli_ids) = self.schema.flis_by_article.get(&wtxn, &key)? {
            for fli_id in fli_ids {
                if let Some(mut fli) = self.schema.flis_by_id.get(&wtxn, &fli_id)? {
                    self.remove_rank_entries(&mut wtxn, &fli)?;
                    fli.denormalize_scores(new_score, article.last_updated_datetime);
                    self.schema.flis_by_id.put(&mut wtxn, &fli_id, &fli)?;
                    self.insert_rank_entries(&mut wtxn, &fli, FliId::new(fli_id))?;
                }
            }
        }
        wtxn.commit()?;
        Ok(())
    }

    /// Lists the found lexical items belonging to `article_id`, for
    /// `RescorePass` to learn which base forms an article's rescoring
    /// affects before it writes the new score.
    pub fn flis_for_article(&self, article_id: ArticleId) -> StoreResult<Vec<FoundLexicalItem>> {
        let rtxn = self.env.read_txn()?;
        let key = article_id.get();
        let Some(fli_ids) = self.schema.flis_by_article.get(&rtxn, &key)? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(fli_ids.len());
        for fli_id in fli_ids {
            if let Some(fli) = self.schema.flis_by_id.get(&rtxn, &fli_id)? {
                out.push(fli);
            }
        }
        Ok(out)
    }

    pub fn get_article(&self, article_id: ArticleId) -> StoreResult<Option<Article>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.schema.articles_by_id.get(&rtxn, &article_id.get())?)
    }

    pub fn get_blog(&self, blog_id: BlogId) -> StoreResult<Option<Blog>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.schema.blogs_by_id.get(&rtxn, &blog_id.get())?)
    }

    /// Queries FLIs whose `base_form` matches `query.query_str` under
    /// `query.query_type`'s rank index, merges consecutive same-article
    /// rows, and returns the requested page window plus a distinct-article
    /// count. Mirrors `myaku.datastore.index_search.ArticleIndexSearcher
    /// .search_articles_using_db`.
    pub fn search(&self, query: &Query) -> StoreResult<StoreSearchPage> {
        let rtxn = self.env.read_txn()?;
        let db = self.schema.rank_index_for(query.query_type).remap_key_type::<heed::types::Bytes>();
        let prefix = base_form_prefix(&query.query_str);

        let mut merged: Vec<(ArticleId, Vec<String>, Vec<myaku_types::Position>, i64, OffsetDateTime)> = Vec::new();
        for entry in db.prefix_iter(&rtxn, &prefix)? {
            let (rank_key_bytes, fli_id) = entry?;
            let rank_key = RankIndexKeyCodec::bytes_decode(rank_key_bytes).map_err(|e| StoreError::Codec(e.to_string()))?;
            let Some(fli) = self.schema.flis_by_id.get(&rtxn, &fli_id)? else { continue };
            if let Some(last) = merged.last_mut() {
                if last.0 == rank_key.article_id {
                    if !last.1.contains(&fli.base_form) {
                        last.1.push(fli.base_form.clone());
                    }
                    last.2.extend(fli.found_positions.iter().copied());
                    continue;
                }
            }
            merged.push((
                rank_key.article_id,
                vec![fli.base_form.clone()],
                fli.found_positions.clone(),
                rank_key.composite_score,
                fli.article_last_updated_datetime,
            ));
        }

        let total_results = merged.len() as u64;
        let page_num = query.page_num.max(1) as usize;
        let start_idx = (page_num - 1) * SEARCH_RESULTS_PAGE_SIZE;
        let page: Vec<_> = merged.into_iter().skip(start_idx).take(SEARCH_RESULTS_PAGE_SIZE).collect();

        let mut search_results = Vec::with_capacity(page.len());
        for (article_id, matched_base_forms, found_positions, quality_score, _last_updated) in page {
            let Some(article) = self.schema.articles_by_id.get(&rtxn, &article_id.get())? else { continue };
            search_results.push(SearchResult { article_id, article, matched_base_forms, found_positions, quality_score });
        }

        Ok(StoreSearchPage { search_results, total_results })
    }

    /// Builds a [`SearchResultPage`] from `query` by calling [`Self::search`].
    pub fn search_page(&self, query: Query) -> StoreResult<SearchResultPage> {
        let page = self.search(&query)?;
        Ok(SearchResultPage {
            query,
            total_results: page.total_results,
            search_results: page.search_results,
        })
    }

    /// Returns the best (highest) [`RankKey`] currently stored for a base
    /// form under `QueryType::Exact`, used by the crawl pipeline to decide
    /// whether a first-page cache refresh is warranted after a crawl.
    pub fn best_rank_key(&self, base_form: &str) -> StoreResult<Option<RankKey>> {
        let rtxn = self.env.read_txn()?;
        let db = self.schema.rank_index_exact.remap_key_type::<heed::types::Bytes>();
        let prefix = base_form_prefix(base_form);
        let mut iter = db.prefix_iter(&rtxn, &prefix)?;
        match iter.next() {
            Some(entry) => {
                let (rank_key_bytes, _) = entry?;
                let rank_key = RankIndexKeyCodec::bytes_decode(rank_key_bytes).map_err(|e| StoreError::Codec(e.to_string()))?;
                Ok(Some(RankKey::new(
                    rank_key.composite_score,
                    OffsetDateTime::from_unix_timestamp(rank_key.last_updated_unix).unwrap_or(OffsetDateTime::UNIX_EPOCH),
                    rank_key.article_id,
                )))
            }
            None => Ok(None),
        }
    }

    /// Iterates every stored article, for [`crate::IndexStore`]-driven
    /// rescore passes.
    pub fn iter_articles(&self) -> StoreResult<Vec<Article>> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for entry in self.schema.articles_by_id.iter(&rtxn)? {
            let (_, article) = entry?;
            out.push(article);
        }
        Ok(out)
    }

    pub fn article_count(&self) -> StoreResult<u64> {
        let rtxn = self.env.read_txn()?;
        Ok(self.schema.articles_by_id.len(&rtxn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myaku_types::{Interpretation, Position};
    use std::collections::HashMap as Map;

    fn mk_store() -> (tempfile::TempDir, IndexStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::open(dir.path(), 10 * 1024 * 1024).unwrap();
        (dir, store)
    }

    fn mk_article(url: &str) -> Article {
        Article::build(
            "title".into(),
            None,
            url.into(),
            "example".into(),
            None,
            OffsetDateTime::UNIX_EPOCH,
            OffsetDateTime::UNIX_EPOCH,
            "あ".repeat(700),
            false,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn write_articles_rejects_duplicate_text_hash() {
        let (_dir, store) = mk_store();
        let a1 = mk_article("https://example.test/a");
        let a2 = mk_article("https://example.test/b");
        let results = store.write_articles(vec![a1, a2]).unwrap();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(StoreError::DuplicateArticleText(_))));
    }

    #[test]
    fn write_flis_and_search_round_trips() {
        let (_dir, store) = mk_store();
        let article = mk_article("https://example.test/a");
        let results = store.write_articles(vec![article]).unwrap();
        let article_id = results.into_iter().next().unwrap().unwrap();

        let fli = FoundLexicalItem::new_unscored(
            "走る",
            article_id,
            vec![Position::new(0, 2)],
            Vec::<Interpretation>::new(),
            Map::new(),
        );
        store.write_flis(vec![fli]).unwrap();

        let query = Query::new("走る", 1, QueryType::Exact, "user-1".to_string());
        let page = store.search_page(query).unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.search_results.len(), 1);
        assert_eq!(page.search_results[0].article_id, article_id);
    }

    #[test]
    fn write_articles_upserts_by_source_url() {
        let (_dir, store) = mk_store();
        let a1 = mk_article("https://example.test/a");
        let id1 = store.write_articles(vec![a1]).unwrap().remove(0).unwrap();

        let mut a2 = mk_article("https://example.test/a");
        a2.full_text = "う".repeat(700);
        a2.title = "updated".into();
        let id2 = store.write_articles(vec![a2]).unwrap().remove(0).unwrap();

        assert_eq!(id1, id2);
        assert_eq!(store.article_count().unwrap(), 1);
        let stored = store.get_article(id1).unwrap().unwrap();
        assert_eq!(stored.title, "updated");
    }

    #[test]
    fn update_article_score_cascades_to_flis() {
        let (_dir, store) = mk_store();
        let article = mk_article("https://example.test/a");
        let article_id = store.write_articles(vec![article]).unwrap().remove(0).unwrap();

        let fli = FoundLexicalItem::new_unscored(
            "走る",
            article_id,
            vec![Position::new(0, 2)],
            Vec::<Interpretation>::new(),
            Map::new(),
        );
        store.write_flis(vec![fli]).unwrap();
        store.update_article_score(article_id, 5000).unwrap();

        let query = Query::new("走る", 1, QueryType::Exact, "user-1".to_string());
        let page = store.search_page(query).unwrap();
        assert_eq!(page.search_results[0].quality_score, 5000);
    }
}
