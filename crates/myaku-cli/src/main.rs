//! `myaku` — the operational entry point for the crawl pipeline, the
//! rescore pass, the first-page cache rebuild, and ad hoc search, per
//! `SPEC_FULL.md` §10. Mirrors `myaku/runners/*.py` as one binary with one
//! subcommand per runner, the way `meilitool` bundles its maintenance
//! commands behind a single `clap::Subcommand`.

mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use time::OffsetDateTime;
use tracing::info;

use myaku_adapter::SourceAdapter;
use myaku_cache::{FirstPageCache, NextPageCache};
use myaku_crawl::{CrawlPipeline, RescorePass};
use myaku_lexical::NullAnalyzer;
use myaku_search::{IndexSearcher, SearchConfig};
use myaku_store::IndexStore;
use myaku_types::{Query, QueryType};

use config::MyakuConfig;

/// File `rescore` reads/writes its previous-pass timestamp to, relative to
/// the configured index directory. `IndexStore` has no public API for
/// storing arbitrary metadata like this — its internal `meta` table exists
/// only to hand out the next free id — so rather than extend the store for
/// a single CLI-only need, this binary keeps its own small state file next
/// to the index. See `DESIGN.md`.
const LAST_RESCORE_FILE_NAME: &str = "last_rescore_time";

#[derive(Parser)]
#[command(name = "myaku", about = "Japanese lexical-item search engine operations", version)]
struct Cli {
    /// Path to a TOML config file. Falls back to built-in defaults,
    /// overridable per-field by `MYAKU_*` environment variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl every configured source adapter and write newly found articles
    /// into the index.
    RunCrawl,
    /// Re-score articles whose publication recency crossed a scoring tier
    /// boundary since the last pass.
    Rescore,
    /// Rebuild the first-page cache from the current index contents.
    BuildFirstPageCache,
    /// Run one search against the index and print the result as JSON.
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_enum, default_value_t = CliQueryType::Exact)]
        query_type: CliQueryType,
        #[arg(long, default_value = "")]
        user_id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliQueryType {
    Exact,
    DefiniteAltForms,
    PossibleAltForms,
}

impl From<CliQueryType> for QueryType {
    fn from(value: CliQueryType) -> Self {
        match value {
            CliQueryType::Exact => QueryType::Exact,
            CliQueryType::DefiniteAltForms => QueryType::DefiniteAltForms,
            CliQueryType::PossibleAltForms => QueryType::PossibleAltForms,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::install();

    let config = MyakuConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::RunCrawl => run_crawl(&config).await,
        Command::Rescore => rescore(&config).await,
        Command::BuildFirstPageCache => build_first_page_cache(&config).await,
        Command::Search { query, page, query_type, user_id } => {
            search(&config, query, page, query_type.into(), user_id).await
        }
    }
}

fn open_store(config: &MyakuConfig) -> anyhow::Result<IndexStore> {
    IndexStore::open(&config.index_path, config.index_map_size)
        .with_context(|| format!("opening index at {}", config.index_path.display()))
}

async fn open_first_page_cache(config: &MyakuConfig) -> anyhow::Result<FirstPageCache> {
    let client = redis::Client::open(config.first_page_cache_redis_url.as_str())
        .with_context(|| format!("invalid first-page cache redis url {}", config.first_page_cache_redis_url))?;
    let conn = client.get_connection_manager().await.context("connecting to first-page cache redis")?;
    Ok(FirstPageCache::new(conn))
}

async fn open_next_page_cache(config: &MyakuConfig) -> anyhow::Result<NextPageCache> {
    let client = redis::Client::open(config.next_page_cache_redis_url.as_str())
        .with_context(|| format!("invalid next-page cache redis url {}", config.next_page_cache_redis_url))?;
    let conn = client.get_connection_manager().await.context("connecting to next-page cache redis")?;
    Ok(NextPageCache::new(conn))
}

/// Drives `CrawlPipeline::run_all` with no configured adapters: concrete
/// `SourceAdapter` implementations are one per site and live outside this
/// workspace (`spec.md` §4.1, "implementations per site are external"), and
/// the only `LexicalAnalyzer` this workspace ships is `NullAnalyzer` (the
/// real morphological analyzer is likewise external). Both limitations are
/// recorded in `DESIGN.md`; this command runs as a no-op scaffold until a
/// deployment supplies its own adapters and analyzer by building on these
/// library crates directly.
async fn run_crawl(config: &MyakuConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let first_page_cache = open_first_page_cache(config).await?;

    let pipeline = CrawlPipeline::new(store, Arc::new(NullAnalyzer))
        .with_first_page_cache(first_page_cache);

    let adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    if adapters.is_empty() {
        tracing::warn!("no SourceAdapter configured; run-crawl will find nothing to crawl");
    }

    let stats = pipeline.run_all(&adapters).await?;
    info!(
        articles = stats.total.articles,
        flis = stats.total.flis,
        alnum_chars = stats.total.alnum_chars,
        skipped = stats.total.skipped,
        elapsed_ms = stats.elapsed().as_millis(),
        "run-crawl finished",
    );
    Ok(())
}

fn last_rescore_path(config: &MyakuConfig) -> PathBuf {
    config.index_path.join(LAST_RESCORE_FILE_NAME)
}

fn read_last_rescore_time(config: &MyakuConfig) -> Option<OffsetDateTime> {
    let text = std::fs::read_to_string(last_rescore_path(config)).ok()?;
    let unix_seconds: i64 = text.trim().parse().ok()?;
    OffsetDateTime::from_unix_timestamp(unix_seconds).ok()
}

fn write_last_rescore_time(config: &MyakuConfig, at: OffsetDateTime) -> anyhow::Result<()> {
    std::fs::write(last_rescore_path(config), at.unix_timestamp().to_string())
        .with_context(|| format!("writing {}", last_rescore_path(config).display()))
}

async fn rescore(config: &MyakuConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let first_page_cache = open_first_page_cache(config).await?;

    let previous_pass_at = read_last_rescore_time(config);
    let now = OffsetDateTime::now_utc();

    let pass = RescorePass::new(store).with_first_page_cache(first_page_cache);
    let stats = pass.run(previous_pass_at, now).await?;

    write_last_rescore_time(config, now)?;
    info!(
        articles_examined = stats.articles_examined,
        articles_rescored = stats.articles_rescored,
        previous_pass_at = ?previous_pass_at,
        "rescore finished",
    );
    Ok(())
}

/// Re-warms the first-page cache for every base form currently in the
/// index, mirroring `myaku/runners/build_first_page_cache.py`. Follows the
/// same best-rank-key-then-conditional-recache shape as
/// `CrawlPipeline::refresh_first_page_cache`, just swept over every base
/// form in the store rather than only the ones a crawl just touched.
async fn build_first_page_cache(config: &MyakuConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let first_page_cache = open_first_page_cache(config).await?;

    let mut seen_base_forms = std::collections::HashSet::new();
    let mut warmed = 0u64;
    for article in store.iter_articles()? {
        let Some(article_id) = article.id else {
            continue;
        };
        for fli in store.flis_for_article(article_id)? {
            if !seen_base_forms.insert(fli.base_form.clone()) {
                continue;
            }
            let Some(best) = store.best_rank_key(&fli.base_form)? else {
                continue;
            };
            if !first_page_cache.is_recache_required(&fli.base_form, best).await? {
                continue;
            }
            let query = Query::new(fli.base_form.clone(), 1, QueryType::Exact, String::new());
            let page = store.search_page(query)?;
            let cached = myaku_cache::CachedSearchResultPage::from_page(&page);
            first_page_cache.put(&fli.base_form, &cached, Some(best)).await?;
            warmed += 1;
        }
    }
    first_page_cache.mark_built().await?;

    info!(base_forms_warmed = warmed, "build-first-page-cache finished");
    Ok(())
}

async fn search(
    config: &MyakuConfig,
    query_str: String,
    page: u32,
    query_type: QueryType,
    user_id: String,
) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let first_page_cache = open_first_page_cache(config).await?;
    let next_page_cache = open_next_page_cache(config).await?;

    let searcher = IndexSearcher::new(store)
        .with_first_page_cache(Arc::new(first_page_cache))
        .with_next_page_cache(Arc::new(next_page_cache))
        .with_config(SearchConfig { max_page_num: config.max_page_num });

    let query = Query::new(query_str, page, query_type, user_id);
    let response = searcher.search_or_empty(query).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
