//! Shared wiring for the `ragdb-indexer` and `ragdb-search` binaries.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use ragdb_core::config::Settings;
use ragdb_vector::{FsBlobStore, IndexStore};

/// Install a stderr subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        tracing::debug!(error = %e, "keeping the already installed subscriber");
    }
}

/// Open the configured snapshot: primary directory plus optional fallback.
pub fn open_index_store(settings: &Settings) -> IndexStore {
    let primary = settings.primary_index_dir();
    tracing::debug!(primary = %primary.display(), key = %settings.index.key, "opening index store");
    let store = IndexStore::new(Arc::new(FsBlobStore::new(primary)), settings.index.key.clone());
    match settings.fallback_index_dir() {
        Some(fallback) => store.with_fallback(Arc::new(FsBlobStore::new(fallback))),
        None => store,
    }
}

pub fn embed_timeout(settings: &Settings) -> Duration {
    Duration::from_millis(settings.embedding.timeout_ms)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexerArgs {
    pub data_dir: Option<PathBuf>,
    pub fresh: bool,
    /// Only index the first N files (sorted by path).
    pub limit: Option<usize>,
}

/// Parse `[DATA_DIR] [--fresh] [--limit N]`.
pub fn parse_indexer_args(args: &[String]) -> anyhow::Result<IndexerArgs> {
    let mut parsed = IndexerArgs::default();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--fresh" | "-f" => parsed.fresh = true,
            "--limit" | "-n" => {
                let value = args.get(i + 1).ok_or_else(|| anyhow::anyhow!("--limit requires a number"))?;
                let limit: usize =
                    value.parse().map_err(|_| anyhow::anyhow!("--limit requires a number, got '{value}'"))?;
                if limit == 0 {
                    anyhow::bail!("--limit must be greater than 0");
                }
                parsed.limit = Some(limit);
                i += 1;
            }
            _ if arg.starts_with('-') => anyhow::bail!("unknown option '{arg}'"),
            _ if parsed.data_dir.is_none() => parsed.data_dir = Some(PathBuf::from(arg)),
            _ => anyhow::bail!("unexpected argument '{arg}'"),
        }
        i += 1;
    }
    Ok(parsed)
}

#[derive(Debug, PartialEq, Eq)]
pub struct SearchArgs {
    pub query: String,
    pub limit: usize,
}

/// Parse `<QUERY> [--limit N]`. The limit defaults to `default_limit` and is
/// capped at `max_limit`.
pub fn parse_search_args(args: &[String], default_limit: usize, max_limit: usize) -> anyhow::Result<SearchArgs> {
    let mut query: Option<String> = None;
    let mut limit = default_limit;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" | "-n" => {
                let value = args.get(i + 1).ok_or_else(|| anyhow::anyhow!("--limit requires a number"))?;
                limit = value.parse().map_err(|_| anyhow::anyhow!("--limit requires a number, got '{value}'"))?;
                i += 1;
            }
            a if a.starts_with('-') => anyhow::bail!("unknown option '{a}'"),
            a => {
                let q = query.get_or_insert_with(String::new);
                if !q.is_empty() {
                    q.push(' ');
                }
                q.push_str(a);
            }
        }
        i += 1;
    }
    let query = query.filter(|q| !q.trim().is_empty()).ok_or_else(|| anyhow::anyhow!("missing query"))?;
    if limit == 0 {
        anyhow::bail!("--limit must be greater than 0");
    }
    if limit > max_limit {
        tracing::warn!(requested = limit, max_limit, "capping result limit");
        limit = max_limit;
    }
    Ok(SearchArgs { query, limit })
}
