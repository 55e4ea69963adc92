use std::env;
use std::sync::Arc;

use ragdb_cli::{embed_timeout, init_logging, open_index_store, parse_indexer_args};
use ragdb_core::config::Config;
use ragdb_core::data_processor::DocumentLoader;
use ragdb_embed::get_default_embedder;
use ragdb_vector::Builder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Config::load()
        .and_then(|c| c.settings())
        .map_err(|e| {
            eprintln!("Error loading config: {e}");
            e
        })?;
    init_logging(&settings);

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_indexer_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Usage: ragdb-indexer [DATA_DIR] [--fresh] [--limit N]");
            std::process::exit(2);
        }
    };
    let data_dir = args.data_dir.unwrap_or_else(|| settings.raw_docs_dir());

    println!("ragdb indexer\n=============");
    println!("Data directory: {}", data_dir.display());
    println!("Index: {}/{}", settings.primary_index_dir().display(), settings.index.key);

    let store = Arc::new(open_index_store(&settings));
    let embedder = get_default_embedder(settings.embedding.dimension);
    let builder = Builder::new(store, embedder)
        .with_chunking(settings.chunking.clone())?
        .with_timeout(embed_timeout(&settings))
        .with_concurrency(settings.embedding.concurrency)
        .with_progress(true);
    let builder = match args.limit {
        Some(limit) => {
            println!("Limiting indexing to {limit} files");
            builder.with_loader(DocumentLoader::with_limit(limit))
        }
        None => builder,
    };

    let summary = if args.fresh {
        println!("Replacing the existing index (--fresh)");
        builder.rebuild_from_directory(&data_dir).await?
    } else {
        builder.build_from_directory(&data_dir).await?
    };

    println!("\nIndexing completed");
    println!("  documents processed: {}", summary.documents_processed);
    println!("  passages embedded:   {}", summary.passages_embedded);
    println!("  passages skipped:    {}", summary.passages_skipped);
    println!("  passages discarded:  {}", summary.passages_discarded);
    println!("  index size:          {}", summary.index_size);
    if !summary.documents_failed.is_empty() {
        println!("\n{} document(s) could not be read:", summary.documents_failed.len());
        for (source, reason) in &summary.documents_failed {
            println!("  - {source}: {reason}");
        }
    }
    println!("\nTo search, use: cargo run --bin ragdb-search '<query>'");
    Ok(())
}
