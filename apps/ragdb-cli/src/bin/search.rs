use std::env;

use ragdb_cli::{embed_timeout, init_logging, open_index_store, parse_search_args};
use ragdb_core::config::Config;
use ragdb_embed::get_default_embedder;
use ragdb_vector::Retriever;

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
    let args = match parse_search_args(&args, settings.search.default_limit, settings.search.max_limit) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Usage: ragdb-search <QUERY> [--limit N]");
            eprintln!("Example: ragdb-search 'how does grappling work' --limit 3");
            std::process::exit(2);
        }
    };

    let store = open_index_store(&settings);
    let embedder = get_default_embedder(settings.embedding.dimension);
    let retriever = Retriever::from_store(&store, embedder).with_timeout(embed_timeout(&settings));
    if retriever.index().is_empty() {
        println!("Index is empty; run ragdb-indexer first.");
        return Ok(());
    }

    let results = retriever.search(&args.query, args.limit).await?;
    println!("Found {} results for: \"{}\"", results.len(), args.query);
    for (i, result) in results.iter().enumerate() {
        println!("\n  {}. score={:.4}  {} p.{}", i + 1, result.score, result.source, result.page_number);
        println!("     {}", result.text);
    }
    Ok(())
}
