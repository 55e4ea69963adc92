mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{record, LookupEmbedder, SleepyEmbedder};
use ragdb_core::error::Error;
use ragdb_embed::HashingEmbedder;
use ragdb_vector::{cosine_similarity, rank, Index, IndexStore, MemoryBlobStore, Retriever};

fn three_passage_index() -> Index {
    Index::from_records(vec![
        record("A_p1_c0", "A", 1, vec![1.0, 0.0]),
        record("B_p2_c0", "B", 2, vec![0.0, 1.0]),
        record("C_p3_c0", "C", 3, vec![0.7, 0.7]),
    ])
    .expect("index")
}

#[tokio::test]
async fn nearest_passages_come_first() {
    let embedder = Arc::new(LookupEmbedder::new(2, &[("where is A", vec![1.0, 0.0])]));
    let retriever = Retriever::new(Arc::new(three_passage_index()), embedder);

    let results = retriever.search("where is A", 2).await.expect("search");
    assert_eq!(results.len(), 2);
    assert_eq!((results[0].source.as_str(), results[0].page_number), ("A", 1));
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert_eq!((results[1].source.as_str(), results[1].page_number), ("C", 3));
    assert!((results[1].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-3);
}

#[tokio::test]
async fn empty_index_returns_nothing_without_embedding() {
    let embedder = Arc::new(LookupEmbedder::new(2, &[]));
    let retriever = Retriever::new(Arc::new(Index::new()), embedder.clone());

    let results = retriever.search("anything", 5).await.expect("search");
    assert!(results.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn results_are_bounded_and_sorted() {
    let embedder = Arc::new(HashingEmbedder::new(64));
    let records = (0..20u32)
        .map(|i| {
            let v = (0..64).map(|d| ((i * 7 + d) % 11) as f32 - 5.0).collect();
            record(&format!("doc_p{i}_c0"), "doc", i + 1, v)
        })
        .collect();
    let retriever = Retriever::new(Arc::new(Index::from_records(records).unwrap()), embedder);

    for n in [1usize, 5, 20, 50] {
        let results = retriever.search("grappling rules and conditions", n).await.expect("search");
        assert_eq!(results.len(), n.min(20));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(results.iter().all(|r| (-1.0..=1.0).contains(&r.score)));
    }
}

#[tokio::test]
async fn zero_top_n_is_rejected() {
    let retriever = Retriever::new(Arc::new(three_passage_index()), Arc::new(LookupEmbedder::new(2, &[])));
    assert!(matches!(retriever.search("q", 0).await, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn embedder_failure_fails_the_search() {
    let retriever = Retriever::new(Arc::new(three_passage_index()), Arc::new(LookupEmbedder::new(2, &[])));
    let result = retriever.search("unknown query", 3).await;
    assert!(matches!(result, Err(Error::EmbeddingUnavailable(_))), "{result:?}");
}

#[tokio::test]
async fn embedder_timeout_fails_the_search() {
    let retriever = Retriever::new(
        Arc::new(three_passage_index()),
        Arc::new(SleepyEmbedder { delay: Duration::from_millis(300) }),
    )
    .with_timeout(Duration::from_millis(20));
    let result = retriever.search("slow query", 3).await;
    assert!(matches!(result, Err(Error::EmbeddingUnavailable(_))), "{result:?}");
}

#[tokio::test]
async fn query_dimension_must_match_index() {
    let embedder = Arc::new(LookupEmbedder::new(3, &[("q", vec![1.0, 0.0, 0.0])]));
    let retriever = Retriever::new(Arc::new(three_passage_index()), embedder);
    let result = retriever.search("q", 3).await;
    assert!(matches!(result, Err(Error::DimensionMismatch { expected: 2, found: 3 })), "{result:?}");
}

#[tokio::test]
async fn concurrent_searches_share_one_snapshot() {
    let embedder = Arc::new(LookupEmbedder::new(
        2,
        &[("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0]), ("c", vec![0.7, 0.7])],
    ));
    let retriever = Arc::new(Retriever::new(Arc::new(three_passage_index()), embedder));

    let mut handles = Vec::new();
    for q in ["a", "b", "c", "a", "b", "c"] {
        let r = Arc::clone(&retriever);
        handles.push(tokio::spawn(async move { r.search(q, 1).await.map(|hits| (q, hits[0].source.clone())) }));
    }
    for handle in handles {
        let (q, top) = handle.await.expect("join").expect("search");
        assert_eq!(top, q.to_uppercase());
    }
    assert_eq!(retriever.index().len(), 3);
}

#[test]
fn cosine_properties() {
    let a = [0.3f32, -1.2, 4.0, 0.0];
    let b = [2.0f32, 0.5, -0.25, 9.0];
    assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    assert_eq!(cosine_similarity(&a, &[0.0; 4]), 0.0);
    assert_eq!(cosine_similarity(&[0.0; 4], &[0.0; 4]), 0.0);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[f32::NAN, 1.0]), 0.0);
}

#[test]
fn ties_keep_insertion_order() {
    let records = vec![
        record("first", "s", 1, vec![1.0, 1.0]),
        record("second", "s", 2, vec![2.0, 2.0]),
        record("third", "s", 3, vec![3.0, 3.0]),
    ];
    let ranked = rank(&[1.0, 1.0], &records, 3);
    let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["first", "second", "third"]);
}

#[tokio::test]
async fn retriever_from_unreachable_store_serves_empty() {
    let primary = Arc::new(MemoryBlobStore::new());
    primary.set_reachable(false);
    let store = IndexStore::new(primary, "rulebooks.json");
    let retriever = Retriever::from_store(&store, Arc::new(LookupEmbedder::new(2, &[])));
    assert!(retriever.search("anything", 5).await.expect("search").is_empty());
}
