use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vecbridge::core::{Dataset, Document, SearchOptions, VecbridgeError, VectorFactory, VectorStore};
use vecbridge::upstash::{InMemoryIndex, UpstashVector, UpstashVectorFactory};

#[tokio::main]
async fn main() -> Result<(), VecbridgeError> {
    // RUST_LOG=debug shows every backend request.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut dataset = Dataset::new("3f2b9c1e-demo");

    // --- Pick a backend ---
    let store: Box<dyn VectorStore> = match UpstashVectorFactory::from_env() {
        Ok(factory) => {
            println!("=== Using Upstash Vector ===");
            Box::new(factory.init_vector(&mut dataset)?)
        }
        Err(e) => {
            println!("=== {e}; falling back to the in-memory index ===");
            let name = Dataset::gen_collection_name_by_id(&dataset.id);
            Box::new(UpstashVector::with_index(name, Arc::new(InMemoryIndex::new())))
        }
    };
    println!("Collection: {}", store.collection_name());
    if let Some(ref index_struct) = dataset.index_struct {
        println!("Index struct to persist: {index_struct}");
    }

    // --- Write ---
    println!("\n=== Upserting ===");
    let docs = vec![
        Document::with_id("a", "Rust is a systems programming language.")
            .with_field("document_id", "lang"),
        Document::with_id("b", "Upstash Vector is a serverless vector database.")
            .with_field("document_id", "db"),
        Document::with_id("c", "Vector databases power retrieval for Rust services.")
            .with_field("document_id", "db"),
    ];
    let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
    store.create(docs, embeddings).await?;
    println!("exists(a) = {}", store.exists("a").await?);

    // --- Search ---
    println!("\n=== Search by vector [1, 1], top 2 ===");
    let results = store
        .search_by_vector(&[1.0, 1.0], SearchOptions::new().with_top_k(2))
        .await?;
    for (i, doc) in results.iter().enumerate() {
        println!(
            "  {i}: {:?} score={:.3} \"{}\"",
            doc.doc_id().unwrap_or("?"),
            doc.score().unwrap_or_default(),
            doc.page_content
        );
    }

    let lexical = store
        .search_by_text("Rust", SearchOptions::default())
        .await?;
    println!("Full-text hits: {} (not supported by Upstash)", lexical.len());

    // --- Delete ---
    println!("\n=== Deleting ===");
    store.delete_by_metadata_field("document_id", "db").await?;
    println!("exists(b) after metadata delete = {}", store.exists("b").await?);
    store.delete_by_ids(&["a"]).await?;
    println!("exists(a) after id delete = {}", store.exists("a").await?);
    store.delete_collection().await?;
    println!("Collection dropped");

    Ok(())
}
