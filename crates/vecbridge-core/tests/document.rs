use std::collections::HashMap;

use serde_json::json;
use vecbridge_core::{
    Dataset, Document, IndexStruct, SearchOptions, VecbridgeError, VectorType, DOC_ID_KEY,
};

#[test]
fn new_document_gets_generated_doc_id() {
    let a = Document::new("hello");
    let b = Document::new("hello");
    assert!(a.doc_id().is_some());
    assert_ne!(a.doc_id(), b.doc_id());
}

#[test]
fn with_id_sets_doc_id() {
    let doc = Document::with_id("a", "alpha");
    assert_eq!(doc.doc_id(), Some("a"));
    assert_eq!(doc.page_content, "alpha");
    assert!(doc.score().is_none());
}

#[test]
fn with_metadata_keeps_map_as_is() {
    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), json!("wiki"));
    let doc = Document::with_metadata("text", metadata);
    assert!(doc.doc_id().is_none());
    assert_eq!(doc.metadata["source"], json!("wiki"));
}

#[test]
fn non_string_doc_id_is_not_an_id() {
    let doc = Document::with_metadata("text", HashMap::new()).with_field(DOC_ID_KEY, 7);
    assert!(doc.doc_id().is_none());
}

#[test]
fn score_is_read_from_metadata() {
    let doc = Document::with_id("a", "alpha").with_field("score", 0.75);
    assert_eq!(doc.score(), Some(0.75));
}

#[test]
fn document_serde_roundtrip_defaults_metadata() {
    let doc: Document = serde_json::from_value(json!({"page_content": "x"})).unwrap();
    assert!(doc.metadata.is_empty());
}

#[test]
fn search_options_builder() {
    let options = SearchOptions::new()
        .with_top_k(10)
        .with_score_threshold(0.5);
    assert_eq!(options.top_k, 10);
    assert_eq!(options.score_threshold, 0.5);
}

#[test]
fn collection_name_replaces_dashes() {
    assert_eq!(
        Dataset::gen_collection_name_by_id("4f1c-99ab-01"),
        "Vector_index_4f1c_99ab_01_Node"
    );
}

#[test]
fn index_struct_serializes_in_persisted_shape() {
    let index_struct = IndexStruct::new(VectorType::Upstash, "Vector_index_x_Node");
    assert_eq!(
        serde_json::to_value(&index_struct).unwrap(),
        json!({"type": "upstash", "vector_store": {"class_prefix": "Vector_index_x_Node"}})
    );
}

#[test]
fn dataset_decodes_index_struct() {
    let dataset = Dataset::new("ds").with_index_struct(json!({
        "type": "upstash",
        "vector_store": {"class_prefix": "existing"}
    }));
    let index_struct = dataset.index_struct().unwrap().unwrap();
    assert_eq!(index_struct.collection_name(), "existing");
}

#[test]
fn dataset_decodes_index_struct_with_foreign_type() {
    let dataset = Dataset::new("ds").with_index_struct(json!({
        "type": "pgvector",
        "vector_store": {"class_prefix": "Vector_index_ds_Node"}
    }));
    let index_struct = dataset.index_struct().unwrap().unwrap();
    assert_eq!(index_struct.vector_type, "pgvector");
    assert_eq!(index_struct.collection_name(), "Vector_index_ds_Node");
}

#[test]
fn dataset_decodes_index_struct_without_type() {
    let dataset = Dataset::new("ds").with_index_struct(json!({
        "vector_store": {"class_prefix": "Vector_index_ds_Node"}
    }));
    let index_struct = dataset.index_struct().unwrap().unwrap();
    assert_eq!(index_struct.vector_type, "");
    assert_eq!(index_struct.collection_name(), "Vector_index_ds_Node");
}

#[test]
fn dataset_without_index_struct() {
    assert!(Dataset::new("ds").index_struct().unwrap().is_none());
}

#[test]
fn malformed_index_struct_is_config_error() {
    let dataset = Dataset::new("ds").with_index_struct(json!({"type": "upstash"}));
    let err = dataset.index_struct().unwrap_err();
    assert!(matches!(err, VecbridgeError::Config(_)));
}

#[test]
fn error_messages() {
    let err = VecbridgeError::Backend {
        status: 401,
        message: "Unauthorized".into(),
    };
    assert_eq!(err.to_string(), "backend error (HTTP 401): Unauthorized");
    assert_eq!(
        VecbridgeError::Config("url is required".into()).to_string(),
        "config error: url is required"
    );
}
