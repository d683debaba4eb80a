use super::*;

fn record(slug: &str, embedding: Vec<f32>) -> ChunkRecord {
    ChunkRecord {
        text: "Ein Absatz".to_string(),
        title: "Ein Titel".to_string(),
        slug: slug.to_string(),
        chunk_index: 2,
        embedding,
    }
}

#[test]
fn chunk_record_uses_camel_case_chunk_index() {
    let json = serde_json::to_string(&record("heizung", vec![0.1, 0.2])).unwrap();
    assert!(json.contains("\"chunkIndex\":2"));
    assert!(!json.contains("chunk_index"));

    let parsed: ChunkRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.chunk_index, 2);
    assert_eq!(parsed.slug, "heizung");
}

#[test]
fn new_store_file_stamps_version_and_timestamp() {
    let file = StoreFile::new("text-embedding-3-small".to_string(), 4, Vec::new());
    assert_eq!(file.version, STORE_FORMAT_VERSION);
    assert_eq!(file.dimensions, 4);
    assert!(
        chrono::DateTime::parse_from_rfc3339(&file.generated_at).is_ok(),
        "generated_at should be RFC 3339: {}",
        file.generated_at
    );
}

#[test]
fn validated_records_drops_wrong_dimensions() {
    let file = StoreFile::new(
        "text-embedding-3-small".to_string(),
        3,
        vec![
            record("a", vec![1.0, 0.0, 0.0]),
            record("b", vec![1.0, 0.0]),
            record("c", vec![0.0, 1.0, 0.0]),
            record("d", Vec::new()),
        ],
    );

    let (records, quarantined) = file.validated_records();
    assert_eq!(quarantined, 2);
    let slugs: Vec<&str> = records.iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(slugs, vec!["a", "c"]);
}

#[test]
fn validated_records_keeps_everything_when_well_formed() {
    let file = StoreFile::new(
        "text-embedding-3-small".to_string(),
        2,
        vec![record("a", vec![1.0, 0.0]), record("b", vec![0.0, 1.0])],
    );
    let (records, quarantined) = file.validated_records();
    assert_eq!(quarantined, 0);
    assert_eq!(records.len(), 2);
}
