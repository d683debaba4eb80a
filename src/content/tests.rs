use super::*;
use std::fs;
use tempfile::TempDir;

fn write_post(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("can write test post");
}

#[test]
fn front_matter_parsing() {
    let source = "---\ntitle: Heizung im Tiny House\ndate: '2024-01-15'\ntags:\n  - heizung\n  - winter\ndraft: false\n---\n\nDer Inhalt.";
    let (front_matter, body) = parse_front_matter(source).expect("should parse front matter");

    assert_eq!(front_matter.title, "Heizung im Tiny House");
    assert_eq!(front_matter.date.as_deref(), Some("2024-01-15"));
    assert_eq!(front_matter.tags, vec!["heizung", "winter"]);
    assert!(!front_matter.draft);
    assert!(body.contains("Der Inhalt."));
}

#[test]
fn missing_front_matter_is_all_body() {
    let (front_matter, body) = parse_front_matter("Just a body.").expect("should parse");
    assert_eq!(front_matter.title, "");
    assert_eq!(body, "Just a body.");
}

#[test]
fn unterminated_front_matter_is_an_error() {
    assert!(parse_front_matter("---\ntitle: Broken\n\nNo closing fence.").is_err());
}

#[test]
fn discovers_published_documents_recursively() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let nested = temp_dir.path().join("2024");
    fs::create_dir_all(&nested).expect("can create nested dir");

    write_post(
        temp_dir.path(),
        "solar-setup.mdx",
        "---\ntitle: Solar Setup\n---\n\nSolarpanels auf dem Dach.",
    );
    write_post(
        &nested,
        "winter-tips.mdx",
        "---\ntitle: Winter Tips\n---\n\nHeizen im Winter.",
    );
    write_post(temp_dir.path(), "notes.txt", "not a post");

    let documents =
        discover_documents(&[temp_dir.path().to_path_buf()]).expect("discovery should succeed");

    assert_eq!(documents.len(), 2);
    let slugs: Vec<&str> = documents.iter().map(|d| d.slug.as_str()).collect();
    assert!(slugs.contains(&"solar-setup"));
    assert!(slugs.contains(&"winter-tips"));
}

#[test]
fn drafts_are_excluded() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    write_post(
        temp_dir.path(),
        "published.mdx",
        "---\ntitle: Published\n---\n\nText.",
    );
    write_post(
        temp_dir.path(),
        "wip.mdx",
        "---\ntitle: Work in Progress\ndraft: true\n---\n\nText.",
    );

    let documents =
        discover_documents(&[temp_dir.path().to_path_buf()]).expect("discovery should succeed");

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].slug, "published");
}

#[test]
fn slug_falls_back_as_title() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    write_post(temp_dir.path(), "untitled-post.mdx", "---\ndraft: false\n---\n\nText.");

    let documents =
        discover_documents(&[temp_dir.path().to_path_buf()]).expect("discovery should succeed");

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].title, "untitled-post");
}

#[test]
fn missing_directory_is_skipped() {
    let documents = discover_documents(&[PathBuf::from("/nonexistent/kokomo-content")])
        .expect("missing dir should not error");
    assert!(documents.is_empty());
}

#[test]
fn body_is_plain_text() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    write_post(
        temp_dir.path(),
        "gallery.mdx",
        "---\ntitle: Gallery\n---\n\nEin **fetter** Text.\n\n<ImageGallery images={[]} />",
    );

    let documents =
        discover_documents(&[temp_dir.path().to_path_buf()]).expect("discovery should succeed");

    assert_eq!(documents[0].body, "Ein fetter Text.");
}
