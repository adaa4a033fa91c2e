use std::collections::HashSet;
use std::io::{Cursor, Write};

use backdrop_store::{
    Error, Ingestor, StoreLayout, resolve_address, serve_image,
};
use zip::write::SimpleFileOptions;

enum Fixture<'a> {
    File(&'a str, &'a [u8]),
    Dir(&'a str),
}

fn build_zip(entries: &[Fixture]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for entry in entries {
        match entry {
            Fixture::File(name, content) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content).unwrap();
            }
            Fixture::Dir(name) => {
                writer.add_directory(*name, options).unwrap();
            }
        }
    }
    writer.finish().unwrap().into_inner()
}

fn temp_layout() -> (tempfile::TempDir, StoreLayout) {
    let temp = tempfile::tempdir().unwrap();
    let layout = StoreLayout::builder().root(temp.path().join("store")).build();
    (temp, layout)
}

fn session_count(layout: &StoreLayout) -> usize {
    match std::fs::read_dir(layout.sessions()) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

#[tokio::test]
async fn ingest_returns_one_address_per_image() {
    let (_temp, layout) = temp_layout();
    let bytes = build_zip(&[
        Fixture::File("a.jpg", b"a"),
        Fixture::File("b.png", b"b"),
        Fixture::File("c.gif", b"c"),
    ]);

    let outcome = Ingestor::new(layout)
        .ingest(&bytes, "upload.zip")
        .await
        .unwrap();

    assert_eq!(outcome.addresses.len(), 3);
    let unique: HashSet<_> = outcome.addresses.iter().collect();
    assert_eq!(unique.len(), 3);
    assert!(!outcome.session_id.is_empty());
    for address in &outcome.addresses {
        assert!(address.starts_with("images/"));
        assert!(address.contains(&outcome.session_id));
    }
}

#[tokio::test]
async fn ingest_output_order_is_deterministic() {
    let (_temp, layout) = temp_layout();
    let bytes = build_zip(&[
        Fixture::File("c.jpg", b"c"),
        Fixture::File("a.jpg", b"a"),
        Fixture::File("b.jpg", b"b"),
    ]);

    let outcome = Ingestor::new(layout)
        .ingest(&bytes, "upload.zip")
        .await
        .unwrap();

    let leaves: Vec<_> = outcome
        .addresses
        .iter()
        .map(|a| a.rsplit('/').next().unwrap().to_string())
        .collect();
    assert_eq!(leaves, vec!["a.jpg", "b.jpg", "c.jpg"]);
}

#[tokio::test]
async fn ingest_rejects_wrong_suffix() {
    let (_temp, layout) = temp_layout();
    let bytes = build_zip(&[Fixture::File("a.jpg", b"a")]);

    let result = Ingestor::new(layout).ingest(&bytes, "upload.tar.gz").await;
    assert!(matches!(result, Err(Error::InvalidContainerType { .. })));
}

#[tokio::test]
async fn ingest_rejects_corrupt_archive() {
    let (_temp, layout) = temp_layout();

    let result = Ingestor::new(layout.clone())
        .ingest(&[0xDE, 0xAD, 0xBE, 0xEF], "upload.zip")
        .await;
    assert!(matches!(
        result,
        Err(Error::Archive(backdrop_archive::Error::Corrupted))
    ));
    assert_eq!(session_count(&layout), 0);
}

#[tokio::test]
async fn ingest_rejects_empty_container_and_cleans_up() {
    let (_temp, layout) = temp_layout();
    let bytes = build_zip(&[
        Fixture::File("readme.txt", b"no images here"),
        Fixture::Dir("empty_dir"),
    ]);

    let result = Ingestor::new(layout.clone()).ingest(&bytes, "upload.zip").await;
    assert!(matches!(result, Err(Error::EmptyContainer)));
    assert_eq!(session_count(&layout), 0);
}

#[tokio::test]
async fn ingest_rejects_oversized_batch_and_cleans_up() {
    let (_temp, layout) = temp_layout();
    let names: Vec<String> = (0..101).map(|i| format!("img_{i:03}.jpg")).collect();
    let entries: Vec<Fixture> = names
        .iter()
        .map(|name| Fixture::File(name.as_str(), &b"x"[..]))
        .collect();
    let bytes = build_zip(&entries);

    let result = Ingestor::new(layout.clone()).ingest(&bytes, "upload.zip").await;
    match result {
        Err(Error::TooManyImages { count, max }) => {
            assert_eq!(count, 101);
            assert_eq!(max, 100);
        }
        other => panic!("expected TooManyImages, got {other:?}"),
    }
    assert_eq!(session_count(&layout), 0);
}

#[tokio::test]
async fn ingest_honors_configured_maximum() {
    let (_temp, layout) = temp_layout();
    let bytes = build_zip(&[
        Fixture::File("a.jpg", b"a"),
        Fixture::File("b.jpg", b"b"),
        Fixture::File("c.jpg", b"c"),
    ]);

    let result = Ingestor::new(layout)
        .max_images(2)
        .ingest(&bytes, "upload.zip")
        .await;
    assert!(matches!(
        result,
        Err(Error::TooManyImages { count: 3, max: 2 })
    ));
}

#[tokio::test]
async fn ingest_handles_mixed_archive_scenario() {
    let (_temp, layout) = temp_layout();
    let bytes = build_zip(&[
        Fixture::File("a.jpg", b"first"),
        Fixture::File("sub/a.jpg", b"second"),
        Fixture::File("b.png", b"third"),
        Fixture::File("._b.png", b"shadow"),
        Fixture::File("readme.txt", b"text"),
        Fixture::Dir("empty_dir"),
    ]);

    let outcome = Ingestor::new(layout)
        .ingest(&bytes, "upload.zip")
        .await
        .unwrap();

    let leaves: Vec<_> = outcome
        .addresses
        .iter()
        .map(|a| a.rsplit('/').next().unwrap().to_string())
        .collect();
    assert_eq!(leaves, vec!["a.jpg", "a_1.jpg", "b.png"]);
}

#[tokio::test]
async fn every_ingested_address_round_trips() {
    let (_temp, layout) = temp_layout();
    let bytes = build_zip(&[
        Fixture::File("a.jpg", b"alpha pixels"),
        Fixture::File("dir one/my photo.png", b"beta pixels"),
    ]);

    let outcome = Ingestor::new(layout.clone())
        .ingest(&bytes, "upload.zip")
        .await
        .unwrap();

    for address in &outcome.addresses {
        let location = resolve_address(&layout, address).unwrap();
        assert!(location.is_file());

        let (served, _mime) = serve_image(&layout, address).await.unwrap();
        let on_disk = std::fs::read(&location).unwrap();
        assert!(!served.is_empty());
        assert_eq!(served, on_disk);
    }
}

#[tokio::test]
async fn sessions_are_disjoint_across_ingestions() {
    let (_temp, layout) = temp_layout();
    let bytes = build_zip(&[Fixture::File("a.jpg", b"a")]);

    let first = Ingestor::new(layout.clone())
        .ingest(&bytes, "upload.zip")
        .await
        .unwrap();
    let second = Ingestor::new(layout.clone())
        .ingest(&bytes, "upload.zip")
        .await
        .unwrap();

    assert_ne!(first.session_id, second.session_id);
    assert_eq!(session_count(&layout), 2);
}

#[tokio::test]
async fn staging_file_is_removed_after_ingest() {
    let (_temp, layout) = temp_layout();
    let bytes = build_zip(&[Fixture::File("a.jpg", b"a")]);

    Ingestor::new(layout.clone())
        .ingest(&bytes, "upload.zip")
        .await
        .unwrap();

    let leftovers = std::fs::read_dir(layout.staging()).unwrap().count();
    assert_eq!(leftovers, 0);
}
