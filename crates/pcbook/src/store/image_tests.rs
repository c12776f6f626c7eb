// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::FailingSink;

#[tokio::test]
async fn save_links_after_write() -> anyhow::Result<()> {
    let sink = Arc::new(MemorySink::new());
    let store = ImageStore::new(sink.clone());

    let id = store.save("laptop-1", "jpg", Bytes::from_static(b"pixels")).await?;
    let info = store.find(&id).ok_or_else(|| anyhow::anyhow!("image not linked"))?;

    assert_eq!(info.laptop_id, "laptop-1");
    assert_eq!(info.image_type, "jpg");
    assert_eq!(info.path, format!("memory://{id}.jpg"));
    assert_eq!(sink.get(&info.path), Some(Bytes::from_static(b"pixels")));
    assert_eq!(store.images_for("laptop-1"), vec![info]);
    Ok(())
}

#[tokio::test]
async fn failed_write_links_nothing() {
    let store = ImageStore::new(Arc::new(FailingSink));
    let result = store.save("laptop-1", "png", Bytes::from_static(b"pixels")).await;

    assert!(result.is_err());
    assert!(store.images_for("laptop-1").is_empty());
}

#[tokio::test]
async fn disk_sink_writes_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let folder = dir.path().join("img");
    let store = ImageStore::new(Arc::new(DiskSink::new(&folder)));

    let id = store.save("laptop-1", "png", Bytes::from_static(b"\x89PNG")).await?;
    let info = store.find(&id).ok_or_else(|| anyhow::anyhow!("image not linked"))?;

    assert_eq!(info.path, folder.join(format!("{id}.png")).display().to_string());
    assert_eq!(tokio::fs::read(&info.path).await?, b"\x89PNG");
    Ok(())
}

#[tokio::test]
async fn each_save_gets_a_new_id() -> anyhow::Result<()> {
    let store = ImageStore::new(Arc::new(MemorySink::new()));
    let first = store.save("laptop-1", "jpg", Bytes::new()).await?;
    let second = store.save("laptop-1", "jpg", Bytes::new()).await?;

    assert_ne!(first, second);
    assert_eq!(store.images_for("laptop-1").len(), 2);
    Ok(())
}

#[yare::parameterized(
    plain = { "jpg", Some("jpg") },
    dotted = { ".png", Some("png") },
    upper = { ".JPG", Some("JPG") },
    empty = { "", None },
    only_dot = { ".", None },
    traversal = { "../../etc/passwd", None },
    separator = { "png/x", None },
    too_long = { "abcdefghijklmnopq", None },
)]
fn image_type_normalisation(raw: &str, expected: Option<&str>) {
    assert_eq!(normalize_image_type(raw).as_deref(), expected);
}
