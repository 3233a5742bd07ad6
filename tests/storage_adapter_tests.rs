mod test_data_gen;

use rangeline_core::config::{ReaderConfig, StorageConfig};
use rangeline_io::{
    build_store_from_config, FsObjectStore, ObjectLocation, RangedRecordReader, RemoteObjectStore,
};
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use test_data_gen::generate_content;

fn temp_object(name: &str, content: &[u8]) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("rangeline-storage-tests-{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("input.txt");
    fs::write(&path, content).expect("write object");
    path
}

#[test]
fn test_file_store_serves_inclusive_ranges() {
    let path = temp_object("ranges", b"0123456789");
    let bucket = path.parent().unwrap().to_string_lossy().to_string();
    let store = FsObjectStore::new();

    assert_eq!(store.size(&bucket, "input.txt").unwrap(), 10);
    let mut buf = Vec::new();
    store
        .fetch_range(&bucket, "input.txt", 3, 6)
        .unwrap()
        .read_to_end(&mut buf)
        .unwrap();
    assert_eq!(buf, b"3456");
}

#[test]
fn test_file_store_reader_pass() {
    let content = generate_content(11, 2_000, "\r\n");
    let path = temp_object("pass", content.as_bytes());
    let bucket = path.parent().unwrap().to_string_lossy().to_string();

    let mut reader = RangedRecordReader::new(
        Arc::new(FsObjectStore::new()),
        bucket,
        "input.txt",
        rangeline_io::ReaderOptions {
            chunk_size: 37,
            delimiter: "\r\n".try_into().unwrap(),
            lossy_utf8: false,
        },
    )
    .unwrap();
    let texts: Vec<String> = reader
        .records(None)
        .unwrap()
        .map(|r| r.unwrap().text)
        .collect();
    assert_eq!(texts.join("\r\n"), content);
    assert_eq!(reader.stats().bytes_fetched, content.len() as u64);
}

#[test]
fn test_open_file_uri() {
    let path = temp_object("open", b"alpha|beta|gamma");
    let uri = format!("file://{}", path.display());
    let location = ObjectLocation::parse(&uri).expect("file uri");
    let cfg = ReaderConfig {
        chunk_size: 4,
        delimiter: "|".into(),
        ..Default::default()
    };
    let mut reader = RangedRecordReader::open(&location, &cfg).expect("file store");
    let texts: Vec<String> = reader
        .records(None)
        .unwrap()
        .map(|r| r.unwrap().text)
        .collect();
    assert_eq!(texts, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn test_missing_file_is_not_found() {
    let path = temp_object("missing", b"");
    let location = ObjectLocation::parse(&path.with_file_name("absent.txt").to_string_lossy())
        .expect("bare path");
    let mut reader = RangedRecordReader::open(&location, &ReaderConfig::default()).unwrap();
    let err = reader.records(None).unwrap().next().unwrap().unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_invalid_scheme_errors() {
    let location = ObjectLocation {
        scheme: "ftp".into(),
        account: None,
        bucket: "example.com".into(),
        key: "data.txt".into(),
    };
    let err = build_store_from_config(&location, &StorageConfig::default())
        .err()
        .expect("should fail");
    assert!(err.to_string().contains("unsupported object scheme"));
}

#[cfg(not(feature = "s3"))]
#[test]
fn test_s3_without_feature_fails() {
    let location = ObjectLocation::parse("s3://dummy/test.log").unwrap();
    let cfg = StorageConfig {
        aws_region: Some("us-east-1".into()),
        ..Default::default()
    };
    let err = build_store_from_config(&location, &cfg)
        .err()
        .expect("feature missing");
    assert!(err
        .to_string()
        .contains("rangeline was built without the `s3` feature"));
}

#[cfg(feature = "s3")]
#[test]
fn test_s3_builder_initializes_with_dummy_credentials() {
    let location = ObjectLocation::parse("s3://dummy-bucket/tests/input.log").unwrap();
    let cfg = StorageConfig {
        aws_region: Some("us-east-1".into()),
        aws_access_key_id: Some("ACCESSKEY123".into()),
        aws_secret_access_key: Some("SECRETKEY456".into()),
        ..Default::default()
    };
    build_store_from_config(&location, &cfg).expect("s3 store builds");
}
