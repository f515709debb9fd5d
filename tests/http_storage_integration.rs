//! Integration tests for the HTTP remote store, against a mock server.

use std::sync::Arc;

use files_downloader::{
    FilesDownloader, HttpStorage, MemoryStorage, RecordingProgress, Storage, StorageError,
    TransferError, TransferRequest,
};
use futures_util::TryStreamExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

#[tokio::test]
async fn test_http_exists_follows_head_status() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("HEAD"))
        .and(path("/exports/present.csv"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/exports/gone.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let store = HttpStorage::new(&format!("{}/exports", mock_server.uri())).unwrap();

    assert!(store.exists("present.csv").await.unwrap());
    assert!(!store.exists("gone.csv").await.unwrap());
}

#[tokio::test]
async fn test_http_server_error_is_reported_with_status() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let store = HttpStorage::new(&mock_server.uri()).unwrap();
    let err = store.exists("any.csv").await.unwrap_err();

    assert!(matches!(err, StorageError::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_http_read_stream_returns_body() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/reports/q1.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"id,total\n1,42\n".to_vec()))
        .mount(&mock_server)
        .await;

    let store = HttpStorage::new(&mock_server.uri()).unwrap();
    let chunks: Vec<Vec<u8>> = store
        .read_stream("reports/q1.csv")
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(chunks.concat(), b"id,total\n1,42\n");
}

#[tokio::test]
async fn test_http_remote_full_transfer_into_memory() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    for (file, body) in [("/tmp/test.txt", "first"), ("/tmp2/test.txt", "second")] {
        Mock::given(method("HEAD"))
            .and(path(file))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(file))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;
    }

    let local = Arc::new(MemoryStorage::new());
    let remote = Arc::new(HttpStorage::new(&mock_server.uri()).unwrap());
    let downloader = FilesDownloader::new(local.clone(), remote, Arc::new(RecordingProgress::new()));

    let result = downloader
        .transfer(&TransferRequest::new(["tmp/test.txt", "tmp2/test.txt"], "temp"))
        .await
        .unwrap();

    assert_eq!(result.paths(), ["temp/tmp/test.txt", "temp/tmp2/test.txt"]);
    assert_eq!(local.get("temp/tmp/test.txt").unwrap(), b"first");
    assert_eq!(local.get("temp/tmp2/test.txt").unwrap(), b"second");
}

#[tokio::test]
async fn test_http_remote_missing_file_aborts_transfer() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("HEAD"))
        .and(path("/missing.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let local = Arc::new(MemoryStorage::new());
    let remote = Arc::new(HttpStorage::new(&mock_server.uri()).unwrap());
    let downloader = FilesDownloader::new(local.clone(), remote, Arc::new(RecordingProgress::new()));

    let err = downloader
        .transfer(&TransferRequest::new(["missing.txt"], "temp"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransferError::RemoteFileNotFound { ref identifier } if identifier == "missing.txt"
    ));
    assert!(local.file_paths().is_empty());
}

#[tokio::test]
async fn test_http_directory_exists_probes_trailing_slash() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("HEAD"))
        .and(path("/exports/reports/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/exports/reports"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let store = HttpStorage::new(&format!("{}/exports/", mock_server.uri())).unwrap();

    assert!(store.directory_exists("reports").await.unwrap());
    assert!(store.directory_exists("/reports/").await.unwrap());
    assert!(!store.exists("reports").await.unwrap());
}

#[tokio::test]
async fn test_http_identifiers_with_reserved_characters_fetch_their_own_file() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    for (encoded, body) in [
        ("/reports/q1%23draft.csv", "draft"),
        ("/reports/a%3Fb.csv", "query-looking"),
        ("/reports/100%2520off.csv", "percent"),
        ("/reports/c:report.csv", "colon"),
    ] {
        Mock::given(method("HEAD"))
            .and(path(encoded))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(encoded))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;
    }
    // Anything else, such as the truncated `/reports/q1`, is a different file.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("wrong file"))
        .mount(&mock_server)
        .await;

    let local = Arc::new(MemoryStorage::new());
    let remote = Arc::new(HttpStorage::new(&mock_server.uri()).unwrap());
    let downloader = FilesDownloader::new(local.clone(), remote, Arc::new(RecordingProgress::new()));

    let files = [
        "reports/q1#draft.csv",
        "reports/a?b.csv",
        "reports/100%20off.csv",
        "reports/c:report.csv",
    ];
    downloader
        .transfer(&TransferRequest::new(files, "temp"))
        .await
        .unwrap();

    assert_eq!(local.get("temp/reports/q1#draft.csv").unwrap(), b"draft");
    assert_eq!(local.get("temp/reports/a?b.csv").unwrap(), b"query-looking");
    assert_eq!(local.get("temp/reports/100%20off.csv").unwrap(), b"percent");
    assert_eq!(local.get("temp/reports/c:report.csv").unwrap(), b"colon");
}
