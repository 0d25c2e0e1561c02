//! HTTP-level tests for `ApiClient` against a local mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use setu_core::{ApiClient, ClientConfig, Credentials, EsignError, PDF_MIME_TYPE, PdfFile};
use wiremock::matchers::{body_json, body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn creds() -> Credentials {
    Credentials::new("a", "b", "c")
}

fn pdf() -> PdfFile {
    PdfFile::new("contract.pdf", PDF_MIME_TYPE, b"%PDF-1.7 test".to_vec())
}

fn client_for(server: &MockServer) -> ApiClient {
    let config = ClientConfig::default().with_base_url(format!("{}/api", server.uri()));
    ApiClient::with_config(config).unwrap()
}

fn incomplete() -> Vec<Credentials> {
    vec![
        Credentials::new("", "b", "c"),
        Credentials::new("a", "", "c"),
        Credentials::new("a", "b", ""),
    ]
}

// ── Upload ───────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_sends_multipart_with_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents"))
        .and(header("x-client-id", "a"))
        .and(header("x-client-secret", "b"))
        .and(header("x-product-instance-id", "c"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"file\"; filename=\"contract.pdf\""))
        .and(body_string_contains("%PDF-1.7 test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documentId": "doc_123"})))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client_for(&server)
        .upload_document(&pdf(), &creds())
        .await
        .unwrap();
    assert_eq!(doc.document_id, "doc_123");
}

#[tokio::test]
async fn upload_non_2xx_is_upload_error_with_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .upload_document(&pdf(), &creds())
        .await
        .unwrap_err();

    assert!(matches!(err, EsignError::Upload(_)));
    let message = err.to_string();
    assert!(message.contains("401"), "{message}");
    assert!(message.contains("unauthorized"), "{message}");
    assert_eq!(
        message,
        "Document upload failed: 401 Unauthorized - unauthorized"
    );
}

#[tokio::test]
async fn upload_without_document_id_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .upload_document(&pdf(), &creds())
        .await
        .unwrap_err();
    assert!(matches!(err, EsignError::Decode(_)));
}

// ── Signature ────────────────────────────────────────────────────────

#[tokio::test]
async fn initiate_posts_document_id_and_options_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/signature"))
        .and(header("content-type", "application/json"))
        .and(header("x-product-instance-id", "c"))
        .and(body_json(json!({"documentId": "doc_1", "redirectUrl": "https://example.com/done"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signatureId": "sig_1",
            "signatureUrl": "https://esign/sig_1",
            "status": "created"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut options = serde_json::Map::new();
    options.insert("redirectUrl".to_owned(), json!("https://example.com/done"));

    let sig = client_for(&server)
        .initiate_signature("doc_1", &creds(), Some(&options))
        .await
        .unwrap();
    assert_eq!(sig.signature_id, "sig_1");
    assert_eq!(sig.signature_url(), Some("https://esign/sig_1"));
    assert_eq!(sig.status(), Some("created"));
}

#[tokio::test]
async fn initiate_option_can_override_document_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/signature"))
        .and(body_json(json!({"documentId": "doc_override"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"signatureId": "sig_9"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut options = serde_json::Map::new();
    options.insert("documentId".to_owned(), json!("doc_override"));
    client_for(&server)
        .initiate_signature("doc_1", &creds(), Some(&options))
        .await
        .unwrap();
}

#[tokio::test]
async fn initiate_non_2xx_is_signature_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/signature"))
        .respond_with(ResponseTemplate::new(422).set_body_string("{\"error\":\"bad document\"}"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .initiate_signature("doc_1", &creds(), None)
        .await
        .unwrap_err();
    let failure = err.http_failure().unwrap();
    assert!(matches!(err, EsignError::Signature(_)));
    assert_eq!(failure.status, 422);
    assert_eq!(failure.body, "{\"error\":\"bad document\"}");
    assert!(err.to_string().starts_with("Signature initiation failed: 422"));
}

// ── Status ───────────────────────────────────────────────────────────

#[tokio::test]
async fn status_gets_per_signature_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/signature/sig_1/status"))
        .and(header("x-client-id", "a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .expect(1)
        .mount(&server)
        .await;

    let update = client_for(&server)
        .get_signature_status("sig_1", &creds())
        .await
        .unwrap();
    assert_eq!(update.status(), Some("pending"));
}

#[tokio::test]
async fn status_non_2xx_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/signature/sig_404/status"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_signature_status("sig_404", &creds())
        .await
        .unwrap_err();
    assert!(matches!(err, EsignError::Status(_)));
    assert_eq!(
        err.to_string(),
        "Status fetch failed: 404 Not Found - not found"
    );
}

// ── Validation before network ────────────────────────────────────────

#[tokio::test]
async fn incomplete_credentials_never_reach_the_network() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let client = client_for(&server);

    for bad in incomplete() {
        let err = client.upload_document(&pdf(), &bad).await.unwrap_err();
        assert!(matches!(err, EsignError::Validation(_)), "{err}");

        let err = client.initiate_signature("doc_1", &bad, None).await.unwrap_err();
        assert!(matches!(err, EsignError::Validation(_)), "{err}");

        let err = client.get_signature_status("sig_1", &bad).await.unwrap_err();
        assert!(matches!(err, EsignError::Validation(_)), "{err}");
    }
}

#[tokio::test]
async fn empty_ids_are_rejected_before_the_network() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let err = client.initiate_signature("", &creds(), None).await.unwrap_err();
    assert_eq!(err.to_string(), "Document ID and credentials are required");

    let err = client.get_signature_status(" ", &creds()).await.unwrap_err();
    assert_eq!(err.to_string(), "Signature ID and credentials are required");
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let config = ClientConfig::default().with_base_url("http://127.0.0.1:1/api");
    let client = ApiClient::with_config(config).unwrap();
    let err = client
        .get_signature_status("sig_1", &creds())
        .await
        .unwrap_err();
    assert!(matches!(err, EsignError::Network(_)));
}
