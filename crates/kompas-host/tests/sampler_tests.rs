// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end host sampling against a mocked model server.

use kompas_config::model::HostConfig;
use kompas_host::HostSampler;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn sample_combines_every_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [{"name": "llama3:8b", "size": 4_661_224_676_u64}]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let index = dir.path().join("index.json");
    std::fs::write(&index, r#"{"documents": ["x", "y"]}"#).unwrap();

    let config = HostConfig {
        ollama_url: server.uri(),
        vector_index_path: Some(index.display().to_string()),
        ..HostConfig::default()
    };
    let snapshot = HostSampler::from_config(&config).unwrap().sample().await.unwrap();

    assert_eq!(snapshot.ollama.models, vec!["llama3:8b".to_string()]);
    assert_eq!(snapshot.vector_index.doc_count, 2);
    assert!(snapshot.cpu.cores >= 1);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert!(json["ram"]["percent"].is_number());
    assert_eq!(json["ollama"]["status"]["state"], "healthy");
}

#[tokio::test]
async fn broken_index_degrades_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    let index = dir.path().join("index.json");
    std::fs::write(&index, "{{{").unwrap();

    let config = HostConfig {
        ollama_url: "http://127.0.0.1:9".to_string(),
        probe_timeout_secs: 1,
        vector_index_path: Some(index.display().to_string()),
        ..HostConfig::default()
    };
    let snapshot = HostSampler::from_config(&config).unwrap().sample().await.unwrap();
    assert_eq!(snapshot.vector_index.doc_count, 0);
    assert_eq!(snapshot.ollama.model_count, 0);
}
