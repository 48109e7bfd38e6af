//! Shared helpers for figma-icon-export integration tests

use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use figma_icon_export::Config;

/// Token the mock API accepts
pub const TEST_TOKEN: &str = "figd_test_token";

/// File key served by the mock API
pub const TEST_FILE_ID: &str = "FILE123";

/// Body served for every rendered icon
pub const ICON_BODY: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\"/>";

/// Document JSON with one page holding the given `(id, name)` leaves
pub fn document_json(page: &str, icons: &[(&str, &str)]) -> Value {
    let children: Vec<Value> = icons
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name, "type": "COMPONENT" }))
        .collect();
    json!({
        "name": "Design system",
        "document": {
            "id": "0:0",
            "name": "Document",
            "type": "DOCUMENT",
            "children": [
                { "id": "1:0", "name": page, "type": "CANVAS", "children": children }
            ]
        }
    })
}

/// Start a server acting as both the Figma API and the image CDN
///
/// Every id in `icons` renders to `{server}/cdn/{n}.svg`.
pub async fn start_figma(page: &str, icons: &[(&str, &str)]) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/files/{TEST_FILE_ID}")))
        .and(header("X-Figma-Token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json(page, icons)))
        .mount(&server)
        .await;

    let images: serde_json::Map<String, Value> = icons
        .iter()
        .enumerate()
        .map(|(n, (id, _))| (id.to_string(), json!(format!("{}/cdn/{n}.svg", server.uri()))))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/v1/images/{TEST_FILE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "err": null, "images": images })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/cdn/\d+\.svg$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ICON_BODY))
        .mount(&server)
        .await;

    server
}

/// Config pointing at the mock server, writing into `temp`
pub fn test_config(server: &MockServer, temp: &TempDir, page: &str) -> Config {
    Config {
        figma_personal_token: Some(TEST_TOKEN.to_string()),
        file_id: TEST_FILE_ID.to_string(),
        page: Some(page.to_string()),
        icons_path: temp.path().join("icons"),
        meta_path: temp.path().join("meta"),
        api_base_url: format!("{}/v1", server.uri()),
        ..Default::default()
    }
}

/// Sorted file names directly inside `dir`
#[allow(dead_code)]
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read output dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
