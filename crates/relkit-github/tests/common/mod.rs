#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mockall::mock;
use relkit_github::transport::{ApiRequest, ApiResponse, GithubTransport, Method, TransportError};
use serde_json::json;

mock! {
    pub Transport {}

    impl GithubTransport for Transport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
    }
}

pub fn ok_json(status: u16, body: serde_json::Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse::new(status, body.to_string()))
}

/// Contents API response for `record_json`, base64-wrapped like GitHub does.
pub fn contents_response(record_json: &str, sha: &str) -> serde_json::Value {
    let encoded = STANDARD.encode(record_json);
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect::<Vec<_>>()
        .join("\n");
    json!({ "content": wrapped, "sha": sha, "encoding": "base64" })
}

/// In-memory stand-in for the repository contents API, enforcing blob SHA
/// preconditions the way GitHub does.
#[derive(Default)]
pub struct FakeContents {
    files: Mutex<HashMap<String, (String, String)>>,
    revisions: AtomicU64,
}

impl FakeContents {
    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn decoded(&self, path: &str) -> Option<String> {
        let files = self.files.lock().unwrap();
        files
            .get(path)
            .map(|(content, _)| String::from_utf8(STANDARD.decode(content).unwrap()).unwrap())
    }

    fn path_of(url: &str) -> String {
        let without_query = url.split('?').next().unwrap();
        without_query
            .split_once("/contents/")
            .map(|(_, p)| p.to_owned())
            .unwrap()
    }
}

impl GithubTransport for FakeContents {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let path = Self::path_of(&request.url);
        let mut files = self.files.lock().unwrap();

        match request.method {
            Method::Get => Ok(match files.get(&path) {
                Some((content, sha)) => ApiResponse::new(
                    200,
                    json!({ "content": content, "sha": sha }).to_string(),
                ),
                None => ApiResponse::new(404, r#"{"message":"Not Found"}"#),
            }),
            Method::Put => {
                let body = request.json().unwrap();
                let content = body["content"].as_str().unwrap().to_owned();
                let given_sha = body.get("sha").and_then(|s| s.as_str());

                let status = match (files.get(&path), given_sha) {
                    (Some((_, current)), Some(given)) if current == given => 200,
                    (Some(_), Some(_)) => return Ok(ApiResponse::new(409, "sha mismatch")),
                    (Some(_), None) => {
                        return Ok(ApiResponse::new(422, "\"sha\" wasn't supplied"));
                    }
                    (None, Some(_)) => return Ok(ApiResponse::new(409, "no such file")),
                    (None, None) => 201,
                };

                let revision = self.revisions.fetch_add(1, Ordering::SeqCst) + 1;
                let sha = format!("blob{revision}");
                files.insert(path, (content, sha.clone()));
                Ok(ApiResponse::new(
                    status,
                    json!({ "content": { "sha": sha } }).to_string(),
                ))
            }
            other => panic!("unexpected {other} {}", request.url),
        }
    }
}
