//! REST client for the screening backend.
//!
//! Five calls, no retries, no timeouts: whatever goes wrong is handed straight
//! back to the screen that asked, with the server's `detail` message when it
//! sent one.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{RecordId, Role, RoleSummary, ScreeningResult};

pub const LIST_ROLES_FAILED: &str = "Failed to fetch roles";
pub const CREATE_ROLE_FAILED: &str = "Failed to create role";
pub const ROLE_DETAILS_FAILED: &str = "Failed to fetch role details";
pub const ROLE_RESULTS_FAILED: &str = "Failed to fetch results";
pub const UPLOAD_FAILED: &str = "Failed to upload resume";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status. The message is the server's `detail` or the per-call fallback.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response from server: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Server returned no {0}")]
    Empty(&'static str),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the screens need from the backend.
#[async_trait]
pub trait ScreeningApi: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<RoleSummary>, ApiError>;

    /// Create a role. `guidance` is sent as `old_rubric`, which is what makes
    /// the backend generate a rubric for the new description.
    async fn create_role(
        &self,
        title: &str,
        description: &str,
        guidance: Option<&str>,
    ) -> Result<Role, ApiError>;

    async fn get_role_details(&self, role_id: &RecordId) -> Result<Role, ApiError>;

    async fn get_role_results(&self, role_id: &RecordId)
        -> Result<Vec<ScreeningResult>, ApiError>;

    async fn upload_resume(
        &self,
        role_id: &RecordId,
        path: &Path,
    ) -> Result<ScreeningResult, ApiError>;
}

/// `reqwest` implementation of [`ScreeningApi`].
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the backend origin, e.g. `http://localhost:8000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), fallback, "backend rejected request");
        }
        decode_response(status, &body, fallback)
    }
}

#[async_trait]
impl ScreeningApi for ApiClient {
    async fn list_roles(&self) -> Result<Vec<RoleSummary>, ApiError> {
        let url = self.url("/roles");
        info!(url = %url, "listing roles");
        let roles: Vec<RoleSummary> = self.fetch(self.client.get(&url), LIST_ROLES_FAILED).await?;
        info!(count = roles.len(), "fetched roles");
        Ok(roles)
    }

    async fn create_role(
        &self,
        title: &str,
        description: &str,
        guidance: Option<&str>,
    ) -> Result<Role, ApiError> {
        let url = self.url("/roles");
        let mut form = Form::new()
            .text("title", title.to_string())
            .text("description", description.to_string());
        if let Some(guidance) = guidance {
            form = form.text("old_rubric", guidance.to_string());
        }

        info!(url = %url, title, "creating role");
        let created: OneOrMany<Role> = self
            .fetch(self.client.post(&url).multipart(form), CREATE_ROLE_FAILED)
            .await?;
        let role = created.into_first().ok_or(ApiError::Empty("role"))?;
        info!(id = %role.id, has_rubric = role.rubric().is_some(), "role created");
        Ok(role)
    }

    async fn get_role_details(&self, role_id: &RecordId) -> Result<Role, ApiError> {
        let url = self.url(&format!("/roles/{}", role_id));
        info!(url = %url, "fetching role");
        self.fetch(self.client.get(&url), ROLE_DETAILS_FAILED).await
    }

    async fn get_role_results(
        &self,
        role_id: &RecordId,
    ) -> Result<Vec<ScreeningResult>, ApiError> {
        let url = self.url(&format!("/roles/{}/results", role_id));
        info!(url = %url, "fetching results");
        let results: Vec<ScreeningResult> =
            self.fetch(self.client.get(&url), ROLE_RESULTS_FAILED).await?;
        info!(count = results.len(), "fetched results");
        Ok(results)
    }

    async fn upload_resume(
        &self,
        role_id: &RecordId,
        path: &Path,
    ) -> Result<ScreeningResult, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
            context: format!("Could not read {}", path.display()),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resume")
            .to_string();

        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(content_type_for(path))?;
        let form = Form::new().part("resume_file", part);

        let url = self.url(&format!("/roles/{}/upload-resume", role_id));
        info!(url = %url, file = %file_name, "uploading resume");
        let created: OneOrMany<ScreeningResult> = self
            .fetch(self.client.post(&url).multipart(form), UPLOAD_FAILED)
            .await?;
        let result = created.into_first().ok_or(ApiError::Empty("result"))?;
        info!(id = %result.id, score = result.score, "resume screened");
        Ok(result)
    }
}

/// Turn a raw response into `T`, or into the error the screens display.
pub fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
    fallback: &str,
) -> Result<T, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Server {
            status: status.as_u16(),
            message: error_message(body, fallback),
        });
    }
    Ok(serde_json::from_slice(body)?)
}

/// The `detail` string of a JSON error body, else `fallback`.
pub fn error_message(body: &[u8], fallback: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<Value>,
    }

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(Value::String(detail)),
        }) if !detail.is_empty() => detail,
        _ => fallback.to_string(),
    }
}

/// Inserts come back from the backend as the list of inserted rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::Many(items) => items.into_iter().next(),
            OneOrMany::One(item) => Some(item),
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn server_detail_becomes_the_message() {
        let err = decode_response::<Role>(
            StatusCode::BAD_REQUEST,
            br#"{"detail":"title required"}"#,
            CREATE_ROLE_FAILED,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "title required");
        assert!(matches!(err, ApiError::Server { status: 400, .. }));
    }

    #[test]
    fn unparsable_error_body_uses_fallback() {
        let err = decode_response::<Vec<RoleSummary>>(
            StatusCode::BAD_GATEWAY,
            b"<html>Bad Gateway</html>",
            LIST_ROLES_FAILED,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch roles");
    }

    #[test]
    fn structured_validation_detail_uses_fallback() {
        let body = br#"{"detail":[{"loc":["body","title"],"msg":"field required"}]}"#;
        assert_eq!(error_message(body, UPLOAD_FAILED), "Failed to upload resume");
    }

    #[test]
    fn success_body_is_decoded() {
        let body = br#"[{"id": 1, "title": "SRE", "created_at": "2024-01-02T03:04:05+00:00"}]"#;
        let roles = assert_ok!(decode_response::<Vec<RoleSummary>>(
            StatusCode::OK,
            body,
            LIST_ROLES_FAILED
        ));
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].title, "SRE");
    }

    #[test]
    fn malformed_success_body_is_a_decode_error() {
        let err = assert_err!(decode_response::<Vec<RoleSummary>>(
            StatusCode::OK,
            b"not json",
            LIST_ROLES_FAILED
        ));
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn inserted_rows_take_the_first() {
        let body = br#"[{"id": 9, "file_name": "a.pdf", "score": 55}]"#;
        let created: OneOrMany<ScreeningResult> =
            assert_ok!(decode_response(StatusCode::CREATED, body, UPLOAD_FAILED));
        assert_eq!(created.into_first().unwrap().id.as_str(), "9");

        let body = br#"{"id": 10, "file_name": "b.pdf", "score": 60}"#;
        let created: OneOrMany<ScreeningResult> =
            assert_ok!(decode_response(StatusCode::CREATED, body, UPLOAD_FAILED));
        assert_eq!(created.into_first().unwrap().id.as_str(), "10");

        let created: OneOrMany<ScreeningResult> =
            assert_ok!(decode_response(StatusCode::CREATED, b"[]", UPLOAD_FAILED));
        assert!(created.into_first().is_none());
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/roles"), "http://localhost:8000/api/roles");
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for(Path::new("cv.PDF")), "application/pdf");
        assert!(content_type_for(Path::new("cv.docx")).contains("wordprocessingml"));
        assert_eq!(
            content_type_for(Path::new("cv.txt")),
            "application/octet-stream"
        );
    }

    /// Serves one canned response on a local port and hands back the raw
    /// request it received.
    async fn one_shot_server(
        status: &'static str,
        body: &'static str,
    ) -> (ApiClient, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            while !request_complete(&request) {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        let client = ApiClient {
            client: Client::builder().no_proxy().build().unwrap(),
            base_url: format!("http://{}", addr),
        };
        (client, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&raw[..end]).to_ascii_lowercase();
        let body_len = raw.len() - end - 4;
        if let Some(len) = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            return body_len >= len;
        }
        if head.contains("transfer-encoding: chunked") {
            return raw.ends_with(b"0\r\n\r\n");
        }
        true
    }

    const ROLE_ROW: &str = r#"[{"id": 9, "title": "SRE", "description": "Keep it up",
        "rubric_text": "1. Ops (100%)", "created_at": "2024-06-01T08:00:00+00:00"}]"#;

    #[tokio::test]
    async fn list_roles_gets_roles_path() {
        let (client, server) = one_shot_server(
            "200 OK",
            r#"[{"id": 1, "title": "SRE", "created_at": "2024-01-02T03:04:05+00:00"}]"#,
        )
        .await;
        let roles = assert_ok!(client.list_roles().await);
        assert_eq!(roles[0].id.as_str(), "1");
        assert!(server.await.unwrap().starts_with("GET /api/roles HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn create_role_posts_multipart_fields() {
        let (client, server) = one_shot_server("200 OK", ROLE_ROW).await;
        let role = assert_ok!(
            client
                .create_role("SRE", "Keep it up", Some("Example rubric"))
                .await
        );
        assert_eq!(role.id.as_str(), "9");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/roles HTTP/1.1\r\n"));
        assert!(request.to_ascii_lowercase().contains("content-type: multipart/form-data"));
        assert!(request.contains("name=\"title\"\r\n\r\nSRE\r\n"));
        assert!(request.contains("name=\"description\"\r\n\r\nKeep it up\r\n"));
        assert!(request.contains("name=\"old_rubric\"\r\n\r\nExample rubric\r\n"));
    }

    #[tokio::test]
    async fn create_role_without_guidance_and_detail_error() {
        let (client, server) =
            one_shot_server("400 Bad Request", r#"{"detail":"title required"}"#).await;
        let err = assert_err!(client.create_role("SRE", "Keep it up", None).await);
        assert_eq!(err.to_string(), "title required");

        let request = server.await.unwrap();
        assert!(request.contains("name=\"title\""));
        assert!(!request.contains("old_rubric"));
    }

    #[tokio::test]
    async fn role_details_path_and_fallback() {
        let (client, server) =
            one_shot_server("500 Internal Server Error", "upstream exploded").await;
        let err = assert_err!(client.get_role_details(&RecordId::new("5")).await);
        assert_eq!(err.to_string(), ROLE_DETAILS_FAILED);
        assert!(server.await.unwrap().starts_with("GET /api/roles/5 HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn role_results_path() {
        let (client, server) = one_shot_server(
            "200 OK",
            r#"[{"id": 3, "file_name": "a.pdf", "score": 70}]"#,
        )
        .await;
        let results = assert_ok!(client.get_role_results(&RecordId::new("5")).await);
        assert_eq!(results[0].file_name, "a.pdf");
        assert!(server
            .await
            .unwrap()
            .starts_with("GET /api/roles/5/results HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn upload_sends_resume_file_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.pdf");
        std::fs::write(&path, b"%PDF-1.4 resume bytes").unwrap();

        let (client, server) = one_shot_server(
            "200 OK",
            r#"[{"id": 11, "file_name": "cv.pdf", "score": 64,
                "evaluation_details": {"pass_fail_status": "Fail"}}]"#,
        )
        .await;
        let result = assert_ok!(client.upload_resume(&RecordId::new("5"), &path).await);
        assert_eq!(result.id.as_str(), "11");
        assert_eq!(result.pass_fail(), "Fail");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/roles/5/upload-resume HTTP/1.1\r\n"));
        assert!(request.contains("name=\"resume_file\"; filename=\"cv.pdf\""));
        assert!(request.to_ascii_lowercase().contains("content-type: application/pdf"));
        assert!(request.contains("%PDF-1.4 resume bytes"));
    }

    #[tokio::test]
    async fn upload_rejection_shows_detail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.txt");
        std::fs::write(&path, b"plain text").unwrap();

        let (client, server) = one_shot_server(
            "400 Bad Request",
            r#"{"detail":"Unsupported file type. Please upload PDF or DOCX."}"#,
        )
        .await;
        let err = assert_err!(client.upload_resume(&RecordId::new("5"), &path).await);
        assert_eq!(
            err.to_string(),
            "Unsupported file type. Please upload PDF or DOCX."
        );
        assert!(server.await.unwrap().contains("filename=\"cv.txt\""));
    }

    #[tokio::test]
    async fn missing_resume_file_is_an_io_error() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client
            .upload_resume(&RecordId::new("1"), Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Io { .. }));
        assert!(err.to_string().starts_with("Could not read"));
    }
}
