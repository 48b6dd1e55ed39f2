//! `reqwest` implementation of [`SiteApi`].

use reqwest::{header::LOCATION, multipart, Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use site_contract::{
    AdminLoginRequest, AdminTopic, CommandLogRecord, CreateSessionResponse, DashboardSummary,
    ErrorResponse, FileListResponse, FileSummary, LeadRecord, LeadRequest, SessionId,
    SessionRecord, StatusResponse, TrackCommandRequest, UploadResponse,
};
use site_host::{admin_topic_path, AdminCredential, ApiError, SiteApi, SiteApiFuture, UploadFile};

/// Base URL used when `SITE_API_BASE` is unset.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";

/// HTTP client for the site server API.
///
/// Redirects are not followed so `GET /api/files/:id` can surface its signed URL.
#[derive(Debug, Clone)]
pub struct HttpSiteApi {
    client: Client,
    base: Url,
}

impl HttpSiteApi {
    /// Creates a client rooted at `base` (for example `http://127.0.0.1:8080`).
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base).map_err(|err| ApiError::Transport(err.to_string()))?;
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(transport)?;
        Ok(Self { client, base })
    }

    /// Returns the configured API root.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::Transport(err.to_string()))
    }

    fn file_endpoint(&self, id: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint("/api/files")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport("API base cannot carry a path".to_string()))?
            .push(id);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, "site API request failed");
            return Err(decode_error(status.as_u16(), &body));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn admin_get<T: DeserializeOwned>(
        &self,
        credential: &AdminCredential,
        path: &str,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.send(self.client.get(url).bearer_auth(credential.expose()))
            .await
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

/// Maps a non-success response into [`ApiError::Status`], reading the JSON `{error, detail}`
/// body when the server sent one.
pub fn decode_error(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error, detail }) => ApiError::Status {
            status,
            message: error,
            detail,
        },
        Err(_) => ApiError::status(status, format!("request failed with status {status}")),
    }
}

impl SiteApi for HttpSiteApi {
    fn create_session<'a>(&'a self) -> SiteApiFuture<'a, Result<SessionId, ApiError>> {
        Box::pin(async move {
            let url = self.endpoint("/api/research/session/create")?;
            let response: CreateSessionResponse = self.send(self.client.post(url)).await?;
            Ok(response.session_id)
        })
    }

    fn track_command<'a>(
        &'a self,
        request: &'a TrackCommandRequest,
    ) -> SiteApiFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            let url = self.endpoint("/api/research/behavioral/track")?;
            let _: StatusResponse = self.send(self.client.post(url).json(request)).await?;
            Ok(())
        })
    }

    fn upload_files<'a>(
        &'a self,
        session_id: &'a SessionId,
        files: &'a [UploadFile],
    ) -> SiteApiFuture<'a, Result<UploadResponse, ApiError>> {
        Box::pin(async move {
            let mut form = multipart::Form::new().text("sessionId", session_id.to_string());
            for file in files {
                let part = multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.filename.clone())
                    .mime_str(&file.mime_type)
                    .map_err(transport)?;
                form = form.part("file", part);
            }
            let url = self.endpoint("/api/upload")?;
            self.send(self.client.post(url).multipart(form)).await
        })
    }

    fn list_files<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<FileSummary>, ApiError>> {
        Box::pin(async move {
            let response: FileListResponse = self.admin_get(credential, "/api/files").await?;
            Ok(response.files)
        })
    }

    fn file_download_url<'a>(
        &'a self,
        credential: &'a AdminCredential,
        id: &'a str,
    ) -> SiteApiFuture<'a, Result<String, ApiError>> {
        Box::pin(async move {
            let url = self.file_endpoint(id)?;
            let response = self
                .client
                .get(url)
                .bearer_auth(credential.expose())
                .send()
                .await
                .map_err(transport)?;
            let status = response.status();
            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| ApiError::Decode("redirect without location".to_string()))?;
                let resolved = self
                    .base
                    .join(location)
                    .map_err(|err| ApiError::Decode(err.to_string()))?;
                return Ok(resolved.to_string());
            }
            let body = response.text().await.unwrap_or_default();
            if status.is_success() {
                return Err(ApiError::Decode("expected a redirect".to_string()));
            }
            Err(decode_error(status.as_u16(), &body))
        })
    }

    fn delete_file<'a>(
        &'a self,
        credential: &'a AdminCredential,
        id: &'a str,
    ) -> SiteApiFuture<'a, Result<StatusResponse, ApiError>> {
        Box::pin(async move {
            let url = self.file_endpoint(id)?;
            self.send(self.client.delete(url).bearer_auth(credential.expose()))
                .await
        })
    }

    fn dashboard<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<DashboardSummary, ApiError>> {
        Box::pin(async move { self.admin_get(credential, "/api/dashboard").await })
    }

    fn admin_login<'a>(&'a self, password: &'a str) -> SiteApiFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            let url = self.endpoint("/api/admin/login")?;
            let body = AdminLoginRequest {
                password: password.to_string(),
            };
            let _: StatusResponse = self.send(self.client.post(url).json(&body)).await?;
            Ok(())
        })
    }

    fn admin_leads<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<LeadRecord>, ApiError>> {
        Box::pin(async move {
            self.admin_get(credential, &admin_topic_path(AdminTopic::Leads))
                .await
        })
    }

    fn admin_logs<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<CommandLogRecord>, ApiError>> {
        Box::pin(async move {
            self.admin_get(credential, &admin_topic_path(AdminTopic::Logs))
                .await
        })
    }

    fn admin_sessions<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<SessionRecord>, ApiError>> {
        Box::pin(async move {
            self.admin_get(credential, &admin_topic_path(AdminTopic::Sessions))
                .await
        })
    }

    fn create_lead<'a>(
        &'a self,
        request: &'a LeadRequest,
    ) -> SiteApiFuture<'a, Result<StatusResponse, ApiError>> {
        Box::pin(async move {
            let url = self.endpoint("/api/leads")?;
            self.send(self.client.post(url).json(request)).await
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn decode_error_reads_server_body() {
        let err = decode_error(500, r#"{"error":"failed to delete file","detail":"io"}"#);
        assert_eq!(
            err,
            ApiError::Status {
                status: 500,
                message: "failed to delete file".to_string(),
                detail: Some("io".to_string()),
            }
        );
    }

    #[test]
    fn decode_error_falls_back_for_plain_bodies() {
        let err = decode_error(502, "<html>bad gateway</html>");
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.user_message(), "request failed with status 502");
    }

    #[test]
    fn file_ids_are_encoded_as_one_path_segment() {
        let api = HttpSiteApi::new(DEFAULT_API_BASE).expect("client");
        let url = api.file_endpoint("a/b?c").expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/files/a%2Fb%3Fc");
    }

    #[test]
    fn rejects_unparseable_base() {
        let err = HttpSiteApi::new("not a url").expect_err("invalid base");
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
