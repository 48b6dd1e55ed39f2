//! In-memory [`SiteApi`] used by engine tests and offline demos.

use std::{
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
};

use site_contract::{
    AdminTopic, CommandLogRecord, DashboardSummary, FileSummary, LeadRecord, LeadRequest,
    RecentFile, SessionId, SessionRecord, StatusResponse, TrackCommandRequest, UploadResponse,
};

use crate::api::{AdminCredential, ApiError, SiteApi, SiteApiFuture, UploadFile};

/// Backend operation selector used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    /// [`SiteApi::create_session`].
    CreateSession,
    /// [`SiteApi::track_command`].
    TrackCommand,
    /// [`SiteApi::upload_files`].
    UploadFiles,
    /// [`SiteApi::list_files`].
    ListFiles,
    /// [`SiteApi::file_download_url`].
    FileDownloadUrl,
    /// [`SiteApi::delete_file`].
    DeleteFile,
    /// [`SiteApi::dashboard`].
    Dashboard,
    /// [`SiteApi::admin_login`].
    AdminLogin,
    /// Any admin listing.
    AdminList,
    /// [`SiteApi::create_lead`].
    CreateLead,
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// Session creation.
    CreateSession,
    /// Command telemetry.
    TrackCommand(TrackCommandRequest),
    /// File upload with the uploaded names.
    UploadFiles {
        /// Uploading session.
        session_id: SessionId,
        /// Uploaded file names.
        filenames: Vec<String>,
    },
    /// File listing.
    ListFiles,
    /// Download URL lookup.
    FileDownloadUrl(String),
    /// File deletion.
    DeleteFile(String),
    /// Dashboard summary.
    Dashboard,
    /// Admin password check.
    AdminLogin,
    /// Admin listing.
    AdminList(AdminTopic),
    /// Lead submission.
    CreateLead(LeadRequest),
}

#[derive(Default)]
struct MemoryState {
    calls: Vec<ApiCall>,
    next_session: u64,
    admin_password: Option<String>,
    files: Vec<FileSummary>,
    leads: Vec<LeadRecord>,
    logs: Vec<CommandLogRecord>,
    sessions: Vec<SessionRecord>,
    failures: HashMap<ApiMethod, ApiError>,
}

/// In-memory backend mirroring the server's validation and authorization rules.
#[derive(Clone, Default)]
pub struct MemorySiteApi {
    inner: Rc<RefCell<MemoryState>>,
}

impl MemorySiteApi {
    /// Creates an empty backend with no admin password configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the admin password accepted by admin-scoped calls.
    pub fn with_admin_password(self, password: impl Into<String>) -> Self {
        self.inner.borrow_mut().admin_password = Some(password.into());
        self
    }

    /// Seeds one stored file.
    pub fn push_file(&self, file: FileSummary) {
        self.inner.borrow_mut().files.push(file);
    }

    /// Makes every later call of `method` fail with `error`.
    pub fn fail(&self, method: ApiMethod, error: ApiError) {
        self.inner.borrow_mut().failures.insert(method, error);
    }

    /// Clears injected failures.
    pub fn clear_failures(&self) {
        self.inner.borrow_mut().failures.clear();
    }

    /// Returns every recorded call in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner.borrow().calls.clone()
    }

    /// Returns recorded calls other than command telemetry.
    pub fn non_telemetry_calls(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, ApiCall::TrackCommand(_)))
            .collect()
    }

    /// Returns stored leads.
    pub fn leads(&self) -> Vec<LeadRecord> {
        self.inner.borrow().leads.clone()
    }

    fn record(&self, method: ApiMethod, call: ApiCall) -> Result<(), ApiError> {
        let mut state = self.inner.borrow_mut();
        state.calls.push(call);
        match state.failures.get(&method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn authorize(&self, credential: &AdminCredential) -> Result<(), ApiError> {
        match self.inner.borrow().admin_password.as_deref() {
            Some(password) if password == credential.expose() => Ok(()),
            Some(_) => Err(ApiError::status(401, "admin authorization required")),
            None => Err(ApiError::status(503, "admin access is not configured")),
        }
    }
}

impl SiteApi for MemorySiteApi {
    fn create_session<'a>(&'a self) -> SiteApiFuture<'a, Result<SessionId, ApiError>> {
        Box::pin(async move {
            self.record(ApiMethod::CreateSession, ApiCall::CreateSession)?;
            let mut state = self.inner.borrow_mut();
            state.next_session += 1;
            let session_id = SessionId::new(format!("session-{}", state.next_session));
            let created_at = format!("t{}", state.next_session);
            state.sessions.push(SessionRecord {
                id: session_id.as_str().to_string(),
                created_at,
            });
            Ok(session_id)
        })
    }

    fn track_command<'a>(
        &'a self,
        request: &'a TrackCommandRequest,
    ) -> SiteApiFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.record(ApiMethod::TrackCommand, ApiCall::TrackCommand(request.clone()))?;
            let (Some(session_id), Some(command)) = (&request.session_id, &request.command) else {
                return Err(ApiError::status(400, "invalid session or command"));
            };
            let mut state = self.inner.borrow_mut();
            let id = state.logs.len() as i64 + 1;
            state.logs.push(CommandLogRecord {
                id,
                session_id: session_id.as_str().to_string(),
                command: command.clone(),
                timestamp: format!("t{id}"),
            });
            Ok(())
        })
    }

    fn upload_files<'a>(
        &'a self,
        session_id: &'a SessionId,
        files: &'a [UploadFile],
    ) -> SiteApiFuture<'a, Result<UploadResponse, ApiError>> {
        Box::pin(async move {
            self.record(
                ApiMethod::UploadFiles,
                ApiCall::UploadFiles {
                    session_id: session_id.clone(),
                    filenames: files.iter().map(|file| file.filename.clone()).collect(),
                },
            )?;
            if files.is_empty() {
                return Err(ApiError::status(400, "file required"));
            }
            let mut state = self.inner.borrow_mut();
            for file in files {
                let id = format!("file-{}", state.files.len() + 1);
                state.files.insert(
                    0,
                    FileSummary {
                        id,
                        filename: file.filename.clone(),
                        size: file.bytes.len() as u64,
                        upload_date: String::new(),
                    },
                );
            }
            Ok(UploadResponse {
                status: "uploaded".to_string(),
                count: files.len(),
            })
        })
    }

    fn list_files<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<FileSummary>, ApiError>> {
        Box::pin(async move {
            self.record(ApiMethod::ListFiles, ApiCall::ListFiles)?;
            self.authorize(credential)?;
            Ok(self.inner.borrow().files.clone())
        })
    }

    fn file_download_url<'a>(
        &'a self,
        credential: &'a AdminCredential,
        id: &'a str,
    ) -> SiteApiFuture<'a, Result<String, ApiError>> {
        Box::pin(async move {
            self.record(
                ApiMethod::FileDownloadUrl,
                ApiCall::FileDownloadUrl(id.to_string()),
            )?;
            self.authorize(credential)?;
            let state = self.inner.borrow();
            match state.files.iter().find(|file| file.id == id) {
                Some(file) => Ok(format!("memory://files/{}/{}", file.id, file.filename)),
                None => Err(ApiError::status(404, "File not found")),
            }
        })
    }

    fn delete_file<'a>(
        &'a self,
        credential: &'a AdminCredential,
        id: &'a str,
    ) -> SiteApiFuture<'a, Result<StatusResponse, ApiError>> {
        Box::pin(async move {
            self.record(ApiMethod::DeleteFile, ApiCall::DeleteFile(id.to_string()))?;
            self.authorize(credential)?;
            self.inner.borrow_mut().files.retain(|file| file.id != id);
            Ok(StatusResponse::new("deleted"))
        })
    }

    fn dashboard<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<DashboardSummary, ApiError>> {
        Box::pin(async move {
            self.record(ApiMethod::Dashboard, ApiCall::Dashboard)?;
            self.authorize(credential)?;
            let state = self.inner.borrow();
            Ok(DashboardSummary {
                total_files: state.files.len() as u64,
                total_size: state.files.iter().map(|file| file.size).sum(),
                files: state
                    .files
                    .iter()
                    .take(5)
                    .map(|file| RecentFile {
                        filename: file.filename.clone(),
                        size: file.size,
                    })
                    .collect(),
            })
        })
    }

    fn admin_login<'a>(&'a self, password: &'a str) -> SiteApiFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.record(ApiMethod::AdminLogin, ApiCall::AdminLogin)?;
            self.authorize(&AdminCredential::new(password))
        })
    }

    fn admin_leads<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<LeadRecord>, ApiError>> {
        Box::pin(async move {
            self.record(ApiMethod::AdminList, ApiCall::AdminList(AdminTopic::Leads))?;
            self.authorize(credential)?;
            Ok(self.inner.borrow().leads.iter().rev().cloned().collect())
        })
    }

    fn admin_logs<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<CommandLogRecord>, ApiError>> {
        Box::pin(async move {
            self.record(ApiMethod::AdminList, ApiCall::AdminList(AdminTopic::Logs))?;
            self.authorize(credential)?;
            Ok(self.inner.borrow().logs.iter().rev().cloned().collect())
        })
    }

    fn admin_sessions<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<SessionRecord>, ApiError>> {
        Box::pin(async move {
            self.record(
                ApiMethod::AdminList,
                ApiCall::AdminList(AdminTopic::Sessions),
            )?;
            self.authorize(credential)?;
            Ok(self.inner.borrow().sessions.iter().rev().cloned().collect())
        })
    }

    fn create_lead<'a>(
        &'a self,
        request: &'a LeadRequest,
    ) -> SiteApiFuture<'a, Result<StatusResponse, ApiError>> {
        Box::pin(async move {
            self.record(ApiMethod::CreateLead, ApiCall::CreateLead(request.clone()))?;
            let required = |field: &Option<String>| {
                field
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };
            let (Some(name), Some(email), Some(company)) = (
                required(&request.name),
                required(&request.email),
                required(&request.company),
            ) else {
                return Err(ApiError::status(
                    400,
                    "Name, email, and company are required",
                ));
            };
            let mut state = self.inner.borrow_mut();
            let id = state.leads.len() as i64 + 1;
            state.leads.push(LeadRecord {
                id,
                session_id: request
                    .session_id
                    .as_ref()
                    .map(|session| session.as_str().to_string()),
                name,
                email,
                company,
                project_type: request.project_type.clone(),
                budget: request.budget.clone(),
                created_at: format!("t{id}"),
            });
            Ok(StatusResponse::new("lead captured"))
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn admin_calls_require_matching_credential() {
        let api = MemorySiteApi::new().with_admin_password("pw");
        let err = block_on(api.list_files(&AdminCredential::new("nope"))).expect_err("denied");
        assert_eq!(err.status_code(), Some(401));
        assert!(block_on(api.list_files(&AdminCredential::new("pw"))).is_ok());
    }

    #[test]
    fn unconfigured_admin_is_unavailable() {
        let api = MemorySiteApi::new();
        let err = block_on(api.admin_login("pw")).expect_err("unconfigured");
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn leads_require_name_email_company_only() {
        let api = MemorySiteApi::new();
        let ok = LeadRequest {
            name: Some("A".into()),
            email: Some("a@b.com".into()),
            company: Some("C".into()),
            ..LeadRequest::default()
        };
        block_on(api.create_lead(&ok)).expect("accepted");

        let missing_company = LeadRequest {
            company: None,
            ..ok
        };
        let err = block_on(api.create_lead(&missing_company)).expect_err("rejected");
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(api.leads().len(), 1);
    }

    #[test]
    fn injected_failures_still_record_the_call() {
        let api = MemorySiteApi::new();
        api.fail(ApiMethod::CreateSession, ApiError::Transport("down".into()));
        assert!(block_on(api.create_session()).is_err());
        assert_eq!(api.calls(), vec![ApiCall::CreateSession]);

        api.clear_failures();
        assert_eq!(
            block_on(api.create_session()).expect("session"),
            SessionId::new("session-1")
        );
    }
}
