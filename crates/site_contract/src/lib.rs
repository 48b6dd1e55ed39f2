//! Shared wire contracts used by the site server, the host adapters, and the terminal engine.
//!
//! This crate is intentionally runtime-agnostic. It defines serializable session identifiers,
//! terminal output lines, and the request/response payloads of the site HTTP API without
//! depending on any HTTP stack, async runtime, or storage backend.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use serde::{Deserialize, Serialize};

/// Opaque per-visitor session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session identifier from trusted caller input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render category for one terminal scrollback line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineKind {
    /// Line played by the boot sequence.
    Boot,
    /// Echo of a submitted command.
    Command,
    /// Regular command output.
    Output,
    /// Error or usage message.
    Error,
    /// Confirmation of a completed side effect.
    Success,
}

impl LineKind {
    /// Returns a stable token for styling and diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Command => "command",
            Self::Output => "output",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

/// One rendered terminal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    /// Render category.
    pub kind: LineKind,
    /// Line text without a trailing newline.
    pub text: String,
}

impl OutputLine {
    /// Creates a line of the given kind.
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Creates an `output` line.
    pub fn output(text: impl Into<String>) -> Self {
        Self::new(LineKind::Output, text)
    }

    /// Creates an `error` line.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(LineKind::Error, text)
    }

    /// Creates a `success` line.
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(LineKind::Success, text)
    }
}

/// Response of `POST /api/research/session/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    /// Newly created session identifier.
    pub session_id: SessionId,
}

/// Body of `POST /api/research/behavioral/track`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackCommandRequest {
    /// Session that produced the command.
    pub session_id: Option<SessionId>,
    /// Command token as resolved by the terminal.
    pub command: Option<String>,
}

/// Generic `{status}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Short machine-friendly status word.
    pub status: String,
}

impl StatusResponse {
    /// Creates a status response.
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// JSON error body returned by every failing API route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Optional upstream detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Response of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Status word, `uploaded` on success.
    pub status: String,
    /// Number of stored files.
    pub count: usize,
}

/// One row of `GET /api/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// File record identifier.
    pub id: String,
    /// Original client file name.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Upload timestamp (RFC 3339, UTC).
    pub upload_date: String,
}

/// Response of `GET /api/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListResponse {
    /// Files ordered newest first.
    pub files: Vec<FileSummary>,
}

/// Short file entry listed by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFile {
    /// Original client file name.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
}

/// Response of `GET /api/dashboard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Total number of stored files.
    pub total_files: u64,
    /// Sum of stored file sizes in bytes.
    pub total_size: u64,
    /// Most recent uploads, newest first.
    pub files: Vec<RecentFile>,
}

/// Body of `POST /api/leads`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRequest {
    /// Session that submitted the lead, when known.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// Contact name (required).
    #[serde(default)]
    pub name: Option<String>,
    /// Contact email (required).
    #[serde(default)]
    pub email: Option<String>,
    /// Company name (required).
    #[serde(default)]
    pub company: Option<String>,
    /// Requested project type.
    #[serde(default)]
    pub project_type: Option<String>,
    /// Budget bracket.
    #[serde(default)]
    pub budget: Option<String>,
}

/// Body of `POST /api/admin/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminLoginRequest {
    /// Candidate admin password.
    pub password: String,
}

/// Stored lead as returned by `GET /api/admin/leads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    /// Row identifier.
    pub id: i64,
    /// Submitting session, when known.
    pub session_id: Option<String>,
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Company name.
    pub company: String,
    /// Requested project type.
    pub project_type: Option<String>,
    /// Budget bracket.
    pub budget: Option<String>,
    /// Creation timestamp (RFC 3339, UTC).
    pub created_at: String,
}

/// Tracked command as returned by `GET /api/admin/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLogRecord {
    /// Row identifier.
    pub id: i64,
    /// Session that produced the command.
    pub session_id: String,
    /// Command token.
    pub command: String,
    /// Tracking timestamp (RFC 3339, UTC).
    pub timestamp: String,
}

/// Session row as returned by `GET /api/admin/sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier.
    pub id: String,
    /// Creation timestamp (RFC 3339, UTC).
    pub created_at: String,
}

/// Admin listing selected by `admin <topic>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminTopic {
    /// Captured leads.
    Leads,
    /// Tracked commands.
    Logs,
    /// Known sessions.
    Sessions,
}

impl AdminTopic {
    /// Every topic in menu order.
    pub const ALL: [Self; 3] = [Self::Leads, Self::Logs, Self::Sessions];

    /// Parses a lowercase subcommand token.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "leads" => Some(Self::Leads),
            "logs" => Some(Self::Logs),
            "sessions" => Some(Self::Sessions),
            _ => None,
        }
    }

    /// Returns the path segment used by `GET /api/admin/{topic}`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leads => "leads",
            Self::Logs => "logs",
            Self::Sessions => "sessions",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lead_request_uses_camel_case_and_tolerates_missing_fields() {
        let request: LeadRequest = serde_json::from_value(json!({
            "sessionId": "s-1",
            "name": "A",
            "email": "a@b.com",
            "company": "C",
        }))
        .expect("decode lead");
        assert_eq!(request.session_id, Some(SessionId::new("s-1")));
        assert_eq!(request.project_type, None);
        assert_eq!(request.budget, None);

        let value = serde_json::to_value(LeadRequest {
            project_type: Some("ai".to_string()),
            ..request
        })
        .expect("encode lead");
        assert_eq!(value.get("projectType"), Some(&json!("ai")));
    }

    #[test]
    fn error_response_omits_missing_detail() {
        let value = serde_json::to_value(ErrorResponse {
            error: "boom".to_string(),
            detail: None,
        })
        .expect("encode");
        assert_eq!(value, json!({"error": "boom"}));
    }

    #[test]
    fn session_id_is_transparent_on_the_wire() {
        let value = serde_json::to_value(CreateSessionResponse {
            session_id: SessionId::new("abc"),
        })
        .expect("encode");
        assert_eq!(value, json!({"sessionId": "abc"}));
    }

    #[test]
    fn admin_topic_parses_known_tokens_only() {
        assert_eq!(AdminTopic::parse("logs"), Some(AdminTopic::Logs));
        assert_eq!(AdminTopic::parse("LOGS"), None);
        assert_eq!(AdminTopic::parse("users"), None);
    }
}
