//! Lead-capture and upload prompts shown in place of the command prompt.

use std::path::{Path, PathBuf};

use site_contract::LeadRequest;
use site_host::UploadFile;
use thiserror::Error;

/// One question of the lead form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadField {
    /// Contact name.
    Name,
    /// Contact email.
    Email,
    /// Company name.
    Company,
    /// Requested project type.
    ProjectType,
    /// Budget bracket.
    Budget,
}

impl LeadField {
    /// Fields in the order they are asked.
    pub const ALL: [Self; 5] = [
        Self::Name,
        Self::Email,
        Self::Company,
        Self::ProjectType,
        Self::Budget,
    ];

    /// Prompt label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Company => "Company",
            Self::ProjectType => "Project type",
            Self::Budget => "Budget",
        }
    }

    /// Whether an empty answer is re-asked.
    pub const fn required(self) -> bool {
        matches!(self, Self::Name | Self::Email | Self::Company)
    }
}

/// Answer rejected by the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A required field was left empty.
    #[error("{0} is required")]
    Required(&'static str),
}

/// Progress after an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStep {
    /// Ask the next field.
    Next,
    /// Every field is answered.
    Done(LeadRequest),
}

/// Lead form filled one field at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadForm {
    request: LeadRequest,
    step: usize,
}

impl LeadForm {
    /// Starts a form, prefilling the project type with `service`.
    pub fn new(service: Option<String>) -> Self {
        Self {
            request: LeadRequest {
                project_type: service,
                ..LeadRequest::default()
            },
            step: 0,
        }
    }

    /// Field currently asked.
    pub fn field(&self) -> LeadField {
        LeadField::ALL[self.step.min(LeadField::ALL.len() - 1)]
    }

    /// Prompt text for the current field, showing any prefilled default.
    pub fn prompt(&self) -> String {
        let field = self.field();
        match (field, &self.request.project_type) {
            (LeadField::ProjectType, Some(service)) => format!("{} [{service}]: ", field.label()),
            _ => format!("{}: ", field.label()),
        }
    }

    /// Records an answer for the current field.
    pub fn answer(&mut self, raw: &str) -> Result<FormStep, FormError> {
        let field = self.field();
        let value = Some(raw.trim().to_string()).filter(|value| !value.is_empty());
        if value.is_none() && field.required() {
            return Err(FormError::Required(field.label()));
        }

        let slot = match field {
            LeadField::Name => &mut self.request.name,
            LeadField::Email => &mut self.request.email,
            LeadField::Company => &mut self.request.company,
            LeadField::ProjectType => &mut self.request.project_type,
            LeadField::Budget => &mut self.request.budget,
        };
        if value.is_some() {
            *slot = value;
        }

        self.step += 1;
        if self.step < LeadField::ALL.len() {
            Ok(FormStep::Next)
        } else {
            Ok(FormStep::Done(self.request.clone()))
        }
    }
}

/// Splits typed upload paths on whitespace; double quotes group paths with spaces.
pub fn split_paths(input: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for ch in input.chars() {
        match ch {
            '"' => quoted = !quoted,
            ch if ch.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                }
            }
            ch => current.push(ch),
        }
    }
    if !current.is_empty() {
        paths.push(PathBuf::from(current));
    }
    paths
}

/// MIME type guessed from the file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("txt" | "log") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Reads the files the user typed; unreadable paths are reported and skipped.
pub async fn read_selected(paths: &[PathBuf]) -> (Vec<UploadFile>, Vec<(PathBuf, std::io::Error)>) {
    let mut files = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        match tokio::fs::read(path).await {
            Ok(bytes) => files.push(UploadFile {
                filename: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "upload".to_string()),
                mime_type: mime_for(path).to_string(),
                bytes,
            }),
            Err(err) => failures.push((path.clone(), err)),
        }
    }
    (files, failures)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lead_form_collects_fields_in_order() {
        let mut form = LeadForm::new(Some("ai".to_string()));
        assert_eq!(form.prompt(), "Name: ");
        assert_eq!(form.answer(" Ada "), Ok(FormStep::Next));
        assert_eq!(form.answer("ada@example.com"), Ok(FormStep::Next));
        assert_eq!(form.field(), LeadField::Company);
        assert_eq!(form.answer(""), Err(FormError::Required("Company")));
        assert_eq!(form.answer("Engines"), Ok(FormStep::Next));
        assert_eq!(form.prompt(), "Project type [ai]: ");
        assert_eq!(form.answer(""), Ok(FormStep::Next));
        assert_eq!(
            form.answer("10k"),
            Ok(FormStep::Done(LeadRequest {
                session_id: None,
                name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                company: Some("Engines".to_string()),
                project_type: Some("ai".to_string()),
                budget: Some("10k".to_string()),
            }))
        );
    }

    #[test]
    fn paths_split_on_whitespace_and_respect_quotes() {
        assert_eq!(
            split_paths(r#"a.txt  "my notes.md" ./b.pdf"#),
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("my notes.md"),
                PathBuf::from("./b.pdf")
            ]
        );
        assert!(split_paths("   ").is_empty());
    }

    #[test]
    fn mime_types_follow_extensions() {
        assert_eq!(mime_for(Path::new("brief.PDF")), "application/pdf");
        assert_eq!(mime_for(Path::new("notes")), "application/octet-stream");
    }

    #[tokio::test]
    async fn missing_files_are_reported_separately() {
        let dir = tempfile::tempdir().expect("tempdir");
        let present = dir.path().join("present.txt");
        tokio::fs::write(&present, b"hi").await.expect("write");
        let missing = dir.path().join("missing.txt");

        let (files, failures) = read_selected(&[present, missing.clone()]).await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "present.txt");
        assert_eq!(files[0].mime_type, "text/plain");
        assert_eq!(files[0].bytes, b"hi".to_vec());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, missing);
    }
}
