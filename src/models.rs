//! Session data model: documents, upload progress, conversation, notices.

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// An ingested source file, held in memory for the session only.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    /// Size of the raw file in bytes
    pub size: u64,
    /// Base64 payload sent to the backend
    #[serde(skip_serializing)]
    pub data: String,
}

impl Document {
    /// Human readable size
    pub fn display_size(&self) -> String {
        format_size(self.size)
    }
}

/// Generate a document id from creation time plus a random suffix
pub fn generate_document_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..9])
}

pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Complete,
}

/// One in-flight file read. Shares its id with the Document it becomes.
#[derive(Debug, Clone, Serialize)]
pub struct UploadProgressEntry {
    pub id: String,
    pub name: String,
    pub status: ProgressStatus,
    pub percent: u8,
}

/// One question and the answers it accumulated.
#[derive(Debug, Clone, Serialize)]
pub struct MessageGroup {
    pub id: u64,
    pub question: String,
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self {
            Severity::Success => "✓",
            Severity::Info => "ℹ",
            Severity::Warning => "⚠",
            Severity::Error => "✗",
        };
        f.write_str(icon)
    }
}

/// The single user-facing message currently shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Backend liveness as last observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum HealthIndicator {
    /// Probe not answered yet
    Checking,
    Online { label: String },
    Offline,
}

impl fmt::Display for HealthIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthIndicator::Checking => write!(f, "… Checking"),
            HealthIndicator::Online { label } => write!(f, "● Online ({})", label),
            HealthIndicator::Offline => write!(f, "○ Offline"),
        }
    }
}
