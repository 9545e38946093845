//! Context source selection
//!
//! Decides which corpora back a query: the documents uploaded in this session,
//! the backend's pre-indexed external corpus, or both.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which corpora attach to a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    /// Uploaded documents only
    Uploads,
    /// The backend's external corpus only
    External,
    /// Uploaded documents and the external corpus
    Both,
}

impl ContextSource {
    pub fn includes_uploads(self) -> bool {
        matches!(self, ContextSource::Uploads | ContextSource::Both)
    }

    pub fn includes_external(self) -> bool {
        matches!(self, ContextSource::External | ContextSource::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContextSource::Uploads => "uploads",
            ContextSource::External => "external",
            ContextSource::Both => "both",
        }
    }
}

impl fmt::Display for ContextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextSource {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "uploads" | "upload" | "pdf" | "pdfs" => Ok(Self::Uploads),
            "external" | "s3" | "corpus" => Ok(Self::External),
            "both" | "all" => Ok(Self::Both),
            other => Err(Error::Config(format!(
                "Unknown context source '{}'; expected uploads, external or both",
                other
            ))),
        }
    }
}

/// Display tag describing what currently attaches to a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActiveTag {
    Uploads { count: usize },
    ExternalCorpus,
}

impl fmt::Display for ActiveTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveTag::Uploads { count: 1 } => write!(f, "📄 1 PDF"),
            ActiveTag::Uploads { count } => write!(f, "📄 {} PDFs", count),
            ActiveTag::ExternalCorpus => write!(f, "☁ External corpus"),
        }
    }
}

/// Holds the active context source. Switching never validates.
#[derive(Debug, Clone)]
pub struct SourceSelector {
    active: ContextSource,
}

impl SourceSelector {
    pub fn new(initial: ContextSource) -> Self {
        Self { active: initial }
    }

    pub fn active(&self) -> ContextSource {
        self.active
    }

    pub fn select(&mut self, source: ContextSource) {
        self.active = source;
    }

    /// Tags for display only; an empty upload set contributes no tag.
    pub fn active_tags(&self, document_count: usize) -> Vec<ActiveTag> {
        let mut tags = Vec::with_capacity(2);
        if self.active.includes_uploads() && document_count > 0 {
            tags.push(ActiveTag::Uploads {
                count: document_count,
            });
        }
        if self.active.includes_external() {
            tags.push(ActiveTag::ExternalCorpus);
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!("uploads".parse::<ContextSource>().unwrap(), ContextSource::Uploads);
        assert_eq!("S3".parse::<ContextSource>().unwrap(), ContextSource::External);
        assert_eq!(" both ".parse::<ContextSource>().unwrap(), ContextSource::Both);
        assert!("everything".parse::<ContextSource>().is_err());
    }

    #[test]
    fn test_inclusion() {
        assert!(ContextSource::Uploads.includes_uploads());
        assert!(!ContextSource::Uploads.includes_external());
        assert!(!ContextSource::External.includes_uploads());
        assert!(ContextSource::Both.includes_uploads() && ContextSource::Both.includes_external());
    }

    #[test]
    fn test_active_tags() {
        let mut selector = SourceSelector::new(ContextSource::Uploads);
        assert!(selector.active_tags(0).is_empty());
        assert_eq!(selector.active_tags(2), vec![ActiveTag::Uploads { count: 2 }]);

        selector.select(ContextSource::Both);
        assert_eq!(
            selector.active_tags(1),
            vec![ActiveTag::Uploads { count: 1 }, ActiveTag::ExternalCorpus]
        );

        selector.select(ContextSource::External);
        assert_eq!(selector.active_tags(5), vec![ActiveTag::ExternalCorpus]);
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(ActiveTag::Uploads { count: 1 }.to_string(), "📄 1 PDF");
        assert_eq!(ActiveTag::Uploads { count: 3 }.to_string(), "📄 3 PDFs");
    }
}
