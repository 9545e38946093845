//! Supported-format detection and display-name helpers

use super::FileBlob;
use crate::config::IngestConfig;
use std::path::Path;
use unicode_segmentation::UnicodeSegmentation;

/// Decides whether a blob is the supported document format.
#[derive(Debug, Clone)]
pub struct FormatFilter {
    extensions: Vec<String>,
    media_types: Vec<String>,
}

impl FormatFilter {
    pub fn new(extensions: &[String], media_types: &[String]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            media_types: media_types.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(&config.accepted_extensions, &config.accepted_media_types)
    }

    /// Media type takes precedence; the extension is the fallback.
    pub fn accepts(&self, blob: &FileBlob) -> bool {
        if let Some(mime) = blob.media_type.as_deref() {
            if self.accepts_media_type(mime) {
                return true;
            }
        }
        self.accepts_name(&blob.name)
    }

    pub fn accepts_media_type(&self, mime: &str) -> bool {
        // Drop parameters such as "; charset=binary"
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        self.media_types.iter().any(|m| *m == essence)
    }

    pub fn accepts_name(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }

    /// Notice shown when a batch has nothing this filter accepts
    pub fn rejection_message(&self) -> String {
        let labels: Vec<String> = if self.extensions.is_empty() {
            self.media_types.clone()
        } else {
            self.extensions.iter().map(|e| e.to_uppercase()).collect()
        };

        let listed = match labels.split_last() {
            None => return "Unsupported file type".to_string(),
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        };
        format!("Only {} files are supported", listed)
    }
}

/// Shorten a file name to `max` graphemes, marking the cut with "..."
pub fn truncate_display_name(name: &str, max: usize) -> String {
    let graphemes: Vec<&str> = name.graphemes(true).collect();
    if graphemes.len() <= max {
        return name.to_string();
    }
    let mut short: String = graphemes[..max].concat();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_filter() -> FormatFilter {
        FormatFilter::new(&["pdf".to_string()], &["application/pdf".to_string()])
    }

    #[test]
    fn test_rejection_message_follows_filter() {
        assert_eq!(pdf_filter().rejection_message(), "Only PDF files are supported");

        let several = FormatFilter::new(
            &["pdf".to_string(), ".epub".to_string(), "djvu".to_string()],
            &[],
        );
        assert_eq!(
            several.rejection_message(),
            "Only PDF, EPUB or DJVU files are supported"
        );

        let by_media_type = FormatFilter::new(&[], &["application/pdf".to_string()]);
        assert_eq!(
            by_media_type.rejection_message(),
            "Only application/pdf files are supported"
        );
    }

    #[test]
    fn test_extension_detection() {
        let filter = pdf_filter();
        assert!(filter.accepts_name("paper.pdf"));
        assert!(filter.accepts_name("PAPER.PDF"));
        assert!(!filter.accepts_name("notes.txt"));
        assert!(!filter.accepts_name("pdf"));
        assert!(!filter.accepts_name("archive.pdf.zip"));
    }

    #[test]
    fn test_media_type_detection() {
        let filter = pdf_filter();
        assert!(filter.accepts_media_type("application/pdf"));
        assert!(filter.accepts_media_type("Application/PDF; charset=binary"));
        assert!(!filter.accepts_media_type("text/plain"));
    }

    #[test]
    fn test_declared_type_or_extension() {
        let filter = pdf_filter();
        let no_ext = FileBlob::from_bytes("download", Some("application/pdf"), vec![1]);
        assert!(filter.accepts(&no_ext));

        let wrong_type = FileBlob::from_bytes("scan.pdf", Some("application/octet-stream"), vec![1]);
        assert!(filter.accepts(&wrong_type));

        let text = FileBlob::from_bytes("b.txt", Some("text/plain"), vec![1]);
        assert!(!filter.accepts(&text));
    }

    #[test]
    fn test_extension_config_tolerates_dot() {
        let filter = FormatFilter::new(&[".PDF".to_string()], &[]);
        assert!(filter.accepts_name("x.pdf"));
    }

    #[test]
    fn test_truncate_display_name() {
        assert_eq!(truncate_display_name("a.pdf", 30), "a.pdf");
        assert_eq!(
            truncate_display_name("a_really_long_conference_paper_name.pdf", 10),
            "a_really_l..."
        );
        // Multi-byte names are cut on grapheme boundaries
        assert_eq!(truncate_display_name("résumé-final.pdf", 6), "résumé...");
    }
}
