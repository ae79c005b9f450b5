//! Accepted upload kinds and filename hygiene.

use std::fmt;
use std::path::Path;

use thiserror::Error;

const PHOTO_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];
const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf"];

/// What an upload endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Meal photos for the photo analysis table.
    Photo,
    /// Medical reports, PDF only.
    Document,
}

impl UploadKind {
    /// Accepted extensions, lowercase with the leading dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Photo => PHOTO_EXTENSIONS,
            Self::Document => DOCUMENT_EXTENSIONS,
        }
    }

    /// Check a client-supplied filename against the accepted extensions.
    pub fn check(&self, filename: &str) -> Result<(), UnsupportedFormat> {
        let ext = extension_of(filename);
        if self.extensions().contains(&ext.as_str()) {
            Ok(())
        } else {
            Err(UnsupportedFormat {
                allowed: self.extensions(),
            })
        }
    }
}

/// Rejected upload extension.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported file format. Use: {}", ExtensionList(.allowed))]
pub struct UnsupportedFormat {
    pub allowed: &'static [&'static str],
}

/// Renders `['.jpg', '.png']`.
struct ExtensionList<'a>(&'a [&'a str]);

impl fmt::Display for ExtensionList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.0.iter().map(|e| format!("'{}'", e)).collect();
        write!(f, "[{}]", quoted.join(", "))
    }
}

/// Lowercased extension with its dot, or `""`.
fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Reduce a client filename to a safe single path component.
pub fn sanitize_filename(name: &str) -> String {
    // Drop any directory part the client sent
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            c if c.is_whitespace() => '_',
            _ => '\0',
        })
        .filter(|c| *c != '\0')
        .collect();

    let cleaned = cleaned.replace("..", "");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_extensions() {
        assert!(UploadKind::Photo.check("lunch.jpg").is_ok());
        assert!(UploadKind::Photo.check("LUNCH.JPEG").is_ok());
        assert!(UploadKind::Photo.check("plate.png").is_ok());
        assert!(UploadKind::Photo.check("report.pdf").is_err());
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = UploadKind::Photo.check("funny.gif").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file format. Use: ['.jpg', '.jpeg', '.png']"
        );
        let err = UploadKind::Document.check("scan").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file format. Use: ['.pdf']");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\blood test.pdf"), "blood_test.pdf");
        assert_eq!(sanitize_filename("nasi lemak (1).jpg"), "nasi_lemak_1.jpg");
        assert_eq!(sanitize_filename(".hidden.png"), "hidden.png");
        assert_eq!(sanitize_filename("..."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
    }
}
