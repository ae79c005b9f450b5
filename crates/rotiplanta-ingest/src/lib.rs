//! Roti Planta ingest: what happens to an uploaded file before it reaches
//! the table service.

pub mod file;
pub mod pdf;
pub mod staging;

pub use file::{sanitize_filename, UnsupportedFormat, UploadKind};
pub use pdf::{extract_pdf_text, join_pages};
pub use staging::StagedUpload;
