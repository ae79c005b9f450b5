//! Roti Planta store: read-only access to user profile documents.

pub mod firestore;
pub mod value;

use async_trait::async_trait;

use rotiplanta_core::Result;
use rotiplanta_text::UserProfile;

pub use firestore::{equality_query, FirestoreClient};
pub use value::{decode_fields, decode_value};

/// Profile lookups the request handlers depend on.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// First profile whose `email` equals `email` exactly.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>>;
}
