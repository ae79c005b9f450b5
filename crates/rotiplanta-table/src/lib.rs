//! AI table service: wire types, HTTP client and response routing.
//!
//! Rows are appended to named generative tables; the service fills the
//! output columns with model text. The router turns whatever shape comes
//! back into a fixed set of cleaned fields.

pub mod client;
pub mod router;
pub mod stream;
pub mod types;

pub use client::{JamAiClient, TableService};
pub use router::{route_response, NormalizedResult};
pub use types::*;
