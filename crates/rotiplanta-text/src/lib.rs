//! Roti Planta text: cleanup of generated text and profile formatting.
//!
//! Everything in this crate is pure: no I/O, no shared state.

pub mod normalize;
pub mod profile;

pub use normalize::{normalize, NormalizationProfile, NOT_AVAILABLE};
pub use profile::{
    display_lines, format_for_diet_recommendation, FormatError, FormattedProfileRequest,
    UserProfile,
};
