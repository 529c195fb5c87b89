//! Output artifacts for modelcharts.
//!
//! - [`write_atomic`]: temp-file-then-rename writer used for every document
//! - [`embed`] / [`extract_embedded`]: inline a chart document into a
//!   rendering template, and recover it again
//! - [`run_embed`]: the file-level embed workflow behind `modelcharts embed`

pub mod embed;
pub mod write;

pub use embed::{
    EmbedRequest, EmbedResult, StandaloneArtifact, embed, extract_embedded, run_embed,
};
pub use write::{ArtifactMeta, sha256_hex, write_atomic};

/// Stock ECharts template. Loads its data through
/// [`modelcharts_shared::DEFAULT_EMBED_MARKER`].
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/chart.html");
