#![deny(missing_docs)]
#![doc = "Core data types for fitting pairwise binary models by adaptive cluster expansion."]

pub mod cluster;
pub mod cooc;
pub mod errors;
pub mod provenance;
pub mod rng;
pub mod samples;
pub mod synth;

pub use cluster::Cluster;
pub use cooc::{CoocMatrix, COOC_TOLERANCE};
pub use errors::{AceError, ErrorInfo};
pub use provenance::SchemaVersion;
pub use rng::{derive_substream_seed, RngHandle};
pub use samples::{SampleBasis, SampleMatrix};
