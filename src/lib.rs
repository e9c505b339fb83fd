//! clipharvest builds labeled audio-clip datasets: it resolves label
//! names against an ontology, walks dataset segment indexes, fetches
//! the referenced media, cuts the labeled time window from each, and
//! computes a fixed catalog of acoustic descriptors per clip.

pub mod catalog;
pub mod extract;
pub mod features;
pub mod fetch;
pub mod pipeline;
pub mod types;
