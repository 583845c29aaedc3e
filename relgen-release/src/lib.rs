//! Release orchestration: walk the variant tables and drive the squash
//! engine over each variant's prescribed fragment sequence.
//!
//! This crate owns *which* fragments merge into which output units, in what
//! order, and with which substitutions. How merging works is the
//! `relgen-squash` crate's business; variants never share engine state.

mod plan;
mod release;
mod version;

pub use plan::{ReleasePlan, Sensor, Transport, TransportFiles};
pub use release::release_variant;
pub use version::{RELEASE_TAG_FILE, version_tag};
