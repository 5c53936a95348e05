//! Coverage-Mapping Aggregation for Cubrir
//!
//! This module joins per-object binary coverage mappings with an indexed
//! execution profile, aggregates per-function/per-file/per-instantiation
//! summaries, and renders the result as a versioned JSON document.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  CUBRIR COVERAGE PIPELINE                                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Profile + Mappings → CoverageModel → File Reports → JSON        │
//! │          ▲                  │                                    │
//! │   CoverageSession     Segment Sweep / Summary Algebra            │
//! │   (reader cache)                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two distinct combining operators run through the summaries:
//! `+=` (accumulate) sums across independent functions and files, while
//! `merge` takes the per-field maximum across instantiations of one
//! logical definition. Parallel report building relies on the first being
//! commutative and associative.

pub mod formatters;
pub mod mapping;
pub mod model;
pub mod profile;
pub mod report;
pub mod segment;
pub mod session;
pub mod summary;

pub(crate) mod wire;
