//! Pipeline
//!
//! One parameterized pipeline for every entity:
//!
//! ```text
//! Fetch → (empty? → End) → Normalize → (empty? → End) → Load
//!       → (inserted == 0? → End) → Archive → (failed? → End) → Upload → End
//! ```
//!
//! Each stage failure ends the run with a typed [`RunEnd`] and a log line;
//! nothing propagates out of [`Pipeline::run`].

mod outcome;
mod runner;

pub use outcome::{RunEnd, RunReport, UploadOutcome};
pub use runner::Pipeline;

#[cfg(test)]
mod tests;
