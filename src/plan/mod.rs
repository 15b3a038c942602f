//! Plan extraction from model output.
//!
//! A model reply may embed one artifact block describing the files and
//! commands of a project. This module parses that markup into an ordered
//! list of typed [`Step`]s; the workspace applies them to the file tree.

mod parser;
mod types;

pub use parser::{parse_artifact, parse_artifact_from, strip_artifact};
pub use types::{Step, StepKind, StepStatus};
