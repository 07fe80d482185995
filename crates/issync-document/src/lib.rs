//! The canonical issue-file document model: parse, normalize, render.
//!
//! This crate is the equality basis for every diff in the synchronizer — the
//! three-way planner, the pull pipeline's unchanged-suppression check, and
//! `status`/`diff` all compare documents by comparing their canonical
//! rendering, never their in-memory structure directly.

pub mod canonicalize;
pub mod error;
pub mod filename;
pub mod parse;
pub mod render;
pub mod richtext;

pub use error::ParseError;
pub use filename::{issue_filename, parse_filename_key, slugify};
pub use parse::parse;
pub use render::render;
pub use richtext::canonical_rich_text;
