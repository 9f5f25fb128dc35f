//! Source position tracking and mapping for the JSX transpiler.
//!
//! The transpiler copies untouched source text verbatim and replaces JSX nodes
//! with generated factory calls. This crate records where every generated
//! chunk came from and serializes the result as a Source Map v3 document.

mod builder;
mod line_index;
mod span;
mod v3;
mod vlq;

pub use builder::{Mapping, SourceMap, SourceMapBuilder};
pub use line_index::{LineCol, LineIndex};
pub use span::{ByteOffset, Span};
pub use v3::SourceMapV3;
