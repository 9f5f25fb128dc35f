//! JSX to factory-call transpilation.
//!
//! This crate rewrites JSX elements and fragments into calls to the
//! `jsx`, `svg` and `xhtml` factories of a signals runtime. It handles:
//! - Choosing the factory from `xmlns` attributes and `svg:`/`xhtml:` tags
//! - Wrapping reactive props and children in thunks or getters
//! - Injecting or extending the runtime import
//! - Building a Source Map v3 for the output
//!
//! Code outside JSX is copied through unchanged.
//!
//! # Example
//!
//! ```
//! use jsx_transformer::{transpile, TranspileOptions};
//!
//! let output = transpile("<p title={a.b}>hi</p>", &TranspileOptions::default()).unwrap();
//! assert_eq!(
//!     output.code,
//!     "import { jsx } from \"jsx-signals/runtime\";\n\
//!      jsx(\"p\", { title: () => a.b, children: \"hi\" })"
//! );
//! ```

mod classify;
mod context;
mod emit;
mod error;
mod imports;
mod input;
mod rewrite;
mod text;
mod transform;

pub use classify::is_reactive;
pub use context::{Namespace, RuntimeName, ScopeFrame, Tag, SVG_NAMESPACE, XHTML_NAMESPACE};
pub use emit::TranspileOutput;
pub use error::{Location, TransformError, TransformErrorKind};
pub use transform::{transpile, TranspileOptions, DEFAULT_RUNTIME_MODULE, LEGACY_RUNTIME_MODULES};
