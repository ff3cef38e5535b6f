//! Front-end adapter: Lakefile text into declarations.
//!
//! The evaluation core only consumes the types in `types`: per file, an
//! ordered list of blocks and top-level attributes, each with source ranges
//! and expressions ready for the expression evaluator. `parse` produces
//! them from HCL text; `schema` is the recognized-block-kind table.

mod parse;
mod schema;
mod types;

pub use parse::*;
pub use schema::*;
pub use types::*;
