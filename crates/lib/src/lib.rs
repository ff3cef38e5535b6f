//! lake-lib: evaluation core for Lakefile directories
//!
//! A directory of `Lakefile` / `*.Lakefile` files declares:
//! - `store` and `target` blocks: content-addressed build recipes
//! - bare attributes: plain named values
//! - a `defaults` block: fallback attributes for every recipe
//!
//! Declarations reference each other by name. [`eval::resolve_directory`]
//! orders them by those references, evaluates each once, and gives every
//! recipe a stable identifier derived from its resolved attributes.

pub mod builtins;
pub mod diagnostics;
pub mod eval;
pub mod graph;
pub mod imports;
pub mod names;
pub mod placeholder;
pub mod recipe;
pub mod references;
pub mod syntax;
pub mod util;
pub mod value;
pub mod walk;
