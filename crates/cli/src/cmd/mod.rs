mod eval;
mod order;
mod values;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use tracing::debug;

use lake_lib::diagnostics::Diagnostics;
use lake_lib::eval::load_directory;
use lake_lib::imports::DirectoryImporter;
use lake_lib::syntax::SourceFile;

use crate::output::{OutputFormat, print_diagnostics};

pub use eval::cmd_eval;
pub use order::cmd_order;
pub use values::cmd_values;

/// Arguments shared by every command that resolves a directory.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
  /// Directory containing Lakefile / *.Lakefile files
  #[arg(default_value = ".")]
  pub dir: PathBuf,

  /// Directory imported packages are looked up in (default: DIR)
  #[arg(long)]
  pub import_root: Option<PathBuf>,

  /// Output format
  #[arg(long, value_enum, default_value = "text")]
  pub format: OutputFormat,
}

/// Parsed files and an importer rooted where the arguments say.
pub(crate) fn load(args: &ResolveArgs) -> Result<(Vec<SourceFile>, DirectoryImporter)> {
  let dir =
    dunce::canonicalize(&args.dir).with_context(|| format!("Failed to open directory: {}", args.dir.display()))?;
  let import_root = match &args.import_root {
    Some(root) => {
      dunce::canonicalize(root).with_context(|| format!("Failed to open import root: {}", root.display()))?
    }
    None => dir.clone(),
  };
  debug!(dir = %dir.display(), import_root = %import_root.display(), "loading");

  let files = check(load_directory(&dir))?;
  Ok((files, DirectoryImporter::new(import_root)))
}

/// Print diagnostics to stderr and turn them into an error.
pub(crate) fn check<T>(result: std::result::Result<T, Diagnostics>) -> Result<T> {
  result.map_err(|diags| {
    print_diagnostics(&diags);
    anyhow!("resolution failed with {} error(s)", diags.len())
  })
}
