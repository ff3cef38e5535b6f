//! Implementation of the `lake values` command.

use anyhow::{Context, Result};

use lake_lib::eval::resolve_package;
use lake_lib::value::ResolvedValue;

use super::{ResolveArgs, check, load};
use crate::output::{print_json, truncate_hash};

pub fn cmd_values(args: &ResolveArgs) -> Result<()> {
  let (files, mut importer) = load(args)?;
  let values = check(resolve_package(&files, &mut importer))?;

  if args.format.is_json() {
    return print_json(&values);
  }
  for (name, value) in &values {
    match value {
      ResolvedValue::Recipe(recipe) => println!("{name} = {} {}", recipe.kind, truncate_hash(&recipe.id.0)),
      ResolvedValue::Value(value) => {
        let rendered = serde_json::to_string(value).context("Failed to serialize value")?;
        println!("{name} = {rendered}");
      }
    }
  }
  Ok(())
}
