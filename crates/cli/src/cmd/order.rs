//! Implementation of the `lake order` command.

use anyhow::Result;

use lake_lib::eval::resolve;

use super::{ResolveArgs, check, load};
use crate::output::print_json;

pub fn cmd_order(args: &ResolveArgs) -> Result<()> {
  let (files, mut importer) = load(args)?;
  let output = check(resolve(&files, &mut importer))?;

  if args.format.is_json() {
    return print_json(&output.order);
  }
  for (step, name) in output.order.iter().enumerate() {
    println!("{:>3}. {}", step + 1, name);
  }
  Ok(())
}
