//! Implementation of the `lake eval` command.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use lake_lib::eval::{Directory, resolve_directory};
use lake_lib::recipe::Recipe;

use super::{ResolveArgs, check, load};
use crate::output::{print_json, print_stat, truncate_hash};

pub fn cmd_eval(args: &ResolveArgs) -> Result<()> {
  let (files, mut importer) = load(args)?;
  let directory = check(resolve_directory(&files, &mut importer))?;

  if args.format.is_json() {
    return print_json(&directory);
  }
  print_directory(&directory);
  Ok(())
}

fn print_directory(directory: &Directory) {
  println!("Stores: {}", directory.stores.len());
  for recipe in &directory.stores {
    print_recipe(recipe);
  }
  println!("Targets: {}", directory.targets.len());
  for recipe in &directory.targets {
    print_recipe(recipe);
  }
  if !directory.defaults.is_empty() {
    println!("Defaults:");
    print_stat("shell", &directory.defaults.shell.join(" "));
  }
}

fn print_recipe(recipe: &Recipe) {
  println!(
    "  {} {}",
    recipe.name.if_supports_color(Stream::Stdout, |s| s.bold()),
    truncate_hash(&recipe.id.0).if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
  for (key, value) in &recipe.env {
    print_stat(&format!("  env.{key}"), value);
  }
  if !recipe.inputs.is_empty() {
    print_stat("  inputs", &recipe.inputs.join(", "));
  }
  if recipe.network {
    print_stat("  network", "true");
  }
  if !recipe.shell.is_empty() {
    print_stat("  shell", &recipe.shell.join(" "));
  }
  if !recipe.script.is_empty() {
    print_stat("  script", &recipe.script);
  }
}
