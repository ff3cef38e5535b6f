//! Builtin functions available to every expression.
//!
//! - `download_file(url)`: describes a fetch of `url` as a store recipe and
//!   returns that recipe's token. Nothing is downloaded here.
//!
//! The evaluator only accepts plain function pointers, so recipes generated
//! by builtins are pushed onto a thread-local list. [`collect`] installs a
//! fresh list around one evaluation and hands back whatever was generated.

use std::cell::RefCell;
use std::collections::BTreeMap;

use hcl::Value;
use hcl::eval::{Context, FuncArgs, FuncDef, ParamType};

use crate::recipe::Recipe;
use crate::syntax::RecipeKind;
use crate::util::hash::HashError;

pub const DOWNLOAD_FILE: &str = "download_file";

thread_local! {
  static GENERATED: RefCell<Vec<Recipe>> = const { RefCell::new(Vec::new()) };
}

/// Declare every builtin in `ctx`.
pub fn declare(ctx: &mut Context<'_>) {
  ctx.declare_func(
    DOWNLOAD_FILE,
    FuncDef::builder().param(ParamType::String).build(download_file),
  );
}

/// Run `f` and return its result together with the recipes builtins
/// generated while it ran.
pub fn collect<T>(f: impl FnOnce() -> T) -> (T, Vec<Recipe>) {
  let outer = GENERATED.with(|generated| generated.replace(Vec::new()));
  let result = f();
  let generated = GENERATED.with(|generated| generated.replace(outer));
  (result, generated)
}

/// The store recipe `download_file(url)` stands for.
pub fn download_recipe(url: &str) -> Result<Recipe, HashError> {
  let mut recipe = Recipe::new(DOWNLOAD_FILE, RecipeKind::Store);
  recipe.env = BTreeMap::from([
    ("fetch_url".to_string(), "true".to_string()),
    ("url".to_string(), url.to_string()),
  ]);
  recipe.network = true;
  recipe.seal()
}

fn download_file(args: FuncArgs) -> Result<Value, String> {
  let url = args
    .first()
    .and_then(Value::as_str)
    .ok_or_else(|| format!("{DOWNLOAD_FILE} expects a URL string"))?;
  let recipe = download_recipe(url).map_err(|err| err.to_string())?;
  let token = recipe.token();
  GENERATED.with(|generated| generated.borrow_mut().push(recipe));
  Ok(Value::String(token))
}
