use serde::Serialize;

use crate::recipe::Recipe;

/// The final output unit of a resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
  Recipe(Recipe),
  Value(hcl::Value),
}

impl ResolvedValue {
  /// What an expression sees when it references this value by name.
  pub fn to_hcl_value(&self) -> hcl::Value {
    match self {
      ResolvedValue::Recipe(recipe) => hcl::Value::String(recipe.token()),
      ResolvedValue::Value(value) => value.clone(),
    }
  }

  pub fn as_recipe(&self) -> Option<&Recipe> {
    match self {
      ResolvedValue::Recipe(recipe) => Some(recipe),
      ResolvedValue::Value(_) => None,
    }
  }
}

impl From<Recipe> for ResolvedValue {
  fn from(recipe: Recipe) -> Self {
    ResolvedValue::Recipe(recipe)
  }
}

impl From<hcl::Value> for ResolvedValue {
  fn from(value: hcl::Value) -> Self {
    ResolvedValue::Value(value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::syntax::RecipeKind;

  #[test]
  fn recipes_substitute_as_tokens() {
    let recipe = Recipe::new("a", RecipeKind::Store).seal().unwrap();
    let value = ResolvedValue::from(recipe.clone());
    assert_eq!(value.to_hcl_value(), hcl::Value::String(format!("{{{{ {} }}}}", recipe.id)));
    assert_eq!(value.as_recipe(), Some(&recipe));
  }

  #[test]
  fn plain_values_pass_through() {
    let value = ResolvedValue::from(hcl::Value::from("hi"));
    assert_eq!(value.to_hcl_value(), hcl::Value::from("hi"));
    assert_eq!(serde_json::to_string(&value).unwrap(), "\"hi\"");
  }
}
