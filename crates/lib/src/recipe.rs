//! Resolved recipes and directory defaults.
//!
//! A recipe's identifier is computed over its resolved attributes only. The
//! name and kind are bookkeeping: two recipes that would run the same script
//! in the same environment share an identifier regardless of what they are
//! called.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::placeholder;
use crate::syntax::RecipeKind;
use crate::util::hash::{HashError, Hashable, ObjectHash};

/// A resolved store or target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
  pub name: String,
  pub kind: RecipeKind,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub inputs: Vec<String>,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub network: bool,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub script: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub shell: Vec<String>,
  pub id: ObjectHash,
}

/// The hashed subset of a recipe.
///
/// Field order is fixed by declaration and `env` is a `BTreeMap`, so the
/// JSON is canonical.
#[derive(Serialize)]
struct CanonicalRecipe<'a> {
  #[serde(skip_serializing_if = "is_empty_map")]
  env: &'a BTreeMap<String, String>,
  #[serde(skip_serializing_if = "is_empty_list")]
  inputs: &'a [String],
  #[serde(skip_serializing_if = "is_false")]
  network: bool,
  #[serde(skip_serializing_if = "is_empty_str")]
  script: &'a str,
  #[serde(skip_serializing_if = "is_empty_list")]
  shell: &'a [String],
}

impl Hashable for CanonicalRecipe<'_> {}

fn is_empty_map(map: &&BTreeMap<String, String>) -> bool {
  map.is_empty()
}

fn is_empty_list(list: &&[String]) -> bool {
  list.is_empty()
}

fn is_empty_str(s: &&str) -> bool {
  s.is_empty()
}

fn is_false(b: &bool) -> bool {
  !*b
}

impl Recipe {
  /// An unsealed recipe with no attributes set.
  pub fn new(name: impl Into<String>, kind: RecipeKind) -> Self {
    Self {
      name: name.into(),
      kind,
      env: BTreeMap::new(),
      inputs: Vec::new(),
      network: false,
      script: String::new(),
      shell: Vec::new(),
      id: ObjectHash(String::new()),
    }
  }

  pub fn is_store(&self) -> bool {
    self.kind == RecipeKind::Store
  }

  /// Compute the content address of the current attributes.
  pub fn compute_id(&self) -> Result<ObjectHash, HashError> {
    CanonicalRecipe {
      env: &self.env,
      inputs: &self.inputs,
      network: self.network,
      script: &self.script,
      shell: &self.shell,
    }
    .compute_hash()
  }

  /// Fix the identifier. Attributes must not change afterwards.
  pub fn seal(mut self) -> Result<Self, HashError> {
    self.id = self.compute_id()?;
    Ok(self)
  }

  /// The token dependents see in place of this recipe.
  pub fn token(&self) -> String {
    placeholder::token(&self.id)
  }

  /// Identifiers of other recipes referenced from any attribute, first
  /// occurrence order, without duplicates.
  pub fn dependencies(&self) -> Vec<ObjectHash> {
    let texts = self
      .env
      .values()
      .chain(&self.inputs)
      .chain(std::iter::once(&self.script))
      .chain(&self.shell);

    let mut deps: Vec<ObjectHash> = Vec::new();
    for text in texts {
      for id in placeholder::references(text) {
        if !deps.contains(&id) {
          deps.push(id);
        }
      }
    }
    deps
  }
}

/// Directory-wide fallback attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Defaults {
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub shell: Vec<String>,
}

impl Defaults {
  pub fn is_empty(&self) -> bool {
    self.shell.is_empty()
  }

  /// Fill attributes the recipe left empty.
  pub fn apply(&self, recipe: &mut Recipe) {
    if recipe.shell.is_empty() {
      recipe.shell = self.shell.clone();
    }
  }
}
