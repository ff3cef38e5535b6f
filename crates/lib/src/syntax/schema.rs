use super::types::{DEFAULTS_BLOCK, STORE_BLOCK, TARGET_BLOCK};

/// The value type an attribute decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
  String,
  Bool,
  StringList,
  StringMap,
}

impl AttrType {
  pub fn describe(self) -> &'static str {
    match self {
      AttrType::String => "string",
      AttrType::Bool => "bool",
      AttrType::StringList => "list of string",
      AttrType::StringMap => "map of string",
    }
  }
}

/// An attribute a block kind accepts. All attributes are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSpec {
  pub name: &'static str,
  pub ty: AttrType,
}

/// The expected shape of a recognized block kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSchema {
  pub kind: &'static str,
  pub labels: &'static [&'static str],
  pub attributes: &'static [AttrSpec],
}

impl BlockSchema {
  pub fn attribute(&self, name: &str) -> Option<&AttrSpec> {
    self.attributes.iter().find(|spec| spec.name == name)
  }
}

const RECIPE_ATTRIBUTES: &[AttrSpec] = &[
  AttrSpec {
    name: "env",
    ty: AttrType::StringMap,
  },
  AttrSpec {
    name: "inputs",
    ty: AttrType::StringList,
  },
  AttrSpec {
    name: "network",
    ty: AttrType::Bool,
  },
  AttrSpec {
    name: "script",
    ty: AttrType::String,
  },
  AttrSpec {
    name: "shell",
    ty: AttrType::StringList,
  },
];

const DEFAULTS_ATTRIBUTES: &[AttrSpec] = &[AttrSpec {
  name: "shell",
  ty: AttrType::StringList,
}];

/// The recognized-block-kind table.
pub const BLOCK_SCHEMAS: &[BlockSchema] = &[
  BlockSchema {
    kind: STORE_BLOCK,
    labels: &["name"],
    attributes: RECIPE_ATTRIBUTES,
  },
  BlockSchema {
    kind: TARGET_BLOCK,
    labels: &["name"],
    attributes: RECIPE_ATTRIBUTES,
  },
  BlockSchema {
    kind: DEFAULTS_BLOCK,
    labels: &[],
    attributes: DEFAULTS_ATTRIBUTES,
  },
];

pub fn block_schema(kind: &str) -> Option<&'static BlockSchema> {
  BLOCK_SCHEMAS.iter().find(|schema| schema.kind == kind)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn store_and_target_share_schema() {
    let store = block_schema("store").unwrap();
    let target = block_schema("target").unwrap();
    assert_eq!(store.attributes, target.attributes);
    assert_eq!(store.labels.len(), 1);
  }

  #[test]
  fn defaults_has_no_labels() {
    let defaults = block_schema("defaults").unwrap();
    assert!(defaults.labels.is_empty());
    assert_eq!(defaults.attribute("shell").map(|a| a.ty), Some(AttrType::StringList));
    assert!(defaults.attribute("script").is_none());
  }

  #[test]
  fn unknown_kind() {
    assert!(block_schema("config").is_none());
  }
}
