use lake_lib::eval::load_directory;
use lake_lib::imports::NoImports;

use super::common::{TestTree, summaries};

#[test]
fn only_lakefiles_are_loaded_in_name_order() {
  let tree = TestTree::new();
  tree
    .write("main/z.Lakefile", "z = 1\n")
    .write("main/Lakefile", "root = 1\n")
    .write("main/a.Lakefile", "a = 1\n")
    .write("main/README.md", "not hcl {")
    .write("main/Lakefile.bak", "not hcl {")
    .write("main/nested/Lakefile", "nested = 1\n");

  let files = load_directory(&tree.main_dir()).unwrap();
  let names: Vec<String> = files
    .iter()
    .map(|file| file.name.rsplit(['/', '\\']).next().unwrap().to_string())
    .collect();
  assert_eq!(names, vec!["Lakefile", "a.Lakefile", "z.Lakefile"]);
}

#[test]
fn parse_errors_from_every_file_are_reported() {
  let tree = TestTree::new();
  tree
    .write("main/Lakefile", "config {\n}\n")
    .write("main/b.Lakefile", "store {\n}\n");
  let err = load_directory(&tree.main_dir()).unwrap_err();
  assert_eq!(summaries(&err), vec!["Unsupported block type", "Missing name for store"]);
}

#[test]
fn empty_directory_resolves_to_nothing() {
  let tree = TestTree::new();
  std::fs::create_dir_all(tree.main_dir()).unwrap();
  let dir = lake_lib::eval::evaluate_directory(&tree.main_dir(), &mut NoImports).unwrap();
  assert!(dir.stores.is_empty());
  assert!(dir.targets.is_empty());
  assert!(dir.defaults.is_empty());
}

#[test]
fn directory_serializes_without_empty_fields() {
  let tree = TestTree::new();
  tree.write("main/Lakefile", "store \"s\" {\n  script = \"make\"\n}\n");
  let dir = tree.resolve().unwrap();
  let json = serde_json::to_value(&dir).unwrap();
  assert_eq!(json["stores"][0]["name"], "s");
  assert_eq!(json["stores"][0]["script"], "make");
  assert!(json["stores"][0].get("env").is_none());
  assert_eq!(json["targets"], serde_json::json!([]));
  assert_eq!(json["defaults"], serde_json::json!({}));
}
