use std::cell::Cell;
use std::collections::BTreeMap;

use lake_lib::diagnostics::Diagnostics;
use lake_lib::eval::resolve_directory;
use lake_lib::syntax::parse_source;
use lake_lib::value::ResolvedValue;

use super::common::{TestTree, summaries};

#[test]
fn imported_values_are_visible_under_alias() {
  let tree = TestTree::new();
  tree
    .write("tools/fish/Lakefile", "carp = \"koi\"\n")
    .write(
      "main/Lakefile",
      "import = [\"tools/fish\"]\n\ntarget \"t\" {\n  script = \"feed ${fish.carp}\"\n}\n",
    );
  let dir = tree.resolve().unwrap();
  assert_eq!(dir.targets[0].script, "feed koi");
}

#[test]
fn explicit_alias() {
  let tree = TestTree::new();
  tree
    .write("river/Lakefile", "trout = 3\n")
    .write("main/Lakefile", "import = { stream = \"river\" }\nn = stream.trout + 1\n");
  let values = tree.resolve_values().unwrap();
  assert_eq!(values["n"], ResolvedValue::Value(hcl::Value::from(4)));
}

#[test]
fn imported_recipes_are_tokens() {
  let tree = TestTree::new();
  tree
    .write("toolchain/Lakefile", "store \"cc\" {\n  script = \"build cc\"\n}\n")
    .write(
      "main/Lakefile",
      "import = [\"toolchain\"]\ntarget \"app\" {\n  inputs = [toolchain.cc]\n}\n",
    );
  let dir = tree.resolve().unwrap();
  let input = &dir.targets[0].inputs[0];
  assert!(input.starts_with("{{ ") && input.ends_with(" }}"));
  // Imported stores are not part of the importing directory.
  assert!(dir.stores.is_empty());
}

#[test]
fn private_names_are_not_exported() {
  let tree = TestTree::new();
  tree
    .write("lib/Lakefile", "_secret = \"x\"\npublic = \"y\"\n")
    .write("main/Lakefile", "import = [\"lib\"]\nleak = lib._secret\n");
  let err = tree.resolve().unwrap_err();
  assert_eq!(summaries(&err), vec!["Evaluation failed"]);
}

#[test]
fn nested_imports_resolve() {
  let tree = TestTree::new();
  tree
    .write("base/Lakefile", "version = \"1.2\"\n")
    .write("mid/Lakefile", "import = [\"base\"]\nlabel = \"v${base.version}\"\n")
    .write("main/Lakefile", "import = [\"mid\"]\nname = mid.label\n");
  let values = tree.resolve_values().unwrap();
  assert_eq!(values["name"], ResolvedValue::Value(hcl::Value::from("v1.2")));
}

#[test]
fn import_cycle_fails() {
  let tree = TestTree::new();
  tree
    .write("ping/Lakefile", "import = [\"pong\"]\nx = 1\n")
    .write("pong/Lakefile", "import = [\"ping\"]\ny = 2\n")
    .write("main/Lakefile", "import = [\"ping\"]\n");
  let err = tree.resolve().unwrap_err();
  assert!(summaries(&err).contains(&"Import cycle".to_string()));
}

#[test]
fn missing_package_fails() {
  let tree = TestTree::new();
  tree.write("main/Lakefile", "import = [\"nowhere\"]\nx = 1\n");
  let err = tree.resolve().unwrap_err();
  assert_eq!(summaries(&err), vec!["Package not found"]);
}

#[test]
fn import_after_declaration_fails() {
  let tree = TestTree::new();
  tree
    .write("lib/Lakefile", "v = 1\n")
    .write("main/Lakefile", "x = 1\nimport = [\"lib\"]\n");
  let err = tree.resolve().unwrap_err();
  assert_eq!(summaries(&err), vec!["Invalid import location"]);
}

#[test]
fn aliases_are_file_scoped() {
  let tree = TestTree::new();
  tree
    .write("lib/Lakefile", "v = 1\n")
    .write("main/Lakefile", "import = [\"lib\"]\nok = lib.v\n")
    .write("main/b.Lakefile", "bad = lib.v\n");
  let err = tree.resolve().unwrap_err();
  assert_eq!(summaries(&err), vec!["Evaluation failed"]);
  let subject = err.iter().next().unwrap().subject.clone().unwrap();
  assert!(subject.filename.ends_with("b.Lakefile"));
}

#[test]
fn import_errors_stop_resolution() {
  // The cycle below is never reported: imports fail first.
  let files = vec![parse_source("import = [\"x\"]\na = b\nb = a\n", "Lakefile").unwrap()];
  let loads = Cell::new(0);
  let mut importer = |_: &str| -> Result<BTreeMap<String, ResolvedValue>, Diagnostics> {
    loads.set(loads.get() + 1);
    Err(lake_lib::diagnostics::Diagnostic::error("Boom").into())
  };
  let err = resolve_directory(&files, &mut importer).unwrap_err();
  assert_eq!(summaries(&err), vec!["Boom"]);
  assert_eq!(loads.get(), 1);
}

#[test]
fn same_package_loaded_once_per_resolution() {
  let files = vec![
    parse_source("import = [\"p\", { q = \"p\" }]\na = p.v + q.v\n", "a.Lakefile").unwrap(),
    parse_source("import = { r = \"p\" }\nb = r.v\n", "b.Lakefile").unwrap(),
  ];
  let loads = Cell::new(0);
  let mut importer = |_: &str| -> Result<BTreeMap<String, ResolvedValue>, Diagnostics> {
    loads.set(loads.get() + 1);
    Ok(BTreeMap::from([(
      "v".to_string(),
      ResolvedValue::Value(hcl::Value::from(1)),
    )]))
  };
  resolve_directory(&files, &mut importer).unwrap();
  assert_eq!(loads.get(), 1);
}
