use lake_lib::placeholder;

use super::common::{TestTree, details, resolve_lakefile, summaries};

#[test]
fn store_reference_becomes_token() {
  let dir = resolve_lakefile(
    r#"
store "a" {
  script = "echo hi"
}

target "b" {
  inputs = [a]
  script = "use ${a}"
}
"#,
  )
  .unwrap();

  assert_eq!(dir.stores.len(), 1);
  assert_eq!(dir.targets.len(), 1);
  let a = &dir.stores[0];
  let b = &dir.targets[0];
  assert_eq!(a.name, "a");
  assert!(a.is_store());
  assert!(!b.is_store());
  assert!(b.script.contains(&placeholder::token(&a.id)));
  assert!(!b.script.contains("use a"));
  assert_eq!(placeholder::references(&b.script), vec![a.id.clone()]);
}

#[test]
fn identifiers_ignore_layout_and_key_order() {
  let compact = resolve_lakefile("store \"a\" {\n  env = { A = \"1\", B = \"2\" }\n  script = \"make\"\n}\n").unwrap();
  let spaced = resolve_lakefile(
    "\n\nstore \"a\" {\n\n  script   =   \"make\"\n  env = {\n    B = \"2\"\n    A = \"1\"\n  }\n}\n",
  )
  .unwrap();
  assert_eq!(compact.stores[0].id, spaced.stores[0].id);

  let different = resolve_lakefile("store \"a\" {\n  env = { A = \"1\", B = \"3\" }\n  script = \"make\"\n}\n").unwrap();
  assert_ne!(compact.stores[0].id, different.stores[0].id);
}

#[test]
fn identifiers_chain_through_references() {
  let before = resolve_lakefile(
    "store \"dep\" {\n  script = \"v1\"\n}\ntarget \"app\" {\n  script = \"run ${dep}\"\n}\n",
  )
  .unwrap();
  let after = resolve_lakefile(
    "store \"dep\" {\n  script = \"v2\"\n}\ntarget \"app\" {\n  script = \"run ${dep}\"\n}\n",
  )
  .unwrap();
  assert_ne!(before.targets[0].id, after.targets[0].id);
}

#[test]
fn every_declared_name_appears_once() {
  let tree = TestTree::new();
  tree
    .write(
      "main/Lakefile",
      "greeting = \"hi\"\nstore \"s\" {\n  script = greeting\n}\n",
    )
    .write(
      "main/extra.Lakefile",
      "target \"t\" {\n  inputs = [s]\n}\ncount = 3\n",
    );
  let values = tree.resolve_values().unwrap();
  assert_eq!(
    values.keys().collect::<Vec<_>>(),
    vec!["count", "greeting", "s", "t"]
  );
}

#[test]
fn duplicate_recipe_names() {
  let err = resolve_lakefile("target \"x\" {\n}\ntarget \"x\" {\n}\n").unwrap_err();
  assert_eq!(summaries(&err), vec!["Duplicate name"]);
  assert!(details(&err)[0].contains("The name \"x\" has already been used at"));
}

#[test]
fn attribute_colliding_with_target() {
  let err = resolve_lakefile("x = 1\ntarget \"x\" {\n}\n").unwrap_err();
  assert_eq!(summaries(&err), vec!["Duplicate name"]);
  assert_eq!(err.iter().next().unwrap().subject.as_ref().unwrap().start.line, 2);
}

#[test]
fn duplicates_across_files() {
  let tree = TestTree::new();
  tree
    .write("main/Lakefile", "store \"x\" {\n}\n")
    .write("main/b.Lakefile", "x = 2\n");
  let err = tree.resolve().unwrap_err();
  assert_eq!(summaries(&err), vec!["Duplicate name"]);
}

#[test]
fn attribute_defined_twice_in_one_file() {
  let err = resolve_lakefile("x = 1\nx = 2\n").unwrap_err();
  assert_eq!(summaries(&err), vec!["Duplicate name"]);
  let diag = err.iter().next().unwrap();
  assert_eq!(diag.subject.as_ref().unwrap().start.line, 2);
  assert!(details(&err)[0].contains("The name \"x\" has already been used at"));
}

#[test]
fn repeated_names_are_batched_with_other_duplicates() {
  let tree = TestTree::new();
  tree
    .write("main/Lakefile", "x = 1\nx = 2\ny = 3\n")
    .write("main/b.Lakefile", "target \"y\" {\n}\n");
  let err = tree.resolve().unwrap_err();
  assert_eq!(summaries(&err), vec!["Duplicate name", "Duplicate name"]);
}

#[test]
fn argument_set_twice_in_block() {
  let err = resolve_lakefile("target \"t\" {\n  script = \"a\"\n  script = \"b\"\n}\n").unwrap_err();
  assert_eq!(summaries(&err), vec!["Duplicate argument"]);
}

#[test]
fn two_way_cycle_names_both() {
  let err = resolve_lakefile("a = b\nb = a\n").unwrap_err();
  assert_eq!(summaries(&err), vec!["Circular reference"]);
  assert_eq!(details(&err), vec!["Identifiers a -> b -> a create a circular reference."]);
}

#[test]
fn cycle_through_recipes() {
  let err = resolve_lakefile(
    "store \"a\" {\n  script = \"${c}\"\n}\nstore \"b\" {\n  script = \"${a}\"\n}\nc = b\n",
  )
  .unwrap_err();
  assert_eq!(details(&err), vec!["Identifiers a -> c -> b -> a create a circular reference."]);
  let diag = err.iter().next().unwrap();
  assert_eq!(diag.subject.as_ref().unwrap().start.line, 1);
}

#[test]
fn all_cycles_are_reported() {
  let err = resolve_lakefile("a = b\nb = a\nc = d\nd = c\nself = self\n").unwrap_err();
  assert_eq!(err.len(), 3);
  assert!(summaries(&err).iter().all(|s| s == "Circular reference"));
}

#[test]
fn defaults_fill_missing_shell() {
  let dir = resolve_lakefile(
    r#"
defaults {
  shell = ["bash", "-c"]
}

target "plain" {
  script = "echo"
}

target "own" {
  shell = ["zsh"]
  script = "echo"
}
"#,
  )
  .unwrap();
  assert_eq!(dir.defaults.shell, vec!["bash", "-c"]);
  assert_eq!(dir.targets[0].shell, vec!["bash", "-c"]);
  assert_eq!(dir.targets[1].shell, vec!["zsh"]);
}

#[test]
fn defaults_may_reference_values() {
  let dir = resolve_lakefile(
    r#"
sh = "bash"

defaults {
  shell = [sh, "-c"]
}

target "t" {
  script = "echo ${sh}"
}
"#,
  )
  .unwrap();
  assert_eq!(dir.targets[0].shell, vec!["bash", "-c"]);
  assert_eq!(dir.targets[0].script, "echo bash");
}

#[test]
fn conflicting_defaults_fail() {
  let tree = TestTree::new();
  tree
    .write("main/Lakefile", "defaults {\n  shell = [\"bash\"]\n}\n")
    .write("main/other.Lakefile", "defaults {\n  shell = [\"zsh\"]\n}\n");
  let err = tree.resolve().unwrap_err();
  assert_eq!(summaries(&err), vec!["Conflicting defaults"]);
}

#[test]
fn matching_defaults_are_fine() {
  let tree = TestTree::new();
  tree
    .write("main/Lakefile", "defaults {\n  shell = [\"bash\"]\n}\n")
    .write("main/other.Lakefile", "defaults {\n  shell = [\"bash\"]\n}\ndefaults {\n}\n");
  let dir = tree.resolve().unwrap();
  assert_eq!(dir.defaults.shell, vec!["bash"]);
}

#[test]
fn download_file_adds_store() {
  let dir = resolve_lakefile(
    r#"
target "app" {
  inputs = [download_file("https://example.com/app.tar.gz")]
  script = "tar xf ${download_file("https://example.com/app.tar.gz")}"
}
"#,
  )
  .unwrap();
  assert_eq!(dir.stores.len(), 1);
  let fetch = &dir.stores[0];
  assert!(fetch.network);
  assert_eq!(fetch.env["url"], "https://example.com/app.tar.gz");
  assert_eq!(dir.targets[0].inputs, vec![fetch.token()]);
  assert_eq!(dir.targets[0].dependencies(), vec![fetch.id.clone()]);
}

#[test]
fn walk_order_is_deterministic() {
  let src = "z = 1\ny = 2\nx = z + y\nw = 4\n";
  let first = resolve_lakefile(src).unwrap();
  for _ in 0..5 {
    assert_eq!(resolve_lakefile(src).unwrap(), first);
  }
}

#[test]
fn undefined_variable_fails_evaluation() {
  let err = resolve_lakefile("target \"t\" {\n  script = missing\n}\n").unwrap_err();
  assert_eq!(summaries(&err), vec!["Evaluation failed"]);
}
