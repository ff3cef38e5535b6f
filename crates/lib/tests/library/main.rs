mod common;
mod directory_tests;
mod import_tests;
mod resolve_tests;
