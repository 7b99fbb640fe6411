use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vela::codegen::ARCHIVE_MAGIC;
use vela::compiler::{compile, CompileRequest};

mod common;
use common::*;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn check_reports_a_summary() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.vela", "fn main() { print(4); }");
    let result = compile(&CompileRequest::for_check(&dir.path().join("main.vela")));
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    assert_has_message(&result.diagnostics, "Checked 1 source file(s).");
}

#[test]
fn build_writes_an_archive() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "project/vela.toml",
        "[package]\nname = \"demo\"\nmain = \"src/main.vela\"\n",
    );
    write(
        dir.path(),
        "project/src/main.vela",
        "import \"util.vela\";\nfn main() { print(double(21)); }",
    );
    write(
        dir.path(),
        "project/src/util.vela",
        "fn double(n: i32) -> i32 { return n * 2; }",
    );

    let output = dir.path().join("out/demo.vpk");
    let result = compile(&CompileRequest::for_build(
        &dir.path().join("project"),
        Some(output.clone()),
    ));
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    assert_has_message(&result.diagnostics, "Compiled 2 source file(s).");

    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[0..4], ARCHIVE_MAGIC);
}

#[test]
fn check_surfaces_type_errors_with_the_source_path() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.vela", "fn main() { print(nope); }");
    let result = compile(&CompileRequest::for_check(&dir.path().join("main.vela")));
    assert!(!result.success);
    let diagnostic = result
        .diagnostics
        .iter()
        .find(|diagnostic| diagnostic.message.contains("Unknown identifier: nope"))
        .expect("missing checker diagnostic");
    assert!(diagnostic.path.ends_with("main.vela"));
}

#[test]
fn parse_failure_in_one_file_still_reports_later_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.vela", "import \"bad.vela\";\nfn main() { }");
    write(dir.path(), "bad.vela", "fn broken( { }");
    let result = compile(&CompileRequest::for_check(&dir.path().join("main.vela")));
    assert!(!result.success);
    assert!(!result.diagnostics.is_empty());
}

#[test]
fn dependency_aliases_resolve_through_the_manifest() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "app/vela.toml",
        "[package]\nname = \"app\"\nmain = \"src/main.vela\"\n\n\
         [dependencies]\nutil = { path = \"../util\" }\n",
    );
    write(
        dir.path(),
        "app/src/main.vela",
        "import \"@util/str.vela\";\nfn main() { shout(); }",
    );
    write(dir.path(), "util/src/str.vela", "fn shout() { print(\"hey\"); }");

    let result = compile(&CompileRequest::for_check(&dir.path().join("app")));
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    assert_has_message(&result.diagnostics, "Checked 2 source file(s).");
}

#[test]
fn missing_entry_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = compile(&CompileRequest::for_check(&dir.path().join("ghost.vela")));
    assert!(!result.success);
    assert!(!result.diagnostics.is_empty());
}
