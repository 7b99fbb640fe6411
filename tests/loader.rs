use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vela::loading::{LoadError, SourceLoader};

mod common;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn loaded_names(dir: &Path, entry: &str) -> Vec<String> {
    let sources = SourceLoader::new().load_graph(&dir.join(entry)).unwrap();
    sources
        .iter()
        .map(|source| {
            source
                .path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

#[test]
fn dependencies_come_before_importers() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.vela", "import \"b.vela\";\nfn main() { }");
    write(dir.path(), "b.vela", "import \"c.vela\";");
    write(dir.path(), "c.vela", "fn helper() { }");
    assert_eq!(
        loaded_names(dir.path(), "a.vela"),
        vec!["c.vela", "b.vela", "a.vela"]
    );
}

#[test]
fn shared_dependency_loads_once() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.vela",
        "import \"b.vela\";\nimport \"c.vela\";",
    );
    write(dir.path(), "b.vela", "import \"c.vela\";");
    write(dir.path(), "c.vela", "");
    assert_eq!(
        loaded_names(dir.path(), "a.vela"),
        vec!["c.vela", "b.vela", "a.vela"]
    );
}

#[test]
fn cycle_reports_the_import_chain() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.vela", "import \"b.vela\";");
    write(dir.path(), "b.vela", "import \"a.vela\";");
    let error = SourceLoader::new()
        .load_graph(&dir.path().join("a.vela"))
        .unwrap_err();
    match error {
        LoadError::Cycle(chain) => {
            assert!(chain.contains("a.vela"), "chain was: {}", chain);
            assert!(chain.contains(" -> "), "chain was: {}", chain);
        }
        other => panic!("expected cycle, got {}", other),
    }
}

#[test]
fn missing_import_is_reported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.vela", "import \"nope.vela\";");
    let error = SourceLoader::new()
        .load_graph(&dir.path().join("a.vela"))
        .unwrap_err();
    match error {
        LoadError::Missing(path) => assert!(path.ends_with("nope.vela")),
        other => panic!("expected missing file, got {}", other),
    }
}

#[test]
fn alias_import_resolves_against_dependency_root() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app/main.vela", "import \"@util/str.vela\";");
    write(dir.path(), "deps/util/str.vela", "fn trim() { }");

    let mut aliases = HashMap::new();
    aliases.insert(String::from("util"), dir.path().join("deps/util"));
    let sources = SourceLoader::with_aliases(aliases)
        .load_graph(&dir.path().join("app/main.vela"))
        .unwrap();
    assert_eq!(sources.len(), 2);
    assert!(sources[0].path.ends_with("str.vela"));
}

#[test]
fn unknown_alias_is_reported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.vela", "import \"@nope/thing.vela\";");
    let error = SourceLoader::new()
        .load_graph(&dir.path().join("main.vela"))
        .unwrap_err();
    match error {
        LoadError::UnknownAlias(alias) => assert_eq!(alias, "nope"),
        other => panic!("expected unknown alias, got {}", other),
    }
}

#[test]
fn mod_declaration_maps_to_sibling_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.vela", "mod helpers;");
    write(dir.path(), "helpers.vela", "fn help() { }");
    assert_eq!(
        loaded_names(dir.path(), "main.vela"),
        vec!["helpers.vela", "main.vela"]
    );
}

#[test]
fn mod_declaration_falls_back_to_mod_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.vela", "mod helpers::math;");
    write(dir.path(), "helpers/math/mod.vela", "fn add() { }");
    assert_eq!(
        loaded_names(dir.path(), "main.vela"),
        vec!["mod.vela", "main.vela"]
    );
}

#[test]
fn directives_inside_comments_are_ignored() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.vela",
        "// import \"ghost.vela\";\nfn main() { }",
    );
    assert_eq!(loaded_names(dir.path(), "main.vela"), vec!["main.vela"]);
}
