use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Deserialize;

use dependor::cli::commands;
use dependor::cli::OutputFormat;
use dependor::{DependencyGraph, GraphError, GraphParser, ResolveOptions, TokenizeError};

fn fixture_source() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/web_project")
}

/// Copy the fixture project to a temporary directory so tests don't conflict.
fn setup_project() -> tempfile::TempDir {
    let tmp = tempfile::TempDir::new().unwrap();
    copy_dir_recursive(&fixture_source(), tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &dst_path)?;
        } else {
            fs::copy(entry.path(), &dst_path)?;
        }
    }
    Ok(())
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn deps<'g>(graph: &'g DependencyGraph, path: &str) -> Vec<&'g str> {
    graph
        .dependencies(path)
        .unwrap_or_else(|| panic!("{path} should be a node"))
        .iter()
        .map(String::as_str)
        .collect()
}

#[test]
fn test_fixture_graph() {
    let tmp = setup_project();
    let mut parser = GraphParser::new(tmp.path()).unwrap();
    let graph = parser.parse_graph().unwrap();

    let nodes: Vec<&str> = graph.nodes().map(|(path, _)| path).collect();
    assert_eq!(
        nodes,
        vec![
            "src/app.tsx",
            "src/components/Button.tsx",
            "src/components/index.ts",
            "src/components/theme.ts",
            "src/hooks/index.js",
            "src/hooks/useThing.js",
            "src/pages/settings.jsx",
            "src/uses_broken.js",
            "src/utils/format.ts",
        ]
    );

    assert_eq!(
        deps(&graph, "src/app.tsx"),
        vec![
            "react",
            "src/components/Button.tsx",
            "src/components/theme.ts",
            "src/utils/format.ts",
            "src/hooks/index.js",
            "src/styles",
            "src/pages/settings.jsx",
        ]
    );
    assert_eq!(
        deps(&graph, "src/pages/settings.jsx"),
        vec!["src/utils/format.ts", "src/components/index.ts"]
    );
    assert_eq!(
        deps(&graph, "src/components/index.ts"),
        vec!["src/components/theme.ts"]
    );
    assert_eq!(deps(&graph, "src/hooks/index.js"), vec!["src/hooks/useThing.js"]);
    assert_eq!(deps(&graph, "src/hooks/useThing.js"), vec!["lodash"]);
    assert!(deps(&graph, "src/utils/format.ts").is_empty());
}

#[test]
fn test_ignored_directories_stay_out_of_the_graph() {
    let tmp = setup_project();
    let graph = GraphParser::new(tmp.path()).unwrap().parse_graph().unwrap();
    assert!(graph
        .nodes()
        .all(|(path, _)| !path.starts_with("node_modules") && !path.starts_with("dist")));
}

#[test]
fn test_malformed_file_is_excluded_and_reported() {
    let tmp = setup_project();
    let mut parser = GraphParser::new(tmp.path()).unwrap();
    let graph = parser.parse_graph().unwrap();

    assert!(!graph.is_internal("src/broken.js"));
    assert_eq!(deps(&graph, "src/uses_broken.js"), vec!["src/broken"]);

    let failures = parser.tokenize_failures();
    assert_eq!(failures.len(), 1);
    match &failures[0] {
        TokenizeError::MalformedImport { path, line, .. } => {
            assert_eq!(path, "src/broken.js");
            assert_eq!(*line, 1);
        }
        other => panic!("unexpected failure: {other}"),
    }
}

#[test]
fn test_middleware_sees_every_discovered_file() {
    let tmp = setup_project();
    let visited = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&visited);

    let mut parser = GraphParser::new(tmp.path()).unwrap();
    parser.add_middleware(move |path| sink.lock().unwrap().push(path.to_string()));
    parser.parse_graph().unwrap();

    let visited = visited.lock().unwrap();
    assert_eq!(visited.len(), 10);
    assert_eq!(visited[0], "src/app.tsx");
    assert!(visited.contains(&"src/broken.js".to_string()));
    assert!(!visited.iter().any(|p| p.ends_with(".css")));
}

#[test]
fn test_custom_config_is_returned_verbatim() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Team {
        team: String,
        strict: bool,
    }

    let tmp = setup_project();
    let parser = GraphParser::new(tmp.path()).unwrap();
    assert!(parser.config_warning().is_none());

    let custom = parser.custom_config().unwrap();
    assert_eq!(custom["team"], "web");
    assert_eq!(
        parser.custom_config_as::<Team>().unwrap(),
        Some(Team {
            team: "web".to_string(),
            strict: true,
        })
    );
}

#[test]
fn test_invalid_config_falls_back_to_defaults() {
    let tmp = tempfile::TempDir::new().unwrap();
    write(tmp.path(), "dependor.json", "{ \"aliases\": [1, 2");
    write(tmp.path(), "node_modules/pkg/index.js", "");
    write(tmp.path(), "main.js", "require('pkg');");

    let mut parser = GraphParser::new(tmp.path()).unwrap();
    assert!(parser.config_warning().is_some());
    let graph = parser.parse_graph().unwrap();
    assert!(graph.is_internal("node_modules/pkg/index.js"));
}

#[test]
fn test_repeated_runs_are_equivalent() {
    let tmp = setup_project();
    let mut parser = GraphParser::new(tmp.path()).unwrap();
    let first = parser.parse_graph().unwrap();
    let second = parser.parse_graph().unwrap();
    assert!(first.equivalent(&second));
    assert_eq!(first, second);
}

#[test]
fn test_reexport_chains_are_opt_in() {
    let tmp = tempfile::TempDir::new().unwrap();
    write(tmp.path(), "main.ts", "import { deep, top } from './pkg';");
    write(
        tmp.path(),
        "pkg/index.ts",
        "export * from './inner';\nexport const top = 1;",
    );
    write(tmp.path(), "pkg/inner/index.ts", "export * from './deep';");
    write(tmp.path(), "pkg/inner/deep.ts", "export const deep = true;");

    let mut parser = GraphParser::new(tmp.path()).unwrap();
    let shallow = parser.parse_graph().unwrap();
    assert_eq!(deps(&shallow, "main.ts"), vec!["pkg/index.ts"]);

    let chained = parser
        .parse_graph_with(ResolveOptions {
            follow_reexport_chains: true,
        })
        .unwrap();
    assert_eq!(deps(&chained, "main.ts"), vec!["pkg/inner/deep.ts", "pkg/index.ts"]);
}

#[test]
fn test_cyclic_reexports_terminate() {
    let tmp = tempfile::TempDir::new().unwrap();
    write(tmp.path(), "a/index.js", "export * from '../b';\nexport const fromA = 1;");
    write(tmp.path(), "b/index.js", "export * from '../a';\nexport const fromB = 1;");
    write(tmp.path(), "main.js", "import { fromA, fromB } from './a';");

    let graph = GraphParser::new(tmp.path())
        .unwrap()
        .parse_graph_with(ResolveOptions {
            follow_reexport_chains: true,
        })
        .unwrap();
    assert_eq!(deps(&graph, "main.js"), vec!["a/index.js", "b/index.js"]);
}

#[test]
fn test_missing_root_is_an_error() {
    let result = GraphParser::new("/nonexistent/dependor/project");
    assert!(matches!(result, Err(GraphError::RootNotFound(_))));
}

#[test]
fn test_importers_command_json() {
    let tmp = setup_project();
    let output =
        commands::run_importers(tmp.path(), "src/utils/format.ts", OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["file"], "src/utils/format.ts");
    assert_eq!(
        value["importers"],
        serde_json::json!(["src/app.tsx", "src/pages/settings.jsx"])
    );
}

#[test]
fn test_graph_command_text() {
    let tmp = setup_project();
    let output = commands::run_graph(tmp.path(), false, OutputFormat::Text).unwrap();
    assert!(output.contains("src/hooks/useThing.js\n  ~> lodash\n"));
    assert!(output.contains("9 files, "));
}
