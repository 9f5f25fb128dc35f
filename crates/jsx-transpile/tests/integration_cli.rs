//! End-to-end tests for the jsx-transpile binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_jsx-transpile"))
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn run_in(root: &Path, args: &[&str]) -> Output {
    binary()
        .current_dir(root)
        .env_remove("JSX_TRANSPILE_LOG")
        .args(args)
        .output()
        .expect("failed to run jsx-transpile")
}

#[test]
fn test_writes_mirrored_tree_with_map_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/App.jsx", "export const App = () => <p>{count.get()}</p>;\n");
    write(root, "src/widgets/Card.tsx", "export const Card = <div class=\"card\" />;\n");
    write(root, "src/readme.md", "# not jsx\n");

    let output = run_in(root, &["src", "--out-dir", "dist", "--source-maps", "file"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let app = fs::read_to_string(root.join("dist/App.js")).unwrap();
    assert_eq!(
        app,
        "import { jsx } from \"jsx-signals/runtime\";\n\
         export const App = () => jsx(\"p\", { children: () => count.get() });\n\
         //# sourceMappingURL=App.js.map\n"
    );

    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("dist/App.js.map")).unwrap()).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "App.js");
    assert_eq!(map["sources"][0], "App.jsx");

    assert!(root.join("dist/widgets/Card.js").exists());
    assert!(!root.join("dist/readme.js").exists());
}

#[test]
fn test_prints_to_stdout_without_out_dir() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "Hello.jsx", "<></>\n");

    let output = run_in(root, &["Hello.jsx", "--minified"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "// Hello.jsx\nimport{jsx,Fragment}from\"jsx-signals/runtime\";jsx(Fragment,{})\n"
    );
}

#[test]
fn test_config_file_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "jsx-transpile.json",
        r#"{
            // shared settings
            "runtimeModule": "@app/runtime",
            "defaultExt": "js",
            "outDir": "out"
        }"#,
    );
    write(root, "src/Main.jsx", "import { x } from \"./x\";\n<p />;\n");

    let output = run_in(root, &["src"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        fs::read_to_string(root.join("out/Main.js")).unwrap(),
        "import { jsx } from \"@app/runtime\";\nimport { x } from \"./x.js\";\njsx(\"p\", {});\n"
    );
}

#[test]
fn test_errors_fail_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/Good.jsx", "<p />;\n");
    write(root, "src/Bad.jsx", "const a = 1;\n<g xmlns=\"urn:bad\" />;\n");

    let output = run_in(root, &["src", "--out-dir", "dist"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Bad.jsx:2:4"), "stderr: {stderr}");
    assert!(stderr.contains("unrecognized xmlns value \"urn:bad\""));
    assert!(stderr.contains("1 error"));

    assert!(root.join("dist/Good.js").exists());
    assert!(!root.join("dist/Bad.js").exists());
}

#[test]
fn test_json_error_output() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "Broken.jsx", "<div>\n");

    let output = run_in(root, &["Broken.jsx", "--output", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let errors: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(errors[0]["code"], "parse-error");
    assert_eq!(errors[0]["filename"], "Broken.jsx");
}

#[test]
fn test_missing_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["does-not-exist"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("input not found"));
}
