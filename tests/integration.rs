use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn qakb_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("qakb");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("alpha.md"),
        "# Alpha Document\n\nThis is the alpha document about Rust programming.\n\nIt contains information about cargo and crates.",
    )
    .unwrap();
    fs::write(
        files_dir.join("beta.txt"),
        "Beta plain text file about deployment.\n\nKubernetes and Docker are mentioned here.",
    )
    .unwrap();
    fs::write(files_dir.join("gamma.json"), "{\"feature\":\"discount\"}").unwrap();

    fs::write(
        root.join("checkout.html"),
        "<html><body><input id=\"discount\" name=\"discount\"></body></html>",
    )
    .unwrap();

    let config_content = format!(
        r#"[index]
dir = "{}/data/index"

[chunking]
chunk_size = 800
overlap = 150

[retrieval]
top_k = 6

[embedding]
provider = "hashed"
dims = 128
"#,
        root.display()
    );

    let config_path = config_dir.join("qakb.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_qakb(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = qakb_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run qakb binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn build(tmp: &TempDir, config_path: &Path) -> (String, String, bool) {
    let files = tmp.path().join("files");
    let page = tmp.path().join("checkout.html");
    run_qakb(
        config_path,
        &[
            "build",
            "--docs",
            files.to_str().unwrap(),
            "--page",
            page.to_str().unwrap(),
        ],
    )
}

#[test]
fn test_build_reports_counts() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = build(&tmp, &config_path);
    assert!(success, "build failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("documents: 3"));
    assert!(stdout.contains("chunks indexed: 3"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_query_returns_labeled_context() {
    let (tmp, config_path) = setup_test_env();
    build(&tmp, &config_path);

    let (stdout, stderr, success) =
        run_qakb(&config_path, &["query", "rust cargo crates programming"]);
    assert!(success, "query failed: stdout={}, stderr={}", stdout, stderr);
    // The Rust-related document ranks first under the hashed embedder.
    assert!(
        stdout.trim_start().starts_with("[Source: alpha.md, Chunk: 0]"),
        "unexpected output: {}",
        stdout
    );
}

#[test]
fn test_query_top_k_limits_blocks() {
    let (tmp, config_path) = setup_test_env();
    build(&tmp, &config_path);

    let (stdout, _, success) = run_qakb(
        &config_path,
        &["query", "rust deployment discount", "--top-k", "1"],
    );
    assert!(success);
    assert_eq!(stdout.matches("[Source:").count(), 1);
}

#[test]
fn test_query_before_build_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_qakb(&config_path, &["query", "anything"]);
    assert!(!success, "query should fail before any build: {}", stdout);
    assert!(
        stderr.contains("not been built"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn test_rebuild_replaces_previous_documents() {
    let (tmp, config_path) = setup_test_env();
    build(&tmp, &config_path);

    // Second build from a different document set.
    let other_dir = tmp.path().join("other");
    fs::create_dir_all(&other_dir).unwrap();
    fs::write(
        other_dir.join("delta.md"),
        "Delta document about payment gateways and refunds.",
    )
    .unwrap();
    let page = tmp.path().join("checkout.html");
    let (_, _, success) = run_qakb(
        &config_path,
        &[
            "build",
            "--docs",
            other_dir.to_str().unwrap(),
            "--page",
            page.to_str().unwrap(),
        ],
    );
    assert!(success);

    let (stdout, _, success) = run_qakb(&config_path, &["query", "rust payment refunds"]);
    assert!(success);
    assert!(!stdout.contains("alpha.md"), "stale chunk leaked: {}", stdout);
    assert!(stdout.contains("delta.md"));
}

#[test]
fn test_status_before_and_after_build() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_qakb(&config_path, &["status"]);
    assert!(success);
    assert!(stdout.contains("not built"));

    build(&tmp, &config_path);

    let (stdout, _, success) = run_qakb(&config_path, &["status"]);
    assert!(success);
    assert!(stdout.contains("knowledge base: built"));
    assert!(stdout.contains("documents: 3"));
}

#[test]
fn test_build_requires_supported_documents() {
    let (tmp, config_path) = setup_test_env();

    let empty_dir = tmp.path().join("empty");
    fs::create_dir_all(&empty_dir).unwrap();
    let page = tmp.path().join("checkout.html");

    let (_, stderr, success) = run_qakb(
        &config_path,
        &[
            "build",
            "--docs",
            empty_dir.to_str().unwrap(),
            "--page",
            page.to_str().unwrap(),
        ],
    );
    assert!(!success);
    assert!(stderr.contains("no support documents"));
}
