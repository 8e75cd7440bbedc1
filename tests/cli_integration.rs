//! CLI Integration Tests
//!
//! Tests the command-line interface end-to-end. Nothing reaches the real
//! network: model calls go to a local stub server.

use std::net::SocketAddr;
use std::path::Path;

use assert_cmd::Command;
use assert_fs::prelude::*;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Get the binary to test.
fn specboard() -> Command {
    Command::cargo_bin("specboard").unwrap()
}

// ============================================================================
// Help & Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    specboard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub issues"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--ignore-existing"))
        .stdout(predicate::str::contains("--env-file"));
}

#[test]
fn test_short_help_flag() {
    specboard().arg("-h").assert().success().stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    specboard()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// Usage Error Tests
// ============================================================================

#[test]
fn test_missing_pdf_argument() {
    specboard().assert().code(2).stderr(predicate::str::contains("<PDF>"));
}

#[test]
fn test_nonexistent_pdf() {
    let temp = assert_fs::TempDir::new().unwrap();

    specboard()
        .current_dir(temp.path())
        .arg("missing.pdf")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn test_directory_instead_of_pdf() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("docs").create_dir_all().unwrap();

    specboard()
        .current_dir(temp.path())
        .arg("docs")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a file"));
}

#[test]
fn test_unknown_flag() {
    specboard().args(["--frobnicate", "spec.pdf"]).assert().code(2);
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_missing_configuration_lists_variables() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("spec.pdf").write_str("%PDF-1.4\n").unwrap();

    specboard()
        .env_clear()
        .current_dir(temp.path())
        .arg("spec.pdf")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("GEMINI_API_KEY"))
        .stderr(predicate::str::contains("GITHUB_AREA_FIELD_ID"));
}

#[test]
fn test_env_file_partially_configures() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("spec.pdf").write_str("%PDF-1.4\n").unwrap();
    temp.child("board.env").write_str("GEMINI_API_KEY=key\nGITHUB_TOKEN=token\n").unwrap();

    specboard()
        .env_clear()
        .current_dir(temp.path())
        .args(["--env-file", "board.env", "spec.pdf"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("GITHUB_OWNER"))
        .stderr(predicate::str::contains("GEMINI_API_KEY,").not());
}

#[test]
fn test_missing_env_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("spec.pdf").write_str("%PDF-1.4\n").unwrap();

    specboard()
        .env_clear()
        .current_dir(temp.path())
        .args(["--env-file", "absent.env", "spec.pdf"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("absent.env"));
}

// ============================================================================
// Run Tests (local model stub)
// ============================================================================

/// Write a one-page PDF with each line drawn as its own text run.
fn write_pdf(path: &Path, lines: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Whether a raw HTTP request has its full body, per `Content-Length`.
fn request_complete(request: &[u8]) -> bool {
    let Some(split) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&request[..split]);
    let length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() - (split + 4) >= length
}

/// Answer every request with `body` as JSON.
async fn serve_json(listener: tokio::net::TcpListener, body: String) {
    while let Ok((mut stream, _)) = listener.accept().await {
        let body = body.clone();
        tokio::spawn(async move {
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&request) {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });
    }
}

/// Start a model stub whose every completion is `text`.
fn start_model_stub(rt: &tokio::runtime::Runtime, text: &str) -> SocketAddr {
    let listener = rt.block_on(tokio::net::TcpListener::bind("127.0.0.1:0")).unwrap();
    let addr = listener.local_addr().unwrap();
    let reply = serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    });
    rt.spawn(serve_json(listener, reply.to_string()));
    addr
}

/// Binary with a complete configuration pointing the model at `addr`.
fn configured(temp: &assert_fs::TempDir, addr: SocketAddr) -> Command {
    let mut cmd = specboard();
    cmd.env_clear()
        .current_dir(temp.path())
        .env("GEMINI_API_KEY", "key")
        .env("GEMINI_BASE_URL", format!("http://{}", addr))
        .env("GITHUB_TOKEN", "token")
        .env("GITHUB_OWNER", "acme")
        .env("GITHUB_REPO", "shop")
        .env("GITHUB_PROJECT_ID", "PVT_main")
        .env("GITHUB_STATUS_FIELD_ID", "F_status")
        .env("GITHUB_AREA_FIELD_ID", "F_area");
    cmd
}

#[test]
fn test_no_cards_generated() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let addr = start_model_stub(&rt, "[]");

    let temp = assert_fs::TempDir::new().unwrap();
    write_pdf(temp.child("spec.pdf").path(), &["Login", "Users sign in with email"]);

    configured(&temp, addr)
        .args(["--ignore-existing", "spec.pdf"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No cards generated"));
}

#[test]
fn test_dry_run_prints_cards() {
    let cards = r#"[
        {"title": "Login screen", "description": "Form at /login", "type": "FrontEnd",
         "acceptance_criteria": ["Shows email field"], "parent_index": null},
        {"title": "Login API", "description": "POST /auth/login", "type": "BackEnd",
         "acceptance_criteria": [], "parent_index": 0}
    ]"#;
    let rt = tokio::runtime::Runtime::new().unwrap();
    let addr = start_model_stub(&rt, cards);

    let temp = assert_fs::TempDir::new().unwrap();
    write_pdf(temp.child("spec.pdf").path(), &["Login", "Users sign in with email"]);

    configured(&temp, addr)
        .args(["--dry-run", "--ignore-existing", "spec.pdf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Front-End] Login screen"))
        .stdout(predicate::str::contains("[Back-End] Login API (parent: 0)"))
        .stdout(predicate::str::contains("Dry run: 2 cards generated"));
}
