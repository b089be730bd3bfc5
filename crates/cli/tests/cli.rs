use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const OPENAI_ROW: &str = "OpenAI,,,,,,,,OpenAI investment in Series B - Rival Labs,2023-05-01,N/A,,,,N/A,,,,,,,,";

/// Temp working dir with a portfolio CSV and no dynamic source.
fn workspace() -> TempDir {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("portfolio.csv"),
        format!("Firm,Score\n{OPENAI_ROW}\n"),
    )
    .unwrap();
    temp
}

#[allow(deprecated)]
fn vcscore(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vcscore").expect("binary");
    cmd.current_dir(workdir)
        .env("VCSCORE_DYNAMIC_SOURCE", "none")
        .env("VCSCORE_PORTFOLIO_CSV", workdir.join("portfolio.csv"))
        .env("VCSCORE_LOGO_CACHE", workdir.join("logo_cache.json"))
        .env_remove("VCSCORE_PAGE_SIZE")
        .env_remove("VCSCORE_ADMIN_TOKEN");
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn list_json_puts_openai_first_with_its_portfolio() {
    let temp = workspace();
    let body = json_stdout(vcscore(temp.path()).args(["--json", "list"]));

    let companies = body["companies"].as_array().unwrap();
    assert_eq!(companies.len(), 50);
    assert_eq!(companies[0]["name"], "OpenAI");
    assert_eq!(companies[0]["portfolio"][0]["name"], "Rival Labs");
    assert_eq!(companies[0]["portfolio"][0]["investmentType"], "Series B");
    assert_eq!(body["state"]["has_more"], true);
    assert_eq!(body["report"]["dynamic"], 0);
}

#[test]
fn list_pages_extend_the_visible_prefix() {
    let temp = workspace();
    let body = json_stdout(
        vcscore(temp.path())
            .env("VCSCORE_PAGE_SIZE", "10")
            .args(["--json", "list", "--pages", "3"]),
    );
    assert_eq!(body["state"]["loaded_count"], 30);
    assert_eq!(body["companies"].as_array().unwrap().len(), 30);
}

#[test]
fn search_is_case_insensitive() {
    let temp = workspace();
    let body = json_stdout(vcscore(temp.path()).args(["--json", "search", "OPENai"]));
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert!(names.contains(&"OpenAI"));
    assert!(names.iter().all(|n| n.to_lowercase().contains("openai")));
}

#[test]
fn show_unknown_firm_fails() {
    let temp = workspace();
    vcscore(temp.path())
        .args(["show", "no-such-firm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No firm with id"));
}

#[test]
fn show_prints_portfolio_and_generated_logo() {
    let temp = workspace();
    vcscore(temp.path())
        .args(["show", "openai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OpenAI (/vcs/openai)"))
        .stdout(predicate::str::contains("Rival Labs | 2023-05-01 | Series B"))
        .stdout(predicate::str::contains("data:image/svg+xml,"));
}

#[test]
fn logo_uses_manual_table_and_persists_cache() {
    let temp = workspace();
    let body = json_stdout(vcscore(temp.path()).args(["--json", "logo", "OpenAI"]));
    assert_eq!(body[0]["logo"], "https://logo.clearbit.com/openai.com");
    assert_eq!(body[0]["generated"], false);
    assert!(temp.path().join("logo_cache.json").exists());

    vcscore(temp.path())
        .args(["logo", "--clear-cache"])
        .assert()
        .success();
    assert!(!temp.path().join("logo_cache.json").exists());
}

#[test]
fn fetch_sheet_from_file_then_routes() {
    let temp = workspace();
    fs::write(
        temp.path().join("sheet.csv"),
        "Name,Score\nBreed VC,71\n,3\nY Combinator,n/a\n",
    )
    .unwrap();

    vcscore(temp.path())
        .args(["fetch-sheet", "--source", "sheet.csv", "--out", "data/vcs.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 2 VCs"));

    vcscore(temp.path())
        .args(["routes", "--from", "data/vcs.json"])
        .assert()
        .success()
        .stdout(predicate::eq("/vcs/breed-vc\n/vcs/y-combinator\n"));
}

#[test]
fn fetch_sheet_failure_writes_nothing() {
    let temp = workspace();
    vcscore(temp.path())
        .args(["fetch-sheet", "--source", "missing.csv", "--out", "vcs.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No VC rows fetched"));
    assert!(!temp.path().join("vcs.json").exists());
}

#[test]
fn serve_requires_admin_token() {
    let temp = workspace();
    vcscore(temp.path())
        .args(["serve", "--bind", "127.0.0.1:0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("serve requires an admin token"));
}

#[test]
fn serve_refuses_non_loopback_without_public() {
    let temp = workspace();
    vcscore(temp.path())
        .args(["serve", "--bind", "0.0.0.0:0", "--auth-token", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to bind"));
}

#[test]
fn zero_page_size_is_a_config_error() {
    let temp = workspace();
    vcscore(temp.path())
        .env("VCSCORE_PAGE_SIZE", "0")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("page_size must be > 0"));
}

#[test]
fn config_reflects_file_and_env_overrides() {
    let temp = workspace();
    fs::write(temp.path().join("vcscore.toml"), "page_size = 25\n").unwrap();
    vcscore(temp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("page_size = 25"))
        .stdout(predicate::str::contains("portfolio.csv"));
}
