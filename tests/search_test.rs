use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_artifact(output_dir: &Path, name: &str, payload: serde_json::Value) {
    fs::create_dir_all(output_dir).expect("mkdir output");
    fs::write(output_dir.join(name), payload.to_string()).expect("write artifact");
}

fn sspgeo(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sspgeo").expect("binary");
    cmd.current_dir(home).env("SSP_HOME", home);
    cmd
}

#[test]
fn search_returns_only_the_record_within_radius() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("ssp-data");
    let output = home.join("output");

    write_artifact(
        &output,
        "dados_criminais_2023.json",
        json!({ "dados": [{ "latitude": -23.5505, "longitude": -46.6333 }] }),
    );
    // ~10 km north of the query point
    write_artifact(
        &output,
        "dados_criminais_2024.json",
        json!({ "dados": [{ "latitude": -23.4605, "longitude": -46.6333 }] }),
    );

    sspgeo(&home)
        .args([
            "search",
            "--query",
            "-23.5505,-46.6333",
            "--radius",
            "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("matches=1"))
        .stdout(predicate::str::contains(
            "scanned 2 records across available artifacts",
        ));
}

#[test]
fn search_by_street_name_uses_the_dataset() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("ssp-data");
    let output = home.join("output");

    write_artifact(
        &output,
        "dados_criminais_2023.json",
        json!({ "dados": [{
            "endereco": "Avenida Paulista, 1578",
            "latitude": -23.5614,
            "longitude": -46.6559,
        }] }),
    );

    sspgeo(&home)
        .args(["search", "--query", "avenida paulista", "--radius", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matches=1"));
}

#[test]
fn search_with_unresolvable_query_fails() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("ssp-data");
    let output = home.join("output");

    write_artifact(
        &output,
        "dados_criminais_2023.json",
        json!({ "dados": [{ "latitude": 0.0, "longitude": 0.0 }] }),
    );

    sspgeo(&home)
        .args(["search", "--query", "rua que nao existe", "--radius", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not be resolved"));
}

#[test]
fn search_export_writes_a_result_file() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("ssp-data");
    let output = home.join("output");

    write_artifact(
        &output,
        "dados_criminais_2023.json",
        json!({ "dados": [{ "latitude": 0.0, "longitude": 0.0 }] }),
    );

    sspgeo(&home)
        .args([
            "search",
            "--query",
            "0,0",
            "--radius",
            "5",
            "--output-file",
            "resultado.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("exported"));

    let raw = fs::read_to_string(output.join("resultado.json")).expect("read export");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("parse export");
    assert_eq!(
        value.get("total_records_scanned").and_then(|v| v.as_u64()),
        Some(1)
    );
}
