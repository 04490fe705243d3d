#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use muster::data_generator::RosterGenerator;
use serde_json::{json, Value};
use tempfile::TempDir;
use time::macros::date;

const TODAY: &str = "2024-06-15";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        self.write(name, &serde_json::to_string_pretty(value).expect("json"))
    }

    /// Command isolated from any user configuration.
    fn muster(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("muster");
        cmd.env_remove("MUSTER_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.dir.path().join("absent.toml"))
            .args(["--today", TODAY, "--plain"]);
        cmd
    }
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("valid json")
}

fn army_query(path: &Path) -> Vec<&str> {
    vec!["query", "--query", path.to_str().expect("utf-8 path")]
}

#[test]
fn fields_lists_registry_with_operators() {
    let ws = Workspace::new();
    let json = stdout_json(ws.muster().args(["--format", "json", "fields", "--type", "select"]));
    let fields = json.as_array().expect("array");
    assert!(!fields.is_empty());
    assert!(fields.iter().all(|f| f["type"] == "select"));
    let branch = fields.iter().find(|f| f["key"] == "branch").expect("branch");
    assert_eq!(branch["operators"], json!(["equals", "not_equals", "in", "not_in"]));
    assert!(branch["options"].as_array().is_some_and(|o| o.contains(&json!("Army"))));
}

#[test]
fn query_runs_over_a_roster_file() {
    let ws = Workspace::new();
    let roster = ws.write_json(
        "roster.json",
        &serde_json::to_value(
            RosterGenerator::with_anchor(5, date!(2024 - 06 - 15)).generate_personnel(40),
        )
        .expect("roster json"),
    );
    let query = ws.write_json(
        "army.json",
        &json!({
            "name": "Army only",
            "group": {
                "id": "g1",
                "logic": "AND",
                "conditions": [
                    {"id": "c1", "field": "branch", "operator": "equals", "value": "Army"}
                ]
            }
        }),
    );
    let json = stdout_json(
        ws.muster()
            .args(["--format", "json", "--roster"])
            .arg(&roster)
            .args(army_query(&query))
            .args(["--limit", "3"]),
    );
    assert_eq!(json["name"], "Army only");
    assert_eq!(json["total"], 40);
    let matched = json["matched"].as_u64().expect("matched");
    assert!(matched > 0 && matched <= 40);
    let records = json["records"].as_array().expect("records");
    assert_eq!(records.len() as u64, matched.min(3));
    assert!(records.iter().all(|r| r["branch"] == "Army"));
}

#[test]
fn query_accepts_a_bare_group_and_generated_roster() {
    let ws = Workspace::new();
    let query = ws.write_json(
        "eligible.json",
        &json!({
            "id": "root",
            "logic": "OR",
            "conditions": [
                {"id": "c1", "field": "deploymentEligible", "operator": "is_true"}
            ]
        }),
    );
    let json = stdout_json(
        ws.muster()
            .args(["--format", "json", "--size", "25", "--seed", "9"])
            .args(army_query(&query)),
    );
    assert_eq!(json["total"], 25);
    assert!(json.get("name").is_none());
    assert!(json["records"]
        .as_array()
        .expect("records")
        .iter()
        .all(|r| r["deploymentEligible"] == true));
}

#[test]
fn validate_exits_with_two_on_issues() {
    let ws = Workspace::new();
    let broken = ws.write_json(
        "broken.json",
        &json!({
            "id": "root",
            "logic": "AND",
            "conditions": [
                {"id": "c1", "field": "doesNotExist", "operator": "equals", "value": "x"},
                {"id": "c2", "field": "ptTestScore", "operator": "contains", "value": "2"}
            ]
        }),
    );
    let output = ws
        .muster()
        .args(["--format", "json", "validate", "--query"])
        .arg(&broken)
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["valid"], false);
    let codes: Vec<&str> = json["issues"]
        .as_array()
        .expect("issues")
        .iter()
        .filter_map(|i| i["code"].as_str())
        .collect();
    assert_eq!(codes.len(), 2);
    assert_eq!(json["issues"][0]["condition"], "c1");

    let clean = ws.write_json(
        "clean.json",
        &json!({"id": "root", "logic": "AND", "conditions": []}),
    );
    ws.muster()
        .args(["validate", "--query"])
        .arg(&clean)
        .assert()
        .success();
}

#[test]
fn stats_scopes_to_a_unit() {
    let ws = Workspace::new();
    let all = stdout_json(ws.muster().args(["--format", "json", "stats"]));
    let company = stdout_json(ws.muster().args(["--format", "json", "stats", "--unit", "bn-a"]));
    assert_eq!(all["summary"]["total"], 200);
    let scoped = company["summary"]["total"].as_u64().expect("total");
    assert!(scoped > 0 && scoped < 200);
    assert_eq!(company["unit"], "bn-a");
    assert_eq!(company["today"], TODAY);
    assert!(company["reports"]["readiness"]["avgPtScore"].is_number());
    assert!(company["reports"]["medical"]["byReadiness"].is_array());
}

#[test]
fn stats_with_unknown_unit_fails() {
    let ws = Workspace::new();
    let output = ws
        .muster()
        .args(["stats", "--unit", "nowhere"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.starts_with("error:"), "{stderr}");
    assert!(stderr.contains("nowhere"), "{stderr}");
}

#[test]
fn stats_resolves_units_from_a_file() {
    let ws = Workspace::new();
    let mut roster = serde_json::to_value(
        RosterGenerator::with_anchor(3, date!(2024 - 06 - 15)).generate_personnel(30),
    )
    .expect("roster json");
    for (index, member) in roster.as_array_mut().expect("array").iter_mut().enumerate() {
        member["unitId"] = json!(if index % 3 == 0 { "east" } else { "west" });
    }
    let roster = ws.write_json("roster.json", &roster);
    let units = ws.write_json(
        "units.json",
        &json!([
            {"id": "div", "name": "Division", "echelon": "battalion"},
            {"id": "east", "name": "East", "parentId": "div", "echelon": "company"},
            {"id": "west", "name": "West", "parentId": "div", "echelon": "company"}
        ]),
    );
    let stats = |unit: &str| {
        stdout_json(
            ws.muster()
                .args(["--format", "json", "--roster"])
                .arg(&roster)
                .args(["stats", "--unit", unit, "--units"])
                .arg(&units),
        )
    };
    assert_eq!(stats("east")["summary"]["total"], 10);
    assert_eq!(stats("west")["summary"]["total"], 20);
    assert_eq!(stats("div")["summary"]["total"], 30);

    // the generated tree knows nothing about these ids
    ws.muster()
        .arg("--roster")
        .arg(&roster)
        .args(["stats", "--unit", "east"])
        .assert()
        .code(1);
}

#[test]
fn fairness_reports_every_unit() {
    let ws = Workspace::new();
    let json = stdout_json(ws.muster().args([
        "--format",
        "json",
        "fairness",
        "--days",
        "14",
        "--threshold",
        "0.1",
    ]));
    assert_eq!(json["start"], TODAY);
    assert_eq!(json["days"], 14);
    let report = &json["report"];
    assert_eq!(report["imbalanceThreshold"], 0.1);
    let rows = report["rows"].as_array().expect("rows");
    assert!(!rows.is_empty());
    for row in rows {
        if row["rateDefined"] == true {
            assert_eq!(row["totalEvents"], 14);
        }
    }
}

#[test]
fn config_file_drives_strict_mode() {
    let ws = Workspace::new();
    let config = ws.write("strict.toml", "[query]\nstrict = true\n");
    let query = ws.write_json(
        "bad.json",
        &json!({
            "id": "root",
            "logic": "AND",
            "conditions": [
                {"id": "c1", "field": "doesNotExist", "operator": "equals", "value": "x"}
            ]
        }),
    );
    let output = cargo_bin_cmd!("muster")
        .env_remove("MUSTER_CONFIG")
        .arg("--config")
        .arg(&config)
        .args(army_query(&query))
        .assert()
        .code(1)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("error:"));

    let invalid = ws.write("invalid.toml", "[query]\nunknown_key = 1\n");
    cargo_bin_cmd!("muster")
        .env_remove("MUSTER_CONFIG")
        .arg("--config")
        .arg(&invalid)
        .arg("fields")
        .assert()
        .code(1);
}

#[test]
fn text_output_is_plain_when_requested() {
    let ws = Workspace::new();
    let output = ws
        .muster()
        .args(["stats"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("Summary"));
    assert!(!text.contains('\u{1b}'), "no escape codes");
}
