use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("openrosa-xpath").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_eval_pretty() {
    cli()
        .args(["eval", "format-date(date('2015-10-01') + 3, '%a %e %b %Y')"])
        .assert()
        .success()
        .stdout(predicate::str::contains("'Sun 4 Oct 2015'"));
}

#[test]
fn test_eval_json_externalizes_dates() {
    cli()
        .args(["eval", "--format", "json", "date('1970-01-02')"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""resultType": "string""#))
        .stdout(predicate::str::contains(r#""numberValue": 86400000.0"#))
        .stdout(predicate::str::contains(r#""stringValue": "1970-01-02""#));
}

#[test]
fn test_eval_with_locale_file() {
    let dir = std::env::temp_dir().join(format!("openrosa-xpath-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let locale = dir.join("fr.json");
    fs::write(&locale, r#"{"date.month.10": "oct."}"#).unwrap();

    cli()
        .args(["eval", "format-date('2015-10-01', '%e %b')", "--locale"])
        .arg(&locale)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 oct."));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_eval_error_exits_with_failure() {
    cli()
        .args(["eval", "date('2015-01-01') + date('2015-01-02')"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to evaluate"));
}

#[test]
fn test_validate() {
    cli()
        .args(["validate", "if(true(), 'a', 'b')"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid expression"));

    cli()
        .args(["validate", "concat('a',"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid:"));
}

#[test]
fn test_functions_lists_aliases() {
    cli()
        .arg("functions")
        .assert()
        .success()
        .stdout(predicate::str::contains("format-date-time (2)"))
        .stdout(predicate::str::contains("join (at least 1)"))
        .stdout(predicate::str::contains("round (1 to 2)"));
}
