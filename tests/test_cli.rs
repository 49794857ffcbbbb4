mod fixtures;

use fixtures::*;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn it_writes_one_file_per_weight() {
    let d = tempdir().unwrap();
    let input = stage_drell_yan_sample(d.path());

    let mut cmd = Command::new(assert_cmd::cargo_bin!("lhe_split"));
    cmd.arg(&input);
    cmd.assert().success();

    for id in ["1001", "1002", "2001"] {
        let output = d.path().join(format!("drell_yan_scale_variations.{id}.lhe"));
        assert!(output.exists(), "expected {} to be written", output.display());
    }
}

#[test]
fn it_requires_an_input_argument() {
    Command::new(assert_cmd::cargo_bin!("lhe_split"))
        .assert()
        .failure();
}

#[test]
fn it_fails_cleanly_on_a_missing_input() {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("lhe_split"));
    cmd.arg("no_such_file.lhe");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no_such_file.lhe"));
}

#[test]
fn it_exits_cleanly_when_there_is_nothing_to_split() {
    let d = tempdir().unwrap();
    let input = stage_input(
        d.path(),
        "plain.lhe",
        "<LesHouchesEvents version=\"3.0\">\n<header>\n</header>\n<init>\ni\n</init>\n\
         <event>\ne\n<rwgt>\n<wgt id='1001'> 1.0 </wgt>\n</rwgt>\n</event>\n\
         </LesHouchesEvents>\n",
    );

    let mut cmd = Command::new(assert_cmd::cargo_bin!("lhe_split"));
    cmd.arg(&input);
    cmd.assert().success();

    assert_eq!(fs::read_dir(d.path()).unwrap().count(), 1);
}

#[test]
fn it_overwrites_existing_outputs_when_confirmation_is_disabled() {
    let d = tempdir().unwrap();
    let input = stage_drell_yan_sample(d.path());

    let existing = d.path().join("drell_yan_scale_variations.1001.lhe");
    fs::write(&existing, "stale content").unwrap();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("lhe_split"));
    cmd.arg("--no-confirm-overwrite").arg(&input);
    cmd.assert().success();

    let rewritten = fs::read_to_string(&existing).unwrap();
    assert!(rewritten.starts_with("<LesHouchesEvents"));
}

#[test]
fn it_refuses_to_overwrite_a_directory() {
    let d = tempdir().unwrap();
    let input = stage_drell_yan_sample(d.path());

    fs::create_dir(d.path().join("drell_yan_scale_variations.1001.lhe")).unwrap();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("lhe_split"));
    cmd.arg("--no-confirm-overwrite").arg(&input);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("refusing to overwrite"));
}
