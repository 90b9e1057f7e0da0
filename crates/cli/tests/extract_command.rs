#![cfg(unix)]

mod common;

use std::fs;

use common::{
    fake_tool, sym_check, write_config, write_fake_elf, NM_SHARED, READELF_SHARED,
};
use predicates::prelude::*;
use tempfile::tempdir;

const SORT: &str = r#"{"name":"_ZNSt3__14sortEv","type":"FUNC","is_defined":true}"#;
const COUNTER: &str = r#"{"name":"counter","type":"OBJECT","is_defined":true,"size":4}"#;
const PUTS: &str = r#"{"name":"puts@GLIBC_2.2.5","type":"FUNC","is_defined":false}"#;

#[test]
fn extract_writes_sorted_records_from_readelf() {
    let temp = tempdir().unwrap();
    let readelf = fake_tool(temp.path(), "readelf", READELF_SHARED);
    let config =
        write_config(temp.path(), &format!(r#"{{ "readelf": "{}" }}"#, readelf.display()));
    let lib = temp.path().join("libfoo.so");
    write_fake_elf(&lib);

    sym_check()
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&lib)
        .assert()
        .success()
        .stdout(predicate::eq(format!("{SORT}\n{COUNTER}\n{PUTS}\n")));
}

#[test]
fn extract_filters_and_writes_to_file() {
    let temp = tempdir().unwrap();
    let readelf = fake_tool(temp.path(), "readelf", READELF_SHARED);
    let config =
        write_config(temp.path(), &format!(r#"{{ "readelf": "{}" }}"#, readelf.display()));
    let lib = temp.path().join("libfoo.so");
    write_fake_elf(&lib);
    let out = temp.path().join("libfoo.sym");

    sym_check()
        .arg("--config")
        .arg(&config)
        .args(["extract", "--defined-only", "--only-stdlib-symbols", "--names-only", "-o"])
        .arg(&out)
        .arg(&lib)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&out).unwrap(), "_ZNSt3__14sortEv\n");
}

#[test]
fn nm_tool_from_environment_is_used_when_forced() {
    let temp = tempdir().unwrap();
    let nm = fake_tool(temp.path(), "nm", NM_SHARED);
    let config = write_config(temp.path(), r#"{ "backend": "nm" }"#);
    let lib = temp.path().join("libfoo.so");
    write_fake_elf(&lib);

    sym_check()
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&lib)
        .env("SYMCHECK_NM", &nm)
        .assert()
        .success()
        .stdout(predicate::str::contains(COUNTER))
        .stdout(predicate::str::contains(r#""name":"puts@GLIBC_2.2.5","type":"U""#));
}

#[test]
fn config_from_environment_variable() {
    let temp = tempdir().unwrap();
    let readelf = fake_tool(temp.path(), "readelf", READELF_SHARED);
    let config =
        write_config(temp.path(), &format!(r#"{{ "readelf": "{}" }}"#, readelf.display()));
    let lib = temp.path().join("libfoo.so");
    write_fake_elf(&lib);

    sym_check()
        .arg("extract")
        .arg(&lib)
        .env("SYMCHECK_CONFIG", &config)
        .assert()
        .success()
        .stdout(predicate::str::contains(SORT));
}

#[test]
fn missing_tools_are_reported() {
    let temp = tempdir().unwrap();
    let lib = temp.path().join("libfoo.so");
    write_fake_elf(&lib);

    sym_check()
        .arg("extract")
        .arg(&lib)
        .env("PATH", temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No symbol extraction tool available"));
}

#[test]
fn invalid_config_is_reported() {
    let temp = tempdir().unwrap();
    let config = write_config(temp.path(), r#"{ "objdump": "/usr/bin/objdump" }"#);
    let lib = temp.path().join("libfoo.so");
    write_fake_elf(&lib);

    sym_check()
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&lib)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn extracted_snapshot_diffs_cleanly_against_the_library() {
    let temp = tempdir().unwrap();
    let readelf = fake_tool(temp.path(), "readelf", READELF_SHARED);
    let config =
        write_config(temp.path(), &format!(r#"{{ "readelf": "{}" }}"#, readelf.display()));
    let lib = temp.path().join("libfoo.so");
    write_fake_elf(&lib);
    let snapshot = temp.path().join("libfoo.sym");

    sym_check()
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&lib)
        .arg("-o")
        .arg(&snapshot)
        .assert()
        .success();
    sym_check()
        .arg("--config")
        .arg(&config)
        .arg("diff")
        .arg(&snapshot)
        .arg(&lib)
        .assert()
        .code(0)
        .stdout(predicate::eq("Symbols match.\n"));
}
