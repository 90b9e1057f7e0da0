#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub const FOO: &str = r#"{"name":"foo","type":"FUNC","is_defined":true}"#;
pub const BAR: &str = r#"{"name":"bar","type":"FUNC","is_defined":true}"#;
pub const PUTS: &str = r#"{"name":"puts@GLIBC_2.2.5","type":"U","is_defined":false}"#;
pub const COUNTER_4: &str = r#"{"name":"counter","type":"OBJECT","is_defined":true,"size":4}"#;
pub const COUNTER_8: &str = r#"{"name":"counter","type":"OBJECT","is_defined":true,"size":8}"#;

/// The binary with every `SYMCHECK_*` variable and `RUST_LOG` cleared.
pub fn sym_check() -> Command {
    let mut cmd = cargo_bin_cmd!("sym-check");
    for var in ["SYMCHECK_CONFIG", "SYMCHECK_READELF", "SYMCHECK_NM", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Write a symbol list with one record per line.
pub fn write_symbols(dir: &Path, name: &str, records: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut body = records.join("\n");
    body.push('\n');
    fs::write(&path, body).expect("write symbol list");
    path
}

/// A file that sniffs as an ELF shared object.
pub fn write_fake_elf(path: &Path) {
    let mut bytes = vec![0x7f, b'E', b'L', b'F', 2, 1, 1, 0];
    bytes.resize(64, 0);
    fs::write(path, bytes).expect("write fake elf");
}

/// A shell script printing `stdout` and exiting 0, standing in for readelf or nm.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, stdout: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let out_path = dir.join(format!("{name}.out"));
    fs::write(&out_path, stdout).expect("write fake output");
    let script = dir.join(name);
    fs::write(&script, format!("#!/bin/sh\n/bin/cat '{}'\n", out_path.display()))
        .expect("write fake tool");
    let mut perms = fs::metadata(&script).expect("stat fake tool").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script, perms).expect("chmod fake tool");
    script
}

/// A tool that touches `started` and then blocks, so a run can be interrupted mid-extraction.
#[cfg(unix)]
pub fn blocking_tool(dir: &Path, name: &str, started: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join(name);
    fs::write(&script, format!("#!/bin/sh\ntouch '{}'\nexec sleep 10\n", started.display()))
        .expect("write blocking tool");
    let mut perms = fs::metadata(&script).expect("stat blocking tool").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script, perms).expect("chmod blocking tool");
    script
}

/// Write a JSON config file and return its path.
pub fn write_config(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("symcheck.json");
    fs::write(&path, json).expect("write config");
    path
}

pub const READELF_SHARED: &str = "
Symbol table '.dynsym' contains 4 entries:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     0: 0000000000000000     0 NOTYPE  LOCAL  DEFAULT  UND
     1: 0000000000000000     0 FUNC    GLOBAL DEFAULT  UND puts@GLIBC_2.2.5 (2)
     2: 0000000000001139    11 FUNC    GLOBAL DEFAULT   14 _ZNSt3__14sortEv
     3: 0000000000004010     4 OBJECT  GLOBAL DEFAULT   24 counter
";

pub const NM_SHARED: &str = "\
counter D 4010 4
puts@@GLIBC_2.2.5 U
";
