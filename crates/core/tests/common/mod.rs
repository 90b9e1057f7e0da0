#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// `readelf --wide --symbols` dump of a small shared object.
pub const READELF_SHARED: &str = "
Symbol table '.dynsym' contains 6 entries:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     0: 0000000000000000     0 NOTYPE  LOCAL  DEFAULT  UND
     1: 0000000000000000     0 FUNC    GLOBAL DEFAULT  UND puts@GLIBC_2.2.5 (2)
     2: 0000000000001139    11 FUNC    GLOBAL DEFAULT   14 _ZN3foo3barEv
     3: 0000000000004010     4 OBJECT  GLOBAL DEFAULT   24 counter
     4: 0000000000001000     0 FUNC    GLOBAL DEFAULT   12 _init
     5: 0000000000000000     0 NOTYPE  WEAK   DEFAULT  UND __gmon_start__

Symbol table '.symtab' contains 2 entries:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     0: 0000000000000000     0 NOTYPE  LOCAL  DEFAULT  UND
     1: 0000000000000000     0 FILE    LOCAL  DEFAULT  ABS crtstuff.c
";

/// One archive member's `.symtab` section as readelf prints it.
pub fn readelf_member(archive: &str, member: &str, entries: &[&str]) -> String {
    let mut out = format!(
        "\nFile: {archive}({member})\n\nSymbol table '.symtab' contains {} entries:\n",
        entries.len() + 1
    );
    out.push_str("   Num:    Value          Size Type    Bind   Vis      Ndx Name\n");
    out.push_str("     0: 0000000000000000     0 NOTYPE  LOCAL  DEFAULT  UND \n");
    for (idx, entry) in entries.iter().enumerate() {
        out.push_str(&format!("     {}: {entry}\n", idx + 1));
    }
    out
}

/// `nm -P -g` listing of a small shared object.
pub const NM_SHARED: &str = "\
_ZN3foo3barEv T 1139 b
counter D 4010 4
buffer B 4020 100
puts@@GLIBC_2.2.5 U
local_helper t 1200 8
_init T 1000
__bss_start B 4018
weak_hook W 1300 4
abs_marker A 0
";

/// Write an executable shell script standing in for an inspection tool.
///
/// The script records its arguments to `<name>.args`, prints `stdout`, writes
/// a diagnostic to stderr and exits with `exit_code`.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, stdout: &str, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let out_path = dir.join(format!("{name}.out"));
    fs::write(&out_path, stdout).expect("write fake output");
    let args_path = dir.join(format!("{name}.args"));
    let script = dir.join(name);
    fs::write(
        &script,
        format!(
            "#!/bin/sh\necho \"$@\" > '{}'\ncat '{}'\necho 'diagnostic from {name}' >&2\nexit {exit_code}\n",
            args_path.display(),
            out_path.display()
        ),
    )
    .expect("write fake tool");
    let mut perms = fs::metadata(&script).expect("stat fake tool").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script, perms).expect("chmod fake tool");
    script
}

pub fn recorded_args(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(format!("{name}.args"))).expect("fake tool args").trim().to_string()
}

/// A file that sniffs as an ELF shared object.
pub fn write_fake_elf(path: &Path) {
    let mut bytes = vec![0x7f, b'E', b'L', b'F', 2, 1, 1, 0];
    bytes.resize(64, 0);
    fs::write(path, bytes).expect("write fake elf");
}
