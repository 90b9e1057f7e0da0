mod common;

use common::{readelf_member, READELF_SHARED};
use symcheck_core::model::{MergePolicy, SymbolKind, SymbolRecord};
use symcheck_core::services::backends::readelf::parse_readelf_output;
use symcheck_core::services::extract::ExtractError;

const DEF_G: &str = "0000000000000000    12 FUNC    GLOBAL DEFAULT    1 g";
const UND_G: &str = "0000000000000000     0 NOTYPE  GLOBAL DEFAULT  UND g";
const UND_G_FUNC: &str = "0000000000000000     0 FUNC    GLOBAL DEFAULT  UND g";

#[test]
fn shared_object_uses_only_dynsym() {
    let set = parse_readelf_output(READELF_SHARED, false, MergePolicy::FirstWins).unwrap();

    assert_eq!(set.names().collect::<Vec<_>>(), vec!["_ZN3foo3barEv", "counter", "puts@GLIBC_2.2.5"]);
    assert_eq!(set.get("puts@GLIBC_2.2.5").unwrap(), &SymbolRecord::function("puts@GLIBC_2.2.5", false));
    assert_eq!(set.get("_ZN3foo3barEv").unwrap(), &SymbolRecord::function("_ZN3foo3barEv", true));
    assert_eq!(set.get("counter").unwrap(), &SymbolRecord::object("counter", true, Some(4)));
    assert!(!set.contains("_init"));
    assert!(!set.contains("__gmon_start__"));
}

#[test]
fn archive_prefers_definition_regardless_of_member_order() {
    let defining_first = format!(
        "{}{}",
        readelf_member("libx.a", "def.o", &[DEF_G]),
        readelf_member("libx.a", "use.o", &[UND_G_FUNC])
    );
    let using_first = format!(
        "{}{}",
        readelf_member("libx.a", "use.o", &[UND_G_FUNC]),
        readelf_member("libx.a", "def.o", &[DEF_G])
    );

    for output in [defining_first, using_first] {
        let set = parse_readelf_output(&output, true, MergePolicy::FirstWins).unwrap();
        assert_eq!(set.len(), 1);
        let g = set.get("g").unwrap();
        assert!(g.is_defined);
        assert_eq!(g.kind, SymbolKind::Func);
        assert_eq!(g.origin.as_deref(), Some("libx.a(def.o)"));
    }
}

#[test]
fn archive_ignores_notype_references() {
    let output = format!(
        "{}{}",
        readelf_member("libx.a", "use.o", &[UND_G]),
        readelf_member("libx.a", "def.o", &[DEF_G])
    );
    let set = parse_readelf_output(&output, true, MergePolicy::FirstWins).unwrap();
    assert_eq!(set.get("g").unwrap().origin.as_deref(), Some("libx.a(def.o)"));
}

#[test]
fn archive_with_single_member_is_accepted() {
    let output = readelf_member(
        "libx.a",
        "only.o",
        &["0000000000000000     8 OBJECT  GLOBAL DEFAULT    3 table"],
    );
    let set = parse_readelf_output(&output, true, MergePolicy::FirstWins).unwrap();
    let table = set.get("table").unwrap();
    assert_eq!(table.size, Some(8));
    assert_eq!(table.origin.as_deref(), Some("libx.a(only.o)"));
}

#[test]
fn strict_policy_rejects_two_strong_definitions() {
    let output = format!(
        "{}{}",
        readelf_member("libx.a", "a.o", &[DEF_G]),
        readelf_member("libx.a", "b.o", &[DEF_G])
    );
    let err = parse_readelf_output(&output, true, MergePolicy::Strict).unwrap_err();
    match err {
        ExtractError::DuplicateDefinition(dup) => {
            assert_eq!(dup.name, "g");
            assert_eq!(dup.first, "libx.a(a.o)");
            assert_eq!(dup.second, "libx.a(b.o)");
        }
        other => panic!("unexpected error: {other}"),
    }

    let lenient = parse_readelf_output(&output, true, MergePolicy::FirstWins).unwrap();
    assert_eq!(lenient.get("g").unwrap().origin.as_deref(), Some("libx.a(a.o)"));
}

#[test]
fn weak_definitions_do_not_conflict_under_strict_policy() {
    let weak = "0000000000000000    12 FUNC    WEAK   DEFAULT    1 inline_fn";
    let output = format!(
        "{}{}",
        readelf_member("libx.a", "a.o", &[weak]),
        readelf_member("libx.a", "b.o", &[weak])
    );
    let set = parse_readelf_output(&output, true, MergePolicy::Strict).unwrap();
    assert_eq!(set.get("inline_fn").unwrap().origin.as_deref(), Some("libx.a(a.o)"));
}

#[test]
fn singular_entry_header_and_hex_size_parse() {
    let output = "
Symbol table '.dynsym' contains 1 entry:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     0: 0000000000004000 0x12345678 OBJECT GLOBAL DEFAULT   24 big_table
";
    let set = parse_readelf_output(output, false, MergePolicy::FirstWins).unwrap();
    assert_eq!(set.get("big_table").unwrap().size, Some(0x1234_5678));
}

#[test]
fn missing_dynsym_is_malformed() {
    let output = "
Symbol table '.symtab' contains 1 entry:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     0: 0000000000000000     0 NOTYPE  LOCAL  DEFAULT  UND
";
    let err = parse_readelf_output(output, false, MergePolicy::FirstWins).unwrap_err();
    assert!(matches!(err, ExtractError::MalformedOutput { tool: "readelf", .. }));
    assert!(err.to_string().contains("no .dynsym table"));
}

#[test]
fn two_dynsym_tables_are_malformed() {
    let table = "
Symbol table '.dynsym' contains 1 entry:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     0: 0000000000000000     0 NOTYPE  LOCAL  DEFAULT  UND
";
    let output = format!("{table}{table}");
    let err = parse_readelf_output(&output, false, MergePolicy::FirstWins).unwrap_err();
    assert!(err.to_string().contains("found 2"));
}

#[test]
fn truncated_table_is_malformed() {
    let output = "
Symbol table '.dynsym' contains 5 entries:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     0: 0000000000000000     0 NOTYPE  LOCAL  DEFAULT  UND
";
    let err = parse_readelf_output(output, false, MergePolicy::FirstWins).unwrap_err();
    assert!(err.to_string().contains("ends early"));
}

#[test]
fn oversized_entry_count_is_malformed() {
    let output = "Symbol table '.dynsym' contains 18446744073709551615 entries:\n   Num: x\n";
    let err = parse_readelf_output(output, false, MergePolicy::FirstWins).unwrap_err();
    assert!(matches!(err, ExtractError::MalformedOutput { .. }));
    assert!(err.to_string().contains("ends early"));
}

#[test]
fn unexpected_field_count_is_malformed() {
    let output = "
Symbol table '.dynsym' contains 1 entry:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     0: 0000000000000000     0 FUNC
";
    let err = parse_readelf_output(output, false, MergePolicy::FirstWins).unwrap_err();
    match err {
        ExtractError::MalformedOutput { line, message, .. } => {
            assert!(message.contains("found 4"));
            assert!(line.contains("FUNC"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unexpected_symbol_type_is_malformed() {
    let output = "
Symbol table '.dynsym' contains 1 entry:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     0: 0000000000000000     8 TLS     GLOBAL DEFAULT   20 tls_slot
";
    let err = parse_readelf_output(output, false, MergePolicy::FirstWins).unwrap_err();
    assert!(err.to_string().contains("unexpected symbol type TLS"));
}

#[test]
fn archive_table_without_file_marker_is_malformed() {
    let output = "
Symbol table '.symtab' contains 1 entry:
   Num:    Value          Size Type    Bind   Vis      Ndx Name
     0: 0000000000000000     0 NOTYPE  LOCAL  DEFAULT  UND
";
    let err = parse_readelf_output(output, true, MergePolicy::FirstWins).unwrap_err();
    assert!(err.to_string().contains("File: marker"));
}
