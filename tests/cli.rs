use std::path::Path;
use std::process::Command;

fn pscript(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_pscript"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run pscript");
    assert!(output.status.success(), "pscript {args:?} failed: {output:?}");
    String::from_utf8(output.stdout).expect("stdout is UTF-8")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

#[test]
fn test_debug_prints_definitions_and_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main.pas");
    std::fs::write(&file, "var x: Integer;\nx := 10;\n").unwrap();

    let stdout = pscript(&["debug", path_str(&file)]);
    let (header, report) = stdout.split_once('\n').unwrap();
    assert!(header.contains("main.pas"));

    insta::assert_snapshot!(report.trim(), @r"
    ✓ No parse errors

    === Definitions ===
      0:4 Variable x: var x: Integer

    === Semantic tokens ===
      [0, 4, 1, 7, 1]
      [0, 3, 7, 5, 16]
      [1, 0, 1, 7, 0]
      [0, 5, 2, 13, 0]
    ");
}

#[test]
fn test_index_reports_stats_and_search() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Shapes.pas"),
        "unit Shapes;\ninterface\ntype TShape = class end;\nimplementation\nend.",
    )
    .unwrap();
    std::fs::write(dir.path().join("readme.txt"), "not source").unwrap();

    let stdout = pscript(&["index", path_str(dir.path()), "--query", "shape"]);
    assert!(stdout.contains("files indexed: 1"), "{stdout}");
    assert!(stdout.contains("files failed:  0"), "{stdout}");
    assert!(stdout.contains("symbols added: 2"), "{stdout}");
    let results: Vec<&str> = stdout
        .lines()
        .skip_while(|l| !l.starts_with("=== Search"))
        .skip(1)
        .collect();
    assert_eq!(results.len(), 2, "{stdout}");
    assert!(results[0].starts_with("  Module Shapes "), "{stdout}");
    assert!(results[1].starts_with("  Class TShape "), "{stdout}");
}
