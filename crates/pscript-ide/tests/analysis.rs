use std::sync::Arc;

use lsp_types::{Position, Range, TextDocumentContentChangeEvent};
use pscript_ide::semantic_tokens::apply_edits;
use pscript_ide::*;
use pscript_syntax::parse;

fn range(line: u32, start: u32, end: u32) -> Range {
    Range::new(Position::new(line, start), Position::new(line, end))
}

fn indexed(index: &WorkspaceIndex, uri: &str, source: &str) {
    let program = parse(source).program;
    assert!(index.update_file(uri, 0, &collect_definitions(&program)));
}

#[test]
fn resolves_script_variable_end_to_end() {
    let text = "var x: Integer;\nx := 10;";
    let program = parse(text).program;
    let (word, _) = word_at(text, Position::new(1, 0)).unwrap();
    assert_eq!(word, "x");

    let locations =
        Resolver::default().resolve_definition("file:///main.pas", Some(&program), Position::new(1, 0), word);
    assert_eq!(
        locations,
        vec![Location::new("file:///main.pas", range(0, 4, 5))]
    );
}

#[test]
fn imported_units_win_over_other_workspace_files() {
    let index = WorkspaceIndex::new();
    indexed(
        &index,
        "file:///lib/Shapes.pas",
        "unit Shapes;\ninterface\ntype TShape = class end;\nimplementation\nend.",
    );
    indexed(&index, "file:///app/Legacy.pas", "type TShape = class end;");

    let text = "uses Shapes;\nvar s: TShape;";
    let program = parse(text).program;
    let locations = Resolver::new(Some(&index)).resolve_definition(
        "file:///app/main.pas",
        Some(&program),
        Position::new(1, 8),
        "TShape",
    );
    assert_eq!(
        locations,
        vec![Location::new("file:///lib/Shapes.pas", range(2, 5, 11))]
    );
}

#[test]
fn file_globals_win_over_imports_and_workspace() {
    let index = WorkspaceIndex::new();
    indexed(
        &index,
        "file:///lib/Shapes.pas",
        "unit Shapes;\ninterface\ntype TShape = class end;\nimplementation\nend.",
    );
    indexed(&index, "file:///app/Legacy.pas", "type TShape = class end;");

    let text = "uses Shapes;\ntype TShape = class end;\nvar s: TShape;";
    let program = parse(text).program;
    let locations = Resolver::new(Some(&index)).resolve_definition(
        "file:///app/main.pas",
        Some(&program),
        Position::new(2, 7),
        "TShape",
    );
    assert_eq!(
        locations,
        vec![Location::new("file:///app/main.pas", range(1, 5, 11))]
    );
}

#[test]
fn index_lookups_skip_the_current_file() {
    let index = WorkspaceIndex::new();
    let helper = "procedure Helper;\nbegin\nend;";
    // Entries left behind by an older version of the file being edited.
    indexed(&index, "file:///app/Shapes.pas", helper);
    indexed(&index, "file:///app/main.pas", helper);
    indexed(&index, "file:///lib/Shapes.pas", helper);
    indexed(&index, "file:///lib/Util.pas", helper);
    let resolver = Resolver::new(Some(&index));

    let program = parse("uses Shapes;\nbegin\n  Helper;\nend.").program;
    let imported =
        resolver.resolve_definition("file:///app/Shapes.pas", Some(&program), Position::new(2, 2), "Helper");
    assert_eq!(
        imported,
        vec![Location::new("file:///lib/Shapes.pas", range(0, 10, 16))]
    );

    let program = parse("begin\n  Helper;\nend.").program;
    let fallback =
        resolver.resolve_definition("file:///app/main.pas", Some(&program), Position::new(1, 2), "Helper");
    let uris: Vec<&str> = fallback.iter().map(|l| l.uri.as_str()).collect();
    assert_eq!(
        uris,
        ["file:///app/Shapes.pas", "file:///lib/Shapes.pas", "file:///lib/Util.pas"]
    );
}

#[test]
fn workspace_fallback_prefers_the_same_directory() {
    let index = WorkspaceIndex::new();
    indexed(&index, "file:///a/Helpers.pas", "procedure Log(S: String);\nbegin\nend;");
    indexed(&index, "file:///b/Helpers.pas", "procedure Log(S: String);\nbegin\nend;");

    let text = "begin\n  Log('hi');\nend.";
    let program = parse(text).program;
    let locations = Resolver::new(Some(&index)).resolve_definition(
        "file:///b/main.pas",
        Some(&program),
        Position::new(1, 2),
        "Log",
    );
    let uris: Vec<&str> = locations.iter().map(|l| l.uri.as_str()).collect();
    assert_eq!(uris, ["file:///b/Helpers.pas", "file:///a/Helpers.pas"]);
}

#[test]
fn indexer_feeds_resolution() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Colors.pas"),
        "unit Colors;\ninterface\ntype TColor = (Red, Green);\nimplementation\nend.",
    )
    .unwrap();

    let index = Arc::new(WorkspaceIndex::new());
    let indexer = WorkspaceIndexer::new(index.clone(), AnalysisConfig::default().indexing);
    let stats = indexer.scan(&[dir.path().to_path_buf()]);
    assert_eq!(stats.files_indexed, 1);

    let program = parse("uses Colors;\nvar c := Green;").program;
    let locations = Resolver::new(Some(index.as_ref())).resolve_definition(
        "file:///elsewhere/main.pas",
        Some(&program),
        Position::new(1, 9),
        "Green",
    );
    assert_eq!(locations.len(), 1);
    assert!(locations[0].uri.ends_with("/Colors.pas"));
    assert_eq!(locations[0].range, range(2, 20, 25));

    let found = index.search("col", 0);
    let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Colors", "TColor"]);
}

#[test]
fn edits_flow_into_token_deltas() {
    let mut text = "var x: Integer;\nx := 10;".to_string();
    let legend = Legend::standard();
    let cache = TokenCache::new();
    let uri = "file:///main.pas";

    let before = encode_semantic_tokens(&compute_semantic_tokens(&parse(&text).program, &legend));
    let first_id = cache.store(uri, &before);

    text = apply_content_changes(
        &text,
        &[TextDocumentContentChangeEvent {
            range: Some(range(1, 5, 7)),
            range_length: None,
            text: "'ten'".to_string(),
        }],
    )
    .unwrap();
    assert_eq!(text, "var x: Integer;\nx := 'ten';");

    let after = encode_semantic_tokens(&compute_semantic_tokens(&parse(&text).program, &legend));
    let old = cache.get(uri, &first_id).unwrap();
    let second_id = cache.store(uri, &after);
    match compute_semantic_tokens_delta(Some(&old[..]), &after, &second_id, 0.70) {
        TokensResponse::Delta { result_id, edits } => {
            assert_eq!(result_id, second_id);
            assert_eq!(edits.len(), 1);
            assert_eq!(apply_edits(&old, &edits), after);
        }
        TokensResponse::Full { .. } => panic!("expected a delta"),
    }
}
