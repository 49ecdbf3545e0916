//! LSP server implementation using lsp-server (synchronous).
//!
//! Requests are handled one at a time on the main thread. The workspace
//! indexer runs on its own thread and commits into the shared index while
//! requests are served.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use lsp_server::{Connection, ErrorCode, Message, Notification, Request, RequestId, Response};
use lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentSymbol, DocumentSymbolParams, DocumentSymbolResponse, GotoDefinitionParams,
    GotoDefinitionResponse, InitializeParams, OneOf, Position, ReferenceParams,
    SemanticTokens, SemanticTokensDelta, SemanticTokensDeltaParams, SemanticTokensEdit,
    SemanticTokensFullDeltaResult, SemanticTokensFullOptions, SemanticTokensOptions,
    SemanticTokensParams, SemanticTokensResult, SemanticTokensServerCapabilities,
    ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind,
    TextDocumentSyncOptions, Uri, WorkspaceSymbol, WorkspaceSymbolParams,
    WorkspaceSymbolResponse,
    notification::{DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument},
    request::{
        DocumentSymbolRequest, GotoDefinition, References, SemanticTokensFullDeltaRequest,
        SemanticTokensFullRequest, WorkspaceSymbolRequest,
    },
};
use pscript_ide::semantic_tokens::{align_edit, to_lsp_tokens};
use pscript_ide::uri::uri_to_path;
use pscript_ide::{
    AnalysisConfig, IndexStats, Legend, Resolver, ScopeFilter, ScopeKind, SymbolDefinition,
    TokenCache, TokensResponse, WorkspaceIndex, WorkspaceIndexer, collect_definitions,
    compute_semantic_tokens, compute_semantic_tokens_delta, encode_semantic_tokens,
    find_references, scope_at, word_at,
};
use pscript_syntax::{NodeRef, Program, Span, VisitFlow, walk_program};

use super::documents::DocumentStore;
use super::tracing_layer::LspLayerHandle;

type LspResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Main LSP server state.
struct LspServer {
    connection: Connection,
    documents: DocumentStore,
    index: Arc<WorkspaceIndex>,
    indexer: WorkspaceIndexer,
    tokens: TokenCache,
    legend: Legend,
    config: AnalysisConfig,
    roots: Vec<PathBuf>,
    indexing: Option<JoinHandle<IndexStats>>,
}

impl LspServer {
    fn new(connection: Connection, config: AnalysisConfig, roots: Vec<PathBuf>) -> Self {
        let index = Arc::new(WorkspaceIndex::new());
        let indexer = WorkspaceIndexer::new(index.clone(), config.indexing.clone());
        Self {
            connection,
            documents: DocumentStore::default(),
            index,
            indexer,
            tokens: TokenCache::new(),
            legend: Legend::standard(),
            config,
            roots,
            indexing: None,
        }
    }

    fn start_indexing(&mut self) {
        if !self.config.indexing.enabled || self.roots.is_empty() {
            tracing::info!(
                enabled = self.config.indexing.enabled,
                roots = self.roots.len(),
                "Workspace indexing not started"
            );
            return;
        }
        match self.indexer.spawn(self.roots.clone()) {
            Ok(handle) => self.indexing = Some(handle),
            Err(e) => tracing::warn!(error = %e, "Failed to spawn workspace indexer"),
        }
    }

    fn run(&mut self) -> LspResult<()> {
        loop {
            let msg = self.connection.receiver.recv()?;
            if self.process_message(msg)? {
                return Ok(());
            }
        }
    }

    /// Process a single message. Returns `Ok(true)` if shutdown was requested.
    fn process_message(&mut self, msg: Message) -> LspResult<bool> {
        match msg {
            Message::Request(req) => {
                if self.connection.handle_shutdown(&req)? {
                    return Ok(true);
                }
                self.handle_request(req)?;
            }
            Message::Response(_) => {
                // We don't send requests, so we shouldn't get responses
            }
            Message::Notification(notif) => {
                self.handle_notification(notif)?;
            }
        }
        Ok(false)
    }

    fn handle_request(&mut self, req: Request) -> LspResult<()> {
        tracing::debug!(method = %req.method, "Received request");

        if let Some((id, params)) = cast_request::<GotoDefinition>(req.clone()) {
            let result = self.goto_definition(params);
            self.respond(id, result)
        } else if let Some((id, params)) = cast_request::<References>(req.clone()) {
            let result = self.find_references(params);
            self.respond(id, result)
        } else if let Some((id, params)) = cast_request::<DocumentSymbolRequest>(req.clone()) {
            let result = self.document_symbols(params);
            self.respond(id, result)
        } else if let Some((id, params)) = cast_request::<WorkspaceSymbolRequest>(req.clone()) {
            let result = self.workspace_symbols(params);
            self.respond(id, result)
        } else if let Some((id, params)) = cast_request::<SemanticTokensFullRequest>(req.clone())
        {
            let result = self.semantic_tokens_full(params);
            self.respond(id, result)
        } else if let Some((id, params)) =
            cast_request::<SemanticTokensFullDeltaRequest>(req.clone())
        {
            let result = self.semantic_tokens_delta(params);
            self.respond(id, result)
        } else {
            tracing::debug!(method = %req.method, "Unhandled request");
            let response = Response::new_err(
                req.id,
                ErrorCode::MethodNotFound as i32,
                format!("unhandled method {}", req.method),
            );
            self.connection.sender.send(Message::Response(response))?;
            Ok(())
        }
    }

    fn respond<T: serde::Serialize>(&self, id: RequestId, result: T) -> LspResult<()> {
        let response = Response::new_ok(id, result);
        self.connection.sender.send(Message::Response(response))?;
        Ok(())
    }

    fn handle_notification(&mut self, notif: Notification) -> LspResult<()> {
        if let Some(params) = cast_notification::<DidOpenTextDocument>(notif.clone()) {
            self.did_open(params);
        } else if let Some(params) = cast_notification::<DidChangeTextDocument>(notif.clone()) {
            self.did_change(params);
        } else if let Some(params) = cast_notification::<DidCloseTextDocument>(notif) {
            self.did_close(params);
        }
        Ok(())
    }

    fn did_open(&mut self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.as_str();
        let version = params.text_document.version;
        tracing::info!(uri, version, "Document opened");

        self.documents.open(uri, params.text_document.text, version);
        self.reindex_open_document(uri);
    }

    fn did_change(&mut self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.as_str();
        let version = params.text_document.version;

        match self
            .documents
            .change(uri, version, &params.content_changes)
        {
            Ok(true) => self.reindex_open_document(uri),
            Ok(false) => tracing::warn!(uri, "Change for a document that is not open"),
            Err(e) => tracing::warn!(uri, version, error = %e, "Rejected invalid edit"),
        }
    }

    fn did_close(&mut self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri.as_str();
        tracing::info!(uri, "Document closed");

        self.documents.close(uri);
        self.tokens.invalidate(uri);
        self.index.remove_file(uri);

        // The file on disk takes over from the buffer.
        if let Some(path) = uri_to_path(uri).filter(|p| p.is_file())
            && let Err(e) = self.indexer.index_file(&path)
        {
            tracing::warn!(uri, error = %e, "Failed to re-index closed document");
        }
    }

    fn reindex_open_document(&self, uri: &str) {
        let Some(doc) = self.documents.get(uri) else {
            return;
        };
        let definitions = collect_definitions(&doc.program);
        if !self.index.update_file(uri, doc.version, &definitions) {
            tracing::debug!(uri, version = doc.version, "Index holds a newer version");
        }
    }

    /// The identifier under `position` in an open document.
    fn word_at(&self, uri: &str, position: Position) -> Option<String> {
        let doc = self.documents.get(uri)?;
        word_at(&doc.text, position).map(|(word, _)| word.to_string())
    }

    fn definitions(&self, uri: &str, position: Position, name: &str) -> Vec<pscript_ide::Location> {
        let doc = self.documents.get(uri);
        Resolver::new(Some(self.index.as_ref())).resolve_definition(
            uri,
            doc.as_ref().map(|d| &d.program),
            position,
            name,
        )
    }

    fn goto_definition(&self, params: GotoDefinitionParams) -> Option<GotoDefinitionResponse> {
        let uri = params.text_document_position_params.text_document.uri.as_str();
        let position = params.text_document_position_params.position;

        tracing::debug!(
            line = position.line,
            character = position.character,
            "Go to Definition request"
        );

        let name = self.word_at(uri, position)?;
        let locations: Vec<lsp_types::Location> = self
            .definitions(uri, position, &name)
            .into_iter()
            .filter_map(to_lsp_location)
            .collect();

        tracing::debug!(name = %name, count = locations.len(), "Found definitions");
        (!locations.is_empty()).then_some(GotoDefinitionResponse::Array(locations))
    }

    fn find_references(&self, params: ReferenceParams) -> Option<Vec<lsp_types::Location>> {
        let uri = params.text_document_position.text_document.uri.as_str();
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;

        tracing::debug!(
            line = position.line,
            character = position.character,
            include_declaration,
            "Find References request"
        );

        let name = self.word_at(uri, position)?;
        let filter = {
            let doc = self.documents.get(uri)?;
            let scope = scope_at(&doc.program, position, &name);
            match scope.kind {
                ScopeKind::Local | ScopeKind::Parameter => Some(ScopeFilter {
                    uri: uri.to_string(),
                    range: scope
                        .declarations
                        .first()
                        .and_then(|decl| declaring_routine(&doc.program, decl.span))
                        .map(pscript_ide::position::span_to_range),
                }),
                _ => None,
            }
        };

        let documents = self.documents.all();
        let mut locations = find_references(
            documents.iter().map(|d| (d.key().as_str(), &d.program)),
            &name,
            filter.as_ref(),
        );
        drop(documents);

        if !include_declaration {
            let declarations = self.definitions(uri, position, &name);
            locations.retain(|l| !declarations.contains(l));
        }

        tracing::debug!(name = %name, count = locations.len(), "Found references");
        Some(locations.into_iter().filter_map(to_lsp_location).collect())
    }

    fn document_symbols(&self, params: DocumentSymbolParams) -> Option<DocumentSymbolResponse> {
        let uri = params.text_document.uri.as_str();
        tracing::debug!(uri, "Document symbols request");

        let doc = self.documents.get(uri)?;
        let symbols = nest_symbols(collect_definitions(&doc.program));
        tracing::debug!(count = symbols.len(), "Found document symbols");
        Some(DocumentSymbolResponse::Nested(symbols))
    }

    fn workspace_symbols(&self, params: WorkspaceSymbolParams) -> Option<WorkspaceSymbolResponse> {
        let max_results = self.config.workspace_symbols.max_results;
        let symbols: Vec<WorkspaceSymbol> = self
            .index
            .search(&params.query, max_results)
            .into_iter()
            .filter_map(|symbol| {
                let location = to_lsp_location(symbol.location)?;
                Some(WorkspaceSymbol {
                    name: symbol.name,
                    kind: symbol.kind.to_lsp(),
                    tags: None,
                    container_name: (!symbol.container_name.is_empty())
                        .then_some(symbol.container_name),
                    location: OneOf::Left(location),
                    data: None,
                })
            })
            .collect();

        tracing::debug!(query = %params.query, count = symbols.len(), "Workspace symbols");
        Some(WorkspaceSymbolResponse::Nested(symbols))
    }

    fn encoded_tokens(&self, uri: &str) -> Option<Vec<u32>> {
        let doc = self.documents.get(uri)?;
        let tokens = compute_semantic_tokens(&doc.program, &self.legend);
        Some(encode_semantic_tokens(&tokens))
    }

    fn semantic_tokens_full(&self, params: SemanticTokensParams) -> Option<SemanticTokensResult> {
        let uri = params.text_document.uri.as_str();
        let data = self.encoded_tokens(uri)?;
        let result_id = self.tokens.store(uri, &data);

        tracing::debug!(uri, result_id = %result_id, tokens = data.len() / 5, "Semantic tokens");
        Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: Some(result_id),
            data: to_lsp_tokens(&data),
        }))
    }

    fn semantic_tokens_delta(
        &self,
        params: SemanticTokensDeltaParams,
    ) -> Option<SemanticTokensFullDeltaResult> {
        let uri = params.text_document.uri.as_str();
        let data = self.encoded_tokens(uri)?;
        let previous = self.tokens.get(uri, &params.previous_result_id);
        let result_id = self.tokens.store(uri, &data);

        let threshold = self.config.semantic_tokens.delta_threshold;
        let response = compute_semantic_tokens_delta(previous.as_deref(), &data, &result_id, threshold);
        tracing::debug!(
            uri,
            previous = %params.previous_result_id,
            result_id = %result_id,
            full = matches!(response, TokensResponse::Full { .. }),
            "Semantic tokens delta"
        );

        Some(match response {
            TokensResponse::Full { result_id, data } => {
                SemanticTokensFullDeltaResult::Tokens(SemanticTokens {
                    result_id: Some(result_id),
                    data: to_lsp_tokens(&data),
                })
            }
            TokensResponse::Delta { result_id, edits } => {
                let old = previous.as_deref().unwrap_or_default();
                let edits = edits
                    .iter()
                    .map(|edit| {
                        let edit = align_edit(edit, old, &data);
                        SemanticTokensEdit {
                            start: edit.start,
                            delete_count: edit.delete_count,
                            data: Some(to_lsp_tokens(&edit.data)),
                        }
                    })
                    .collect();
                SemanticTokensFullDeltaResult::TokensDelta(SemanticTokensDelta {
                    result_id: Some(result_id),
                    edits,
                })
            }
        })
    }
}

/// The smallest routine enclosing a declaration.
fn declaring_routine(program: &Program, decl: Span) -> Option<Span> {
    let mut best: Option<Span> = None;
    walk_program(program, &mut |node: NodeRef<'_>| {
        if let NodeRef::Routine(routine) = node
            && routine.span.encloses(&decl)
            && best.is_none_or(|b| routine.span.extent() < b.extent())
        {
            best = Some(routine.span);
        }
        VisitFlow::Continue
    });
    best
}

/// Group definitions under the type that contains them.
fn nest_symbols(definitions: Vec<SymbolDefinition>) -> Vec<DocumentSymbol> {
    let mut roots: Vec<DocumentSymbol> = Vec::new();
    for def in definitions {
        let parent = (!def.container_name.is_empty())
            .then(|| roots.iter().rposition(|r| r.name == def.container_name))
            .flatten();
        let symbol = create_symbol(def);
        match parent {
            Some(i) => roots[i].children.get_or_insert_with(Vec::new).push(symbol),
            None => roots.push(symbol),
        }
    }
    roots
}

/// Create a DocumentSymbol from an index definition.
fn create_symbol(def: SymbolDefinition) -> DocumentSymbol {
    DocumentSymbol {
        name: def.name,
        detail: (!def.detail.is_empty()).then_some(def.detail),
        kind: def.kind.to_lsp(),
        tags: None,
        range: def.range,
        selection_range: def.range,
        children: None,
        #[allow(deprecated)]
        deprecated: None,
    }
}

fn to_lsp_location(location: pscript_ide::Location) -> Option<lsp_types::Location> {
    let uri: Uri = location.uri.parse().ok()?;
    Some(lsp_types::Location {
        uri,
        range: location.range,
    })
}

/// Get the server capabilities for the PScript LSP server.
fn server_capabilities(legend: &Legend) -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::INCREMENTAL),
                ..Default::default()
            },
        )),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        workspace_symbol_provider: Some(OneOf::Left(true)),
        semantic_tokens_provider: Some(
            SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                work_done_progress_options: Default::default(),
                legend: legend.to_lsp(),
                range: Some(false),
                full: Some(SemanticTokensFullOptions::Delta { delta: Some(true) }),
            }),
        ),
        ..Default::default()
    }
}

/// Workspace folders, or the root uri of clients that predate them.
fn workspace_roots(params: &InitializeParams) -> Vec<PathBuf> {
    if let Some(folders) = &params.workspace_folders {
        return folders
            .iter()
            .filter_map(|f| uri_to_path(f.uri.as_str()))
            .collect();
    }
    #[allow(deprecated)]
    let root_uri = params.root_uri.as_ref();
    root_uri
        .and_then(|uri| uri_to_path(uri.as_str()))
        .into_iter()
        .collect()
}

/// Initialize the LSP server with the given connection.
///
/// This performs the LSP initialize handshake, which ends with the client's
/// `initialized` notification, and then starts the workspace indexer.
fn initialize_server(connection: Connection) -> LspResult<LspServer> {
    let legend = Legend::standard();
    let server_capabilities = serde_json::to_value(server_capabilities(&legend))?;
    let init_params = connection.initialize(server_capabilities)?;
    let params: InitializeParams = serde_json::from_value(init_params)?;

    let config = AnalysisConfig::from_init_options(params.initialization_options.as_ref());
    let roots = workspace_roots(&params);
    tracing::info!(roots = ?roots, "Initialized");

    let mut server = LspServer::new(connection, config, roots);
    server.start_indexing();
    Ok(server)
}

/// Start the LSP server on stdio.
pub fn serve(connection: Connection, layer: LspLayerHandle) -> LspResult<()> {
    let mut server = initialize_server(connection)?;
    layer.mark_initialized();
    let result = server.run();
    layer.detach();
    result
}

/// Cast a request to a specific type.
fn cast_request<R: lsp_types::request::Request>(req: Request) -> Option<(RequestId, R::Params)> {
    if req.method == R::METHOD {
        let params = serde_json::from_value(req.params).ok()?;
        Some((req.id, params))
    } else {
        None
    }
}

/// Cast a notification to a specific type.
fn cast_notification<N: lsp_types::notification::Notification>(
    notif: Notification,
) -> Option<N::Params> {
    if notif.method == N::METHOD {
        serde_json::from_value(notif.params).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI32, Ordering};

    use lsp_types::request::Request as _;
    use lsp_types::{
        PartialResultParams, Range, ReferenceContext, TextDocumentContentChangeEvent,
        TextDocumentIdentifier, TextDocumentItem, TextDocumentPositionParams,
        VersionedTextDocumentIdentifier, WorkDoneProgressParams, WorkspaceFolder,
    };
    use serde_json::json;

    use super::*;

    static REQUEST_ID: AtomicI32 = AtomicI32::new(1);

    fn next_request_id() -> RequestId {
        RequestId::from(REQUEST_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Test harness that creates a server and client connection pair.
    struct TestHarness {
        server: LspServer,
        client: Connection,
    }

    impl TestHarness {
        fn new() -> Self {
            Self::with_params(InitializeParams::default())
        }

        fn with_params(init_params: InitializeParams) -> Self {
            use lsp_types::request::Initialize;

            let (server_conn, client_conn) = Connection::memory();

            let init_request = lsp_server::Request::new(
                RequestId::from(0),
                Initialize::METHOD.to_string(),
                init_params,
            );
            client_conn
                .sender
                .send(Message::Request(init_request))
                .unwrap();

            // connection.initialize() waits for this before returning.
            let initialized = Notification::new("initialized".to_string(), json!({}));
            client_conn
                .sender
                .send(Message::Notification(initialized))
                .unwrap();

            let server = initialize_server(server_conn).unwrap();

            // Client receives initialize response
            let _response = client_conn.receiver.recv().unwrap();

            Self {
                server,
                client: client_conn,
            }
        }

        fn notify<N: lsp_types::notification::Notification>(&mut self, params: N::Params)
        where
            N::Params: serde::Serialize,
        {
            let notif = Notification::new(N::METHOD.to_string(), params);
            self.client
                .sender
                .send(Message::Notification(notif))
                .unwrap();
            let msg = self.server.connection.receiver.recv().unwrap();
            self.server.process_message(msg).unwrap();
        }

        fn open_document(&mut self, uri: &Uri, text: &str) {
            self.notify::<DidOpenTextDocument>(DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: uri.clone(),
                    language_id: "pscript".to_string(),
                    version: 1,
                    text: text.to_string(),
                },
            });
        }

        fn change_document(&mut self, uri: &Uri, version: i32, range: Range, text: &str) {
            self.notify::<DidChangeTextDocument>(DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier {
                    uri: uri.clone(),
                    version,
                },
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: Some(range),
                    range_length: None,
                    text: text.to_string(),
                }],
            });
        }

        /// Send a request and return the raw result.
        fn request_value<R: lsp_types::request::Request>(
            &mut self,
            params: R::Params,
        ) -> serde_json::Value
        where
            R::Params: serde::Serialize,
        {
            let id = next_request_id();
            let req = Request::new(id.clone(), R::METHOD.to_string(), params);
            self.client.sender.send(Message::Request(req)).unwrap();

            let msg = self.server.connection.receiver.recv().unwrap();
            self.server.process_message(msg).unwrap();

            match self.client.receiver.recv().unwrap() {
                Message::Response(resp) => {
                    assert_eq!(resp.id, id);
                    assert!(resp.error.is_none(), "Request failed: {:?}", resp.error);
                    resp.result.unwrap_or(serde_json::Value::Null)
                }
                other => panic!("Expected response message, got {:?}", other),
            }
        }

        fn request<R: lsp_types::request::Request>(&mut self, params: R::Params) -> R::Result
        where
            R::Params: serde::Serialize,
            R::Result: serde::de::DeserializeOwned,
        {
            serde_json::from_value(self.request_value::<R>(params)).unwrap()
        }
    }

    fn test_uri(name: &str) -> Uri {
        format!("file:///test/{}.pas", name).parse().unwrap()
    }

    fn position_params(uri: &Uri, line: u32, character: u32) -> TextDocumentPositionParams {
        TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            position: Position::new(line, character),
        }
    }

    fn range(line: u32, start: u32, end: u32) -> Range {
        Range::new(Position::new(line, start), Position::new(line, end))
    }

    fn workspace_symbol_names(harness: &mut TestHarness, query: &str) -> Vec<String> {
        let response = harness.request::<WorkspaceSymbolRequest>(WorkspaceSymbolParams {
            partial_result_params: PartialResultParams::default(),
            work_done_progress_params: WorkDoneProgressParams::default(),
            query: query.to_string(),
        });
        match response {
            Some(WorkspaceSymbolResponse::Flat(symbols)) => {
                symbols.into_iter().map(|s| s.name).collect()
            }
            Some(WorkspaceSymbolResponse::Nested(symbols)) => {
                symbols.into_iter().map(|s| s.name).collect()
            }
            None => Vec::new(),
        }
    }

    fn tokens_params(uri: &Uri) -> SemanticTokensParams {
        SemanticTokensParams {
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            text_document: TextDocumentIdentifier { uri: uri.clone() },
        }
    }

    fn delta_params(uri: &Uri, previous: &str) -> SemanticTokensDeltaParams {
        SemanticTokensDeltaParams {
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            previous_result_id: previous.to_string(),
        }
    }

    #[test]
    fn test_goto_definition_via_message() {
        let mut harness = TestHarness::new();
        let uri = test_uri("definition");
        harness.open_document(&uri, "var x: Integer;\nx := 10;");

        let response = harness.request::<GotoDefinition>(GotoDefinitionParams {
            text_document_position_params: position_params(&uri, 1, 0),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        });
        let Some(GotoDefinitionResponse::Array(locations)) = response else {
            panic!("expected locations, got {response:?}");
        };
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].uri, uri);
        assert_eq!(locations[0].range, range(0, 4, 5));
    }

    #[test]
    fn test_goto_definition_across_documents() {
        let mut harness = TestHarness::new();
        let shapes = test_uri("Shapes");
        let main = test_uri("main");
        harness.open_document(
            &shapes,
            "unit Shapes;\ninterface\ntype TShape = class end;\nimplementation\nend.",
        );
        harness.open_document(&main, "uses Shapes;\nvar s: TShape;");

        let response = harness.request::<GotoDefinition>(GotoDefinitionParams {
            text_document_position_params: position_params(&main, 1, 9),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        });
        let Some(GotoDefinitionResponse::Array(locations)) = response else {
            panic!("expected locations, got {response:?}");
        };
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].uri, shapes);
        assert_eq!(locations[0].range, range(2, 5, 11));
    }

    #[test]
    fn test_find_references_via_message() {
        let mut harness = TestHarness::new();
        let uri = test_uri("references");
        let source = "\
procedure A;
var n: Integer;
begin
  n := 1;
end;
procedure B;
var n: Integer;
begin
  n := 2;
end;
";
        harness.open_document(&uri, source);

        let references = |include_declaration| ReferenceParams {
            text_document_position: position_params(&uri, 3, 2),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: ReferenceContext {
                include_declaration,
            },
        };

        let all = harness.request::<References>(references(true)).unwrap();
        let ranges: Vec<Range> = all.iter().map(|l| l.range).collect();
        assert_eq!(ranges, vec![range(1, 4, 5), range(3, 2, 3)]);

        let uses = harness.request::<References>(references(false)).unwrap();
        let ranges: Vec<Range> = uses.iter().map(|l| l.range).collect();
        assert_eq!(ranges, vec![range(3, 2, 3)]);
    }

    #[test]
    fn test_document_symbols_via_message() {
        let mut harness = TestHarness::new();
        let uri = test_uri("symbols");
        let source = "\
type
  TAnimal = class
    FName: String;
    function Speak: String;
  end;
var Count: Integer;
";
        harness.open_document(&uri, source);

        let response = harness.request::<DocumentSymbolRequest>(DocumentSymbolParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        });
        let Some(DocumentSymbolResponse::Nested(symbols)) = response else {
            panic!("expected nested symbols, got {response:?}");
        };
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["TAnimal", "Count"]);
        let children: Vec<&str> = symbols[0]
            .children
            .iter()
            .flatten()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(children, ["FName", "Speak"]);
    }

    #[test]
    fn test_workspace_symbols_follow_open_documents() {
        let mut harness = TestHarness::new();
        let uri = test_uri("shapes");
        harness.open_document(&uri, "type\n  TShape = class end;\n  TCircle = class(TShape) end;");

        assert_eq!(
            workspace_symbol_names(&mut harness, "shape"),
            ["TShape"]
        );

        harness.change_document(&uri, 2, range(1, 2, 8), "TFigure");
        assert!(workspace_symbol_names(&mut harness, "shape").is_empty());
        assert_eq!(workspace_symbol_names(&mut harness, "fig"), ["TFigure"]);
    }

    #[test]
    fn test_did_change_rejects_invalid_edit() {
        let mut harness = TestHarness::new();
        let uri = test_uri("invalid");
        harness.open_document(&uri, "var x: Integer;");
        harness.change_document(&uri, 2, range(7, 0, 1), "y");

        let doc = harness.server.documents.get(uri.as_str()).unwrap();
        assert_eq!(doc.text, "var x: Integer;");
        assert_eq!(doc.version, 1);
    }

    #[test]
    fn test_semantic_tokens_full_then_delta() {
        let mut harness = TestHarness::new();
        let uri = test_uri("tokens");
        harness.open_document(&uri, "var x: Integer;\nx := 10;");

        let full = harness.request_value::<SemanticTokensFullRequest>(tokens_params(&uri));
        assert_eq!(
            full["data"],
            json!([0, 4, 1, 7, 1, 0, 3, 7, 5, 16, 1, 0, 1, 7, 0, 0, 5, 2, 13, 0])
        );
        let first_id = full["resultId"].as_str().unwrap().to_string();

        harness.change_document(&uri, 2, range(1, 5, 7), "'ten'");
        let delta =
            harness.request_value::<SemanticTokensFullDeltaRequest>(delta_params(&uri, &first_id));
        assert_ne!(delta["resultId"].as_str(), Some(first_id.as_str()));
        assert_eq!(
            delta["edits"],
            json!([{ "start": 15, "deleteCount": 5, "data": [0, 5, 5, 12, 0] }])
        );

        let stale = harness.request_value::<SemanticTokensFullDeltaRequest>(delta_params(&uri, &first_id));
        assert!(stale.get("data").is_some(), "unknown result id must yield full tokens");
    }

    #[test]
    fn test_did_close_drops_unsaved_symbols() {
        let mut harness = TestHarness::new();
        let uri = test_uri("closing");
        harness.open_document(&uri, "procedure Unsaved;\nbegin\nend;");
        assert_eq!(workspace_symbol_names(&mut harness, "Unsaved"), ["Unsaved"]);

        harness.notify::<DidCloseTextDocument>(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
        });
        assert!(harness.server.documents.get(uri.as_str()).is_none());
        assert!(workspace_symbol_names(&mut harness, "Unsaved").is_empty());
    }

    #[test]
    fn test_close_reindexes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Saved.pas");
        std::fs::write(&path, "var OnDisk: Integer;").unwrap();
        let uri: Uri = pscript_ide::uri::path_to_uri(&path).parse().unwrap();

        let mut harness = TestHarness::new();
        harness.open_document(&uri, "var InBuffer: Integer;");
        assert_eq!(workspace_symbol_names(&mut harness, "InBuffer"), ["InBuffer"]);

        harness.notify::<DidCloseTextDocument>(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
        });
        assert!(workspace_symbol_names(&mut harness, "InBuffer").is_empty());
        assert_eq!(workspace_symbol_names(&mut harness, "OnDisk"), ["OnDisk"]);
    }

    #[test]
    fn test_indexes_workspace_folders_on_initialize() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Util.pas"), "function Helper: Integer;\nbegin\n  Result := 1;\nend;").unwrap();
        std::fs::write(dir.path().join("Other.pas"), "function HelperTwo: Integer;\nbegin\n  Result := 2;\nend;").unwrap();
        let folder_uri: Uri = pscript_ide::uri::path_to_uri(dir.path()).parse().unwrap();

        let params = InitializeParams {
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: folder_uri,
                name: "root".to_string(),
            }]),
            initialization_options: Some(json!({ "workspaceSymbols": { "maxResults": 1 } })),
            ..Default::default()
        };
        let mut harness = TestHarness::with_params(params);
        let stats = harness
            .server
            .indexing
            .take()
            .expect("indexer should be running")
            .join()
            .unwrap();
        assert_eq!(stats.files_indexed, 2);

        assert_eq!(workspace_symbol_names(&mut harness, "Helper"), ["Helper"]);
    }

    #[test]
    fn test_unknown_request_gets_method_not_found() {
        let mut harness = TestHarness::new();
        let id = next_request_id();
        let req = Request::new(id.clone(), "pscript/unknown".to_string(), json!({}));
        harness.client.sender.send(Message::Request(req)).unwrap();
        let msg = harness.server.connection.receiver.recv().unwrap();
        harness.server.process_message(msg).unwrap();

        match harness.client.receiver.recv().unwrap() {
            Message::Response(resp) => {
                assert_eq!(resp.id, id);
                let error = resp.error.expect("error response");
                assert_eq!(error.code, ErrorCode::MethodNotFound as i32);
            }
            other => panic!("Expected response message, got {:?}", other),
        }
    }
}
