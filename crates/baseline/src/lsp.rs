//! LSP server for baseline
//!
//! Provides IDE features for Baseline feature references:
//! - Diagnostics: unrecognized feature ids, republished on every change
//! - Hover: feature name, status and per-browser support
//! - Completions: feature ids after `baseline/` or `featureId=`
//! - Commands: feature search, workspace TODO scan, data reload

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use baseline_core::{
    FeatureRegistry, InsertionTrigger, PickCandidate, ScanError, ScanStatus, TodoReport,
    TodoScanner,
};
use eyre::Result;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc::{Error as LspError, Result as LspResult};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::SharedRegistry;
use crate::session::{Session, ValidationRun};

/// `source` of every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "baseline";

pub const SEARCH_COMMAND: &str = "baseline.search";
pub const SCAN_TODOS_COMMAND: &str = "baseline.scanTodos";
pub const CANCEL_SCAN_COMMAND: &str = "baseline.cancelScan";
pub const RELOAD_DATA_COMMAND: &str = "baseline.reloadData";

/// Run the LSP server over stdio
pub async fn run(root: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let project_root = match root {
        Some(r) => r,
        None => crate::find_project_root()?,
    };

    let config_path = config_path.unwrap_or_else(|| crate::config_path(&project_root));
    let config = crate::load_config_or_default(&config_path)?;
    let registry = SharedRegistry::load(config.data_path(&project_root));

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(|client| Backend::new(client, registry, config, project_root));
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}

/// Language server state shared by every request handler
pub struct Backend {
    client: Client,
    /// Owner of the data file, used for reloads
    registry: SharedRegistry,
    data_rx: watch::Receiver<Arc<FeatureRegistry>>,
    config: RwLock<Config>,
    /// Root the data path is resolved against
    project_root: RwLock<PathBuf>,
    /// Workspace folders scanned for TODO markers
    roots: RwLock<Vec<PathBuf>>,
    documents: RwLock<Session>,
    /// Token of the scan in flight, if any
    scan_cancel: Mutex<Option<CancellationToken>>,
}

impl Backend {
    pub fn new(
        client: Client,
        registry: SharedRegistry,
        config: Config,
        project_root: PathBuf,
    ) -> Self {
        Self {
            client,
            data_rx: registry.subscribe(),
            registry,
            config: RwLock::new(config),
            roots: RwLock::new(vec![project_root.clone()]),
            project_root: RwLock::new(project_root),
            documents: RwLock::new(Session::new()),
            scan_cancel: Mutex::new(None),
        }
    }

    /// Current registry snapshot
    fn registry(&self) -> Arc<FeatureRegistry> {
        self.data_rx.borrow().clone()
    }

    fn config(&self) -> Config {
        self.config
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn roots(&self) -> Vec<PathBuf> {
        self.roots.read().map(|r| r.clone()).unwrap_or_default()
    }

    fn with_documents<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.documents.read().ok().map(|docs| f(&docs))
    }

    fn with_documents_mut<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.documents.write().ok().map(|mut docs| f(&mut docs))
    }

    /// Validate the current version of a document and publish the result,
    /// unless the document changed while validating.
    async fn publish_diagnostics(&self, uri: &str) {
        let registry = self.registry();
        let Some(run) = self
            .with_documents(|docs| docs.validate(uri, &registry))
            .flatten()
        else {
            return;
        };

        if !self
            .with_documents(|docs| docs.is_current(&run))
            .unwrap_or(false)
        {
            debug!("Dropping superseded diagnostics for {} v{}", run.uri, run.version);
            return;
        }

        let Ok(url) = Url::parse(&run.uri) else {
            warn!("Not publishing diagnostics for unparseable uri {}", run.uri);
            return;
        };
        let version = run.version;
        self.client
            .publish_diagnostics(url, to_lsp_diagnostics(run), Some(version))
            .await;
    }

    /// Revalidate every open document, e.g. after the registry changed
    async fn publish_all(&self) {
        let uris = self
            .with_documents(|docs| docs.open_uris())
            .unwrap_or_default();
        for uri in uris {
            self.publish_diagnostics(&uri).await;
        }
    }

    /// Apply `initializationOptions` and workspace folders
    async fn configure(&self, params: &InitializeParams) {
        let mut roots: Vec<PathBuf> = params
            .workspace_folders
            .iter()
            .flatten()
            .filter_map(|folder| folder.uri.to_file_path().ok())
            .collect();
        #[allow(deprecated)]
        let root_uri = params.root_uri.as_ref();
        if roots.is_empty()
            && let Some(root) = root_uri.and_then(|u| u.to_file_path().ok())
        {
            roots.push(root);
        }

        if let Some(first) = roots.first()
            && let Ok(mut project_root) = self.project_root.write()
        {
            *project_root = first.clone();
        }
        if !roots.is_empty()
            && let Ok(mut current) = self.roots.write()
        {
            *current = roots;
        }

        if let Some(options) = params.initialization_options.clone() {
            match Config::from_json_value(options) {
                Ok(config) => {
                    if let Ok(mut current) = self.config.write() {
                        *current = config;
                    }
                }
                Err(e) => warn!("Ignoring invalid initializationOptions: {}", e),
            }
        }

        let project_root = self
            .project_root
            .read()
            .map(|r| r.clone())
            .unwrap_or_default();
        let data_path = self.config().data_path(&project_root);
        if data_path != self.registry.path() {
            self.registry.reload_from(data_path).await;
        }
    }

    fn search(&self, args: &[Value]) -> Vec<PickCandidate> {
        let query = args.first().and_then(Value::as_str).unwrap_or("");
        self.registry().search(query)
    }

    /// Scan the workspace folders, cancelling any scan already running.
    /// Returns `None` when the scan was cancelled or misconfigured.
    async fn scan_todos(&self) -> LspResult<Option<TodoReport>> {
        let scanner = match TodoScanner::new(self.config().scan_options()) {
            Ok(scanner) => scanner,
            Err(e) => {
                self.client.show_message(MessageType::ERROR, e.to_string()).await;
                return Ok(None);
            }
        };

        let cancel = CancellationToken::new();
        if let Ok(mut slot) = self.scan_cancel.lock()
            && let Some(previous) = slot.replace(cancel.clone())
        {
            previous.cancel();
        }

        let mut entries = Vec::new();
        let status = scanner
            .scan(&self.roots(), &mut entries, &cancel)
            .await
            .map_err(|e: ScanError| {
                warn!("TODO scan failed: {}", e);
                LspError::internal_error()
            })?;

        if status == ScanStatus::Cancelled {
            info!("TODO scan cancelled after {} entries", entries.len());
            return Ok(None);
        }

        Ok(Some(TodoReport::build(&entries, &self.registry())))
    }

    fn cancel_scan(&self) {
        if let Ok(mut slot) = self.scan_cancel.lock()
            && let Some(token) = slot.take()
        {
            token.cancel();
        }
    }
}

fn to_lsp_position(p: baseline_core::Position) -> Position {
    Position {
        line: p.line,
        character: p.character,
    }
}

fn to_lsp_range(r: baseline_core::Range) -> Range {
    Range {
        start: to_lsp_position(r.start),
        end: to_lsp_position(r.end),
    }
}

fn to_lsp_diagnostics(run: ValidationRun) -> Vec<Diagnostic> {
    run.diagnostics
        .into_iter()
        .map(|d| Diagnostic {
            range: to_lsp_range(d.range),
            severity: Some(DiagnosticSeverity::ERROR),
            code: Some(NumberOrString::String(d.code.to_string())),
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            message: d.message,
            ..Default::default()
        })
        .collect()
}

/// Feature ids offered at a trigger; each replaces what was typed so far
fn completion_items(trigger: &InsertionTrigger, registry: &FeatureRegistry) -> Vec<CompletionItem> {
    let range = Range {
        start: Position {
            line: trigger.line,
            character: trigger.column,
        },
        end: Position {
            line: trigger.line,
            character: trigger.cursor,
        },
    };

    registry
        .search(&trigger.typed)
        .into_iter()
        .enumerate()
        .map(|(rank, candidate)| {
            let insertion = trigger.insert(&candidate.id);
            CompletionItem {
                label: candidate.id.clone(),
                kind: Some(CompletionItemKind::VALUE),
                detail: Some(candidate.name.clone()),
                documentation: Some(Documentation::MarkupContent(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: format!(
                        "**{}**\n\n{}\n\n*{}*",
                        candidate.name,
                        candidate.description_html,
                        candidate.summary()
                    ),
                })),
                sort_text: Some(format!("{:05}", rank)),
                filter_text: Some(candidate.id.clone()),
                text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                    range,
                    new_text: insertion.text,
                })),
                ..Default::default()
            }
        })
        .collect()
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        self.configure(&params).await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(
                        ["/", "=", "\"", "'"].iter().map(|c| c.to_string()).collect(),
                    ),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        SEARCH_COMMAND.to_string(),
                        SCAN_TODOS_COMMAND.to_string(),
                        CANCEL_SCAN_COMMAND.to_string(),
                        RELOAD_DATA_COMMAND.to_string(),
                    ],
                    ..Default::default()
                }),
                // Sync full document content
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                        ..Default::default()
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "baseline".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let features = self.registry().len();
        self.client
            .log_message(
                MessageType::INFO,
                format!("baseline ready with {} features", features),
            )
            .await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        self.cancel_scan();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let uri = doc.uri.to_string();
        self.with_documents_mut(|docs| docs.open(uri.clone(), doc.version, doc.text));
        self.publish_diagnostics(&uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        let version = params.text_document.version;
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        let applied = self
            .with_documents_mut(|docs| docs.change(&uri, version, change.text))
            .unwrap_or(false);
        if applied {
            self.publish_diagnostics(&uri).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.publish_diagnostics(params.text_document.uri.as_str())
            .await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.with_documents_mut(|docs| docs.close(uri.as_str()));
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri.as_str();
        let position = params.text_document_position.position;

        let Some(trigger) = self
            .with_documents(|docs| {
                docs.completion_trigger(
                    uri,
                    baseline_core::Position {
                        line: position.line,
                        character: position.character,
                    },
                )
            })
            .flatten()
        else {
            return Ok(None);
        };

        let items = completion_items(&trigger, &self.registry());
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let uri = params
            .text_document_position_params
            .text_document
            .uri
            .as_str();
        let position = params.text_document_position_params.position;
        let registry = self.registry();
        let options = self.config().render_options();

        let rendered = self
            .with_documents(|docs| {
                docs.hover(
                    uri,
                    baseline_core::Position {
                        line: position.line,
                        character: position.character,
                    },
                    &registry,
                    &options,
                )
            })
            .flatten();

        Ok(rendered.map(|h| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: h.markdown,
            }),
            range: Some(to_lsp_range(h.range)),
        }))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<Value>> {
        match params.command.as_str() {
            SEARCH_COMMAND => {
                let candidates = self.search(&params.arguments);
                Ok(Some(
                    serde_json::to_value(candidates).map_err(|_| LspError::internal_error())?,
                ))
            }
            SCAN_TODOS_COMMAND => match self.scan_todos().await? {
                Some(report) => Ok(Some(
                    serde_json::to_value(report).map_err(|_| LspError::internal_error())?,
                )),
                None => Ok(None),
            },
            CANCEL_SCAN_COMMAND => {
                self.cancel_scan();
                Ok(None)
            }
            RELOAD_DATA_COMMAND => {
                let registry = self.registry.reload().await;
                self.publish_all().await;
                Ok(Some(serde_json::json!({ "features": registry.len() })))
            }
            other => Err(LspError::invalid_params(format!(
                "unknown command: {}",
                other
            ))),
        }
    }
}
