//! Tool registry: the local operations the model may ask us to run.
//!
//! Tools form a closed set ([`ToolKind`]). Arguments arriving from the model are
//! decoded into a typed [`ToolInvocation`] before anything executes, so schema
//! violations surface as [`ToolError::Argument`] and dispatch is an exhaustive
//! `match` rather than a name lookup.

mod analysis;
mod dates;
mod files;
mod format;
mod markdown;
mod process;
mod sort;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::ToolConfig;
use crate::error::ToolError;
use crate::llm::{FunctionDef, ToolDefinition};

pub use analysis::AnalysisArgs;
pub use dates::CountWeekdaysArgs;
pub use files::{unique_file_name, DownloadFileArgs};
pub use format::FormatFileArgs;
pub use markdown::MarkdownHeadersArgs;
pub use sort::SortJsonArgs;

/// Every tool this crate knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    DownloadFile,
    RunPythonAnalysis,
    ListFiles,
    CountWeekdays,
    SortJson,
    ExtractMarkdownHeaders,
    FormatFile,
}

impl ToolKind {
    pub const ALL: [ToolKind; 7] = [
        ToolKind::DownloadFile,
        ToolKind::RunPythonAnalysis,
        ToolKind::ListFiles,
        ToolKind::CountWeekdays,
        ToolKind::SortJson,
        ToolKind::ExtractMarkdownHeaders,
        ToolKind::FormatFile,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::DownloadFile => "download_file",
            ToolKind::RunPythonAnalysis => "run_python_analysis",
            ToolKind::ListFiles => "list_files",
            ToolKind::CountWeekdays => "count_weekdays",
            ToolKind::SortJson => "sort_json",
            ToolKind::ExtractMarkdownHeaders => "extract_markdown_headers",
            ToolKind::FormatFile => "format_file",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::DownloadFile => {
                "Download a file from a URL into the local scratch directory. Returns the local path of the saved file."
            }
            ToolKind::RunPythonAnalysis => {
                "Run Python code (pandas is available as `pd`) to analyse downloaded files. The code MUST assign its final result to a variable named `answer`; the string value of `answer` is returned."
            }
            ToolKind::ListFiles => "List the files currently in the scratch directory.",
            ToolKind::CountWeekdays => {
                "Count how many times a specific day of the week appears in a date file."
            }
            ToolKind::SortJson => "Sort a JSON file containing a list of objects.",
            ToolKind::ExtractMarkdownHeaders => {
                "Extract the first H1 header of every Markdown file in a directory and write an index JSON file mapping file name to title."
            }
            ToolKind::FormatFile => "Format a file using Prettier.",
        }
    }

    pub fn parameters_schema(self) -> Value {
        match self {
            ToolKind::DownloadFile => json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "Absolute URL of the file to download"}
                },
                "required": ["url"]
            }),
            ToolKind::RunPythonAnalysis => json!({
                "type": "object",
                "properties": {
                    "code": {"type": "string", "description": "Python source that sets a variable named `answer`"}
                },
                "required": ["code"]
            }),
            ToolKind::ListFiles => json!({
                "type": "object",
                "properties": {}
            }),
            ToolKind::CountWeekdays => json!({
                "type": "object",
                "properties": {
                    "filepath": {"type": "string", "description": "Path to the input file (e.g., /data/dates.txt)"},
                    "weekday_name": {"type": "string", "description": "The day to count (e.g., Wednesday)"}
                },
                "required": ["filepath", "weekday_name"]
            }),
            ToolKind::SortJson => json!({
                "type": "object",
                "properties": {
                    "input_path": {"type": "string", "description": "Input JSON file path"},
                    "output_path": {"type": "string", "description": "Output JSON file path"},
                    "keys": {"type": "array", "items": {"type": "string"}, "description": "List of keys to sort by"}
                },
                "required": ["input_path", "output_path", "keys"]
            }),
            ToolKind::ExtractMarkdownHeaders => json!({
                "type": "object",
                "properties": {
                    "input_path": {"type": "string", "description": "Directory containing the Markdown files (or a file inside it)"},
                    "output_path": {"type": "string", "description": "Where to write the JSON index"}
                },
                "required": ["input_path", "output_path"]
            }),
            ToolKind::FormatFile => json!({
                "type": "object",
                "properties": {
                    "filepath": {"type": "string", "description": "File to format"}
                },
                "required": ["filepath"]
            }),
        }
    }

    pub fn schema(self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters_schema(),
            },
        }
    }
}

/// A tool call whose arguments have been checked against the tool's schema.
#[derive(Debug, Clone)]
pub enum ToolInvocation {
    DownloadFile(DownloadFileArgs),
    RunPythonAnalysis(AnalysisArgs),
    ListFiles,
    CountWeekdays(CountWeekdaysArgs),
    SortJson(SortJsonArgs),
    ExtractMarkdownHeaders(MarkdownHeadersArgs),
    FormatFile(FormatFileArgs),
}

impl ToolInvocation {
    /// Decode raw model-supplied arguments for `kind`.
    pub fn parse(kind: ToolKind, args: Value) -> Result<Self, ToolError> {
        let invocation = match kind {
            ToolKind::DownloadFile => Self::DownloadFile(typed_args(kind, args)?),
            ToolKind::RunPythonAnalysis => Self::RunPythonAnalysis(typed_args(kind, args)?),
            ToolKind::ListFiles => Self::ListFiles,
            ToolKind::CountWeekdays => Self::CountWeekdays(typed_args(kind, args)?),
            ToolKind::SortJson => Self::SortJson(typed_args(kind, args)?),
            ToolKind::ExtractMarkdownHeaders => Self::ExtractMarkdownHeaders(typed_args(kind, args)?),
            ToolKind::FormatFile => Self::FormatFile(typed_args(kind, args)?),
        };
        Ok(invocation)
    }
}

fn typed_args<T: DeserializeOwned>(kind: ToolKind, args: Value) -> Result<T, ToolError> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| ToolError::argument(kind.name(), e.to_string()))
}

/// Name and description of a registered tool, for prompts.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Resources handlers share: configuration plus one pooled HTTP client.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub config: ToolConfig,
    pub http: reqwest::Client,
}

impl ToolContext {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// The set of tools offered to the model in one flow.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    ctx: ToolContext,
    enabled: Vec<ToolKind>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new(ctx: ToolContext) -> Self {
        Self {
            ctx,
            enabled: Vec::new(),
        }
    }

    /// Tools offered by the URL-driven agent.
    pub fn agent_tools(ctx: ToolContext) -> Self {
        let mut registry = Self::new(ctx);
        registry.register(ToolKind::DownloadFile);
        registry.register(ToolKind::RunPythonAnalysis);
        registry.register(ToolKind::ListFiles);
        registry
    }

    /// Tools offered by the synchronous Q&A endpoint.
    pub fn qa_tools(ctx: ToolContext) -> Self {
        let mut registry = Self::new(ctx);
        registry.register(ToolKind::CountWeekdays);
        registry.register(ToolKind::SortJson);
        registry.register(ToolKind::ExtractMarkdownHeaders);
        registry.register(ToolKind::FormatFile);
        registry
    }

    pub fn register(&mut self, kind: ToolKind) {
        if !self.enabled.contains(&kind) {
            self.enabled.push(kind);
        }
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.enabled
            .iter()
            .map(|kind| ToolInfo {
                name: kind.name(),
                description: kind.description(),
            })
            .collect()
    }

    /// Schemas for every registered tool, in registration order.
    pub fn schemas(&self) -> Vec<ToolDefinition> {
        self.enabled.iter().map(|kind| kind.schema()).collect()
    }

    fn lookup(&self, name: &str) -> Option<ToolKind> {
        ToolKind::from_name(name).filter(|kind| self.enabled.contains(kind))
    }

    /// Validate `args` against the named tool and run it.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let kind = self
            .lookup(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let invocation = ToolInvocation::parse(kind, args)?;

        tracing::info!(tool = name, "Dispatching tool");
        let result = self.execute(invocation).await;
        if let Err(e) = &result {
            tracing::warn!(tool = name, error = %e, "Tool failed");
        }
        result
    }

    async fn execute(&self, invocation: ToolInvocation) -> Result<String, ToolError> {
        let config = &self.ctx.config;
        match invocation {
            ToolInvocation::DownloadFile(args) => files::download_file(&self.ctx, &args).await,
            ToolInvocation::RunPythonAnalysis(args) => analysis::run_python_analysis(config, &args).await,
            ToolInvocation::ListFiles => files::list_files(&config.scratch_dir).await,
            ToolInvocation::CountWeekdays(args) => {
                run_blocking(ToolKind::CountWeekdays, move || dates::count_weekdays(&args)).await
            }
            ToolInvocation::SortJson(args) => {
                run_blocking(ToolKind::SortJson, move || sort::sort_json(&args)).await
            }
            ToolInvocation::ExtractMarkdownHeaders(args) => {
                run_blocking(ToolKind::ExtractMarkdownHeaders, move || {
                    markdown::extract_markdown_headers(&args)
                })
                .await
            }
            ToolInvocation::FormatFile(args) => format::format_file(config, &args).await,
        }
    }
}

/// Run a synchronous file-processing handler off the async executor.
async fn run_blocking<F>(kind: ToolKind, handler: F) -> Result<String, ToolError>
where
    F: FnOnce() -> Result<String, ToolError> + Send + 'static,
{
    tokio::task::spawn_blocking(handler)
        .await
        .map_err(|e| ToolError::execution(kind.name(), e))?
}
