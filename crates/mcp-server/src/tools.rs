//! MCP tool definitions

use repolens_analyzer::{operation_key, Analyzer};
use repolens_protocol::{serialize_json_pretty, AnalysisResponse};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct AnalyzeRequest {
    #[schemars(description = "URL of the git repository to analyze (https or ssh)")]
    pub repo_url: Option<String>,

    #[schemars(description = "Branch to analyze (default: main)")]
    pub branch: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct StatusRequest {
    #[schemars(description = "URL the analysis was started with")]
    pub repo_url: Option<String>,

    #[schemars(description = "Branch the analysis was started with (default: main)")]
    pub branch: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct CancelRequest {
    #[schemars(description = "URL of the analysis to cancel")]
    pub repo_url: Option<String>,

    #[schemars(description = "Branch of the analysis to cancel (default: main)")]
    pub branch: Option<String>,

    /// Also forget a finished result so the next request starts over
    #[schemars(description = "Also remove a cached result (default: false)")]
    pub clear_cache: Option<bool>,
}

/// Repolens MCP Service
#[derive(Clone)]
pub struct RepolensService {
    analyzer: Analyzer,
    tool_router: ToolRouter<Self>,
}

impl RepolensService {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl RepolensService {
    #[tool(
        description = "Analyze a git repository branch and return a natural-language summary of its purpose, architecture and main components. Results are cached per (repo_url, branch). Long runs continue in the background: the response then has status 'started' and check_analysis_status reports progress."
    )]
    pub async fn analyze_repository(
        &self,
        Parameters(request): Parameters<AnalyzeRequest>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(message) = validate(request.repo_url.as_deref(), request.branch.as_deref()) {
            return Ok(CallToolResult::error(vec![Content::text(message)]));
        }
        let repo_url = request.repo_url.as_deref().unwrap_or_default();
        let response = self
            .analyzer
            .analyze(repo_url, request.branch.as_deref())
            .await;
        analysis_result(&response)
    }

    #[tool(
        description = "Check the state of an analysis: 'in_progress' with the latest progress text, 'completed' with the summary, 'error' with the failure, or 'cancelled'."
    )]
    pub async fn check_analysis_status(
        &self,
        Parameters(request): Parameters<StatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(message) = validate(request.repo_url.as_deref(), request.branch.as_deref()) {
            return Ok(CallToolResult::error(vec![Content::text(message)]));
        }
        let repo_url = request.repo_url.as_deref().unwrap_or_default();
        let response = self
            .analyzer
            .check_status(repo_url, request.branch.as_deref())
            .await;
        analysis_result(&response)
    }

    #[tool(
        description = "Cancel a running analysis. With clear_cache=true a finished result is removed as well, so the next analyze_repository call starts from scratch."
    )]
    pub async fn cancel_analysis(
        &self,
        Parameters(request): Parameters<CancelRequest>,
    ) -> Result<CallToolResult, McpError> {
        let repo_url = request.repo_url.as_deref().unwrap_or_default();
        let response = match self
            .analyzer
            .cancel(
                repo_url,
                request.branch.as_deref(),
                request.clear_cache.unwrap_or(false),
            )
            .await
        {
            Ok(response) => response,
            Err(err) => return Ok(CallToolResult::error(vec![Content::text(err.to_string())])),
        };
        let json = serialize_json_pretty(&response)
            .map_err(|err| McpError::internal_error(err.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for RepolensService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Repolens summarizes git repositories. Call 'analyze_repository' with a repo_url (and optional branch). If the status is 'started' or 'in_progress', poll 'check_analysis_status' until it is 'completed'. Use 'cancel_analysis' to stop a run or, with clear_cache, to force a fresh analysis.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

fn validate(repo_url: Option<&str>, branch: Option<&str>) -> Result<(), String> {
    operation_key(repo_url, branch)
        .map(|_| ())
        .map_err(|err| err.to_string())
}

fn analysis_result(response: &AnalysisResponse) -> Result<CallToolResult, McpError> {
    let json = serialize_json_pretty(response)
        .map_err(|err| McpError::internal_error(err.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
