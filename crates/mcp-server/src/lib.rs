//! Repolens MCP Server
//!
//! Exposes repository analysis to AI agents over MCP (stdio).
//!
//! ## Tools
//!
//! - `analyze_repository` - Summarize a repository branch, or report that the run continues in the background
//! - `check_analysis_status` - Poll a run: progress, final summary, failure or cancellation
//! - `cancel_analysis` - Stop a running analysis and optionally drop its cached result
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "repolens": {
//!       "command": "repolens-mcp",
//!       "env": { "GEMINI_API_KEY": "..." }
//!     }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use repolens_analyzer::{Analyzer, AnalyzerConfig};
use rmcp::transport::stdio;
use rmcp::ServiceExt;

mod tools;

pub use tools::{AnalyzeRequest, CancelRequest, RepolensService, StatusRequest};

/// Serve `analyzer` on stdin/stdout until the client disconnects.
pub async fn serve_stdio(analyzer: Analyzer) -> Result<()> {
    let service = RepolensService::new(analyzer);
    let server = service
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    server.waiting().await?;
    Ok(())
}

pub async fn main_entry() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Starting Repolens MCP server");

    let config = AnalyzerConfig::load().context("failed to load configuration")?;
    log::debug!("Configuration: {config:?}");
    let analyzer = Analyzer::from_config(config).context("failed to initialise analyzer")?;

    serve_stdio(analyzer).await?;

    log::info!("Repolens MCP server stopped");
    Ok(())
}
