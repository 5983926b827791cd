use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    repolens_mcp::main_entry().await
}
