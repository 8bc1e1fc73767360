#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pagelens::mcp::run_server().await
}
