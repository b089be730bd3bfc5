use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    vcscore_cli::main_entry().await
}
