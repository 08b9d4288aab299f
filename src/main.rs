use clap::Parser;

use book_manager_mcp::interface::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli::init_tracing(cli.default_log_filter());

    let store = cli.store_config().build()?;
    book_manager_mcp::interface::mcp::run(store).await
}
