//! pds CLI entry point.

use pds_lib::cli::{self, Cli};
use pds_lib::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    cli::execute(cli).await
}
