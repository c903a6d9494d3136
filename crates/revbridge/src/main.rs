// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::{error, info};

use revbridge::config::{load_dotenv, BridgeConfig};

#[tokio::main]
async fn main() {
    let env_file = load_dotenv();
    let config = BridgeConfig::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e:#}");
        std::process::exit(2);
    }

    revbridge::init_tracing(&config);
    if let Some(path) = env_file {
        info!(path = %path.display(), "loaded environment file");
    }

    match revbridge::run(config).await {
        // The stdin reader may still be parked in a blocking read.
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!("fatal: {e:#}");
            std::process::exit(1);
        }
    }
}
