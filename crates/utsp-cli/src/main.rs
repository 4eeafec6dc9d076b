// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A4_Utsp validation of IFC provision-for-void models
//!
//! # Usage
//!
//! ```bash
//! # Validate files or whole directories, reports in data/output
//! utsp validate modeller/ A4_RIV_Utsparinger.ifc
//!
//! # Only the spreadsheet, custom discipline codes
//! utsp validate modeller/ -o rapporter --no-html --no-ifc --discipline RIB --discipline ARK
//!
//! # Upload page on http://127.0.0.1:8080
//! utsp serve
//! ```

mod batch;
mod cli;
mod serve;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

fn init_logging() {
    // Library crates log through `log`; the subscriber bridges those records
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::Validate(args) => batch::run(&args),
        Command::Serve(args) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve::run(&args))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
