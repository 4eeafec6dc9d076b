// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use utsp_rules::ValidationConfig;

#[derive(Parser)]
#[command(name = "utsp")]
#[command(version)]
#[command(about = "Validering av A4_Utsp-egenskaper i IFC-filer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate IFC files and write reports
    Validate(ValidateArgs),

    /// Serve the upload page
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// IFC files or directories containing IFC files
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Directory for reports and annotated models
    #[arg(short, long, env = "UTSP_OUTPUT_DIR", default_value = "data/output")]
    pub output: PathBuf,

    /// Skip the Excel report
    #[arg(long)]
    pub no_excel: bool,

    /// Skip the HTML report
    #[arg(long)]
    pub no_html: bool,

    /// Skip the annotated IFC files
    #[arg(long)]
    pub no_ifc: bool,

    /// Colour elements by status in the annotated IFC files
    #[arg(long)]
    pub colorize: bool,

    #[command(flatten)]
    pub rules: RuleArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "UTSP_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// Maximum size of one upload request, in megabytes
    #[arg(long, default_value_t = 512)]
    pub max_upload_mb: usize,

    #[command(flatten)]
    pub rules: RuleArgs,
}

#[derive(Args, Debug, Default)]
pub struct RuleArgs {
    /// Discipline code recognised in file names (repeatable; default RIV, RIE, RIVA)
    #[arg(long = "discipline", value_name = "CODE")]
    pub disciplines: Vec<String>,
}

impl RuleArgs {
    pub fn config(&self) -> ValidationConfig {
        ValidationConfig::default().with_disciplines(self.disciplines.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_validate_flags() {
        let cli = Cli::try_parse_from([
            "utsp", "validate", "a.ifc", "dir", "-o", "out", "--no-html", "--discipline", "ARK",
        ])
        .unwrap();
        let Command::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.inputs, vec![PathBuf::from("a.ifc"), PathBuf::from("dir")]);
        assert_eq!(args.output, PathBuf::from("out"));
        assert!(args.no_html && !args.no_excel && !args.no_ifc);
        assert_eq!(args.rules.config().disciplines, vec!["ARK".to_string()]);
    }

    #[test]
    fn test_default_disciplines() {
        let config = RuleArgs::default().config();
        assert_eq!(config.disciplines, vec!["RIV", "RIE", "RIVA"]);
    }

    #[test]
    fn test_validate_needs_input() {
        assert!(Cli::try_parse_from(["utsp", "validate"]).is_err());
    }
}
