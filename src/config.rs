//! Command line and environment configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::laudo::config::DEFAULT_TEMPLATE_FILE;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Parser, Debug)]
#[command(
    name = "vistoria-laudo",
    version,
    about = "Generates property inspection reports (laudos) from the field-app workbook",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// `serve` options, used when no subcommand is given.
    #[command(flatten)]
    pub serve: ServerConfig,
}

impl Cli {
    /// The selected command; `serve` when none is given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServerConfig),
    /// Generate one report from a local workspace.
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "LAUDO_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: String,

    /// Template used when a request does not carry one.
    #[arg(long, env = "LAUDO_DEFAULT_TEMPLATE", default_value = DEFAULT_TEMPLATE_FILE)]
    pub default_template: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    /// Inspection identifier (`ID_Vistoria`).
    pub id_vistoria: String,

    /// Directory holding Vistoria.xlsx, Modelo_Vistoria.docx and the photos.
    #[arg(long, env = "LAUDO_BASE_DIR", default_value = ".")]
    pub workspace: PathBuf,
}
