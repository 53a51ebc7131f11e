use anyhow::Context;
use clap::Parser;

use vistoria_laudo_server::config::{Cli, Command};
use vistoria_laudo_server::laudo::{LaudoConfig, LaudoGenerator};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().into_command() {
        Command::Serve(config) => vistoria_laudo_server::run(config)
            .await
            .context("HTTP server failed"),
        Command::Generate(args) => {
            let generator = LaudoGenerator::new(LaudoConfig::for_workspace(&args.workspace));
            match generator.generate(&args.id_vistoria) {
                Ok(report) => {
                    println!("[OK] Laudo gerado em: {}", report.path.display());
                    Ok(())
                }
                Err(e) => {
                    log::error!("Report generation failed: {}", e);
                    Err(e).with_context(|| format!("could not generate report {}", args.id_vistoria))
                }
            }
        }
    }
}
