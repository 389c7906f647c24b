use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Parser;

use mercu::config::DEFAULT_API_PORT;
use mercu::{Config, Interpreter, StdoutConsole, run_source};

#[derive(Parser, Debug)]
#[command(name = "mercu", version)]
#[command(about = "Run Mercu (.mer) programs", long_about = None)]
struct Cli {
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Address the API started by `create_api` binds to.
    #[arg(long, env = "MERCU_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    #[arg(long, env = "MERCU_PORT", default_value_t = DEFAULT_API_PORT)]
    port: u16,

    /// Print without ANSI colours.
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.file.to_string_lossy().ends_with(".mer") {
        bail!(
            "File extension must be .mer, got {}",
            cli.file.display()
        );
    }
    let source = fs::read_to_string(&cli.file)
        .with_context(|| format!("Reading {}", cli.file.display()))?;

    let config = Config::default()
        .with_api_addr(SocketAddr::new(cli.host, cli.port))
        .with_color(!cli.no_color);
    let interpreter = Interpreter::new(config);
    let mut console = StdoutConsole::new(config.color);

    let mut context = match run_source(&source, &interpreter, &mut console) {
        Ok(context) => context,
        Err(error) => bail!("{} error: {error}", error.kind()),
    };
    if let Some(addr) = context.service_addr() {
        log::info!("serving http://{addr} until interrupted");
    }
    context
        .wait_for_service()
        .context("Waiting for the API service")?;
    Ok(())
}
