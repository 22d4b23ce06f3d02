use anyhow::Result;
use chatpipe::harness::ModuleRunner;
use chatpipe::module::counter::Counter;
use chatpipe::module::janitor::Janitor;
use options::{Command, LogFormat};
use structopt::StructOpt;
use tracing::info;

mod options;

#[tokio::main]
async fn main() -> Result<()> {
    let (command, runner) = init()?;

    let reason = match command {
        Command::Counter(options) => runner.run(Counter::new(options)).await,
        Command::Janitor(options) => runner.run(Janitor::new(options)).await,
    };

    if reason.is_clean() {
        Ok(())
    } else {
        Err(reason.into())
    }
}

fn init() -> Result<(Command, ModuleRunner)> {
    let options = options::MainOptions::from_args();

    let formatter = tracing_subscriber::fmt().with_env_filter(options.log);

    match options.log_format {
        LogFormat::Text => formatter.try_init(),
        LogFormat::Compact => formatter.compact().try_init(),
        LogFormat::Json => formatter.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!(e))?;

    let runner = ModuleRunner::default().with_startup_timeout(options.startup_timeout);
    let runner = match options.status_server {
        Some(port) => runner.with_status_server(port),
        None => runner,
    };

    info!("chatpipe {}", env!("CARGO_PKG_VERSION"));

    Ok((options.command, runner))
}
