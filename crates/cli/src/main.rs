use anyhow::Result;
use clap::Parser;
use neo_vm_cli::args::{CliArgs, Command, LogFormat};
use neo_vm_cli::commands;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let cli = CliArgs::parse();
    init_tracing(cli.log_format);

    match &cli.command {
        Command::Run(args) => {
            let report = commands::run(args)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Disasm { script } => {
            for line in commands::disasm(script)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
