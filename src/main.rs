use clap::Parser;
use schemaform::cli::Cli;
use schemaform::commands;
use schemaform::config::Settings;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_level))
        .with_writer(std::io::stderr)
        .init();
    debug!(config = %cli.config.display(), "Settings loaded");

    let output = commands::run(&cli.command, &settings)?;
    let text = if settings.output.pretty {
        serde_json::to_string_pretty(&output.body)?
    } else {
        serde_json::to_string(&output.body)?
    };
    println!("{}", text);

    if !output.success {
        error!("Command reported failure");
        std::process::exit(1);
    }
    Ok(())
}
