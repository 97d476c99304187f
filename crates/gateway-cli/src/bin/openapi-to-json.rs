use agentcore_gateway_cli::args::LogArgs;
use agentcore_gateway_cli::{exit, telemetry};
use anyhow::Context as _;
use clap::Parser;
use owo_colors::OwoColorize as _;
use std::path::PathBuf;
use std::process::ExitCode;

/// Convert a YAML OpenAPI description to indented JSON
#[derive(Parser, Debug)]
#[command(name = "openapi-to-json", version, about, long_about = None)]
struct Cli {
    /// YAML description to read
    #[arg(long, short, default_value = "openapi.yaml")]
    input: PathBuf,

    /// JSON file to write (overwritten)
    #[arg(long, short, default_value = "openapi.json")]
    output: PathBuf,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let color = !cli.log.no_color;
    exit::report(run(&cli), color)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    telemetry::init(&cli.log)?;
    agentcore_openapi_convert::convert_file(&cli.input, &cli.output)
        .context("convert OpenAPI description")?;

    let done = format!(
        "Converted '{}' to '{}'",
        cli.input.display(),
        cli.output.display()
    );
    if cli.log.no_color {
        println!("{done}");
    } else {
        println!("{} {done}", "✓".green());
    }
    Ok(())
}
