use crate::args::LogArgs;
use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Logs go to stderr; stdout is left to program output.
pub fn init(args: &LogArgs) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&args.level)
        .with_context(|| format!("invalid log filter '{}'", args.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!args.no_color)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))
}
