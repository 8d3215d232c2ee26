use clap::Parser;
use health_sweep::{
    InvocationStatus,
    config::{Config, read_config_file},
    pipeline::invoke_loaded,
};
use tracing::{level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(about = "Probe configured services once and post a consolidated health report")]
struct Args {
    /// Config file (falls back to SERVICES_CONFIG / SLACK_WEBHOOK_URL when absent)
    #[arg(short, long)]
    file: Option<String>,

    /// Override the execution ceiling, in seconds
    #[arg(long)]
    deadline: Option<f64>,

    /// Log level for this crate
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,
}

fn init(level: LevelFilter) {
    let filter = filter::Targets::new().with_targets(vec![("health_sweep", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.log_level);
    trace!("started with args: {args:?}");

    let loaded = match &args.file {
        Some(path) => read_config_file(path),
        None => Config::from_env(),
    }
    .map(|mut config| {
        if let Some(deadline) = args.deadline {
            config.deadline.ceiling = deadline;
        }
        config
    });

    let result = invoke_loaded(loaded).await;
    println!("{}", serde_json::to_string_pretty(&result.response())?);

    if result.status == InvocationStatus::Failed {
        anyhow::bail!(result.message);
    }
    Ok(())
}
