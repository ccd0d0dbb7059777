use std::sync::Arc;

use curvesim_runner::{LogSink, SimulationBootstrap, SimulationConfig};
use env_logger::Env;

fn print_help() {
    eprintln!(
        r#"curvesim - bonding curve market agent simulation

USAGE:
    curvesim [OPTIONS] [CONFIG]

ARGS:
    <CONFIG>            JSON configuration file (built-in defaults when absent)

OPTIONS:
    --ticks <N>         Override the number of ticks (0 runs until Ctrl-C)
    --seed <N>          Override the random seed
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)

EXAMPLES:
    # Run the default population for 100 ticks
    curvesim

    # Run a configured scenario until interrupted
    curvesim --ticks 0 scenario.json
"#
    );
}

fn parse_number(flag: &str, value: Option<&String>) -> Result<u64, Box<dyn std::error::Error>> {
    let value = value.ok_or_else(|| format!("{} requires a value", flag))?;
    Ok(value
        .parse()
        .map_err(|e| format!("{} expects a number, got {}: {}", flag, value, e))?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut ticks: Option<u64> = None;
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--ticks" => {
                i += 1;
                ticks = Some(parse_number("--ticks", args.get(i))?);
            }
            "--seed" => {
                i += 1;
                seed = Some(parse_number("--seed", args.get(i))?);
            }
            arg if arg.starts_with('-') => {
                print_help();
                return Err(format!("Unknown argument: {}", arg).into());
            }
            path => config_path = Some(path.to_string()),
        }
        i += 1;
    }

    let mut config = match &config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            SimulationConfig::from_file(path)?
        }
        None => SimulationConfig::default(),
    };
    if let Some(ticks) = ticks {
        config.total_ticks = ticks;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }

    let bootstrap = SimulationBootstrap::new(&config)?;
    let gateway = Arc::clone(&bootstrap.gateway);
    let mut scheduler = bootstrap.into_scheduler().with_sink(Arc::new(LogSink));

    let stop = scheduler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupt received, finishing current tick");
            stop.stop();
        }
    });

    let report = scheduler.run().await?;

    for market_id in gateway.market_ids() {
        if let (Some(state), Some(initial)) =
            (gateway.peek(&market_id), gateway.initial_pool(&market_id))
        {
            log::info!(
                "{}: supply A {:.4}, supply B {:.4}, pool {} (started at {}, {} trades)",
                market_id,
                state.team_a_supply,
                state.team_b_supply,
                state.pool_value,
                initial,
                gateway.trades(&market_id).len()
            );
        }
    }
    for metrics in &report.per_agent_metrics {
        log::info!(
            "{:<28} {:>5} ok {:>5} failed  usdc {:>12.2}  pnl {:>+10.2}",
            metrics.agent_id.as_str(),
            metrics.successful,
            metrics.failed,
            metrics.usdc_balance,
            metrics.rough_pnl
        );
    }

    Ok(())
}
