use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use tokio::runtime::Builder;

use dv_router::display::{render_discrepancies, render_node, render_report};
use dv_router::network::Discrepancy;
use dv_router::runtime::AsyncNetwork;
use dv_router::{NodeSnapshot, RoutingParams, ScenarioConfig, Simulator, VirtualTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Deterministic discrete-event simulation.
    Sim,
    /// One tokio task per router. Link changes are applied in time order,
    /// each once the network has gone quiet; their times are not replayed.
    Async,
}

#[derive(Parser)]
#[command(name = "dv-router", about = "Distance-vector routing with poison reverse")]
struct Cli {
    /// Scenario file (JSON). Defaults to the built-in three-router lab network.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// How to run the routers. Only `sim` injects link changes at their
    /// scheduled times.
    #[arg(long, value_enum, default_value_t = Mode::Sim)]
    mode: Mode,

    /// Override the scenario's jitter seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Override the scenario's maximum random delivery delay.
    #[arg(long)]
    jitter: Option<u64>,

    /// Override the scenario's delivery budget.
    #[arg(long)]
    max_events: Option<u64>,

    /// Seconds to wait for the async network to go quiet.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Print every router's tables after the run.
    #[arg(long)]
    tables: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,

    /// Write the effective scenario to this file and exit.
    #[arg(long)]
    dump_scenario: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) -> Result<()> {
    let (level, trace_level) = match verbose {
        0 => (LevelFilter::Warn, tracing::Level::WARN),
        1 => (LevelFilter::Info, tracing::Level::INFO),
        2 => (LevelFilter::Debug, tracing::Level::DEBUG),
        _ => (LevelFilter::Trace, tracing::Level::TRACE),
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let subscriber = tracing_subscriber::fmt().with_max_level(trace_level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("installing tracing subscriber")?;
    Ok(())
}

fn load_scenario(cli: &Cli) -> Result<ScenarioConfig> {
    let mut config = match &cli.scenario {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.simulation.seed = seed;
    }
    if let Some(jitter) = cli.jitter {
        config.simulation.max_jitter = jitter;
    }
    if let Some(max_events) = cli.max_events {
        config.simulation.max_events = max_events;
    }
    config.validate()?;
    Ok(config)
}

fn print_tables(snapshots: &[NodeSnapshot], now: Option<VirtualTime>) {
    for snap in snapshots {
        println!("\n{}", render_node(snap, now));
    }
}

fn finish(found: &[Discrepancy], params: &RoutingParams) -> Result<()> {
    print!("{}", render_discrepancies(found, params));
    if !found.is_empty() {
        bail!("{} routers disagree with the shortest-path reference", found.len());
    }
    Ok(())
}

fn run_simulation(cli: &Cli, config: &ScenarioConfig) -> Result<()> {
    let mut sim = Simulator::from_scenario(config)?;
    let report = sim.run();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    if cli.tables {
        let snapshots: Vec<_> = sim.nodes().iter().map(|n| n.snapshot()).collect();
        print_tables(&snapshots, Some(sim.current_time()));
    }

    if !report.converged {
        bail!(
            "no quiescence within {} deliveries; raise --max-events or lower infinity",
            config.simulation.max_events
        );
    }
    finish(&sim.verify(), &config.params())
}

fn run_async(cli: &Cli, config: &ScenarioConfig) -> Result<()> {
    let rt = Builder::new_multi_thread().enable_all().build()?;
    let limit = Duration::from_secs(cli.timeout);

    rt.block_on(async {
        let mut net = AsyncNetwork::start(config.topology()?);
        net.wait_quiescent(limit).await?;
        info!("initial convergence reached");

        let mut changes = config.resolved_link_changes();
        changes.sort_by_key(|&(at, ..)| at);
        for (at, a, b, cost) in changes {
            info!("applying link change scheduled for T={}", at);
            net.change_link(a, b, cost)?;
            net.wait_quiescent(limit).await?;
        }

        let found = net.verify().await?;
        if cli.tables {
            print_tables(&net.snapshots().await?, None);
        }
        net.shutdown().await?;
        finish(&found, &config.params())
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = load_scenario(&cli)?;
    if let Some(path) = &cli.dump_scenario {
        config
            .save(path)
            .with_context(|| format!("writing scenario to {}", path.display()))?;
        println!("Scenario '{}' written to {}", config.name, path.display());
        return Ok(());
    }

    println!(
        "Scenario '{}': {} routers, {} link change(s), mode {:?}",
        config.name,
        config.num_nodes(),
        config.link_changes.len(),
        cli.mode
    );

    match cli.mode {
        Mode::Sim => run_simulation(&cli, &config),
        Mode::Async => run_async(&cli, &config),
    }
}
