use std::env;
use std::error::Error;

use chrono::Local;
use colored::*;
use dotenv::dotenv;
use tracing::{info, span, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::constant::SEED;
use crate::config::SimConfig;
use crate::error::RunFailure;
use crate::fixtures::data_generator::{generate_random_scenario, sample_scenario};
use crate::setup::init::{load_scenario, setup};
use crate::setup::init_types::Scenario;
use crate::sink::{ConsoleSink, SinkSet, TimelineSink, TracingSink};
use crate::solver::dispatch::RunReport;

const RANDOM_ARG: &str = "--random";

/// Initialize tracing and environment
fn init_tracing_and_env() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            fmt::layer()
                .with_span_events(fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE)
                .pretty(),
        )
        .init();

    dotenv().ok();
    Ok(())
}

/// Pick the scenario: `--random [seed]`, a JSON path argument, `COURIER_SCENARIO`,
/// or the built-in sample map, in that order.
fn choose_scenario(args: &[String], config: &SimConfig) -> Result<Scenario, Box<dyn Error>> {
    match args.first().map(String::as_str) {
        Some(RANDOM_ARG) => {
            let seed = match args.get(1) {
                Some(raw) => raw.parse::<u64>()?,
                None => SEED,
            };
            Ok(generate_random_scenario(12, 12, 10, 0.2, config.capacity, seed)?)
        }
        Some(path) => Ok(load_scenario(path)?),
        None => match config.scenario_path.as_deref() {
            Some(path) => Ok(load_scenario(path)?),
            None => {
                info!("No scenario given, using the built-in sample map");
                Ok(sample_scenario())
            }
        },
    }
}

fn report_final_stats(report: &RunReport) {
    info!(
        "Delivered {} packages in {} depot returns ({} legs, {} steps)",
        report.delivered.len(),
        report.depot_returns,
        report.legs,
        report.steps
    );
    info!(
        "Running time {:.1}s, handling time {:.1}s, transitions {}",
        report.travel_time, report.handling_time, report.transitions
    );
    println!(
        "{}",
        format!(
            "All packages delivered. Running time: {:.1}s",
            report.travel_time
        )
        .green()
    );
}

/// Log the outcome and hand back only the underlying error, without the snapshot.
fn finish(outcome: Result<RunReport, RunFailure>) -> Result<(), Box<dyn Error>> {
    match outcome {
        Ok(report) => {
            report_final_stats(&report);
            Ok(())
        }
        Err(RunFailure { error, last_state }) => {
            warn!(
                "Run halted at {} with {} delivered, load {}",
                last_state.position, last_state.delivered, last_state.load
            );
            Err(error.into())
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    init_tracing_and_env()?;

    let config = SimConfig::from_env()?;
    let args: Vec<String> = env::args().skip(1).collect();
    let scenario = choose_scenario(&args, &config)?;

    let mut scheduler = setup(scenario, &config)?;

    let started = Local::now();
    info!("Starting delivery simulation at {}", started.format("%H:%M:%S"));

    let mut timeline = TimelineSink::new();
    let outcome = {
        let loop_span = span!(Level::INFO, "simulation");
        let _loop_guard = loop_span.enter();

        let mut sinks = SinkSet::new()
            .with(ConsoleSink::new(config.pace))
            .with(TracingSink)
            .with(&mut timeline);
        scheduler.run(&mut sinks)
    };

    let finished = Local::now();
    info!(
        "Simulation finished at {} after {} ms wall time",
        finished.format("%H:%M:%S"),
        (finished - started).num_milliseconds()
    );

    timeline.save_to_csv(&config.timeline_csv)?;
    finish(outcome)
}
