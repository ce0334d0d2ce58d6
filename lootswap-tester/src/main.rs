mod harness;
mod scenarios;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use scenarios::{ScenarioOutcome, list_scenarios, run_scenario, run_soak};

#[derive(Debug, Parser)]
#[command(name = "lootswap-tester", version = "0.1.0")]
#[command(about = "Automated QA for the lootswap override engine - scripted scenarios and seeded soak runs")]
struct Args {
    /// Scenarios to run (comma-separated; "all" runs every scripted one)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds for soak runs (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Soak iterations per seed
    #[arg(long, default_value_t = 512)]
    iterations: usize,

    /// Also run the seeded soak after the scripted scenarios
    #[arg(long)]
    soak: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        for (name, description) in list_scenarios() {
            println!("{:<18} {description}", name.bold());
        }
        return Ok(());
    }

    let mut outcomes = Vec::new();

    for name in split_csv(&args.scenarios) {
        if name == "all" {
            for (listed, _) in list_scenarios() {
                outcomes.push(run_scenario(listed).expect("listed scenario exists"));
            }
            continue;
        }
        let Some(outcome) = run_scenario(&name) else {
            bail!("unknown scenario '{name}' (use --list-scenarios)");
        };
        outcomes.push(outcome);
    }

    if args.soak {
        for seed in parse_seeds(&args.seeds)? {
            outcomes.push(run_soak(seed, args.iterations));
        }
    }

    render_report(&args, &outcomes)?;

    if outcomes.iter().all(|outcome| outcome.passed) {
        Ok(())
    } else {
        bail!("{} scenario(s) failed", failed_count(&outcomes));
    }
}

fn failed_count(outcomes: &[ScenarioOutcome]) -> usize {
    outcomes.iter().filter(|outcome| !outcome.passed).count()
}

fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_seeds(input: &str) -> Result<Vec<u64>> {
    split_csv(input)
        .iter()
        .map(|seed| {
            seed.parse::<u64>()
                .with_context(|| format!("invalid seed '{seed}'"))
        })
        .collect()
}

fn render_report(args: &Args, outcomes: &[ScenarioOutcome]) -> Result<()> {
    let raw: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("cannot create report file {}", path.display()))?,
        ),
        None => Box::new(stdout()),
    };
    let mut sink = BufWriter::new(raw);

    match args.report.as_str() {
        "json" => {
            serde_json::to_writer_pretty(&mut sink, outcomes)?;
            writeln!(sink)?;
        }
        _ => render_console(&mut sink, args.verbose, outcomes)?,
    }
    sink.flush()?;
    Ok(())
}

fn render_console(
    sink: &mut impl Write,
    verbose: bool,
    outcomes: &[ScenarioOutcome],
) -> Result<()> {
    for outcome in outcomes {
        let status = if outcome.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        writeln!(sink, "{status} {}", outcome.name)?;
        for check in &outcome.checks {
            if check.passed && !verbose {
                continue;
            }
            let mark = if check.passed {
                "ok".green()
            } else {
                "not ok".red()
            };
            write!(sink, "  {mark} {}", check.label)?;
            match &check.detail {
                Some(detail) => writeln!(sink, " ({detail})")?,
                None => writeln!(sink)?,
            }
        }
    }
    let failed = failed_count(outcomes);
    if failed == 0 {
        writeln!(sink, "{}", format!("{} scenario(s) passed", outcomes.len()).green())?;
    } else {
        writeln!(sink, "{}", format!("{failed} scenario(s) failed").red())?;
    }
    Ok(())
}
