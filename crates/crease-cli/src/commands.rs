use colored::Colorize;
use serde_json::json;

use crease_ledger::BallOutcome;
use crease_service::ServiceConfig;
use crease_types::MatchConfig;

use crate::cli::*;
use crate::render;
use crate::script::{self, PlayOptions};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Check(args) => cmd_check(args, cli.format),
        Command::Play(args) => cmd_play(args, cli.format),
        Command::Outcomes => cmd_outcomes(cli.format),
    }
}

fn cmd_check(args: CheckArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = script::load_config(&args.config)?;
    config.validate()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => print_config(&config),
    }
    Ok(())
}

fn print_config(config: &MatchConfig) {
    let settings = &config.settings;
    println!("{} Match configuration is valid", "✓".green().bold());
    println!(
        "  {} vs {}",
        config.team_a.name.bold(),
        config.team_b.name.bold()
    );
    println!(
        "  Overs: {}, players per side: {}",
        settings.overs.to_string().cyan(),
        settings.players_per_team.to_string().cyan()
    );
    println!(
        "  Wide: {} run(s), no-ball: {} run(s), free hit: {}",
        settings.wide_runs,
        settings.no_ball_runs,
        if settings.no_ball_free_hit { "on".green() } else { "off".yellow() }
    );
    println!("  Umpire: {}", config.umpire.to_string().yellow());
}

fn cmd_play(args: PlayArgs, format: OutputFormat) -> anyhow::Result<()> {
    let service = match &args.service_config {
        Some(path) => ServiceConfig::from_path(path)?,
        None => ServiceConfig::default(),
    };
    let script = script::load_script(&args.script)?;
    let options = PlayOptions {
        random_toss: args.random_toss,
        service,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(script::play(script, options))?;

    match format {
        OutputFormat::Json => {
            let events = args.events.then_some(outcome.events.as_slice());
            let report = render::Report::new(&outcome.game, events);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            print!("{}", render::scoreboard(&outcome.game));
            if args.events {
                println!("\n{}", "Events".bold());
                print!("{}", render::event_log(&outcome.events));
            }
        }
    }
    Ok(())
}

const OUTCOMES: [(&str, BallOutcome, &str); 11] = [
    (".", BallOutcome::Dot, "no run, legal"),
    ("1", BallOutcome::One, "one run off the bat"),
    ("2", BallOutcome::Two, "two runs off the bat"),
    ("3", BallOutcome::Three, "three runs off the bat"),
    ("4", BallOutcome::Four, "boundary four"),
    ("6", BallOutcome::Six, "boundary six"),
    ("wd+N", BallOutcome::Wide, "wide penalty plus N runs, not legal"),
    ("nb+N", BallOutcome::NoBall, "no-ball penalty plus N off the bat, not legal"),
    ("b+N", BallOutcome::Bye, "N byes (default 1), legal"),
    ("lb+N", BallOutcome::LegBye, "N leg-byes (default 1), legal"),
    ("w", BallOutcome::Wicket, "wicket, legal"),
];

fn cmd_outcomes(format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = OUTCOMES
                .iter()
                .map(|(token, outcome, meaning)| {
                    json!({ "token": token, "outcome": outcome, "meaning": meaning })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            for (token, outcome, meaning) in OUTCOMES {
                println!("  {:<6} {:<9} {}", token.yellow(), outcome.to_string().bold(), meaning);
            }
        }
    }
    Ok(())
}
