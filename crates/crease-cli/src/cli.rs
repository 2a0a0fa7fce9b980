use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "crease",
    about = "Crease: ball-by-ball scoring for self-officiated box cricket",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a match configuration file
    Check(CheckArgs),
    /// Play a scripted match and print the scoreboard
    Play(PlayArgs),
    /// List the delivery outcome shorthand accepted in scripts
    Outcomes,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Match configuration (TOML, or JSON with a .json extension)
    pub config: PathBuf,
}

#[derive(Args)]
pub struct PlayArgs {
    /// Match script (TOML)
    pub script: PathBuf,
    /// Flip a coin for the toss instead of reading it from the script
    #[arg(long)]
    pub random_toss: bool,
    /// Also print every event published during play
    #[arg(long)]
    pub events: bool,
    /// Service configuration (TOML)
    #[arg(long)]
    pub service_config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_play_flags() {
        let cli = Cli::parse_from([
            "crease",
            "play",
            "match.toml",
            "--random-toss",
            "--format",
            "json",
            "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Play(args) => {
                assert_eq!(args.script, PathBuf::from("match.toml"));
                assert!(args.random_toss);
                assert!(!args.events);
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
