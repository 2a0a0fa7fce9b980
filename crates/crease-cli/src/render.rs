use std::fmt::Write;

use colored::Colorize;
use serde::Serialize;

use crease_engine::{InningsSelector, Match, ResultType, ScoreSnapshot, TossDecision};
use crease_fabric::ScoreEvent;
use crease_ledger::Scorecard;
use crease_types::{PlayerRef, TeamSide};

/// Display name for a player: the guest name, or a short account id.
pub fn player_name(player: &PlayerRef) -> String {
    match player {
        PlayerRef::Guest(name) => name.clone(),
        PlayerRef::Registered(id) => id.simple().to_string()[..8].to_string(),
    }
}

/// Plain-text scoreboard for a match: toss, both innings and the result.
pub fn scoreboard(game: &Match) -> String {
    let mut out = String::new();
    let a = game.team(TeamSide::A);
    let b = game.team(TeamSide::B);
    let _ = writeln!(
        out,
        "{} vs {}  [{}]",
        a.name.bold(),
        b.name.bold(),
        status_label(game)
    );

    if let Some(toss) = game.toss() {
        let choice = match toss.decision {
            TossDecision::Bat => "bat",
            TossDecision::Bowl => "bowl",
        };
        let _ = writeln!(
            out,
            "Toss: {} won and chose to {choice}",
            game.team(toss.winner).name
        );
    }

    for selector in [InningsSelector::First, InningsSelector::Second] {
        if let Some(card) = game.scorecard(selector) {
            write_innings(&mut out, game, selector, &card);
        }
    }

    if let Some(result) = game.result() {
        let summary = match result.result_type {
            ResultType::Win => result.summary.green().bold(),
            ResultType::Tie => result.summary.yellow().bold(),
            ResultType::Abandoned => result.summary.red().bold(),
        };
        let _ = writeln!(out, "\n{summary}");
    } else if let Some(reason) = game.cancel_reason() {
        let _ = writeln!(out, "\n{} {reason}", "Cancelled:".red().bold());
    }
    out
}

fn status_label(game: &Match) -> colored::ColoredString {
    let status = game.status();
    if status.is_terminal() {
        status.as_str().dimmed()
    } else {
        status.as_str().cyan()
    }
}

fn write_innings(out: &mut String, game: &Match, selector: InningsSelector, card: &Scorecard) {
    let Some(innings) = game.innings(selector) else {
        return;
    };
    let totals = innings.totals();
    let _ = writeln!(
        out,
        "\n{} innings: {} {}/{} ({} ov)  RR {:.2}",
        match selector {
            InningsSelector::First => "First",
            InningsSelector::Second => "Second",
        },
        game.team(innings.batting_team()).name.bold(),
        totals.runs,
        totals.wickets,
        innings.overs_notation(),
        innings.run_rate()
    );
    if let Some(target) = innings.target() {
        let _ = writeln!(out, "  Target {target}");
    }

    let _ = writeln!(
        out,
        "  {:<18}{:>5}{:>5}{:>5}{:>5}{:>8}",
        "Batter".underline(),
        "R",
        "B",
        "4s",
        "6s",
        "SR"
    );
    for batter in &card.batters {
        let marker = if batter.out { " " } else { "*" };
        let _ = writeln!(
            out,
            "  {:<18}{:>5}{:>5}{:>5}{:>5}{:>8.2}",
            format!("{}{marker}", player_name(&batter.player)),
            batter.runs,
            batter.balls_faced,
            batter.fours,
            batter.sixes,
            batter.strike_rate()
        );
    }

    let extras = innings.extras();
    let _ = writeln!(
        out,
        "  Extras {} (wd {}, nb {}, b {}, lb {})",
        extras.total(),
        extras.wides,
        extras.no_balls,
        extras.byes,
        extras.leg_byes
    );

    if !innings.fall_of_wickets().is_empty() {
        let falls: Vec<String> = innings
            .fall_of_wickets()
            .iter()
            .map(|fall| format!("{} {}", fall.notation(), player_name(&fall.player)))
            .collect();
        let _ = writeln!(out, "  Fall of wickets: {}", falls.join(", "));
    }

    let _ = writeln!(
        out,
        "  {:<18}{:>5}{:>5}{:>5}{:>5}{:>8}",
        "Bowler".underline(),
        "O",
        "M",
        "R",
        "W",
        "Econ"
    );
    for bowler in &card.bowlers {
        let _ = writeln!(
            out,
            "  {:<18}{:>5}{:>5}{:>5}{:>5}{:>8.2}",
            player_name(&bowler.player),
            bowler.overs(),
            bowler.maidens,
            bowler.runs_conceded,
            bowler.wickets,
            bowler.economy()
        );
    }
}

/// Machine-readable report of a finished script run.
#[derive(Serialize)]
pub struct Report<'a> {
    #[serde(rename = "match")]
    pub game: &'a Match,
    pub snapshot: ScoreSnapshot,
    pub first: Option<Scorecard>,
    pub second: Option<Scorecard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<&'a [ScoreEvent]>,
}

impl<'a> Report<'a> {
    pub fn new(game: &'a Match, events: Option<&'a [ScoreEvent]>) -> Self {
        Self {
            game,
            snapshot: game.snapshot(),
            first: game.scorecard(InningsSelector::First),
            second: game.scorecard(InningsSelector::Second),
            events,
        }
    }
}

/// One line per event, oldest first.
pub fn event_log(events: &[ScoreEvent]) -> String {
    let mut out = String::new();
    for event in events {
        let _ = writeln!(
            out,
            "{:>4} {:<14} {}",
            event.sequence.to_string().dimmed(),
            event.kind.to_string().yellow(),
            event.snapshot.score_line()
        );
    }
    out
}
