//! Scripted scoring: a match configuration plus a list of actions, replayed
//! through the service against a fresh match.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rand::Rng;
use serde::Deserialize;
use tracing::info;

use crease_engine::{Delivery, Match, TossDecision};
use crease_fabric::{EventFilter, ScoreEvent};
use crease_ledger::{BallOutcome, DismissalType, WicketDetail};
use crease_service::{ScoringService, ServiceConfig};
use crease_types::{AccountId, MatchConfig, MatchId, PlayerRef, TeamSide};

/// A match configuration, an optional toss, and the scoring actions to
/// replay against it.
#[derive(Debug, Deserialize)]
pub struct MatchScript {
    #[serde(rename = "match")]
    pub config: MatchConfig,
    #[serde(default)]
    pub toss: Option<TossSpec>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct TossSpec {
    pub winner: TeamSide,
    pub decision: TossDecision,
}

impl TossSpec {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            winner: if rng.gen_bool(0.5) { TeamSide::A } else { TeamSide::B },
            decision: if rng.gen_bool(0.5) {
                TossDecision::Bat
            } else {
                TossDecision::Bowl
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Batsmen {
        striker: PlayerRef,
        #[serde(default)]
        non_striker: Option<PlayerRef>,
    },
    NewBatter {
        player: PlayerRef,
    },
    Bowler {
        player: PlayerRef,
    },
    Ball(BallSpec),
    /// Whitespace-separated shorthand such as `4 . 1 wd+1 nb+4 w`.
    Balls {
        outcomes: String,
    },
    Undo,
    Rewind {
        len: usize,
    },
    SecondInnings,
    Abandon {
        reason: String,
    },
    Cancel {
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct BallSpec {
    pub outcome: String,
    #[serde(default)]
    pub runs: u32,
    #[serde(default)]
    pub dismissal: Option<DismissalType>,
    #[serde(default)]
    pub dismissed: Option<PlayerRef>,
    #[serde(default)]
    pub fielder: Option<PlayerRef>,
    #[serde(default)]
    pub commentary: Option<String>,
}

impl BallSpec {
    fn into_delivery(self) -> Result<Delivery> {
        let outcome: BallOutcome = self.outcome.parse().map_err(|e: String| anyhow!(e))?;
        let mut delivery = Delivery::new(outcome).with_runs(self.runs);
        if self.dismissal.is_some() || self.dismissed.is_some() || self.fielder.is_some() {
            delivery = delivery.with_wicket(WicketDetail {
                dismissal: self.dismissal,
                dismissed: self.dismissed,
                fielder: self.fielder,
            });
        }
        if let Some(text) = self.commentary {
            delivery = delivery.with_commentary(text);
        }
        Ok(delivery)
    }
}

/// Parse one shorthand token: an outcome, optionally `+runs`.
pub fn parse_token(token: &str) -> Result<Delivery> {
    let (outcome, runs) = match token.split_once('+') {
        Some((outcome, runs)) => {
            let runs = runs
                .parse::<u32>()
                .with_context(|| format!("bad run count in '{token}'"))?;
            (outcome, runs)
        }
        None => (token, 0),
    };
    let outcome: BallOutcome = outcome.parse().map_err(|e: String| anyhow!(e))?;
    Ok(Delivery::new(outcome).with_runs(runs))
}

pub fn load_script(path: &Path) -> Result<MatchScript> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid script {}", path.display()))
}

pub fn load_config(path: &Path) -> Result<MatchConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let config = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text)?
    } else {
        toml::from_str(&text)?
    };
    Ok(config)
}

pub struct PlayOptions {
    pub random_toss: bool,
    pub service: ServiceConfig,
}

pub struct PlayOutcome {
    pub game: Arc<Match>,
    pub events: Vec<ScoreEvent>,
}

/// Create the match on a fresh service and replay every action as the umpire.
pub async fn play(script: MatchScript, options: PlayOptions) -> Result<PlayOutcome> {
    let umpire = script.config.umpire.clone();
    let service = ScoringService::new(options.service);
    let id = service.create_match(script.config).await?.id();

    let toss = match (options.random_toss, script.toss) {
        (false, Some(toss)) => toss,
        _ => TossSpec::random(&mut rand::thread_rng()),
    };
    service.open_toss(&umpire, id).await?;
    service
        .conduct_toss(&umpire, id, toss.winner, toss.decision)
        .await?;

    let total = script.actions.len();
    for (index, action) in script.actions.into_iter().enumerate() {
        apply(&service, &umpire, id, action)
            .await
            .with_context(|| format!("action {} of {total} failed", index + 1))?;
    }

    let game = service.get_match(id)?;
    let events = service.fabric().recent(&EventFilter::for_match(id));
    info!(match_id = %id, status = %game.status(), events = events.len(), "script finished");
    Ok(PlayOutcome { game, events })
}

async fn apply(
    service: &ScoringService,
    umpire: &AccountId,
    id: MatchId,
    action: Action,
) -> Result<()> {
    match action {
        Action::Batsmen {
            striker,
            non_striker,
        } => {
            service.set_batsmen(umpire, id, striker, non_striker).await?;
        }
        Action::NewBatter { player } => {
            service.set_new_batter(umpire, id, player).await?;
        }
        Action::Bowler { player } => {
            service.set_bowler(umpire, id, player).await?;
        }
        Action::Ball(spec) => {
            service.record_ball(umpire, id, spec.into_delivery()?).await?;
        }
        Action::Balls { outcomes } => {
            for token in outcomes.split_whitespace() {
                let delivery = parse_token(token)?;
                service
                    .record_ball(umpire, id, delivery)
                    .await
                    .with_context(|| format!("delivery '{token}'"))?;
            }
        }
        Action::Undo => {
            service.undo_last_ball(umpire, id).await?;
        }
        Action::Rewind { len } => {
            service.rewind_innings(umpire, id, len).await?;
        }
        Action::SecondInnings => {
            service.start_second_innings(umpire, id).await?;
        }
        Action::Abandon { reason } => {
            service.abandon(umpire, id, &reason).await?;
        }
        Action::Cancel { reason } => {
            service.cancel(umpire, id, &reason).await?;
        }
    }
    Ok(())
}
