//! Match lifecycle: toss, two innings, result, abandonment.
//!
//! [`Match`] owns both innings and enforces the status transitions. A
//! second innings is opened with the first innings total plus one as its
//! target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crease_ledger::{Ball, ProjectionBuilder, Scorecard};
use crease_types::{
    AccountId, MatchConfig, MatchId, MatchSettings, PlayerRef, SettingsError, TeamRoster,
    TeamSide,
};

use crate::error::ScoringError;
use crate::innings::{Delivery, FallOfWicket, Innings};
use crate::performance::PerformanceBook;
use crate::result::MatchResult;
use crate::snapshot::ScoreSnapshot;
use crate::undo::BallUndone;

/// Where a match is in its lifecycle. `Completed`, `Abandoned` and
/// `Cancelled` are final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    Toss,
    InProgress,
    InningsBreak,
    Completed,
    Abandoned,
    Cancelled,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Toss => "TOSS",
            Self::InProgress => "IN_PROGRESS",
            Self::InningsBreak => "INNINGS_BREAK",
            Self::Completed => "COMPLETED",
            Self::Abandoned => "ABANDONED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TossDecision {
    Bat,
    Bowl,
}

impl std::str::FromStr for TossDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bat" => Ok(Self::Bat),
            "bowl" | "field" => Ok(Self::Bowl),
            other => Err(format!("unknown toss decision: {other}")),
        }
    }
}

/// The recorded toss.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toss {
    pub winner: TeamSide,
    pub decision: TossDecision,
}

impl Toss {
    /// The side that bats in the first innings.
    pub fn batting_first(&self) -> TeamSide {
        match self.decision {
            TossDecision::Bat => self.winner,
            TossDecision::Bowl => self.winner.opponent(),
        }
    }
}

/// Picks one of the two innings of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InningsSelector {
    First,
    Second,
}

impl std::fmt::Display for InningsSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Second => f.write_str("second"),
        }
    }
}

/// Outcome of `Match::apply_ball`, ready for event emission.
#[derive(Clone, Debug, PartialEq)]
pub struct BallRecorded {
    pub ball: Ball,
    pub innings: InningsSelector,
    pub fall_of_wicket: Option<FallOfWicket>,
    pub over_completed: bool,
    pub maiden_completed: bool,
    pub innings_completed: bool,
    pub match_completed: bool,
    pub snapshot: ScoreSnapshot,
}

/// Aggregate root for one match: toss, both innings, status and result.
///
/// Holds no scoring arithmetic of its own. Every scoring call is routed to
/// the innings picked by the current selector, after which the match
/// evaluates cross-innings transitions. `version` increases with every
/// successful mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    id: MatchId,
    status: MatchStatus,
    settings: MatchSettings,
    team_a: TeamRoster,
    team_b: TeamRoster,
    umpire: AccountId,
    toss: Option<Toss>,
    current: Option<InningsSelector>,
    first_innings: Option<Innings>,
    second_innings: Option<Innings>,
    performances: PerformanceBook,
    result: Option<MatchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancel_reason: Option<String>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Match {
    pub fn new(config: MatchConfig) -> Result<Self, ScoringError> {
        Self::with_id(MatchId::new(), config)
    }

    pub fn with_id(id: MatchId, config: MatchConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        let now = Utc::now();
        let performances = PerformanceBook::new(&config.team_a, &config.team_b);
        info!(match_id = %id, a = %config.team_a.name, b = %config.team_b.name, "match created");
        Ok(Self {
            id,
            status: MatchStatus::Scheduled,
            settings: config.settings,
            team_a: config.team_a,
            team_b: config.team_b,
            umpire: config.umpire,
            toss: None,
            current: None,
            first_innings: None,
            second_innings: None,
            performances,
            result: None,
            cancel_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn umpire(&self) -> &AccountId {
        &self.umpire
    }

    pub fn toss(&self) -> Option<&Toss> {
        self.toss.as_ref()
    }

    /// The innings most recently opened. `None` until the toss.
    pub fn current(&self) -> Option<InningsSelector> {
        self.current
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    pub fn performances(&self) -> &PerformanceBook {
        &self.performances
    }

    /// Bumped by every successful mutation; the store compares it on save.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn team(&self, side: TeamSide) -> &TeamRoster {
        match side {
            TeamSide::A => &self.team_a,
            TeamSide::B => &self.team_b,
        }
    }

    pub fn innings(&self, selector: InningsSelector) -> Option<&Innings> {
        match selector {
            InningsSelector::First => self.first_innings.as_ref(),
            InningsSelector::Second => self.second_innings.as_ref(),
        }
    }

    pub fn current_innings(&self) -> Option<&Innings> {
        self.current.and_then(|selector| self.innings(selector))
    }

    /// Replace the settings. Only allowed before the toss is conducted.
    pub fn amend_settings(&mut self, settings: MatchSettings) -> Result<(), ScoringError> {
        if !matches!(self.status, MatchStatus::Scheduled | MatchStatus::Toss) {
            return Err(SettingsError::Frozen.into());
        }
        MatchConfig {
            settings,
            team_a: self.team_a.clone(),
            team_b: self.team_b.clone(),
            umpire: self.umpire.clone(),
        }
        .validate()?;
        self.settings = settings;
        self.touch();
        Ok(())
    }

    pub fn open_toss(&mut self) -> Result<(), ScoringError> {
        if self.status != MatchStatus::Scheduled {
            return Err(ScoringError::validation(format!(
                "toss cannot be opened while {}",
                self.status
            )));
        }
        self.status = MatchStatus::Toss;
        self.touch();
        Ok(())
    }

    /// Record the toss and create both innings. Returns the side batting first.
    pub fn conduct_toss(
        &mut self,
        winner: TeamSide,
        decision: TossDecision,
    ) -> Result<TeamSide, ScoringError> {
        match self.status {
            MatchStatus::Toss => {}
            MatchStatus::Scheduled => return Err(ScoringError::validation("toss not open")),
            _ => return Err(ScoringError::validation("toss already conducted")),
        }

        let toss = Toss { winner, decision };
        let batting_first = toss.batting_first();
        self.first_innings = Some(Innings::new(batting_first, self.settings));
        self.second_innings = Some(Innings::new(batting_first.opponent(), self.settings));
        self.toss = Some(toss);
        self.current = Some(InningsSelector::First);
        self.status = MatchStatus::InProgress;
        self.touch();

        info!(
            match_id = %self.id,
            winner = %self.team(winner).name,
            ?decision,
            batting = %self.team(batting_first).name,
            "toss conducted"
        );
        Ok(batting_first)
    }

    /// Put a batting pair in. Returns `true` when this started the innings.
    pub fn set_batsmen(
        &mut self,
        striker: PlayerRef,
        non_striker: Option<PlayerRef>,
    ) -> Result<bool, ScoringError> {
        let selector = self.scoring_selector()?;
        let batting = self.selected(selector)?.batting_team();
        self.require_member(batting, &striker)?;
        if let Some(non_striker) = &non_striker {
            self.require_member(batting, non_striker)?;
        }
        let started = self.selected_mut(selector)?.set_batsmen(striker, non_striker)?;
        self.touch();
        Ok(started)
    }

    pub fn set_new_batter(&mut self, player: PlayerRef) -> Result<(), ScoringError> {
        let selector = self.scoring_selector()?;
        let batting = self.selected(selector)?.batting_team();
        self.require_member(batting, &player)?;
        self.selected_mut(selector)?.set_new_batter(player)?;
        self.touch();
        Ok(())
    }

    pub fn set_bowler(&mut self, bowler: PlayerRef) -> Result<(), ScoringError> {
        let selector = self.scoring_selector()?;
        let bowling = self.selected(selector)?.bowling_team();
        self.require_member(bowling, &bowler)?;
        self.selected_mut(selector)?.set_bowler(bowler)?;
        self.touch();
        Ok(())
    }

    /// Score one delivery on the current innings and apply any innings or
    /// match transition it causes.
    pub fn apply_ball(&mut self, delivery: Delivery) -> Result<BallRecorded, ScoringError> {
        let selector = self.scoring_selector()?;
        let bowling = self.selected(selector)?.bowling_team();
        if let Some(fielder) = delivery.wicket.as_ref().and_then(|w| w.fielder.as_ref()) {
            self.require_member(bowling, fielder)?;
        }

        let applied = self.selected_mut(selector)?.apply_ball(delivery)?;
        self.performances.apply(&applied.ball, applied.maiden_completed);
        if applied.innings_completed {
            self.complete_innings(selector);
        }
        self.touch();

        Ok(BallRecorded {
            ball: applied.ball,
            innings: selector,
            fall_of_wicket: applied.fall_of_wicket,
            over_completed: applied.over_completed,
            maiden_completed: applied.maiden_completed,
            innings_completed: applied.innings_completed,
            match_completed: self.status == MatchStatus::Completed,
            snapshot: self.snapshot(),
        })
    }

    /// Move from the innings break into the second innings.
    pub fn start_second_innings(&mut self) -> Result<(), ScoringError> {
        if self.status != MatchStatus::InningsBreak {
            return Err(ScoringError::validation(
                "second innings can only start after the first innings",
            ));
        }
        self.current = Some(InningsSelector::Second);
        self.status = MatchStatus::InProgress;
        self.touch();
        info!(match_id = %self.id, "second innings under way");
        Ok(())
    }

    /// Reverse the latest delivery of the current innings. During the innings
    /// break this reopens the first innings.
    pub fn undo_last_ball(&mut self) -> Result<BallUndone, ScoringError> {
        let selector = self.undo_selector()?;
        let undone = self.selected_mut(selector)?.undo_last_ball()?;
        self.performances.reverse(&undone.ball, undone.maiden_reversed);
        if self.status == MatchStatus::InningsBreak {
            self.reopen_first_innings();
        }
        self.touch();
        Ok(undone)
    }

    /// Truncate the current innings to `len` balls and replay it, rebuilding
    /// player performances from both ledgers.
    pub fn rewind_innings_to(&mut self, len: usize) -> Result<Vec<Ball>, ScoringError> {
        let selector = self.undo_selector()?;
        let removed = self.selected_mut(selector)?.rewind_to(len)?;
        let still_complete = self.selected(selector)?.is_completed();
        if self.status == MatchStatus::InningsBreak && !still_complete {
            self.reopen_first_innings();
        }
        self.performances = PerformanceBook::rebuild(
            &self.team_a,
            &self.team_b,
            self.first_innings.iter().chain(self.second_innings.iter()),
        );
        self.touch();
        Ok(removed)
    }

    /// Force-end the match with no winner.
    pub fn abandon(&mut self, reason: impl Into<String>) -> Result<(), ScoringError> {
        self.ensure_open()?;
        let reason = reason.into();
        warn!(match_id = %self.id, %reason, "match abandoned");
        self.result = Some(MatchResult::abandoned(reason));
        self.status = MatchStatus::Abandoned;
        self.touch();
        Ok(())
    }

    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), ScoringError> {
        self.ensure_open()?;
        let reason = reason.into();
        warn!(match_id = %self.id, %reason, "match cancelled");
        self.cancel_reason = Some(reason);
        self.status = MatchStatus::Cancelled;
        self.touch();
        Ok(())
    }

    /// Live view of the current innings.
    pub fn snapshot(&self) -> ScoreSnapshot {
        let innings = self.current_innings();
        let snapshot = ScoreSnapshot {
            match_id: self.id,
            status: self.status,
            innings: self.current,
            innings_status: innings.map(Innings::status),
            batting_team: innings.map(|i| self.team(i.batting_team()).name.clone()),
            runs: innings.map_or(0, |i| i.totals().runs),
            wickets: innings.map_or(0, |i| i.totals().wickets),
            overs: innings.map_or(0, |i| i.totals().overs),
            balls: innings.map_or(0, |i| i.cursor().ball),
            run_rate: innings.map_or(0.0, Innings::run_rate),
            target: None,
            runs_needed: None,
            balls_remaining: None,
            required_run_rate: None,
            striker: innings.and_then(|i| i.crease().striker.clone()),
            non_striker: innings.and_then(|i| i.crease().non_striker.clone()),
            bowler: innings.and_then(|i| i.crease().bowler.clone()),
            free_hit: innings.is_some_and(Innings::free_hit_pending),
            version: self.version,
        };
        match innings.and_then(|i| i.target().map(|t| (t, i.balls_remaining()))) {
            Some((target, remaining)) => snapshot.with_chase(target, remaining),
            None => snapshot,
        }
    }

    pub fn scorecard(&self, selector: InningsSelector) -> Option<Scorecard> {
        self.innings(selector)
            .map(|innings| ProjectionBuilder::scorecard(innings.ledger().as_slice()))
    }

    pub fn check_invariants(&self) -> Result<(), ScoringError> {
        for innings in self.first_innings.iter().chain(self.second_innings.iter()) {
            innings.check_invariants()?;
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    fn require_member(&self, side: TeamSide, player: &PlayerRef) -> Result<(), ScoringError> {
        let roster = self.team(side);
        if roster.contains(player) {
            Ok(())
        } else {
            Err(ScoringError::not_found(format!(
                "{player} is not in {}",
                roster.name
            )))
        }
    }

    fn selected(&self, selector: InningsSelector) -> Result<&Innings, ScoringError> {
        self.innings(selector)
            .ok_or_else(|| ScoringError::validation("toss not conducted"))
    }

    fn selected_mut(&mut self, selector: InningsSelector) -> Result<&mut Innings, ScoringError> {
        match selector {
            InningsSelector::First => self.first_innings.as_mut(),
            InningsSelector::Second => self.second_innings.as_mut(),
        }
        .ok_or_else(|| ScoringError::validation("toss not conducted"))
    }

    fn closed(&self) -> ScoringError {
        match self.status {
            MatchStatus::Scheduled | MatchStatus::Toss => {
                ScoringError::validation("toss not conducted")
            }
            MatchStatus::InningsBreak => {
                ScoringError::validation("innings break: second innings not started")
            }
            status => ScoringError::validation(format!("match is {status}")),
        }
    }

    fn scoring_selector(&self) -> Result<InningsSelector, ScoringError> {
        match (self.status, self.current) {
            (MatchStatus::InProgress, Some(selector)) => Ok(selector),
            _ => Err(self.closed()),
        }
    }

    fn undo_selector(&self) -> Result<InningsSelector, ScoringError> {
        match (self.status, self.current) {
            (MatchStatus::InProgress | MatchStatus::InningsBreak, Some(selector)) => Ok(selector),
            _ => Err(self.closed()),
        }
    }

    fn ensure_open(&self) -> Result<(), ScoringError> {
        if self.status.is_terminal() {
            return Err(ScoringError::validation(format!(
                "match already {}",
                self.status
            )));
        }
        Ok(())
    }

    fn complete_innings(&mut self, selector: InningsSelector) {
        match selector {
            InningsSelector::First => {
                let runs = self.first_innings.as_ref().map_or(0, |i| i.totals().runs);
                let target = runs + 1;
                if let Some(second) = self.second_innings.as_mut() {
                    second.set_target(Some(target));
                }
                self.status = MatchStatus::InningsBreak;
                info!(match_id = %self.id, target, "innings break");
            }
            InningsSelector::Second => {
                if let (Some(first), Some(second)) = (&self.first_innings, &self.second_innings) {
                    let result =
                        MatchResult::decide(first, second, |side| self.team(side).name.as_str());
                    info!(match_id = %self.id, summary = %result.summary, "match completed");
                    self.result = Some(result);
                }
                self.status = MatchStatus::Completed;
            }
        }
    }

    fn reopen_first_innings(&mut self) {
        if let Some(second) = self.second_innings.as_mut() {
            second.set_target(None);
        }
        self.status = MatchStatus::InProgress;
        info!(match_id = %self.id, "first innings reopened");
    }
}

#[cfg(test)]
mod tests {
    use crease_ledger::{BallOutcome, DismissalType, WicketDetail};

    use super::*;
    use crate::result::{Margin, ResultType};

    fn p(name: &str) -> PlayerRef {
        PlayerRef::guest(name)
    }

    fn config(overs: u32, players: u32) -> MatchConfig {
        let roster = |name: &str, prefix: &str| {
            TeamRoster::new(
                name,
                (1..=players).map(|n| p(&format!("{prefix}{n}"))).collect(),
            )
        };
        MatchConfig {
            settings: MatchSettings {
                overs,
                players_per_team: players,
                ..Default::default()
            },
            team_a: roster("Rovers", "a"),
            team_b: roster("Strikers", "b"),
            umpire: AccountId::new("ump-1"),
        }
    }

    fn tossed(overs: u32, players: u32) -> Match {
        let mut game = Match::new(config(overs, players)).unwrap();
        game.open_toss().unwrap();
        game.conduct_toss(TeamSide::A, TossDecision::Bat).unwrap();
        game
    }

    /// Fill empty crease slots from the roster, then score the delivery.
    fn bowl(game: &mut Match, delivery: Delivery) -> BallRecorded {
        let innings = game.current_innings().unwrap();
        let batting = game.team(innings.batting_team()).players.clone();
        let bowling = game.team(innings.bowling_team()).players.clone();
        let started = innings.status() != crate::InningsStatus::NotStarted;
        let crease = innings.crease().clone();
        let over = innings.cursor().over as usize;
        let fresh: Vec<PlayerRef> = batting
            .iter()
            .filter(|player| !innings.is_out(player) && !crease.is_batting(player))
            .cloned()
            .collect();

        if !started {
            game.set_batsmen(batting[0].clone(), Some(batting[1].clone()))
                .unwrap();
        } else if crease.striker.is_none() || crease.non_striker.is_none() {
            game.set_new_batter(fresh[0].clone()).unwrap();
        }
        if crease.bowler.is_none() {
            game.set_bowler(bowling[over % bowling.len()].clone()).unwrap();
        }
        game.apply_ball(delivery).unwrap()
    }

    fn bowl_all(game: &mut Match, outcomes: &[BallOutcome]) -> Vec<BallRecorded> {
        outcomes
            .iter()
            .map(|&outcome| bowl(game, Delivery::new(outcome)))
            .collect()
    }

    #[test]
    fn lifecycle_to_first_innings() {
        let mut game = Match::new(config(2, 3)).unwrap();
        assert_eq!(game.status(), MatchStatus::Scheduled);
        assert_eq!(game.version(), 0);

        assert_eq!(
            game.conduct_toss(TeamSide::B, TossDecision::Bowl).unwrap_err(),
            ScoringError::validation("toss not open")
        );
        game.open_toss().unwrap();
        let batting = game.conduct_toss(TeamSide::B, TossDecision::Bowl).unwrap();

        assert_eq!(batting, TeamSide::A);
        assert_eq!(game.status(), MatchStatus::InProgress);
        assert_eq!(game.current(), Some(InningsSelector::First));
        let first = game.innings(InningsSelector::First).unwrap();
        assert_eq!(first.batting_team(), TeamSide::A);
        assert_eq!(first.status(), crate::InningsStatus::NotStarted);
        assert_eq!(
            game.innings(InningsSelector::Second).unwrap().batting_team(),
            TeamSide::B
        );
        assert_eq!(game.version(), 2);
    }

    #[test]
    fn toss_twice_is_rejected() {
        let mut game = tossed(2, 3);
        let error = game
            .conduct_toss(TeamSide::B, TossDecision::Bat)
            .unwrap_err();
        assert_eq!(error, ScoringError::validation("toss already conducted"));
    }

    #[test]
    fn scoring_before_toss_is_rejected() {
        let mut game = Match::new(config(2, 3)).unwrap();
        let error = game.apply_ball(Delivery::new(BallOutcome::One)).unwrap_err();
        assert!(error.is_validation());
        let error = game.set_batsmen(p("a1"), Some(p("a2"))).unwrap_err();
        assert!(error.is_validation());
        assert_eq!(game.version(), 0);
    }

    #[test]
    fn settings_freeze_after_toss() {
        let mut game = Match::new(config(2, 3)).unwrap();
        let mut settings = *game.settings();
        settings.overs = 4;
        game.amend_settings(settings).unwrap();
        assert_eq!(game.settings().overs, 4);

        settings.players_per_team = 5;
        assert!(matches!(
            game.amend_settings(settings),
            Err(ScoringError::Settings(SettingsError::ShortRoster { .. }))
        ));

        game.open_toss().unwrap();
        game.conduct_toss(TeamSide::A, TossDecision::Bat).unwrap();
        assert_eq!(
            game.amend_settings(*game.settings()).unwrap_err(),
            ScoringError::Settings(SettingsError::Frozen)
        );
    }

    #[test]
    fn players_must_belong_to_the_right_side() {
        let mut game = tossed(2, 3);
        let error = game.set_batsmen(p("b1"), Some(p("a2"))).unwrap_err();
        assert!(matches!(error, ScoringError::NotFound(_)));

        game.set_batsmen(p("a1"), Some(p("a2"))).unwrap();
        assert!(matches!(
            game.set_bowler(p("a3")),
            Err(ScoringError::NotFound(_))
        ));
        game.set_bowler(p("b1")).unwrap();

        let catch_by_batter = Delivery::new(BallOutcome::Wicket).with_wicket(WicketDetail {
            dismissal: Some(DismissalType::Caught),
            dismissed: None,
            fielder: Some(p("a3")),
        });
        assert!(matches!(
            game.apply_ball(catch_by_batter),
            Err(ScoringError::NotFound(_))
        ));
        assert!(game.current_innings().unwrap().ledger().is_empty());
    }

    #[test]
    fn first_innings_completion_sets_target() {
        let mut game = tossed(1, 3);
        let records = bowl_all(
            &mut game,
            &[
                BallOutcome::Four,
                BallOutcome::Dot,
                BallOutcome::One,
                BallOutcome::Dot,
                BallOutcome::Two,
                BallOutcome::Dot,
            ],
        );
        let last = records.last().unwrap();
        assert!(last.innings_completed);
        assert!(!last.match_completed);
        assert_eq!(game.status(), MatchStatus::InningsBreak);
        assert_eq!(
            game.innings(InningsSelector::Second).unwrap().target(),
            Some(8)
        );

        let error = game.apply_ball(Delivery::new(BallOutcome::One)).unwrap_err();
        assert_eq!(
            error,
            ScoringError::validation("innings break: second innings not started")
        );

        game.start_second_innings().unwrap();
        assert_eq!(game.current(), Some(InningsSelector::Second));
        let snapshot = game.snapshot();
        assert_eq!(snapshot.target, Some(8));
        assert_eq!(snapshot.runs_needed, Some(8));
        assert_eq!(snapshot.balls_remaining, Some(6));
        assert_eq!(snapshot.batting_team.as_deref(), Some("Strikers"));
    }

    #[test]
    fn chase_completes_mid_over() {
        use BallOutcome::*;
        let mut game = tossed(6, 6);

        // 50/3 from six overs.
        let mut first = vec![Wicket, Wicket, Wicket];
        first.extend([Six; 8]);
        first.push(Two);
        first.extend([Dot; 24]);
        bowl_all(&mut game, &first);
        let innings = game.innings(InningsSelector::First).unwrap();
        assert_eq!((innings.totals().runs, innings.totals().wickets), (50, 3));
        assert_eq!(game.status(), MatchStatus::InningsBreak);

        game.start_second_innings().unwrap();
        // Four overs: two wickets and 42 runs.
        let mut second = vec![Wicket, Wicket];
        second.extend([Six; 7]);
        second.extend([Dot; 15]);
        bowl_all(&mut game, &second);
        assert_eq!(game.current_innings().unwrap().totals().overs, 4);

        let records = bowl_all(&mut game, &[Six, Dot, Dot, Three]);
        let last = records.last().unwrap();
        assert_eq!(last.ball.position(), (5, 4));
        assert!(last.innings_completed);
        assert!(last.match_completed);
        assert_eq!(last.snapshot.runs_needed, Some(0));

        assert_eq!(game.status(), MatchStatus::Completed);
        let result = game.result().unwrap();
        assert_eq!(result.result_type, ResultType::Win);
        assert_eq!(result.winner, Some(TeamSide::B));
        assert_eq!(result.margin, Some(Margin::Wickets(3)));
        assert_eq!(result.summary, "Strikers won by 3 wickets");
        game.check_invariants().unwrap();

        let error = game.apply_ball(Delivery::new(Dot)).unwrap_err();
        assert_eq!(error, ScoringError::validation("match is COMPLETED"));
        assert!(game.undo_last_ball().is_err());
    }

    #[test]
    fn level_scores_tie() {
        use BallOutcome::*;
        let mut game = tossed(1, 2);
        bowl_all(&mut game, &[Four, Dot, Dot, Dot, Dot, Dot]);
        game.start_second_innings().unwrap();
        bowl_all(&mut game, &[One, Three, Dot, Dot, Dot, Dot]);

        let result = game.result().unwrap();
        assert_eq!(result.result_type, ResultType::Tie);
        assert_eq!(result.winner, None);
        assert_eq!(result.summary, "Match tied");
    }

    #[test]
    fn undo_in_innings_break_reopens_first_innings() {
        let mut game = tossed(1, 3);
        bowl_all(&mut game, &[BallOutcome::One; 6]);
        assert_eq!(game.status(), MatchStatus::InningsBreak);

        let undone = game.undo_last_ball().unwrap();
        assert!(undone.innings_reopened);
        assert_eq!(game.status(), MatchStatus::InProgress);
        assert_eq!(game.current(), Some(InningsSelector::First));
        assert_eq!(game.innings(InningsSelector::Second).unwrap().target(), None);

        let bowler = game.performances().get(&undone.ball.bowler).unwrap();
        assert_eq!(bowler.bowling.legal_balls, 5);
        assert_eq!(bowler.bowling.runs_conceded, 5);
    }

    #[test]
    fn rewind_rebuilds_performances() {
        use BallOutcome::*;
        let mut game = tossed(2, 3);
        bowl_all(&mut game, &[Four, Six, Wicket, One]);
        let removed = game.rewind_innings_to(2).unwrap();
        assert_eq!(removed.len(), 2);

        let a1 = game.performances().get(&p("a1")).unwrap();
        assert_eq!(a1.batting.runs, 10);
        assert!(!a1.batting.is_out);
        assert_eq!(game.snapshot().runs, 10);
        game.check_invariants().unwrap();
    }

    #[test]
    fn abandon_and_cancel_are_terminal() {
        let mut game = tossed(2, 3);
        game.abandon("rain").unwrap();
        assert_eq!(game.status(), MatchStatus::Abandoned);
        let result = game.result().unwrap();
        assert_eq!(result.result_type, ResultType::Abandoned);
        assert_eq!(result.reason.as_deref(), Some("rain"));
        assert!(game.cancel("again").is_err());

        let mut other = Match::new(config(2, 3)).unwrap();
        other.cancel("no ground").unwrap();
        assert_eq!(other.status(), MatchStatus::Cancelled);
        assert!(other.result().is_none());
        assert_eq!(other.cancel_reason(), Some("no ground"));
    }

    #[test]
    fn every_mutation_bumps_version() {
        let mut game = tossed(2, 3);
        let before = game.version();
        bowl(&mut game, Delivery::new(BallOutcome::Dot));
        // batsmen, bowler and the ball itself.
        assert_eq!(game.version(), before + 3);
        assert_eq!(game.snapshot().version, game.version());
    }

    #[test]
    fn serde_round_trip_preserves_state() {
        let mut game = tossed(2, 3);
        bowl_all(&mut game, &[BallOutcome::Four, BallOutcome::Wide]);
        let json = serde_json::to_string(&game).unwrap();
        let restored: Match = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, game);
    }
}
