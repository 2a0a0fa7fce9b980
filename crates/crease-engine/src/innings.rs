//! One side's innings: crease, totals, extras and the ball ledger.
//!
//! Every delivery goes through [`Innings::apply_ball`], which prepares a
//! [`Ball`](crease_ledger::Ball) without touching state and then folds it
//! into the counters. [`Innings::check_invariants`] recomputes the totals
//! from the ledger and runs the structural validator over it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crease_ledger::{
    Ball, BallLedger, BallOutcome, DismissalType, Extras, LedgerValidator, ProjectionBuilder,
    WicketDetail,
};
use crease_types::{MatchSettings, PlayerRef, TeamSide, BALLS_PER_OVER};

use crate::error::ScoringError;
use crate::scoring::score_delivery;
use crate::snapshot::run_rate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InningsStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Running totals. `balls` counts every legal delivery in the innings;
/// `overs` counts completed overs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub runs: u32,
    pub wickets: u32,
    pub overs: u32,
    pub balls: u32,
}

/// Position of the next delivery: 1-based over, legal balls bowled in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverCursor {
    pub over: u32,
    pub ball: u32,
}

impl Default for OverCursor {
    fn default() -> Self {
        Self { over: 1, ball: 0 }
    }
}

/// Who is batting and bowling right now. Every slot is empty until set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crease {
    pub striker: Option<PlayerRef>,
    pub non_striker: Option<PlayerRef>,
    pub bowler: Option<PlayerRef>,
}

impl Crease {
    pub(crate) fn from_ball(ball: &Ball) -> Self {
        Self {
            striker: Some(ball.striker.clone()),
            non_striker: ball.non_striker.clone(),
            bowler: Some(ball.bowler.clone()),
        }
    }

    pub fn swap_ends(&mut self) {
        std::mem::swap(&mut self.striker, &mut self.non_striker);
    }

    pub fn is_batting(&self, player: &PlayerRef) -> bool {
        self.striker.as_ref() == Some(player) || self.non_striker.as_ref() == Some(player)
    }

    fn vacate(&mut self, player: &PlayerRef) {
        if self.striker.as_ref() == Some(player) {
            self.striker = None;
        } else if self.non_striker.as_ref() == Some(player) {
            self.non_striker = None;
        }
    }

    /// Put a batter back in the first empty slot, striker's end first.
    pub(crate) fn restore(&mut self, player: PlayerRef) {
        if self.is_batting(&player) {
            return;
        }
        if self.striker.is_none() {
            self.striker = Some(player);
        } else if self.non_striker.is_none() {
            self.non_striker = Some(player);
        }
    }
}

/// Score and position at a dismissal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallOfWicket {
    pub wicket: u32,
    pub player: PlayerRef,
    pub runs: u32,
    pub overs: u32,
    pub balls: u32,
    pub dismissal: Option<DismissalType>,
}

impl FallOfWicket {
    /// e.g. `23-2 (3.4)`.
    pub fn notation(&self) -> String {
        format!("{}-{} ({}.{})", self.runs, self.wicket, self.overs, self.balls)
    }
}

/// A scoring action for one delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub outcome: BallOutcome,
    #[serde(default)]
    pub runs: u32,
    #[serde(default)]
    pub wicket: Option<WicketDetail>,
    #[serde(default)]
    pub commentary: Option<String>,
}

impl Delivery {
    pub fn new(outcome: BallOutcome) -> Self {
        Self {
            outcome,
            runs: 0,
            wicket: None,
            commentary: None,
        }
    }

    pub fn with_runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_wicket(mut self, wicket: WicketDetail) -> Self {
        self.wicket = Some(wicket);
        self
    }

    /// Attach a dismissal of the given type; the dismissed batter defaults to
    /// the striker.
    pub fn dismissing(self, dismissal: DismissalType) -> Self {
        self.with_wicket(WicketDetail {
            dismissal: Some(dismissal),
            ..Default::default()
        })
    }

    pub fn with_commentary(mut self, text: impl Into<String>) -> Self {
        self.commentary = Some(text.into());
        self
    }
}

/// What one `apply_ball` changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BallApplied {
    pub ball: Ball,
    pub fall_of_wicket: Option<FallOfWicket>,
    pub over_completed: bool,
    pub maiden_completed: bool,
    pub innings_completed: bool,
}

/// One team's batting effort.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Innings {
    pub(crate) batting: TeamSide,
    pub(crate) bowling: TeamSide,
    pub(crate) settings: MatchSettings,
    pub(crate) status: InningsStatus,
    pub(crate) totals: Totals,
    pub(crate) extras: Extras,
    pub(crate) cursor: OverCursor,
    pub(crate) crease: Crease,
    pub(crate) ledger: BallLedger,
    pub(crate) fall_of_wickets: Vec<FallOfWicket>,
    pub(crate) target: Option<u32>,
    pub(crate) run_rate: f64,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) ended_at: Option<DateTime<Utc>>,
}

impl Innings {
    pub fn new(batting: TeamSide, settings: MatchSettings) -> Self {
        Self {
            batting,
            bowling: batting.opponent(),
            settings,
            status: InningsStatus::NotStarted,
            totals: Totals::default(),
            extras: Extras::default(),
            cursor: OverCursor::default(),
            crease: Crease::default(),
            ledger: BallLedger::new(),
            fall_of_wickets: Vec::new(),
            target: None,
            run_rate: 0.0,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn batting_team(&self) -> TeamSide {
        self.batting
    }

    pub fn bowling_team(&self) -> TeamSide {
        self.bowling
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn status(&self) -> InningsStatus {
        self.status
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn extras(&self) -> &Extras {
        &self.extras
    }

    pub fn cursor(&self) -> OverCursor {
        self.cursor
    }

    pub fn crease(&self) -> &Crease {
        &self.crease
    }

    pub fn ledger(&self) -> &BallLedger {
        &self.ledger
    }

    pub fn fall_of_wickets(&self) -> &[FallOfWicket] {
        &self.fall_of_wickets
    }

    pub fn target(&self) -> Option<u32> {
        self.target
    }

    pub fn run_rate(&self) -> f64 {
        self.run_rate
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn is_completed(&self) -> bool {
        self.status == InningsStatus::Completed
    }

    /// Overs bowled in `overs.balls` notation.
    pub fn overs_notation(&self) -> String {
        format!("{}.{}", self.totals.overs, self.cursor.ball)
    }

    /// Legal deliveries left before the overs run out.
    pub fn balls_remaining(&self) -> u32 {
        self.settings.total_balls().saturating_sub(self.totals.balls)
    }

    pub fn is_out(&self, player: &PlayerRef) -> bool {
        self.fall_of_wickets.iter().any(|f| &f.player == player)
    }

    /// Whether the next delivery is a free hit. A no-ball earns one; it
    /// carries over any wide or no-ball bowled on the free hit itself.
    pub fn free_hit_pending(&self) -> bool {
        if !self.settings.no_ball_free_hit {
            return false;
        }
        match self.ledger.last() {
            Some(last) if last.outcome == BallOutcome::NoBall => true,
            Some(last) => last.is_free_hit && !last.is_legal_delivery,
            None => false,
        }
    }

    pub(crate) fn set_target(&mut self, target: Option<u32>) {
        self.target = target;
    }

    /// Put a batting pair in. The first successful call starts the innings.
    ///
    /// Returns `true` when this call moved the innings to in-progress.
    pub fn set_batsmen(
        &mut self,
        striker: PlayerRef,
        non_striker: Option<PlayerRef>,
    ) -> Result<bool, ScoringError> {
        if self.is_completed() {
            return Err(ScoringError::validation("innings already completed"));
        }
        if non_striker.as_ref() == Some(&striker) {
            return Err(ScoringError::validation(
                "striker and non-striker must be different players",
            ));
        }
        for player in std::iter::once(&striker).chain(non_striker.as_ref()) {
            if self.is_out(player) {
                return Err(ScoringError::validation(format!("{player} is already out")));
            }
        }

        self.crease.striker = Some(striker);
        self.crease.non_striker = non_striker;

        if self.status == InningsStatus::NotStarted {
            self.status = InningsStatus::InProgress;
            self.started_at = Some(Utc::now());
            self.cursor = OverCursor::default();
            info!(batting = %self.batting, "innings started");
            return Ok(true);
        }
        Ok(false)
    }

    /// Fill the empty crease slot after a dismissal.
    pub fn set_new_batter(&mut self, player: PlayerRef) -> Result<(), ScoringError> {
        if self.status != InningsStatus::InProgress {
            return Err(ScoringError::validation("innings not in progress"));
        }
        if self.is_out(&player) {
            return Err(ScoringError::validation(format!("{player} is already out")));
        }
        if self.crease.is_batting(&player) {
            return Err(ScoringError::validation(format!("{player} is already batting")));
        }
        if self.crease.striker.is_none() {
            self.crease.striker = Some(player);
        } else if self.crease.non_striker.is_none() {
            self.crease.non_striker = Some(player);
        } else {
            return Err(ScoringError::validation("both crease slots are occupied"));
        }
        Ok(())
    }

    pub fn set_bowler(&mut self, bowler: PlayerRef) -> Result<(), ScoringError> {
        if self.is_completed() {
            return Err(ScoringError::validation("innings already completed"));
        }
        self.crease.bowler = Some(bowler);
        Ok(())
    }

    /// Record one delivery.
    ///
    /// The ball, totals, extras, fall of wickets, cursor, crease and status
    /// are updated together; on error nothing changes.
    pub fn apply_ball(&mut self, delivery: Delivery) -> Result<BallApplied, ScoringError> {
        let ball = self.prepare(delivery)?;
        self.commit(ball)
    }

    /// Build the ball for a delivery without touching state.
    fn prepare(&self, delivery: Delivery) -> Result<Ball, ScoringError> {
        match self.status {
            InningsStatus::Completed => {
                return Err(ScoringError::validation("innings already completed"))
            }
            InningsStatus::NotStarted => {
                return Err(ScoringError::validation("batsmen/bowler not set"))
            }
            InningsStatus::InProgress => {}
        }
        let (Some(striker), Some(bowler)) = (&self.crease.striker, &self.crease.bowler) else {
            return Err(ScoringError::validation("batsmen/bowler not set"));
        };

        let score = score_delivery(delivery.outcome, delivery.runs, &self.settings)?;
        let is_free_hit = self.free_hit_pending();
        let is_wicket = delivery.outcome == BallOutcome::Wicket || delivery.wicket.is_some();

        let wicket = if is_wicket {
            let mut detail = delivery.wicket.unwrap_or_default();
            let dismissed = detail.dismissed.get_or_insert_with(|| striker.clone());
            if !self.crease.is_batting(dismissed) {
                return Err(ScoringError::validation(format!(
                    "{dismissed} is not at the crease"
                )));
            }
            if is_free_hit && !detail.dismissal.is_some_and(|d| d.allowed_on_free_hit()) {
                return Err(ScoringError::validation(
                    "only a run out can dismiss a batter on a free hit",
                ));
            }
            Some(detail)
        } else {
            None
        };

        Ok(Ball {
            over: self.cursor.over,
            ball_in_over: self.cursor.ball + 1,
            bowler: bowler.clone(),
            striker: striker.clone(),
            non_striker: self.crease.non_striker.clone(),
            outcome: delivery.outcome,
            runs: score.runs,
            is_wicket,
            wicket,
            is_legal_delivery: score.is_legal,
            is_boundary: score.is_boundary,
            is_free_hit,
            commentary: delivery.commentary,
            timestamp: Utc::now(),
        })
    }

    /// Append a prepared ball and fold it into every derived counter.
    pub(crate) fn commit(&mut self, ball: Ball) -> Result<BallApplied, ScoringError> {
        let over = ball.over;
        self.ledger.append(ball.clone())?;

        self.totals.runs += ball.runs.total_runs;
        self.extras.record(&ball);

        let mut fall_of_wicket = None;
        if ball.is_wicket {
            self.totals.wickets += 1;
            let legal_after = self.totals.balls + u32::from(ball.is_legal_delivery);
            let player = ball.dismissed().cloned().unwrap_or_else(|| ball.striker.clone());
            let entry = FallOfWicket {
                wicket: self.totals.wickets,
                player: player.clone(),
                runs: self.totals.runs,
                overs: legal_after / BALLS_PER_OVER,
                balls: legal_after % BALLS_PER_OVER,
                dismissal: ball.wicket.as_ref().and_then(|w| w.dismissal),
            };
            info!(wicket = entry.wicket, player = %player, at = %entry.notation(), "wicket");
            self.crease.vacate(&player);
            self.fall_of_wickets.push(entry.clone());
            fall_of_wicket = Some(entry);
        }

        let mut over_completed = false;
        if ball.is_legal_delivery {
            self.totals.balls += 1;
            self.cursor.ball += 1;
            if self.cursor.ball == BALLS_PER_OVER {
                self.totals.overs += 1;
                self.cursor.over += 1;
                self.cursor.ball = 0;
                self.crease.swap_ends();
                self.crease.bowler = None;
                over_completed = true;
                debug!(over, runs = self.totals.runs, "over complete");
            }
            if ball.runs.batsman_runs % 2 == 1 {
                self.crease.swap_ends();
            }
        }

        let maiden_completed =
            over_completed && self.ledger.over(over).all(|b| b.bowler_runs() == 0);
        self.refresh_run_rate();
        let innings_completed = self.evaluate_completion();

        Ok(BallApplied {
            ball,
            fall_of_wicket,
            over_completed,
            maiden_completed,
            innings_completed,
        })
    }

    pub(crate) fn refresh_run_rate(&mut self) {
        self.run_rate = run_rate(self.totals.runs, self.totals.balls);
    }

    fn evaluate_completion(&mut self) -> bool {
        let reason = if self.totals.wickets >= self.settings.max_wickets() {
            "all out"
        } else if self.totals.overs >= self.settings.overs {
            "overs complete"
        } else if self.target.is_some_and(|target| self.totals.runs >= target) {
            "target reached"
        } else {
            return false;
        };

        self.status = InningsStatus::Completed;
        self.ended_at = Some(Utc::now());
        info!(
            batting = %self.batting,
            runs = self.totals.runs,
            wickets = self.totals.wickets,
            overs = %self.overs_notation(),
            reason,
            "innings completed"
        );
        true
    }

    /// Check the ledger/total invariants, then the ledger's own structure.
    pub fn check_invariants(&self) -> Result<(), ScoringError> {
        let summary = ProjectionBuilder::summary(self.ledger.as_slice());
        let checks = [
            ("runs", self.totals.runs, summary.runs),
            ("wickets", self.totals.wickets, self.fall_of_wickets.len() as u32),
            ("ledger wickets", self.totals.wickets, summary.wickets),
            ("balls", self.totals.balls, summary.legal_balls),
            ("overs", self.totals.overs, summary.completed_overs()),
            ("cursor ball", self.cursor.ball, summary.balls_in_over()),
            ("cursor over", self.cursor.over, summary.completed_overs() + 1),
            ("extras", self.extras.total(), summary.extras.total()),
        ];
        for (name, held, derived) in checks {
            if held != derived {
                return Err(ScoringError::validation(format!(
                    "invariant violated: {name} is {held} but the ledger gives {derived}"
                )));
            }
        }

        let report = LedgerValidator::validate(self.ledger.as_slice());
        match report.violations.first() {
            Some(violation) => Err(ScoringError::validation(format!(
                "ledger check failed at ball {}: {}",
                violation.index, violation.description
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> PlayerRef {
        PlayerRef::guest(name)
    }

    fn settings() -> MatchSettings {
        MatchSettings {
            overs: 2,
            players_per_team: 4,
            wide_runs: 1,
            no_ball_runs: 1,
            no_ball_free_hit: true,
        }
    }

    fn started() -> Innings {
        let mut innings = Innings::new(TeamSide::A, settings());
        innings.set_batsmen(p("a1"), Some(p("a2"))).unwrap();
        innings.set_bowler(p("b1")).unwrap();
        innings
    }

    fn apply(innings: &mut Innings, outcome: BallOutcome) -> BallApplied {
        innings.apply_ball(Delivery::new(outcome)).unwrap()
    }

    #[test]
    fn first_batsmen_assignment_starts_innings() {
        let mut innings = Innings::new(TeamSide::B, settings());
        assert_eq!(innings.status(), InningsStatus::NotStarted);
        assert_eq!(innings.bowling_team(), TeamSide::A);

        assert!(innings.set_batsmen(p("b1"), Some(p("b2"))).unwrap());
        assert_eq!(innings.status(), InningsStatus::InProgress);
        assert!(innings.started_at().is_some());
        assert_eq!(innings.cursor(), OverCursor { over: 1, ball: 0 });

        assert!(!innings.set_batsmen(p("b2"), Some(p("b1"))).unwrap());
    }

    #[test]
    fn apply_requires_batsmen_and_bowler() {
        let mut innings = Innings::new(TeamSide::A, settings());
        let error = innings.apply_ball(Delivery::new(BallOutcome::One)).unwrap_err();
        assert_eq!(error, ScoringError::validation("batsmen/bowler not set"));

        innings.set_batsmen(p("a1"), Some(p("a2"))).unwrap();
        let error = innings.apply_ball(Delivery::new(BallOutcome::One)).unwrap_err();
        assert_eq!(error, ScoringError::validation("batsmen/bowler not set"));
        assert!(innings.ledger().is_empty());
    }

    #[test]
    fn same_player_cannot_take_both_ends() {
        let mut innings = Innings::new(TeamSide::A, settings());
        assert!(innings.set_batsmen(p("a1"), Some(p("a1"))).is_err());
        assert_eq!(innings.status(), InningsStatus::NotStarted);
    }

    #[test]
    fn odd_runs_rotate_strike() {
        let mut innings = started();
        apply(&mut innings, BallOutcome::One);
        assert_eq!(innings.crease().striker, Some(p("a2")));
        apply(&mut innings, BallOutcome::Two);
        assert_eq!(innings.crease().striker, Some(p("a2")));
        apply(&mut innings, BallOutcome::Three);
        assert_eq!(innings.crease().striker, Some(p("a1")));
    }

    #[test]
    fn six_legal_balls_complete_an_over() {
        let mut innings = started();
        for _ in 0..5 {
            let applied = apply(&mut innings, BallOutcome::Dot);
            assert!(!applied.over_completed);
        }
        let applied = apply(&mut innings, BallOutcome::Dot);
        assert!(applied.over_completed);
        assert!(applied.maiden_completed);
        assert_eq!(applied.ball.position(), (1, 6));

        assert_eq!(innings.totals().overs, 1);
        assert_eq!(innings.totals().balls, 6);
        assert_eq!(innings.cursor(), OverCursor { over: 2, ball: 0 });
        assert_eq!(innings.crease().bowler, None);
        assert_eq!(innings.crease().striker, Some(p("a2")));
        assert_eq!(innings.crease().non_striker, Some(p("a1")));

        let error = innings.apply_ball(Delivery::new(BallOutcome::Dot)).unwrap_err();
        assert!(error.is_validation());
    }

    #[test]
    fn single_off_last_ball_keeps_strike() {
        let mut innings = started();
        for _ in 0..5 {
            apply(&mut innings, BallOutcome::Dot);
        }
        apply(&mut innings, BallOutcome::One);
        assert_eq!(innings.crease().striker, Some(p("a1")));
    }

    #[test]
    fn wide_with_extra_run_is_not_legal() {
        let mut innings = started();
        let applied = innings
            .apply_ball(Delivery::new(BallOutcome::Wide).with_runs(1))
            .unwrap();
        assert_eq!(applied.ball.runs.extra_runs, 2);
        assert!(!applied.ball.is_legal_delivery);
        assert_eq!(innings.cursor().ball, 0);
        assert_eq!(innings.totals().balls, 0);
        assert_eq!(innings.totals().runs, 2);
        assert_eq!(innings.extras().wides, 2);
        // Extras never rotate strike.
        assert_eq!(innings.crease().striker, Some(p("a1")));
    }

    #[test]
    fn no_ball_runs_go_to_batter_and_extras_bucket() {
        let mut innings = started();
        let applied = innings
            .apply_ball(Delivery::new(BallOutcome::NoBall).with_runs(4))
            .unwrap();
        assert_eq!(applied.ball.runs.batsman_runs, 4);
        assert_eq!(applied.ball.runs.total_runs, 5);
        assert_eq!(innings.extras().no_balls, 1);
        assert_eq!(innings.totals().balls, 0);
    }

    #[test]
    fn wicket_defaults_to_striker_and_vacates_slot() {
        let mut innings = started();
        apply(&mut innings, BallOutcome::Two);
        let applied = innings
            .apply_ball(Delivery::new(BallOutcome::Wicket).dismissing(DismissalType::Bowled))
            .unwrap();

        let fall = applied.fall_of_wicket.unwrap();
        assert_eq!(fall.player, p("a1"));
        assert_eq!(fall.wicket, 1);
        assert_eq!(fall.runs, 2);
        assert_eq!((fall.overs, fall.balls), (0, 2));
        assert_eq!(fall.notation(), "2-1 (0.2)");

        assert_eq!(innings.totals().wickets, 1);
        assert_eq!(innings.crease().striker, None);
        assert_eq!(innings.crease().non_striker, Some(p("a2")));

        let error = innings.apply_ball(Delivery::new(BallOutcome::Dot)).unwrap_err();
        assert_eq!(error, ScoringError::validation("batsmen/bowler not set"));

        assert!(innings.set_new_batter(p("a1")).is_err());
        innings.set_new_batter(p("a3")).unwrap();
        assert_eq!(innings.crease().striker, Some(p("a3")));
    }

    #[test]
    fn run_out_of_non_striker_on_a_bye() {
        let mut innings = started();
        let applied = innings
            .apply_ball(
                Delivery::new(BallOutcome::Bye)
                    .with_runs(1)
                    .with_wicket(WicketDetail {
                        dismissal: Some(DismissalType::RunOut),
                        dismissed: Some(p("a2")),
                        fielder: Some(p("b3")),
                    }),
            )
            .unwrap();
        assert!(applied.ball.is_wicket);
        assert_eq!(innings.totals().runs, 1);
        assert_eq!(innings.extras().byes, 1);
        assert_eq!(innings.fall_of_wickets()[0].player, p("a2"));
        assert_eq!(innings.crease().striker, Some(p("a1")));
        assert_eq!(innings.crease().non_striker, None);
    }

    #[test]
    fn dismissed_batter_must_be_at_crease() {
        let mut innings = started();
        let error = innings
            .apply_ball(Delivery::new(BallOutcome::Wicket).with_wicket(WicketDetail {
                dismissal: Some(DismissalType::RunOut),
                dismissed: Some(p("a4")),
                fielder: None,
            }))
            .unwrap_err();
        assert!(error.is_validation());
        assert!(innings.ledger().is_empty());
        assert_eq!(innings.totals().wickets, 0);
    }

    #[test]
    fn free_hit_follows_no_ball_and_carries_over_wides() {
        let mut innings = started();
        innings
            .apply_ball(Delivery::new(BallOutcome::NoBall))
            .unwrap();
        assert!(innings.free_hit_pending());

        let wide = apply(&mut innings, BallOutcome::Wide);
        assert!(wide.ball.is_free_hit);
        assert!(innings.free_hit_pending());

        let error = innings
            .apply_ball(Delivery::new(BallOutcome::Wicket).dismissing(DismissalType::Caught))
            .unwrap_err();
        assert_eq!(
            error,
            ScoringError::validation("only a run out can dismiss a batter on a free hit")
        );

        let run_out = innings
            .apply_ball(Delivery::new(BallOutcome::Wicket).dismissing(DismissalType::RunOut))
            .unwrap();
        assert!(run_out.ball.is_free_hit);
        assert!(!innings.free_hit_pending());
    }

    #[test]
    fn invariant_check_catches_misnumbered_ball() {
        let mut innings = started();
        apply(&mut innings, BallOutcome::One);
        apply(&mut innings, BallOutcome::Dot);
        innings.check_invariants().unwrap();

        let mut last = innings.ledger.pop_last().unwrap();
        last.ball_in_over = 5;
        innings.ledger.append(last).unwrap();

        let error = innings.check_invariants().unwrap_err();
        assert_eq!(
            error,
            ScoringError::validation("ledger check failed at ball 1: expected 1.2, found 1.5")
        );
    }

    #[test]
    fn free_hit_rejects_every_dismissal_but_run_out() {
        let mut innings = started();
        apply(&mut innings, BallOutcome::NoBall);
        let before = (*innings.totals(), innings.ledger().len());

        for dismissal in [
            DismissalType::Bowled,
            DismissalType::Lbw,
            DismissalType::Stumped,
            DismissalType::HitWicket,
            DismissalType::ObstructingField,
            DismissalType::HandledBall,
        ] {
            let error = innings
                .apply_ball(Delivery::new(BallOutcome::Wicket).dismissing(dismissal))
                .unwrap_err();
            assert!(error.is_validation(), "{dismissal} accepted on a free hit");
        }
        assert_eq!((*innings.totals(), innings.ledger().len()), before);
        assert!(innings.free_hit_pending());
    }

    #[test]
    fn free_hit_disabled_by_settings() {
        let mut innings = Innings::new(
            TeamSide::A,
            MatchSettings {
                no_ball_free_hit: false,
                ..settings()
            },
        );
        innings.set_batsmen(p("a1"), Some(p("a2"))).unwrap();
        innings.set_bowler(p("b1")).unwrap();
        apply(&mut innings, BallOutcome::NoBall);
        assert!(!innings.free_hit_pending());
    }

    #[test]
    fn all_out_completes_innings() {
        let mut innings = started();
        for next in ["a3", "a4"] {
            apply(&mut innings, BallOutcome::Wicket);
            innings.set_new_batter(p(next)).unwrap();
        }
        let applied = apply(&mut innings, BallOutcome::Wicket);
        assert!(applied.innings_completed);
        assert_eq!(innings.status(), InningsStatus::Completed);
        assert!(innings.ended_at().is_some());
        assert!(innings.set_bowler(p("b2")).is_err());
    }

    #[test]
    fn overs_exhausted_completes_innings() {
        let mut innings = started();
        for over in 0..2 {
            innings.set_bowler(p(if over == 0 { "b1" } else { "b2" })).unwrap();
            for _ in 0..6 {
                apply(&mut innings, BallOutcome::Dot);
            }
        }
        assert!(innings.is_completed());
        assert_eq!(innings.overs_notation(), "2.0");
        assert_eq!(innings.balls_remaining(), 0);
    }

    #[test]
    fn reaching_target_completes_innings() {
        let mut innings = started();
        innings.set_target(Some(6));
        apply(&mut innings, BallOutcome::Four);
        assert!(!innings.is_completed());
        let applied = innings
            .apply_ball(Delivery::new(BallOutcome::Wide).with_runs(1))
            .unwrap();
        assert!(applied.innings_completed);
    }

    #[test]
    fn run_rate_is_rounded() {
        let mut innings = started();
        assert_eq!(innings.run_rate(), 0.0);
        apply(&mut innings, BallOutcome::Four);
        apply(&mut innings, BallOutcome::Dot);
        apply(&mut innings, BallOutcome::One);
        // 5 runs from 3 balls: 5 / 0.5 = 10.0
        assert_eq!(innings.run_rate(), 10.0);
        apply(&mut innings, BallOutcome::Two);
        // 7 runs from 4 balls: 10.5
        assert_eq!(innings.run_rate(), 10.5);
        innings.check_invariants().unwrap();
    }
}
