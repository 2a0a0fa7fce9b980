//! Per-player batting and bowling figures derived from the ledger.

use serde::{Deserialize, Serialize};

use crease_ledger::{Ball, BallOutcome, DismissalType};
use crease_types::{PlayerRef, TeamRoster, TeamSide};

use crate::innings::Innings;
use crate::snapshot::round2;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattingTally {
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub is_out: bool,
    pub dismissal: Option<DismissalType>,
}

impl BattingTally {
    pub fn strike_rate(&self) -> f64 {
        if self.balls_faced == 0 {
            return 0.0;
        }
        round2(f64::from(self.runs) * 100.0 / f64::from(self.balls_faced))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlingTally {
    pub legal_balls: u32,
    pub runs_conceded: u32,
    pub wickets: u32,
    pub wides: u32,
    pub no_balls: u32,
    pub maidens: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldingTally {
    pub catches: u32,
    pub run_outs: u32,
    pub stumpings: u32,
}

/// One player's contribution to a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPerformance {
    pub player: PlayerRef,
    pub team: TeamSide,
    pub batting: BattingTally,
    pub bowling: BowlingTally,
    pub fielding: FieldingTally,
}

impl PlayerPerformance {
    fn new(player: PlayerRef, team: TeamSide) -> Self {
        Self {
            player,
            team,
            batting: BattingTally::default(),
            bowling: BowlingTally::default(),
            fielding: FieldingTally::default(),
        }
    }
}

/// Performance rows for every rostered player, team A first.
///
/// Updated with each ball and reversed exactly on undo.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformanceBook {
    rows: Vec<PlayerPerformance>,
}

impl PerformanceBook {
    pub fn new(team_a: &TeamRoster, team_b: &TeamRoster) -> Self {
        let rows = [(TeamSide::A, team_a), (TeamSide::B, team_b)]
            .into_iter()
            .flat_map(|(side, roster)| {
                roster
                    .players
                    .iter()
                    .map(move |p| PlayerPerformance::new(p.clone(), side))
            })
            .collect();
        Self { rows }
    }

    /// Recompute from scratch by folding every ball of the given innings.
    pub fn rebuild<'a>(
        team_a: &TeamRoster,
        team_b: &TeamRoster,
        innings: impl IntoIterator<Item = &'a Innings>,
    ) -> Self {
        let mut book = Self::new(team_a, team_b);
        for innings in innings {
            let balls = innings.ledger().as_slice();
            for (index, ball) in balls.iter().enumerate() {
                book.apply(ball, completes_maiden(balls, index));
            }
        }
        book
    }

    pub fn get(&self, player: &PlayerRef) -> Option<&PlayerPerformance> {
        self.rows.iter().find(|row| &row.player == player)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlayerPerformance> {
        self.rows.iter()
    }

    /// Rows for one side's players, batters and bowlers alike.
    pub fn team(&self, side: TeamSide) -> impl Iterator<Item = &PlayerPerformance> {
        self.rows.iter().filter(move |row| row.team == side)
    }

    pub fn apply(&mut self, ball: &Ball, maiden_completed: bool) {
        self.fold(ball, maiden_completed, true);
    }

    pub fn reverse(&mut self, ball: &Ball, maiden_reversed: bool) {
        self.fold(ball, maiden_reversed, false);
    }

    fn row_mut(&mut self, player: &PlayerRef) -> Option<&mut PlayerPerformance> {
        self.rows.iter_mut().find(|row| &row.player == player)
    }

    fn fold(&mut self, ball: &Ball, maiden: bool, add: bool) {
        let dismissal = ball.wicket.as_ref().and_then(|w| w.dismissal);

        if let Some(row) = self.row_mut(&ball.striker) {
            let batting = &mut row.batting;
            adjust(&mut batting.runs, ball.runs.batsman_runs, add);
            adjust(&mut batting.balls_faced, u32::from(ball.counts_as_faced()), add);
            adjust(&mut batting.fours, u32::from(ball.outcome == BallOutcome::Four), add);
            adjust(&mut batting.sixes, u32::from(ball.outcome == BallOutcome::Six), add);
        }

        if let Some(dismissed) = ball.dismissed() {
            if let Some(row) = self.row_mut(dismissed) {
                row.batting.is_out = add;
                row.batting.dismissal = if add { dismissal } else { None };
            }
        }

        if let Some(row) = self.row_mut(&ball.bowler) {
            let bowling = &mut row.bowling;
            let credited = ball.is_wicket && dismissal.map_or(true, |d| d.credited_to_bowler());
            adjust(&mut bowling.legal_balls, u32::from(ball.is_legal_delivery), add);
            adjust(&mut bowling.runs_conceded, ball.bowler_runs(), add);
            adjust(&mut bowling.wickets, u32::from(credited), add);
            adjust(&mut bowling.wides, u32::from(ball.outcome == BallOutcome::Wide), add);
            adjust(&mut bowling.no_balls, u32::from(ball.outcome == BallOutcome::NoBall), add);
            adjust(&mut bowling.maidens, u32::from(maiden), add);
        }

        let fielder = ball.wicket.as_ref().and_then(|w| w.fielder.as_ref());
        if let (Some(fielder), Some(dismissal)) = (fielder, dismissal) {
            if let Some(row) = self.row_mut(fielder) {
                let fielding = &mut row.fielding;
                match dismissal {
                    DismissalType::Caught => adjust(&mut fielding.catches, 1, add),
                    DismissalType::RunOut => adjust(&mut fielding.run_outs, 1, add),
                    DismissalType::Stumped => adjust(&mut fielding.stumpings, 1, add),
                    _ => {}
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a PerformanceBook {
    type Item = &'a PlayerPerformance;
    type IntoIter = std::slice::Iter<'a, PlayerPerformance>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn adjust(value: &mut u32, by: u32, add: bool) {
    if add {
        *value += by;
    } else {
        *value = value.saturating_sub(by);
    }
}

/// Whether `balls[index]` is the sixth legal ball of an over in which the
/// bowler conceded nothing.
fn completes_maiden(balls: &[Ball], index: usize) -> bool {
    let ball = &balls[index];
    if !ball.is_legal_delivery {
        return false;
    }
    let over: Vec<&Ball> = balls[..=index]
        .iter()
        .filter(|b| b.over == ball.over)
        .collect();
    let legal = over.iter().filter(|b| b.is_legal_delivery).count() as u32;
    legal == crease_types::BALLS_PER_OVER && over.iter().all(|b| b.bowler_runs() == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innings::Delivery;
    use crease_ledger::WicketDetail;
    use crease_types::MatchSettings;

    fn p(name: &str) -> PlayerRef {
        PlayerRef::guest(name)
    }

    fn rosters() -> (TeamRoster, TeamRoster) {
        (
            TeamRoster::new("Rovers", vec![p("a1"), p("a2"), p("a3")]),
            TeamRoster::new("Strikers", vec![p("b1"), p("b2"), p("b3")]),
        )
    }

    fn innings() -> Innings {
        let settings = MatchSettings {
            overs: 2,
            players_per_team: 3,
            ..Default::default()
        };
        let mut innings = Innings::new(TeamSide::A, settings);
        innings.set_batsmen(p("a1"), Some(p("a2"))).unwrap();
        innings.set_bowler(p("b1")).unwrap();
        innings
    }

    #[test]
    fn rows_cover_both_rosters() {
        let (a, b) = rosters();
        let book = PerformanceBook::new(&a, &b);
        assert_eq!(book.iter().count(), 6);
        assert_eq!(book.team(TeamSide::B).count(), 3);
        assert_eq!(book.get(&p("b2")).unwrap().team, TeamSide::B);
        assert!(book.get(&p("zz")).is_none());
    }

    #[test]
    fn batting_and_bowling_tallies() {
        let (a, b) = rosters();
        let mut book = PerformanceBook::new(&a, &b);
        let mut innings = innings();

        for delivery in [
            Delivery::new(BallOutcome::Four),
            Delivery::new(BallOutcome::Wide).with_runs(1),
            Delivery::new(BallOutcome::LegBye).with_runs(2),
            Delivery::new(BallOutcome::Six),
        ] {
            let applied = innings.apply_ball(delivery).unwrap();
            book.apply(&applied.ball, applied.maiden_completed);
        }

        let a1 = &book.get(&p("a1")).unwrap().batting;
        assert_eq!((a1.runs, a1.balls_faced, a1.fours, a1.sixes), (10, 3, 1, 1));
        assert_eq!(a1.strike_rate(), 333.33);

        let b1 = &book.get(&p("b1")).unwrap().bowling;
        assert_eq!(b1.legal_balls, 3);
        assert_eq!(b1.runs_conceded, 12);
        assert_eq!(b1.wides, 1);
    }

    #[test]
    fn catch_credits_bowler_and_fielder_and_reverses() {
        let (a, b) = rosters();
        let mut book = PerformanceBook::new(&a, &b);
        let mut innings = innings();

        let applied = innings
            .apply_ball(Delivery::new(BallOutcome::Wicket).with_wicket(WicketDetail {
                dismissal: Some(DismissalType::Caught),
                dismissed: None,
                fielder: Some(p("b3")),
            }))
            .unwrap();
        book.apply(&applied.ball, false);

        let a1 = book.get(&p("a1")).unwrap();
        assert!(a1.batting.is_out);
        assert_eq!(a1.batting.dismissal, Some(DismissalType::Caught));
        assert_eq!(book.get(&p("b1")).unwrap().bowling.wickets, 1);
        assert_eq!(book.get(&p("b3")).unwrap().fielding.catches, 1);

        book.reverse(&applied.ball, false);
        assert_eq!(book, PerformanceBook::new(&a, &b));
    }

    #[test]
    fn run_out_is_not_credited_to_bowler() {
        let (a, b) = rosters();
        let mut book = PerformanceBook::new(&a, &b);
        let mut innings = innings();
        let applied = innings
            .apply_ball(Delivery::new(BallOutcome::Wicket).with_wicket(WicketDetail {
                dismissal: Some(DismissalType::RunOut),
                dismissed: Some(p("a2")),
                fielder: Some(p("b2")),
            }))
            .unwrap();
        book.apply(&applied.ball, false);

        assert_eq!(book.get(&p("b1")).unwrap().bowling.wickets, 0);
        assert_eq!(book.get(&p("b2")).unwrap().fielding.run_outs, 1);
        assert!(book.get(&p("a2")).unwrap().batting.is_out);
        assert!(!book.get(&p("a1")).unwrap().batting.is_out);
    }

    #[test]
    fn rebuild_counts_maidens() {
        let (a, b) = rosters();
        let mut innings = innings();
        let mut incremental = PerformanceBook::new(&a, &b);
        for _ in 0..6 {
            let applied = innings.apply_ball(Delivery::new(BallOutcome::Dot)).unwrap();
            incremental.apply(&applied.ball, applied.maiden_completed);
        }

        let rebuilt = PerformanceBook::rebuild(&a, &b, [&innings]);
        assert_eq!(rebuilt.get(&p("b1")).unwrap().bowling.maidens, 1);
        assert_eq!(rebuilt, incremental);
    }
}
