//! Match settings, team rosters and the configuration a match is created
//! from.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::identity::{AccountId, PlayerRef, TeamSide};

/// Legal deliveries in one over.
pub const BALLS_PER_OVER: u32 = 6;

/// Playing conditions for one match. Frozen once the toss is conducted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Overs per innings (1..=50).
    pub overs: u32,
    /// Players batting per side (2..=11). The innings ends after
    /// `players_per_team - 1` wickets.
    pub players_per_team: u32,
    /// Penalty runs for a wide (1..=2).
    pub wide_runs: u32,
    /// Penalty runs for a no-ball (1..=2).
    pub no_ball_runs: u32,
    /// Whether the delivery after a no-ball is a free hit.
    #[serde(default = "enabled")]
    pub no_ball_free_hit: bool,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            overs: 6,
            players_per_team: 6,
            wide_runs: 1,
            no_ball_runs: 1,
            no_ball_free_hit: true,
        }
    }
}

fn enabled() -> bool {
    true
}

impl MatchSettings {
    /// Wickets that end an innings.
    pub fn max_wickets(&self) -> u32 {
        self.players_per_team.saturating_sub(1)
    }

    /// Legal deliveries available to one innings.
    pub fn total_balls(&self) -> u32 {
        self.overs * BALLS_PER_OVER
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range("overs", self.overs, 1, 50)?;
        check_range("players_per_team", self.players_per_team, 2, 11)?;
        check_range("wide_runs", self.wide_runs, 1, 2)?;
        check_range("no_ball_runs", self.no_ball_runs, 1, 2)?;
        Ok(())
    }
}

fn check_range(field: &'static str, actual: u32, min: u32, max: u32) -> Result<(), SettingsError> {
    if (min..=max).contains(&actual) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            min,
            max,
            actual,
        })
    }
}

/// A team name plus its ordered player list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub name: String,
    pub players: Vec<PlayerRef>,
}

impl TeamRoster {
    pub fn new(name: impl Into<String>, players: Vec<PlayerRef>) -> Self {
        Self {
            name: name.into(),
            players,
        }
    }

    pub fn contains(&self, player: &PlayerRef) -> bool {
        self.players.contains(player)
    }
}

/// Inbound configuration produced by match setup and consumed exactly once
/// when the match is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(flatten)]
    pub settings: MatchSettings,
    pub team_a: TeamRoster,
    pub team_b: TeamRoster,
    pub umpire: AccountId,
}

impl MatchConfig {
    pub fn team(&self, side: TeamSide) -> &TeamRoster {
        match side {
            TeamSide::A => &self.team_a,
            TeamSide::B => &self.team_b,
        }
    }

    /// Check value ranges, team names, roster sizes and player uniqueness.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.settings.validate()?;

        let mut seen = HashSet::new();
        for roster in [&self.team_a, &self.team_b] {
            if roster.name.trim().is_empty() {
                return Err(SettingsError::EmptyTeamName);
            }
            if roster.players.len() < self.settings.players_per_team as usize {
                return Err(SettingsError::ShortRoster {
                    team: roster.name.clone(),
                    required: self.settings.players_per_team,
                    actual: roster.players.len(),
                });
            }
            for player in &roster.players {
                if !seen.insert(player) {
                    return Err(SettingsError::DuplicatePlayer(player.to_string()));
                }
            }
        }
        Ok(())
    }
}
