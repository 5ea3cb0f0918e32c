// Typed league records produced by the row mapper.
//
// Every record here is an immutable value object rebuilt from a fresh row
// snapshot; rate stats are derived on demand, never read from the sheet.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Counting stats
// ---------------------------------------------------------------------------

/// Season counting stats shared by player and team records.
///
/// Innings pitched are held as outs so that `12.1` (12 1/3 innings) stays
/// exact. Unmapped columns stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingStats {
    pub games: u32,
    pub plate_appearances: u32,
    pub at_bats: u32,
    pub runs: u32,
    pub hits: u32,
    pub doubles: u32,
    pub triples: u32,
    pub home_runs: u32,
    pub rbi: u32,
    pub walks: u32,
    pub hit_by_pitch: u32,
    pub sacrifice_flies: u32,
    pub strikeouts: u32,
    pub stolen_bases: u32,
    pub outs_pitched: u32,
    pub batters_faced: u32,
    pub hits_allowed: u32,
    pub runs_allowed: u32,
    pub earned_runs: u32,
    pub walks_allowed: u32,
    pub strikeouts_pitched: u32,
    pub pitching_wins: u32,
    pub pitching_losses: u32,
    pub saves: u32,
}

impl CountingStats {
    /// Innings pitched as a real number (outs / 3).
    pub fn innings(&self) -> f64 {
        self.outs_pitched as f64 / 3.0
    }

    /// Innings pitched in scorebook notation, e.g. `"21.1"`.
    pub fn innings_display(&self) -> String {
        format_outs(self.outs_pitched)
    }

    pub fn total_bases(&self) -> u64 {
        sum(&[self.hits, self.doubles])
            + 2 * u64::from(self.triples)
            + 3 * u64::from(self.home_runs)
    }

    /// Batting average: H / AB.
    pub fn avg(&self) -> Option<f64> {
        ratio(self.hits.into(), self.at_bats.into())
    }

    /// On-base percentage: (H + BB + HBP) / (AB + BB + HBP + SF).
    pub fn obp(&self) -> Option<f64> {
        ratio(
            sum(&[self.hits, self.walks, self.hit_by_pitch]),
            sum(&[self.at_bats, self.walks, self.hit_by_pitch, self.sacrifice_flies]),
        )
    }

    /// Slugging: TB / AB.
    pub fn slg(&self) -> Option<f64> {
        ratio(self.total_bases(), self.at_bats.into())
    }

    pub fn ops(&self) -> Option<f64> {
        match (self.obp(), self.slg()) {
            (Some(obp), Some(slg)) => Some(obp + slg),
            _ => None,
        }
    }

    /// ERA: 9 * ER / IP, computed from outs to avoid rounding IP.
    pub fn era(&self) -> Option<f64> {
        ratio(27 * u64::from(self.earned_runs), self.outs_pitched.into())
    }

    /// WHIP: (BB + H) / IP.
    pub fn whip(&self) -> Option<f64> {
        ratio(
            3 * sum(&[self.walks_allowed, self.hits_allowed]),
            self.outs_pitched.into(),
        )
    }

    /// Batting average against: hits allowed per official at-bat faced
    /// (batters faced minus walks).
    pub fn baa(&self) -> Option<f64> {
        ratio(
            self.hits_allowed.into(),
            self.batters_faced.saturating_sub(self.walks_allowed).into(),
        )
    }

    /// Strikeouts per nine innings.
    pub fn k_per_nine(&self) -> Option<f64> {
        ratio(27 * u64::from(self.strikeouts_pitched), self.outs_pitched.into())
    }
}

// Sheet counts can be as large as `u32::MAX`, so sums are taken in u64.
fn sum(counts: &[u32]) -> u64 {
    counts.iter().map(|&c| u64::from(c)).sum()
}

fn ratio(num: u64, den: u64) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(num as f64 / den as f64)
    }
}

/// Render an out count in scorebook innings notation (`64` -> `"21.1"`).
pub fn format_outs(outs: u32) -> String {
    format!("{}.{}", outs / 3, outs % 3)
}

// ---------------------------------------------------------------------------
// Player and team records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub name: String,
    /// `None` for players not on a roster.
    pub team: Option<String>,
    pub stats: CountingStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStat {
    pub team: String,
    pub captain: Option<String>,
    pub wins: u32,
    pub losses: u32,
    pub stats: CountingStats,
}

impl TeamStat {
    pub fn games_played(&self) -> u64 {
        sum(&[self.wins, self.losses])
    }
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

/// One computed line of the standings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub rank: u32,
    pub team: String,
    pub wins: u32,
    pub losses: u32,
    pub win_pct: f64,
    pub games_back: f64,
    pub runs_scored: u32,
    pub runs_allowed: u32,
    pub run_differential: i64,
    pub runs_per_game: f64,
    pub runs_allowed_per_game: f64,
    /// Free-text head-to-head annotation carried through untouched.
    pub h2h_note: Option<String>,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// A single scheduled or completed game.
///
/// Built through [`ScheduleGame::unplayed`] or [`ScheduleGame::final_score`]
/// so that `winner` is always consistent with the scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleGame {
    pub week: Option<u32>,
    pub code: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub played: bool,
    pub winner: Option<String>,
    pub box_score_url: Option<String>,
}

impl ScheduleGame {
    pub fn unplayed(home_team: impl Into<String>, away_team: impl Into<String>) -> Self {
        ScheduleGame {
            week: None,
            code: None,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_score: None,
            away_score: None,
            played: false,
            winner: None,
            box_score_url: None,
        }
    }

    /// A completed game. A tied score leaves `winner` empty.
    pub fn final_score(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_score: u32,
        away_score: u32,
    ) -> Self {
        let home_team = home_team.into();
        let away_team = away_team.into();
        let winner = match home_score.cmp(&away_score) {
            std::cmp::Ordering::Greater => Some(home_team.clone()),
            std::cmp::Ordering::Less => Some(away_team.clone()),
            std::cmp::Ordering::Equal => None,
        };
        ScheduleGame {
            week: None,
            code: None,
            home_team,
            away_team,
            home_score: Some(home_score),
            away_score: Some(away_score),
            played: true,
            winner,
            box_score_url: None,
        }
    }

    pub fn with_week(mut self, week: Option<u32>) -> Self {
        self.week = week;
        self
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    pub fn with_box_score_url(mut self, url: Option<String>) -> Self {
        self.box_score_url = url;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
