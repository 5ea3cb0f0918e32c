// Minimum-sample qualification for rate-stat leaderboards.

use crate::stats::{CountingStats, PlayerStat, TeamStat};
use serde::{Deserialize, Serialize};

/// Slack applied when comparing a sample against a float threshold, so that
/// 10 games x 2.1 still admits a player with exactly 21 AB.
const QUALIFY_EPSILON: f64 = 1e-9;

/// Which side of the game a stat measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Batting,
    Pitching,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Batting => "Batting",
            Category::Pitching => "Pitching",
        }
    }

    /// The counting stat that measures sample size in this category:
    /// at-bats for batting, innings pitched for pitching.
    pub fn sample_size(&self, stats: &CountingStats) -> f64 {
        match self {
            Category::Batting => stats.at_bats as f64,
            Category::Pitching => stats.innings(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonPhase {
    Regular,
    Playoffs,
}

/// Qualification rule parameters (the `[qualification]` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationConfig {
    /// At-bats required per team game played.
    #[serde(default = "default_batting_multiplier")]
    pub batting_multiplier: f64,
    /// Innings pitched required per team game played.
    #[serde(default = "default_pitching_multiplier")]
    pub pitching_multiplier: f64,
    #[serde(default = "default_playoff_min_at_bats")]
    pub playoff_min_at_bats: f64,
    #[serde(default = "default_playoff_min_innings")]
    pub playoff_min_innings: f64,
}

fn default_batting_multiplier() -> f64 {
    2.1
}

fn default_pitching_multiplier() -> f64 {
    1.0
}

fn default_playoff_min_at_bats() -> f64 {
    5.0
}

fn default_playoff_min_innings() -> f64 {
    2.0
}

impl Default for QualificationConfig {
    fn default() -> Self {
        QualificationConfig {
            batting_multiplier: default_batting_multiplier(),
            pitching_multiplier: default_pitching_multiplier(),
            playoff_min_at_bats: default_playoff_min_at_bats(),
            playoff_min_innings: default_playoff_min_innings(),
        }
    }
}

impl QualificationConfig {
    /// Minimum sample for `category`.
    ///
    /// Regular season scales with the average number of games a team has
    /// played. Playoffs ignore `average_games_played` and use the fixed
    /// minimums.
    pub fn threshold(
        &self,
        category: Category,
        phase: SeasonPhase,
        average_games_played: f64,
    ) -> f64 {
        match (phase, category) {
            (SeasonPhase::Regular, Category::Batting) => {
                average_games_played * self.batting_multiplier
            }
            (SeasonPhase::Regular, Category::Pitching) => {
                average_games_played * self.pitching_multiplier
            }
            (SeasonPhase::Playoffs, Category::Batting) => self.playoff_min_at_bats,
            (SeasonPhase::Playoffs, Category::Pitching) => self.playoff_min_innings,
        }
    }
}

/// Mean games played (wins + losses) across teams; 0.0 with no teams.
pub fn average_games_played(teams: &[TeamStat]) -> f64 {
    if teams.is_empty() {
        return 0.0;
    }
    let total: u64 = teams.iter().map(TeamStat::games_played).sum();
    total as f64 / teams.len() as f64
}

pub fn qualifies(player: &PlayerStat, category: Category, threshold: f64) -> bool {
    category.sample_size(&player.stats) + QUALIFY_EPSILON >= threshold
}

/// Players meeting `threshold` in `category`, in input order.
pub fn qualify<'a, I>(players: I, category: Category, threshold: f64) -> Vec<&'a PlayerStat>
where
    I: IntoIterator<Item = &'a PlayerStat>,
{
    players
        .into_iter()
        .filter(|p| qualifies(p, category, threshold))
        .collect()
}

/// Qualified and unqualified players, each in input order.
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    pub threshold: f64,
    pub qualified: Vec<&'a PlayerStat>,
    pub unqualified: Vec<&'a PlayerStat>,
}

pub fn partition<'a, I>(players: I, category: Category, threshold: f64) -> Partition<'a>
where
    I: IntoIterator<Item = &'a PlayerStat>,
{
    let (qualified, unqualified) = players
        .into_iter()
        .partition(|p| qualifies(p, category, threshold));
    Partition {
        threshold,
        qualified,
        unqualified,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
