// Ranked, tie-aware statistical leaderboards.
//
// Ranking uses standard competition ranking ("1224"). Values are compared at
// the precision they are displayed with, so two averages that both read
// ".412" share a rank even if the underlying ratios differ.

use crate::qualification::{self, Category};
use crate::stats::{format_outs, CountingStats, PlayerStat, TeamStat};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Direction and formatting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// How a stat value is displayed. Also defines the precision at which two
/// values count as equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Whole number: `14`.
    Count,
    /// Three decimals without a leading zero below 1: `.412`, `1.000`.
    Average,
    /// Two decimals: `2.53`.
    Rate,
    /// Innings in scorebook notation: `21.1`.
    Innings,
}

impl ValueFormat {
    /// Integer key at display precision. Equal keys are tied values.
    pub fn key(&self, value: f64) -> i64 {
        let scaled = match self {
            ValueFormat::Count => value,
            ValueFormat::Average => value * 1000.0,
            ValueFormat::Rate => value * 100.0,
            ValueFormat::Innings => value * 3.0,
        };
        scaled.round() as i64
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            ValueFormat::Count => format!("{}", value.round() as i64),
            ValueFormat::Average => {
                let text = format!("{value:.3}");
                match text.strip_prefix("0.") {
                    Some(rest) => format!(".{rest}"),
                    None => text,
                }
            }
            ValueFormat::Rate => format!("{value:.2}"),
            ValueFormat::Innings => format_outs(self.key(value).max(0) as u32),
        }
    }
}

// ---------------------------------------------------------------------------
// Stat catalog
// ---------------------------------------------------------------------------

/// Every stat a leaderboard can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    // Batting
    Avg,
    Obp,
    Slg,
    Ops,
    HomeRuns,
    Rbi,
    Hits,
    Runs,
    Walks,
    StolenBases,
    // Pitching
    Era,
    Whip,
    Baa,
    Strikeouts,
    Wins,
    Saves,
    KPerNine,
    InningsPitched,
}

impl StatKind {
    pub fn label(&self) -> &'static str {
        match self {
            StatKind::Avg => "AVG",
            StatKind::Obp => "OBP",
            StatKind::Slg => "SLG",
            StatKind::Ops => "OPS",
            StatKind::HomeRuns => "HR",
            StatKind::Rbi => "RBI",
            StatKind::Hits => "H",
            StatKind::Runs => "R",
            StatKind::Walks => "BB",
            StatKind::StolenBases => "SB",
            StatKind::Era => "ERA",
            StatKind::Whip => "WHIP",
            StatKind::Baa => "BAA",
            StatKind::Strikeouts => "K",
            StatKind::Wins => "W",
            StatKind::Saves => "SV",
            StatKind::KPerNine => "K/9",
            StatKind::InningsPitched => "IP",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            StatKind::Avg
            | StatKind::Obp
            | StatKind::Slg
            | StatKind::Ops
            | StatKind::HomeRuns
            | StatKind::Rbi
            | StatKind::Hits
            | StatKind::Runs
            | StatKind::Walks
            | StatKind::StolenBases => Category::Batting,
            StatKind::Era
            | StatKind::Whip
            | StatKind::Baa
            | StatKind::Strikeouts
            | StatKind::Wins
            | StatKind::Saves
            | StatKind::KPerNine
            | StatKind::InningsPitched => Category::Pitching,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            StatKind::Era | StatKind::Whip | StatKind::Baa => Direction::LowerIsBetter,
            _ => Direction::HigherIsBetter,
        }
    }

    pub fn format(&self) -> ValueFormat {
        match self {
            StatKind::Avg | StatKind::Obp | StatKind::Slg | StatKind::Ops | StatKind::Baa => {
                ValueFormat::Average
            }
            StatKind::Era | StatKind::Whip | StatKind::KPerNine => ValueFormat::Rate,
            StatKind::InningsPitched => ValueFormat::Innings,
            _ => ValueFormat::Count,
        }
    }

    /// Rate stats only rank qualified players. Counting stats rank anyone
    /// with a non-zero sample in the stat's category and a non-zero total.
    pub fn requires_qualification(&self) -> bool {
        matches!(self.format(), ValueFormat::Average | ValueFormat::Rate)
    }

    pub fn value(&self, stats: &CountingStats) -> Option<f64> {
        let count = |n: u32| Some(n as f64);
        match self {
            StatKind::Avg => stats.avg(),
            StatKind::Obp => stats.obp(),
            StatKind::Slg => stats.slg(),
            StatKind::Ops => stats.ops(),
            StatKind::HomeRuns => count(stats.home_runs),
            StatKind::Rbi => count(stats.rbi),
            StatKind::Hits => count(stats.hits),
            StatKind::Runs => count(stats.runs),
            StatKind::Walks => count(stats.walks),
            StatKind::StolenBases => count(stats.stolen_bases),
            StatKind::Era => stats.era(),
            StatKind::Whip => stats.whip(),
            StatKind::Baa => stats.baa(),
            StatKind::Strikeouts => count(stats.strikeouts_pitched),
            StatKind::Wins => count(stats.pitching_wins),
            StatKind::Saves => count(stats.saves),
            StatKind::KPerNine => stats.k_per_nine(),
            StatKind::InningsPitched => Some(stats.innings()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tie collapsing policy
// ---------------------------------------------------------------------------

/// When a group of tied entries is shown as a single summary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieCollapsePolicy {
    /// List every tied entry.
    Never,
    /// Collapse every group of two or more.
    AnyTie,
    /// Collapse only a group that runs past the display count.
    #[default]
    AtCutoff,
}

/// A run of displayed entries sharing one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TieGroup {
    pub rank: u32,
    pub size: usize,
}

impl TieGroup {
    /// Whether the group extends past the last nominal display slot.
    pub fn straddles(&self, display_count: usize) -> bool {
        self.rank as usize + self.size - 1 > display_count
    }
}

impl TieCollapsePolicy {
    pub fn should_collapse(&self, group: &TieGroup, display_count: usize) -> bool {
        if group.size < 2 {
            return false;
        }
        match self {
            TieCollapsePolicy::Never => false,
            TieCollapsePolicy::AnyTie => true,
            TieCollapsePolicy::AtCutoff => group.straddles(display_count),
        }
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Something that can appear on a leaderboard.
pub trait Subject {
    fn display_name(&self) -> &str;
    fn team(&self) -> Option<&str>;
    /// Plural used in collapsed tie labels ("3 players tied").
    fn plural_noun() -> &'static str;
}

impl Subject for PlayerStat {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn team(&self) -> Option<&str> {
        self.team.as_deref()
    }

    fn plural_noun() -> &'static str {
        "players"
    }
}

impl Subject for TeamStat {
    fn display_name(&self) -> &str {
        &self.team
    }

    fn team(&self) -> Option<&str> {
        Some(self.team.as_str())
    }

    fn plural_noun() -> &'static str {
        "teams"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderEntry {
    /// 1-based competition rank; tied entries share it.
    pub rank: u32,
    /// Player name, or a label such as "3 players tied" for a summary row.
    pub player: String,
    /// Absent for unrostered players and summary rows.
    pub team: Option<String>,
    pub value: String,
    pub raw_value: f64,
    /// Summary rows must not link to a team page.
    pub is_tie_summary: bool,
    /// Number of entries sharing this rank.
    pub tied_count: usize,
}

/// A finished leaderboard for one stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub stat: StatKind,
    pub label: String,
    pub category: Category,
    pub direction: Direction,
    /// Minimum sample applied, if the stat requires qualification.
    pub qualification_threshold: Option<f64>,
    pub entries: Vec<LeaderEntry>,
}

/// Leaderboard display settings (the `[leaderboards]` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_display_count")]
    pub display_count: usize,
    #[serde(default)]
    pub tie_collapse: TieCollapsePolicy,
    #[serde(default = "default_batting_stats")]
    pub batting: Vec<StatKind>,
    #[serde(default = "default_pitching_stats")]
    pub pitching: Vec<StatKind>,
}

fn default_display_count() -> usize {
    5
}

fn default_batting_stats() -> Vec<StatKind> {
    vec![
        StatKind::Avg,
        StatKind::Obp,
        StatKind::Slg,
        StatKind::Ops,
        StatKind::HomeRuns,
        StatKind::Rbi,
        StatKind::Hits,
        StatKind::StolenBases,
    ]
}

fn default_pitching_stats() -> Vec<StatKind> {
    vec![
        StatKind::Era,
        StatKind::Whip,
        StatKind::Baa,
        StatKind::Strikeouts,
        StatKind::Wins,
        StatKind::InningsPitched,
    ]
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        LeaderboardConfig {
            display_count: default_display_count(),
            tie_collapse: TieCollapsePolicy::default(),
            batting: default_batting_stats(),
            pitching: default_pitching_stats(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Rank `records` by `value` and keep every entry with `rank <= display_count`.
///
/// Records whose value is `None` or non-finite are skipped. Sorting is stable,
/// so tied records keep their input order. A tied group that crosses the
/// display boundary is kept whole, so the result can exceed `display_count`.
pub fn build_leaderboard<'a, T, I, F>(
    records: I,
    value: F,
    direction: Direction,
    format: ValueFormat,
    display_count: usize,
) -> Vec<LeaderEntry>
where
    T: Subject + 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Option<f64>,
{
    let mut scored: Vec<(&T, f64, i64)> = records
        .into_iter()
        .filter_map(|r| {
            let v = value(r).filter(|v| v.is_finite())?;
            Some((r, v, format.key(v)))
        })
        .collect();

    match direction {
        Direction::HigherIsBetter => scored.sort_by(|a, b| b.2.cmp(&a.2)),
        Direction::LowerIsBetter => scored.sort_by(|a, b| a.2.cmp(&b.2)),
    }

    let mut entries: Vec<LeaderEntry> = Vec::with_capacity(scored.len());
    let mut prev_key: Option<i64> = None;
    let mut rank = 0u32;
    for (idx, (record, raw, key)) in scored.iter().enumerate() {
        if prev_key != Some(*key) {
            rank = idx as u32 + 1;
            prev_key = Some(*key);
        }
        if rank as usize > display_count {
            break;
        }
        entries.push(LeaderEntry {
            rank,
            player: record.display_name().to_string(),
            team: record.team().map(str::to_string),
            value: format.format(*raw),
            raw_value: *raw,
            is_tie_summary: false,
            tied_count: 1,
        });
    }

    // Whole groups are always kept, so counting within `entries` is exact.
    let mut start = 0;
    while start < entries.len() {
        let end = entries[start..]
            .iter()
            .position(|e| e.rank != entries[start].rank)
            .map_or(entries.len(), |offset| start + offset);
        for entry in &mut entries[start..end] {
            entry.tied_count = end - start;
        }
        start = end;
    }

    entries
}

/// Replace tied groups with summary rows wherever `policy` says so.
pub fn apply_tie_policy<T: Subject>(
    entries: Vec<LeaderEntry>,
    policy: TieCollapsePolicy,
    display_count: usize,
) -> Vec<LeaderEntry> {
    let mut out: Vec<LeaderEntry> = Vec::with_capacity(entries.len());
    let mut iter = entries.into_iter().peekable();
    while let Some(first) = iter.next() {
        let group = TieGroup {
            rank: first.rank,
            size: first.tied_count,
        };
        if policy.should_collapse(&group, display_count) {
            // Skip the rest of the group.
            while iter.peek().is_some_and(|e| e.rank == group.rank) {
                iter.next();
            }
            out.push(LeaderEntry {
                rank: group.rank,
                player: format!("{} {} tied", group.size, T::plural_noun()),
                team: None,
                value: first.value,
                raw_value: first.raw_value,
                is_tie_summary: true,
                tied_count: group.size,
            });
        } else {
            out.push(first);
        }
    }
    out
}

/// Build the leaderboard for one stat over a player pool.
///
/// Rate stats are restricted to players meeting `threshold`; counting stats
/// take anyone with a non-zero sample in the stat's category and a non-zero
/// total for the stat itself.
pub fn stat_leaderboard(
    players: &[PlayerStat],
    stat: StatKind,
    threshold: f64,
    config: &LeaderboardConfig,
) -> Leaderboard {
    let category = stat.category();
    let pool: Vec<&PlayerStat> = if stat.requires_qualification() {
        qualification::qualify(players, category, threshold)
    } else {
        players
            .iter()
            .filter(|p| category.sample_size(&p.stats) > 0.0)
            .filter(|p| stat.value(&p.stats).is_some_and(|v| v > 0.0))
            .collect()
    };

    let entries = build_leaderboard(
        pool,
        |p: &PlayerStat| stat.value(&p.stats),
        stat.direction(),
        stat.format(),
        config.display_count,
    );

    Leaderboard {
        stat,
        label: stat.label().to_string(),
        category,
        direction: stat.direction(),
        qualification_threshold: stat.requires_qualification().then_some(threshold),
        entries: apply_tie_policy::<PlayerStat>(entries, config.tie_collapse, config.display_count),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
