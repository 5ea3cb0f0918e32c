// Row mapping: untyped spreadsheet grids into typed league records.
//
// Sheets are human-edited, so mapping never fails. Blank identity cells drop
// the row, unparseable numbers become zero, and anything past `max_rows` is
// ignored.

use crate::stats::{CountingStats, PlayerStat, ScheduleGame, TeamStat};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Cells and grids
// ---------------------------------------------------------------------------

/// A single raw cell as delivered by the tabular source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Trimmed text content, or `None` when the cell is blank.
    pub fn text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(n.to_string()),
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text().is_none()
    }

    /// Numeric content. Accepts thousands separators and a bare leading
    /// decimal point (".412").
    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => n.is_finite().then_some(*n),
            Cell::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

pub type Row = Vec<Cell>;
pub type Grid = Vec<Row>;

/// Build a row from string literals; handy for fixtures and tests.
pub fn text_row(cells: &[&str]) -> Row {
    cells.iter().map(|c| Cell::from(*c)).collect()
}

static EMPTY: Cell = Cell::Empty;

fn cell(row: &Row, idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&EMPTY)
}

fn opt_cell(row: &Row, idx: Option<usize>) -> &Cell {
    idx.map(|i| cell(row, i)).unwrap_or(&EMPTY)
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Non-negative whole count; blank, negative or malformed content is 0.
pub fn parse_count(cell: &Cell) -> u32 {
    match cell.number() {
        Some(n) if n > 0.0 => n.round().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// Innings pitched in scorebook notation, returned as outs.
///
/// `12.1` and `12.2` mean 12 1/3 and 12 2/3 innings. A fractional part that
/// cannot be scorebook notation (e.g. `12.5`) is read as decimal innings.
pub fn parse_outs(cell: &Cell) -> u32 {
    let Some(ip) = cell.number().filter(|n| *n > 0.0) else {
        return 0;
    };
    let whole = ip.trunc();
    let tenths = ((ip - whole) * 10.0).round();
    let outs = if tenths <= 2.0 {
        whole * 3.0 + tenths
    } else {
        (ip * 3.0).round()
    };
    outs.min(u32::MAX as f64) as u32
}

/// Leading run of digits in a cell such as `"Week 3"` or `3`.
pub fn parse_week(cell: &Cell) -> Option<u32> {
    if let Cell::Number(n) = cell {
        return (n.is_finite() && *n >= 0.0).then(|| n.round() as u32);
    }
    let text = cell.text()?;
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Spreadsheet-style truthiness for checkbox and "final" columns.
pub fn parse_flag(cell: &Cell) -> bool {
    match cell {
        Cell::Number(n) => *n != 0.0,
        _ => cell.text().is_some_and(|t| {
            matches!(
                t.to_ascii_lowercase().as_str(),
                "y" | "yes" | "true" | "x" | "1" | "final" | "played"
            )
        }),
    }
}

// ---------------------------------------------------------------------------
// Column maps
// ---------------------------------------------------------------------------

/// Column positions for counting stats. Every field is optional; an
/// unmapped stat reads as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatColumns {
    pub games: Option<usize>,
    pub plate_appearances: Option<usize>,
    pub at_bats: Option<usize>,
    pub runs: Option<usize>,
    pub hits: Option<usize>,
    pub doubles: Option<usize>,
    pub triples: Option<usize>,
    pub home_runs: Option<usize>,
    pub rbi: Option<usize>,
    pub walks: Option<usize>,
    pub hit_by_pitch: Option<usize>,
    pub sacrifice_flies: Option<usize>,
    pub strikeouts: Option<usize>,
    pub stolen_bases: Option<usize>,
    pub innings_pitched: Option<usize>,
    pub batters_faced: Option<usize>,
    pub hits_allowed: Option<usize>,
    pub runs_allowed: Option<usize>,
    pub earned_runs: Option<usize>,
    pub walks_allowed: Option<usize>,
    pub strikeouts_pitched: Option<usize>,
    pub pitching_wins: Option<usize>,
    pub pitching_losses: Option<usize>,
    pub saves: Option<usize>,
}

impl StatColumns {
    /// Named mapped indices, for duplicate detection at config load.
    pub fn indices(&self) -> Vec<(&'static str, usize)> {
        let fields: [(&'static str, Option<usize>); 24] = [
            ("games", self.games),
            ("plate_appearances", self.plate_appearances),
            ("at_bats", self.at_bats),
            ("runs", self.runs),
            ("hits", self.hits),
            ("doubles", self.doubles),
            ("triples", self.triples),
            ("home_runs", self.home_runs),
            ("rbi", self.rbi),
            ("walks", self.walks),
            ("hit_by_pitch", self.hit_by_pitch),
            ("sacrifice_flies", self.sacrifice_flies),
            ("strikeouts", self.strikeouts),
            ("stolen_bases", self.stolen_bases),
            ("innings_pitched", self.innings_pitched),
            ("batters_faced", self.batters_faced),
            ("hits_allowed", self.hits_allowed),
            ("runs_allowed", self.runs_allowed),
            ("earned_runs", self.earned_runs),
            ("walks_allowed", self.walks_allowed),
            ("strikeouts_pitched", self.strikeouts_pitched),
            ("pitching_wins", self.pitching_wins),
            ("pitching_losses", self.pitching_losses),
            ("saves", self.saves),
        ];
        fields
            .into_iter()
            .filter_map(|(name, idx)| idx.map(|i| (name, i)))
            .collect()
    }

    fn read(&self, row: &Row) -> CountingStats {
        let count = |idx: Option<usize>| parse_count(opt_cell(row, idx));
        CountingStats {
            games: count(self.games),
            plate_appearances: count(self.plate_appearances),
            at_bats: count(self.at_bats),
            runs: count(self.runs),
            hits: count(self.hits),
            doubles: count(self.doubles),
            triples: count(self.triples),
            home_runs: count(self.home_runs),
            rbi: count(self.rbi),
            walks: count(self.walks),
            hit_by_pitch: count(self.hit_by_pitch),
            sacrifice_flies: count(self.sacrifice_flies),
            strikeouts: count(self.strikeouts),
            stolen_bases: count(self.stolen_bases),
            outs_pitched: parse_outs(opt_cell(row, self.innings_pitched)),
            batters_faced: count(self.batters_faced),
            hits_allowed: count(self.hits_allowed),
            runs_allowed: count(self.runs_allowed),
            earned_runs: count(self.earned_runs),
            walks_allowed: count(self.walks_allowed),
            strikeouts_pitched: count(self.strikeouts_pitched),
            pitching_wins: count(self.pitching_wins),
            pitching_losses: count(self.pitching_losses),
            saves: count(self.saves),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerColumns {
    pub name: usize,
    #[serde(default)]
    pub team: Option<usize>,
    #[serde(default)]
    pub stats: StatColumns,
}

impl PlayerColumns {
    pub fn indices(&self) -> Vec<(&'static str, usize)> {
        let mut out = vec![("name", self.name)];
        out.extend(self.team.map(|i| ("team", i)));
        out.extend(self.stats.indices());
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamColumns {
    pub team: usize,
    #[serde(default)]
    pub captain: Option<usize>,
    pub wins: usize,
    pub losses: usize,
    #[serde(default)]
    pub stats: StatColumns,
}

impl TeamColumns {
    pub fn indices(&self) -> Vec<(&'static str, usize)> {
        let mut out = vec![
            ("team", self.team),
            ("wins", self.wins),
            ("losses", self.losses),
        ];
        out.extend(self.captain.map(|i| ("captain", i)));
        out.extend(self.stats.indices());
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleColumns {
    #[serde(default)]
    pub week: Option<usize>,
    #[serde(default)]
    pub code: Option<usize>,
    pub home_team: usize,
    pub away_team: usize,
    pub home_score: usize,
    pub away_score: usize,
    #[serde(default)]
    pub played: Option<usize>,
    #[serde(default)]
    pub box_score_url: Option<usize>,
}

impl ScheduleColumns {
    pub fn indices(&self) -> Vec<(&'static str, usize)> {
        let mut out = vec![
            ("home_team", self.home_team),
            ("away_team", self.away_team),
            ("home_score", self.home_score),
            ("away_score", self.away_score),
        ];
        out.extend(self.week.map(|i| ("week", i)));
        out.extend(self.code.map(|i| ("code", i)));
        out.extend(self.played.map(|i| ("played", i)));
        out.extend(self.box_score_url.map(|i| ("box_score_url", i)));
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandingsColumns {
    pub team: usize,
    pub wins: usize,
    pub losses: usize,
    #[serde(default)]
    pub runs_scored: Option<usize>,
    #[serde(default)]
    pub runs_allowed: Option<usize>,
    #[serde(default)]
    pub h2h_note: Option<usize>,
}

impl StandingsColumns {
    pub fn indices(&self) -> Vec<(&'static str, usize)> {
        let mut out = vec![
            ("team", self.team),
            ("wins", self.wins),
            ("losses", self.losses),
        ];
        out.extend(self.runs_scored.map(|i| ("runs_scored", i)));
        out.extend(self.runs_allowed.map(|i| ("runs_allowed", i)));
        out.extend(self.h2h_note.map(|i| ("h2h_note", i)));
        out
    }
}

/// Win/loss/runs input for the standings computer, as read from the
/// standings sheet or derived from team stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRecord {
    pub team: String,
    pub wins: u32,
    pub losses: u32,
    pub runs_scored: u32,
    pub runs_allowed: u32,
    pub h2h_note: Option<String>,
}

impl From<&TeamStat> for StandingsRecord {
    fn from(team: &TeamStat) -> Self {
        StandingsRecord {
            team: team.team.clone(),
            wins: team.wins,
            losses: team.losses,
            runs_scored: team.stats.runs,
            runs_allowed: team.stats.runs_allowed,
            h2h_note: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Rows within the `max_rows` cap whose identity column is non-blank.
fn identified_rows(grid: &[Row], identity: usize, max_rows: usize) -> impl Iterator<Item = &Row> {
    if grid.len() > max_rows {
        debug!(
            "ignoring {} rows beyond the {} row cap",
            grid.len() - max_rows,
            max_rows
        );
    }
    grid.iter()
        .take(max_rows)
        .filter(move |row| !cell(row, identity).is_blank())
}

pub fn map_players(grid: &[Row], columns: &PlayerColumns, max_rows: usize) -> Vec<PlayerStat> {
    identified_rows(grid, columns.name, max_rows)
        .filter_map(|row| {
            Some(PlayerStat {
                name: cell(row, columns.name).text()?,
                team: opt_cell(row, columns.team).text(),
                stats: columns.stats.read(row),
            })
        })
        .collect()
}

pub fn map_teams(grid: &[Row], columns: &TeamColumns, max_rows: usize) -> Vec<TeamStat> {
    identified_rows(grid, columns.team, max_rows)
        .filter_map(|row| {
            Some(TeamStat {
                team: cell(row, columns.team).text()?,
                captain: opt_cell(row, columns.captain).text(),
                wins: parse_count(cell(row, columns.wins)),
                losses: parse_count(cell(row, columns.losses)),
                stats: columns.stats.read(row),
            })
        })
        .collect()
}

pub fn map_standings(
    grid: &[Row],
    columns: &StandingsColumns,
    max_rows: usize,
) -> Vec<StandingsRecord> {
    identified_rows(grid, columns.team, max_rows)
        .filter_map(|row| {
            Some(StandingsRecord {
                team: cell(row, columns.team).text()?,
                wins: parse_count(cell(row, columns.wins)),
                losses: parse_count(cell(row, columns.losses)),
                runs_scored: parse_count(opt_cell(row, columns.runs_scored)),
                runs_allowed: parse_count(opt_cell(row, columns.runs_allowed)),
                h2h_note: opt_cell(row, columns.h2h_note).text(),
            })
        })
        .collect()
}

/// Map schedule rows. A game counts as played only when both scores are
/// present (and, if a `played` column is mapped, it is checked).
pub fn map_schedule(grid: &[Row], columns: &ScheduleColumns, max_rows: usize) -> Vec<ScheduleGame> {
    identified_rows(grid, columns.home_team, max_rows)
        .filter_map(|row| {
            let home = cell(row, columns.home_team).text()?;
            let Some(away) = cell(row, columns.away_team).text() else {
                debug!("dropping schedule row for '{}': blank away team", home);
                return None;
            };

            let home_score = cell(row, columns.home_score);
            let away_score = cell(row, columns.away_score);
            let marked_played = columns.played.map_or(true, |i| parse_flag(cell(row, i)));

            let game = if marked_played && !home_score.is_blank() && !away_score.is_blank() {
                let (home_total, away_total) = (parse_count(home_score), parse_count(away_score));
                ScheduleGame::final_score(home, away, home_total, away_total)
            } else {
                ScheduleGame::unplayed(home, away)
            };

            Some(
                game.with_week(columns.week.and_then(|i| parse_week(cell(row, i))))
                    .with_code(opt_cell(row, columns.code).text())
                    .with_box_score_url(opt_cell(row, columns.box_score_url).text()),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
