// League report derivation over one snapshot of every sheet.
//
// Raw grids -> row mapping -> {qualification -> leaderboards},
// {standings}, {series grouping -> bracket}. Everything here is synchronous
// and pure; fetching the snapshot is the caller's job.

use crate::bracket::{build_bracket, Bracket, RoundSpec};
use crate::config::{Config, SheetsConfig};
use crate::leaderboard::{stat_leaderboard, Leaderboard, LeaderboardConfig, StatKind};
use crate::qualification::{average_games_played, Category, QualificationConfig, SeasonPhase};
use crate::rows::{self, Grid, Row, StandingsRecord};
use crate::series::group_series;
use crate::standings::compute_standings;
use crate::stats::{PlayerStat, ScheduleGame, StandingsRow, TeamStat};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Every sheet the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    Batting,
    Pitching,
    Teams,
    Standings,
    Schedule,
    Playoffs,
    PlayoffBatting,
    PlayoffPitching,
}

impl SheetKind {
    pub fn label(&self) -> &'static str {
        match self {
            SheetKind::Batting => "batting",
            SheetKind::Pitching => "pitching",
            SheetKind::Teams => "teams",
            SheetKind::Standings => "standings",
            SheetKind::Schedule => "schedule",
            SheetKind::Playoffs => "playoffs",
            SheetKind::PlayoffBatting => "playoff batting",
            SheetKind::PlayoffPitching => "playoff pitching",
        }
    }
}

/// Raw grids fetched for one derivation run. Missing sheets read as empty.
#[derive(Debug, Clone, Default)]
pub struct LeagueSnapshot {
    grids: HashMap<SheetKind, Grid>,
}

impl LeagueSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: SheetKind, grid: Grid) {
        self.grids.insert(kind, grid);
    }

    pub fn with(mut self, kind: SheetKind, grid: Grid) -> Self {
        self.insert(kind, grid);
        self
    }

    pub fn grid(&self, kind: SheetKind) -> &[Row] {
        self.grids.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// Snapshot after row mapping.
#[derive(Debug, Clone, Default)]
pub struct LeagueRecords {
    pub batting: Vec<PlayerStat>,
    pub pitching: Vec<PlayerStat>,
    pub teams: Vec<TeamStat>,
    pub standings: Vec<StandingsRecord>,
    pub schedule: Vec<ScheduleGame>,
    pub playoffs: Vec<ScheduleGame>,
    pub playoff_batting: Vec<PlayerStat>,
    pub playoff_pitching: Vec<PlayerStat>,
}

/// Map every configured sheet. Without a standings sheet, standings input
/// comes from the team sheet.
pub fn map_snapshot(
    snapshot: &LeagueSnapshot,
    sheets: &SheetsConfig,
    max_rows: usize,
) -> LeagueRecords {
    let teams = rows::map_teams(snapshot.grid(SheetKind::Teams), &sheets.teams.columns, max_rows);
    let standings = match &sheets.standings {
        Some(sheet) => {
            rows::map_standings(snapshot.grid(SheetKind::Standings), &sheet.columns, max_rows)
        }
        None => teams.iter().map(StandingsRecord::from).collect(),
    };
    let players = |kind: SheetKind, columns: Option<&rows::PlayerColumns>| {
        columns.map_or_else(Vec::new, |c| rows::map_players(snapshot.grid(kind), c, max_rows))
    };
    let schedule = |kind: SheetKind, columns: &rows::ScheduleColumns| {
        rows::map_schedule(snapshot.grid(kind), columns, max_rows)
    };

    let records = LeagueRecords {
        batting: players(SheetKind::Batting, Some(&sheets.batting.columns)),
        pitching: players(SheetKind::Pitching, Some(&sheets.pitching.columns)),
        standings,
        schedule: schedule(SheetKind::Schedule, &sheets.schedule.columns),
        playoffs: schedule(SheetKind::Playoffs, &sheets.playoffs.columns),
        playoff_batting: players(
            SheetKind::PlayoffBatting,
            sheets.playoff_batting.as_ref().map(|s| &s.columns),
        ),
        playoff_pitching: players(
            SheetKind::PlayoffPitching,
            sheets.playoff_pitching.as_ref().map(|s| &s.columns),
        ),
        teams,
    };

    debug!(
        "mapped {} batters, {} pitchers, {} teams, {} scheduled and {} playoff games",
        records.batting.len(),
        records.pitching.len(),
        records.teams.len(),
        records.schedule.len(),
        records.playoffs.len()
    );
    records
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Leaderboards for one season phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseLeaders {
    pub phase: SeasonPhase,
    pub batting_threshold: f64,
    pub pitching_threshold: f64,
    pub batting: Vec<Leaderboard>,
    pub pitching: Vec<Leaderboard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueReport {
    pub league: String,
    pub season: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub leaders: PhaseLeaders,
    /// Present once a playoff stat sheet is configured.
    pub playoff_leaders: Option<PhaseLeaders>,
    pub standings: Vec<StandingsRow>,
    pub schedule: Vec<ScheduleGame>,
    pub bracket: Bracket,
}

/// Build one leaderboard per configured stat for a phase.
pub fn derive_leaderboards(
    batting: &[PlayerStat],
    pitching: &[PlayerStat],
    phase: SeasonPhase,
    average_games: f64,
    qualification: &QualificationConfig,
    config: &LeaderboardConfig,
) -> PhaseLeaders {
    let batting_threshold = qualification.threshold(Category::Batting, phase, average_games);
    let pitching_threshold = qualification.threshold(Category::Pitching, phase, average_games);

    let boards = |players: &[PlayerStat], stats: &[StatKind], threshold: f64| -> Vec<Leaderboard> {
        stats
            .iter()
            .map(|stat| stat_leaderboard(players, *stat, threshold, config))
            .collect()
    };

    PhaseLeaders {
        phase,
        batting_threshold,
        pitching_threshold,
        batting: boards(batting, &config.batting, batting_threshold),
        pitching: boards(pitching, &config.pitching, pitching_threshold),
    }
}

pub fn derive_standings(records: &[StandingsRecord]) -> Vec<StandingsRow> {
    compute_standings(records)
}

/// Group playoff games into series and lay them out per the round policy.
pub fn derive_bracket(playoff_games: &[ScheduleGame], rounds: &[RoundSpec]) -> Bracket {
    build_bracket(group_series(playoff_games), rounds)
}

/// Run the whole derivation over an already-mapped snapshot.
pub fn derive_report_from_records(
    records: &LeagueRecords,
    config: &Config,
    generated_at: DateTime<Utc>,
) -> LeagueReport {
    let average_games = average_games_played(&records.teams);
    let leaders = derive_leaderboards(
        &records.batting,
        &records.pitching,
        SeasonPhase::Regular,
        average_games,
        &config.qualification,
        &config.leaderboards,
    );

    let has_playoff_stats =
        config.sheets.playoff_batting.is_some() || config.sheets.playoff_pitching.is_some();
    let playoff_leaders = has_playoff_stats.then(|| {
        derive_leaderboards(
            &records.playoff_batting,
            &records.playoff_pitching,
            SeasonPhase::Playoffs,
            average_games,
            &config.qualification,
            &config.leaderboards,
        )
    });

    let report = LeagueReport {
        league: config.league.name.clone(),
        season: config.league.season.clone(),
        generated_at,
        leaders,
        playoff_leaders,
        standings: derive_standings(&records.standings),
        schedule: records.schedule.clone(),
        bracket: derive_bracket(&records.playoffs, &config.playoffs.rounds),
    };

    info!(
        "derived report for {}: {} standings rows, {} bracket rounds, avg {:.1} games played",
        report.league,
        report.standings.len(),
        report.bracket.rounds.len(),
        average_games
    );
    report
}

pub fn derive_report(
    snapshot: &LeagueSnapshot,
    config: &Config,
    generated_at: DateTime<Utc>,
) -> LeagueReport {
    let records = map_snapshot(snapshot, &config.sheets, config.source.max_rows);
    derive_report_from_records(&records, config, generated_at)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
