// Configuration loading and parsing (league.toml, sheets.toml).

use crate::bracket::RoundSpec;
use crate::leaderboard::LeaderboardConfig;
use crate::pipeline::SheetKind;
use crate::qualification::{Category, QualificationConfig};
use crate::rows::{PlayerColumns, ScheduleColumns, StandingsColumns, TeamColumns};
use crate::source::SheetRange;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid `{field}`: {message}")]
    Invalid { field: String, message: String },

    #[error("no defaults/ or config/ directory under {}", .0.display())]
    NoConfigDir(PathBuf),

    #[error("cannot install {path} from defaults: {source}")]
    InstallDefault {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Files every `config/` directory must hold.
pub const CONFIG_FILES: [&str; 2] = ["league.toml", "sheets.toml"];

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub leaderboards: LeaderboardConfig,
    pub qualification: QualificationConfig,
    pub playoffs: PlayoffConfig,
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub sheets: SheetsConfig,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire league.toml file.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
    #[serde(default)]
    leaderboards: LeaderboardConfig,
    #[serde(default)]
    qualification: QualificationConfig,
    #[serde(default)]
    playoffs: PlayoffConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    #[serde(default)]
    pub season: Option<String>,
}

/// Bracket shape: rounds in play order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayoffConfig {
    #[serde(default)]
    pub rounds: Vec<RoundSpec>,
}

// ---------------------------------------------------------------------------
// sheets.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire sheets.toml file.
#[derive(Debug, Clone, Deserialize)]
struct SheetsFile {
    source: SourceConfig,
    #[serde(default)]
    cache: CacheConfig,
    sheets: SheetsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Directory holding one `<sheet>.csv` per sheet.
    pub data_dir: String,
    /// Hard cap on rows read from any sheet.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_max_rows() -> usize {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

/// Where a sheet lives and how its columns map onto record fields.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetConfig<C> {
    pub sheet: String,
    /// Header rows to skip before data starts.
    #[serde(default)]
    pub skip_rows: usize,
    pub columns: C,
}

impl<C> SheetConfig<C> {
    pub fn range(&self) -> SheetRange {
        SheetRange {
            sheet: self.sheet.clone(),
            skip_rows: self.skip_rows,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    pub batting: SheetConfig<PlayerColumns>,
    pub pitching: SheetConfig<PlayerColumns>,
    pub teams: SheetConfig<TeamColumns>,
    #[serde(default)]
    pub standings: Option<SheetConfig<StandingsColumns>>,
    pub schedule: SheetConfig<ScheduleColumns>,
    pub playoffs: SheetConfig<ScheduleColumns>,
    #[serde(default)]
    pub playoff_batting: Option<SheetConfig<PlayerColumns>>,
    #[serde(default)]
    pub playoff_pitching: Option<SheetConfig<PlayerColumns>>,
}

impl SheetsConfig {
    /// Every configured sheet with its fetch range.
    pub fn ranges(&self) -> Vec<(SheetKind, SheetRange)> {
        let mut out = vec![
            (SheetKind::Batting, self.batting.range()),
            (SheetKind::Pitching, self.pitching.range()),
            (SheetKind::Teams, self.teams.range()),
            (SheetKind::Schedule, self.schedule.range()),
            (SheetKind::Playoffs, self.playoffs.range()),
        ];
        if let Some(s) = &self.standings {
            out.push((SheetKind::Standings, s.range()));
        }
        if let Some(s) = &self.playoff_batting {
            out.push((SheetKind::PlayoffBatting, s.range()));
        }
        if let Some(s) = &self.playoff_pitching {
            out.push((SheetKind::PlayoffPitching, s.range()));
        }
        out
    }

    /// Column index lists per sheet, keyed by config path.
    fn column_indices(&self) -> Vec<(String, Vec<(&'static str, usize)>)> {
        let mut out = vec![
            ("sheets.batting.columns".to_string(), self.batting.columns.indices()),
            ("sheets.pitching.columns".to_string(), self.pitching.columns.indices()),
            ("sheets.teams.columns".to_string(), self.teams.columns.indices()),
            ("sheets.schedule.columns".to_string(), self.schedule.columns.indices()),
            ("sheets.playoffs.columns".to_string(), self.playoffs.columns.indices()),
        ];
        if let Some(s) = &self.standings {
            out.push(("sheets.standings.columns".to_string(), s.columns.indices()));
        }
        if let Some(s) = &self.playoff_batting {
            out.push(("sheets.playoff_batting.columns".to_string(), s.columns.indices()));
        }
        if let Some(s) = &self.playoff_pitching {
            out.push(("sheets.playoff_pitching.columns".to_string(), s.columns.indices()));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/sheets.toml`, both relative to the given `base_dir`.
///
/// Missing files are an error here; [`load_config`] installs them from
/// `defaults/` first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::Malformed {
            path: league_path.clone(),
            source: e,
        })?;

    // --- sheets.toml (required) ---
    let sheets_path = config_dir.join("sheets.toml");
    let sheets_text = read_file(&sheets_path)?;
    let sheets_file: SheetsFile =
        toml::from_str(&sheets_text).map_err(|e| ConfigError::Malformed {
            path: sheets_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        leaderboards: league_file.leaderboards,
        qualification: league_file.qualification,
        playoffs: league_file.playoffs,
        source: sheets_file.source,
        cache: sheets_file.cache,
        sheets: sheets_file.sheets,
    };

    validate(&config)?;

    Ok(config)
}

/// Copy each of [`CONFIG_FILES`] that `config/` lacks out of `defaults/`.
///
/// Existing files are left alone, so local edits survive. Returns the paths
/// written. A base dir with `config/` but no `defaults/` is fine.
pub fn install_missing_configs(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(ConfigError::NoConfigDir(base_dir.to_path_buf()));
    }
    std::fs::create_dir_all(&config_dir).map_err(install_error(&config_dir))?;

    let mut installed = Vec::new();
    for name in CONFIG_FILES {
        let default_path = defaults_dir.join(name);
        let target = config_dir.join(name);
        if target.exists() || !default_path.is_file() {
            continue;
        }
        let content = std::fs::read(&default_path).map_err(install_error(&default_path))?;
        let mut dest = match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(dest) => dest,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(install_error(&target)(e)),
        };
        dest.write_all(&content).map_err(install_error(&target))?;
        info!("installed default config {}", target.display());
        installed.push(target);
    }

    Ok(installed)
}

/// Install any missing config files from `defaults/`, then load.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    install_missing_configs(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

fn install_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError {
    let path = path.to_path_buf();
    move |source| ConfigError::InstallDefault { path, source }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.name.trim().is_empty() {
        return Err(invalid("league.name", "must not be empty"));
    }

    // Leaderboards
    if config.leaderboards.display_count == 0 {
        return Err(invalid("leaderboards.display_count", "must be greater than 0"));
    }
    let stat_lists = [
        ("leaderboards.batting", &config.leaderboards.batting, Category::Batting),
        ("leaderboards.pitching", &config.leaderboards.pitching, Category::Pitching),
    ];
    for (field, stats, category) in stat_lists {
        if let Some(stat) = stats.iter().find(|s| s.category() != category) {
            return Err(invalid(
                field,
                format!("{} is not a {} stat", stat.label(), category.label().to_lowercase()),
            ));
        }
    }

    // Qualification
    let q = &config.qualification;
    let multipliers: &[(&str, f64)] = &[
        ("qualification.batting_multiplier", q.batting_multiplier),
        ("qualification.pitching_multiplier", q.pitching_multiplier),
    ];
    for (name, val) in multipliers {
        if val.is_nan() || *val <= 0.0 {
            return Err(invalid(*name, format!("must be > 0, got {val}")));
        }
    }
    let minimums: &[(&str, f64)] = &[
        ("qualification.playoff_min_at_bats", q.playoff_min_at_bats),
        ("qualification.playoff_min_innings", q.playoff_min_innings),
    ];
    for (name, val) in minimums {
        if val.is_nan() || *val < 0.0 {
            return Err(invalid(*name, format!("must be >= 0, got {val}")));
        }
    }

    // Playoff rounds
    for (idx, round) in config.playoffs.rounds.iter().enumerate() {
        let field = format!("playoffs.rounds[{idx}]");
        if round.name.trim().is_empty() {
            return Err(invalid(format!("{field}.name"), "must not be empty"));
        }
        if round.series_count == 0 {
            return Err(invalid(format!("{field}.series_count"), "must be > 0"));
        }
        if round.best_of == 0 || round.best_of % 2 == 0 {
            return Err(invalid(
                format!("{field}.best_of"),
                format!("must be a positive odd number, got {}", round.best_of),
            ));
        }
    }

    // Source and cache
    if config.source.max_rows == 0 {
        return Err(invalid("source.max_rows", "must be > 0"));
    }
    if config.cache.ttl_seconds == 0 {
        return Err(invalid("cache.ttl_seconds", "must be > 0"));
    }

    // Column maps: one field per column within a sheet.
    for (field, indices) in config.sheets.column_indices() {
        let mut seen: HashMap<usize, &str> = HashMap::new();
        for (name, idx) in indices {
            if let Some(other) = seen.insert(idx, name) {
                return Err(invalid(
                    field,
                    format!("`{other}` and `{name}` both map to column {idx}"),
                ));
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::{StatKind, TieCollapsePolicy};
    use std::fs;
    use std::path::PathBuf;

    /// Helper: returns the workspace root holding `defaults/`
    /// (works whether `cargo test` runs from the crate dir or the repo root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("../../defaults").exists() {
            cwd.join("../..")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Fresh temp dir with both default files copied into `config/`.
    fn temp_with_defaults(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let config_dir = tmp.join("config");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&config_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), config_dir.join("league.toml")).unwrap();
        fs::copy(root.join("defaults/sheets.toml"), config_dir.join("sheets.toml")).unwrap();
        tmp
    }

    fn replace_in(path: PathBuf, from: &str, to: &str) {
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(from), "{from:?} not found in {}", path.display());
        fs::write(&path, text.replace(from, to)).unwrap();
    }

    fn expect_validation_field(tmp: &Path, expected: &str) {
        let err = load_config_from(tmp).unwrap_err();
        match &err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, expected),
            other => panic!("expected Invalid, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config_from_default_files() {
        let tmp = temp_with_defaults("pennant_config_defaults");
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.league.name, "Mushroom Kingdom Softball League");
        assert_eq!(config.league.season.as_deref(), Some("2026"));

        assert_eq!(config.leaderboards.display_count, 5);
        assert_eq!(config.leaderboards.tie_collapse, TieCollapsePolicy::AtCutoff);
        assert_eq!(config.leaderboards.batting[0], StatKind::Avg);
        assert!(config.leaderboards.pitching.contains(&StatKind::Era));

        assert!((config.qualification.batting_multiplier - 2.1).abs() < f64::EPSILON);
        assert!((config.qualification.pitching_multiplier - 1.0).abs() < f64::EPSILON);
        assert!((config.qualification.playoff_min_at_bats - 5.0).abs() < f64::EPSILON);

        assert_eq!(config.playoffs.rounds.len(), 2);
        assert_eq!(config.playoffs.rounds[0].name, "Semifinals");
        assert_eq!(config.playoffs.rounds[0].best_of, 3);
        assert_eq!(config.playoffs.rounds[1].series_count, 1);

        assert_eq!(config.source.data_dir, "data/sheets");
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.sheets.batting.sheet, "batting");
        assert_eq!(config.sheets.batting.skip_rows, 1);
        assert_eq!(config.sheets.batting.columns.stats.at_bats, Some(4));
        assert_eq!(config.sheets.pitching.columns.stats.innings_pitched, Some(3));
        assert!(config.sheets.standings.is_some());

        let kinds: Vec<SheetKind> = config.sheets.ranges().into_iter().map(|(k, _)| k).collect();
        assert!(kinds.contains(&SheetKind::PlayoffBatting));
        assert_eq!(kinds.len(), 8);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn optional_tables_fall_back_to_defaults() {
        let tmp = temp_with_defaults("pennant_config_minimal_league");
        fs::write(
            tmp.join("config/league.toml"),
            "[league]\nname = \"Minimal\"\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("should load minimal league.toml");
        assert_eq!(config.leaderboards.display_count, 5);
        assert!(config.playoffs.rounds.is_empty());
        assert!((config.qualification.batting_multiplier - 2.1).abs() < f64::EPSILON);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_display_count() {
        let tmp = temp_with_defaults("pennant_config_zero_display");
        replace_in(tmp.join("config/league.toml"), "display_count = 5", "display_count = 0");
        expect_validation_field(&tmp, "leaderboards.display_count");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_pitching_stat_in_batting_list() {
        let tmp = temp_with_defaults("pennant_config_wrong_category");
        replace_in(tmp.join("config/league.toml"), "batting = [\"avg\"", "batting = [\"era\"");
        expect_validation_field(&tmp, "leaderboards.batting");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_positive_multiplier() {
        let tmp = temp_with_defaults("pennant_config_zero_multiplier");
        replace_in(
            tmp.join("config/league.toml"),
            "batting_multiplier = 2.1",
            "batting_multiplier = 0.0",
        );
        expect_validation_field(&tmp, "qualification.batting_multiplier");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_even_best_of() {
        let tmp = temp_with_defaults("pennant_config_even_best_of");
        replace_in(tmp.join("config/league.toml"), "best_of = 3", "best_of = 4");
        expect_validation_field(&tmp, "playoffs.rounds[0].best_of");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_duplicate_column_index() {
        let tmp = temp_with_defaults("pennant_config_duplicate_column");
        // Point at_bats at the games column.
        replace_in(tmp.join("config/sheets.toml"), "at_bats = 4", "at_bats = 2");
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Invalid { field, message } => {
                assert!(field.ends_with(".columns"), "field was {field}");
                assert!(message.contains("column 2"));
            }
            other => panic!("expected Invalid, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_max_rows() {
        let tmp = temp_with_defaults("pennant_config_zero_rows");
        replace_in(tmp.join("config/sheets.toml"), "max_rows = 500", "max_rows = 0");
        expect_validation_field(&tmp, "source.max_rows");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unknown_column_field_is_a_parse_error() {
        let tmp = temp_with_defaults("pennant_config_unknown_column");
        replace_in(tmp.join("config/sheets.toml"), "at_bats = 4", "at_bat = 4");
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Malformed { path, .. } => assert!(path.ends_with("sheets.toml")),
            other => panic!("expected Malformed, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unreadable_for_missing_league_toml() {
        let tmp = temp_with_defaults("pennant_config_missing_league");
        fs::remove_file(tmp.join("config/league.toml")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Unreadable { path, source } => {
                assert!(path.ends_with("league.toml"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Unreadable, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_for_invalid_toml() {
        let tmp = temp_with_defaults("pennant_config_invalid_toml");
        fs::write(tmp.join("config/league.toml"), "this is not valid [[[ toml").unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::Malformed { path, .. } => assert!(path.ends_with("league.toml")),
            other => panic!("expected Malformed, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn installs_only_missing_config_files() {
        let tmp = std::env::temp_dir().join("pennant_config_install");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), defaults_dir.join("league.toml")).unwrap();
        fs::copy(root.join("defaults/sheets.toml"), defaults_dir.join("sheets.toml")).unwrap();
        fs::write(defaults_dir.join("notes.md"), "# scratch\n").unwrap();

        let installed = install_missing_configs(&tmp).expect("should succeed");
        assert_eq!(installed.len(), 2);
        assert!(tmp.join("config/league.toml").exists());
        assert!(tmp.join("config/sheets.toml").exists());
        assert!(!tmp.join("config/notes.md").exists());

        // Second run keeps the local edit.
        fs::write(tmp.join("config/league.toml"), "# custom\n").unwrap();
        let installed = install_missing_configs(&tmp).expect("should succeed");
        assert!(installed.is_empty());
        assert_eq!(fs::read_to_string(tmp.join("config/league.toml")).unwrap(), "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn config_dir_without_defaults_is_accepted() {
        let tmp = temp_with_defaults("pennant_config_no_defaults");
        let installed = install_missing_configs(&tmp).expect("config/ alone is enough");
        assert!(installed.is_empty());
        assert!(load_config(&tmp).is_ok());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn errors_when_neither_dir_exists() {
        let tmp = std::env::temp_dir().join("pennant_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = install_missing_configs(&tmp).unwrap_err();
        match &err {
            ConfigError::NoConfigDir(dir) => assert_eq!(dir, &tmp),
            other => panic!("expected NoConfigDir, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
