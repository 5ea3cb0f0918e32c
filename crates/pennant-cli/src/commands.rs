// Per-command JSON rendering of a derived league report.

use crate::cli::{Command, Phase};
use anyhow::Context;
use pennant_core::leaderboard::Leaderboard;
use pennant_core::pipeline::LeagueReport;
use serde_json::{json, Value};

pub fn render(command: &Command, report: &LeagueReport) -> anyhow::Result<Value> {
    let value = match command {
        Command::Leaders { phase, stat } => {
            let leaders = match phase {
                Phase::Regular => &report.leaders,
                Phase::Playoffs => report
                    .playoff_leaders
                    .as_ref()
                    .context("no playoff stat sheets are configured")?,
            };
            let boards: Vec<&Leaderboard> = leaders
                .batting
                .iter()
                .chain(&leaders.pitching)
                .filter(|b| stat.map_or(true, |s| b.stat == s))
                .collect();
            if let (Some(s), true) = (stat, boards.is_empty()) {
                anyhow::bail!("{} is not a configured leaderboard", s.label());
            }
            json!({
                "league": report.league,
                "phase": leaders.phase,
                "batting_threshold": leaders.batting_threshold,
                "pitching_threshold": leaders.pitching_threshold,
                "leaderboards": boards,
            })
        }
        Command::Standings => json!({
            "league": report.league,
            "standings": report.standings,
        }),
        Command::Bracket => json!({
            "league": report.league,
            "rounds": report.bracket.rounds,
            "champion": report.bracket.champion(),
        }),
        Command::Report => serde_json::to_value(report).context("failed to serialize report")?,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pennant_core::bracket::Bracket;
    use pennant_core::leaderboard::{LeaderboardConfig, StatKind};
    use pennant_core::pipeline::derive_leaderboards;
    use pennant_core::qualification::{QualificationConfig, SeasonPhase};

    fn empty_report() -> LeagueReport {
        LeagueReport {
            league: "Test League".into(),
            season: Some("2026".into()),
            generated_at: Utc::now(),
            leaders: derive_leaderboards(
                &[],
                &[],
                SeasonPhase::Regular,
                10.0,
                &QualificationConfig::default(),
                &LeaderboardConfig::default(),
            ),
            playoff_leaders: None,
            standings: Vec::new(),
            schedule: Vec::new(),
            bracket: Bracket::default(),
        }
    }

    #[test]
    fn leaders_filtered_to_one_stat() {
        let command = Command::Leaders {
            phase: Phase::Regular,
            stat: Some(StatKind::Era),
        };
        let value = render(&command, &empty_report()).unwrap();
        let boards = value["leaderboards"].as_array().unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0]["label"], "ERA");
        assert!((value["batting_threshold"].as_f64().unwrap() - 21.0).abs() < 1e-9);
    }

    #[test]
    fn unconfigured_stat_is_an_error() {
        let command = Command::Leaders {
            phase: Phase::Regular,
            stat: Some(StatKind::KPerNine),
        };
        assert!(render(&command, &empty_report()).is_err());
    }

    #[test]
    fn playoff_leaders_require_playoff_sheets() {
        let command = Command::Leaders {
            phase: Phase::Playoffs,
            stat: None,
        };
        let err = render(&command, &empty_report()).unwrap_err();
        assert!(err.to_string().contains("no playoff stat sheets"));
    }

    #[test]
    fn bracket_without_champion_renders_null() {
        let value = render(&Command::Bracket, &empty_report()).unwrap();
        assert!(value["champion"].is_null());
        assert!(value["rounds"].as_array().unwrap().is_empty());
    }
}
