// Standings table: rate stats and a total rank order.
//
// Order: win percentage, then run differential, then runs scored, then team
// name. Win percentages are compared by cross-multiplying records, so two
// 6-4 teams tie exactly instead of through float rounding.

use crate::rows::StandingsRecord;
use crate::stats::StandingsRow;
use std::cmp::Ordering;

/// wins / (wins + losses), or 0.0 with no games played.
pub fn win_pct(wins: u32, losses: u32) -> f64 {
    let games = u64::from(wins) + u64::from(losses);
    if games == 0 {
        0.0
    } else {
        wins as f64 / games as f64
    }
}

fn games(record: &StandingsRecord) -> u64 {
    u64::from(record.wins) + u64::from(record.losses)
}

/// Compare two records' win percentages without floating point.
fn cmp_win_pct(a: &StandingsRecord, b: &StandingsRecord) -> Ordering {
    let a_games = u128::from(games(a));
    let b_games = u128::from(games(b));
    // A team with no games has a 0 pct.
    let a_num = if a_games == 0 { 0 } else { u128::from(a.wins) * b_games.max(1) };
    let b_num = if b_games == 0 { 0 } else { u128::from(b.wins) * a_games.max(1) };
    a_num.cmp(&b_num)
}

fn run_differential(record: &StandingsRecord) -> i64 {
    record.runs_scored as i64 - record.runs_allowed as i64
}

/// Best-first ordering used for ranking.
fn standings_order(a: &StandingsRecord, b: &StandingsRecord) -> Ordering {
    cmp_win_pct(b, a)
        .then_with(|| run_differential(b).cmp(&run_differential(a)))
        .then_with(|| b.runs_scored.cmp(&a.runs_scored))
        .then_with(|| a.team.cmp(&b.team))
}

fn per_game(runs: u32, games: u64) -> f64 {
    if games == 0 {
        0.0
    } else {
        runs as f64 / games as f64
    }
}

/// Rank every record and compute its derived columns.
///
/// Ranks are unique and 1-based. Games back are measured against the
/// first-ranked team.
pub fn compute_standings(records: &[StandingsRecord]) -> Vec<StandingsRow> {
    let mut ordered: Vec<&StandingsRecord> = records.iter().collect();
    ordered.sort_by(|a, b| standings_order(a, b));

    let leader = ordered.first().map(|r| (r.wins as i64, r.losses as i64));

    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            let played = games(record);
            let games_back = leader.map_or(0.0, |(lw, ll)| {
                ((lw - record.wins as i64) + (record.losses as i64 - ll)) as f64 / 2.0
            });
            StandingsRow {
                rank: idx as u32 + 1,
                team: record.team.clone(),
                wins: record.wins,
                losses: record.losses,
                win_pct: win_pct(record.wins, record.losses),
                games_back,
                runs_scored: record.runs_scored,
                runs_allowed: record.runs_allowed,
                run_differential: run_differential(record),
                runs_per_game: per_game(record.runs_scored, played),
                runs_allowed_per_game: per_game(record.runs_allowed, played),
                h2h_note: record.h2h_note.clone(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(team: &str, wins: u32, losses: u32, scored: u32, allowed: u32) -> StandingsRecord {
        StandingsRecord {
            team: team.into(),
            wins,
            losses,
            runs_scored: scored,
            runs_allowed: allowed,
            h2h_note: None,
        }
    }

    fn teams(rows: &[StandingsRow]) -> Vec<&str> {
        rows.iter().map(|r| r.team.as_str()).collect()
    }

    #[test]
    fn orders_by_win_pct() {
        let rows = compute_standings(&[
            record("Boos", 1, 9, 30, 65),
            record("Fireballs", 7, 3, 62, 41),
            record("Koopas", 5, 5, 50, 50),
        ]);
        assert_eq!(teams(&rows), vec!["Fireballs", "Koopas", "Boos"]);
        assert_eq!(rows.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!((rows[0].win_pct - 0.7).abs() < 1e-9);
    }

    #[test]
    fn equal_pct_broken_by_run_differential() {
        let rows = compute_standings(&[
            record("Koopas", 6, 4, 55, 50),
            record("Yoshis", 6, 4, 58, 49),
        ]);
        assert_eq!(teams(&rows), vec!["Yoshis", "Koopas"]);
        assert_eq!(rows[0].run_differential, 9);
        assert_eq!(rows[1].run_differential, 5);
    }

    #[test]
    fn equal_pct_across_different_game_counts() {
        // 3-2 and 6-4 are both .600; the better differential wins.
        let rows = compute_standings(&[
            record("Short", 3, 2, 20, 19),
            record("Long", 6, 4, 40, 30),
        ]);
        assert_eq!(teams(&rows), vec!["Long", "Short"]);
    }

    #[test]
    fn then_runs_scored_then_name() {
        let rows = compute_standings(&[
            record("Beta", 5, 5, 40, 40),
            record("Alpha", 5, 5, 40, 40),
            record("Gamma", 5, 5, 45, 45),
        ]);
        assert_eq!(teams(&rows), vec!["Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn team_without_games_ranks_as_zero_pct() {
        let rows = compute_standings(&[record("New", 0, 0, 0, 0), record("Winless", 0, 3, 5, 20)]);
        // Both .000; New has the better differential.
        assert_eq!(teams(&rows), vec!["New", "Winless"]);
        assert_eq!(rows[0].win_pct, 0.0);
        assert_eq!(rows[0].runs_per_game, 0.0);
    }

    #[test]
    fn derived_columns() {
        let rows = compute_standings(&[
            record("Fireballs", 7, 3, 62, 41),
            record("Yoshis", 6, 4, 58, 49),
            record("Boos", 1, 9, 30, 65),
        ]);
        assert_eq!(rows[0].games_back, 0.0);
        assert_eq!(rows[1].games_back, 1.0);
        assert_eq!(rows[2].games_back, 6.0);
        assert!((rows[0].runs_per_game - 6.2).abs() < 1e-9);
        assert!((rows[2].runs_allowed_per_game - 6.5).abs() < 1e-9);
    }

    #[test]
    fn ranking_is_deterministic_under_input_order() {
        let mut input = vec![
            record("A", 4, 4, 30, 30),
            record("B", 4, 4, 30, 30),
            record("C", 6, 2, 40, 20),
            record("D", 2, 6, 20, 40),
        ];
        let forward = compute_standings(&input);
        input.reverse();
        let backward = compute_standings(&input);
        assert_eq!(forward, backward);
    }

    #[test]
    fn empty_input() {
        assert!(compute_standings(&[]).is_empty());
    }

    #[test]
    fn saturated_records_rank_without_overflow() {
        let rows = compute_standings(&[
            record("Boos", u32::MAX, 3, u32::MAX, 0),
            record("Koopas", u32::MAX, u32::MAX, 0, u32::MAX),
        ]);
        assert_eq!(teams(&rows), vec!["Boos", "Koopas"]);
        assert!(rows[0].win_pct > 0.99);
        assert!(rows.iter().all(|r| r.runs_per_game.is_finite()));
    }
}
