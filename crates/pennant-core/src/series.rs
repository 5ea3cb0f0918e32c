// Grouping playoff games into series by unordered opponent pair.

use crate::stats::ScheduleGame;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All games between one pair of playoff opponents.
///
/// `team_a` is the home team of the first game seen. Both teams are `None`
/// for a bracket slot whose participants are not known yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub team_a: Option<String>,
    pub team_b: Option<String>,
    pub games: Vec<ScheduleGame>,
    pub wins_a: u32,
    pub wins_b: u32,
    /// Set by the bracket builder once a side clinches.
    pub winner: Option<String>,
    /// Series length, set by the bracket builder from the round policy.
    pub best_of: Option<u32>,
}

impl Series {
    pub fn between(team_a: impl Into<String>, team_b: impl Into<String>) -> Self {
        Series {
            team_a: Some(team_a.into()),
            team_b: Some(team_b.into()),
            games: Vec::new(),
            wins_a: 0,
            wins_b: 0,
            winner: None,
            best_of: None,
        }
    }

    /// An empty slot with unknown participants.
    pub fn tbd() -> Self {
        Series {
            team_a: None,
            team_b: None,
            games: Vec::new(),
            wins_a: 0,
            wins_b: 0,
            winner: None,
            best_of: None,
        }
    }

    /// Append a game and credit its winner. Unplayed and tied games count
    /// toward `games` but not toward either side's wins.
    pub fn push_game(&mut self, game: ScheduleGame) {
        if let Some(winner) = game.winner.as_deref() {
            if self.team_a.as_deref() == Some(winner) {
                self.wins_a += 1;
            } else if self.team_b.as_deref() == Some(winner) {
                self.wins_b += 1;
            }
        }
        self.games.push(game);
    }

    pub fn is_tbd(&self) -> bool {
        self.team_a.is_none() && self.team_b.is_none()
    }

    /// Games with a final score.
    pub fn played_games(&self) -> usize {
        self.games.iter().filter(|g| g.played).count()
    }

    /// Short status for display, e.g. "Fireballs won 2-0",
    /// "Yoshis lead 2-1", "Series tied 1-1" or "TBD".
    pub fn status(&self) -> String {
        let (Some(a), Some(b)) = (self.team_a.as_deref(), self.team_b.as_deref()) else {
            return "TBD".to_string();
        };
        let (hi, lo) = (self.wins_a.max(self.wins_b), self.wins_a.min(self.wins_b));
        if let Some(winner) = self.winner.as_deref() {
            return format!("{winner} won {hi}-{lo}");
        }
        match self.wins_a.cmp(&self.wins_b) {
            std::cmp::Ordering::Greater => format!("{a} lead {hi}-{lo}"),
            std::cmp::Ordering::Less => format!("{b} lead {hi}-{lo}"),
            std::cmp::Ordering::Equal if self.played_games() == 0 => "Not started".to_string(),
            std::cmp::Ordering::Equal => format!("Series tied {hi}-{lo}"),
        }
    }
}

/// Order-independent key for a pair of teams.
fn pair_key(x: &str, y: &str) -> (String, String) {
    if x <= y {
        (x.to_string(), y.to_string())
    } else {
        (y.to_string(), x.to_string())
    }
}

/// Partition chronologically ordered playoff games into series.
///
/// Home/away order does not matter for grouping. Series come back in order of
/// first appearance and each keeps its games in input order.
pub fn group_series(games: &[ScheduleGame]) -> Vec<Series> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut series: Vec<Series> = Vec::new();

    for game in games {
        let key = pair_key(&game.home_team, &game.away_team);
        let slot = *index.entry(key).or_insert_with(|| {
            series.push(Series::between(&game.home_team, &game.away_team));
            series.len() - 1
        });
        series[slot].push_game(game.clone());
    }

    series
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_unordered_pair() {
        let games = vec![
            ScheduleGame::unplayed("A", "B"),
            ScheduleGame::final_score("B", "A", 5, 3),
        ];
        let series = group_series(&games);
        assert_eq!(series.len(), 1);
        let s = &series[0];
        assert_eq!(s.team_a.as_deref(), Some("A"));
        assert_eq!(s.team_b.as_deref(), Some("B"));
        assert_eq!(s.games.len(), 2);
        assert!(!s.games[0].played);
        assert_eq!(s.wins_a, 0);
        assert_eq!(s.wins_b, 1);
        assert!(s.winner.is_none());
    }

    #[test]
    fn series_in_first_seen_order_with_game_order_kept() {
        let games = vec![
            ScheduleGame::final_score("A", "D", 7, 2).with_code(Some("SF1-G1".into())),
            ScheduleGame::final_score("B", "C", 3, 5).with_code(Some("SF2-G1".into())),
            ScheduleGame::final_score("D", "A", 4, 6).with_code(Some("SF1-G2".into())),
            ScheduleGame::final_score("C", "B", 2, 4).with_code(Some("SF2-G2".into())),
        ];
        let series = group_series(&games);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].team_a.as_deref(), Some("A"));
        assert_eq!(series[0].wins_a, 2);
        let codes: Vec<&str> = series[1]
            .games
            .iter()
            .filter_map(|g| g.code.as_deref())
            .collect();
        assert_eq!(codes, vec!["SF2-G1", "SF2-G2"]);
        assert_eq!((series[1].wins_a, series[1].wins_b), (1, 1));
    }

    #[test]
    fn interleaving_other_pairs_does_not_change_membership() {
        let ab1 = ScheduleGame::final_score("A", "B", 1, 0);
        let ab2 = ScheduleGame::final_score("B", "A", 1, 0);
        let cd1 = ScheduleGame::final_score("C", "D", 1, 0);

        let first = group_series(&[ab1.clone(), cd1.clone(), ab2.clone()]);
        let second = group_series(&[cd1, ab1, ab2]);

        let find = |all: &[Series]| {
            all.iter()
                .find(|s| s.team_a.as_deref() == Some("A"))
                .cloned()
                .unwrap()
        };
        assert_eq!(find(&first), find(&second));
    }

    #[test]
    fn tied_game_counts_for_nobody() {
        let series = group_series(&[ScheduleGame::final_score("A", "B", 2, 2)]);
        assert_eq!(series[0].wins_a + series[0].wins_b, 0);
        assert_eq!(series[0].played_games(), 1);
    }

    #[test]
    fn wins_never_exceed_games() {
        let games = vec![
            ScheduleGame::final_score("A", "B", 3, 1),
            ScheduleGame::unplayed("B", "A"),
            ScheduleGame::final_score("B", "A", 0, 0),
            ScheduleGame::final_score("A", "B", 1, 4),
        ];
        let s = &group_series(&games)[0];
        assert!((s.wins_a + s.wins_b) as usize <= s.games.len());
    }

    #[test]
    fn empty_schedule_gives_no_series() {
        assert!(group_series(&[]).is_empty());
    }

    #[test]
    fn status_lines() {
        let mut s = Series::between("Yoshis", "Koopas");
        assert_eq!(s.status(), "Not started");
        s.push_game(ScheduleGame::final_score("Yoshis", "Koopas", 3, 5));
        assert_eq!(s.status(), "Koopas lead 1-0");
        s.push_game(ScheduleGame::final_score("Koopas", "Yoshis", 2, 4));
        assert_eq!(s.status(), "Series tied 1-1");
        s.winner = Some("Yoshis".into());
        s.wins_a = 2;
        assert_eq!(s.status(), "Yoshis won 2-1");
        assert_eq!(Series::tbd().status(), "TBD");
    }
}
