// Playoff bracket assembly: series into named rounds with resolved winners.
//
// Bracket shape comes from league configuration. Series are assigned to
// rounds in first-seen order; empty slots become TBD series, seeded from the
// previous round's winners when those are decided.

use crate::series::Series;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One round of the bracket policy (an entry of `[[playoffs.rounds]]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSpec {
    pub name: String,
    pub series_count: usize,
    pub best_of: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub name: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bracket {
    pub rounds: Vec<Round>,
}

impl Bracket {
    /// Winner of the final round, once it has a single decided series.
    pub fn champion(&self) -> Option<&str> {
        match self.rounds.last()?.series.as_slice() {
            [only] => only.winner.as_deref(),
            _ => None,
        }
    }
}

/// Wins needed to take a best-of-`best_of` series (3 -> 2, 5 -> 3, 7 -> 4).
pub fn clinch_threshold(best_of: u32) -> u32 {
    best_of / 2 + 1
}

/// Set `series.winner` to the side that first reaches the clinch threshold.
///
/// Games after the clinching game never change the winner.
pub fn resolve_winner(series: &mut Series, best_of: u32) {
    let needed = clinch_threshold(best_of);
    let (mut a, mut b) = (0u32, 0u32);
    let mut winner = None;
    for game in &series.games {
        let Some(game_winner) = game.winner.as_deref() else {
            continue;
        };
        if series.team_a.as_deref() == Some(game_winner) {
            a += 1;
        } else if series.team_b.as_deref() == Some(game_winner) {
            b += 1;
        }
        if a >= needed {
            winner = series.team_a.clone();
            break;
        }
        if b >= needed {
            winner = series.team_b.clone();
            break;
        }
    }
    series.best_of = Some(best_of);
    series.winner = winner;
}

/// Fill an unknown slot with winners of the two feeder series.
fn seed_from_feeders(slot: &mut Series, previous: &[Series], index: usize) {
    let feeder_winner = |i: usize| previous.get(i).and_then(|s| s.winner.clone());
    slot.team_a = feeder_winner(2 * index);
    slot.team_b = feeder_winner(2 * index + 1);
}

/// Assemble rounds from grouped series following `policy`.
///
/// Series beyond the policy's total slot count are dropped with a warning.
pub fn build_bracket(series: Vec<Series>, policy: &[RoundSpec]) -> Bracket {
    let mut remaining = series.into_iter();
    let mut rounds: Vec<Round> = Vec::with_capacity(policy.len());

    for spec in policy {
        let mut slots: Vec<Series> = remaining.by_ref().take(spec.series_count).collect();

        let filled = slots.len();
        slots.resize_with(spec.series_count, Series::tbd);
        if let Some(previous) = rounds.last() {
            for (idx, slot) in slots.iter_mut().enumerate().skip(filled) {
                seed_from_feeders(slot, &previous.series, idx);
            }
        }

        for slot in &mut slots {
            resolve_winner(slot, spec.best_of);
        }

        rounds.push(Round {
            name: spec.name.clone(),
            series: slots,
        });
    }

    let dropped = remaining.count();
    if dropped > 0 {
        warn!(
            "{} playoff series did not fit the {}-round bracket policy and were dropped",
            dropped,
            policy.len()
        );
    }

    Bracket { rounds }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
