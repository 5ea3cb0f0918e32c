// Library root: league stat derivation (row mapping, qualification,
// leaderboards, standings, series and bracket) plus the config and source
// layers the binary wires together.

pub mod bracket;
pub mod config;
pub mod leaderboard;
pub mod pipeline;
pub mod qualification;
pub mod rows;
pub mod series;
pub mod source;
pub mod standings;
pub mod stats;
