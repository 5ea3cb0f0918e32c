// Concurrent sheet loading: one blocking fetch per sheet, joined into a
// single snapshot.

use anyhow::Context;
use futures_util::future::try_join_all;
use pennant_core::pipeline::{LeagueSnapshot, SheetKind};
use pennant_core::source::{RowSource, SheetRange};
use std::sync::Arc;
use tracing::info;

/// Fetch every range in parallel. Fails if any sheet fails.
pub async fn fetch_snapshot(
    source: Arc<dyn RowSource>,
    ranges: Vec<(SheetKind, SheetRange)>,
) -> anyhow::Result<LeagueSnapshot> {
    let tasks = ranges.into_iter().map(|(kind, range)| {
        let source = Arc::clone(&source);
        async move {
            let grid = tokio::task::spawn_blocking(move || source.fetch(&range))
                .await
                .context("sheet fetch task panicked")?
                .with_context(|| format!("failed to fetch {} sheet", kind.label()))?;
            Ok::<_, anyhow::Error>((kind, grid))
        }
    });

    let mut snapshot = LeagueSnapshot::new();
    for (kind, grid) in try_join_all(tasks).await? {
        info!("loaded {} rows from {} sheet", grid.len(), kind.label());
        snapshot.insert(kind, grid);
    }
    Ok(snapshot)
}
