// Raw row retrieval: the source and cache ports plus local implementations.
//
// A `RowSource` returns one sheet as an untyped grid. `CsvDirSource` reads
// header-less CSV files from a directory (one `<sheet>.csv` per sheet) and
// `TtlRowCache` keeps fetched grids in memory for a fixed time-to-live.

use crate::rows::{Cell, Grid};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read sheet file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse sheet file {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("sheet `{sheet}` not found in {dir}")]
    MissingSheet { sheet: String, dir: String },
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Address of a sheet's data rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetRange {
    pub sheet: String,
    /// Leading rows (headers, notes) before the data starts.
    pub skip_rows: usize,
}

impl SheetRange {
    pub fn new(sheet: impl Into<String>, skip_rows: usize) -> Self {
        SheetRange {
            sheet: sheet.into(),
            skip_rows,
        }
    }

    pub fn cache_key(&self) -> String {
        format!("{}!{}", self.sheet, self.skip_rows)
    }
}

pub trait RowSource: Send + Sync {
    fn fetch(&self, range: &SheetRange) -> Result<Grid, SourceError>;
}

/// Keyed grid storage with tag-based eviction.
pub trait RowCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Grid>;
    fn put(&self, key: &str, tags: &[&str], rows: Grid);
    /// Drop every entry carrying `tag`; returns how many were evicted.
    fn invalidate(&self, tag: &str) -> usize;
}

/// Tag shared by every cached sheet, for a full refresh.
pub const ALL_SHEETS_TAG: &str = "sheets";

// ---------------------------------------------------------------------------
// CSV directory source
// ---------------------------------------------------------------------------

/// Parse header-less CSV into a grid, skipping the first `skip_rows` records.
///
/// Rows may have differing lengths. Invalid UTF-8 inside a cell is replaced
/// rather than dropping the row; records the reader cannot split at all are
/// skipped with a warning.
fn read_grid<R: Read>(rdr: R, skip_rows: usize) -> Result<Grid, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr);

    let mut grid = Vec::new();
    for (idx, result) in reader.byte_records().enumerate() {
        match result {
            Ok(record) => {
                if idx < skip_rows {
                    continue;
                }
                grid.push(
                    record
                        .iter()
                        .map(|field| Cell::from(String::from_utf8_lossy(field).trim()))
                        .collect(),
                );
            }
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                warn!("skipping malformed sheet row {}: {}", idx + 1, e);
            }
        }
    }
    Ok(grid)
}

/// Reads `<dir>/<sheet>.csv` for each requested range.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvDirSource { dir: dir.into() }
    }

    fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{sheet}.csv"))
    }
}

impl RowSource for CsvDirSource {
    fn fetch(&self, range: &SheetRange) -> Result<Grid, SourceError> {
        let path = self.sheet_path(&range.sheet);
        if !path.is_file() {
            return Err(SourceError::MissingSheet {
                sheet: range.sheet.clone(),
                dir: self.dir.display().to_string(),
            });
        }
        let file = std::fs::File::open(&path).map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let grid = read_grid(file, range.skip_rows).map_err(|e| SourceError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;
        debug!("read {} rows from {}", grid.len(), path.display());
        Ok(grid)
    }
}

// ---------------------------------------------------------------------------
// In-memory TTL cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheEntry {
    rows: Grid,
    tags: Vec<String>,
    stored_at: DateTime<Utc>,
}

/// Thread-safe in-memory cache whose entries expire after a fixed TTL.
#[derive(Debug)]
pub struct TtlRowCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl TtlRowCache {
    pub fn new(ttl_seconds: u64) -> Self {
        let secs = i64::try_from(ttl_seconds).unwrap_or(i64::MAX).min(i64::from(u32::MAX));
        TtlRowCache {
            ttl: Duration::seconds(secs),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Entries are plain data; a panic elsewhere cannot leave them torn.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lookup as of `now`; expired entries are evicted.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Grid> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => now - entry.stored_at >= self.ttl,
        };
        if expired {
            entries.remove(key);
            debug!("cache entry '{}' expired", key);
            return None;
        }
        entries.get(key).map(|entry| entry.rows.clone())
    }

    pub fn put_at(&self, key: &str, tags: &[&str], rows: Grid, now: DateTime<Utc>) {
        let entry = CacheEntry {
            rows,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            stored_at: now,
        };
        self.lock().insert(key.to_string(), entry);
    }
}

impl RowCache for TtlRowCache {
    fn get(&self, key: &str) -> Option<Grid> {
        self.get_at(key, Utc::now())
    }

    fn put(&self, key: &str, tags: &[&str], rows: Grid) {
        self.put_at(key, tags, rows, Utc::now());
    }

    fn invalidate(&self, tag: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| t == tag));
        let evicted = before - entries.len();
        info!("invalidated {} cached sheets tagged '{}'", evicted, tag);
        evicted
    }
}

// ---------------------------------------------------------------------------
// Read-through composition
// ---------------------------------------------------------------------------

/// A `RowSource` that consults a `RowCache` first and fills it on a miss.
///
/// Entries are tagged with the sheet name and `ALL_SHEETS_TAG`.
pub struct CachedSource<S, C> {
    source: S,
    cache: C,
}

impl<S: RowSource, C: RowCache> CachedSource<S, C> {
    pub fn new(source: S, cache: C) -> Self {
        CachedSource { source, cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn invalidate(&self, tag: &str) -> usize {
        self.cache.invalidate(tag)
    }
}

impl<S: RowSource, C: RowCache> RowSource for CachedSource<S, C> {
    fn fetch(&self, range: &SheetRange) -> Result<Grid, SourceError> {
        let key = range.cache_key();
        if let Some(rows) = self.cache.get(&key) {
            debug!("cache hit for '{}'", key);
            return Ok(rows);
        }
        let rows = self.source.fetch(range)?;
        self.cache
            .put(&key, &[range.sheet.as_str(), ALL_SHEETS_TAG], rows.clone());
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::text_row;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn read_grid_skips_header_rows_and_keeps_blanks() {
        let csv_data = "\
Player,Team,AB,H
Mario,Fireballs,34,14
Luigi,,34,14
";
        let grid = read_grid(csv_data.as_bytes(), 1).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0], text_row(&["Mario", "Fireballs", "34", "14"]));
        assert_eq!(grid[1][1], Cell::Empty);
    }

    #[test]
    fn read_grid_accepts_ragged_rows() {
        let csv_data = "A,B,5,3\nC,D\n";
        let grid = read_grid(csv_data.as_bytes(), 0).unwrap();
        assert_eq!(grid[0].len(), 4);
        assert_eq!(grid[1].len(), 2);
    }

    #[test]
    fn read_grid_trims_and_handles_quoted_commas() {
        let csv_data = "  Mario  ,\"1,204\"\n";
        let grid = read_grid(csv_data.as_bytes(), 0).unwrap();
        assert_eq!(grid[0][0], Cell::Text("Mario".into()));
        assert_eq!(grid[0][1].number(), Some(1204.0));
    }

    #[test]
    fn read_grid_keeps_rows_with_invalid_utf8() {
        let csv_data = b"Mario,Fireballs,34,14\nLuigi,Fire\xffballs,34,\xff\n";
        let grid = read_grid(&csv_data[..], 0).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[1][0], Cell::Text("Luigi".into()));
        assert_eq!(grid[1][1], Cell::Text("Fire\u{FFFD}balls".into()));
        assert_eq!(grid[1][2].number(), Some(34.0));
        assert_eq!(grid[1][3].number(), None);
    }

    #[test]
    fn csv_dir_source_reports_missing_sheet() {
        let tmp = std::env::temp_dir().join("pennant_source_missing_sheet");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let source = CsvDirSource::new(&tmp);
        let err = source.fetch(&SheetRange::new("batting", 1)).unwrap_err();
        match err {
            SourceError::MissingSheet { sheet, .. } => assert_eq!(sheet, "batting"),
            other => panic!("expected MissingSheet, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn csv_dir_source_reads_sheet_file() {
        let tmp = std::env::temp_dir().join("pennant_source_reads_sheet");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        fs::write(tmp.join("teams.csv"), "Team,W,L\nFireballs,7,3\nBoos,1,9\n").unwrap();

        let grid = CsvDirSource::new(&tmp)
            .fetch(&SheetRange::new("teams", 1))
            .unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[1][0].text().as_deref(), Some("Boos"));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ttl_cache_expires_entries() {
        let cache = TtlRowCache::new(60);
        let t0 = Utc::now();
        cache.put_at("batting!1", &["batting"], vec![text_row(&["Mario"])], t0);

        assert!(cache.get_at("batting!1", t0 + Duration::seconds(59)).is_some());
        assert!(cache.get_at("batting!1", t0 + Duration::seconds(60)).is_none());
        // Expired entry is gone for good.
        assert!(cache.get_at("batting!1", t0).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_by_tag() {
        let cache = TtlRowCache::new(60);
        cache.put("batting!1", &["batting", ALL_SHEETS_TAG], vec![]);
        cache.put("pitching!1", &["pitching", ALL_SHEETS_TAG], vec![]);
        cache.put("notes!0", &["notes"], vec![]);

        assert_eq!(cache.invalidate("batting"), 1);
        assert_eq!(cache.invalidate(ALL_SHEETS_TAG), 1);
        assert_eq!(cache.invalidate("missing"), 0);
        assert_eq!(cache.len(), 1);
    }

    struct CountingSource {
        fetches: AtomicUsize,
    }

    impl RowSource for CountingSource {
        fn fetch(&self, range: &SheetRange) -> Result<Grid, SourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text_row(&[range.sheet.as_str()])])
        }
    }

    #[test]
    fn cached_source_reads_through_once() {
        let cached = CachedSource::new(
            CountingSource {
                fetches: AtomicUsize::new(0),
            },
            TtlRowCache::new(60),
        );
        let range = SheetRange::new("teams", 1);

        let first = cached.fetch(&range).unwrap();
        let second = cached.fetch(&range).unwrap();
        assert_eq!(first, second);
        assert_eq!(cached.source.fetches.load(Ordering::SeqCst), 1);

        assert_eq!(cached.invalidate("teams"), 1);
        cached.fetch(&range).unwrap();
        assert_eq!(cached.source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cached_source_does_not_cache_errors() {
        let tmp = std::env::temp_dir().join("pennant_source_no_error_cache");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let cached = CachedSource::new(CsvDirSource::new(&tmp), TtlRowCache::new(60));
        assert!(cached.fetch(&SheetRange::new("teams", 0)).is_err());
        assert!(cached.cache().is_empty());
        let _ = fs::remove_dir_all(&tmp);
    }
}
