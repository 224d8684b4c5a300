//! Statistics over the output directory
//!
//! This module provides the `--stats` view of an output directory: how many
//! matches and player rows were harvested and which teams appear most.

use crate::output::{OutputResult, OutputStore, TEAM_COLUMN};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Output directory statistics summary
#[derive(Debug, Clone, Default)]
pub struct HarvestStatistics {
    /// Number of match records on disk
    pub total_matches: u64,

    /// Player rows across all records
    pub total_rows: u64,

    /// Rows per team name
    pub rows_by_team: HashMap<String, u64>,

    /// Records that could not be read back
    pub unreadable: Vec<PathBuf>,
}

/// Loads statistics from the output directory
///
/// Unreadable records are listed rather than failing the whole scan.
pub fn load_statistics(store: &OutputStore) -> OutputResult<HarvestStatistics> {
    let mut stats = HarvestStatistics::default();

    for path in store.record_paths()? {
        stats.total_matches += 1;
        match count_rows(&path) {
            Ok(teams) => {
                for (team, rows) in teams {
                    stats.total_rows += rows;
                    *stats.rows_by_team.entry(team).or_insert(0) += rows;
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                stats.unreadable.push(path);
            }
        }
    }

    Ok(stats)
}

/// Counts rows per team in one record file
fn count_rows(path: &Path) -> Result<HashMap<String, u64>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let team_index = reader
        .headers()?
        .iter()
        .position(|header| header == TEAM_COLUMN);

    let mut teams = HashMap::new();
    for row in reader.records() {
        let row = row?;
        let team = team_index
            .and_then(|i| row.get(i))
            .unwrap_or_default()
            .to_string();
        *teams.entry(team).or_insert(0) += 1;
    }

    Ok(teams)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Matches harvested: {}", stats.total_matches);
    println!("  Player rows: {}", stats.total_rows);
    println!("  Distinct teams: {}", stats.rows_by_team.len());
    println!();

    if !stats.rows_by_team.is_empty() {
        println!("Most Frequent Teams:");
        let mut team_counts: Vec<_> = stats.rows_by_team.iter().collect();
        team_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (team, rows) in team_counts.into_iter().take(10) {
            println!("  {}: {} rows", team, rows);
        }
        println!();
    }

    if !stats.unreadable.is_empty() {
        println!("Unreadable Records ({}):", stats.unreadable.len());
        for path in &stats.unreadable {
            println!("  - {}", path.display());
        }
        println!();
    }
}
