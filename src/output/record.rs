//! Per-match statistic records

use std::io::Write;

/// Name given to the first column of every table
pub const PLAYERS_COLUMN: &str = "players";

/// Column added to every row with the table's team name
pub const TEAM_COLUMN: &str = "team";

/// One team's statistic table, already normalized
///
/// The first header (the team name) has been moved into `team` and the first
/// column renamed to `players`. Every row ends with the team name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamTable {
    team: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TeamTable {
    /// Builds a normalized table
    ///
    /// Repeated headers, and headers that clash with `players` or `team`, get
    /// a numeric suffix (`K`, `K.1`, `K.2`) so no column is merged away.
    ///
    /// # Arguments
    ///
    /// * `team` - The first header of the raw table
    /// * `stat_columns` - The remaining headers
    /// * `rows` - Raw rows, first cell being the player name
    pub fn new(team: String, stat_columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut columns = Vec::with_capacity(stat_columns.len() + 2);
        columns.push(PLAYERS_COLUMN.to_string());
        for column in stat_columns {
            let column = unique_column_name(&columns, column);
            columns.push(column);
        }
        columns.push(TEAM_COLUMN.to_string());

        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.push(team.clone());
                row
            })
            .collect();

        Self {
            team,
            columns,
            rows,
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }
}

fn unique_column_name(taken: &[String], name: String) -> String {
    let is_free = |candidate: &str| candidate != TEAM_COLUMN && !taken.iter().any(|c| c == candidate);
    if is_free(&name) {
        return name;
    }

    let mut n = 1;
    loop {
        let candidate = format!("{}.{}", name, n);
        if is_free(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// All player rows of one match, as written to disk
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchRecord {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MatchRecord {
    /// Concatenates team tables row-wise
    ///
    /// Columns are the union of all table columns in first-seen order; a row
    /// from a table lacking a column gets an empty cell there.
    pub fn from_tables(tables: Vec<TeamTable>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let positions: Vec<Option<usize>> = columns
                .iter()
                .map(|column| table.columns.iter().position(|c| c == column))
                .collect();

            for row in table.rows {
                rows.push(
                    positions
                        .iter()
                        .map(|position| {
                            position
                                .and_then(|i| row.get(i).cloned())
                                .unwrap_or_default()
                        })
                        .collect(),
                );
            }
        }

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of player rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the header and all rows as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
