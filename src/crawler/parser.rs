//! HTML parsing for listing and statistics pages
//!
//! This module handles parsing rendered markup to extract:
//! - Match identifiers from a results listing
//! - The link from a match overview to its detailed statistics
//! - The per-team statistic tables of a match

use crate::output::{MatchRecord, TeamTable};
use crate::state::MatchId;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Errors raised while parsing pages
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid CSS selector: {0}")]
    Selector(String),

    #[error("invalid match link pattern: {0}")]
    Pattern(String),

    #[error("statistics table {index} not found ({found} tables on page)")]
    MissingTable { index: usize, found: usize },

    #[error("statistics table {index} has no header row")]
    MissingHeader { index: usize },

    #[error("statistics table {index} has a row with {found} cells, expected {expected}")]
    RowWidth {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// Outcome of parsing one results listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingPage {
    /// Match identifiers in first-seen order, without duplicates
    Found(Vec<MatchId>),

    /// The page says there are no results for the filter
    EmptyExhausted,

    /// Neither identifiers nor the "no results" marker: likely a bad render
    EmptyTransient,
}

impl ListingPage {
    pub fn is_empty(&self) -> bool {
        !matches!(self, Self::Found(_))
    }
}

/// Extracts match identifiers from results listing pages
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    link_selector: Selector,
    no_results_selector: Selector,
    id_pattern: Regex,
}

impl LinkExtractor {
    /// Creates an extractor for links of the form `/<match_path>/<digits>/...`
    ///
    /// # Arguments
    ///
    /// * `match_path` - Path segment preceding match identifiers
    /// * `no_results_selector` - CSS selector of the "no results" marker
    pub fn new(match_path: &str, no_results_selector: &str) -> Result<Self, ParseError> {
        let link_selector = Selector::parse("a[href]")
            .map_err(|e| ParseError::Selector(e.to_string()))?;
        let no_results_selector = Selector::parse(no_results_selector)
            .map_err(|e| ParseError::Selector(e.to_string()))?;
        let id_pattern = Regex::new(&format!(r"/{}/(\d+)/", regex::escape(match_path)))
            .map_err(|e| ParseError::Pattern(e.to_string()))?;

        Ok(Self {
            link_selector,
            no_results_selector,
            id_pattern,
        })
    }

    /// Classifies a rendered listing page
    ///
    /// # Example
    ///
    /// ```
    /// use match_harvest::crawler::{LinkExtractor, ListingPage};
    ///
    /// let extractor = LinkExtractor::new("matches", ".no-results").unwrap();
    /// let html = r#"<a href="/matches/2370727/vitality-vs-mouz">x</a>"#;
    /// match extractor.extract(html) {
    ///     ListingPage::Found(ids) => assert_eq!(ids[0].as_str(), "2370727"),
    ///     other => panic!("unexpected {:?}", other),
    /// }
    /// ```
    pub fn extract(&self, html: &str) -> ListingPage {
        let document = Html::parse_document(html);
        let ids = self.match_ids(&document);

        if !ids.is_empty() {
            ListingPage::Found(ids)
        } else if document.select(&self.no_results_selector).next().is_some() {
            ListingPage::EmptyExhausted
        } else {
            ListingPage::EmptyTransient
        }
    }

    fn match_ids(&self, document: &Html) -> Vec<MatchId> {
        let mut ids: Vec<MatchId> = Vec::new();

        for element in document.select(&self.link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if let Some(caps) = self.id_pattern.captures(href) {
                let id = MatchId::new(&caps[1]);
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        ids
    }
}

/// Finds the detailed statistics link on a match overview page
///
/// The anchor is matched by its trimmed text and resolved against `base_url`.
pub fn find_stats_link(html: &str, link_text: &str, base_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").ok()?;

    document
        .select(&selector)
        .find(|element| cell_text(element) == link_text)
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| base_url.join(href.trim()).ok())
}

/// Parses the statistic tables at `indices` into one match record
///
/// Tables are counted in document order. Each table's first header is the
/// team name; it becomes the `team` value of every row and the first column
/// is renamed `players`. Cell text is kept verbatim.
pub fn parse_stats_tables(html: &str, indices: &[usize]) -> Result<MatchRecord, ParseError> {
    let document = Html::parse_document(html);
    let table_selector =
        Selector::parse("table").map_err(|e| ParseError::Selector(e.to_string()))?;
    let tables: Vec<ElementRef> = document.select(&table_selector).collect();

    let mut team_tables = Vec::with_capacity(indices.len());
    for &index in indices {
        let table = tables.get(index).ok_or(ParseError::MissingTable {
            index,
            found: tables.len(),
        })?;
        team_tables.push(parse_team_table(table, index)?);
    }

    Ok(MatchRecord::from_tables(team_tables))
}

fn parse_team_table(table: &ElementRef, index: usize) -> Result<TeamTable, ParseError> {
    let header_selector = Selector::parse("th").map_err(|e| ParseError::Selector(e.to_string()))?;
    let row_selector = Selector::parse("tr").map_err(|e| ParseError::Selector(e.to_string()))?;
    let cell_selector = Selector::parse("td").map_err(|e| ParseError::Selector(e.to_string()))?;

    let headers: Vec<String> = table
        .select(&header_selector)
        .map(|th| cell_text(&th))
        .collect();

    let Some((team, stat_columns)) = headers.split_first() else {
        return Err(ParseError::MissingHeader { index });
    };

    let mut rows = Vec::new();
    for row in table.select(&row_selector) {
        let cells: Vec<String> = row.select(&cell_selector).map(|td| cell_text(&td)).collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() != headers.len() {
            return Err(ParseError::RowWidth {
                index,
                expected: headers.len(),
                found: cells.len(),
            });
        }
        rows.push(cells);
    }

    Ok(TeamTable::new(team.clone(), stat_columns.to_vec(), rows))
}

/// Text of an element with every text node trimmed and empty nodes dropped
fn cell_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("")
}
