//! End-of-match summary tables and JSON reports.
//!
//! Tables are rendered as ASCII grids:
//!
//! ```text
//! +-----------+---------+
//! | Caploss   |   alpha |
//! +===========+=========+
//! | Standard  |      45 |
//! +-----------+---------+
//! ```
//!
//! Numeric columns are right-aligned, everything else left-aligned.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use halint_core::caploss::CapLossKind;
use halint_core::math::Fixed;
use halint_core::notify::Notification;
use halint_core::stats::{LintStats, EFFICIENCY_SEGMENTS, OVERFLOW_KINDS};
use serde::{Deserialize, Serialize};

/// A header row plus body rows of pre-formatted cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Empty table with the given headers.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Body rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    fn cell<'a>(row: &'a [String], column: usize) -> &'a str {
        row.get(column).map_or("", String::as_str)
    }

    fn is_numeric(&self, column: usize) -> bool {
        !self.rows.is_empty()
            && self.rows.iter().all(|row| {
                let cell = Self::cell(row, column);
                !cell.is_empty() && cell.parse::<f64>().is_ok()
            })
    }

    /// Render as an ASCII grid.
    #[must_use]
    pub fn render(&self) -> String {
        let columns = self.column_count();
        let widths: Vec<usize> = (0..columns)
            .map(|c| {
                let header = Self::cell(&self.headers, c).chars().count() + 2;
                self.rows
                    .iter()
                    .map(|row| Self::cell(row, c).chars().count())
                    .fold(header, usize::max)
            })
            .collect();
        let numeric: Vec<bool> = (0..columns).map(|c| self.is_numeric(c)).collect();

        let rule = |fill: char| {
            let mut line = String::from("+");
            for &w in &widths {
                line.extend(std::iter::repeat(fill).take(w + 2));
                line.push('+');
            }
            line
        };
        let line = |row: &[String]| {
            let mut out = String::from("|");
            for (c, &w) in widths.iter().enumerate() {
                let cell = Self::cell(row, c);
                if numeric[c] {
                    let _ = write!(out, " {cell:>w$} |");
                } else {
                    let _ = write!(out, " {cell:<w$} |");
                }
            }
            out
        };

        let mut out = Vec::with_capacity(self.rows.len() * 2 + 3);
        out.push(rule('-'));
        out.push(line(&self.headers));
        out.push(rule('='));
        for row in &self.rows {
            out.push(line(row));
            out.push(rule('-'));
        }
        if self.rows.is_empty() {
            out.push(rule('-'));
        }
        out.join("\n")
    }
}

/// Three decimals, the way ratios are shown in every table.
#[must_use]
pub fn format_ratio(value: Fixed) -> String {
    format!("{value:.3}")
}

fn player_headers(first: &str, stats: &LintStats) -> Vec<String> {
    std::iter::once(first.to_string())
        .chain(stats.players().map(|(_, name)| name.to_string()))
        .chain(std::iter::once("TOTAL".to_string()))
        .collect()
}

/// Merge and production cap loss, one column per player. Movement excluded.
#[must_use]
pub fn cap_loss_table(stats: &LintStats) -> Table {
    let mut table = Table::new(player_headers("Caploss", stats));
    for kind in OVERFLOW_KINDS {
        table.push_row(
            std::iter::once(kind.label().to_string())
                .chain(stats.players().map(|(id, _)| stats.cap_loss(kind, id).to_string()))
                .chain(std::iter::once(stats.cap_loss_total(kind).to_string())),
        );
    }
    table.push_row(
        std::iter::once("TOTAL".to_string())
            .chain(stats.players().map(|(id, _)| stats.overflow_loss(id).to_string()))
            .chain(std::iter::once(stats.overflow_loss_total().to_string())),
    );
    table
}

/// Production forfeited by moving, per player.
#[must_use]
pub fn movement_table(stats: &LintStats) -> Table {
    let mut table = Table::new(["", "Prod cost from moves", "Total moves", "Prod cost per move"]);
    for (id, name) in stats.players() {
        table.push_row([
            name.to_string(),
            stats.cap_loss(CapLossKind::Movement, id).to_string(),
            stats.total_moves(id).to_string(),
            stats
                .production_cost_per_move(id)
                .map_or_else(|| "n/a".to_string(), format_ratio),
        ]);
    }
    table
}

/// Share of held squares moved, by fifth of the game.
#[must_use]
pub fn efficiency_table(stats: &LintStats) -> Table {
    let headers = std::iter::once("Move %".to_string())
        .chain((1..=EFFICIENCY_SEGMENTS).map(|n| format!("{n} / {EFFICIENCY_SEGMENTS}")));
    let mut table = Table::new(headers);
    for (id, name) in stats.players() {
        table.push_row(
            std::iter::once(name.to_string())
                .chain(stats.move_efficiency(id).into_iter().map(format_ratio)),
        );
    }
    table
}

/// Cumulative overkill, attacker rows by defender columns.
#[must_use]
pub fn overkill_table(stats: &LintStats) -> Table {
    let mut table = Table::new(player_headers("from / to", stats));
    for (attacker, name) in stats.players() {
        table.push_row(
            std::iter::once(name.to_string())
                .chain(
                    stats
                        .players()
                        .map(|(defender, _)| stats.overkill(attacker, defender).to_string()),
                )
                .chain(std::iter::once(stats.overkill_from(attacker).to_string())),
        );
    }
    table.push_row(
        std::iter::once("TOTAL".to_string())
            .chain(
                stats
                    .players()
                    .map(|(defender, _)| stats.overkill_against(defender).to_string()),
            )
            .chain(std::iter::once(stats.overkill_total().to_string())),
    );
    table
}

/// All end-of-match tables, each preceded by a blank line.
#[must_use]
pub fn render_summary(stats: &LintStats) -> String {
    let mut out = String::new();
    for table in [cap_loss_table(stats), movement_table(stats), efficiency_table(stats)] {
        out.push('\n');
        out.push_str(&table.render());
        out.push('\n');
    }
    out.push_str("\nCumulative overkill\n");
    out.push_str(&overkill_table(stats).render());
    out.push('\n');
    out
}

/// Machine-readable result of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Replay file as given.
    pub file: String,
    /// Final accumulators.
    pub stats: LintStats,
    /// Notifications in emission order.
    pub notifications: Vec<Notification>,
    /// Production forfeited per move, by player name.
    pub production_cost_per_move: BTreeMap<String, Option<Fixed>>,
    /// Move efficiency by fifth of the game, by player name.
    pub move_efficiency: BTreeMap<String, [Fixed; EFFICIENCY_SEGMENTS]>,
}

impl MatchReport {
    /// Collect the report for a finished match.
    #[must_use]
    pub fn new(file: impl Into<String>, stats: LintStats, notifications: Vec<Notification>) -> Self {
        let production_cost_per_move = stats
            .players()
            .map(|(id, name)| (name.to_string(), stats.production_cost_per_move(id)))
            .collect();
        let move_efficiency = stats
            .players()
            .map(|(id, name)| (name.to_string(), stats.move_efficiency(id)))
            .collect();
        Self {
            file: file.into(),
            stats,
            notifications,
            production_cost_per_move,
            move_efficiency,
        }
    }

    /// Save report to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load report from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}
