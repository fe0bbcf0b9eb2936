//! Code for working with snapshots.
//!
//! A snapshot is a single point in time (here, one hour) at which energy balance is enforced and
//! operating costs are accounted for.
use crate::units::Hours;
use anyhow::{Context, Result, bail, ensure};
use chrono::{NaiveDateTime, TimeDelta};
use itertools::Itertools;
use log::warn;
use std::fmt::Display;

/// The timestamp formats accepted when parsing snapshots
const SNAPSHOT_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

/// A single decision epoch of the optimisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Snapshot(pub NaiveDateTime);

impl Snapshot {
    /// Parse a snapshot from a timestamp string
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        for format in SNAPSHOT_FORMATS {
            if let Ok(timestamp) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self(timestamp));
            }
        }

        bail!("Invalid timestamp for snapshot: '{s}'")
    }
}

impl Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

/// Information about the snapshots in a model: their order and weighting.
///
/// Every time series attached to a model must have exactly one value per snapshot, in the same
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    snapshots: Vec<Snapshot>,
    weighting: Hours,
}

impl SnapshotInfo {
    /// Create a new [`SnapshotInfo`].
    ///
    /// # Arguments
    ///
    /// * `snapshots` - The snapshots, which must be unique and in chronological order
    /// * `weighting` - The duration each snapshot represents
    pub fn new(snapshots: Vec<Snapshot>, weighting: Hours) -> Result<Self> {
        ensure!(!snapshots.is_empty(), "At least one snapshot is required");
        ensure!(
            weighting.is_finite() && weighting > Hours(0.0),
            "Snapshot weighting must be a finite number greater than zero"
        );
        check_snapshot_order(&snapshots)?;
        warn_if_irregular(&snapshots);

        Ok(Self {
            snapshots,
            weighting,
        })
    }

    /// The number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether there are no snapshots (never true for a validated [`SnapshotInfo`])
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The duration represented by each snapshot
    pub fn weighting(&self) -> Hours {
        self.weighting
    }

    /// The total duration covered by all snapshots
    pub fn total_duration(&self) -> Hours {
        self.snapshots.iter().map(|_| self.weighting).sum()
    }

    /// Check that a time series has one value per snapshot
    pub fn check_series_length<T>(&self, series: &[T]) -> Result<()> {
        ensure!(
            series.len() == self.len(),
            "Time series has {} values, but there are {} snapshots",
            series.len(),
            self.len()
        );

        Ok(())
    }
}

/// Check that snapshots are unique and in chronological order
fn check_snapshot_order(snapshots: &[Snapshot]) -> Result<()> {
    for (prev, next) in snapshots.iter().tuple_windows() {
        ensure!(prev != next, "Duplicate snapshot found: {next}");
        ensure!(
            prev < next,
            "Snapshots must be in chronological order ({next} follows {prev})"
        );
    }

    Ok(())
}

/// Log a warning if the spacing between consecutive snapshots is not constant
fn warn_if_irregular(snapshots: &[Snapshot]) {
    if let Some((prev, next, step)) = find_irregular_gap(snapshots) {
        warn!(
            "Snapshots are not regularly spaced: gap between {prev} and {next} differs from {} \
            minutes. Missing snapshots will not be filled in.",
            step.num_minutes()
        );
    }
}

/// Find the first pair of consecutive snapshots whose spacing differs from the first step
fn find_irregular_gap(snapshots: &[Snapshot]) -> Option<(&Snapshot, &Snapshot, TimeDelta)> {
    let step = get_step(snapshots)?;
    snapshots
        .iter()
        .tuple_windows()
        .find(|(prev, next)| next.0 - prev.0 != step)
        .map(|(prev, next)| (prev, next, step))
}

/// Get the time between the first two snapshots, if there are at least two
fn get_step(snapshots: &[Snapshot]) -> Option<TimeDelta> {
    match snapshots {
        [first, second, ..] => Some(second.0 - first.0),
        _ => None,
    }
}

/// Parse a snapshot, including the row number in any error message
pub fn parse_snapshot_for_row(s: &str, row: usize) -> Result<Snapshot> {
    Snapshot::parse(s).with_context(|| format!("Could not parse snapshot on row {row}"))
}
