//! Live snapshot vs. expected manifest comparison.
//!
//! Comparison is set equality over `(name, status)` pairs. Every deviation is a
//! mismatch: a differing status, a daemon missing from the snapshot, a daemon
//! the manifest does not list, or a daemon reported twice.

use std::collections::HashMap;
use std::fmt;

use nodewatch_core::{DaemonName, DaemonState, DaemonStatus, NodeManifest};

/// One way a live snapshot departs from its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deviation {
    StatusDiffers {
        name: DaemonName,
        expected: DaemonStatus,
        actual: DaemonStatus,
    },
    Missing {
        name: DaemonName,
        expected: DaemonStatus,
    },
    Unexpected {
        name: DaemonName,
        actual: DaemonStatus,
    },
    Duplicate {
        name: DaemonName,
    },
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deviation::StatusDiffers {
                name,
                expected,
                actual,
            } => write!(f, "{name} is {actual}, expected {expected}"),
            Deviation::Missing { name, expected } => {
                write!(f, "{name} missing from snapshot, expected {expected}")
            }
            Deviation::Unexpected { name, actual } => {
                write!(f, "{name} ({actual}) is not in the manifest")
            }
            Deviation::Duplicate { name } => write!(f, "{name} reported more than once"),
        }
    }
}

/// `true` when `live` does not match `expected` exactly.
pub fn compare(live: &[DaemonState], expected: &NodeManifest) -> bool {
    !differences(live, expected).is_empty()
}

/// Every deviation, manifest entries first (in manifest order), then extras
/// and duplicates in snapshot order.
pub fn differences(live: &[DaemonState], expected: &NodeManifest) -> Vec<Deviation> {
    let mut observed: HashMap<&DaemonName, DaemonStatus> = HashMap::with_capacity(live.len());
    let mut deviations = Vec::new();
    let mut extras = Vec::new();

    for state in live {
        if observed.insert(&state.name, state.status).is_some() {
            extras.push(Deviation::Duplicate {
                name: state.name.clone(),
            });
        } else if expected.expected(&state.name).is_none() {
            extras.push(Deviation::Unexpected {
                name: state.name.clone(),
                actual: state.status,
            });
        }
    }

    for entry in expected.entries() {
        match observed.get(&entry.name) {
            None => deviations.push(Deviation::Missing {
                name: entry.name.clone(),
                expected: entry.status,
            }),
            Some(actual) if *actual != entry.status => deviations.push(Deviation::StatusDiffers {
                name: entry.name.clone(),
                expected: entry.status,
                actual: *actual,
            }),
            Some(_) => {}
        }
    }

    deviations.extend(extras);
    deviations
}
