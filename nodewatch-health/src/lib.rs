//! # nodewatch-health
//!
//! Node health evaluation: daemon snapshot vs. role manifest, plus a log
//! readiness marker.
//!
//! Build a [`HealthChecker`] over any [`nodewatch_core::ProcessStatusProvider`]
//! and call [`HealthChecker::check`] once per probe tick.

pub mod aggregator;
pub mod comparator;
pub mod readiness;

pub use aggregator::HealthChecker;
pub use comparator::{compare, differences, Deviation};
pub use readiness::LogReadinessProbe;
