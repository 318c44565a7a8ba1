//! Snapshot checkout.
//!
//! ## Pipeline (in order):
//! 1. Baseline = applied snapshot (`NoBaseline` if none)
//! 2. Drift check: baseline fingerprint vs live ledger fingerprint
//!    (`InconsistentState` unless forced)
//! 3. Content-equal target: `NoOp`, nothing touched
//! 4. Empty target: `EmptyTarget`
//! 5. Executor brings every unit to the target's recorded version
//! 6. One transaction: unflag baseline, flag target
//!
//! Direction is never inferred from ids; the executor always receives the
//! complete target set.

use migsnap_core::errors::{ExError, ExErrorKind, SnapshotError};
use migsnap_core::executor::{ExecutorError, MigrationExecutor};
use migsnap_core::model::{MigrationPair, Snapshot};
use migsnap_core::{log_op_end, log_op_error, log_op_start};
use migsnap_store::errors::{persistence, Result};
use migsnap_store::ledger;
use migsnap_store::snapshot::{persist, query};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::time::Instant;

/// What a checkout did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Target already matches the baseline; `name` is the baseline's
    NoOp { name: String },
    /// Schema moved and the applied flag moved with it
    Committed { from: String, to: String },
}

/// Ledger drift detected by a forced checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub baseline: String,
    pub baseline_fingerprint: String,
    pub live_fingerprint: String,
    /// Latest ledger pairs the baseline does not record
    pub only_in_ledger: Vec<MigrationPair>,
    /// Baseline pairs no longer latest in the ledger
    pub only_in_baseline: Vec<MigrationPair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReport {
    pub outcome: CheckoutOutcome,
    /// Present only when `force` overrode detected drift
    pub drift: Option<DriftReport>,
}

impl CheckoutReport {
    pub fn is_noop(&self) -> bool {
        matches!(self.outcome, CheckoutOutcome::NoOp { .. })
    }

    /// Drift was overwritten by the executor. A forced no-op leaves the
    /// drifted ledger in place.
    pub fn drift_discarded(&self) -> bool {
        self.drift.is_some() && !self.is_noop()
    }
}

/// Make `target` the applied snapshot, moving schema through `executor`.
///
/// # Errors
///
/// - `NoBaseline`: no snapshot is applied
/// - `InconsistentState`: ledger drifted from the baseline and `force` is false
/// - `EmptyTarget`: target records no members
/// - `MissingMigration` / `UnresolvableTarget`: executor rejected the targets;
///   the error carries every requested pair
/// - `ExternalService`: any other executor failure
/// - `Persistence`: SQLite failure; flags are unchanged
pub fn checkout(
    conn: &mut Connection,
    target: &Snapshot,
    force: bool,
    executor: &dyn MigrationExecutor,
    bookkeeping_unit: &str,
) -> Result<CheckoutReport> {
    let start = Instant::now();
    log_op_start!(
        "checkout",
        snapshot_name = target.name.as_str(),
        force = force
    );

    let result = checkout_inner(conn, target, force, executor, bookkeeping_unit);

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(report) => {
            log_op_end!(
                "checkout",
                duration_ms = duration_ms,
                noop = report.is_noop(),
                drift_detected = report.drift.is_some(),
                drift_discarded = report.drift_discarded()
            );
        }
        Err(e) => {
            log_op_error!("checkout", e.clone(), duration_ms = duration_ms);
        }
    }
    result
}

fn checkout_inner(
    conn: &mut Connection,
    target: &Snapshot,
    force: bool,
    executor: &dyn MigrationExecutor,
    bookkeeping_unit: &str,
) -> Result<CheckoutReport> {
    let baseline = query::get_applied(conn)?
        .ok_or_else(|| ExError::from(SnapshotError::NoBaseline).with_op("checkout"))?;

    let live = ledger::latest_applied(conn, bookkeeping_unit)?;
    let live_fingerprint = ledger::fingerprint_entries(&live);

    let drift = if baseline.fingerprint() != live_fingerprint {
        if !force {
            return Err(ExError::from(SnapshotError::InconsistentState {
                baseline: baseline.name.clone(),
                baseline_fingerprint: baseline.fingerprint().to_string(),
                live_fingerprint,
            })
            .with_op("checkout"));
        }
        let live_pairs: Vec<MigrationPair> = live.iter().map(|e| e.pair()).collect();
        let report = drift_report(&baseline, &live_pairs, live_fingerprint);
        tracing::warn!(
            component = module_path!(),
            op = "checkout",
            baseline = %report.baseline,
            baseline_fingerprint = %report.baseline_fingerprint,
            live_fingerprint = %report.live_fingerprint,
            only_in_ledger = report.only_in_ledger.len(),
            only_in_baseline = report.only_in_baseline.len(),
            "Ledger drifted from the applied snapshot; continuing because force is set"
        );
        Some(report)
    } else {
        None
    };

    if target.content_equals(&baseline) {
        return Ok(CheckoutReport {
            outcome: CheckoutOutcome::NoOp {
                name: baseline.name,
            },
            drift,
        });
    }

    if target.is_empty() {
        return Err(ExError::from(SnapshotError::EmptyTarget {
            name: target.name.clone(),
        })
        .with_op("checkout"));
    }

    let targets = target.pairs();
    executor
        .migrate(&targets)
        .map_err(|e| translate_executor_error(e, &target.name, targets.clone()))?;

    let tx = conn
        .transaction()
        .map_err(|e| persistence("checkout", e))?;
    persist::clear_applied_tx(&tx, baseline.id)?;
    persist::mark_applied_exclusive_tx(&tx, target.id)?;
    tx.commit().map_err(|e| persistence("checkout", e))?;

    Ok(CheckoutReport {
        outcome: CheckoutOutcome::Committed {
            from: baseline.name,
            to: target.name.clone(),
        },
        drift,
    })
}

fn drift_report(
    baseline: &Snapshot,
    live_pairs: &[MigrationPair],
    live_fingerprint: String,
) -> DriftReport {
    let recorded: BTreeSet<MigrationPair> = baseline.pairs().into_iter().collect();
    let live: BTreeSet<MigrationPair> = live_pairs.iter().cloned().collect();

    DriftReport {
        baseline: baseline.name.clone(),
        baseline_fingerprint: baseline.fingerprint().to_string(),
        live_fingerprint,
        only_in_ledger: live.difference(&recorded).cloned().collect(),
        only_in_baseline: recorded.difference(&live).cloned().collect(),
    }
}

/// Map an executor failure onto the canonical error, keeping the full target
/// list for diagnostics.
fn translate_executor_error(
    err: ExecutorError,
    snapshot: &str,
    requested: Vec<MigrationPair>,
) -> ExError {
    match err {
        ExecutorError::UnknownMigration { detail } => {
            ExError::from(SnapshotError::MissingMigration {
                snapshot: snapshot.to_string(),
                requested,
            })
            .with_op("checkout")
            .with_source(ExError::new(ExErrorKind::ExternalService).with_message(detail))
        }
        ExecutorError::NodeNotFound(message) => {
            ExError::from(SnapshotError::UnresolvableTarget {
                snapshot: snapshot.to_string(),
                message,
                requested,
            })
            .with_op("checkout")
        }
        ExecutorError::Failed(message) => ExError::new(ExErrorKind::ExternalService)
            .with_op("checkout")
            .with_entity_id(snapshot)
            .with_message(message)
            .with_targets(requested),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use migsnap_core::model::{LedgerEntry, SnapshotMember};

    fn snapshot(name: &str, pairs: &[(&str, &str)]) -> Snapshot {
        let members = pairs
            .iter()
            .enumerate()
            .map(|(i, (u, v))| {
                SnapshotMember::from_ledger(
                    1,
                    &LedgerEntry {
                        id: i as i64,
                        unit: u.to_string(),
                        version: v.to_string(),
                    },
                )
            })
            .collect();
        Snapshot::new(1, name, Utc::now(), true, members)
    }

    #[test]
    fn test_drift_report_lists_both_sides() {
        let baseline = snapshot("base", &[("a", "0001"), ("b", "0002")]);
        let live = vec![MigrationPair::new("a", "0001"), MigrationPair::new("b", "0003")];

        let drift = drift_report(&baseline, &live, "live".to_string());
        assert_eq!(drift.only_in_ledger, vec![MigrationPair::new("b", "0003")]);
        assert_eq!(drift.only_in_baseline, vec![MigrationPair::new("b", "0002")]);
        assert_eq!(drift.baseline, "base");
    }

    #[test]
    fn test_unknown_migration_carries_all_targets() {
        let requested = vec![MigrationPair::new("a", "1"), MigrationPair::new("b", "2")];
        let err = translate_executor_error(
            ExecutorError::UnknownMigration {
                detail: "b.2".to_string(),
            },
            "snap",
            requested.clone(),
        );
        assert_eq!(err.kind(), ExErrorKind::MissingMigration);
        assert_eq!(err.targets(), Some(requested.as_slice()));
        assert!(err.message().contains("* Unit: b ; Migration: 2"));
        assert_eq!(err.source_error().map(|s| s.message()), Some("b.2"));
    }

    #[test]
    fn test_node_not_found_message_is_verbatim() {
        let err = translate_executor_error(
            ExecutorError::NodeNotFound("Node ('b', '2') not a valid node".to_string()),
            "snap",
            vec![],
        );
        assert_eq!(err.kind(), ExErrorKind::UnresolvableTarget);
        assert_eq!(err.message(), "Node ('b', '2') not a valid node");
    }

    #[test]
    fn test_other_failures_are_external() {
        let err = translate_executor_error(
            ExecutorError::Failed("boom".to_string()),
            "snap",
            vec![MigrationPair::new("a", "1")],
        );
        assert_eq!(err.kind(), ExErrorKind::ExternalService);
        assert_eq!(err.entity_id(), Some("snap"));
        assert!(err.targets().is_some());
    }
}
