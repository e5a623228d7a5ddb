// SPDX-License-Identifier: MIT

//! The 1-second-tick scheduler loop (`spec.md` §4.4).
//!
//! Each package is visited in config declaration order and put through a
//! 5-step decision tree: skip disabled packages, sweep a stale `SYNC` into
//! `ERROR`, let an observed live worker job win over stale local state,
//! dispatch when due, and retry `ERROR` after `errorcontinuetime`. At most
//! one dispatch happens per package per tick (P8) — `decide` is called once
//! per package and its result fully determines that package's fate this
//! tick.
//!
//! The decide step runs under the state lock; the resulting dispatch (if
//! any) runs with the lock released, since a backend's `execute` is async
//! and may block on a subprocess launch. The lock is re-acquired only to
//! apply the outcome. This keeps the single state lock from ever being held
//! across an `.await`.

use crate::state::SharedState;
use mirrord_backends::{BackendContext, BackendRegistry, DispatchOutcome, WorkerDispatch};
use mirrord_core::event::Event;
use mirrord_core::{Clock, JobId, PackageId, PackageStatus};
use std::collections::HashSet;
use std::sync::Arc;

use crate::event_bus::EventBus;

/// Grace window after dispatch before a `SYNC` package with no observed live
/// job is swept to `ERROR`; matches the worker's own progress-polling cadence
/// rather than the 1s tick rate, so a slow-to-register job isn't punished.
const SYNC_GRACE_SECS: f64 = 60.0;

enum Decision {
    Skip,
    Transition(PackageStatus),
    Dispatch,
}

fn decide(
    status: PackageStatus,
    disabled: bool,
    syncrate: i64,
    lastsync: f64,
    job_id: &JobId,
    active_jobs: &HashSet<JobId>,
    now_secs: f64,
    errorcontinuetime: u64,
) -> Decision {
    if disabled {
        return Decision::Skip;
    }

    let worker_has_live_job = active_jobs.contains(job_id);

    if status == PackageStatus::Sync {
        if worker_has_live_job {
            return Decision::Skip;
        }
        if now_secs - lastsync < SYNC_GRACE_SECS {
            return Decision::Skip;
        }
        return Decision::Transition(PackageStatus::Error);
    }

    if worker_has_live_job {
        return Decision::Transition(PackageStatus::Sync);
    }

    if syncrate >= 0 && now_secs - lastsync > syncrate as f64 {
        return Decision::Dispatch;
    }

    if status == PackageStatus::Error && now_secs - lastsync > errorcontinuetime as f64 {
        return Decision::Dispatch;
    }

    Decision::Skip
}

pub struct Scheduler<C: Clock> {
    state: SharedState,
    registry: Arc<BackendRegistry>,
    dispatch: Arc<dyn WorkerDispatch>,
    events: EventBus,
    clock: C,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(
        state: SharedState,
        registry: Arc<BackendRegistry>,
        dispatch: Arc<dyn WorkerDispatch>,
        events: EventBus,
        clock: C,
    ) -> Self {
        Self { state, registry, dispatch, events, clock }
    }

    /// Run one tick. `active_jobs` is the worker's most recently polled
    /// `status().active_jobs` snapshot — the caller (`lifecycle`) is
    /// responsible for refreshing it once per tick before calling this.
    /// Returns the packages whose status changed, so the caller knows to
    /// persist.
    pub async fn tick(&self, active_jobs: &HashSet<JobId>) -> Vec<PackageId> {
        let now_secs = self.clock.epoch_secs_f64();
        let pkgids = { self.state.lock().packages.ids_in_order() };
        let mut changed = Vec::new();

        for pkgid in pkgids {
            let job_id = JobId::new(pkgid.0.clone());
            let plan = {
                let state = self.state.lock();
                let Some(pkg) = state.packages.get(&pkgid) else { continue };
                let errorcontinuetime = state.config.errorcontinuetime;
                let decision = decide(
                    pkg.status,
                    pkg.disabled,
                    pkg.syncrate,
                    pkg.lastsync,
                    &job_id,
                    active_jobs,
                    now_secs,
                    errorcontinuetime,
                );
                match decision {
                    Decision::Skip => None,
                    Decision::Transition(to) => Some((to, None)),
                    Decision::Dispatch => Some((PackageStatus::Sync, Some(pkg.clone()))),
                }
            };

            let Some((direct_target, dispatch_package)) = plan else { continue };

            self.events.publish_and_wait(Event::PackageStatusUpdatePre { pkgid: pkgid.clone() }).await;

            let final_target = match dispatch_package {
                None => Some(direct_target),
                Some(package) => {
                    let logfolder = self.state.lock().config.logfolder.clone();
                    let mirrorname = self.state.lock().config.name.clone();
                    let uid = self.state.lock().config.uid;
                    let gid = self.state.lock().config.gid;
                    let ctx = BackendContext::new(self.dispatch.as_ref(), uid, gid, &logfolder, &mirrorname);

                    match self.registry.get(&package.synctype) {
                        Some(backend) => match backend.execute(&package, &ctx).await {
                            Ok(DispatchOutcome::Dispatched) => {
                                let mut state = self.state.lock();
                                if let Some(pkg) = state.packages.get_mut(&pkgid) {
                                    pkg.lastsync = now_secs;
                                }
                                Some(PackageStatus::Sync)
                            }
                            Ok(DispatchOutcome::UpToDate) => {
                                let mut state = self.state.lock();
                                if let Some(pkg) = state.packages.get_mut(&pkgid) {
                                    pkg.lastsync = now_secs;
                                }
                                Some(PackageStatus::Active)
                            }
                            Err(err) => {
                                tracing::warn!(pkgid = %pkgid, error = %err, "dispatch failed");
                                Some(PackageStatus::Error)
                            }
                        },
                        None => {
                            tracing::error!(pkgid = %pkgid, synctype = %package.synctype, "no backend registered for synctype");
                            Some(PackageStatus::Error)
                        }
                    }
                }
            };

            if let Some(to) = final_target {
                let now_ms = self.clock.epoch_ms();
                let mut state = self.state.lock();
                if let Some(pkg) = state.packages.get_mut(&pkgid) {
                    if pkg.transition(to, now_ms).is_ok() {
                        changed.push(pkgid.clone());
                    }
                }
            }

            self.events.publish(Event::PackageStatusUpdatePost { pkgid: pkgid.clone() }).await;
        }

        changed
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
