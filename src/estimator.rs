//! Background duration estimation.
//!
//! Tracks without a known length are decoded on a worker pool and the sum of
//! one pass over their segment graph is written back into the catalog.

mod pool;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::library::{CatalogHandle, TrackId, lock_catalog};
use crate::segment::SegmentDecoder;

pub use pool::WorkerPool;

/// Outcome of one estimation job. Cancelled jobs are not reported.
#[derive(Debug)]
pub struct EstimateReport {
    pub id: TrackId,
    pub result: Result<Duration>,
}

pub struct DurationEstimator {
    pool: Arc<WorkerPool>,
    decoder: Arc<dyn SegmentDecoder>,
    catalog: CatalogHandle,
    reports: Option<Sender<EstimateReport>>,
}

impl DurationEstimator {
    pub fn new(pool: Arc<WorkerPool>, decoder: Arc<dyn SegmentDecoder>, catalog: CatalogHandle) -> Self {
        Self {
            pool,
            decoder,
            catalog,
            reports: None,
        }
    }

    /// Send every finished job's outcome to `reports`.
    pub fn with_reports(mut self, reports: Sender<EstimateReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Queue a duration job for `id`. Returns `false` if the track is unknown
    /// or the pool refused the job.
    pub fn estimate(&self, id: TrackId) -> bool {
        let path = {
            let mut catalog = lock_catalog(&self.catalog);
            let Some(path) = catalog.track(id).map(|t| t.path.clone()) else {
                return false;
            };
            catalog.mark_pending(id);
            path
        };

        let decoder = self.decoder.clone();
        let catalog = self.catalog.clone();
        let reports = self.reports.clone();
        let queued = self.pool.execute(move || {
            let result = run_job(id, &path, decoder.as_ref(), &catalog);
            match &result {
                Ok(duration) => debug!(%id, ?duration, "duration estimated"),
                Err(Error::Cancelled) => {
                    debug!(%id, "track left the catalog before estimation");
                    return;
                }
                Err(e) => {
                    warn!(%id, path = %path.display(), error = %e, "duration estimation failed");
                    lock_catalog(&catalog).clear_pending(id);
                }
            }
            if let Some(tx) = reports {
                let _ = tx.send(EstimateReport { id, result });
            }
        });

        if !queued {
            lock_catalog(&self.catalog).clear_pending(id);
        }
        queued
    }

    /// Queue a job for every track whose length is unknown and not already
    /// being estimated. Returns how many were queued.
    pub fn estimate_unknown(&self) -> usize {
        let ids: Vec<TrackId> = lock_catalog(&self.catalog)
            .available()
            .iter()
            .filter(|t| t.duration.is_none() && !t.pending)
            .map(|t| t.id)
            .collect();
        let queued = ids.into_iter().filter(|id| self.estimate(*id)).count();
        if queued > 0 {
            info!(tracks = queued, workers = self.pool.size(), "estimating track durations");
        }
        queued
    }
}

/// Decode `path` once and write its length back.
///
/// Presence is checked only when the job starts; a track removed while it
/// is being decoded simply receives no write-back.
fn run_job(id: TrackId, path: &Path, decoder: &dyn SegmentDecoder, catalog: &CatalogHandle) -> Result<Duration> {
    if !lock_catalog(catalog).contains(id) {
        return Err(Error::Cancelled);
    }
    let duration = {
        let mut graph = decoder.open(path)?;
        graph.total_duration()?
    };
    if !lock_catalog(catalog).set_duration(id, duration) {
        debug!(%id, "track removed during estimation");
    }
    Ok(duration)
}

#[cfg(test)]
mod tests;
