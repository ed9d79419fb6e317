use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use crossbeam_channel::unbounded;

use super::*;
use crate::error::DecodeError;
use crate::library::Catalog;
use crate::segment::testing::{MemoryDecoder, entry};
use crate::segment::{Link, SegmentGraph};

const WAIT: Duration = Duration::from_secs(5);

fn catalog_with(decoder: &MemoryDecoder, tracks: &[(&str, &[(&str, usize)])]) -> (CatalogHandle, Vec<TrackId>) {
    let mut catalog = Catalog::new();
    let ids = tracks
        .iter()
        .map(|(path, segments)| {
            decoder.linear(*path, segments);
            catalog.add(*path, None).unwrap().unwrap()
        })
        .collect();
    (catalog.into_handle(), ids)
}

fn duration_of(catalog: &CatalogHandle, id: TrackId) -> Option<Duration> {
    lock_catalog(catalog).track(id).and_then(|t| t.duration)
}

#[test]
fn pool_runs_every_job_before_drop_returns() {
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let pool = WorkerPool::new("test", 3).unwrap();
        assert_eq!(pool.size(), 3);
        for _ in 0..20 {
            let counter = counter.clone();
            assert!(pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
    }
    assert_eq!(counter.load(Ordering::SeqCst), 20);
}

#[test]
fn zero_sized_pool_still_gets_one_worker() {
    let pool = WorkerPool::new("test", 0).unwrap();
    assert_eq!(pool.size(), 1);
}

#[test]
fn estimate_writes_the_duration_back() {
    let decoder = MemoryDecoder::new();
    let (catalog, ids) = catalog_with(&decoder, &[("/m/a.mus", &[("A", 100), ("B", 250)])]);
    let (tx, rx) = unbounded();
    let estimator = DurationEstimator::new(
        Arc::new(WorkerPool::new("test", 1).unwrap()),
        Arc::new(decoder),
        catalog.clone(),
    )
    .with_reports(tx);

    assert!(estimator.estimate(ids[0]));
    let report = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(report.id, ids[0]);
    assert_eq!(report.result.unwrap(), Duration::from_millis(350));
    assert_eq!(duration_of(&catalog, ids[0]), Some(Duration::from_millis(350)));
    assert!(!lock_catalog(&catalog).track(ids[0]).unwrap().pending);
}

#[test]
fn estimation_terminates_on_cyclic_graphs() {
    let decoder = MemoryDecoder::new();
    decoder.insert(
        "/m/loop.mus",
        vec![entry("A", Link::Continue(1)), entry("B", Link::Continue(0))],
        &[("A", 40), ("B", 60)],
    );
    let mut catalog = Catalog::new();
    let id = catalog.add("/m/loop.mus", None).unwrap().unwrap();
    let catalog = catalog.into_handle();

    let (tx, rx) = unbounded();
    let estimator = DurationEstimator::new(
        Arc::new(WorkerPool::new("test", 1).unwrap()),
        Arc::new(decoder),
        catalog.clone(),
    )
    .with_reports(tx);
    estimator.estimate(id);
    assert_eq!(rx.recv_timeout(WAIT).unwrap().result.unwrap(), Duration::from_millis(100));
}

#[test]
fn failed_estimation_clears_pending_and_keeps_duration_unknown() {
    let decoder = MemoryDecoder::new();
    let (catalog, ids) = catalog_with(&decoder, &[("/m/a.mus", &[("A", 10), ("B", 10)])]);
    decoder.break_segment("B");
    let (tx, rx) = unbounded();
    let estimator = DurationEstimator::new(
        Arc::new(WorkerPool::new("test", 1).unwrap()),
        Arc::new(decoder),
        catalog.clone(),
    )
    .with_reports(tx);

    estimator.estimate(ids[0]);
    let report = rx.recv_timeout(WAIT).unwrap();
    assert!(matches!(report.result, Err(Error::Decode(DecodeError::Segment { .. }))));
    let catalog = lock_catalog(&catalog);
    let track = catalog.track(ids[0]).unwrap();
    assert!(!track.pending);
    assert_eq!(track.duration, None);
}

#[test]
fn estimate_unknown_skips_known_and_pending_tracks() {
    let decoder = MemoryDecoder::new();
    let (catalog, ids) = catalog_with(
        &decoder,
        &[
            ("/m/a.mus", &[("A", 10)]),
            ("/m/b.mus", &[("B", 20)]),
            ("/m/c.mus", &[("C", 30)]),
        ],
    );
    {
        let mut c = lock_catalog(&catalog);
        c.set_duration(ids[0], Duration::from_secs(1));
        c.mark_pending(ids[1]);
    }
    let (tx, rx) = unbounded();
    let estimator = DurationEstimator::new(
        Arc::new(WorkerPool::new("test", 2).unwrap()),
        Arc::new(decoder),
        catalog.clone(),
    )
    .with_reports(tx);

    assert_eq!(estimator.estimate_unknown(), 1);
    assert_eq!(rx.recv_timeout(WAIT).unwrap().id, ids[2]);
    assert!(!estimator.estimate(TrackId(999)));
}

/// Blocks inside `open` until the test lets it through.
struct GatedDecoder {
    inner: MemoryDecoder,
    entered: Mutex<mpsc::Sender<()>>,
    gate: Mutex<mpsc::Receiver<()>>,
}

impl SegmentDecoder for GatedDecoder {
    fn open(&self, path: &Path) -> std::result::Result<SegmentGraph, DecodeError> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.gate.lock().unwrap().recv().unwrap();
        self.inner.open(path)
    }
}

fn gated(inner: MemoryDecoder) -> (GatedDecoder, mpsc::Receiver<()>, mpsc::Sender<()>) {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (gate_tx, gate_rx) = mpsc::channel();
    let decoder = GatedDecoder {
        inner,
        entered: Mutex::new(entered_tx),
        gate: Mutex::new(gate_rx),
    };
    (decoder, entered_rx, gate_tx)
}

#[test]
fn job_for_a_removed_track_is_cancelled_silently() {
    let inner = MemoryDecoder::new();
    let (catalog, ids) = catalog_with(&inner, &[("/m/a.mus", &[("A", 10)]), ("/m/b.mus", &[("B", 20)])]);
    let (decoder, entered, gate) = gated(inner);
    let (tx, rx) = unbounded();
    let estimator = DurationEstimator::new(
        Arc::new(WorkerPool::new("test", 1).unwrap()),
        Arc::new(decoder),
        catalog.clone(),
    )
    .with_reports(tx);

    // The single worker is held inside the first job while the second track goes away.
    estimator.estimate(ids[0]);
    estimator.estimate(ids[1]);
    entered.recv_timeout(WAIT).unwrap();
    lock_catalog(&catalog).remove(ids[1]).unwrap();
    gate.send(()).unwrap();

    assert_eq!(rx.recv_timeout(WAIT).unwrap().id, ids[0]);
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn track_removed_mid_job_gets_no_write_back() {
    let inner = MemoryDecoder::new();
    let (catalog, ids) = catalog_with(&inner, &[("/m/a.mus", &[("A", 10)])]);
    let (decoder, entered, gate) = gated(inner);
    let (tx, rx) = unbounded();
    let estimator = DurationEstimator::new(
        Arc::new(WorkerPool::new("test", 1).unwrap()),
        Arc::new(decoder),
        catalog.clone(),
    )
    .with_reports(tx);

    estimator.estimate(ids[0]);
    entered.recv_timeout(WAIT).unwrap();
    let removed = lock_catalog(&catalog).remove(ids[0]).unwrap();
    assert!(removed.is_some());
    gate.send(()).unwrap();

    // The job still completes; the catalog simply no longer has the track.
    let report = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(report.result.unwrap(), Duration::from_millis(10));
    assert!(lock_catalog(&catalog).track(ids[0]).is_none());
}
