//! # Orchestrator Module
//!
//! Drives a full scan through its phases: enumerate candidates, score
//! blur, group exact duplicates, detect visually similar pairs.
//!
//! The orchestrator runs synchronously on whatever thread calls
//! [`ScanOrchestrator::run`]; the CLI gives it a dedicated worker thread
//! and consumes progress from the event channel. Cancellation is
//! cooperative through a shared flag checked between items and before
//! each phase; when observed, caches are flushed and a final checkpoint
//! is written so the scan can resume where it stopped.
//!
//! `run` never returns an error. Per-item failures become
//! [`ErrorRecord`]s and the scan continues; only a failure to enumerate
//! the root ends the scan early, with status [`ScanStatus::Failed`] and
//! whatever was collected so far.

use crate::config::{ScanSettings, SimilarityMode};
use crate::core::blur::BlurScorer;
use crate::core::cache::{mtime_seconds, CacheKind, CacheStore};
use crate::core::duplicate;
use crate::core::report::{
    BlurResult, ErrorRecord, Operation, ScanResults, SimilarPair,
};
use crate::core::scanner::{FileEnumerator, ImageFile};
use crate::core::similar::{candidate_pairs, phash, SimilarityDetector};
use crate::core::state::{self, ScanState};
use crate::error::TriageError;
use crate::events::{Event, EventSender, ProgressThrottle, ScanEvent, ScanPhase};
use image_hasher::ImageHash;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// How a scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// All phases ran to the end
    Completed,
    /// A cancellation request was honored; a checkpoint was left behind
    Cancelled,
    /// The scan could not proceed; partial results are still returned
    Failed,
}

/// Final product of [`ScanOrchestrator::run`]
#[derive(Debug)]
pub struct ScanOutcome {
    pub status: ScanStatus,
    pub results: ScanResults,
}

/// Runs scans over a directory of photos
pub struct ScanOrchestrator {
    settings: ScanSettings,
    events: EventSender,
    cancel: Arc<AtomicBool>,
}

impl ScanOrchestrator {
    /// Build an orchestrator; settings are validated here, once
    pub fn new(settings: ScanSettings, events: EventSender) -> Result<Self, TriageError> {
        settings.validate()?;
        Ok(Self {
            settings,
            events,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared flag; set it to true to request cancellation
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Run a full scan over `directory`.
    ///
    /// With `resume` set, a matching checkpoint in the directory is picked
    /// up and already-processed items are skipped; without it (or without
    /// a usable checkpoint) the scan starts fresh.
    pub fn run(&self, directory: &Path, resume: bool) -> ScanOutcome {
        let directory = fs::canonicalize(directory).unwrap_or_else(|_| directory.to_path_buf());
        self.emit(ScanEvent::Preparing {
            target: directory.clone(),
        });

        let enumerator = FileEnumerator::new(self.settings.recursive);
        let candidates = match enumerator.enumerate(&directory) {
            Ok(paths) => paths,
            Err(e) => {
                let message = e.to_string();
                let mut results = ScanResults::default();
                results.errors.push(ErrorRecord::for_path(
                    Operation::Enumerate,
                    directory.clone(),
                    message.clone(),
                ));
                self.emit(ScanEvent::Failed { message });
                return ScanOutcome {
                    status: ScanStatus::Failed,
                    results,
                };
            }
        };
        info!(count = candidates.len(), directory = %directory.display(), "candidates enumerated");

        let mut scan = self.prepare_state(&directory, candidates, resume);

        let mut cache = CacheStore::open(&directory, self.settings.cache_enabled);
        let mut throttle = ProgressThrottle::new();
        let mut since_checkpoint = 0usize;

        // Stat every candidate once; files that cannot be stat'ed are
        // reported and sit out all three phases.
        let mut files: HashMap<PathBuf, ImageFile> = HashMap::new();
        for path in scan.candidates.clone() {
            match enumerator.stat(&path) {
                Ok(file) => {
                    files.insert(path, file);
                }
                Err(e) => {
                    self.record_path_error(&mut scan, Operation::Enumerate, &path, e.to_string());
                }
            }
        }

        // Blur phase.
        if self.cancelled() {
            return self.finish_cancelled(scan, &mut cache);
        }
        let blur_targets: Vec<PathBuf> = scan
            .candidates
            .iter()
            .filter(|p| files.contains_key(*p))
            .cloned()
            .collect();
        let scorer = BlurScorer::from_settings(&self.settings);
        let total = blur_targets.len();
        self.emit(ScanEvent::PhaseStarted {
            phase: ScanPhase::Blur,
            total,
        });
        throttle.reset();
        let mut done = blur_targets
            .iter()
            .filter(|p| scan.blur_done.contains(*p))
            .count();
        for path in &blur_targets {
            if scan.blur_done.contains(path) {
                continue;
            }
            if self.cancelled() {
                return self.finish_cancelled(scan, &mut cache);
            }
            match scorer.score_file(path) {
                Ok(score) => {
                    if scorer.is_blurry(score) {
                        scan.results.blurry.push(BlurResult {
                            path: path.clone(),
                            score,
                            algorithm: scorer.algorithm(),
                            threshold: scorer.threshold(),
                            is_blurry: true,
                        });
                    }
                }
                Err(e) => {
                    self.record_path_error(&mut scan, Operation::BlurScore, path, e.to_string());
                }
            }
            scan.blur_done.insert(path.clone());
            done += 1;
            throttle.emit(&self.events, ScanPhase::Blur, done, total);
            since_checkpoint += 1;
            self.maybe_checkpoint(&scan, &mut since_checkpoint);
        }

        // Duplicate phase.
        if self.cancelled() {
            return self.finish_cancelled(scan, &mut cache);
        }
        let all_files: Vec<ImageFile> = blur_targets
            .iter()
            .filter_map(|p| files.get(p).cloned())
            .collect();
        let need_digest = duplicate::prune_unique_sizes(&all_files);
        let total = need_digest.len();
        self.emit(ScanEvent::PhaseStarted {
            phase: ScanPhase::Duplicate,
            total,
        });
        throttle.reset();
        let mut done = need_digest
            .iter()
            .filter(|f| scan.digest_done.contains(&f.path))
            .count();
        for file in &need_digest {
            if scan.digest_done.contains(&file.path) {
                continue;
            }
            if self.cancelled() {
                return self.finish_cancelled(scan, &mut cache);
            }
            let mtime = mtime_seconds(file.modified);
            let digest = match cache.get(CacheKind::ContentHash, &file.path, mtime) {
                Some(cached) => Ok(cached.to_string()),
                None => duplicate::content_digest(&file.path).map(|d| {
                    cache.put(CacheKind::ContentHash, &file.path, mtime, d.clone());
                    d
                }),
            };
            match digest {
                Ok(d) => {
                    scan.digests.insert(file.path.clone(), d);
                }
                Err(e) => {
                    self.record_path_error(
                        &mut scan,
                        Operation::ContentHash,
                        &file.path,
                        e.to_string(),
                    );
                }
            }
            scan.digest_done.insert(file.path.clone());
            done += 1;
            throttle.emit(&self.events, ScanPhase::Duplicate, done, total);
            since_checkpoint += 1;
            self.maybe_checkpoint(&scan, &mut since_checkpoint);
        }
        scan.results.duplicates = duplicate::group_by_digest(&scan.digests);

        // Similarity phase, over candidates outside every duplicate group.
        if self.cancelled() {
            return self.finish_cancelled(scan, &mut cache);
        }
        let duplicate_members: HashSet<&PathBuf> = scan
            .results
            .duplicates
            .iter()
            .flat_map(|g| g.paths.iter())
            .collect();
        let remaining: Vec<PathBuf> = blur_targets
            .iter()
            .filter(|p| !duplicate_members.contains(*p))
            .cloned()
            .collect();
        drop(duplicate_members);

        if self.settings.similarity_mode != SimilarityMode::DescriptorOnly {
            let total = remaining.len();
            self.emit(ScanEvent::PhaseStarted {
                phase: ScanPhase::Fingerprint,
                total,
            });
            throttle.reset();
            let mut done = remaining
                .iter()
                .filter(|p| scan.phash_done.contains(*p))
                .count();
            for path in &remaining {
                if scan.phash_done.contains(path) {
                    continue;
                }
                if self.cancelled() {
                    return self.finish_cancelled(scan, &mut cache);
                }
                let mtime = files.get(path).map(|f| mtime_seconds(f.modified)).unwrap_or(0);
                let encoded = match cache.get(CacheKind::PerceptualHash, path, mtime) {
                    Some(cached) => Ok(cached.to_string()),
                    None => phash::hash_file(path).map(|h| {
                        let encoded = phash::encode(&h);
                        cache.put(CacheKind::PerceptualHash, path, mtime, encoded.clone());
                        encoded
                    }),
                };
                match encoded {
                    Ok(encoded) => {
                        scan.phashes.insert(path.clone(), encoded);
                    }
                    Err(e) => {
                        self.record_path_error(
                            &mut scan,
                            Operation::PerceptualHash,
                            path,
                            e.to_string(),
                        );
                    }
                }
                scan.phash_done.insert(path.clone());
                done += 1;
                throttle.emit(&self.events, ScanPhase::Fingerprint, done, total);
                since_checkpoint += 1;
                self.maybe_checkpoint(&scan, &mut since_checkpoint);
            }
        }

        let hashes: HashMap<PathBuf, ImageHash> = scan
            .phashes
            .iter()
            .filter_map(|(path, encoded)| phash::decode(encoded).map(|h| (path.clone(), h)))
            .collect();

        let pairs = candidate_pairs(&remaining);
        let total = pairs.len();
        self.emit(ScanEvent::PhaseStarted {
            phase: ScanPhase::Similarity,
            total,
        });
        throttle.reset();
        let mut detector = SimilarityDetector::from_settings(&self.settings);
        let mut done = pairs
            .iter()
            .filter(|(a, b)| scan.is_pair_compared(a, b))
            .count();
        for (a, b) in &pairs {
            if scan.is_pair_compared(a, b) {
                continue;
            }
            if self.cancelled() {
                return self.finish_cancelled(scan, &mut cache);
            }
            match detector.evaluate_pair(a, b, hashes.get(a), hashes.get(b)) {
                Ok(Some(score)) => {
                    scan.results
                        .similar
                        .push(SimilarPair::new(a.clone(), b.clone(), score));
                }
                Ok(None) => {}
                Err(e) => {
                    let message = e.to_string();
                    scan.results.errors.push(ErrorRecord::for_pair(
                        Operation::DescriptorMatch,
                        a.clone(),
                        b.clone(),
                        message.clone(),
                    ));
                    self.emit(ScanEvent::ItemError {
                        path: a.clone(),
                        message,
                    });
                }
            }
            scan.mark_pair_compared(a, b);
            done += 1;
            throttle.emit(&self.events, ScanPhase::Similarity, done, total);
            since_checkpoint += 1;
            self.maybe_checkpoint(&scan, &mut since_checkpoint);
        }

        // Completion: sweep out entries for deleted files, flush the
        // cache, drop the checkpoint.
        cache.prune_missing();
        if let Err(e) = cache.save_all() {
            warn!(error = %e, "failed to persist cache, results are unaffected");
        }
        if let Err(e) = state::delete(&scan.directory) {
            warn!(error = %e, "failed to remove checkpoint after completion");
        }
        info!(
            blurry = scan.results.blurry.len(),
            duplicate_groups = scan.results.duplicates.len(),
            similar_pairs = scan.results.similar.len(),
            errors = scan.results.errors.len(),
            "scan completed"
        );
        self.emit(ScanEvent::Completed);
        ScanOutcome {
            status: ScanStatus::Completed,
            results: scan.results,
        }
    }

    fn prepare_state(&self, directory: &Path, candidates: Vec<PathBuf>, resume: bool) -> ScanState {
        if resume {
            if let Some(loaded) = state::load(directory, &self.settings) {
                self.emit(ScanEvent::Resumed {
                    already_processed: loaded.processed_count(),
                });
                info!(already_processed = loaded.processed_count(), "resuming from checkpoint");
                return loaded;
            }
        }
        ScanState::new(directory.to_path_buf(), self.settings.clone(), candidates)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn emit(&self, event: ScanEvent) {
        self.events.send(Event::Scan(event));
    }

    fn record_path_error(
        &self,
        scan: &mut ScanState,
        operation: Operation,
        path: &Path,
        message: String,
    ) {
        scan.results.errors.push(ErrorRecord::for_path(
            operation,
            path.to_path_buf(),
            message.clone(),
        ));
        self.emit(ScanEvent::ItemError {
            path: path.to_path_buf(),
            message,
        });
    }

    fn maybe_checkpoint(&self, scan: &ScanState, since_checkpoint: &mut usize) {
        if *since_checkpoint < self.settings.checkpoint_interval {
            return;
        }
        if let Err(e) = state::save(scan) {
            warn!(error = %e, "failed to write checkpoint, scan continues");
        }
        *since_checkpoint = 0;
    }

    fn finish_cancelled(&self, scan: ScanState, cache: &mut CacheStore) -> ScanOutcome {
        cache.prune_missing();
        if let Err(e) = cache.save_all() {
            warn!(error = %e, "failed to persist cache during cancellation");
        }
        if let Err(e) = state::save(&scan) {
            warn!(error = %e, "failed to write final checkpoint during cancellation");
        }
        info!("scan cancelled, checkpoint written");
        self.emit(ScanEvent::Cancelled);
        ScanOutcome {
            status: ScanStatus::Cancelled,
            results: scan.results,
        }
    }
}
