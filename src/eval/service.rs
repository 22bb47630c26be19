//! # Background evaluation
//!
//! Evaluating a position blocks for as long as the engine searches. An
//! [`EvaluationService`] moves the evaluator to a worker thread so that the game
//! stays responsive.
//!
//! The worker handles one request at a time, so an evaluator never sees two
//! overlapping searches. Requesting a new evaluation while another one is queued
//! replaces it, and results are tagged with the hash of the position they are
//! about so that results for positions that are no longer current can be
//! dropped.

use std::{
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError},
        Arc, Condvar, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::game::{position::Position, score::Score};

use super::{EvaluationOptions, Evaluator};

/// A score along with the position it was computed for.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct Evaluation {
    pub hash: u64,
    pub score: Score,
}

#[derive(Default)]
struct Queue {
    pending: Option<(Position, EvaluationOptions)>,
    shutdown: bool,
}

type SharedQueue = Arc<(Mutex<Queue>, Condvar)>;

/// Runs an [`Evaluator`] on a worker thread.
pub struct EvaluationService {
    queue: SharedQueue,
    results: Receiver<Evaluation>,
    worker: Option<JoinHandle<()>>,
}
impl EvaluationService {
    /// Moves `evaluator` to a new worker thread.
    pub fn spawn<E: Evaluator + Send + 'static>(mut evaluator: E) -> Self {
        let queue = SharedQueue::default();
        let (sender, results) = mpsc::channel();

        let worker_queue = Arc::clone(&queue);
        let worker = thread::spawn(move || {
            while let Some((position, options)) = next_request(&worker_queue) {
                let score = evaluator.evaluate(&position, &options);
                let evaluation = Evaluation {
                    hash: position.zobrist_hash(),
                    score,
                };
                if sender.send(evaluation).is_err() {
                    break;
                }
            }
        });

        Self {
            queue,
            results,
            worker: Some(worker),
        }
    }

    /// Asks for an evaluation of `position`, replacing any request that did not
    /// start yet.
    pub fn request(&self, position: &Position, options: EvaluationOptions) {
        let (lock, condvar) = &*self.queue;
        let mut queue = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.pending.replace((*position, options)).is_some() {
            log::debug!("superseded a queued evaluation");
        }
        condvar.notify_one();
    }

    /// Returns the newest available score for `current`, discarding results
    /// about other positions.
    pub fn poll(&self, current: &Position) -> Option<Score> {
        let mut latest = None;
        while let Ok(evaluation) = self.results.try_recv() {
            latest = self.keep_if_current(evaluation, current).or(latest);
        }
        latest
    }

    /// Waits up to `timeout` for a score about `current`.
    pub fn wait_for(&self, current: &Position, timeout: Duration) -> Option<Score> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(left) {
                Ok(evaluation) => {
                    if let Some(score) = self.keep_if_current(evaluation, current) {
                        return Some(score);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn keep_if_current(&self, evaluation: Evaluation, current: &Position) -> Option<Score> {
        if evaluation.hash == current.zobrist_hash() {
            Some(evaluation.score)
        } else {
            log::debug!("dropped a stale evaluation ({})", evaluation.score);
            None
        }
    }
}
impl Drop for EvaluationService {
    fn drop(&mut self) {
        {
            let (lock, condvar) = &*self.queue;
            let mut queue = lock.lock().unwrap_or_else(PoisonError::into_inner);
            queue.shutdown = true;
            queue.pending = None;
            condvar.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            // An evaluation in flight finishes before the worker notices.
            if worker.join().is_err() {
                log::warn!("the evaluation worker panicked");
            }
        }
    }
}

/// Blocks until a request is pending, or returns `None` on shutdown.
fn next_request(queue: &SharedQueue) -> Option<(Position, EvaluationOptions)> {
    let (lock, condvar) = &**queue;
    let mut queue = lock.lock().unwrap_or_else(PoisonError::into_inner);
    loop {
        if queue.shutdown {
            return None;
        }
        if let Some(request) = queue.pending.take() {
            return Some(request);
        }
        queue = condvar.wait(queue).unwrap_or_else(PoisonError::into_inner);
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::eval::MaterialCount;

    const WAIT: Duration = Duration::from_secs(5);

    /// Counts concurrent evaluations and blocks each one for a while.
    struct Slow {
        running: Arc<AtomicUsize>,
        overlaps: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }
    impl Evaluator for Slow {
        fn evaluate(&mut self, position: &Position, options: &EvaluationOptions) -> Score {
            if self.running.fetch_add(1, Ordering::SeqCst) != 0 {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(30));
            self.running.fetch_sub(1, Ordering::SeqCst);
            MaterialCount.evaluate(position, options)
        }
    }

    #[test]
    fn results_are_tagged_with_the_position() {
        let service = EvaluationService::spawn(MaterialCount);
        let position: Position = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1".parse().unwrap();
        service.request(&position, EvaluationOptions::default());
        assert_eq!(service.wait_for(&position, WAIT), Some(Score::Centipawns(500)));
        assert_eq!(service.poll(&position), None);
    }

    #[test]
    fn stale_results_are_dropped() {
        let service = EvaluationService::spawn(MaterialCount);
        let before = Position::initial();
        let after = before.after("e2e4".parse().unwrap());

        service.request(&before, EvaluationOptions::default());
        assert_eq!(
            service.wait_for(&after, Duration::from_millis(200)),
            None
        );

        service.request(&after, EvaluationOptions::default());
        assert_eq!(service.wait_for(&after, WAIT), Some(Score::Centipawns(0)));
    }

    #[test]
    fn newer_requests_supersede_queued_ones() {
        let running = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let service = EvaluationService::spawn(Slow {
            running: Arc::clone(&running),
            overlaps: Arc::clone(&overlaps),
            calls: Arc::clone(&calls),
        });

        let mut position = Position::initial();
        for mv in ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"] {
            service.request(&position, EvaluationOptions::default());
            position = position.after(mv.parse().unwrap());
        }
        service.request(&position, EvaluationOptions::default());

        assert_eq!(service.wait_for(&position, WAIT), Some(Score::Centipawns(0)));
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert!(calls.load(Ordering::SeqCst) < 6);
    }
}
