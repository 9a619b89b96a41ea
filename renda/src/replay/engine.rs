use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::{run_passes, CancelToken, RepeatLimit, ReplayError, ReplaySummary};
use crate::core::SharedPositions;
use crate::platform::InputSynthesizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Stopped,
}

struct ActiveRun {
    token: CancelToken,
    finished: Arc<AtomicBool>,
    handle: JoinHandle<ReplaySummary>,
}

impl ActiveRun {
    fn is_live(&self) -> bool {
        !self.token.is_cancelled() && !self.finished.load(Ordering::Acquire)
    }
}

/// Owns at most one replay worker. Toggling while a run is live cancels it;
/// toggling while idle starts a new one. Nothing is queued.
pub struct ReplayEngine<S: InputSynthesizer + 'static> {
    synth: Arc<S>,
    active: Option<ActiveRun>,
}

impl<S: InputSynthesizer + 'static> ReplayEngine<S> {
    pub fn new(synth: S) -> Self {
        Self {
            synth: Arc::new(synth),
            active: None,
        }
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(ActiveRun::is_live)
    }

    pub fn toggle(
        &mut self,
        positions: &SharedPositions,
        repeat_input: &str,
    ) -> Result<ToggleOutcome, ReplayError> {
        if self.stop() {
            return Ok(ToggleOutcome::Stopped);
        }
        let limit = RepeatLimit::parse(repeat_input)?;
        self.start(positions, limit)?;
        Ok(ToggleOutcome::Started)
    }

    /// Joins the previous run, even one still in its last sleep, and returns
    /// its summary.
    fn start(
        &mut self,
        positions: &SharedPositions,
        limit: RepeatLimit,
    ) -> Result<Option<ReplaySummary>, ReplayError> {
        let previous = self.wait();

        let token = CancelToken::new();
        let finished = Arc::new(AtomicBool::new(false));

        let worker_token = token.clone();
        let worker_finished = Arc::clone(&finished);
        let worker_positions = Arc::clone(positions);
        let synth = Arc::clone(&self.synth);

        let handle = std::thread::Builder::new()
            .name("renda-replay".to_string())
            .spawn(move || {
                let summary = run_passes(&worker_positions, limit, &worker_token, &*synth);
                worker_finished.store(true, Ordering::Release);
                summary
            })?;

        tracing::info!("Replay started ({:?})", limit);
        self.active = Some(ActiveRun {
            token,
            finished,
            handle,
        });
        Ok(previous)
    }

    /// Cancels the live run. Returns false when nothing was running.
    /// The worker finishes the sleep it is in before it notices.
    pub fn stop(&mut self) -> bool {
        match &self.active {
            Some(run) if run.is_live() => {
                run.token.cancel();
                tracing::info!("Replay cancelled");
                true
            }
            _ => false,
        }
    }

    /// Blocks until the current worker exits and returns its summary.
    pub fn wait(&mut self) -> Option<ReplaySummary> {
        let run = self.active.take()?;
        match run.handle.join() {
            Ok(summary) => {
                log_summary(&summary);
                Some(summary)
            }
            Err(_) => {
                tracing::error!("Replay worker panicked");
                None
            }
        }
    }

    /// Joins a worker that has already exited.
    pub fn reap(&mut self) -> Option<ReplaySummary> {
        let done = self
            .active
            .as_ref()
            .is_some_and(|run| run.finished.load(Ordering::Acquire));
        if done {
            self.wait()
        } else {
            None
        }
    }
}

fn log_summary(summary: &ReplaySummary) {
    tracing::info!(
        "Replay finished: {} passes, {} clicks{}",
        summary.passes,
        summary.clicks,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Point, PositionList};
    use crate::platform::mock::{InputEvent, MockInputSynthesizer};
    use std::time::{Duration, Instant};

    fn one_position() -> SharedPositions {
        let mut list = PositionList::new();
        list.capture_into(Point::new(3, 4));
        list.set_delay(0, crate::core::Delay::Millis(5));
        list.into_shared()
    }

    fn wait_until(cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_finite_run_finishes_on_its_own() {
        let positions = one_position();
        let mut engine = ReplayEngine::new(MockInputSynthesizer::new());

        assert_eq!(
            engine.toggle(&positions, "3").unwrap(),
            ToggleOutcome::Started
        );
        let summary = engine.wait().unwrap();

        assert_eq!(summary.passes, 3);
        assert!(!summary.cancelled);
        assert!(!engine.is_running());
        assert_eq!(engine.synth().events().len(), 12);
    }

    #[test]
    fn test_toggle_twice_cancels() {
        let positions = one_position();
        let mut engine = ReplayEngine::new(MockInputSynthesizer::new().with_real_sleep());

        engine.toggle(&positions, "0").unwrap();
        assert!(engine.is_running());
        wait_until(|| !engine.synth().events().is_empty());

        assert_eq!(
            engine.toggle(&positions, "0").unwrap(),
            ToggleOutcome::Stopped
        );
        assert!(!engine.is_running());

        let summary = engine.wait().unwrap();
        assert!(summary.cancelled);
    }

    #[test]
    fn test_invalid_repeat_aborts_before_first_pass() {
        let positions = one_position();
        let mut engine = ReplayEngine::new(MockInputSynthesizer::new());

        let err = engine.toggle(&positions, "ten").unwrap_err();
        assert!(matches!(err, ReplayError::InvalidRepeatCount(_)));
        assert!(!engine.is_running());
        assert!(engine.wait().is_none());
        assert!(engine.synth().events().is_empty());
    }

    #[test]
    fn test_restart_joins_cancelled_run() {
        let mut list = PositionList::new();
        list.capture_into(Point::new(3, 4));
        list.set_delay(0, crate::core::Delay::Millis(200));
        let positions = list.into_shared();
        let mut engine = ReplayEngine::new(MockInputSynthesizer::new().with_real_sleep());

        engine.toggle(&positions, "0").unwrap();
        wait_until(|| !engine.synth().events().is_empty());
        assert!(engine.stop());

        // The old worker is still sleeping when the next run starts
        let previous = engine.start(&positions, RepeatLimit::Passes(1)).unwrap();
        let previous = previous.unwrap();
        assert!(previous.cancelled);
        assert_eq!(previous.clicks, 1);
        assert!(engine.is_running());

        let summary = engine.wait().unwrap();
        assert!(!summary.cancelled);
        assert_eq!(summary.passes, 1);
    }

    #[test]
    fn test_stop_when_idle() {
        let mut engine = ReplayEngine::new(MockInputSynthesizer::new());
        assert!(!engine.stop());
    }

    #[test]
    fn test_toggle_after_finished_run_starts_again() {
        let positions = one_position();
        let mut engine = ReplayEngine::new(MockInputSynthesizer::new());

        engine.toggle(&positions, "1").unwrap();
        wait_until(|| !engine.is_running());

        assert_eq!(
            engine.toggle(&positions, "1").unwrap(),
            ToggleOutcome::Started
        );
        engine.wait();

        let moves = engine
            .synth()
            .events()
            .into_iter()
            .filter(|e| matches!(e, InputEvent::Move(_)))
            .count();
        assert_eq!(moves, 2);
    }
}
