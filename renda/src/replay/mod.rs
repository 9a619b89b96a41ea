mod engine;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

use crate::core::PositionList;
use crate::platform::InputSynthesizer;

pub use engine::{ReplayEngine, ToggleOutcome};

/// Pause after a pass that clicked nothing, so an empty list does not spin.
pub const IDLE_PASS_PAUSE: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Repeat must be a non-negative number, got {0:?}")]
    InvalidRepeatCount(String),
    #[error("Failed to spawn replay worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// How many passes a run makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatLimit {
    Infinite,
    Passes(u32),
}

impl RepeatLimit {
    /// `0` means infinite.
    pub fn parse(input: &str) -> Result<Self, ReplayError> {
        input
            .trim()
            .parse::<u32>()
            .map(Self::from_count)
            .map_err(|_| ReplayError::InvalidRepeatCount(input.to_string()))
    }

    pub fn from_count(count: u32) -> Self {
        if count == 0 {
            RepeatLimit::Infinite
        } else {
            RepeatLimit::Passes(count)
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            RepeatLimit::Infinite => 0,
            RepeatLimit::Passes(n) => *n,
        }
    }

    pub fn allows(&self, passes_done: u32) -> bool {
        match self {
            RepeatLimit::Infinite => true,
            RepeatLimit::Passes(n) => passes_done < *n,
        }
    }
}

/// Cooperative cancellation shared between the trigger and one worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub passes: u32,
    pub clicks: u64,
    pub cancelled: bool,
}

/// Replays `positions` until `limit` passes are done or `token` is cancelled.
///
/// The token is checked before every pass and before every position, so a
/// cancel during the last sleep of a pass still counts that pass. The list
/// is read live, one position at a time, so edits made during a run show up
/// in the pass that is in progress. Unset positions are skipped.
pub fn run_passes<S: InputSynthesizer + ?Sized>(
    positions: &Mutex<PositionList>,
    limit: RepeatLimit,
    token: &CancelToken,
    synth: &S,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();

    while !token.is_cancelled() && limit.allows(summary.passes) {
        let mut index = 0;
        let mut clicked = false;

        loop {
            let current = index;
            let Some(position) = positions.lock().get(current).cloned() else {
                break;
            };
            index += 1;

            if token.is_cancelled() {
                summary.cancelled = true;
                return summary;
            }

            let Some(point) = position.point else {
                tracing::debug!("Skipping unset position {}", current);
                continue;
            };

            synth.move_to(point);
            synth.button_down(point, position.button);
            synth.button_up(point, position.button);
            summary.clicks += 1;
            clicked = true;

            if !position.delay.is_valid() {
                tracing::debug!(
                    "Position {} has delay {:?}, using fallback",
                    current,
                    position.delay.to_string()
                );
            }
            synth.pause(position.delay.sleep_duration());
        }

        summary.passes += 1;
        tracing::debug!("Pass {} complete", summary.passes);

        if !clicked {
            synth.pause(IDLE_PASS_PAUSE);
        }
    }

    summary.cancelled = token.is_cancelled();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Delay, Point, Position};
    use crate::platform::mock::{InputEvent, MockInputSynthesizer};
    use renda_ipc::ClickButton;

    fn position(x: i32, y: i32, delay: &str, button: ClickButton) -> Position {
        Position::at(Point::new(x, y))
            .with_delay(Delay::parse(delay))
            .with_button(button)
    }

    fn shared(positions: Vec<Position>) -> Mutex<PositionList> {
        Mutex::new(PositionList::from_positions(positions))
    }

    fn click_sequence(x: i32, y: i32, button: ClickButton, ms: u64) -> Vec<InputEvent> {
        let point = Point::new(x, y);
        vec![
            InputEvent::Move(point),
            InputEvent::Down(point, button),
            InputEvent::Up(point, button),
            InputEvent::Pause(Duration::from_millis(ms)),
        ]
    }

    #[test]
    fn test_repeat_limit_parse() {
        assert_eq!(RepeatLimit::parse("0").unwrap(), RepeatLimit::Infinite);
        assert_eq!(RepeatLimit::parse(" 3").unwrap(), RepeatLimit::Passes(3));
        assert!(matches!(
            RepeatLimit::parse("abc"),
            Err(ReplayError::InvalidRepeatCount(s)) if s == "abc"
        ));
        assert!(RepeatLimit::parse("-1").is_err());
        assert!(RepeatLimit::parse("").is_err());
    }

    #[test]
    fn test_repeat_limit_allows() {
        assert!(RepeatLimit::Infinite.allows(u32::MAX));
        assert!(RepeatLimit::Passes(2).allows(1));
        assert!(!RepeatLimit::Passes(2).allows(2));
        assert_eq!(RepeatLimit::Infinite.count(), 0);
        assert_eq!(RepeatLimit::Passes(7).count(), 7);
    }

    #[test]
    fn test_scenario_two_positions_two_passes() {
        let positions = shared(vec![
            position(10, 10, "50", ClickButton::Left),
            position(20, 20, "100", ClickButton::Right),
        ]);
        let synth = MockInputSynthesizer::new();
        let token = CancelToken::new();

        let summary = run_passes(&positions, RepeatLimit::Passes(2), &token, &synth);

        let mut expected = Vec::new();
        for _ in 0..2 {
            expected.extend(click_sequence(10, 10, ClickButton::Left, 50));
            expected.extend(click_sequence(20, 20, ClickButton::Right, 100));
        }
        assert_eq!(synth.events(), expected);
        assert_eq!(
            summary,
            ReplaySummary {
                passes: 2,
                clicks: 4,
                cancelled: false,
            }
        );
    }

    #[test]
    fn test_exactly_n_passes_in_order() {
        let positions = shared(vec![
            position(1, 1, "1", ClickButton::Left),
            position(2, 2, "1", ClickButton::Middle),
            position(3, 3, "1", ClickButton::Left),
        ]);
        let synth = MockInputSynthesizer::new();

        let summary = run_passes(&positions, RepeatLimit::Passes(5), &CancelToken::new(), &synth);

        assert_eq!(summary.passes, 5);
        let moves: Vec<Point> = synth
            .events()
            .into_iter()
            .filter_map(|e| match e {
                InputEvent::Move(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(moves.len(), 15);
        for pass in moves.chunks(3) {
            assert_eq!(pass, [Point::new(1, 1), Point::new(2, 2), Point::new(3, 3)]);
        }
    }

    #[test]
    fn test_infinite_cancelled_after_first_pass() {
        let positions = shared(vec![
            position(1, 1, "1", ClickButton::Left),
            position(2, 2, "1", ClickButton::Left),
        ]);
        let token = CancelToken::new();
        // Two positions, four events each: cancel on the last pause of pass one.
        let synth = MockInputSynthesizer::new().cancel_after(8, token.clone());

        let summary = run_passes(&positions, RepeatLimit::Infinite, &token, &synth);

        assert_eq!(summary.passes, 1);
        assert_eq!(summary.clicks, 2);
        assert!(summary.cancelled);
        assert_eq!(synth.events().len(), 8);
    }

    #[test]
    fn test_cancel_mid_pass_skips_remaining_positions() {
        let positions = shared(vec![
            position(1, 1, "1", ClickButton::Left),
            position(2, 2, "1", ClickButton::Left),
            position(3, 3, "1", ClickButton::Left),
        ]);
        let token = CancelToken::new();
        let synth = MockInputSynthesizer::new().cancel_after(4, token.clone());

        let summary = run_passes(&positions, RepeatLimit::Passes(3), &token, &synth);

        assert_eq!(summary.passes, 0);
        assert_eq!(summary.clicks, 1);
        assert!(summary.cancelled);
        assert_eq!(synth.events(), click_sequence(1, 1, ClickButton::Left, 1));
    }

    #[test]
    fn test_cancelled_before_start_does_nothing() {
        let positions = shared(vec![position(1, 1, "1", ClickButton::Left)]);
        let token = CancelToken::new();
        token.cancel();
        let synth = MockInputSynthesizer::new();

        let summary = run_passes(&positions, RepeatLimit::Infinite, &token, &synth);

        assert!(synth.events().is_empty());
        assert_eq!(summary.passes, 0);
        assert!(summary.cancelled);
    }

    #[test]
    fn test_invalid_delay_uses_fallback() {
        let positions = shared(vec![position(5, 5, "abc", ClickButton::Left)]);
        let synth = MockInputSynthesizer::new();

        let summary = run_passes(&positions, RepeatLimit::Passes(1), &CancelToken::new(), &synth);

        assert_eq!(summary.passes, 1);
        assert_eq!(
            synth.events().last(),
            Some(&InputEvent::Pause(Duration::from_millis(10)))
        );
    }

    #[test]
    fn test_zero_delay_uses_minimum() {
        let positions = shared(vec![position(5, 5, "0", ClickButton::Left)]);
        let synth = MockInputSynthesizer::new();

        run_passes(&positions, RepeatLimit::Passes(1), &CancelToken::new(), &synth);

        assert_eq!(
            synth.events().last(),
            Some(&InputEvent::Pause(Duration::from_micros(100)))
        );
    }

    #[test]
    fn test_unset_positions_are_skipped() {
        let positions = shared(vec![
            Position::unset(),
            position(7, 8, "20", ClickButton::Right),
        ]);
        let synth = MockInputSynthesizer::new();

        let summary = run_passes(&positions, RepeatLimit::Passes(1), &CancelToken::new(), &synth);

        assert_eq!(summary.clicks, 1);
        assert_eq!(synth.events(), click_sequence(7, 8, ClickButton::Right, 20));
    }

    #[test]
    fn test_empty_list_pauses_between_passes() {
        let positions = shared(vec![]);
        let synth = MockInputSynthesizer::new();

        let summary = run_passes(&positions, RepeatLimit::Passes(2), &CancelToken::new(), &synth);

        assert_eq!(summary.passes, 2);
        assert_eq!(
            synth.events(),
            vec![
                InputEvent::Pause(IDLE_PASS_PAUSE),
                InputEvent::Pause(IDLE_PASS_PAUSE)
            ]
        );
    }

    #[test]
    fn test_live_edit_is_seen_by_current_pass() {
        let positions = Arc::new(shared(vec![position(1, 1, "1", ClickButton::Left)]));
        let list = Arc::clone(&positions);
        // Append a position while the first one is being clicked.
        let synth = MockInputSynthesizer::new().on_event(move |count| {
            if count == 1 {
                list.lock().capture_into(Point::new(9, 9));
            }
        });

        let summary = run_passes(&*positions, RepeatLimit::Passes(1), &CancelToken::new(), &synth);

        assert_eq!(summary.clicks, 2);
        assert!(synth.events().contains(&InputEvent::Move(Point::new(9, 9))));
    }
}
