use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{
    state::{
        clock::{Clock, Timestamp},
        game::GameState,
    },
    sync::Window,
};

/// Elapsed round time as a display shows it.
///
/// While the game is paused the seconds stay frozen at the last value shown;
/// the stored round start time is never touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerDisplay {
    /// Start of the round being timed.
    pub round_start_time: Option<Timestamp>,
    /// Whole seconds shown, `None` when no example is on screen.
    pub elapsed_seconds: Option<u64>,
    /// Whether the display is frozen.
    pub is_paused: bool,
}

/// Compute the next display value from the previous one.
pub fn next_display(previous: &TimerDisplay, state: &GameState, now: Timestamp) -> TimerDisplay {
    let Some(start) = state.round_start_time() else {
        return TimerDisplay::default();
    };

    let frozen = state.is_paused()
        && previous.round_start_time == Some(start)
        && previous.elapsed_seconds.is_some();

    TimerDisplay {
        round_start_time: Some(start),
        elapsed_seconds: if frozen {
            previous.elapsed_seconds
        } else {
            state.elapsed_seconds(now)
        },
        is_paused: state.is_paused(),
    }
}

/// Ticker recomputing a window's elapsed round time; dropping it stops the task.
#[derive(Debug)]
pub struct RoundTimer {
    display: watch::Receiver<TimerDisplay>,
    task: JoinHandle<()>,
}

impl RoundTimer {
    /// Start ticking for `window` every `tick` and on every state change.
    pub fn spawn(window: &Window, clock: Arc<dyn Clock>, tick: Duration) -> Self {
        let mut states = window.subscribe();
        let initial = next_display(&TimerDisplay::default(), &states.borrow(), clock.now_millis());
        let (sender, display) = watch::channel(initial);

        let task = tokio::spawn(async move {
            let mut ticker = interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    changed = states.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {}
                }

                let now = clock.now_millis();
                let state = states.borrow_and_update().clone();
                sender.send_if_modified(|shown| {
                    let next = next_display(shown, &state, now);
                    if *shown == next {
                        return false;
                    }
                    *shown = next;
                    true
                });
            }
        });

        Self { display, task }
    }

    /// Value currently displayed.
    pub fn current(&self) -> TimerDisplay {
        *self.display.borrow()
    }

    /// Watch the displayed value.
    pub fn subscribe(&self) -> watch::Receiver<TimerDisplay> {
        self.display.clone()
    }
}

impl Drop for RoundTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{Category, PatternExample},
        state::clock::ManualClock,
        sync::{MemorySlot, WindowRole},
    };

    fn example() -> PatternExample {
        PatternExample {
            id: "behavioral-01".into(),
            title: "Listeners".into(),
            category: Category::Behavioral,
            code: "class Bus {}".into(),
            solution_patterns: vec!["Observer".into()],
            solution_explanation: "subscribers".into(),
        }
    }

    #[test]
    fn counts_from_the_round_start() {
        let mut state = GameState::new();
        assert_eq!(
            next_display(&TimerDisplay::default(), &state, 5_000),
            TimerDisplay::default()
        );

        let _ = state.set_current_example(Some(example()), 1_000);
        let shown = next_display(&TimerDisplay::default(), &state, 4_500);
        assert_eq!(shown.elapsed_seconds, Some(3));
        assert_eq!(shown.round_start_time, Some(1_000));
    }

    #[test]
    fn pause_freezes_and_resume_catches_up() {
        let mut state = GameState::new();
        let _ = state.set_current_example(Some(example()), 0);
        let running = next_display(&TimerDisplay::default(), &state, 7_000);

        let _ = state.toggle_pause();
        let frozen = next_display(&running, &state, 20_000);
        assert_eq!(frozen.elapsed_seconds, Some(7));
        assert!(frozen.is_paused);
        assert_eq!(state.round_start_time(), Some(0));

        let _ = state.toggle_pause();
        let resumed = next_display(&frozen, &state, 21_000);
        assert_eq!(resumed.elapsed_seconds, Some(21));
    }

    #[test]
    fn pause_of_an_unseen_round_shows_its_elapsed_time() {
        let mut state = GameState::new();
        let _ = state.set_current_example(Some(example()), 10_000);
        let _ = state.toggle_pause();
        let stale = TimerDisplay {
            round_start_time: Some(0),
            elapsed_seconds: Some(99),
            is_paused: true,
        };

        assert_eq!(next_display(&stale, &state, 12_000).elapsed_seconds, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_follows_the_window() {
        let clock = Arc::new(ManualClock::new(0));
        let window = Window::new(WindowRole::Viewer, Arc::new(MemorySlot::default()));
        let timer = RoundTimer::spawn(&window, clock.clone(), Duration::from_secs(1));
        assert_eq!(timer.current().elapsed_seconds, None);

        let _ = window.transition(|state| state.set_current_example(Some(example()), 0));
        clock.advance(3_000);
        tokio::time::sleep(Duration::from_millis(1_100)).await;

        assert_eq!(timer.current().elapsed_seconds, Some(3));
    }
}
