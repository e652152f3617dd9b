//! Turns moderator intents into game state transitions on the control window.
//!
//! The controller is the only component allowed to apply named transitions.
//! Every intent runs behind the control window's write gate, so intents are
//! applied strictly one at a time and the window's own sync loop cannot
//! hydrate in the middle of one. An intent's transitions are published to the
//! state slot together, or rolled back together.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    catalog::{Catalog, CategoryFilter, PatternCount, PatternExample},
    error::ServiceError,
    state::{
        clock::Clock,
        game::{GameState, Team},
        phase::{GameAction, TransitionOutcome},
    },
    sync::Window,
};

/// Example put on screen by [`RoundController::show_example`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownExample {
    /// The example now on screen.
    pub example: PatternExample,
    /// Unused examples still matching the same filters.
    pub remaining: usize,
}

/// Single writer of the game state.
pub struct RoundController {
    window: Arc<Window>,
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
}

impl RoundController {
    /// Drive `window` using examples from `catalog`.
    pub fn new(window: Arc<Window>, catalog: Arc<Catalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            catalog,
            clock,
        }
    }

    /// Window the controller writes to.
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Replace the teams (setup and reset flows).
    pub async fn set_teams(&self, teams: Vec<Team>) -> Result<GameState, ServiceError> {
        let _gate = self.window.lock_writes().await;
        self.apply(GameAction::SetTeams(teams)).await
    }

    /// Category button.
    pub async fn select_category(&self, filter: CategoryFilter) -> Result<GameState, ServiceError> {
        let _gate = self.window.lock_writes().await;
        self.apply(GameAction::SetSelectedCategory(filter)).await
    }

    /// Pattern-count button.
    pub async fn select_pattern_count(
        &self,
        count: PatternCount,
    ) -> Result<GameState, ServiceError> {
        let _gate = self.window.lock_writes().await;
        self.apply(GameAction::SetSelectedPatternCount(count)).await
    }

    /// Pick an unused example matching the selected filters and show it.
    ///
    /// When the filters are exhausted the state is left unchanged and
    /// [`ServiceError::CatalogExhausted`] is returned so the moderator can pick
    /// other filters.
    pub async fn show_example(&self) -> Result<ShownExample, ServiceError> {
        let _gate = self.window.lock_writes().await;
        let state = self.window.state();

        let filter = state
            .selected_category()
            .ok_or_else(|| ServiceError::InvalidState("select a category first".into()))?;
        let count = state
            .selected_pattern_count()
            .ok_or_else(|| ServiceError::InvalidState("select a pattern count first".into()))?;

        let picked = {
            let mut rng = rand::rng();
            self.catalog
                .select_example(count, Some(filter), state.used_example_ids(), &mut rng)
        };
        let Some(example) = picked else {
            info!(
                category = ?filter,
                pattern_count = count.get(),
                used = state.used_example_ids().len(),
                "no unused example left for the selected filters"
            );
            return Err(ServiceError::CatalogExhausted);
        };

        let remaining = self
            .catalog
            .remaining(count, Some(filter), state.used_example_ids())
            .saturating_sub(1);

        self.apply(GameAction::SetCurrentExample(Some(example.clone())))
            .await?;
        info!(example = %example.id, remaining, "example shown");

        Ok(ShownExample { example, remaining })
    }

    /// Take the current example off screen without ending the round.
    pub async fn clear_example(&self) -> Result<GameState, ServiceError> {
        let _gate = self.window.lock_writes().await;
        self.apply(GameAction::SetCurrentExample(None)).await
    }

    /// Reveal button.
    pub async fn reveal(&self) -> Result<GameState, ServiceError> {
        let _gate = self.window.lock_writes().await;
        self.apply(GameAction::RevealSolution).await
    }

    /// Award button: one point for `team_id`, then straight to the next round.
    pub async fn award(&self, team_id: Uuid) -> Result<GameState, ServiceError> {
        let _gate = self.window.lock_writes().await;
        self.apply_all(vec![GameAction::AwardPoint(team_id), GameAction::NextRound])
            .await
    }

    /// Skip button: nobody answered, move to the next round.
    pub async fn skip(&self) -> Result<GameState, ServiceError> {
        let _gate = self.window.lock_writes().await;
        self.apply(GameAction::NextRound).await
    }

    /// Pause button.
    pub async fn toggle_pause(&self) -> Result<GameState, ServiceError> {
        let _gate = self.window.lock_writes().await;
        self.apply(GameAction::TogglePause).await
    }

    /// Start over with no teams and an empty history.
    pub async fn reset(&self) -> Result<GameState, ServiceError> {
        let _gate = self.window.lock_writes().await;
        self.apply(GameAction::ResetGame).await
    }

    /// Write the current state to the slot again, e.g. once storage recovers.
    pub async fn republish(&self) -> Result<(), ServiceError> {
        let _gate = self.window.lock_writes().await;
        self.window.publish().await?;
        Ok(())
    }

    async fn apply(&self, action: GameAction) -> Result<GameState, ServiceError> {
        self.apply_all(vec![action]).await
    }

    /// Apply `actions` in order and publish the result once. Nothing is kept
    /// unless every action went through and the publish succeeded.
    async fn apply_all(&self, actions: Vec<GameAction>) -> Result<GameState, ServiceError> {
        let now = self.clock.now_millis();
        let previous = self.window.state();
        let names = actions.iter().map(GameAction::name).collect::<Vec<_>>();

        for action in actions {
            let name = action.name();
            if let TransitionOutcome::Ignored(reason) =
                self.window.transition(|state| state.apply(action, now))
            {
                debug!(action = name, %reason, "transition ignored");
                self.window.restore(previous);
                return Err(reason.into());
            }
        }

        if let Err(err) = self.window.publish().await {
            warn!(actions = ?names, error = %err, "failed to publish transition; rolling back");
            self.window.restore(previous);
            return Err(err.into());
        }

        debug!(actions = ?names, window = %self.window.id(), "transition published");
        Ok(self.window.state())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use futures::future::BoxFuture;
    use tokio::{sync::broadcast, time::sleep};

    use super::*;
    use crate::{
        catalog::Category,
        state::{clock::ManualClock, game::TeamColor, phase::IgnoreReason},
        sync::{
            MemorySlot, StateSlot, StorageError, StorageNotice, StorageResult, WindowId,
            WindowRole, snapshot, spawn_sync_loop,
        },
    };

    fn example(id: &str, category: Category, patterns: usize) -> PatternExample {
        PatternExample {
            id: id.into(),
            title: format!("title {id}"),
            category,
            code: "interface Shape {}".into(),
            solution_patterns: (0..patterns).map(|i| format!("Pattern {i}")).collect(),
            solution_explanation: "see above".into(),
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::new(vec![
                example("creational-01", Category::Creational, 1),
                example("creational-02", Category::Creational, 2),
                example("structural-01", Category::Structural, 2),
                example("behavioral-01", Category::Behavioral, 1),
            ])
            .unwrap(),
        )
    }

    fn controller_over(slot: Arc<dyn StateSlot>) -> (RoundController, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let window = Arc::new(Window::new(WindowRole::Control, slot));
        (
            RoundController::new(window, catalog(), clock.clone()),
            clock,
        )
    }

    fn controller() -> (RoundController, Arc<ManualClock>, MemorySlot) {
        let slot = MemorySlot::default();
        let (controller, clock) = controller_over(Arc::new(slot.clone()));
        (controller, clock, slot)
    }

    async fn with_teams(controller: &RoundController) -> (Uuid, Uuid) {
        let a = Team::new("A", TeamColor::default());
        let b = Team::new("B", TeamColor::default());
        let ids = (a.id, b.id);
        controller.set_teams(vec![a, b]).await.unwrap();
        ids
    }

    #[tokio::test]
    async fn show_example_picks_the_single_match() {
        let (controller, _, slot) = controller();
        controller
            .select_category(CategoryFilter::Creational)
            .await
            .unwrap();
        controller
            .select_pattern_count(PatternCount::new(2).unwrap())
            .await
            .unwrap();

        let shown = controller.show_example().await.unwrap();

        assert_eq!(shown.example.id, "creational-02");
        assert_eq!(shown.remaining, 0);
        let state = controller.window().state();
        assert_eq!(state.current_example(), Some(&shown.example));
        assert!(state.used_example_ids().contains("creational-02"));
        assert_eq!(state.round_start_time(), Some(1_000));

        let stored = snapshot::decode(&slot.read().await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.state, state);
    }

    #[tokio::test]
    async fn show_example_requires_filters() {
        let (controller, _, _) = controller();
        assert!(matches!(
            controller.show_example().await,
            Err(ServiceError::InvalidState(_))
        ));

        controller.select_category(CategoryFilter::All).await.unwrap();
        assert!(matches!(
            controller.show_example().await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn exhausted_filters_leave_the_state_unchanged() {
        let (controller, _, _) = controller();
        controller
            .select_category(CategoryFilter::Structural)
            .await
            .unwrap();
        controller
            .select_pattern_count(PatternCount::new(2).unwrap())
            .await
            .unwrap();
        controller.show_example().await.unwrap();
        controller.skip().await.unwrap();
        controller
            .select_category(CategoryFilter::Structural)
            .await
            .unwrap();
        controller
            .select_pattern_count(PatternCount::new(2).unwrap())
            .await
            .unwrap();
        let before = controller.window().state();

        assert!(matches!(
            controller.show_example().await,
            Err(ServiceError::CatalogExhausted)
        ));
        assert_eq!(controller.window().state(), before);
    }

    #[tokio::test]
    async fn award_scores_and_advances_together() {
        let (controller, clock, _) = controller();
        let (a, b) = with_teams(&controller).await;
        controller.select_category(CategoryFilter::All).await.unwrap();
        controller
            .select_pattern_count(PatternCount::new(1).unwrap())
            .await
            .unwrap();
        controller.show_example().await.unwrap();
        controller.reveal().await.unwrap();
        clock.advance(12_000);

        let state = controller.award(a).await.unwrap();

        assert_eq!(state.team(a).unwrap().score, 1);
        assert_eq!(state.team(b).unwrap().score, 0);
        assert_eq!(state.round_number(), 2);
        assert!(state.current_example().is_none());
        assert_eq!(state.answer_history().len(), 1);
        assert_eq!(state.answer_history()[0].round_number, 1);
        assert_eq!(state.answer_history()[0].elapsed_seconds, 12);
    }

    #[tokio::test]
    async fn guarded_intents_are_rejected_without_publishing() {
        let (controller, _, slot) = controller();
        let (a, _) = with_teams(&controller).await;
        let stored_before = slot.read().await.unwrap();

        assert!(matches!(
            controller.reveal().await,
            Err(ServiceError::Rejected(IgnoreReason::NoCurrentExample))
        ));
        assert!(matches!(
            controller.award(a).await,
            Err(ServiceError::Rejected(IgnoreReason::NoCurrentExample))
        ));
        assert!(matches!(
            controller.toggle_pause().await,
            Err(ServiceError::Rejected(_))
        ));
        assert_eq!(controller.window().state().round_number(), 1);
        assert_eq!(slot.read().await.unwrap(), stored_before);
    }

    #[tokio::test]
    async fn skip_advances_without_history() {
        let (controller, _, _) = controller();
        controller.skip().await.unwrap();
        let state = controller.skip().await.unwrap();

        assert_eq!(state.round_number(), 3);
        assert!(state.answer_history().is_empty());
    }

    #[tokio::test]
    async fn reset_returns_to_a_fresh_game() {
        let (controller, _, _) = controller();
        with_teams(&controller).await;
        controller.skip().await.unwrap();

        let state = controller.reset().await.unwrap();
        assert_eq!(state, GameState::new());
    }

    #[derive(Clone)]
    struct BrokenSlot {
        notices: broadcast::Sender<StorageNotice>,
    }

    impl StateSlot for BrokenSlot {
        fn key(&self) -> &str {
            "broken"
        }

        fn read(&self) -> BoxFuture<'static, StorageResult<Option<String>>> {
            Box::pin(async { Ok(None) })
        }

        fn write(&self, _origin: WindowId, _payload: String) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "disk full".into(),
                    std::io::Error::other("disk full"),
                ))
            })
        }

        fn subscribe(&self) -> broadcast::Receiver<StorageNotice> {
            self.notices.subscribe()
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn failed_publish_rolls_the_transition_back() {
        let (notices, _) = broadcast::channel(1);
        let (controller, _) = controller_over(Arc::new(BrokenSlot { notices }));

        assert!(matches!(
            controller.skip().await,
            Err(ServiceError::Unavailable(_))
        ));
        assert_eq!(controller.window().state().round_number(), 1);
    }

    /// Memory slot whose reads return the value seen when the read started,
    /// 100 ms later.
    #[derive(Clone, Default)]
    struct SlowReadSlot {
        inner: MemorySlot,
    }

    impl StateSlot for SlowReadSlot {
        fn key(&self) -> &str {
            self.inner.key()
        }

        fn read(&self) -> BoxFuture<'static, StorageResult<Option<String>>> {
            let read = self.inner.read();
            Box::pin(async move {
                let value = read.await;
                sleep(Duration::from_millis(100)).await;
                value
            })
        }

        fn write(&self, origin: WindowId, payload: String) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.write(origin, payload)
        }

        fn subscribe(&self) -> broadcast::Receiver<StorageNotice> {
            self.inner.subscribe()
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_polls_of_the_control_window_never_undo_a_round() {
        let (controller, _) = controller_over(Arc::new(SlowReadSlot::default()));
        let _sync = spawn_sync_loop(controller.window().clone(), Duration::from_millis(500));

        sleep(Duration::from_millis(510)).await;
        controller.skip().await.unwrap();
        sleep(Duration::from_millis(140)).await;
        controller.skip().await.unwrap();
        sleep(Duration::from_secs(2)).await;

        assert_eq!(controller.window().state().round_number(), 3);
    }

    /// Memory slot accepting a fixed number of writes, failing afterwards.
    struct WriteBudgetSlot {
        inner: MemorySlot,
        remaining: AtomicUsize,
    }

    impl StateSlot for WriteBudgetSlot {
        fn key(&self) -> &str {
            self.inner.key()
        }

        fn read(&self) -> BoxFuture<'static, StorageResult<Option<String>>> {
            self.inner.read()
        }

        fn write(&self, origin: WindowId, payload: String) -> BoxFuture<'static, StorageResult<()>> {
            let allowed = self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if allowed {
                self.inner.write(origin, payload)
            } else {
                Box::pin(async {
                    Err(StorageError::unavailable(
                        "write refused".into(),
                        std::io::Error::other("quota"),
                    ))
                })
            }
        }

        fn subscribe(&self) -> broadcast::Receiver<StorageNotice> {
            self.inner.subscribe()
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
    }

    #[tokio::test]
    async fn failed_award_keeps_neither_the_point_nor_the_history() {
        let inner = MemorySlot::default();
        // teams, category, pattern count and example go through; the award does not
        let slot = WriteBudgetSlot {
            inner: inner.clone(),
            remaining: AtomicUsize::new(4),
        };
        let (controller, _) = controller_over(Arc::new(slot));
        let (a, _) = with_teams(&controller).await;
        controller.select_category(CategoryFilter::All).await.unwrap();
        controller
            .select_pattern_count(PatternCount::new(1).unwrap())
            .await
            .unwrap();
        let shown = controller.show_example().await.unwrap();
        let before = controller.window().state();

        assert!(matches!(
            controller.award(a).await,
            Err(ServiceError::Unavailable(_))
        ));

        let state = controller.window().state();
        assert_eq!(state, before);
        assert_eq!(state.team(a).unwrap().score, 0);
        assert!(state.answer_history().is_empty());
        assert_eq!(state.round_number(), 1);
        assert_eq!(
            state.current_example().map(|example| example.id.as_str()),
            Some(shown.example.id.as_str())
        );

        let stored = snapshot::decode(&inner.read().await.unwrap().unwrap())
            .unwrap()
            .state;
        assert_eq!(stored, before);
    }
}
