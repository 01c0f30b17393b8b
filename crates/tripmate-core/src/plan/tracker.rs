//! Timeout-bounded tracking of one room's plan-generation workflow.
//!
//! The user asks for a plan in chat; generation runs on a slow backend job
//! and announces its outcome as a message from the reserved `PLANNER`
//! sender on the room's realtime channel. The artifacts themselves are then
//! pulled over REST.
//!
//! ```text
//! Idle ──trigger──▶ Generating ──PLAN_READY──▶ Ready
//!                       │ ├──error text──▶ Error
//!                       │ └──timeout─────▶ TimedOut
//! any state ──trigger──▶ Generating (timer restarted)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tripmate_types::chat::{ChatMessage, RoomId};
use tripmate_types::config::PlanConfig;
use tripmate_types::error::HttpError;
use tripmate_types::plan::{PlanArtifact, PlanNotice, PlanNoticeKind, PlanWorkflowState};
use tripmate_types::realtime::PLAN_READY_SENTINEL;

use super::source::PlanSource;
use super::trigger::TriggerMatcher;

pub const TIMEOUT_NOTICE: &str = "일정 생성이 지연되고 있습니다. 잠시 후 다시 시도해주세요.";

/// What an inbound message meant to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundSignal {
    /// Not from the planner; nothing to do.
    NotPlanner,
    /// Generation finished; the artifact list was refetched.
    Ready,
    /// `PLAN_READY` while nothing was pending; the list was refetched only.
    Refreshed,
    /// Generation failed; a notice was posted.
    Failed,
    /// Planner chatter that changes nothing.
    Ignored,
}

struct Shared {
    state: watch::Sender<PlanWorkflowState>,
    notice: watch::Sender<Option<PlanNotice>>,
    artifacts: watch::Sender<Vec<PlanArtifact>>,
    /// Incremented on every trigger; a timer only fires for its own generation.
    generation: AtomicU64,
    notice_seq: AtomicU64,
    timer: Mutex<Option<CancellationToken>>,
    notice_timer: Mutex<Option<CancellationToken>>,
}

fn slot(mutex: &Mutex<Option<CancellationToken>>) -> MutexGuard<'_, Option<CancellationToken>> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn replace_timer(&self, token: Option<CancellationToken>) {
        let previous = std::mem::replace(&mut *slot(&self.timer), token);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    fn post_notice(self: &Arc<Self>, notice: PlanNotice, ttl: Duration) {
        let seq = self.notice_seq.fetch_add(1, Ordering::AcqRel) + 1;
        let token = CancellationToken::new();
        if let Some(previous) = slot(&self.notice_timer).replace(token.clone()) {
            previous.cancel();
        }
        self.notice.send_replace(Some(notice));

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(ttl) => {
                    shared.notice.send_if_modified(|current| {
                        if shared.notice_seq.load(Ordering::Acquire) != seq || current.is_none() {
                            return false;
                        }
                        *current = None;
                        true
                    });
                }
            }
        });
    }

    fn clear_notice(&self) {
        self.notice_seq.fetch_add(1, Ordering::AcqRel);
        if let Some(previous) = slot(&self.notice_timer).take() {
            previous.cancel();
        }
        self.notice.send_if_modified(|current| current.take().is_some());
    }

    /// Move `Generating` to `to`. Returns whether the transition happened.
    fn resolve(&self, to: PlanWorkflowState) -> bool {
        self.state.send_if_modified(|current| {
            if *current != PlanWorkflowState::Generating {
                return false;
            }
            *current = to;
            true
        })
    }
}

pub struct PlanWorkflowTracker<S: PlanSource> {
    room_id: RoomId,
    source: S,
    matcher: TriggerMatcher,
    error_markers: Vec<String>,
    timeout: Duration,
    notice_ttl: Duration,
    shared: Arc<Shared>,
}

impl<S: PlanSource> PlanWorkflowTracker<S> {
    pub fn new(room_id: RoomId, source: S, config: &PlanConfig) -> Self {
        Self {
            room_id,
            source,
            matcher: TriggerMatcher::new(&config.trigger_phrases),
            error_markers: config
                .error_markers
                .iter()
                .map(|m| m.to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            timeout: config.timeout(),
            notice_ttl: config.notice_duration(),
            shared: Arc::new(Shared {
                state: watch::Sender::new(PlanWorkflowState::Idle),
                notice: watch::Sender::new(None),
                artifacts: watch::Sender::new(Vec::new()),
                generation: AtomicU64::new(0),
                notice_seq: AtomicU64::new(0),
                timer: Mutex::new(None),
                notice_timer: Mutex::new(None),
            }),
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn state(&self) -> PlanWorkflowState {
        *self.shared.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PlanWorkflowState> {
        self.shared.state.subscribe()
    }

    pub fn notice(&self) -> Option<PlanNotice> {
        self.shared.notice.borrow().clone()
    }

    pub fn subscribe_notice(&self) -> watch::Receiver<Option<PlanNotice>> {
        self.shared.notice.subscribe()
    }

    pub fn artifacts(&self) -> Vec<PlanArtifact> {
        self.shared.artifacts.borrow().clone()
    }

    pub fn subscribe_artifacts(&self) -> watch::Receiver<Vec<PlanArtifact>> {
        self.shared.artifacts.subscribe()
    }

    pub fn dismiss_notice(&self) {
        self.shared.clear_notice();
    }

    /// Replace the artifact list with one fetched elsewhere (room entry).
    pub fn seed_artifacts(&self, artifacts: Vec<PlanArtifact>) {
        self.shared.artifacts.send_replace(artifacts);
    }

    /// Fetch the artifact list and replace the current one.
    pub async fn load_artifacts(&self) -> Result<usize, HttpError> {
        let artifacts = self.source.list_plans(self.room_id).await?;
        let count = artifacts.len();
        self.shared.artifacts.send_replace(artifacts);
        Ok(count)
    }

    /// Inspect a message the user is sending. Returns `true` when it starts
    /// (or restarts) plan generation.
    pub fn on_outgoing(&self, text: &str) -> bool {
        if !self.matcher.matches(text) {
            return false;
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let token = CancellationToken::new();
        self.shared.replace_timer(Some(token.clone()));
        self.shared.clear_notice();
        self.shared.state.send_replace(PlanWorkflowState::Generating);
        info!(room_id = %self.room_id, generation, "plan generation requested");

        let shared = Arc::clone(&self.shared);
        let timeout = self.timeout;
        let notice_ttl = self.notice_ttl;
        let room_id = self.room_id;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(timeout) => {}
            }
            let fired = shared.state.send_if_modified(|current| {
                if *current != PlanWorkflowState::Generating
                    || shared.generation.load(Ordering::Acquire) != generation
                {
                    return false;
                }
                *current = PlanWorkflowState::TimedOut;
                true
            });
            if fired {
                warn!(%room_id, ?timeout, "plan generation timed out");
                shared.post_notice(
                    PlanNotice {
                        kind: PlanNoticeKind::TimedOut,
                        text: TIMEOUT_NOTICE.to_string(),
                    },
                    notice_ttl,
                );
            }
        });
        true
    }

    /// Inspect a message received on the room's realtime channel.
    pub async fn on_inbound(&self, message: &ChatMessage) -> InboundSignal {
        if !message.is_from_planner() {
            return InboundSignal::NotPlanner;
        }
        let content = message.content.trim();

        if content == PLAN_READY_SENTINEL {
            let resolved = self.shared.resolve(PlanWorkflowState::Ready);
            if resolved {
                self.shared.replace_timer(None);
                info!(room_id = %self.room_id, "plan ready");
            } else {
                debug!(room_id = %self.room_id, state = %self.state(), "plan ready without pending request");
            }
            self.refresh_artifacts().await;
            return if resolved {
                InboundSignal::Ready
            } else {
                InboundSignal::Refreshed
            };
        }

        if self.is_error_text(content) && self.shared.resolve(PlanWorkflowState::Error) {
            self.shared.replace_timer(None);
            warn!(room_id = %self.room_id, "plan generation failed");
            self.shared.post_notice(
                PlanNotice {
                    kind: PlanNoticeKind::Error,
                    text: content.to_string(),
                },
                self.notice_ttl,
            );
            return InboundSignal::Failed;
        }

        InboundSignal::Ignored
    }

    /// Stop tracking: cancel timers and return to `Idle`.
    pub fn leave(&self) {
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.replace_timer(None);
        self.shared.clear_notice();
        self.shared.state.send_replace(PlanWorkflowState::Idle);
    }

    fn is_error_text(&self, content: &str) -> bool {
        let lowered = content.to_lowercase();
        self.error_markers.iter().any(|m| lowered.contains(m.as_str()))
    }

    async fn refresh_artifacts(&self) {
        match self.source.list_plans(self.room_id).await {
            Ok(artifacts) => {
                debug!(room_id = %self.room_id, count = artifacts.len(), "plan list refreshed");
                self.shared.artifacts.send_replace(artifacts);
            }
            Err(e) => {
                warn!(room_id = %self.room_id, error = %e, "plan list refresh failed, keeping previous list");
            }
        }
    }
}

impl<S: PlanSource> Drop for PlanWorkflowTracker<S> {
    fn drop(&mut self) {
        self.shared.replace_timer(None);
        if let Some(token) = slot(&self.shared.notice_timer).take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakePlans, artifact};

    const MINUTE: Duration = Duration::from_secs(60);

    fn planner(content: &str) -> ChatMessage {
        ChatMessage {
            id: None,
            sender_user_id: "PLANNER".to_string(),
            sender_user_name: Some("Planner".to_string()),
            content: content.to_string(),
            created_at: None,
            kind: Default::default(),
        }
    }

    fn user(content: &str) -> ChatMessage {
        ChatMessage {
            sender_user_id: "7".to_string(),
            ..planner(content)
        }
    }

    fn tracker(plans: Arc<FakePlans>) -> PlanWorkflowTracker<Arc<FakePlans>> {
        PlanWorkflowTracker::new(RoomId(1), plans, &PlanConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_trigger_leaves_idle() {
        let t = tracker(Arc::new(FakePlans::new(vec![])));
        assert!(!t.on_outgoing("안녕하세요"));
        assert_eq!(t.state(), PlanWorkflowState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_enters_generating() {
        let t = tracker(Arc::new(FakePlans::new(vec![])));
        assert!(t.on_outgoing("일정 짜줘"));
        assert_eq!(t.state(), PlanWorkflowState::Generating);
    }

    #[tokio::test(start_paused = true)]
    async fn test_plan_ready_fetches_exactly_once() {
        let plans = Arc::new(FakePlans::new(vec![artifact(1, "jeju.pdf")]));
        let t = tracker(plans.clone());
        t.on_outgoing("일정 짜줘");

        let signal = t.on_inbound(&planner("PLAN_READY")).await;

        assert_eq!(signal, InboundSignal::Ready);
        assert_eq!(t.state(), PlanWorkflowState::Ready);
        assert_eq!(plans.fetches(), 1);
        assert_eq!(t.artifacts(), vec![artifact(1, "jeju.pdf")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_once() {
        let t = tracker(Arc::new(FakePlans::new(vec![])));
        let mut states = t.subscribe_state();
        t.on_outgoing("generate plan");
        states.borrow_and_update();

        tokio::time::sleep(20 * MINUTE + Duration::from_secs(1)).await;

        assert_eq!(t.state(), PlanWorkflowState::TimedOut);
        assert!(states.has_changed().unwrap());
        states.borrow_and_update();
        let notice = t.notice().unwrap();
        assert_eq!(notice.kind, PlanNoticeKind::TimedOut);
        assert_eq!(notice.text, TIMEOUT_NOTICE);

        tokio::time::sleep(30 * MINUTE).await;
        assert!(!states.has_changed().unwrap());
        assert_eq!(t.state(), PlanWorkflowState::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_late_timeout_after_ready() {
        let t = tracker(Arc::new(FakePlans::new(vec![])));
        t.on_outgoing("일정 짜줘");
        t.on_inbound(&planner("PLAN_READY")).await;

        tokio::time::sleep(25 * MINUTE).await;

        assert_eq!(t.state(), PlanWorkflowState::Ready);
        assert!(t.notice().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_restarts_timer() {
        let t = tracker(Arc::new(FakePlans::new(vec![])));
        t.on_outgoing("일정 짜줘");
        tokio::time::sleep(15 * MINUTE).await;
        assert!(t.on_outgoing("다시 일정 짜줘"));

        tokio::time::sleep(10 * MINUTE).await;
        assert_eq!(t.state(), PlanWorkflowState::Generating);

        tokio::time::sleep(11 * MINUTE).await;
        assert_eq!(t.state(), PlanWorkflowState::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_text_posts_notice_that_expires() {
        let t = tracker(Arc::new(FakePlans::new(vec![])));
        t.on_outgoing("일정 짜줘");

        let signal = t.on_inbound(&planner("일정 생성 중 오류가 발생했습니다")).await;

        assert_eq!(signal, InboundSignal::Failed);
        assert_eq!(t.state(), PlanWorkflowState::Error);
        assert_eq!(t.notice().unwrap().kind, PlanNoticeKind::Error);

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(t.notice().is_none());

        // The cancelled generation timer never fires.
        tokio::time::sleep(25 * MINUTE).await;
        assert_eq!(t.state(), PlanWorkflowState::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_after_ready_keeps_list() {
        let plans = Arc::new(FakePlans::failing());
        let t = tracker(plans.clone());
        t.seed_artifacts(vec![artifact(1, "old.pdf")]);
        t.on_outgoing("일정 짜줘");

        assert_eq!(t.on_inbound(&planner("PLAN_READY")).await, InboundSignal::Ready);

        assert_eq!(t.state(), PlanWorkflowState::Ready);
        assert_eq!(t.artifacts(), vec![artifact(1, "old.pdf")]);
        assert!(t.notice().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_plan_ready_while_idle_only_refreshes() {
        let plans = Arc::new(FakePlans::new(vec![artifact(2, "busan.pdf")]));
        let t = tracker(plans.clone());

        assert_eq!(t.on_inbound(&planner("PLAN_READY")).await, InboundSignal::Refreshed);

        assert_eq!(t.state(), PlanWorkflowState::Idle);
        assert_eq!(plans.fetches(), 1);
        assert_eq!(t.artifacts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_senders_are_ignored() {
        let plans = Arc::new(FakePlans::new(vec![]));
        let t = tracker(plans.clone());
        t.on_outgoing("일정 짜줘");

        assert_eq!(t.on_inbound(&user("PLAN_READY")).await, InboundSignal::NotPlanner);
        assert_eq!(t.on_inbound(&planner("일정을 만드는 중이에요")).await, InboundSignal::Ignored);

        assert_eq!(t.state(), PlanWorkflowState::Generating);
        assert_eq!(plans.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_plan_ready_after_ten_minutes() {
        let plans = Arc::new(FakePlans::new(vec![]));
        let t = tracker(plans.clone());
        t.on_outgoing("일정 짜줘");

        tokio::time::sleep(10 * MINUTE).await;
        plans.set(vec![artifact(5, "trip.pdf")]);
        t.on_inbound(&planner("PLAN_READY")).await;

        assert_eq!(t.state(), PlanWorkflowState::Ready);
        assert_eq!(t.artifacts(), vec![artifact(5, "trip.pdf")]);

        tokio::time::sleep(15 * MINUTE).await;
        assert_eq!(t.state(), PlanWorkflowState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_cancels_workflow() {
        let t = tracker(Arc::new(FakePlans::new(vec![])));
        t.on_outgoing("일정 짜줘");
        t.leave();
        assert_eq!(t.state(), PlanWorkflowState::Idle);

        tokio::time::sleep(25 * MINUTE).await;
        assert_eq!(t.state(), PlanWorkflowState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_artifacts() {
        let plans = Arc::new(FakePlans::new(vec![artifact(1, "a.pdf"), artifact(2, "b.pdf")]));
        let t = tracker(plans.clone());
        assert_eq!(t.load_artifacts().await.unwrap(), 2);
        assert_eq!(t.artifacts().len(), 2);
    }
}
