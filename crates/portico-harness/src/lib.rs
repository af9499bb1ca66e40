#![forbid(unsafe_code)]

//! Test harness for portico: a deterministic animation host, a
//! lifecycle-probing page, and pump helpers for driving a
//! [`NavigationController`] without a real GUI framework.
//!
//! The harness owns the clock. Tests start transitions, then call
//! [`pump`] to advance scripted time and feed the resulting timeline
//! events back into the controller, observing container properties and
//! lifecycle logs at any intermediate instant.

use std::cell::RefCell;
use std::rc::Rc;

use portico_core::{
    Rect, Size, TimelineEvent, TimelineHost, TimelineId, TimelineSpec, Visual,
};
use portico_nav::{
    AnimationGroup, NavDirection, NavigationController, Page, PageHandle, PageId, Param,
};
use web_time::Duration;

/// Shared log of lifecycle callbacks, in firing order.
pub type LifecycleLog = Rc<RefCell<Vec<String>>>;

pub fn lifecycle_log() -> LifecycleLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// The last `n` log entries, cloned for assertions.
pub fn log_tail(log: &LifecycleLog, n: usize) -> Vec<String> {
    let log = log.borrow();
    log[log.len().saturating_sub(n)..].to_vec()
}

// ---------------------------------------------------------------------------
// ScriptedHost
// ---------------------------------------------------------------------------

struct RunningTimeline {
    spec: TimelineSpec,
    elapsed: Duration,
}

/// A deterministic [`TimelineHost`].
///
/// Started timelines only move when [`ScriptedHost::advance`] is called;
/// each step yields the `Frame`/`Finished` events a real host would have
/// delivered, for the test to feed back into the controller. Aborts are
/// reported as `Finished { aborted: true }` on the next drain, matching
/// hosts that complete aborted animations asynchronously.
#[derive(Default)]
pub struct ScriptedHost {
    running: Vec<RunningTimeline>,
    pending: Vec<TimelineEvent>,
    /// Every spec ever started, oldest first.
    pub started: Vec<TimelineSpec>,
    /// Every id ever aborted, oldest first.
    pub aborted: Vec<TimelineId>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a new host for sharing with a controller.
    pub fn shared() -> Rc<RefCell<ScriptedHost>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn last_started(&self) -> Option<TimelineSpec> {
        self.started.last().copied()
    }

    /// Advance scripted time, returning the events due.
    pub fn advance(&mut self, dt: Duration) -> Vec<TimelineEvent> {
        let mut events = std::mem::take(&mut self.pending);
        let mut still_running = Vec::new();
        for mut timeline in self.running.drain(..) {
            timeline.elapsed += dt;
            let id = timeline.spec.id;
            let raw = if timeline.spec.duration.is_zero() {
                1.0
            } else {
                (timeline.elapsed.as_secs_f32() / timeline.spec.duration.as_secs_f32()).min(1.0)
            };
            let progress = timeline.spec.easing.apply(raw);
            events.push(TimelineEvent::Frame { id, progress });
            if raw >= 1.0 {
                events.push(TimelineEvent::Finished { id, aborted: false });
            } else {
                still_running.push(timeline);
            }
        }
        self.running = still_running;
        events
    }

    /// Run every active timeline to completion.
    pub fn finish_all(&mut self) -> Vec<TimelineEvent> {
        let longest = self
            .running
            .iter()
            .map(|t| t.spec.duration)
            .max()
            .unwrap_or(Duration::ZERO);
        self.advance(longest)
    }
}

impl TimelineHost for ScriptedHost {
    fn start(&mut self, spec: TimelineSpec) {
        if let Some(pos) = self.running.iter().position(|t| t.spec.id == spec.id) {
            self.running.remove(pos);
            self.pending.push(TimelineEvent::Finished {
                id: spec.id,
                aborted: true,
            });
        }
        self.started.push(spec);
        self.running.push(RunningTimeline {
            spec,
            elapsed: Duration::ZERO,
        });
    }

    fn abort(&mut self, id: TimelineId) -> bool {
        let Some(pos) = self.running.iter().position(|t| t.spec.id == id) else {
            return false;
        };
        self.running.remove(pos);
        self.aborted.push(id);
        self.pending.push(TimelineEvent::Finished { id, aborted: true });
        true
    }

    fn is_running(&self, id: TimelineId) -> bool {
        self.running.iter().any(|t| t.spec.id == id)
    }
}

/// Advance the host and feed the resulting events to the controller.
pub fn pump(nav: &mut NavigationController, host: &Rc<RefCell<ScriptedHost>>, dt: Duration) {
    let events = host.borrow_mut().advance(dt);
    tracing::trace!(count = events.len(), "pumping timeline events");
    for event in events {
        nav.timeline_event(event);
    }
}

/// Run every active timeline to completion and deliver the events.
pub fn pump_to_end(nav: &mut NavigationController, host: &Rc<RefCell<ScriptedHost>>) {
    // Aborted finishes queued during the drain surface on the next
    // advance, so keep pumping until the host goes quiet.
    loop {
        let events = host.borrow_mut().finish_all();
        if events.is_empty() {
            return;
        }
        for event in events {
            nav.timeline_event(event);
        }
    }
}

// ---------------------------------------------------------------------------
// ProbePage
// ---------------------------------------------------------------------------

/// A page that records its lifecycle into a [`LifecycleLog`].
pub struct ProbePage {
    id: PageId,
    title: String,
    group: AnimationGroup,
    chrome: bool,
    swallow_back: bool,
    arranged: Option<Rect>,
    log: LifecycleLog,
}

impl ProbePage {
    pub fn new(title: &str, log: &LifecycleLog) -> Self {
        Self {
            id: PageId::next(),
            title: title.to_string(),
            group: AnimationGroup::slide(),
            chrome: true,
            swallow_back: false,
            arranged: None,
            log: Rc::clone(log),
        }
    }

    pub fn chrome_hidden(mut self) -> Self {
        self.chrome = false;
        self
    }

    pub fn group(mut self, group: AnimationGroup) -> Self {
        self.group = group;
        self
    }

    pub fn swallow_back(mut self) -> Self {
        self.swallow_back = true;
        self
    }

    pub fn handle(self) -> PageHandle {
        Rc::new(RefCell::new(self))
    }

    /// The rect this page was last arranged into, if any.
    pub fn arranged(&self) -> Option<Rect> {
        self.arranged
    }

    fn record(&self, what: &str) {
        self.log.borrow_mut().push(format!("{}:{what}", self.title));
    }
}

/// Shorthand for a chrome-visible sliding page.
pub fn page(title: &str, log: &LifecycleLog) -> PageHandle {
    ProbePage::new(title, log).handle()
}

impl Visual for ProbePage {
    fn measure(&mut self, available: Size) -> Size {
        available
    }

    fn arrange(&mut self, rect: Rect) {
        self.arranged = Some(rect);
    }

    fn raise_to_front(&mut self) {}
}

impl Page for ProbePage {
    fn id(&self) -> PageId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn chrome_visible(&self) -> bool {
        self.chrome
    }

    fn animation_group(&self) -> &AnimationGroup {
        &self.group
    }

    fn on_appearing(&mut self, _direction: NavDirection, _parameter: Option<&Param>) {
        self.record("appearing");
    }

    fn on_appeared(&mut self, _direction: NavDirection) {
        self.record("appeared");
    }

    fn on_disappearing(&mut self, _direction: NavDirection) {
        self.record("disappearing");
    }

    fn on_disappeared(&mut self, _direction: NavDirection) {
        self.record("disappeared");
    }

    fn on_device_back_button(&mut self) -> bool {
        self.record("back-button");
        self.swallow_back
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::{Easing, TimelineKind};

    fn spec(scope: u64, millis: u64) -> TimelineSpec {
        TimelineSpec::new(
            TimelineId::new(scope, TimelineKind::Transition, 0),
            Duration::from_millis(millis),
            Easing::Linear,
        )
    }

    #[test]
    fn advance_emits_frames_then_finish() {
        let mut host = ScriptedHost::new();
        host.start(spec(1, 100));

        let events = host.advance(Duration::from_millis(50));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            TimelineEvent::Frame { progress, .. } if (progress - 0.5).abs() < 1e-5
        ));

        let events = host.advance(Duration::from_millis(50));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], TimelineEvent::Finished { aborted: false, .. }));
        assert_eq!(host.running_count(), 0);
    }

    #[test]
    fn abort_reports_on_next_drain() {
        let mut host = ScriptedHost::new();
        let s = spec(1, 100);
        host.start(s);
        assert!(host.abort(s.id));
        assert!(!host.abort(s.id), "second abort finds nothing");

        let events = host.advance(Duration::from_millis(10));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TimelineEvent::Finished { aborted: true, .. }));
    }

    #[test]
    fn restarting_a_name_aborts_the_old_run() {
        let mut host = ScriptedHost::new();
        let s = spec(1, 100);
        host.start(s);
        host.start(s);
        assert_eq!(host.running_count(), 1);
        let events = host.advance(Duration::from_millis(100));
        // Aborted old run surfaces first, then the fresh run's events.
        assert!(matches!(events[0], TimelineEvent::Finished { aborted: true, .. }));
        assert!(matches!(events[2], TimelineEvent::Finished { aborted: false, .. }));
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let mut host = ScriptedHost::new();
        host.start(spec(1, 0));
        let events = host.advance(Duration::ZERO);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], TimelineEvent::Finished { aborted: false, .. }));
    }
}
