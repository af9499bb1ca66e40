//! Shared stubs for in-crate tests: a recording timeline host and a
//! lifecycle-probing page.

use std::cell::RefCell;
use std::rc::Rc;

use portico_core::{Rect, Size, TimelineHost, TimelineId, TimelineSpec, Visual};

use crate::page::{NavDirection, Page, PageHandle, PageId, Param};
use crate::transition::AnimationGroup;

pub(crate) type EventLog = Rc<RefCell<Vec<String>>>;

pub(crate) fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn log_tail(log: &EventLog, n: usize) -> Vec<String> {
    let log = log.borrow();
    log[log.len().saturating_sub(n)..].to_vec()
}

/// A `TimelineHost` that records starts and aborts; tests feed progress
/// back through `NavigationController::timeline_event` by hand.
pub(crate) struct RecordingHost {
    pub(crate) started: Vec<TimelineSpec>,
    pub(crate) running: Vec<TimelineId>,
    pub(crate) aborted: Vec<TimelineId>,
}

impl RecordingHost {
    pub(crate) fn new() -> Self {
        Self {
            started: Vec::new(),
            running: Vec::new(),
            aborted: Vec::new(),
        }
    }

    pub(crate) fn last_started(&self) -> Option<&TimelineSpec> {
        self.started.last()
    }
}

impl TimelineHost for RecordingHost {
    fn start(&mut self, spec: TimelineSpec) {
        self.running.retain(|id| *id != spec.id);
        self.running.push(spec.id);
        self.started.push(spec);
    }

    fn abort(&mut self, id: TimelineId) -> bool {
        let was_running = self.running.contains(&id);
        self.running.retain(|running| *running != id);
        if was_running {
            self.aborted.push(id);
        }
        was_running
    }

    fn is_running(&self, id: TimelineId) -> bool {
        self.running.contains(&id)
    }
}

/// A page that appends every lifecycle callback to a shared log.
pub(crate) struct ProbePage {
    id: PageId,
    title: String,
    group: AnimationGroup,
    chrome: bool,
    swallow_back: bool,
    log: EventLog,
}

impl ProbePage {
    pub(crate) fn new(title: &str, log: &EventLog) -> Self {
        Self {
            id: PageId::next(),
            title: title.to_string(),
            group: AnimationGroup::slide(),
            chrome: true,
            swallow_back: false,
            log: Rc::clone(log),
        }
    }

    pub(crate) fn chrome_hidden(mut self) -> Self {
        self.chrome = false;
        self
    }

    pub(crate) fn group(mut self, group: AnimationGroup) -> Self {
        self.group = group;
        self
    }

    pub(crate) fn swallow_back(mut self) -> Self {
        self.swallow_back = true;
        self
    }

    pub(crate) fn handle(self) -> PageHandle {
        Rc::new(RefCell::new(self))
    }

    fn record(&self, what: &str) {
        self.log.borrow_mut().push(format!("{}:{what}", self.title));
    }
}

/// Shorthand: a chrome-visible sliding page.
pub(crate) fn probe(title: &str, log: &EventLog) -> PageHandle {
    ProbePage::new(title, log).handle()
}

impl Visual for ProbePage {
    fn measure(&mut self, available: Size) -> Size {
        available
    }

    fn arrange(&mut self, _rect: Rect) {}

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
