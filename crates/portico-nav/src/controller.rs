//! The navigation controller: the page stack and everything that moves it.
//!
//! A controller owns the ordered stack of [`PageStackEntry`]s, two
//! [`Container`] slots whose top/bottom *roles* swap after committed
//! transitions, and up to two chrome instances. Push, pop, and the
//! gesture-driven back pan all run through the same machinery: mutate
//! the stack eagerly, stage the affected containers, hand chrome
//! ownership across via one decision table, then drive container
//! properties from host-reported timeline progress until a `Finished`
//! event finalizes (or an abort leaves the pre-transition state behind).
//!
//! # Invariants
//!
//! 1. Once initialized the stack never drops below one entry; `pop` on a
//!    singleton stack is a silent no-op.
//! 2. State is finalized only on `Finished { aborted: false }`; an abort
//!    leaves the pre-transition state intact except for chrome/container
//!    reassignments, which are idempotent and safe to redo.
//! 3. Push, pop, and pan-settle share one named timeline, so starting
//!    any of them aborts whichever is running. Gesture starts abort
//!    unconditionally.
//! 4. Only the controller mutates container role assignment.
//!
//! # Failure Modes
//!
//! - Timeline events for unknown or already-finished timelines are
//!   dropped.
//! - A pan cancel with no matching start is ignored (see
//!   [`crate::gesture`]).

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use portico_core::{
    BackdropConfig, Easing, EdgeHotZone, Rect, Size, TimelineEvent, TimelineHost, TimelineId,
    TimelineKind, TimelineSpec, VisualEffects,
};
use tracing::{debug, trace};
use web_time::Duration;

use crate::chrome::{ChromeHandoff, ChromeInstance, ChromeTemplate, ChromeTemplateError, decide_handoff};
use crate::completion::{Completion, CompletionHandle, completion_pair};
use crate::container::{Container, Z_BOTTOM, Z_RAISED, Z_TOP};
use crate::gesture::{BackPan, PanAction};
use crate::page::{NavDirection, PageHandle, PageId, PageStackEntry, PageState, Param};
use crate::transition::{PARALLAX_FRACTION, PlannedDef, plan_pair};

/// Global counter for controller scopes, shared with nested instances.
static CONTROLLER_SCOPE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Shared handle to the host's animation scheduler.
pub type SharedHost = Rc<RefCell<dyn TimelineHost>>;

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct NavConfig {
    /// Duration of programmatic push/pop transitions and the cap for
    /// pan-settle animations.
    pub transition_duration: Duration,
    /// The back-gesture edge strip.
    pub hot_zone: EdgeHotZone,
    /// Release threshold for the back pan, as a fraction of viewport
    /// width. Fixed; there is no velocity term.
    pub pan_commit_fraction: f32,
    /// Globally suppress animations (all transitions assign
    /// synchronously).
    pub animations_enabled: bool,
    /// Backdrop for dark overlays and modal presentation.
    pub backdrop: BackdropConfig,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            transition_duration: Duration::from_millis(350),
            hot_zone: EdgeHotZone::default(),
            pan_commit_fraction: 0.5,
            animations_enabled: true,
            backdrop: BackdropConfig::default(),
        }
    }
}

impl NavConfig {
    pub fn transition_duration(mut self, duration: Duration) -> Self {
        self.transition_duration = duration;
        self
    }

    pub fn hot_zone(mut self, hot_zone: EdgeHotZone) -> Self {
        self.hot_zone = hot_zone;
        self
    }

    pub fn pan_commit_fraction(mut self, fraction: f32) -> Self {
        self.pan_commit_fraction = fraction;
        self
    }

    pub fn animations_enabled(mut self, enabled: bool) -> Self {
        self.animations_enabled = enabled;
        self
    }

    pub fn backdrop(mut self, backdrop: BackdropConfig) -> Self {
        self.backdrop = backdrop;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransitionKind {
    Push,
    Pop,
    PanCommit,
    PanCancel,
    ModalIn,
    ModalOut,
}

/// Dark-overlay fade riding on a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OverlayFade {
    pub(crate) slot: usize,
    pub(crate) base: f32,
    pub(crate) fade_in: bool,
}

pub(crate) enum TransitionDetail {
    /// Page slide driven by planned defs on both containers.
    Slide {
        incoming: Option<PlannedDef>,
        outgoing: Option<PlannedDef>,
        incoming_slot: usize,
        outgoing_slot: usize,
        overlay: Option<OverlayFade>,
        chrome_slide: bool,
    },
    /// Pan settle: overall pan progress interpolates `from -> to`.
    PanSettle { from: f32, to: f32 },
    /// Modal presentation/dismissal on one container's overlay.
    ModalSlide {
        def: Option<PlannedDef>,
        host_slot: usize,
        fade_in: bool,
        backdrop_base: f32,
    },
}

pub(crate) struct ActiveTransition {
    pub(crate) kind: TransitionKind,
    pub(crate) timeline: TimelineId,
    pub(crate) detail: TransitionDetail,
    /// Page leaving the stack (pop, pan commit) or being covered
    /// (push); lifecycle completion fires on this handle because the
    /// entry may already be gone from the stack.
    pub(crate) outgoing_page: Option<PageHandle>,
    pub(crate) completion: Option<CompletionHandle<()>>,
}

/// Visuals driven directly by pan distance while scrubbing.
#[derive(Debug, Clone, Copy)]
struct PanVisuals {
    overlay_slot: Option<usize>,
    overlay_base: f32,
    chrome_slide: bool,
}

/// The stack-based page navigation controller.
pub struct NavigationController {
    id: u64,
    pub(crate) config: NavConfig,
    host: SharedHost,
    viewport: Size,
    pub(crate) stack: Vec<PageStackEntry>,
    containers: [Container; 2],
    top: usize,
    chrome_template: Option<ChromeTemplate>,
    transition: Option<ActiveTransition>,
    pub(crate) modal_transition: Option<ActiveTransition>,
    timeline_runs: u64,
    pan: BackPan,
    pan_visuals: Option<PanVisuals>,
    pub(crate) pending_modals: AHashMap<u64, CompletionHandle<Option<Param>>>,
    has_pages_listener: Option<Box<dyn FnMut(bool)>>,
}

impl NavigationController {
    pub fn new(config: NavConfig, host: SharedHost) -> Self {
        Self {
            id: CONTROLLER_SCOPE_COUNTER.fetch_add(1, Ordering::Relaxed),
            config,
            host,
            viewport: Size::ZERO,
            stack: Vec::new(),
            containers: [Container::new(Z_TOP), Container::new(Z_BOTTOM)],
            top: 0,
            chrome_template: None,
            transition: None,
            modal_transition: None,
            timeline_runs: 0,
            pan: BackPan::default(),
            pan_visuals: None,
            pending_modals: AHashMap::new(),
            has_pages_listener: None,
        }
    }

    /// A nested instance serving as a modal overlay controller.
    pub(crate) fn nested(config: &NavConfig, host: SharedHost, viewport: Size) -> Self {
        let mut controller = Self::new(config.clone(), host);
        controller.viewport = viewport;
        controller
    }

    /// The controller's timeline scope; every animation it starts is
    /// namespaced by this value.
    pub fn scope(&self) -> u64 {
        self.id
    }

    /// Install the chrome template. Validation is synchronous: a
    /// template without the required bar child never gets installed.
    pub fn set_chrome_template(
        &mut self,
        template: ChromeTemplate,
    ) -> Result<(), ChromeTemplateError> {
        template.validate()?;
        self.chrome_template = Some(template);
        Ok(())
    }

    /// Observe transitions between "no pages" and "has pages".
    pub fn on_has_pages_changed(&mut self, listener: impl FnMut(bool) + 'static) {
        self.has_pages_listener = Some(Box::new(listener));
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        for container in &mut self.containers {
            if let Some(page) = container.page().cloned() {
                let mut page = page.borrow_mut();
                page.measure(viewport);
                page.arrange(Rect::from_size(viewport));
            }
            if let Some(modal) = container.modal_mut() {
                modal.set_viewport(viewport);
            }
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    // --- Read-only surface ---

    pub fn navigation_stack(&self) -> &[PageStackEntry] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn has_pages(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn top_page(&self) -> Option<PageHandle> {
        self.stack.last().map(|entry| entry.page.clone())
    }

    /// Modal pages open on the current top entry, bottom first.
    pub fn modal_stack(&self) -> Vec<PageHandle> {
        self.stack
            .last()
            .map(|entry| entry.modal_pages.clone())
            .unwrap_or_default()
    }

    pub fn top_container(&self) -> &Container {
        &self.containers[self.top]
    }

    pub fn bottom_container(&self) -> &Container {
        &self.containers[1 - self.top]
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some() || self.modal_transition.is_some()
    }

    /// Whether the back-gesture strip is live.
    pub fn hot_zone_armed(&self) -> bool {
        self.stack.len() >= 2 && !self.top_entry_has_modal()
    }

    /// Current phase of the back gesture.
    pub fn pan_phase(&self) -> crate::gesture::PanPhase {
        self.pan.phase()
    }

    pub fn hot_zone_frame(&self) -> Rect {
        self.config.hot_zone.frame(self.viewport)
    }

    /// Forward the host's scrolled-out signal to the live chrome bar.
    pub fn set_chrome_scrolled_out(&mut self, scrolled_out: bool) {
        if let Some(chrome) = self.containers[self.top].chrome_mut() {
            chrome.set_scrolled_out(scrolled_out);
        }
    }

    // --- Push / pop ---

    /// Push a page. The first push initializes the stack synchronously;
    /// later pushes animate unless animations are suppressed.
    pub fn push(&mut self, page: PageHandle, parameter: Option<Param>) -> Completion<()> {
        self.interrupt_in_flight();
        let first = self.stack.is_empty();
        debug!(page = page.borrow().id().id(), first, "push");
        self.stack.push(PageStackEntry::new(page.clone()));
        if first {
            self.notify_has_pages();
            return self.assign_first(parameter);
        }
        if !self.config.animations_enabled {
            return self.push_synchronously(parameter);
        }
        self.animate_push(page, parameter)
    }

    /// Push `page` and discard every entry below it: "reset to this
    /// page". The transition looks like a plain push.
    pub fn push_root(
        &mut self,
        page: PageHandle,
        parameter: Option<Param>,
        animated: bool,
    ) -> Completion<()> {
        let saved = self.config.animations_enabled;
        if !animated {
            self.config.animations_enabled = false;
        }
        let completion = self.push(page, parameter);
        self.config.animations_enabled = saved;

        if self.stack.len() > 1 {
            let removed: Vec<PageStackEntry> =
                self.stack.drain(..self.stack.len() - 1).collect();
            debug!(discarded = removed.len(), "push_root trimmed stack");
            for entry in &removed {
                self.resolve_dropped_modals(entry);
            }
            for container in &mut self.containers {
                if let Some(chrome) = container.chrome_mut() {
                    chrome.stack_mut().clear_below_top();
                }
            }
        }
        completion
    }

    /// Pop the top page. Silent no-op when fewer than two entries.
    pub fn pop(&mut self, parameter: Option<Param>) -> Completion<()> {
        if self.stack.len() < 2 {
            return Completion::ready(());
        }
        self.interrupt_in_flight();
        debug!(depth = self.stack.len(), "pop");
        if !self.config.animations_enabled {
            return self.pop_synchronously(parameter);
        }
        self.animate_pop(parameter)
    }

    /// A tap on the chrome's back element.
    pub fn chrome_back_tapped(&mut self) {
        let _ = self.pop(None);
    }

    // --- Gesture entry point ---

    pub fn handle_pan_event(&mut self, event: portico_core::PanEvent) {
        let armed = self.hot_zone_armed();
        let width = self.viewport.width;
        let action = self
            .pan
            .on_event(event, width, armed, self.config.pan_commit_fraction);
        match action {
            PanAction::Ignore => {}
            PanAction::Begin => self.begin_back_pan(),
            PanAction::Scrub { fraction } => self.apply_pan_progress(fraction),
            PanAction::Commit { fraction } => self.commit_back_pan(fraction),
            PanAction::Cancel { fraction } => self.cancel_back_pan(fraction),
        }
    }

    // --- Timeline events from the host ---

    pub fn timeline_event(&mut self, event: TimelineEvent) {
        let id = event.id();
        if id.scope != self.id {
            for container in &mut self.containers {
                if let Some(modal) = container.modal_mut() {
                    modal.timeline_event(event);
                }
            }
            return;
        }
        match event {
            TimelineEvent::Frame { progress, .. } => self.apply_timeline_frame(id, progress),
            TimelineEvent::Finished { aborted, .. } => self.finish_timeline(id, aborted),
        }
    }

    fn apply_timeline_frame(&mut self, id: TimelineId, progress: f32) {
        let active = match id.kind {
            TimelineKind::Transition => self.transition.take_if(|a| a.timeline == id),
            TimelineKind::Modal => self.modal_transition.take_if(|a| a.timeline == id),
        };
        let Some(active) = active else { return };
        self.apply_detail_frame(&active.detail, progress);
        match id.kind {
            TimelineKind::Transition => self.transition = Some(active),
            TimelineKind::Modal => self.modal_transition = Some(active),
        }
    }

    fn finish_timeline(&mut self, id: TimelineId, aborted: bool) {
        let active = match id.kind {
            TimelineKind::Transition => self.transition.take_if(|a| a.timeline == id),
            TimelineKind::Modal => self.modal_transition.take_if(|a| a.timeline == id),
        };
        let Some(active) = active else { return };
        if aborted {
            trace!(kind = ?active.kind, "timeline finished aborted; state left as-is");
            if let Some(completion) = active.completion {
                completion.resolve(());
            }
            return;
        }
        self.apply_detail_frame(&active.detail, 1.0);
        match active.kind {
            TransitionKind::Push => self.finalize_push(active),
            TransitionKind::Pop | TransitionKind::PanCommit => self.finalize_pop(active),
            TransitionKind::PanCancel => {
                self.finalize_pan_cancel();
                if let Some(completion) = active.completion {
                    completion.resolve(());
                }
            }
            TransitionKind::ModalIn | TransitionKind::ModalOut => self.finalize_modal(active),
        }
    }

    // --- Internals: shared plumbing ---

    fn swap_roles(&mut self) {
        self.top = 1 - self.top;
    }

    pub(crate) fn top_slot(&self) -> usize {
        self.top
    }

    pub(crate) fn container_mut(&mut self, slot: usize) -> &mut Container {
        &mut self.containers[slot]
    }

    pub(crate) fn top_entry_has_modal(&self) -> bool {
        self.stack.last().is_some_and(|entry| entry.has_modal())
    }

    pub(crate) fn shared_host(&self) -> SharedHost {
        Rc::clone(&self.host)
    }

    /// Allocate the id for one timeline run. `(scope, kind)` is the
    /// abort group; the run counter binds completion events to the run
    /// that produced them.
    pub(crate) fn next_timeline(&mut self, kind: TimelineKind) -> TimelineId {
        self.timeline_runs += 1;
        TimelineId::new(self.id, kind, self.timeline_runs)
    }

    fn chrome_scrolled_out(&self) -> bool {
        self.containers[self.top]
            .chrome()
            .is_some_and(|chrome| chrome.scrolled_out())
    }

    fn notify_has_pages(&mut self) {
        let has = !self.stack.is_empty();
        if let Some(listener) = self.has_pages_listener.as_mut() {
            listener(has);
        }
    }

    /// Abort any running push/pop/pan-settle and drop a live scrub.
    fn interrupt_in_flight(&mut self) {
        if self.pan.is_active() {
            self.pan.reset();
            self.finalize_pan_cancel();
        }
        self.abort_nav_transition();
    }

    pub(crate) fn abort_nav_transition(&mut self) {
        if let Some(active) = self.transition.take() {
            self.host.borrow_mut().abort(active.timeline);
            trace!(kind = ?active.kind, "aborting in-flight transition");
            if let Some(completion) = active.completion {
                completion.resolve(());
            }
        }
    }

    pub(crate) fn abort_modal_transition(&mut self) {
        if let Some(active) = self.modal_transition.take() {
            self.host.borrow_mut().abort(active.timeline);
            trace!(kind = ?active.kind, "aborting in-flight modal transition");
            if let Some(completion) = active.completion {
                completion.resolve(());
            }
        }
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        for container in &mut self.containers {
            container.set_input_enabled(enabled);
        }
    }

    /// Re-enable input, keeping a container gated while it hosts an
    /// open modal overlay.
    pub(crate) fn restore_input(&mut self) {
        for container in &mut self.containers {
            let modal_open = container.modal().is_some_and(|modal| modal.has_pages());
            container.set_input_enabled(!modal_open);
        }
    }

    fn restore_z_order(&mut self) {
        self.containers[self.top].set_z(Z_TOP);
        self.containers[1 - self.top].set_z(Z_BOTTOM);
    }

    fn reset_chrome_transient(&mut self) {
        for container in &mut self.containers {
            if let Some(chrome) = container.chrome_mut() {
                chrome.reset_transient();
            }
        }
    }

    fn arrange_page(&self, page: &PageHandle) {
        let viewport = self.viewport;
        let mut page = page.borrow_mut();
        page.measure(viewport);
        page.arrange(Rect::from_size(viewport));
    }

    /// Move chrome ownership per the decision table. Idempotent: a
    /// redone hand-off finds the instance already in place.
    fn apply_handoff(&mut self, handoff: ChromeHandoff, incoming_slot: usize, outgoing_slot: usize) {
        trace!(?handoff, "chrome hand-off");
        match handoff {
            ChromeHandoff::StayHidden | ChromeHandoff::RetainOnOutgoing => {}
            ChromeHandoff::AdoptOnIncoming
            | ChromeHandoff::TransferInstant
            | ChromeHandoff::SlideShared => {
                if self.containers[incoming_slot].chrome().is_none() {
                    if let Some(instance) = self.containers[outgoing_slot].take_chrome() {
                        self.containers[incoming_slot].set_chrome(instance);
                    } else if let Some(template) = &self.chrome_template {
                        self.containers[incoming_slot].set_chrome(ChromeInstance::new(template));
                    }
                }
            }
        }
    }

    fn chrome_append(&mut self, slot: usize, id: PageId, title: String) {
        if let Some(chrome) = self.containers[slot].chrome_mut() {
            chrome.stack_mut().push(id, title);
        }
    }

    /// Remove `id` from whichever instance has it on top. Safe to call
    /// for hidden-chrome pages; nothing matches.
    fn chrome_remove(&mut self, id: PageId) {
        for container in &mut self.containers {
            if let Some(chrome) = container.chrome_mut() {
                chrome.stack_mut().pop(id);
            }
        }
    }

    // --- Lifecycle ---

    fn fire_appearing(&mut self, entry_idx: usize, direction: NavDirection, parameter: Option<&Param>) {
        let page = self.stack[entry_idx].page.clone();
        self.stack[entry_idx].state = PageState::Appearing;
        page.borrow_mut().on_appearing(direction, parameter);
    }

    fn fire_appeared(&mut self, entry_idx: usize, direction: NavDirection) {
        let page = self.stack[entry_idx].page.clone();
        self.stack[entry_idx].state = PageState::Appeared;
        page.borrow_mut().on_appeared(direction);
    }

    fn fire_disappearing(&mut self, entry_idx: usize, direction: NavDirection) {
        let page = self.stack[entry_idx].page.clone();
        self.stack[entry_idx].state = PageState::Disappearing;
        page.borrow_mut().on_disappearing(direction);
    }

    /// `Disappeared` fires on the handle because the entry may already
    /// be gone from the stack (pop mutates eagerly).
    fn fire_disappeared_handle(&mut self, page: &PageHandle, direction: NavDirection) {
        let id = page.borrow().id();
        if let Some(entry) = self.stack.iter_mut().find(|entry| entry.page_id() == id) {
            entry.state = PageState::Disappeared;
        }
        page.borrow_mut().on_disappeared(direction);
    }

    // --- Push paths ---

    fn assign_first(&mut self, parameter: Option<Param>) -> Completion<()> {
        let page = self.stack[0].page.clone();
        self.arrange_page(&page);
        let top = self.top;
        self.containers[top].reset_transient();
        self.containers[top].set_page(page.clone());
        if self.stack[0].chrome_visible() {
            self.apply_handoff(ChromeHandoff::AdoptOnIncoming, top, 1 - top);
            let (id, title) = {
                let page = page.borrow();
                (page.id(), page.title().to_string())
            };
            self.chrome_append(top, id, title);
        }
        self.restore_z_order();
        self.fire_appearing(0, NavDirection::Forward, parameter.as_ref());
        self.fire_appeared(0, NavDirection::Forward);
        Completion::ready(())
    }

    /// Unanimated push: full lifecycle and bookkeeping, no timeline.
    fn push_synchronously(&mut self, parameter: Option<Param>) -> Completion<()> {
        let incoming_idx = self.stack.len() - 1;
        let outgoing_idx = self.stack.len() - 2;
        let outgoing_page = self.stack[outgoing_idx].page.clone();
        let page = self.stack[incoming_idx].page.clone();

        let handoff = decide_handoff(
            self.stack[outgoing_idx].chrome_visible(),
            self.stack[incoming_idx].chrome_visible(),
            self.stack[outgoing_idx].has_modal(),
            self.chrome_scrolled_out(),
        );

        self.swap_roles();
        let (top, bottom) = (self.top, 1 - self.top);
        self.arrange_page(&page);
        self.containers[top].reset_transient();
        self.containers[top].set_page(page.clone());
        self.apply_handoff(handoff, top, bottom);
        if self.stack[incoming_idx].chrome_visible() {
            let (id, title) = {
                let page = page.borrow();
                (page.id(), page.title().to_string())
            };
            self.chrome_append(top, id, title);
        }

        self.fire_disappearing(outgoing_idx, NavDirection::Forward);
        self.fire_appearing(incoming_idx, NavDirection::Forward, parameter.as_ref());

        let _ = self.containers[bottom].take_page();
        self.containers[bottom].reset_transient();
        self.restore_z_order();
        self.restore_input();

        self.fire_disappeared_handle(&outgoing_page, NavDirection::Forward);
        self.fire_appeared(incoming_idx, NavDirection::Forward);
        Completion::ready(())
    }

    fn animate_push(&mut self, page: PageHandle, parameter: Option<Param>) -> Completion<()> {
        let incoming_idx = self.stack.len() - 1;
        let outgoing_idx = self.stack.len() - 2;
        let incoming_group = page.borrow().animation_group().clone();

        let in_def = incoming_group.r#in.clone();
        let out_def = incoming_group.previous_page_out_override.clone().or_else(|| {
            self.stack[outgoing_idx]
                .page
                .borrow()
                .animation_group()
                .out
                .clone()
        });
        let (duration, incoming_planned, outgoing_planned) = plan_pair(in_def, out_def);
        if (incoming_planned.is_none() && outgoing_planned.is_none()) || duration.is_zero() {
            return self.push_synchronously(parameter);
        }

        let handoff = decide_handoff(
            self.stack[outgoing_idx].chrome_visible(),
            self.stack[incoming_idx].chrome_visible(),
            self.stack[outgoing_idx].has_modal(),
            self.chrome_scrolled_out(),
        );
        let outgoing_page = self.stack[outgoing_idx].page.clone();

        self.swap_roles();
        let (top, bottom) = (self.top, 1 - self.top);
        self.arrange_page(&page);
        self.containers[top].reset_transient();
        self.containers[top].set_page(page.clone());
        self.apply_handoff(handoff, top, bottom);
        if self.stack[incoming_idx].chrome_visible() {
            let (id, title) = {
                let page = page.borrow();
                (page.id(), page.title().to_string())
            };
            self.chrome_append(top, id, title);
        }

        self.fire_disappearing(outgoing_idx, NavDirection::Forward);
        self.fire_appearing(incoming_idx, NavDirection::Forward, parameter.as_ref());

        // The incoming page animates above everything, chrome included.
        self.containers[top].set_z(Z_RAISED);
        page.borrow_mut().raise_to_front();
        self.set_input_enabled(false);
        self.containers[top]
            .effects
            .set(VisualEffects::SHADOW, incoming_group.shadow_enabled);

        let overlay = incoming_group.dark_overlay_enabled.then_some(OverlayFade {
            slot: bottom,
            base: self.config.backdrop.opacity,
            fade_in: true,
        });
        if overlay.is_some() {
            self.containers[bottom].effects.insert(VisualEffects::DARK_OVERLAY);
        }

        let detail = TransitionDetail::Slide {
            incoming: incoming_planned,
            outgoing: outgoing_planned,
            incoming_slot: top,
            outgoing_slot: bottom,
            overlay,
            chrome_slide: handoff == ChromeHandoff::SlideShared,
        };
        self.apply_detail_frame(&detail, 0.0);

        let (completion, handle) = completion_pair();
        let timeline = self.next_timeline(TimelineKind::Transition);
        self.host
            .borrow_mut()
            .start(TimelineSpec::new(timeline, duration, Easing::Linear));
        self.transition = Some(ActiveTransition {
            kind: TransitionKind::Push,
            timeline,
            detail,
            outgoing_page: Some(outgoing_page),
            completion: Some(handle),
        });
        completion
    }

    fn finalize_push(&mut self, active: ActiveTransition) {
        let bottom = 1 - self.top;
        let _ = self.containers[bottom].take_page();
        self.containers[bottom].reset_transient();
        self.containers[self.top].reset_transient();
        self.reset_chrome_transient();
        self.restore_z_order();
        self.restore_input();
        trace!("push finalized");

        if let Some(outgoing) = &active.outgoing_page {
            self.fire_disappeared_handle(outgoing, NavDirection::Forward);
        }
        let incoming_idx = self.stack.len() - 1;
        self.fire_appeared(incoming_idx, NavDirection::Forward);
        if let Some(completion) = active.completion {
            completion.resolve(());
        }
    }

    // --- Pop paths ---

    /// Stage the revealed entry's page (and its modal overlay, if any)
    /// into the bottom container ahead of a pop or pan.
    fn stage_reveal(&mut self, slot: usize, entry_idx: usize) {
        let page = self.stack[entry_idx].page.clone();
        self.arrange_page(&page);
        self.containers[slot].reset_transient();
        self.containers[slot].set_page(page);
        if self.stack[entry_idx].has_modal() {
            self.restore_modal_overlay(slot, entry_idx);
        }
    }

    fn pop_synchronously(&mut self, parameter: Option<Param>) -> Completion<()> {
        let outgoing_idx = self.stack.len() - 1;
        let incoming_idx = self.stack.len() - 2;
        let outgoing_page = self.stack[outgoing_idx].page.clone();
        let outgoing_visible = self.stack[outgoing_idx].chrome_visible();

        let handoff = decide_handoff(
            outgoing_visible,
            self.stack[incoming_idx].chrome_visible(),
            self.stack[outgoing_idx].has_modal(),
            self.chrome_scrolled_out(),
        );

        let (top, bottom) = (self.top, 1 - self.top);
        self.stage_reveal(bottom, incoming_idx);
        self.apply_handoff(handoff, bottom, top);
        if outgoing_visible {
            let id = outgoing_page.borrow().id();
            self.chrome_remove(id);
        }

        self.fire_disappearing(outgoing_idx, NavDirection::Backward);
        self.fire_appearing(incoming_idx, NavDirection::Backward, parameter.as_ref());

        let removed = self.stack.pop();
        if let Some(entry) = &removed {
            self.resolve_dropped_modals(entry);
        }

        self.swap_roles();
        let old_top = 1 - self.top;
        let _ = self.containers[old_top].take_page();
        self.reset_modal_overlay(old_top);
        self.containers[old_top].reset_transient();
        self.containers[self.top].reset_transient();
        self.restore_z_order();
        self.restore_input();

        self.fire_disappeared_handle(&outgoing_page, NavDirection::Backward);
        let revealed_idx = self.stack.len() - 1;
        self.fire_appeared(revealed_idx, NavDirection::Backward);
        Completion::ready(())
    }

    fn animate_pop(&mut self, parameter: Option<Param>) -> Completion<()> {
        let outgoing_idx = self.stack.len() - 1;
        let incoming_idx = self.stack.len() - 2;
        let outgoing_page = self.stack[outgoing_idx].page.clone();
        let outgoing_group = outgoing_page.borrow().animation_group().clone();
        let outgoing_visible = self.stack[outgoing_idx].chrome_visible();

        let back_in_def = outgoing_group
            .previous_page_back_in_override
            .clone()
            .or_else(|| {
                self.stack[incoming_idx]
                    .page
                    .borrow()
                    .animation_group()
                    .back_in
                    .clone()
            });
        let back_out_def = outgoing_group.back_out.clone();
        let (duration, incoming_planned, outgoing_planned) = plan_pair(back_in_def, back_out_def);
        if (incoming_planned.is_none() && outgoing_planned.is_none()) || duration.is_zero() {
            return self.pop_synchronously(parameter);
        }

        let handoff = decide_handoff(
            outgoing_visible,
            self.stack[incoming_idx].chrome_visible(),
            self.stack[outgoing_idx].has_modal(),
            self.chrome_scrolled_out(),
        );

        let (top, bottom) = (self.top, 1 - self.top);
        self.stage_reveal(bottom, incoming_idx);
        self.apply_handoff(handoff, bottom, top);
        if outgoing_visible {
            let id = outgoing_page.borrow().id();
            self.chrome_remove(id);
        }

        self.fire_disappearing(outgoing_idx, NavDirection::Backward);
        self.fire_appearing(incoming_idx, NavDirection::Backward, parameter.as_ref());

        let removed = self.stack.pop();
        if let Some(entry) = &removed {
            self.resolve_dropped_modals(entry);
        }

        self.set_input_enabled(false);
        self.containers[top]
            .effects
            .set(VisualEffects::SHADOW, outgoing_group.shadow_enabled);

        let overlay = outgoing_group.dark_overlay_enabled.then_some(OverlayFade {
            slot: bottom,
            base: self.config.backdrop.opacity,
            fade_in: false,
        });
        if overlay.is_some() {
            self.containers[bottom].effects.insert(VisualEffects::DARK_OVERLAY);
        }

        let detail = TransitionDetail::Slide {
            incoming: incoming_planned,
            outgoing: outgoing_planned,
            incoming_slot: bottom,
            outgoing_slot: top,
            overlay,
            chrome_slide: handoff == ChromeHandoff::SlideShared,
        };
        self.apply_detail_frame(&detail, 0.0);

        let (completion, handle) = completion_pair();
        let timeline = self.next_timeline(TimelineKind::Transition);
        self.host
            .borrow_mut()
            .start(TimelineSpec::new(timeline, duration, Easing::Linear));
        self.transition = Some(ActiveTransition {
            kind: TransitionKind::Pop,
            timeline,
            detail,
            outgoing_page: Some(outgoing_page),
            completion: Some(handle),
        });
        completion
    }

    /// Shared by pop and pan-commit settles: roles swap back, the old
    /// top is cleared, lifecycle completes.
    fn finalize_pop(&mut self, active: ActiveTransition) {
        self.swap_roles();
        let old_top = 1 - self.top;
        let _ = self.containers[old_top].take_page();
        self.reset_modal_overlay(old_top);
        self.containers[old_top].reset_transient();
        self.containers[self.top].reset_transient();
        self.reset_chrome_transient();
        self.restore_z_order();
        self.restore_input();
        self.pan_visuals = None;
        trace!(kind = ?active.kind, "pop finalized");

        if let Some(outgoing) = &active.outgoing_page {
            self.fire_disappeared_handle(outgoing, NavDirection::Backward);
        }
        let revealed_idx = self.stack.len() - 1;
        self.fire_appeared(revealed_idx, NavDirection::Backward);
        if let Some(completion) = active.completion {
            completion.resolve(());
        }
    }

    // --- Back pan ---

    fn begin_back_pan(&mut self) {
        self.abort_nav_transition();
        let outgoing_idx = self.stack.len() - 1;
        let incoming_idx = self.stack.len() - 2;
        let outgoing_group = self.stack[outgoing_idx].page.borrow().animation_group().clone();
        debug!("back pan started");

        // Same bookkeeping as pop, but the stack entry stays until the
        // gesture commits.
        let handoff = decide_handoff(
            self.stack[outgoing_idx].chrome_visible(),
            self.stack[incoming_idx].chrome_visible(),
            self.stack[outgoing_idx].has_modal(),
            self.chrome_scrolled_out(),
        );
        let (top, bottom) = (self.top, 1 - self.top);
        self.stage_reveal(bottom, incoming_idx);
        self.apply_handoff(handoff, bottom, top);

        self.fire_disappearing(outgoing_idx, NavDirection::Backward);
        self.fire_appearing(incoming_idx, NavDirection::Backward, None);

        self.set_input_enabled(false);
        self.containers[top]
            .effects
            .set(VisualEffects::SHADOW, outgoing_group.shadow_enabled);
        if outgoing_group.dark_overlay_enabled {
            self.containers[bottom].effects.insert(VisualEffects::DARK_OVERLAY);
        }
        self.pan_visuals = Some(PanVisuals {
            overlay_slot: outgoing_group.dark_overlay_enabled.then_some(bottom),
            overlay_base: self.config.backdrop.opacity,
            chrome_slide: handoff == ChromeHandoff::SlideShared,
        });
        self.apply_pan_progress(0.0);
    }

    /// Scrubbing: container translation, chrome translation, and overlay
    /// darkness are direct functions of pan distance.
    fn apply_pan_progress(&mut self, fraction: f32) {
        let width = self.viewport.width;
        let (top, bottom) = (self.top, 1 - self.top);
        self.containers[top].props.translation_x = fraction * width;
        self.containers[bottom].props.translation_x =
            -PARALLAX_FRACTION * width * (1.0 - fraction);
        let visuals = self.pan_visuals;
        if let Some(visuals) = visuals {
            if let Some(slot) = visuals.overlay_slot {
                self.containers[slot].overlay_opacity = visuals.overlay_base * (1.0 - fraction);
            }
            if visuals.chrome_slide {
                for container in &mut self.containers {
                    if let Some(chrome) = container.chrome_mut() {
                        chrome.translation_x = fraction * width;
                        chrome.slide_progress = fraction;
                    }
                }
            }
        }
    }

    /// Released past the threshold: pop for real and settle forward with
    /// a duration proportional to the remaining distance.
    fn commit_back_pan(&mut self, fraction: f32) {
        if self.stack.len() < 2 {
            return;
        }
        let Some(removed) = self.stack.pop() else { return };
        debug!(fraction, "back pan committed");
        let outgoing_page = removed.page.clone();
        if removed.chrome_visible() {
            let id = outgoing_page.borrow().id();
            self.chrome_remove(id);
        }
        self.resolve_dropped_modals(&removed);

        let duration = self.config.transition_duration.mul_f32(1.0 - fraction);
        self.start_settle(
            TransitionKind::PanCommit,
            fraction,
            1.0,
            duration,
            Some(outgoing_page),
        );
    }

    /// Released short of the threshold (or platform cancel): settle back
    /// with a duration proportional to the distance already panned.
    fn cancel_back_pan(&mut self, fraction: f32) {
        if self.bottom_container().page().is_none() {
            // Cancel with no staged peek: the matching start never
            // happened (or was already torn down).
            return;
        }
        debug!(fraction, "back pan cancelled");
        let duration = self.config.transition_duration.mul_f32(fraction);
        self.start_settle(TransitionKind::PanCancel, fraction, 0.0, duration, None);
    }

    fn start_settle(
        &mut self,
        kind: TransitionKind,
        from: f32,
        to: f32,
        duration: Duration,
        outgoing_page: Option<PageHandle>,
    ) {
        let detail = TransitionDetail::PanSettle { from, to };
        if duration.is_zero() || !self.config.animations_enabled {
            self.apply_detail_frame(&detail, 1.0);
            let active = ActiveTransition {
                kind,
                timeline: self.next_timeline(TimelineKind::Transition),
                detail,
                outgoing_page,
                completion: None,
            };
            match kind {
                TransitionKind::PanCommit => self.finalize_pop(active),
                _ => self.finalize_pan_cancel(),
            }
            return;
        }
        let timeline = self.next_timeline(TimelineKind::Transition);
        self.host
            .borrow_mut()
            .start(TimelineSpec::new(timeline, duration, Easing::Linear));
        self.transition = Some(ActiveTransition {
            kind,
            timeline,
            detail,
            outgoing_page,
            completion: None,
        });
    }

    /// Undo a speculative pan start: clear the staged peek, hand chrome
    /// back, and re-fire the lifecycle calls made at pan start.
    fn finalize_pan_cancel(&mut self) {
        let bottom = 1 - self.top;
        let had_peek = self.containers[bottom].page().is_some();
        let _ = self.containers[bottom].take_page();
        self.containers[bottom].reset_transient();
        self.containers[self.top].reset_transient();
        self.reset_chrome_transient();
        self.restore_chrome_to_top();
        self.restore_z_order();
        self.restore_input();
        self.pan_visuals = None;

        if had_peek && self.stack.len() >= 2 {
            let peeked_idx = self.stack.len() - 2;
            let peeked = self.stack[peeked_idx].page.clone();
            self.stack[peeked_idx].state = PageState::Disappeared;
            peeked.borrow_mut().on_disappeared(NavDirection::Backward);
            let top_idx = self.stack.len() - 1;
            self.fire_appeared(top_idx, NavDirection::Backward);
        }
        trace!("pan cancel finalized");
    }

    /// Put the single chrome instance back under the page that stays on
    /// top. Safe to redo.
    fn restore_chrome_to_top(&mut self) {
        let visible = self.stack.last().is_some_and(|entry| entry.chrome_visible());
        if visible && self.containers[self.top].chrome().is_none() {
            if let Some(instance) = self.containers[1 - self.top].take_chrome() {
                self.containers[self.top].set_chrome(instance);
            } else if let Some(template) = &self.chrome_template {
                self.containers[self.top].set_chrome(ChromeInstance::new(template));
            }
        }
    }

    // --- Frame application ---

    pub(crate) fn apply_detail_frame(&mut self, detail: &TransitionDetail, progress: f32) {
        match detail {
            TransitionDetail::Slide {
                incoming,
                outgoing,
                incoming_slot,
                outgoing_slot,
                overlay,
                chrome_slide,
            } => {
                let viewport = self.viewport;
                if let Some(planned) = incoming {
                    planned.apply(&mut self.containers[*incoming_slot].props, progress, viewport);
                }
                if let Some(planned) = outgoing {
                    planned.apply(&mut self.containers[*outgoing_slot].props, progress, viewport);
                }
                if let Some(OverlayFade { slot, base, fade_in }) = overlay {
                    let level = if *fade_in { progress } else { 1.0 - progress };
                    self.containers[*slot].overlay_opacity = base * level;
                }
                if *chrome_slide {
                    for container in &mut self.containers {
                        if let Some(chrome) = container.chrome_mut() {
                            chrome.slide_progress = progress;
                        }
                    }
                }
            }
            TransitionDetail::PanSettle { from, to } => {
                let overall = from + (to - from) * progress;
                self.apply_pan_progress(overall);
            }
            TransitionDetail::ModalSlide {
                def,
                host_slot,
                fade_in,
                backdrop_base,
            } => {
                let viewport = self.viewport;
                let container = &mut self.containers[*host_slot];
                if let Some(planned) = def {
                    planned.apply(&mut container.modal_props, progress, viewport);
                }
                let level = if *fade_in { progress } else { 1.0 - progress };
                container.modal_backdrop_opacity = backdrop_base * level;
            }
        }
    }

    // --- Modal plumbing shared with modal.rs ---

    pub(crate) fn resolve_dropped_modals(&mut self, entry: &PageStackEntry) {
        for page in &entry.modal_pages {
            let id = page.borrow().id().id();
            if let Some(handle) = self.pending_modals.remove(&id) {
                handle.resolve(None);
            }
        }
    }
}

impl std::fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationController")
            .field("scope", &self.id)
            .field("depth", &self.stack.len())
            .field("top_slot", &self.top)
            .field("transitioning", &self.is_transitioning())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{EventLog, ProbePage, RecordingHost, event_log, log_tail, probe};
    use portico_core::PanEvent;

    const VIEWPORT: Size = Size::new(400.0, 800.0);

    fn controller_with(config: NavConfig) -> (NavigationController, Rc<RefCell<RecordingHost>>) {
        let host = Rc::new(RefCell::new(RecordingHost::new()));
        let shared: SharedHost = host.clone();
        let mut controller = NavigationController::new(config, shared);
        controller.set_viewport(VIEWPORT);
        (controller, host)
    }

    fn controller() -> (NavigationController, Rc<RefCell<RecordingHost>>, EventLog) {
        let (controller, host) = controller_with(NavConfig::default());
        (controller, host, event_log())
    }

    fn finish_with(controller: &mut NavigationController, host: &Rc<RefCell<RecordingHost>>) {
        let id = host.borrow().last_started().expect("timeline started").id;
        controller.timeline_event(TimelineEvent::Frame { id, progress: 1.0 });
        controller.timeline_event(TimelineEvent::Finished { id, aborted: false });
    }

    fn chrome_instances(controller: &NavigationController) -> usize {
        [controller.top_container(), controller.bottom_container()]
            .iter()
            .filter(|container| container.chrome().is_some())
            .count()
    }

    // ========================================================================
    // Push
    // ========================================================================

    #[test]
    fn first_push_assigns_synchronously() {
        let (mut nav, host, log) = controller();
        let completion = nav.push(probe("A", &log), None);

        assert!(completion.is_resolved());
        assert_eq!(nav.depth(), 1);
        assert!(nav.top_container().page().is_some());
        assert!(host.borrow().started.is_empty());
        assert_eq!(*log.borrow(), vec!["A:appearing", "A:appeared"]);
    }

    #[test]
    fn push_fires_lifecycle_around_animated_phase() {
        let (mut nav, host, log) = controller();
        nav.push(probe("A", &log), None);
        let completion = nav.push(probe("B", &log), None);

        assert_eq!(host.borrow().started.len(), 1);
        assert!(!completion.is_resolved());
        assert!(!nav.top_container().input_enabled());
        assert_eq!(log_tail(&log, 2), vec!["A:disappearing", "B:appearing"]);

        finish_with(&mut nav, &host);
        assert!(completion.is_resolved());
        assert!(nav.top_container().input_enabled());
        assert!(nav.bottom_container().page().is_none());
        assert_eq!(log_tail(&log, 2), vec!["A:disappeared", "B:appeared"]);
    }

    #[test]
    fn suppressed_animations_assign_synchronously() {
        let (mut nav, host) = controller_with(NavConfig::default().animations_enabled(false));
        let log = event_log();
        nav.push(probe("A", &log), None);
        let completion = nav.push(probe("B", &log), None);

        assert!(completion.is_resolved());
        assert!(host.borrow().started.is_empty());
        assert_eq!(
            log_tail(&log, 4),
            vec!["A:disappearing", "B:appearing", "A:disappeared", "B:appeared"]
        );
    }

    #[test]
    fn push_swaps_roles_not_storage() {
        let (mut nav, host, log) = controller();
        let a = probe("A", &log);
        let b = probe("B", &log);
        nav.push(a.clone(), None);
        nav.push(b.clone(), None);
        finish_with(&mut nav, &host);

        let top = nav.top_container().page().cloned();
        assert!(top.is_some_and(|page| Rc::ptr_eq(&page, &b)));
        assert_eq!(nav.top_container().z(), Z_TOP);
        assert_eq!(nav.bottom_container().z(), Z_BOTTOM);
    }

    #[test]
    fn push_root_discards_everything_below() {
        let (mut nav, host, log) = controller();
        nav.push(probe("A", &log), None);
        nav.push(probe("B", &log), None);
        finish_with(&mut nav, &host);

        nav.push_root(probe("C", &log), None, true);
        finish_with(&mut nav, &host);
        assert_eq!(nav.depth(), 1);
        let title = nav.top_page().map(|p| p.borrow().title().to_string());
        assert_eq!(title.as_deref(), Some("C"));
    }

    // ========================================================================
    // Pop
    // ========================================================================

    #[test]
    fn pop_on_singleton_stack_is_noop() {
        let (mut nav, host, log) = controller();
        nav.push(probe("A", &log), None);
        let completion = nav.pop(None);

        assert!(completion.is_resolved());
        assert_eq!(nav.depth(), 1);
        assert!(host.borrow().started.is_empty());
    }

    #[test]
    fn pop_reveals_previous_page() {
        let (mut nav, host, log) = controller();
        let a = probe("A", &log);
        nav.push(a.clone(), None);
        nav.push(probe("B", &log), None);
        finish_with(&mut nav, &host);

        let completion = nav.pop(None);
        assert_eq!(log_tail(&log, 2), vec!["B:disappearing", "A:appearing"]);
        finish_with(&mut nav, &host);

        assert!(completion.is_resolved());
        assert_eq!(nav.depth(), 1);
        let top = nav.top_container().page().cloned();
        assert!(top.is_some_and(|page| Rc::ptr_eq(&page, &a)));
        assert_eq!(log_tail(&log, 2), vec!["B:disappeared", "A:appeared"]);
    }

    #[test]
    fn aborted_push_then_pop_returns_to_pre_push_stack() {
        let (mut nav, host, log) = controller();
        let a = probe("A", &log);
        nav.push(a.clone(), None);
        nav.push(probe("B", &log), None);
        // No finish: the push animation is still in flight.

        nav.pop(None);
        assert_eq!(host.borrow().aborted.len(), 1);
        finish_with(&mut nav, &host);

        assert_eq!(nav.depth(), 1);
        let top = nav.top_container().page().cloned();
        assert!(top.is_some_and(|page| Rc::ptr_eq(&page, &a)));
        assert!(nav.bottom_container().page().is_none());
    }

    // ========================================================================
    // Back pan
    // ========================================================================

    #[test]
    fn pan_commit_pops_with_proportional_settle() {
        let (mut nav, host, log) = controller();
        nav.push(probe("A", &log), None);
        nav.push(probe("B", &log), None);
        finish_with(&mut nav, &host);

        nav.handle_pan_event(PanEvent::Started);
        nav.handle_pan_event(PanEvent::Updated { delta_x: 300.0 });
        assert_eq!(nav.top_container().props.translation_x, 300.0);
        assert_eq!(nav.depth(), 2, "stack untouched while scrubbing");

        nav.handle_pan_event(PanEvent::Completed);
        assert_eq!(nav.depth(), 1, "commit removes the entry");
        let settle = host.borrow().last_started().copied().expect("settle timeline");
        assert!((settle.duration.as_secs_f32() - 0.35 * 0.25).abs() < 1e-4);

        finish_with(&mut nav, &host);
        assert_eq!(log_tail(&log, 2), vec!["B:disappeared", "A:appeared"]);
    }

    #[test]
    fn pan_cancel_keeps_stack_and_refires_lifecycle() {
        let (mut nav, host, log) = controller();
        nav.push(probe("A", &log), None);
        nav.push(probe("B", &log), None);
        finish_with(&mut nav, &host);

        nav.handle_pan_event(PanEvent::Started);
        assert_eq!(log_tail(&log, 2), vec!["B:disappearing", "A:appearing"]);
        nav.handle_pan_event(PanEvent::Updated { delta_x: 100.0 });
        nav.handle_pan_event(PanEvent::Completed);

        assert_eq!(nav.depth(), 2, "release short of threshold cancels");
        let settle = host.borrow().last_started().copied().expect("settle timeline");
        assert!((settle.duration.as_secs_f32() - 0.35 * 0.25).abs() < 1e-4);

        finish_with(&mut nav, &host);
        assert_eq!(log_tail(&log, 2), vec!["A:disappeared", "B:appeared"]);
        assert!(nav.bottom_container().page().is_none());
        assert_eq!(nav.top_container().props.translation_x, 0.0);
    }

    #[test]
    fn pan_is_inert_on_singleton_stack() {
        let (mut nav, host, log) = controller();
        nav.push(probe("A", &log), None);
        let before = log.borrow().len();

        nav.handle_pan_event(PanEvent::Started);
        nav.handle_pan_event(PanEvent::Updated { delta_x: 200.0 });
        nav.handle_pan_event(PanEvent::Completed);

        assert_eq!(nav.depth(), 1);
        assert_eq!(log.borrow().len(), before);
        assert!(host.borrow().started.is_empty());
    }

    #[test]
    fn pan_start_aborts_running_transition() {
        let (mut nav, host, log) = controller();
        nav.push(probe("A", &log), None);
        nav.push(probe("B", &log), None);
        finish_with(&mut nav, &host);
        nav.push(probe("C", &log), None);
        // Push animation in flight; the gesture preempts it.
        nav.handle_pan_event(PanEvent::Started);
        assert_eq!(host.borrow().aborted.len(), 1);
    }

    // ========================================================================
    // Chrome
    // ========================================================================

    #[test]
    fn chrome_template_without_bar_child_is_rejected() {
        let (mut nav, _host, _log) = controller();
        let err = nav.set_chrome_template(ChromeTemplate::new(vec!["title".into()], 44.0));
        assert!(err.is_err());
    }

    #[test]
    fn chrome_instance_is_reused_across_visibility_changes() {
        let (mut nav, host, log) = controller();
        nav.set_chrome_template(ChromeTemplate::with_bar(44.0))
            .expect("valid template");

        nav.push(probe("A", &log), None);
        assert_eq!(chrome_instances(&nav), 1);

        nav.push(probe("B", &log), None);
        finish_with(&mut nav, &host);
        assert_eq!(chrome_instances(&nav), 1);

        // Hidden page: the bar stays parked with the outgoing container.
        nav.push(ProbePage::new("C", &log).chrome_hidden().handle(), None);
        finish_with(&mut nav, &host);
        assert_eq!(chrome_instances(&nav), 1);

        // Visible again: the parked instance is adopted, not recreated;
        // its back history still holds A and B.
        nav.push(probe("D", &log), None);
        finish_with(&mut nav, &host);
        assert_eq!(chrome_instances(&nav), 1);
        let stack_len = nav
            .top_container()
            .chrome()
            .map(|chrome| chrome.stack().len());
        assert_eq!(stack_len, Some(3));
        let back = nav
            .top_container()
            .chrome()
            .and_then(|chrome| chrome.stack().back_title().map(str::to_string));
        assert_eq!(back.as_deref(), Some("B"));
    }

    #[test]
    fn chrome_stack_tracks_visible_subsequence_through_pops() {
        let (mut nav, host, log) = controller();
        nav.set_chrome_template(ChromeTemplate::with_bar(44.0))
            .expect("valid template");

        nav.push(probe("A", &log), None);
        nav.push(ProbePage::new("B", &log).chrome_hidden().handle(), None);
        finish_with(&mut nav, &host);
        nav.push(probe("C", &log), None);
        finish_with(&mut nav, &host);

        let len = |nav: &NavigationController| {
            [nav.top_container(), nav.bottom_container()]
                .iter()
                .find_map(|c| c.chrome())
                .map(|chrome| chrome.stack().len())
        };
        assert_eq!(len(&nav), Some(2), "A and C; hidden B excluded");

        nav.pop(None);
        finish_with(&mut nav, &host);
        assert_eq!(len(&nav), Some(1), "C removed with its pop");

        nav.pop(None);
        finish_with(&mut nav, &host);
        assert_eq!(len(&nav), Some(1), "hidden B never entered the history");
    }

    // ========================================================================
    // Config and events
    // ========================================================================

    #[test]
    fn has_pages_event_fires_on_first_push() {
        let (mut nav, host, log) = controller();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        nav.on_has_pages_changed(move |has| sink.borrow_mut().push(has));

        nav.push(probe("A", &log), None);
        nav.push(probe("B", &log), None);
        finish_with(&mut nav, &host);
        assert_eq!(*seen.borrow(), vec![true]);
    }

    #[test]
    fn hot_zone_frame_spans_viewport_height() {
        let (nav, _host, _log) = controller();
        let frame = nav.hot_zone_frame();
        assert_eq!(frame.height, VIEWPORT.height);
        assert_eq!(frame.x, 0.0);
    }

    #[test]
    fn transitions_run_under_a_tracing_subscriber() {
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry());
        let (mut nav, host, log) = controller();
        nav.push(probe("A", &log), None);
        nav.push(probe("B", &log), None);
        finish_with(&mut nav, &host);
        nav.pop(None);
        finish_with(&mut nav, &host);
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn timeline_events_for_unknown_scopes_are_dropped() {
        let (mut nav, _host, log) = controller();
        nav.push(probe("A", &log), None);
        let foreign = TimelineId::new(nav.scope() + 999, TimelineKind::Transition, 1);
        // Must not panic or disturb state.
        nav.timeline_event(TimelineEvent::Frame {
            id: foreign,
            progress: 0.5,
        });
        nav.timeline_event(TimelineEvent::Finished {
            id: foreign,
            aborted: false,
        });
        assert_eq!(nav.depth(), 1);
    }
}
