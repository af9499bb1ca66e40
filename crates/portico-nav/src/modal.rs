//! Modal overlay management.
//!
//! Modal pages attach to the *current top stack entry*, not to the
//! controller's own stack: each entry conceptually owns an independent
//! nested [`NavigationController`] that is created lazily and reused,
//! swapped between containers the same way chrome instances are. Only
//! the outermost presentation and dismissal animate against the host
//! (`ModalIn`/`ModalOut` over a darkened backdrop); additional modals on
//! the same entry push *into* the nested controller with its own
//! timelines.
//!
//! # Invariants
//!
//! 1. `push_modal` resolves its completion with exactly the parameter
//!    passed to the `pop_modal` call that closes that page, or `None`
//!    when it is closed by a clear-all or its entry leaves the stack.
//! 2. `pop_modal` with nothing open is a silent no-op.
//! 3. While an overlay is open, the hosting container's page input stays
//!    disabled.

use portico_core::{Easing, TimelineKind, TimelineSpec};
use tracing::debug;

use crate::completion::{Completion, completion_pair};
use crate::container::ContainerProps;
use crate::controller::{ActiveTransition, NavigationController, TransitionDetail, TransitionKind};
use crate::page::{PageHandle, Param};
use crate::transition::plan_pair;

impl NavigationController {
    /// Present `page` modally over the current top entry.
    ///
    /// The returned completion resolves with the result value supplied
    /// to the closing `pop_modal` call.
    pub fn push_modal(
        &mut self,
        page: PageHandle,
        parameter: Option<Param>,
    ) -> Completion<Option<Param>> {
        if self.stack.is_empty() {
            return Completion::ready(None);
        }
        let (completion, handle) = completion_pair();
        let page_id = page.borrow().id().id();
        self.pending_modals.insert(page_id, handle);

        let first_modal = !self.top_entry_has_modal();
        if let Some(entry) = self.stack.last_mut() {
            entry.modal_pages.push(page.clone());
        }
        debug!(modal = page_id, first_modal, "push_modal");

        let slot = self.top_slot();
        self.ensure_modal_overlay_on(slot);
        if first_modal {
            if let Some(nested) = self.container_mut(slot).modal_mut() {
                let _ = nested.push_root(page.clone(), parameter, false);
            }
            self.present_modal_overlay(slot, &page);
        } else if let Some(nested) = self.container_mut(slot).modal_mut() {
            let _ = nested.push(page.clone(), parameter);
        }
        completion
    }

    /// Close the nearest modal, or the whole overlay.
    ///
    /// With `pop_all`, or when exactly one modal remains, the nested
    /// controller closes entirely: `ModalOut`, backdrop fade, and the
    /// bottommost modal's completion resolves with `parameter` (any
    /// other modal cleared alongside it resolves `None`). Otherwise the
    /// close delegates to the nested controller's own pop.
    pub fn pop_modal(&mut self, parameter: Option<Param>, pop_all: bool) -> Completion<()> {
        let open = self
            .stack
            .last()
            .map(|entry| entry.modal_pages.len())
            .unwrap_or(0);
        if open == 0 {
            return Completion::ready(());
        }
        let slot = self.top_slot();

        if pop_all || open == 1 {
            let pages = self
                .stack
                .last_mut()
                .map(|entry| std::mem::take(&mut entry.modal_pages))
                .unwrap_or_default();
            debug!(count = pages.len(), "pop_modal closing overlay");
            for (i, page) in pages.iter().enumerate() {
                let id = page.borrow().id().id();
                if let Some(handle) = self.pending_modals.remove(&id) {
                    handle.resolve(if i == 0 { parameter.clone() } else { None });
                }
            }
            return self.dismiss_modal_overlay(slot, pages.first());
        }

        let closed = self
            .stack
            .last_mut()
            .and_then(|entry| entry.modal_pages.pop());
        if let Some(page) = closed {
            let id = page.borrow().id().id();
            debug!(modal = id, "pop_modal");
            if let Some(handle) = self.pending_modals.remove(&id) {
                handle.resolve(parameter);
            }
        }
        if let Some(nested) = self.container_mut(slot).modal_mut() {
            return nested.pop(None);
        }
        Completion::ready(())
    }

    /// Hardware back button: nearest modal first, then the page (which
    /// may swallow it), then pop. Returns true when handled.
    pub fn handle_back_button(&mut self) -> bool {
        if self.top_entry_has_modal() {
            let _ = self.pop_modal(None, false);
            return true;
        }
        if let Some(page) = self.top_page()
            && page.borrow_mut().on_device_back_button()
        {
            return true;
        }
        if self.depth() >= 2 {
            let _ = self.pop(None);
            return true;
        }
        false
    }

    // --- Overlay plumbing ---

    /// Make sure `slot` hosts the (lazily created, reused) nested
    /// controller, taking it from the other container when parked there.
    pub(crate) fn ensure_modal_overlay_on(&mut self, slot: usize) {
        if self.container_mut(slot).modal().is_some() {
            return;
        }
        if let Some(parked) = self.container_mut(1 - slot).take_modal() {
            self.container_mut(slot).set_modal(parked);
            return;
        }
        let config = self.config.clone();
        let nested = Box::new(NavigationController::nested(
            &config,
            self.shared_host(),
            self.viewport(),
        ));
        self.container_mut(slot).set_modal(nested);
    }

    /// Re-attach an entry's open modals when its page is staged back in
    /// (pop towards an entry that kept modals open).
    pub(crate) fn restore_modal_overlay(&mut self, slot: usize, entry_idx: usize) {
        self.ensure_modal_overlay_on(slot);
        let pages = self.stack[entry_idx].modal_pages.clone();
        let backdrop = self.config.backdrop.opacity;
        if let Some(nested) = self.container_mut(slot).modal_mut() {
            nested.sync_stack(&pages);
        }
        let container = self.container_mut(slot);
        container.modal_props = ContainerProps::default();
        container.modal_backdrop_opacity = backdrop;
        container.set_input_enabled(false);
    }

    /// Clear a container's overlay after its entry left the stack. The
    /// nested instance stays parked for reuse.
    pub(crate) fn reset_modal_overlay(&mut self, slot: usize) {
        if let Some(nested) = self.container_mut(slot).modal_mut() {
            nested.reset_for_reuse();
        }
        let container = self.container_mut(slot);
        container.modal_props = ContainerProps::default();
        container.modal_backdrop_opacity = 0.0;
    }

    fn present_modal_overlay(&mut self, slot: usize, page: &PageHandle) {
        let group = page.borrow().animation_group().clone();
        let backdrop_base = self.config.backdrop.opacity;
        self.container_mut(slot).set_input_enabled(false);

        let (duration, planned, _) = plan_pair(group.modal_in.clone(), None);
        if planned.is_none() || duration.is_zero() || !self.config.animations_enabled {
            let container = self.container_mut(slot);
            container.modal_props = ContainerProps::default();
            container.modal_backdrop_opacity = backdrop_base;
            return;
        }

        self.abort_modal_transition();
        let detail = TransitionDetail::ModalSlide {
            def: planned,
            host_slot: slot,
            fade_in: true,
            backdrop_base,
        };
        self.apply_detail_frame(&detail, 0.0);
        let timeline = self.next_timeline(TimelineKind::Modal);
        self.shared_host()
            .borrow_mut()
            .start(TimelineSpec::new(timeline, duration, Easing::Linear));
        self.modal_transition = Some(ActiveTransition {
            kind: TransitionKind::ModalIn,
            timeline,
            detail,
            outgoing_page: None,
            completion: None,
        });
    }

    fn dismiss_modal_overlay(
        &mut self,
        slot: usize,
        bottom_page: Option<&PageHandle>,
    ) -> Completion<()> {
        self.abort_modal_transition();
        let backdrop_base = self.config.backdrop.opacity;
        let def = bottom_page
            .and_then(|page| page.borrow().animation_group().modal_out.clone());
        let (duration, planned, _) = plan_pair(def, None);
        if planned.is_none() || duration.is_zero() || !self.config.animations_enabled {
            self.reset_modal_overlay(slot);
            self.restore_input();
            return Completion::ready(());
        }

        let detail = TransitionDetail::ModalSlide {
            def: planned,
            host_slot: slot,
            fade_in: false,
            backdrop_base,
        };
        self.apply_detail_frame(&detail, 0.0);
        let (completion, handle) = completion_pair();
        let timeline = self.next_timeline(TimelineKind::Modal);
        self.shared_host()
            .borrow_mut()
            .start(TimelineSpec::new(timeline, duration, Easing::Linear));
        self.modal_transition = Some(ActiveTransition {
            kind: TransitionKind::ModalOut,
            timeline,
            detail,
            outgoing_page: None,
            completion: Some(handle),
        });
        completion
    }

    pub(crate) fn finalize_modal(&mut self, active: ActiveTransition) {
        if let TransitionDetail::ModalSlide { host_slot, fade_in, .. } = active.detail {
            if !fade_in {
                self.reset_modal_overlay(host_slot);
                self.restore_input();
            }
        }
        if let Some(completion) = active.completion {
            completion.resolve(());
        }
    }

    /// Rebuild this (nested) controller's stack to mirror `pages`,
    /// without animating. Used when a reused overlay instance is
    /// re-attached to an entry.
    pub(crate) fn sync_stack(&mut self, pages: &[PageHandle]) {
        let matches = self.stack.len() == pages.len()
            && self
                .stack
                .iter()
                .zip(pages)
                .all(|(entry, page)| entry.page_id() == page.borrow().id());
        if matches {
            return;
        }
        self.reset_for_reuse();
        let saved = self.config.animations_enabled;
        self.config.animations_enabled = false;
        for page in pages {
            let _ = self.push(page.clone(), None);
        }
        self.config.animations_enabled = saved;
    }

    /// Return a (possibly nested) controller to its idle state, keeping
    /// chrome instances and parked overlays alive for reuse.
    pub(crate) fn reset_for_reuse(&mut self) {
        self.abort_nav_transition();
        self.abort_modal_transition();
        let entries: Vec<_> = self.stack.drain(..).collect();
        for entry in &entries {
            self.resolve_dropped_modals(entry);
        }
        for slot in 0..2 {
            let _ = self.container_mut(slot).take_page();
            self.container_mut(slot).reset_transient();
            self.container_mut(slot).modal_props = ContainerProps::default();
            self.container_mut(slot).modal_backdrop_opacity = 0.0;
            self.container_mut(slot).set_input_enabled(true);
        }
    }
}
