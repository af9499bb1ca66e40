//! Chrome: the persistent title/back bar shared across pushed pages.
//!
//! At most two [`ChromeInstance`]s exist per controller. An instance is
//! created lazily from the validated [`ChromeTemplate`] and reused for
//! the rest of the controller's life; transitions reassign which
//! container owns it. The instance carries a [`ChromeStack`], the
//! ordered view of *chrome-visible* pages (distinct from the full page
//! stack), which drives the bar's own back-history rendering and is the
//! reason an instance is never destroyed merely because a page hides it.
//!
//! # Invariants
//!
//! 1. At most two live instances per controller; at most one per
//!    container.
//! 2. An instance is never dropped while any chrome-visible page remains
//!    on the navigation stack.
//! 3. A page's chrome visibility is re-read on every transition, never
//!    cached.
//!
//! # Failure Modes
//!
//! - A template without the required bar child fails validation
//!   synchronously at configuration time; nothing is deferred.

use crate::page::PageId;

/// Name of the child element every chrome template must provide.
pub const CHROME_BAR_CHILD: &str = "bar";

/// Errors from chrome configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromeTemplateError {
    /// The template does not contain the required named child.
    MissingChild { required: &'static str },
}

impl std::fmt::Display for ChromeTemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingChild { required } => {
                write!(f, "chrome template is missing required child '{required}'")
            }
        }
    }
}

impl std::error::Error for ChromeTemplateError {}

/// Integrator-supplied description of the chrome bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromeTemplate {
    children: Vec<String>,
    height: f32,
}

impl ChromeTemplate {
    pub fn new(children: Vec<String>, height: f32) -> Self {
        Self { children, height }
    }

    /// A minimal valid template: just the bar child.
    pub fn with_bar(height: f32) -> Self {
        Self::new(vec![CHROME_BAR_CHILD.to_string()], height)
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Check the template for the required named child.
    pub fn validate(&self) -> Result<(), ChromeTemplateError> {
        if self.children.iter().any(|c| c == CHROME_BAR_CHILD) {
            Ok(())
        } else {
            Err(ChromeTemplateError::MissingChild {
                required: CHROME_BAR_CHILD,
            })
        }
    }
}

/// The ordered view of chrome-visible pages.
///
/// Maintained incrementally in lock-step with push/pop rather than
/// recomputed from the page stack, because it is also the bar's
/// back-history model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChromeStack {
    entries: Vec<(PageId, String)>,
}

impl ChromeStack {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<(PageId, &str)> {
        self.entries.last().map(|(id, title)| (*id, title.as_str()))
    }

    /// Title rendered on the back button: the entry beneath the top.
    pub fn back_title(&self) -> Option<&str> {
        if self.entries.len() < 2 {
            return None;
        }
        self.entries
            .get(self.entries.len() - 2)
            .map(|(_, title)| title.as_str())
    }

    pub(crate) fn push(&mut self, id: PageId, title: String) {
        self.entries.push((id, title));
    }

    /// Remove `id` if it is the top entry. Anything else is ignored; the
    /// page was never in the visible-chrome subsequence.
    pub(crate) fn pop(&mut self, id: PageId) {
        if self.entries.last().is_some_and(|(top, _)| *top == id) {
            self.entries.pop();
        }
    }

    pub(crate) fn clear_below_top(&mut self) {
        if let Some(top) = self.entries.pop() {
            self.entries.clear();
            self.entries.push(top);
        }
    }
}

/// A live chrome bar bound to one container at a time.
pub struct ChromeInstance {
    stack: ChromeStack,
    /// Horizontal translation driven during pan scrubs and slides.
    pub translation_x: f32,
    pub opacity: f32,
    /// Progress of an in-flight back-history slide (`0.0` at rest).
    pub slide_progress: f32,
    /// Set by the host when page content has scrolled the bar out of
    /// view; changes the hand-off path on the next transition.
    scrolled_out: bool,
    height: f32,
}

impl ChromeInstance {
    pub(crate) fn new(template: &ChromeTemplate) -> Self {
        Self {
            stack: ChromeStack::default(),
            translation_x: 0.0,
            opacity: 1.0,
            slide_progress: 0.0,
            scrolled_out: false,
            height: template.height(),
        }
    }

    pub fn stack(&self) -> &ChromeStack {
        &self.stack
    }

    pub(crate) fn stack_mut(&mut self) -> &mut ChromeStack {
        &mut self.stack
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn scrolled_out(&self) -> bool {
        self.scrolled_out
    }

    pub fn set_scrolled_out(&mut self, scrolled_out: bool) {
        self.scrolled_out = scrolled_out;
    }

    pub(crate) fn reset_transient(&mut self) {
        self.translation_x = 0.0;
        self.opacity = 1.0;
        self.slide_progress = 0.0;
    }
}

impl std::fmt::Debug for ChromeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeInstance")
            .field("stack_len", &self.stack.len())
            .field("scrolled_out", &self.scrolled_out)
            .finish()
    }
}

/// How chrome ownership moves during one transition.
///
/// The common case is the only one that animates the bar itself; every
/// other case reassigns ownership instantly so the bar jumps to the
/// correct container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChromeHandoff {
    /// Neither page shows chrome.
    StayHidden,
    /// Hidden page to chrome-visible page: the incoming container needs
    /// an instance (created lazily if none is parked anywhere).
    AdoptOnIncoming,
    /// Chrome-visible page to hidden page: the outgoing container keeps
    /// its instance and the bar leaves with it.
    RetainOnOutgoing,
    /// Both visible, but the outgoing page has an open modal or the bar
    /// is scrolled out: reassign instantly, no bar animation.
    TransferInstant,
    /// Both visible, no obstruction: reassign and animate the bar's
    /// back-history slide alongside the page transition.
    SlideShared,
}

/// The 5-way chrome hand-off decision.
///
/// Push, pop, and pan-start all route through this one table.
pub(crate) fn decide_handoff(
    outgoing_visible: bool,
    incoming_visible: bool,
    outgoing_has_modal: bool,
    chrome_scrolled_out: bool,
) -> ChromeHandoff {
    match (outgoing_visible, incoming_visible) {
        (false, false) => ChromeHandoff::StayHidden,
        (false, true) => ChromeHandoff::AdoptOnIncoming,
        (true, false) => ChromeHandoff::RetainOnOutgoing,
        (true, true) if outgoing_has_modal || chrome_scrolled_out => ChromeHandoff::TransferInstant,
        (true, true) => ChromeHandoff::SlideShared,
    }
}
