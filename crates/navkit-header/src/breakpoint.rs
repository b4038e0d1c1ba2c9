//! Breakpoint Monitor
//!
//! Wraps a viewport-width media condition and tells subscribers when the
//! page flips between desktop and mobile behaviour.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

/// Interaction mode selected by the breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Desktop,
    Mobile,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Desktop => f.write_str("desktop"),
            Mode::Mobile => f.write_str("mobile"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

/// A single width condition: `(width >= 1200px)`, `(min-width: 1200px)`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaCondition {
    comparison: Comparison,
    px: u32,
}

impl MediaCondition {
    /// Parse a width condition. Anything else is unsupported.
    pub fn parse(query: &str) -> Option<Self> {
        let inner = query.trim().strip_prefix('(')?.strip_suffix(')')?.trim();
        let parse_px = |s: &str| s.trim().strip_suffix("px")?.trim().parse::<u32>().ok();

        if let Some((feature, value)) = inner.split_once(':') {
            let comparison = match feature.trim() {
                "min-width" => Comparison::GreaterOrEqual,
                "max-width" => Comparison::LessOrEqual,
                _ => return None,
            };
            return Some(Self {
                comparison,
                px: parse_px(value)?,
            });
        }

        let rest = inner.strip_prefix("width")?.trim_start();
        let (comparison, value) = if let Some(v) = rest.strip_prefix(">=") {
            (Comparison::GreaterOrEqual, v)
        } else if let Some(v) = rest.strip_prefix("<=") {
            (Comparison::LessOrEqual, v)
        } else if let Some(v) = rest.strip_prefix('>') {
            (Comparison::Greater, v)
        } else if let Some(v) = rest.strip_prefix('<') {
            (Comparison::Less, v)
        } else {
            return None;
        };
        Some(Self {
            comparison,
            px: parse_px(value)?,
        })
    }

    pub fn matches(&self, width: u32) -> bool {
        match self.comparison {
            Comparison::Greater => width > self.px,
            Comparison::GreaterOrEqual => width >= self.px,
            Comparison::Less => width < self.px,
            Comparison::LessOrEqual => width <= self.px,
        }
    }
}

type Subscriber = Rc<dyn Fn(Mode)>;

/// Tracks the current [`Mode`] and notifies subscribers on transitions.
///
/// Constructed once per page and handed to each controller.
pub struct BreakpointMonitor {
    condition: Option<MediaCondition>,
    mode: Cell<Mode>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl fmt::Debug for BreakpointMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakpointMonitor")
            .field("condition", &self.condition)
            .field("mode", &self.mode.get())
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

impl BreakpointMonitor {
    /// Watch `query` (true = desktop) starting at `viewport_width`.
    ///
    /// An unsupported query degrades to a fixed `fallback` mode.
    pub fn new(query: &str, viewport_width: u32, fallback: Mode) -> Self {
        match MediaCondition::parse(query) {
            Some(condition) => {
                let mode = Self::mode_for(condition, viewport_width);
                tracing::debug!("breakpoint {query} starts in {mode} mode at {viewport_width}px");
                Self {
                    condition: Some(condition),
                    mode: Cell::new(mode),
                    subscribers: RefCell::new(Vec::new()),
                }
            }
            None => {
                tracing::warn!("unsupported media condition {query:?}, staying in {fallback} mode");
                Self::fixed(fallback)
            }
        }
    }

    /// A monitor that never transitions
    pub fn fixed(mode: Mode) -> Self {
        Self {
            condition: None,
            mode: Cell::new(mode),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    fn mode_for(condition: MediaCondition, width: u32) -> Mode {
        if condition.matches(width) {
            Mode::Desktop
        } else {
            Mode::Mobile
        }
    }

    pub fn current_mode(&self) -> Mode {
        self.mode.get()
    }

    pub fn is_desktop(&self) -> bool {
        self.current_mode() == Mode::Desktop
    }

    /// Whether a media condition is actually being watched
    pub fn is_supported(&self) -> bool {
        self.condition.is_some()
    }

    /// Register a subscriber, called in registration order on each transition
    pub fn on_change(&self, callback: impl Fn(Mode) + 'static) {
        self.subscribers.borrow_mut().push(Rc::new(callback));
    }

    /// Viewport resize event. Returns the new mode if the condition flipped.
    pub fn resize(&self, width: u32) -> Option<Mode> {
        let condition = self.condition?;
        let mode = Self::mode_for(condition, width);
        if mode == self.mode.get() {
            return None;
        }

        self.mode.set(mode);
        tracing::info!("breakpoint transition to {mode} at {width}px");

        // Snapshot so a subscriber may register another without a borrow conflict
        let subscribers: Vec<Subscriber> = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            subscriber(mode);
        }
        Some(mode)
    }
}
