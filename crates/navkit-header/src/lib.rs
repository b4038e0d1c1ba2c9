//! navkit Header
//!
//! Responsive navigation disclosure controller: turns the authored nav
//! fragment into an accessible header whose dropdowns, hamburger menu,
//! language picker and lazily loaded search widget all derive their
//! ARIA state from explicit controller objects.
//!
//! Everything runs on one event loop. Shared state lives in
//! [`SharedDocument`] and is only borrowed between suspension points.

pub mod assembler;
pub mod breakpoint;
pub mod config;
pub mod decorate;
pub mod disclosure;
pub mod footer;
pub mod fragment;
pub mod group;
pub mod hamburger;
pub mod lazy;
pub mod scroll;
pub mod search;
pub mod slots;

use std::cell::RefCell;
use std::rc::Rc;

use navkit_dom::{Document, DomError};
use navkit_net::NetError;

pub use assembler::{ClickOutcome, NavigationAssembler, NavigationTree, decorate_header};
pub use breakpoint::{BreakpointMonitor, MediaCondition, Mode};
pub use config::{HeaderConfig, SearchConfig};
pub use disclosure::DisclosureWidget;
pub use footer::decorate_footer;
pub use fragment::{load_fragment, metadata_path};
pub use group::{ExclusiveGroup, SectionsMenu};
pub use hamburger::HamburgerController;
pub use lazy::{LazyWidget, LoadState, PendingLoad, WidgetResources};
pub use scroll::{LockOwner, ScrollCoordinator};
pub use search::{SearchController, SearchForm};
pub use slots::NavSlot;

/// The page document, shared by every controller
pub type SharedDocument = Rc<RefCell<Document>>;

/// Why a lazy widget failed to load.
///
/// Cloneable: every caller waiting on the same in-flight load gets a copy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("fetching {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not valid UTF-8 markup")]
    Markup { url: String },

    #[error("could not decode {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("could not mount {url}: {reason}")]
    Mount { url: String, reason: String },

    /// The caller driving the load went away before it finished
    #[error("loading {url} was abandoned")]
    Abandoned { url: String },
}

impl LoadError {
    pub(crate) fn from_net(url: &str, err: NetError) -> Self {
        match err {
            NetError::HttpError { status } => LoadError::Status {
                url: url.to_string(),
                status,
            },
            other => LoadError::Fetch {
                url: url.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// URL of the resource that failed
    pub fn url(&self) -> &str {
        match self {
            LoadError::Fetch { url, .. }
            | LoadError::Status { url, .. }
            | LoadError::Markup { url }
            | LoadError::Decode { url, .. }
            | LoadError::Mount { url, .. }
            | LoadError::Abandoned { url } => url,
        }
    }
}

/// Header and footer decoration errors
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    #[error("fragment request failed: {0}")]
    Fragment(#[from] NetError),

    #[error("no fragment at {0}")]
    MissingFragment(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("invalid header config: {0}")]
    Config(String),
}
