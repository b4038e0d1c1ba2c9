//! Navigation slots
//!
//! The nav fragment is authored as a flat list of sections; their order,
//! not their markup, says what each one is.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NavSlot {
    Brand,
    Sections,
    Tools,
    LocationFinder,
    LanguagePicker,
    Alert,
    Support,
}

impl NavSlot {
    /// Every slot, in fragment order
    pub const ALL: [NavSlot; 7] = [
        NavSlot::Brand,
        NavSlot::Sections,
        NavSlot::Tools,
        NavSlot::LocationFinder,
        NavSlot::LanguagePicker,
        NavSlot::Alert,
        NavSlot::Support,
    ];

    /// Slot for the child at `index`, if any
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            NavSlot::Brand => "brand",
            NavSlot::Sections => "sections",
            NavSlot::Tools => "tools",
            NavSlot::LocationFinder => "location-finder",
            NavSlot::LanguagePicker => "language-picker",
            NavSlot::Alert => "alert",
            NavSlot::Support => "support",
        }
    }

    /// `nav-{name}`, used as both the element id and a class
    pub fn element_id(self) -> String {
        format!("nav-{}", self.name())
    }
}

impl fmt::Display for NavSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
