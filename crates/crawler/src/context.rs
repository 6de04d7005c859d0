//! Stage contexts carried from a parent fetch to its children.
//!
//! Each child fetch owns its own value; siblings never share a mutable slot.

use crate::identity::BillKey;

/// Which congress a bill listing belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillsContext {
    pub congress: u32,
}

/// The bill whose action listing is being fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionsContext {
    pub bill: BillKey,
}

/// Chamber that published a roll-call document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chamber {
    House,
    Senate,
}

impl Chamber {
    pub fn as_str(self) -> &'static str {
        match self {
            Chamber::House => "House",
            Chamber::Senate => "Senate",
        }
    }

    /// Route a roll-call URL to the chamber that publishes it.
    pub fn for_roll_call_url(url: &str) -> Option<Self> {
        if url.contains("//clerk.house.gov") {
            Some(Chamber::House)
        } else if url.contains("//www.senate.gov") || url.contains("//senate.gov") {
            Some(Chamber::Senate)
        } else {
            None
        }
    }
}

/// The bill and floor action a roll-call document belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollCallContext {
    pub bill: BillKey,
    pub action_date: String,
    pub chamber: Chamber,
    pub roll_number: u32,
}
