//! Deterministic node and edge identities.
//!
//! Every identity is a SHA-256 digest of immutable source keys, so the same
//! entity gets the same id on every run regardless of crawl order.

use sha2::{Digest, Sha256};

fn digest(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// A bill's immutable key: (congress, origin chamber code, number).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BillKey {
    pub congress: u32,
    pub chamber_code: String,
    pub number: String,
}

impl BillKey {
    pub fn new(congress: u32, chamber_code: impl Into<String>, number: impl Into<String>) -> Self {
        Self { congress, chamber_code: chamber_code.into(), number: number.into() }
    }

    pub fn id(&self) -> String {
        digest(&self.path())
    }

    fn path(&self) -> String {
        format!("{}/bill/{}/{}", self.congress, self.chamber_code, self.number)
    }
}

impl std::fmt::Display for BillKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Person keyed by bioguide id.
pub fn person_id(bioguide_id: &str) -> String {
    digest(&format!("{bioguide_id}-congress"))
}

/// Person keyed by Senate LIS member id, a namespace disjoint from bioguide ids.
pub fn senate_person_id(lis_member_id: &str) -> String {
    digest(&format!("lis:{lis_member_id}-congress"))
}

/// A single voter's vote on a single roll call about a bill.
pub fn voted_id(bill: &BillKey, action_date: &str, chamber: &str, roll_number: u32, voter_id: &str) -> String {
    digest(&format!("{}/action/{action_date}/roll/{chamber}/{roll_number}/{voter_id}", bill.path()))
}
