//! api.congress.gov v3 JSON payloads.
//!
//! Only the fields the pipeline reads are modelled; everything else in the
//! payload is ignored.

use dotgraph_core::Error;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Decode a JSON payload into a typed page.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Every listing page carries an optional pagination block.
pub trait Paged {
    fn next_page(&self) -> Option<&str>;
}

macro_rules! paged {
    ($($ty:ty),+) => {
        $(impl Paged for $ty {
            fn next_page(&self) -> Option<&str> {
                self.pagination.as_ref().and_then(|p| p.next.as_deref()).filter(|n| !n.is_empty())
            }
        })+
    };
}

paged!(MembersPage, CongressPage, BillsPage, ActionsPage);

#[derive(Debug, Clone, Deserialize)]
pub struct MembersPage {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub bioguide_id: String,
    /// "Last, First" as published.
    pub name: String,
    #[serde(default)]
    pub party_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub terms: Terms,
    #[serde(default)]
    pub url: Option<String>,
}

impl Member {
    /// Split "Last, First" into (first, last). A name without a comma is all surname.
    pub fn split_name(&self) -> (Option<&str>, &str) {
        match self.name.split_once(',') {
            Some((last, first)) => {
                let first = first.trim();
                ((!first.is_empty()).then_some(first), last.trim())
            }
            None => (None, self.name.trim()),
        }
    }

    /// Chamber of the most recent term.
    pub fn current_chamber(&self) -> Option<&str> {
        self.terms.item.last().and_then(|t| t.chamber.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Terms {
    #[serde(default)]
    pub item: Vec<TermItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermItem {
    #[serde(default)]
    pub chamber: Option<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CongressPage {
    #[serde(default)]
    pub congresses: Vec<CongressItem>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CongressItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_year: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillsPage {
    #[serde(default)]
    pub bills: Vec<Bill>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub congress: u32,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub origin_chamber: Option<String>,
    #[serde(default)]
    pub origin_chamber_code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub bill_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionsPage {
    #[serde(default)]
    pub actions: Vec<BillAction>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillAction {
    #[serde(default)]
    pub action_date: Option<String>,
    #[serde(rename = "type", default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub recorded_votes: Vec<RecordedVote>,
}

impl BillAction {
    /// Floor actions are the only ones whose recorded votes are followed.
    pub fn is_floor(&self) -> bool {
        self.action_type.as_deref() == Some("Floor")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedVote {
    #[serde(default)]
    pub chamber: Option<String>,
    #[serde(default)]
    pub congress: Option<u32>,
    #[serde(default)]
    pub roll_number: Option<u32>,
    #[serde(default)]
    pub session_number: Option<u32>,
    #[serde(default)]
    pub url: Option<String>,
}
