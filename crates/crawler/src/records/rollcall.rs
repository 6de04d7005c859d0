//! Roll-call vote documents published by the House clerk and the Senate.
//!
//! Both are XML. They are read with the same lenient html5ever-based
//! selector engine used for markup elsewhere, which lowercases element and
//! attribute names and tolerates the doctype and processing instructions.

use dotgraph_core::Error;
use scraper::{ElementRef, Html, Selector};

/// One legislator's vote on a House roll call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseVote {
    pub bioguide_id: String,
    pub vote: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseRollCall {
    pub action_date: Option<String>,
    pub votes: Vec<HouseVote>,
}

/// One senator's vote on a Senate roll call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenateVote {
    pub lis_member_id: String,
    pub first: Option<String>,
    pub last: Option<String>,
    pub party: Option<String>,
    pub state: Option<String>,
    pub vote: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenateRollCall {
    pub vote_date: Option<String>,
    pub votes: Vec<SenateVote>,
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn child_text(parent: ElementRef<'_>, selector: &Selector) -> Option<String> {
    parent.select(selector).next().map(text_of).filter(|t| !t.is_empty())
}

fn from_utf8(bytes: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(bytes).map_err(|e| Error::Decode(format!("roll call is not UTF-8: {e}")))
}

/// Parse a clerk.house.gov `rollcall-vote` document.
pub fn parse_house(bytes: &[u8]) -> Result<HouseRollCall, Error> {
    let document = Html::parse_document(from_utf8(bytes)?);
    let root_sel = Selector::parse("rollcall-vote").expect("invalid selector");
    let vote_sel = Selector::parse("vote-data > recorded-vote").expect("invalid selector");
    let legislator_sel = Selector::parse("legislator").expect("invalid selector");
    let cast_sel = Selector::parse("vote").expect("invalid selector");
    let date_sel = Selector::parse("vote-metadata > action-date").expect("invalid selector");

    let root = document
        .select(&root_sel)
        .next()
        .ok_or_else(|| Error::Decode("missing rollcall-vote element".into()))?;

    let mut votes = Vec::new();
    for recorded in root.select(&vote_sel) {
        let Some(bioguide_id) = recorded
            .select(&legislator_sel)
            .next()
            .and_then(|l| l.value().attr("name-id"))
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            continue;
        };
        let Some(vote) = child_text(recorded, &cast_sel) else { continue };
        votes.push(HouseVote { bioguide_id: bioguide_id.to_string(), vote });
    }

    Ok(HouseRollCall { action_date: child_text(root, &date_sel), votes })
}

/// Parse a senate.gov `roll_call_vote` document.
pub fn parse_senate(bytes: &[u8]) -> Result<SenateRollCall, Error> {
    let document = Html::parse_document(from_utf8(bytes)?);
    let root_sel = Selector::parse("roll_call_vote").expect("invalid selector");
    let member_sel = Selector::parse("members > member").expect("invalid selector");
    let lis_sel = Selector::parse("lis_member_id").expect("invalid selector");
    let first_sel = Selector::parse("first_name").expect("invalid selector");
    let last_sel = Selector::parse("last_name").expect("invalid selector");
    let party_sel = Selector::parse("party").expect("invalid selector");
    let state_sel = Selector::parse("state").expect("invalid selector");
    let cast_sel = Selector::parse("vote_cast").expect("invalid selector");
    let date_sel = Selector::parse("vote_date").expect("invalid selector");

    let root = document
        .select(&root_sel)
        .next()
        .ok_or_else(|| Error::Decode("missing roll_call_vote element".into()))?;

    let votes = root
        .select(&member_sel)
        .filter_map(|member| {
            Some(SenateVote {
                lis_member_id: child_text(member, &lis_sel)?,
                first: child_text(member, &first_sel),
                last: child_text(member, &last_sel),
                party: child_text(member, &party_sel),
                state: child_text(member, &state_sel),
                vote: child_text(member, &cast_sel)?,
            })
        })
        .collect();

    Ok(SenateRollCall { vote_date: child_text(root, &date_sel), votes })
}
