//! Projection of decoded records onto graph descriptors.

use crate::context::RollCallContext;
use crate::identity::{self, BillKey};
use crate::records::{Bill, HouseVote, Member, SenateVote};
use crate::shapes::{BILL, MEMBER_SUBTYPE, PERSON, VOTED};
use dotgraph_core::graph::{EdgeDescriptor, NodeDescriptor, NodeRef};

pub fn member_node(member: &Member) -> NodeDescriptor {
    let (first, last) = member.split_name();
    NodeDescriptor::new(&PERSON, identity::person_id(&member.bioguide_id))
        .attr_opt("first", first)
        .attr("last", last)
        .attr("subtype", MEMBER_SUBTYPE)
        .attr_opt("party", member.party_name.as_ref())
        .attr_opt("state", member.state.as_ref())
        .attr_opt("chamber", member.current_chamber())
        .attr_opt("sourceUrl", member.url.as_ref())
}

/// The bill's identity key, if the listing carried chamber code and number.
pub fn bill_key(bill: &Bill) -> Option<BillKey> {
    let code = bill.origin_chamber_code.as_deref().filter(|c| !c.is_empty())?;
    let number = bill.number.as_deref().filter(|n| !n.is_empty())?;
    Some(BillKey::new(bill.congress, code, number))
}

pub fn bill_node(key: &BillKey, bill: &Bill) -> NodeDescriptor {
    NodeDescriptor::new(&BILL, key.id())
        .attr_opt("title", bill.title.as_ref())
        .attr_opt("billType", bill.bill_type.as_ref())
        .attr_opt("originChamber", bill.origin_chamber.as_ref())
        .attr("congress", bill.congress)
        .attr("number", &key.number)
        .attr_opt("url", bill.url.as_ref())
}

/// House voters are members keyed by bioguide id; only the identity is written.
pub fn house_voter_node(vote: &HouseVote) -> NodeDescriptor {
    NodeDescriptor::new(&PERSON, identity::person_id(&vote.bioguide_id))
}

/// Senate voters keyed by LIS member id in the `lis:` namespace.
///
/// Senate roll calls do not carry bioguide ids, so these nodes are not joined
/// to the member nodes from [`member_node`]: a senator appears once as a
/// member and once as a voter, and Senate `VOTED` edges hang off the latter.
pub fn senate_voter_node(vote: &SenateVote) -> NodeDescriptor {
    NodeDescriptor::new(&PERSON, identity::senate_person_id(&vote.lis_member_id))
        .attr_opt("first", vote.first.as_ref())
        .attr_opt("last", vote.last.as_ref())
        .attr("subtype", MEMBER_SUBTYPE)
        .attr_opt("party", vote.party.as_ref())
        .attr_opt("state", vote.state.as_ref())
        .attr("chamber", "Senate")
        .attr("lisMemberId", &vote.lis_member_id)
}

/// A VOTED edge from `voter` to the roll call's bill.
pub fn voted_edge(ctx: &RollCallContext, voter: &NodeDescriptor, vote: &str) -> EdgeDescriptor {
    let chamber = ctx.chamber.as_str();
    EdgeDescriptor::new(
        &VOTED,
        identity::voted_id(&ctx.bill, &ctx.action_date, chamber, ctx.roll_number, &voter.id),
        voter.to_ref(),
        NodeRef::new(&BILL, ctx.bill.id()),
    )
    .attr("vote", vote)
    .attr("date", &ctx.action_date)
    .attr("chamber", chamber)
    .attr("rollNumber", ctx.roll_number)
}
