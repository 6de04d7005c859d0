//! Entity shapes written by the crawl: labels and their closed attribute sets.

use dotgraph_core::graph::{EdgeShape, NodeShape};

pub static PERSON: NodeShape = NodeShape {
    label: "Person",
    attrs: &["first", "last", "subtype", "party", "state", "chamber", "sourceUrl", "lisMemberId"],
};

pub static BILL: NodeShape = NodeShape {
    label: "Bill",
    attrs: &["title", "billType", "originChamber", "congress", "number", "url"],
};

pub static VOTED: EdgeShape = EdgeShape {
    rel_type: "VOTED",
    left: &PERSON,
    right: &BILL,
    attrs: &["vote", "date", "chamber", "rollNumber"],
};

/// Node shapes that get an identity uniqueness constraint.
pub static NODE_SHAPES: &[&NodeShape] = &[&PERSON, &BILL];

/// Edge shapes that get an identity uniqueness constraint.
pub static EDGE_SHAPES: &[&EdgeShape] = &[&VOTED];

pub const MEMBER_SUBTYPE: &str = "CongressMember";
