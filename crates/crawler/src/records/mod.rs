//! Typed records decoded from fetched payloads.

pub mod api;
pub mod rollcall;

pub use api::{
    ActionsPage, Bill, BillAction, BillsPage, CongressItem, CongressPage, Member, MembersPage, Paged, RecordedVote,
    decode,
};
pub use rollcall::{HouseRollCall, HouseVote, SenateRollCall, SenateVote, parse_house, parse_senate};
