/// Which end of a peer pair drives the offer.
///
/// The side that just joined the room initiates toward every existing member;
/// existing members answer. Assigned once at link creation and never inferred
/// afterwards, so the two ends can never both send an offer for the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkRole {
    Initiator,
    Responder,
}
