mod link_command;
mod peer_link;

pub use link_command::{LinkCommand, LinkEvent, LinkState};
pub use peer_link::{LinkHandle, PeerLink};
