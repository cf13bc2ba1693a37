mod link;
mod participant;
mod room;
mod signaling;

pub use link::LinkRole;
pub use participant::ParticipantId;
pub use room::RoomId;
pub use signaling::{IceConfig, IceServerConfig, SignalMessage};
