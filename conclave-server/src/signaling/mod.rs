mod relay;
mod ws_handler;

pub use relay::SignalingRelay;
pub use ws_handler::ws_handler;
