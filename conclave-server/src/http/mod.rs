mod ice;
mod routes;

pub use ice::IceConfigService;
pub use routes::{generate_room_id, router};
