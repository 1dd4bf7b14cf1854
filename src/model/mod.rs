pub mod network;
pub mod state;

pub use network::{ConnectionRecord, Owner, OWNER_SENTINEL};
pub use state::ConnectionState;
