//! Operator identity: the coordinator address a user logged into and the
//! session record that carries their bearer token between invocations.
//! Keep the public surface thin and split implementation across sub-modules.

mod coordinator_addr;
mod session;

pub use coordinator_addr::{coordinator_endpoint, key_path, normalize_coordinator_url, segment};
pub use session::{Session, SessionStore, SessionToken, DEFAULT_SESSION_TTL_HOURS};
