//! Authenticated session: in-memory state, persistence and the store that
//! owns both.

mod models;
mod storage;
mod store;

pub use models::{Credentials, Session, SessionHandle, SessionStatus};
pub use storage::SessionFile;
pub use store::{SessionStore, LOGIN_PATH, REGISTER_PATH};
