//! Session state: the single owner of access/refresh tokens and the user.
//!
//! DESIGN
//! ======
//! `SessionStore` is an explicitly constructed handle shared by the gateway,
//! the refresh coordinator, the route guard and the UI layer. Every token
//! mutation goes through it, and each transition writes through to the
//! persistence adapter while the in-memory lock is still held, so memory and
//! storage are never observed out of step.
//!
//! TRADE-OFFS
//! ==========
//! Tokens are opaque: nothing here inspects expiry. A stale but present token
//! reports authenticated until the first guarded call comes back 401 and the
//! refresh protocol takes over.

pub mod cookie;
pub mod storage;
pub mod store;
pub mod types;

pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::{LoadingGuard, SessionStore};
pub use types::{Session, User};
