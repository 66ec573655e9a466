//! # coinfolio
//!
//! Session core for the crypto portfolio client: token storage, the
//! authenticated request gateway with single-flight refresh, and the route
//! guard that decides whether a protected view may render.
//!
//! The UI layer (here, the `coinfolio` CLI) only talks to [`net::api::ApiClient`]
//! and [`guard::RouteGuard`]; everything that touches tokens goes through
//! [`session::SessionStore`].

pub mod config;
pub mod guard;
pub mod net;
pub mod session;
pub mod validate;
