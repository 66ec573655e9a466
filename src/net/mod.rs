//! Network layer between the UI and the portfolio backend.
//!
//! ARCHITECTURE
//! ============
//! `api` exposes one typed method per backend operation. Every call goes
//! through the `gateway`, which attaches the bearer token and, on a 401 for
//! an authenticated request, hands off to the `refresh` coordinator before
//! retrying once. The `transport` trait is the only place that knows about
//! `reqwest`, so tests can script the backend.
//!
//! ERROR HANDLING
//! ==============
//! The gateway never raises for HTTP statuses; it returns responses as-is and
//! only errors on transport failure. `api` turns non-2xx responses into
//! tagged [`types::ApiError`] values.

pub mod api;
pub mod gateway;
pub mod refresh;
pub mod transport;
pub mod types;

#[cfg(test)]
pub mod test_helpers;
