//! Chat client for the support desk.
//!
//! The session state machine is independent of any front end; the terminal
//! front end drives it over [`http::ApiClient`].

pub mod http;
pub mod session;
pub mod terminal;
