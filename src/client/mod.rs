//! BaoStock client: session tracking, local validation and the query API.

mod api;
mod connection;
mod result;
mod session;
mod state_machine;
pub mod validate;

#[cfg(test)]
pub(crate) mod mock;

pub use api::BaoClient;
pub use connection::Connection;
pub use result::{ResultData, ResultSet};
pub use session::{PageCursor, Session};
pub use state_machine::{ClientState, Operation};
pub use validate::Rejection;
