pub mod client;
pub mod form;
pub mod team;
pub mod user;

mod null_as_default;

#[cfg(test)]
mod stub;

pub use crate::client::Client;
pub use crate::client::Context;
pub use crate::client::Error;
pub use crate::client::Transport;
