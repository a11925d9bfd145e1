//! Session-authenticated publishing client.
//!
//! Logs in through the service's HTML form (cookies + anti-forgery token),
//! then posts block-structured messages, optionally with an image hosted on
//! the service first.

pub mod client;
pub mod error;
pub mod payload;
pub mod session;
pub mod token;
mod transport;
mod upload;

#[cfg(test)]
mod test_support;

pub use {
    client::{SendOutcome, SessionClient},
    error::{Error, Result},
    payload::{Block, BlockContent, MessagePayload, PostRequest},
    session::Session,
    token::{MarkerExtractor, RegexExtractor, TokenExtractor},
};
