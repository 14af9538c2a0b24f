//! Conversation state for the site's chat widget.
//!
//! [`ConversationManager`] owns the visible message history, the session id
//! threaded through to the flow service, and the in-flight/error flags. It
//! talks to the proxy endpoint through a [`ProxyTransport`].

pub mod error;
pub mod manager;
pub mod transport;

pub use error::ChatError;
pub use manager::{ChatSnapshot, ConversationManager, SendOutcome};
pub use transport::{HttpProxyTransport, ProxyTransport};
