//! HTTP clients used by the tubesig batch steps and the disclosure poller.
//!
//! Every client has a `with_base_url` constructor so integration tests can
//! point it at a local mock server.

pub mod chatbot;
pub mod disclosure;
pub mod error;
pub mod forward;
mod http;
pub mod llm;
pub mod retry;
pub mod review_server;

pub use chatbot::{truncate_message, ChatBotClient, ChatSink, MessageId, MAX_MESSAGE_CHARS};
pub use disclosure::{Disclosure, DisclosureClient, DisclosurePage, DisclosureQuery};
pub use error::ClientError;
pub use forward::{
    format_disclosure, forward_new, matches_watchlist, ForwardReport, MessageSink, SeenSet,
};
pub use llm::{first_available, parse_verdict, Completion, LlmClient, ModelProbe};
pub use retry::retry_with_backoff;
pub use review_server::ReviewServerClient;
