pub mod client;
pub mod error;
pub mod retry;
pub mod selector;
pub mod transport;

pub mod test_support;

pub use client::CompletionClient;
pub use error::ClientError;
pub use retry::{RetryMachine, RetryPolicy, RetryState};
pub use selector::ModelSelector;
pub use transport::{ChatTransport, HttpTransport};
