pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ChatlineError, ConfigError, StoreError, TransportError};
pub use events::{EventBus, SessionEvent};
pub use id::{new_id, MessageId};
pub use types::{ConnectionState, ErrorCategory, Message, Sender};

pub type Result<T> = std::result::Result<T, ChatlineError>;
