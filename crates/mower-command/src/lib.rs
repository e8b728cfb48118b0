//! Command dispatch for the mower control endpoint.
//!
//! A command is a named action with scalar arguments, sent as one HTTP POST.
//! There are no retries, queueing or de-duplication: every `dispatch` is
//! exactly one request and yields exactly one `CommandOutcome`.

pub mod dispatcher;
pub mod error;
pub mod request;

pub use dispatcher::{CommandDispatcher, DispatcherConfig, DEFAULT_CALL_PATH};
pub use error::{CommandError, CommandResult};
pub use request::{parse_key_value, ArgValue, CommandArgs, CommandOutcome, CommandRequest};
