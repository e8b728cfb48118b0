//! Push transport contract.

use crate::error::StreamResult;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

/// Raw text payloads of one open push connection.
///
/// `Ok` items are event payloads in delivery order, an `Err` item is a
/// transport failure, and the end of the stream means the remote closed.
pub type MessageStream = BoxStream<'static, StreamResult<String>>;

/// Pending handshake. Resolves once the connection is open (or failed).
pub type ConnectFuture = BoxFuture<'static, StreamResult<MessageStream>>;

/// A source of long-lived server push connections.
///
/// `connect` is called synchronously by the subscription manager; the
/// returned future is then driven by a background task that the manager owns
/// and cancels on stop. Dropping the future or the stream must release the
/// underlying connection.
pub trait Transport: Send + Sync + 'static {
    fn connect(&self, endpoint: &str) -> ConnectFuture;
}
