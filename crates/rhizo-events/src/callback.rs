use crate::error::{EventsError, Result};
use crate::router::EventRouter;
use async_trait::async_trait;
use rhizo_protocol::RemotingHeaders;

/// Callback surface a transport invokes for messages pushed by the remote side.
///
/// `one_way_message` is called inline on the transport's receive thread and
/// must not fail or block for long. `request_response` covers callbacks that
/// expect a reply.
#[async_trait]
pub trait CallbackClient: Send + Sync {
    fn one_way_message(&self, headers: &RemotingHeaders, body: &[u8]);

    async fn request_response(&self, headers: &RemotingHeaders, body: &[u8]) -> Result<Vec<u8>>;
}

#[async_trait]
impl CallbackClient for EventRouter {
    fn one_way_message(&self, headers: &RemotingHeaders, body: &[u8]) {
        self.handle_one_way_message(headers, body);
    }

    /// Actor events are fire-and-forget; there is nothing to reply with.
    async fn request_response(&self, headers: &RemotingHeaders, _body: &[u8]) -> Result<Vec<u8>> {
        tracing::debug!(
            interface_id = headers.interface_id,
            method_id = headers.method_id,
            "Rejected request/response callback"
        );
        Err(EventsError::RequestResponseUnsupported)
    }
}
