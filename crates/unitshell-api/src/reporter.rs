//! In-band error reporting on an upgraded socket

use std::fmt::Display;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use tracing::{debug, warn};
use unitshell_domain::ShellError;

/// Tell the client what went wrong, then close the socket.
///
/// The message is a single text frame, `Error: <description>\n`. Stream I/O
/// failures carry no message since the socket is already unusable.
pub async fn report<S>(sink: &mut S, err: &ShellError)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    warn!(kind = err.kind(), error = %err, "Shell session failed");

    if let Some(message) = err.client_message() {
        if let Err(e) = sink.send(Message::Text(message.into())).await {
            debug!(error = %e, "Could not deliver error message");
            return;
        }
    }
    if let Err(e) = sink.send(Message::Close(None)).await {
        debug!(error = %e, "Could not send close frame");
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "Socket close failed");
    }
}
