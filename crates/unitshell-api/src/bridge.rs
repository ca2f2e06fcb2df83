//! Session bridge between a client socket and a shell process
//!
//! Two pumps run inside the connection task: client frames go to the
//! process's input (or its resize channel), process output goes back as
//! binary frames. Whichever pump finishes first ends the session and the
//! other is cancelled on the spot.

use std::fmt::{self, Display};

use axum::extract::ws::{close_code, CloseFrame, Message};
use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;
use unitshell_domain::{ShellStream, TermSize};

/// Control message a client may send as a text frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// `{"type":"resize","width":W,"height":H}`
    Resize {
        /// Columns
        width: u16,
        /// Rows
        height: u16,
    },
}

impl ControlMessage {
    /// Parse a text frame as a control message.
    ///
    /// Anything that is not a well-formed resize with positive dimensions is
    /// terminal input, not a control message.
    pub fn parse(text: &str) -> Option<Self> {
        if !text.trim_start().starts_with('{') {
            return None;
        }
        match serde_json::from_str(text).ok()? {
            ControlMessage::Resize { width, height } if width > 0 && height > 0 => {
                Some(ControlMessage::Resize { width, height })
            }
            ControlMessage::Resize { .. } => None,
        }
    }

    /// Terminal size carried by a resize
    pub fn size(&self) -> TermSize {
        match *self {
            ControlMessage::Resize { width, height } => TermSize { width, height },
        }
    }
}

/// Why a bridged session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// Client sent a close frame or its stream ended
    ClientClosed,
    /// Shell process output ended
    ProcessExited,
    /// Transport failure on the socket
    Io(String),
}

impl Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::ClientClosed => write!(f, "client closed"),
            EndReason::ProcessExited => write!(f, "process exited"),
            EndReason::Io(err) => write!(f, "stream error: {err}"),
        }
    }
}

/// Outcome of a bridged session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnd {
    /// What ended it
    pub reason: EndReason,
    /// Bytes written to the process
    pub bytes_in: u64,
    /// Bytes sent to the client
    pub bytes_out: u64,
}

/// Pump bytes between the client socket halves and `shell` until either side
/// finishes. The process streams are dropped before this returns.
pub async fn bridge<S, R, E>(mut sink: S, mut source: R, shell: ShellStream) -> SessionEnd
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let ShellStream {
        input,
        mut output,
        resize,
    } = shell;
    let mut bytes_in = 0u64;
    let mut bytes_out = 0u64;

    let reason = {
        let client_to_process = pump_client(&mut source, &input, &resize, &mut bytes_in);
        let process_to_client = pump_process(&mut output, &mut sink, &mut bytes_out);
        tokio::select! {
            reason = client_to_process => reason,
            reason = process_to_client => reason,
        }
    };

    drop(input);
    drop(resize);
    drop(output);

    if reason == EndReason::ProcessExited {
        let close = Message::Close(Some(CloseFrame {
            code: close_code::NORMAL,
            reason: "shell exited".into(),
        }));
        if let Err(e) = sink.send(close).await {
            debug!(error = %e, "Could not send close frame");
        }
    }
    if !matches!(reason, EndReason::Io(_)) {
        if let Err(e) = sink.close().await {
            debug!(error = %e, "Socket close failed");
        }
    }

    SessionEnd {
        reason,
        bytes_in,
        bytes_out,
    }
}

async fn pump_client<R, E>(
    source: &mut R,
    input: &mpsc::Sender<Bytes>,
    resize: &mpsc::Sender<TermSize>,
    bytes_in: &mut u64,
) -> EndReason
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut process_gone = false;
    while let Some(frame) = source.next().await {
        let data = match frame {
            Ok(Message::Binary(data)) => data,
            Ok(Message::Text(text)) => {
                if let Some(control) = ControlMessage::parse(text.as_str()) {
                    let size = control.size();
                    if !process_gone {
                        match resize.try_send(size) {
                            Ok(()) => debug!(%size, "Forwarding resize"),
                            // Only the latest size matters; a backlog is dropped.
                            Err(TrySendError::Full(_)) => debug!(%size, "Resize dropped"),
                            Err(TrySendError::Closed(_)) => process_gone = true,
                        }
                    }
                    continue;
                }
                Bytes::copy_from_slice(text.as_str().as_bytes())
            }
            Ok(Message::Close(_)) => return EndReason::ClientClosed,
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Err(e) => return EndReason::Io(e.to_string()),
        };

        if process_gone {
            continue;
        }
        *bytes_in += data.len() as u64;
        // A closed input means the process is exiting; its output end
        // reports that.
        if input.send(data).await.is_err() {
            process_gone = true;
        }
    }
    EndReason::ClientClosed
}

async fn pump_process<S>(
    output: &mut mpsc::Receiver<Bytes>,
    sink: &mut S,
    bytes_out: &mut u64,
) -> EndReason
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(chunk) = output.recv().await {
        *bytes_out += chunk.len() as u64;
        if let Err(e) = sink.send(Message::Binary(chunk)).await {
            return EndReason::Io(e.to_string());
        }
    }
    EndReason::ProcessExited
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::channel::mpsc as fmpsc;
    use tokio::task::JoinHandle;
    use unitshell_domain::ShellStreamBackend;

    use super::*;

    struct Harness {
        client_tx: fmpsc::UnboundedSender<Result<Message, Infallible>>,
        client_rx: fmpsc::UnboundedReceiver<Message>,
        backend: ShellStreamBackend,
        session: JoinHandle<SessionEnd>,
    }

    fn start() -> Harness {
        let (client_tx, source) = fmpsc::unbounded();
        let (sink, client_rx) = fmpsc::unbounded();
        let (shell, backend) = ShellStream::channel(16);
        let session = tokio::spawn(bridge(sink, source, shell));
        Harness {
            client_tx,
            client_rx,
            backend,
            session,
        }
    }

    #[test]
    fn test_control_message_parsing() {
        assert_eq!(
            ControlMessage::parse(r#"{"type":"resize","width":120,"height":40}"#),
            Some(ControlMessage::Resize {
                width: 120,
                height: 40
            })
        );
        assert_eq!(ControlMessage::parse(r#"{"type":"resize","width":0,"height":40}"#), None);
        assert_eq!(ControlMessage::parse(r#"{"type":"other"}"#), None);
        assert_eq!(ControlMessage::parse("ls -la\n"), None);
        assert_eq!(ControlMessage::parse("{not json"), None);
    }

    #[tokio::test]
    async fn test_bytes_flow_both_ways_until_client_closes() {
        let mut h = start();

        h.client_tx
            .unbounded_send(Ok(Message::Binary(Bytes::from_static(b"ls\n"))))
            .unwrap();
        assert_eq!(h.backend.input.recv().await.unwrap(), Bytes::from_static(b"ls\n"));

        h.backend.output.send(Bytes::from_static(b"file.txt\n")).await.unwrap();
        match h.client_rx.next().await.unwrap() {
            Message::Binary(data) => assert_eq!(data, Bytes::from_static(b"file.txt\n")),
            other => panic!("unexpected frame {other:?}"),
        }

        h.client_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        let end = h.session.await.unwrap();
        assert_eq!(end.reason, EndReason::ClientClosed);
        assert_eq!((end.bytes_in, end.bytes_out), (3, 9));

        // Input closes so the backend can tear the process down.
        assert!(h.backend.input.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_process_exit_closes_socket() {
        let mut h = start();
        h.backend.output.send(Bytes::from_static(b"bye")).await.unwrap();
        drop(h.backend.output);

        let end = h.session.await.unwrap();
        assert_eq!(end.reason, EndReason::ProcessExited);

        assert!(matches!(h.client_rx.next().await, Some(Message::Binary(_))));
        assert!(matches!(h.client_rx.next().await, Some(Message::Close(Some(_)))));
    }

    #[tokio::test]
    async fn test_resize_is_forwarded_not_written() {
        let mut h = start();

        h.client_tx
            .unbounded_send(Ok(Message::Text(
                r#"{"type":"resize","width":100,"height":30}"#.into(),
            )))
            .unwrap();
        h.client_tx
            .unbounded_send(Ok(Message::Text("whoami\n".into())))
            .unwrap();

        assert_eq!(
            h.backend.resize.recv().await.unwrap(),
            TermSize {
                width: 100,
                height: 30
            }
        );
        assert_eq!(h.backend.input.recv().await.unwrap(), Bytes::from_static(b"whoami\n"));

        drop(h.client_tx);
        let end = h.session.await.unwrap();
        assert_eq!(end.reason, EndReason::ClientClosed);
        assert_eq!(end.bytes_in, 7);
    }

    #[tokio::test]
    async fn test_undrained_resizes_do_not_stall_input() {
        let mut h = start();

        for width in 1..=32u16 {
            let frame = format!(r#"{{"type":"resize","width":{width},"height":24}}"#);
            h.client_tx
                .unbounded_send(Ok(Message::Text(frame.into())))
                .unwrap();
        }
        h.client_tx
            .unbounded_send(Ok(Message::Text("echo ok\n".into())))
            .unwrap();

        let received = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            h.backend.input.recv(),
        )
        .await
        .expect("input pump stalled behind resizes");
        assert_eq!(received.unwrap(), Bytes::from_static(b"echo ok\n"));

        // The first resizes fill the channel; the rest are dropped.
        assert_eq!(
            h.backend.resize.recv().await.unwrap(),
            TermSize {
                width: 1,
                height: 24
            }
        );

        drop(h.client_tx);
        assert_eq!(h.session.await.unwrap().reason, EndReason::ClientClosed);
    }

    #[tokio::test]
    async fn test_ping_frames_are_not_input() {
        let mut h = start();
        h.client_tx
            .unbounded_send(Ok(Message::Ping(Bytes::from_static(b"p"))))
            .unwrap();
        h.client_tx
            .unbounded_send(Ok(Message::Binary(Bytes::from_static(b"x"))))
            .unwrap();

        assert_eq!(h.backend.input.recv().await.unwrap(), Bytes::from_static(b"x"));
        drop(h.client_tx);
        assert_eq!(h.session.await.unwrap().bytes_in, 1);
    }
}
