//! Tokio runtime for a [`Session`].
//!
//! A [`Client`] owns one stream and one task. The task reads lines, feeds
//! them to the session under a short lock, writes whatever the session asks
//! for, and hands events to the [`EventHandler`] after the lock is released.
//! Outbound calls from a [`ClientHandle`] go through an unbounded queue that
//! only the task drains, so lines are never interleaved.
//!
//! # Example
//!
//! ```no_run
//! use slirc_session::client::Client;
//! use slirc_session::state::SessionConfig;
//! use slirc_session::Event;
//!
//! # async fn run() -> Result<(), slirc_session::SessionError> {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let config = SessionConfig::new("irc.libera.chat", "slirc", "slirc", "slirc bot");
//! let client = Client::connect(config, tx).await?;
//! let handle = client.handle();
//!
//! while let Some(event) = rx.recv().await {
//!     match event {
//!         Event::ConnectionSucceeded { .. } => handle.join(b"#slirc", None)?,
//!         Event::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! client.wait().await
//! # }
//! ```

mod handle;

pub use self::handle::{ChannelHandle, ClientHandle};

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::event::EventHandler;
use crate::line::LineCodec;
use crate::state::{Action, DisconnectReason, Session, SessionConfig};
use crate::transport::connect_tcp;

type LineSink<S> = FramedWrite<WriteHalf<S>, LineCodec>;

/// State shared between the task and its handles.
pub(crate) struct Shared {
    pub(crate) session: Mutex<Session>,
    pub(crate) outbound: mpsc::UnboundedSender<Vec<u8>>,
    pub(crate) shutdown: broadcast::Sender<()>,
}

/// A running connection.
#[derive(Debug)]
pub struct Client {
    handle: ClientHandle,
    task: JoinHandle<()>,
}

impl Client {
    /// Connect over TCP and start the session task.
    ///
    /// If the TCP connection fails, `handler` still receives
    /// `ConnectionFailed` and `Disconnected` before the error is returned.
    pub async fn connect<H>(config: SessionConfig, mut handler: H) -> Result<Self, SessionError>
    where
        H: EventHandler + 'static,
    {
        let mut session = Session::new(config);
        session.begin_connect()?;
        let host = session.config().host.clone();
        let port = session.config().port;

        match connect_tcp(&host, port).await {
            Ok(stream) => Ok(Self::spawn(stream, session, handler)),
            Err(e) => {
                let message = e.to_string();
                warn!(%host, port, error = %message, "connect failed");
                for action in session.transport_closed(DisconnectReason::Transport(message.clone())) {
                    if let Action::Emit(event) = action {
                        handler.on_event(event);
                    }
                }
                Err(SessionError::Transport(message))
            }
        }
    }

    /// Start the session task over an already connected stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect_with_stream<S, H>(
        stream: S,
        config: SessionConfig,
        handler: H,
    ) -> Result<Self, SessionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
        H: EventHandler + 'static,
    {
        let mut session = Session::new(config);
        session.begin_connect()?;
        Ok(Self::spawn(stream, session, handler))
    }

    fn spawn<S, H>(stream: S, session: Session, handler: H) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
        H: EventHandler + 'static,
    {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let shared = Arc::new(Shared {
            session: Mutex::new(session),
            outbound,
            shutdown,
        });
        let task = tokio::spawn(run(
            stream,
            Arc::clone(&shared),
            outbound_rx,
            shutdown_rx,
            handler,
        ));
        Self {
            handle: ClientHandle::new(shared),
            task,
        }
    }

    /// A cloneable handle for sending commands.
    #[must_use]
    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    /// Wait for the session task to finish.
    pub async fn wait(self) -> Result<(), SessionError> {
        self.task
            .await
            .map_err(|e| SessionError::Transport(format!("session task failed: {}", e)))
    }
}

async fn run<S, H>(
    stream: S,
    shared: Arc<Shared>,
    mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    mut shutdown_rx: broadcast::Receiver<()>,
    mut handler: H,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
    H: EventHandler,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut lines = FramedRead::new(reader, LineCodec::new());
    let mut sink = FramedWrite::new(writer, LineCodec::new());

    let actions = shared.session.lock().transport_connected();
    let mut stopped = perform(actions, &mut sink, &mut handler).await;

    let reason = loop {
        if let Some(reason) = stopped.take() {
            break reason;
        }

        tokio::select! {
            _ = shutdown_rx.recv() => {
                // Flush what was queued before the shutdown (usually QUIT).
                while let Ok(line) = outbound_rx.try_recv() {
                    if sink.feed(line).await.is_err() {
                        break;
                    }
                }
                if let Err(e) = sink.flush().await {
                    debug!(error = %e, "flush on shutdown failed");
                }
                break DisconnectReason::Requested;
            }
            Some(line) = outbound_rx.recv() => {
                if let Err(e) = sink.send(line).await {
                    warn!(error = %e, "write failed");
                    break DisconnectReason::Transport(e.to_string());
                }
            }
            frame = lines.next() => match frame {
                Some(Ok(line)) => {
                    let actions = shared.session.lock().handle_line(&line);
                    stopped = perform(actions, &mut sink, &mut handler).await;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "read failed");
                    break DisconnectReason::Transport(e.to_string());
                }
                None => break DisconnectReason::ClosedByPeer,
            },
        }
    };

    if let Err(e) = sink.close().await {
        debug!(error = %e, "close failed");
    }
    let actions = shared.session.lock().transport_closed(reason);
    for action in actions {
        if let Action::Emit(event) = action {
            handler.on_event(event);
        }
    }
}

/// Carry out session actions in order. Returns the reason to stop, if any.
async fn perform<S, H>(
    actions: Vec<Action>,
    sink: &mut LineSink<S>,
    handler: &mut H,
) -> Option<DisconnectReason>
where
    S: AsyncWrite,
    H: EventHandler,
{
    for action in actions {
        match action {
            Action::Send(line) => {
                if let Err(e) = sink.send(line).await {
                    warn!(error = %e, "write failed");
                    return Some(DisconnectReason::Transport(e.to_string()));
                }
            }
            Action::Emit(event) => handler.on_event(event),
            Action::Close => return Some(DisconnectReason::Requested),
        }
    }
    None
}
