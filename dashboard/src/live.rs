//! Push channel listener: prepends every `NEW_LOG` the service announces.

use std::time::Duration;

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;
use crate::session::Dashboard;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Exponential reconnect delay, reset after every successful connect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn next(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max)
    }
}

#[derive(Clone, Debug)]
pub struct LiveOptions {
    pub url: String,
    /// `None` gives up after the first disconnect.
    pub reconnect: Option<Backoff>,
}

enum Flow {
    Stop,
    Reconnect,
}

/// Background task owning the push channel connection.
///
/// Dropping the listener cancels it; [`LiveListener::close`] also waits for
/// the connection to be shut down.
pub struct LiveListener {
    cancel: CancellationToken,
    connected: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl LiveListener {
    pub fn spawn(dashboard: Dashboard, options: LiveOptions) -> Self {
        let cancel = CancellationToken::new();
        let (status, connected) = watch::channel(false);
        let task = tokio::spawn(run(dashboard, options, cancel.clone(), status));
        Self {
            cancel,
            connected,
            task,
        }
    }

    /// Tracks whether the channel is currently open.
    pub fn connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Err(err) = (&mut self.task).await {
            tracing::warn!("live listener task ended abnormally: {err}");
        }
    }
}

impl Drop for LiveListener {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    dashboard: Dashboard,
    options: LiveOptions,
    cancel: CancellationToken,
    status: watch::Sender<bool>,
) {
    let mut delay = options.reconnect.map(|b| b.initial).unwrap_or_default();

    loop {
        let attempt = tokio::select! {
            _ = cancel.cancelled() => return,
            attempt = connect_async(options.url.as_str()) => attempt,
        };

        match attempt {
            Ok((socket, _)) => {
                tracing::info!(url = %options.url, "live channel connected");
                status.send_replace(true);
                if let Some(backoff) = options.reconnect {
                    delay = backoff.initial;
                }
                let flow = pump(socket, &dashboard, &cancel).await;
                status.send_replace(false);
                if let Flow::Stop = flow {
                    return;
                }
                tracing::warn!(url = %options.url, "live channel closed");
            }
            Err(err) => {
                tracing::warn!("{}", ServiceError::from(err));
            }
        }

        let Some(backoff) = options.reconnect else {
            return;
        };
        tracing::debug!(?delay, "reconnecting live channel");
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        delay = backoff.next(delay);
    }
}

async fn pump(mut socket: Socket, dashboard: &Dashboard, cancel: &CancellationToken) -> Flow {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(err) = socket.close(None).await {
                    tracing::debug!("closing live channel: {err}");
                }
                return Flow::Stop;
            }
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    dashboard.receive_push(&text).await;
                }
                Some(Ok(Message::Close(_))) | None => return Flow::Reconnect,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!("{}", ServiceError::from(err));
                    return Flow::Reconnect;
                }
            },
        }
    }
}
