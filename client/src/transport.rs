//! Socket transport.
//!
//! The client only needs two things from a socket: the next text frame and a
//! way to close it. Both traits are object safe so the client can hold an
//! `Arc<dyn Transport>` and tests can inject an in-memory implementation.

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::TransportError;

/// An open socket.
pub trait Socket: Send {
    /// Next text frame. `None` once the peer has closed the connection.
    fn recv(&mut self) -> BoxFuture<'_, Option<Result<String, TransportError>>>;

    /// Close the connection from our side.
    fn close(self: Box<Self>) -> BoxFuture<'static, ()>;
}

/// Opens sockets.
pub trait Transport: Send + Sync {
    fn connect<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn Socket>, TransportError>>;
}

/// WebSocket transport backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WebSocketTransport {
    fn connect<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn Socket>, TransportError>> {
        async move {
            let (stream, response) = connect_async(url).await?;
            tracing::debug!(
                url = %url,
                status = %response.status(),
                "WebSocket handshake complete"
            );
            let socket: Box<dyn Socket> = Box::new(WebSocketSocket { stream });
            Ok::<_, TransportError>(socket)
        }
        .boxed()
    }
}

struct WebSocketSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Socket for WebSocketSocket {
    fn recv(&mut self) -> BoxFuture<'_, Option<Result<String, TransportError>>> {
        async move {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => return Some(Ok(text.as_str().to_owned())),
                    Some(Ok(Message::Binary(_))) => {
                        tracing::warn!("Binary messages not supported");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(frame = ?frame, "WebSocket close frame received");
                        return None;
                    }
                    // Ping replies are queued by tungstenite itself
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Some(Err(e.into())),
                    None => return None,
                }
            }
        }
        .boxed()
    }

    fn close(mut self: Box<Self>) -> BoxFuture<'static, ()> {
        async move {
            if let Err(e) = self.stream.close(None).await {
                tracing::debug!("Error while closing WebSocket: {}", e);
            }
        }
        .boxed()
    }
}
