/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Byte-stream abstraction over the session transport.
//!
//! The session layer only needs an ordered byte stream; TCP, TLS and any
//! proxying live behind [`Connector`]. The library ships a plain TCP
//! implementation; hosts that terminate TLS wrap their own stream type and
//! hand it back as a [`BoxedStream`], reading whatever parameters they need
//! from the session's `transport_opts` map.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// An ordered, async byte stream carrying one FIX session.
pub trait FixStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> FixStream for T {}

/// Owned stream handed to the session task.
pub type BoxedStream = Box<dyn FixStream>;

/// Opens transport connections for a session.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a connection to `host:port`.
    ///
    /// # Arguments
    /// * `host` - DNS name or IP address
    /// * `port` - TCP port
    /// * `opts` - The session's opaque `transport_opts` map
    ///
    /// # Errors
    /// Returns an `io::Error` on resolution, connect or handshake failure.
    async fn connect(
        &self,
        host: &str,
        port: u16,
        opts: &HashMap<String, String>,
    ) -> io::Result<BoxedStream>;
}

/// Plain TCP connector with a bounded connect time.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    /// Maximum time to wait for the connection to establish.
    connect_timeout: Duration,
}

impl TcpConnector {
    /// Creates a connector with the default 10 second connect timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, value: Duration) -> Self {
        self.connect_timeout = value;
        self
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        opts: &HashMap<String, String>,
    ) -> io::Result<BoxedStream> {
        let stream = timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {host}:{port} timed out"),
                )
            })??;

        let nodelay = opts.get("tcp_nodelay").map_or(true, |v| v != "false");
        stream.set_nodelay(nodelay)?;

        Ok(Box::new(stream))
    }
}
