//! Opening raw connections to a daemon's advertised address

use crate::daemon::DaemonAddress;
use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;
use tracing::debug;

/// Recoverable failure to reach a daemon
///
/// The address is unreachable, refused, or the process behind it is gone.
#[derive(Debug, Error)]
#[error("Could not connect to {address}: {source}")]
pub struct ConnectFailure {
    pub address: DaemonAddress,
    #[source]
    pub source: io::Error,
}

impl ConnectFailure {
    pub fn new(address: DaemonAddress, source: io::Error) -> Self {
        Self { address, source }
    }
}

/// Opens connections to daemon addresses
#[async_trait]
pub trait Transport: Send + Sync {
    type Connection: Send;

    async fn connect(&self, address: &DaemonAddress) -> Result<Self::Connection, ConnectFailure>;
}

/// Connects over Unix domain sockets and TCP
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketTransport;

#[async_trait]
impl Transport for SocketTransport {
    type Connection = DaemonStream;

    async fn connect(&self, address: &DaemonAddress) -> Result<DaemonStream, ConnectFailure> {
        debug!(%address, "Opening daemon connection");
        let failure = |e| ConnectFailure::new(address.clone(), e);
        match address {
            #[cfg(unix)]
            DaemonAddress::Socket(path) => UnixStream::connect(path)
                .await
                .map(DaemonStream::Unix)
                .map_err(failure),
            #[cfg(not(unix))]
            DaemonAddress::Socket(_) => Err(failure(io::Error::new(
                io::ErrorKind::Unsupported,
                "unix sockets are not available on this platform",
            ))),
            DaemonAddress::Tcp(addr) => TcpStream::connect(addr)
                .await
                .map(DaemonStream::Tcp)
                .map_err(failure),
        }
    }
}

/// Raw stream to a daemon
#[derive(Debug)]
pub enum DaemonStream {
    #[cfg(unix)]
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl AsyncRead for DaemonStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for DaemonStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tcp(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}
