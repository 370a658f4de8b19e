//! Datagram channel abstraction.
//!
//! The protocol endpoints are written against the [`Channel`] trait rather
//! than a concrete socket: an address-addressed, unordered channel that may
//! drop or corrupt any datagram.  [`UdpChannel`] is the production
//! implementation, a thin wrapper around `tokio::net::UdpSocket` that owns
//! only byte I/O; the fault-injecting decorator used by the test-suite lives
//! in [`crate::faults`].
//!
//! Receive buffers are capped at [`MAX_DATAGRAM`] bytes; longer datagrams
//! are truncated by the OS and then rejected by the packet codec.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::config::MAX_DATAGRAM;

/// An unreliable, unordered datagram channel.
///
/// All methods take `&self` so a channel can be shared across tasks.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Send one datagram to `dest`.  Delivery is not guaranteed.
    async fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<()>;

    /// Receive the next datagram into `buf`, returning the number of bytes
    /// written and the sender's address.  Blocks until a datagram arrives.
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Address this channel is bound to.
    fn local_addr(&self) -> SocketAddr;
}

/// An async UDP socket speaking raw datagrams.
#[derive(Debug)]
pub struct UdpChannel {
    local_addr: SocketAddr,
    inner: UdpSocket,
}

impl UdpChannel {
    /// Bind a new channel to `local_addr`.
    ///
    /// Passing `0.0.0.0:0` lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr) -> io::Result<Self> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }
}

#[async_trait]
impl Channel for UdpChannel {
    async fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<()> {
        debug_assert!(buf.len() <= MAX_DATAGRAM, "datagram exceeds channel MTU");
        self.inner.send_to(buf, dest).await?;
        Ok(())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf).await
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
