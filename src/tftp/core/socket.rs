use std::io;
use std::net::{SocketAddr, UdpSocket};

/// Datagram transport used by transfer sessions
///
/// Implementations are expected to carry their own receive timeout and to
/// report an expired wait as `WouldBlock` or `TimedOut`, the way a
/// [`UdpSocket`] with `set_read_timeout` does.
pub trait Socket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

impl Socket for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf)
    }
}

/// Whether a receive error means "nothing arrived in time"
///
/// Unix reports an expired read timeout as `WouldBlock`, Windows as `TimedOut`.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
