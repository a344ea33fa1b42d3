use std::{io, time::Duration};

#[cfg(feature = "tcp")]
pub mod tcp;

/// No flags.
pub const MSG_NONE: i32 = 0;
/// Look at incoming data without consuming it.
pub const MSG_PEEK: i32 = 0x02;

/// Blocking byte stream a [`crate::client::SocketConnection`] writes packets to.
///
/// `timeout` of `None` blocks until the operation completes. A returned error stands
/// for the negative result of a socket call; a successful `send` that reports fewer
/// bytes than requested is treated by callers as a failed send.
pub trait Transport {
    fn send(&mut self, buf: &[u8], flags: i32, timeout: Option<Duration>) -> io::Result<usize>;

    fn recv(&mut self, buf: &mut [u8], flags: i32, timeout: Option<Duration>)
        -> io::Result<usize>;

    fn close(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, buf: &[u8], flags: i32, timeout: Option<Duration>) -> io::Result<usize> {
        (**self).send(buf, flags, timeout)
    }

    fn recv(
        &mut self,
        buf: &mut [u8],
        flags: i32,
        timeout: Option<Duration>,
    ) -> io::Result<usize> {
        (**self).recv(buf, flags, timeout)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
