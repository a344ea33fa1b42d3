use std::{
    io::{self, Read as _, Write as _},
    net::{Shutdown, SocketAddr, TcpStream},
    time::Duration,
};

use socket2::SockRef;

use crate::{debug, types::endpoint::Endpoint};

use super::{Transport, MSG_PEEK};

pub struct TcpTransport {
    inner: TcpStream,
    closed: bool,
}

impl TcpTransport {
    pub fn connect(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        debug!("tcp transport connected to {addr}");
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            inner: stream,
            closed: false,
        }
    }

    pub fn peer_endpoint(&self) -> io::Result<Endpoint> {
        let addr = SockRef::from(&self.inner).peer_addr()?;
        Ok(Endpoint::from_source(&addr))
    }

    pub fn local_endpoint(&self) -> io::Result<Endpoint> {
        let addr = SockRef::from(&self.inner).local_addr()?;
        Ok(Endpoint::from_source(&addr))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        }
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, buf: &[u8], _flags: i32, timeout: Option<Duration>) -> io::Result<usize> {
        self.ensure_open()?;
        self.inner.set_write_timeout(timeout)?;
        self.inner.write(buf)
    }

    fn recv(
        &mut self,
        buf: &mut [u8],
        flags: i32,
        timeout: Option<Duration>,
    ) -> io::Result<usize> {
        self.ensure_open()?;
        self.inner.set_read_timeout(timeout)?;
        if flags & MSG_PEEK != 0 {
            self.inner.peek(buf)
        } else {
            self.inner.read(buf)
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.inner.shutdown(Shutdown::Both) {
            Err(err) if err.kind() != io::ErrorKind::NotConnected => Err(err),
            _ => Ok(()),
        }
    }
}
