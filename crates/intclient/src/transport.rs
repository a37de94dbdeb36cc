//! TCP transport to the integration server.
//!
//! Every request travels on its own connection; the server closes the
//! connection after answering.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use intcalc_protocol::{ResponseFrame, receive_response};

use crate::errors::CommunicationError;
use crate::session::{SessionError, Transport};

pub(crate) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

const SERVER_HOST: &str = "localhost";

/// Connects to the server on `localhost`.
#[derive(Debug, Clone, Copy)]
pub struct TcpTransport {
    port: u16,
}

impl TcpTransport {
    /// Targets `localhost:port`.
    #[must_use]
    pub const fn new(port: u16) -> Self {
        Self { port }
    }

    fn connect(&self) -> Result<TcpStream, SessionError> {
        let connect_error = |source| SessionError::Connect {
            port: self.port,
            source,
        };
        let addresses = (SERVER_HOST, self.port)
            .to_socket_addrs()
            .map_err(connect_error)?;
        let mut last_error =
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses");
        for address in addresses {
            match connect_to(&address) {
                Ok(stream) => return Ok(stream),
                Err(error) => last_error = error,
            }
        }
        Err(connect_error(last_error))
    }
}

fn connect_to(address: &SocketAddr) -> io::Result<TcpStream> {
    TcpStream::connect_timeout(address, CONNECTION_TIMEOUT)
}

impl Transport for TcpTransport {
    fn round_trip(&mut self, request: &str) -> Result<ResponseFrame, SessionError> {
        let mut stream = self.connect()?;
        stream
            .write_all(request.as_bytes())
            .and_then(|()| stream.flush())
            .map_err(CommunicationError::Send)?;
        let frame = receive_response(&mut stream).map_err(CommunicationError::Receive)?;
        Ok(frame)
    }
}
