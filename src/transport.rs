//! The byte stream that messages travel over.

use std::{
    io::{self, BufReader, BufWriter, Read, Write},
    net::{TcpStream, ToSocketAddrs},
};

use tracing::debug;

use crate::{connection::ConnectionOptions, wire::HEADER_LEN};

/// A duplex, blocking byte stream to a single server.
///
/// Implementations report failures as plain I/O errors; the caller decides whether to
/// [`reconnect`](Transport::reconnect) and reissue the operation.
pub trait Transport {
    /// Writes one complete message.
    fn send(&mut self, message: &[u8]) -> io::Result<()>;

    /// Reads one complete message, length prefix included.
    fn receive(&mut self) -> io::Result<Vec<u8>>;

    /// Drops the current stream and opens a new one to the same peer.
    fn reconnect(&mut self) -> io::Result<()>;

    /// The `host:port` of the peer, used to give failures context.
    fn address(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: &[u8]) -> io::Result<()> {
        (**self).send(message)
    }

    fn receive(&mut self) -> io::Result<Vec<u8>> {
        (**self).receive()
    }

    fn reconnect(&mut self) -> io::Result<()> {
        (**self).reconnect()
    }

    fn address(&self) -> String {
        (**self).address()
    }
}

/// A [`Transport`] over a blocking TCP socket.
pub struct TcpTransport {
    options: ConnectionOptions,
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl TcpTransport {
    /// Connects to the server named by `options`, applying its socket timeouts.
    pub fn connect(options: ConnectionOptions) -> io::Result<Self> {
        let (reader, writer) = open(&options)?;
        Ok(Self {
            options,
            reader,
            writer,
        })
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }
}

fn open(options: &ConnectionOptions) -> io::Result<(BufReader<TcpStream>, BufWriter<TcpStream>)> {
    let mut last_error = None;
    for addr in (options.host.as_str(), options.port).to_socket_addrs()? {
        let attempt = match options.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                stream.set_read_timeout(options.read_timeout)?;
                stream.set_write_timeout(options.write_timeout)?;
                debug!(%addr, "connected");
                let reader = BufReader::new(stream.try_clone()?);
                return Ok((reader, BufWriter::new(stream)));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} resolved to no addresses", options.address()),
        )
    }))
}

impl Transport for TcpTransport {
    fn send(&mut self, message: &[u8]) -> io::Result<()> {
        self.writer.write_all(message)?;
        self.writer.flush()
    }

    fn receive(&mut self) -> io::Result<Vec<u8>> {
        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf)?;
        let len = i32::from_le_bytes(len_buf);

        if len < HEADER_LEN as i32 || len as usize > self.options.max_message_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("message length {len} is out of bounds"),
            ));
        }

        let mut message = vec![0u8; len as usize];
        message[..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut message[4..])?;
        Ok(message)
    }

    fn reconnect(&mut self) -> io::Result<()> {
        let (reader, writer) = open(&self.options)?;
        self.reader = reader;
        self.writer = writer;
        Ok(())
    }

    fn address(&self) -> String {
        self.options.address()
    }
}
