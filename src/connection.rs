//! A serialized request/reply channel over a [`Transport`].

use std::{
    fmt,
    sync::{
        atomic::{AtomicI32, Ordering},
        Mutex,
        MutexGuard,
        PoisonError,
    },
    time::Duration,
};

use tracing::debug;

use crate::{
    de::{DecoderOptions, DEFAULT_CHUNK_SIZE},
    error::{Error, ErrorKind, Result},
    ser::{Encoder, EncoderOptions, DEFAULT_MAX_DOCUMENT_SIZE},
    transport::{TcpTransport, Transport},
    wire::{encode_message, Query, Reply, Request, DEFAULT_MAX_MESSAGE_SIZE},
    Bson,
    Document,
};

/// Server error codes that report a unique index violation.
const DUPLICATE_KEY_CODES: [i32; 2] = [11000, 11001];

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Server host name or address (default: localhost)
    pub host: String,
    /// Server port (default: 27017)
    pub port: u16,
    /// Connect timeout (default: 10s)
    pub connect_timeout: Option<Duration>,
    /// Socket read timeout; a blocking receive is otherwise not interruptible (default: none)
    pub read_timeout: Option<Duration>,
    /// Socket write timeout (default: none)
    pub write_timeout: Option<Duration>,
    /// Largest document accepted for encoding (default: 16 MiB)
    pub max_document_size: usize,
    /// Largest message sent or received, header included (default: 48 MB)
    pub max_message_size: usize,
    /// Internal buffer size for string decoding (default: 128 bytes)
    pub chunk_size: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 27017,
            connect_timeout: Some(Duration::from_secs(10)),
            read_timeout: None,
            write_timeout: None,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ConnectionOptions {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn max_document_size(mut self, size: usize) -> Self {
        self.max_document_size = size;
        self
    }

    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn encoder(&self) -> Encoder {
        Encoder::new(EncoderOptions::default().max_document_size(self.max_document_size))
    }

    fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions::default().chunk_size(self.chunk_size)
    }
}

/// A connection to one server.
///
/// The protocol has no multiplexing, so every send and its optional receive happen under a single
/// lock. A connection can be shared between threads; cursors borrow it.
pub struct Connection<T> {
    transport: Mutex<T>,
    next_request_id: AtomicI32,
    options: ConnectionOptions,
    encoder: Encoder,
}

impl<T> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.options.address())
            .field("next_request_id", &self.next_request_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Connection<TcpTransport> {
    /// Opens a TCP connection to the server named by `options`.
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let transport = TcpTransport::connect(options.clone())
            .map_err(|e| Error::communication_failure(options.address(), e))?;
        Ok(Self::new(transport, options))
    }
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T, options: ConnectionOptions) -> Self {
        let encoder = options.encoder();
        Self {
            transport: Mutex::new(transport),
            next_request_id: AtomicI32::new(1),
            options,
            encoder,
        }
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Reopens the underlying stream after a communication failure. Server-side cursors opened
    /// before the failure are gone.
    pub fn reconnect(&self) -> Result<()> {
        let mut transport = self.lock();
        transport
            .reconnect()
            .map_err(|e| Error::communication_failure(transport.address(), e))
    }

    /// Sends a one-way message such as an insert, update, delete or kill cursors.
    ///
    /// Queries and get-mores are answered by the server and must go through
    /// [`exchange`](Self::exchange) instead; sending one here fails with
    /// [`ErrorKind::ProtocolViolation`] so that its reply cannot desynchronize the stream.
    pub fn send<R: Request + ?Sized>(&self, request: &R) -> Result<()> {
        if request.op_code().expects_reply() {
            return Err(Error::protocol_violation(format!(
                "{:?} expects a reply",
                request.op_code()
            )));
        }
        let mut transport = self.lock();
        let (request_id, message) = self.encode(request)?;
        self.write(&mut *transport, request_id, &message)
    }

    /// Sends a query or get-more and waits for its reply.
    ///
    /// The reply's structure is validated; failure flags are left for the caller to
    /// [`check`](Reply::check).
    pub fn exchange<R: Request + ?Sized>(&self, request: &R) -> Result<Reply> {
        if !request.op_code().expects_reply() {
            return Err(Error::protocol_violation(format!(
                "{:?} is never answered",
                request.op_code()
            )));
        }
        let mut transport = self.lock();
        let (request_id, message) = self.encode(request)?;
        self.write(&mut *transport, request_id, &message)?;
        self.read(&mut *transport, request_id)
    }

    /// Runs `command` against `database` and returns the server's response document.
    ///
    /// A response whose `ok` field is not truthy fails with [`ErrorKind::Server`].
    pub fn run_command(&self, database: &str, command: Document) -> Result<Document> {
        let mut query = Query::new(format!("{database}.$cmd"), command);
        query.number_to_return = -1;

        let reply = self.exchange(&query)?.check(0)?;
        let response = first_document(reply)?;
        if !is_truthy(response.get("ok")) {
            let message = response
                .get("errmsg")
                .and_then(Bson::as_str)
                .unwrap_or("command failed")
                .to_string();
            let code = response.get("code").and_then(crate::wire::server_code);
            return Err(ErrorKind::Server { code, message }.into());
        }
        Ok(response)
    }

    /// Sends a mutation followed by `{getlasterror: 1}` on `database`, under one lock so that no
    /// other caller's message lands in between.
    ///
    /// Returns the getlasterror response. A reported error fails with
    /// [`ErrorKind::DuplicateKey`] for unique index violations and [`ErrorKind::Server`]
    /// otherwise.
    pub fn send_checked<R: Request + ?Sized>(&self, request: &R, database: &str) -> Result<Document> {
        if request.op_code().expects_reply() {
            return Err(Error::protocol_violation(format!(
                "{:?} expects a reply",
                request.op_code()
            )));
        }
        let mut check = Query::new(format!("{database}.$cmd"), doc! { "getlasterror": 1 });
        check.number_to_return = -1;

        let reply = {
            let mut transport = self.lock();
            let (request_id, message) = self.encode(request)?;
            let (check_id, check_message) = self.encode(&check)?;
            self.write(&mut *transport, request_id, &message)?;
            self.write(&mut *transport, check_id, &check_message)?;
            self.read(&mut *transport, check_id)?
        };

        let response = first_document(reply.check(0)?)?;
        match response.get("err") {
            None | Some(Bson::Null) => Ok(response),
            Some(err) => {
                let message = match err {
                    Bson::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let code = response.get("code").and_then(crate::wire::server_code);
                match code {
                    Some(code) if DUPLICATE_KEY_CODES.contains(&code) => {
                        Err(ErrorKind::DuplicateKey { key: message }.into())
                    }
                    _ => Err(ErrorKind::Server { code, message }.into()),
                }
            }
        }
    }

    /// Assigns the next request id and encodes `request`. Callers hold the transport lock, so ids
    /// reach the wire in increasing order.
    fn encode<R: Request + ?Sized>(&self, request: &R) -> Result<(i32, Vec<u8>)> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let message = encode_message(
            request,
            request_id,
            &self.encoder,
            self.options.max_message_size,
        )?;
        debug!(
            request_id,
            op_code = ?request.op_code(),
            length = message.len(),
            "sending message"
        );
        Ok((request_id, message))
    }

    fn write(&self, transport: &mut T, request_id: i32, message: &[u8]) -> Result<()> {
        transport.send(message).map_err(|e| {
            debug!(request_id, error = %e, "send failed");
            Error::communication_failure(transport.address(), e)
        })
    }

    fn read(&self, transport: &mut T, request_id: i32) -> Result<Reply> {
        let bytes = transport.receive().map_err(|e| {
            debug!(request_id, error = %e, "receive failed");
            Error::communication_failure(transport.address(), e)
        })?;
        let reply = Reply::decode(&bytes, request_id, self.options.decoder_options())?;
        debug!(
            request_id,
            cursor_id = reply.cursor_id,
            number_returned = reply.number_returned(),
            flags = ?reply.response_flags,
            "received reply"
        );
        Ok(reply)
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        // the transport holds no invariants a panicking holder could break
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn first_document(reply: Reply) -> Result<Document> {
    reply
        .documents
        .into_iter()
        .next()
        .ok_or_else(|| Error::protocol_violation("command reply carried no document"))
}

fn is_truthy(value: Option<&Bson>) -> bool {
    match value {
        Some(Bson::Boolean(b)) => *b,
        Some(Bson::Double(v)) => *v != 0.0,
        Some(Bson::Int32(v)) => *v != 0,
        Some(Bson::Int64(v)) => *v != 0,
        _ => false,
    }
}
