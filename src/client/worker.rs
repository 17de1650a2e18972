/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Serialized command worker.
//!
//! Callers never touch the socket. Each request becomes a
//! [`PendingOperation`] on a bounded channel; one worker task owns the TCP
//! connection, takes operations in FIFO order, writes the command line,
//! reads exactly one response line, and completes the caller's oneshot. At
//! most one request is on the wire at a time.

use crate::exchange::ExchangeError;
use crate::framing::{Line, read_line};
use crate::protocol::constants::{MAX_LINE_LENGTH, strip_line_ending};
use crate::protocol::{Command, ProtocolError};
use crate::shutdown::ShutdownSignal;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

/// Raw response line, or the failure that prevented reading one.
pub(crate) type OperationResult = Result<String, ExchangeError>;

/// A queued command and the slot its response is delivered to.
#[derive(Debug)]
pub(crate) struct PendingOperation {
    command: Command,
    reply: oneshot::Sender<OperationResult>,
}

impl PendingOperation {
    pub(crate) fn new(command: Command) -> (Self, oneshot::Receiver<OperationResult>) {
        let (reply, rx) = oneshot::channel();
        (Self { command, reply }, rx)
    }
}

/// An established command connection.
struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Writes one command line and reads one response line.
    async fn round_trip(&mut self, line: &str) -> Result<String, ExchangeError> {
        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(line);
        framed.push('\n');
        self.writer.write_all(framed.as_bytes()).await?;

        match read_line(&mut self.reader, MAX_LINE_LENGTH).await? {
            Line::Complete(response) => Ok(strip_line_ending(&response).to_string()),
            Line::TooLong => Err(ProtocolError::LineTooLong(MAX_LINE_LENGTH).into()),
            Line::Eof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "exchange closed the command connection",
            )
            .into()),
        }
    }
}

/// Opens a command connection within `limit`.
pub(crate) async fn connect(addr: SocketAddr, limit: Duration) -> Result<TcpStream, ExchangeError> {
    let stream = timeout(limit, TcpStream::connect(addr))
        .await
        .map_err(|_| ExchangeError::Timeout(limit))??;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Owner of the command connection.
///
/// A transport failure or timeout discards the connection and fails the
/// request in flight; the next request reconnects, or fails fast if the
/// exchange is unreachable.
pub(crate) struct CommandWorker {
    addr: SocketAddr,
    connection: Option<Connection>,
    request_timeout: Duration,
    connect_timeout: Duration,
}

impl CommandWorker {
    pub(crate) fn new(
        addr: SocketAddr,
        stream: TcpStream,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            addr,
            connection: Some(Connection::new(stream)),
            request_timeout,
            connect_timeout,
        }
    }

    /// Spawns the worker loop.
    pub(crate) fn spawn(
        self,
        requests: mpsc::Receiver<PendingOperation>,
        shutdown: ShutdownSignal,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(requests, shutdown))
    }

    async fn run(
        mut self,
        mut requests: mpsc::Receiver<PendingOperation>,
        mut shutdown: ShutdownSignal,
    ) {
        loop {
            let operation = tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                operation = requests.recv() => match operation {
                    Some(operation) => operation,
                    None => break,
                },
            };

            let PendingOperation { command, reply } = operation;
            let result = tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    let _ = reply.send(Err(ExchangeError::Closed));
                    break;
                }
                result = self.execute(&command) => result,
            };

            if reply.send(result).is_err() {
                debug!(command = command.name(), "caller gone before its response arrived");
            }
        }

        // queued operations are dropped here and their callers see Closed
        requests.close();
        debug!(addr = %self.addr, "command worker stopped");
    }

    async fn execute(&mut self, command: &Command) -> OperationResult {
        let line = command.encode();
        let request_timeout = self.request_timeout;

        let mut connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                let stream = connect(self.addr, self.connect_timeout).await?;
                info!(addr = %self.addr, "command connection re-established");
                Connection::new(stream)
            }
        };

        trace!(%line, "sending command");
        match timeout(request_timeout, connection.round_trip(&line)).await {
            Ok(Ok(response)) => {
                trace!(%response, "response received");
                self.connection = Some(connection);
                Ok(response)
            }
            Ok(Err(e)) => {
                warn!(addr = %self.addr, error = %e, "command connection failed");
                Err(e)
            }
            Err(_) => {
                // a late response would answer the next request
                warn!(addr = %self.addr, timeout = ?request_timeout, "command timed out");
                Err(ExchangeError::Timeout(request_timeout))
            }
        }
    }
}
