//! Message transports for the dispatcher session.
//!
//! The session only needs a strictly alternating send/receive pair. The
//! stream transport frames every message as one line of JSON. With the `zmq`
//! feature, [`ZmqTransport`] speaks to the simulator's REP socket directly,
//! one JSON document per frame.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{DispatchError, Result};
use crate::protocol::{InboundMessage, OutboundMessage};

pub trait Transport {
    fn send(&mut self, message: &OutboundMessage) -> Result<()>;

    /// Block until the next message arrives.
    fn recv(&mut self) -> Result<InboundMessage>;
}

/// Newline-delimited JSON over any buffered reader and writer.
#[derive(Debug)]
pub struct JsonLinesTransport<R, W> {
    reader: R,
    writer: W,
    line: String,
}

impl<R: BufRead, W: Write> JsonLinesTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: BufRead, W: Write> Transport for JsonLinesTransport<R, W> {
    fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn recv(&mut self) -> Result<InboundMessage> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Err(DispatchError::Disconnected);
            }
            let trimmed = self.line.trim();
            if !trimmed.is_empty() {
                return Ok(serde_json::from_str(trimmed)?);
            }
        }
    }
}

pub type TcpTransport = JsonLinesTransport<BufReader<TcpStream>, BufWriter<TcpStream>>;

impl JsonLinesTransport<BufReader<TcpStream>, BufWriter<TcpStream>> {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        Self::from_stream(TcpStream::connect(addr)?)
    }

    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self::new(reader, BufWriter::new(stream)))
    }
}

/// ZeroMQ REQ socket; the simulator side binds the matching REP socket.
#[cfg(feature = "zmq")]
pub struct ZmqTransport {
    socket: zmq::Socket,
    _context: zmq::Context,
}

#[cfg(feature = "zmq")]
impl ZmqTransport {
    /// Connect to an endpoint such as `tcp://localhost:9001`.
    pub fn connect(endpoint: &str) -> Result<Self> {
        let context = zmq::Context::new();
        let socket = context.socket(zmq::REQ)?;
        socket.connect(endpoint)?;
        Ok(Self {
            socket,
            _context: context,
        })
    }
}

#[cfg(feature = "zmq")]
impl std::fmt::Debug for ZmqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqTransport").finish_non_exhaustive()
    }
}

#[cfg(feature = "zmq")]
impl Transport for ZmqTransport {
    fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        let frame = serde_json::to_vec(message)?;
        self.socket.send(frame, 0)?;
        Ok(())
    }

    fn recv(&mut self) -> Result<InboundMessage> {
        let frame = self.socket.recv_bytes(0)?;
        Ok(serde_json::from_slice(&frame)?)
    }
}

/// Scripted in-process transport: replays inbound messages and records replies.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<InboundMessage>,
    sent: Vec<OutboundMessage>,
}

impl MemoryTransport {
    pub fn new(script: impl IntoIterator<Item = InboundMessage>) -> Self {
        Self {
            inbound: script.into_iter().collect(),
            sent: Vec::new(),
        }
    }

    pub fn push(&mut self, message: InboundMessage) {
        self.inbound.push_back(message);
    }

    pub fn sent(&self) -> &[OutboundMessage] {
        &self.sent
    }

    pub fn remaining(&self) -> usize {
        self.inbound.len()
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        self.sent.push(message.clone());
        Ok(())
    }

    fn recv(&mut self) -> Result<InboundMessage> {
        self.inbound.pop_front().ok_or(DispatchError::Disconnected)
    }
}
