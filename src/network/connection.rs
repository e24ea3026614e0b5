//! A wrapper that turns a TCP stream into a stream of framed messages.
//!
//! ## feature:
//!
//! - Every frame is length-prefixed and checksummed, so a message is never
//!   truncated or merged with the next one.
//! - Automatic disconnection handling: once the remote closes the stream or
//!   sends garbage, the `Conn` stream eventually yields `None`.
//!
//! A background writer task owns the write half. If a ping interval is given,
//! it writes a `Ping` frame whenever it stays idle for that long, which lets
//! the remote tell a slow human from a dead connection.
//!
//! A background reader task owns the read half. The following errors on
//! receiving frames are handed to the writer task, which reports them to the
//! remote socket after the frames already queued, and then closes the
//! connection.
//!
//! - DecodeError: fail to decode payload bytes
//! - MaxDataLengthExceeded: data payload too long
//! - DataCorrupted: checksum does not match
//! - UnknownMessageType: frame type byte does not match
//!
//! Dropping the `Conn` struct closes both sides of the connection immediately,
//! `Conn::close()` first delivers every frame already queued.
use crate::network::utility;
use async_std::channel::{bounded, Receiver, Sender};
use async_std::future;
use async_std::io::BufReader;
use async_std::net::TcpStream;
use async_std::prelude::Stream;
use async_std::task::{self, JoinHandle};
use crc32fast::hash as checksum;
use futures::{AsyncWriteExt, StreamExt};
use log::{trace, warn};
use std::fmt::{Debug, Display, Formatter};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::net::Shutdown;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

const NET_CHANNEL_SIZE: usize = 20;

/// Connection portal.
///
/// The first type parameter is the type of messages sent,
/// the second type parameter is the type of messages received.
pub struct Conn<Msg, Rsp> {
    sender: Option<Sender<MessageType>>,
    receiver: Receiver<Received<Rsp>>,
    tcp: TcpStream,
    writer: Option<JoinHandle<()>>,
    max_data_size: u32,
    _msg: PhantomData<fn(Msg)>,
}

/// wrapper of frames received
pub enum Received<T> {
    /// normal message received
    Response(T),
    /// keep-alive
    Ping,
    /// local socket error
    Error(ConnectionError),
    /// remote socket error: reason for connection close
    RemoteError(ConnectionError),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionError {
    /// Attempting to send or receive over-sized data payload
    MaxDataLengthExceeded,
    /// Cannot decode frame type
    UnknownMessageType,
    /// checksum incorrect
    DataCorrupted,
    /// `TryFrom<Vec<u8>>` returned error
    DecodeError,
    /// Cannot decode error frame
    UnknownError,
    /// the writer is gone, nothing more can be sent
    ConnectionClosed,
}

impl<Msg, Rsp> Conn<Msg, Rsp>
where
    Msg: Into<Vec<u8>>,
    Rsp: TryFrom<Vec<u8>> + Send + 'static,
    <Rsp as TryFrom<Vec<u8>>>::Error: Display,
{
    pub fn init(tcp: TcpStream, ping_interval: Option<Duration>, max_data_size: u32) -> Self {
        let (msg_sender, msg_receiver) = bounded(NET_CHANNEL_SIZE);
        let (rsp_sender, rsp_receiver) = bounded(NET_CHANNEL_SIZE);
        let writer = send_messages(&tcp, msg_receiver, ping_interval, max_data_size);
        retrieve_messages::<Rsp>(&tcp, rsp_sender, msg_sender.clone(), max_data_size);
        Conn {
            sender: Some(msg_sender),
            receiver: rsp_receiver,
            tcp,
            writer: Some(writer),
            max_data_size,
            _msg: PhantomData,
        }
    }
}

impl<Msg, Rsp> Conn<Msg, Rsp>
where
    Msg: Into<Vec<u8>>,
{
    /// Queue one message for the writer task.
    ///
    /// Over-sized payloads are refused here, before anything hits the wire.
    pub async fn send(&self, msg: Msg) -> Result<(), ConnectionError> {
        let payload = msg.into();
        if payload.len() > self.max_data_size as usize {
            return Err(ConnectionError::MaxDataLengthExceeded);
        }
        match &self.sender {
            Some(sender) => sender
                .send(MessageType::Data(payload))
                .await
                .map_err(|_| ConnectionError::ConnectionClosed),
            None => Err(ConnectionError::ConnectionClosed),
        }
    }

    /// Flush all queued frames, then shut the connection down.
    pub async fn close(mut self) {
        drop(self.sender.take());
        // the reader holds the other sender, stop it
        self.receiver.close();
        let _ = self.tcp.shutdown(Shutdown::Read);
        if let Some(writer) = self.writer.take() {
            writer.await;
        }
        let _ = self.tcp.shutdown(Shutdown::Both);
    }
}

impl<Msg, Rsp> Stream for Conn<Msg, Rsp> {
    type Item = Received<Rsp>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

impl<Msg, Rsp> Drop for Conn<Msg, Rsp> {
    fn drop(&mut self) {
        let _ = self.tcp.shutdown(Shutdown::Both);
    }
}

enum MessageType {
    Data(Vec<u8>),
    Ping,
    Error(ConnectionError),
}

// frame types
const DATA: u8 = 0;
const PING: u8 = 100;
const ERROR: u8 = 200;

/// This function takes the ownership of the only instance of `Sender<Rsp>`.
///
/// The reader stops on end of stream, on a bad frame, or when the
/// `Conn` is closed or dropped. Its `Sender<MessageType>` is only used to
/// queue an error frame, and is dropped when the reader stops.
fn retrieve_messages<Rsp>(
    tcp: &TcpStream,
    rsp_sender: Sender<Received<Rsp>>,
    msg_sender: Sender<MessageType>,
    max_data_size: u32,
) where
    Rsp: TryFrom<Vec<u8>> + Send + 'static,
    <Rsp as TryFrom<Vec<u8>>>::Error: Display,
{
    let tcp = tcp.clone();
    let inner = tcp.clone();
    task::spawn(async move {
        let mut reader = BufReader::new(inner);
        loop {
            match read_rsp::<Rsp>(&mut reader, max_data_size).await {
                Ok(Some(rsp)) => {
                    if rsp_sender.send(rsp).await.is_err() {
                        let _ = tcp.shutdown(Shutdown::Read);
                        break;
                    }
                }
                // no more frame to read
                Ok(None) => {
                    let _ = tcp.shutdown(Shutdown::Read);
                    break;
                }
                Err(e) => {
                    // the writer closes the connection once this is written
                    if msg_sender.send(MessageType::Error(e.clone())).await.is_err() {
                        let _ = tcp.shutdown(Shutdown::Both);
                    }
                    let _ = rsp_sender.send(Received::Error(e)).await;
                    break;
                }
            }
        }
    });
}

/// This function takes the ownership of `Receiver<MessageType>`.
///
/// ## Closing Connection:
/// Drop the `Sender<MessageType>` and this function will close the
/// *write* side of TCP connection after writing every queued frame.
///
/// ## Error Handling:
/// On write error, or after writing an error frame, this function closes
/// *both* sides of the connection.
fn send_messages(
    tcp: &TcpStream,
    mut outgoing: Receiver<MessageType>,
    ping_interval: Option<Duration>,
    max_data_size: u32,
) -> JoinHandle<()> {
    let mut tcp = tcp.clone();
    task::spawn(async move {
        loop {
            let next = match ping_interval {
                None => outgoing.next().await,
                Some(interval) => match future::timeout(interval, outgoing.next()).await {
                    Ok(next) => next,
                    // idle for a whole interval
                    Err(_) => Some(MessageType::Ping),
                },
            };
            let msg = match next {
                None => break,
                Some(msg) => msg,
            };
            let is_error = matches!(msg, MessageType::Error(_));
            if let Err(e) = write_msg(&mut tcp, msg, max_data_size).await {
                if e.kind() != ErrorKind::InvalidData {
                    warn!("write failure, closing connection: {}", e);
                    let _ = tcp.shutdown(Shutdown::Both);
                    return;
                }
            }
            if is_error {
                let _ = tcp.shutdown(Shutdown::Both);
                return;
            }
        }
        let _ = tcp.shutdown(Shutdown::Write);
    })
}

/// `Ok(Some)` if read succeed.
/// `Ok(None)` if no more data to read.
///
/// `Err()` if error occurred:
/// - DecodeError: fail to decode payload bytes
/// - MaxDataLengthExceeded: data payload too long
/// - DataCorrupted: checksum does not match
/// - UnknownMessageType: frame type byte does not match
async fn read_rsp<Rsp>(
    reader: &mut BufReader<TcpStream>,
    max_data_size: u32,
) -> Result<Option<Received<Rsp>>, ConnectionError>
where
    Rsp: TryFrom<Vec<u8>>,
    <Rsp as TryFrom<Vec<u8>>>::Error: Display,
{
    let frame_type = match utility::read_one_byte(reader).await {
        None => return Ok(None),
        Some(ft) => ft,
    };
    match frame_type {
        DATA => {
            let size = match utility::read_be_u32(reader).await {
                None => return Ok(None),
                Some(s) => s,
            };
            if size > max_data_size {
                Err(ConnectionError::MaxDataLengthExceeded)?
            }
            let payload = match utility::read_n_bytes(reader, size).await {
                None => return Ok(None),
                Some(p) => p,
            };
            let check_sum = match utility::read_be_u32(reader).await {
                None => return Ok(None),
                Some(s) => s,
            };
            if checksum(&payload) != check_sum {
                return Err(ConnectionError::DataCorrupted);
            }
            match Rsp::try_from(payload) {
                Ok(rsp) => Ok(Some(Received::Response(rsp))),
                Err(e) => {
                    warn!("undecodable frame: {}", e);
                    Err(ConnectionError::DecodeError)
                }
            }
        }
        ERROR => {
            let error_code = match utility::read_one_byte(reader).await {
                None => return Ok(None),
                Some(c) => c,
            };
            Ok(Some(Received::RemoteError(
                ConnectionError::from_error_code(error_code),
            )))
        }
        PING => {
            trace!("ping received");
            Ok(Some(Received::Ping))
        }
        _ => Err(ConnectionError::UnknownMessageType),
    }
}

/// Attempt to write one frame to the TcpStream.
///
/// If payload too large, return `InvalidData`.
async fn write_msg(
    tcp: &mut TcpStream,
    msg: MessageType,
    max_data_size: u32,
) -> std::io::Result<()> {
    match msg {
        MessageType::Data(payload) => {
            let bytes = wrap_data_payload(&payload, max_data_size)?;
            tcp.write_all(&bytes).await
        }
        MessageType::Error(e) => {
            let err_code = [ERROR, e.error_code()];
            tcp.write_all(&err_code).await
        }
        MessageType::Ping => tcp.write_all(&[PING]).await,
    }
}

/// Write data bytes and checksum.
///
/// structure: `[TYPE, SIZE, PAYLOAD, CHECKSUM]`
#[inline]
fn wrap_data_payload(payload: &[u8], max_data_len: u32) -> std::io::Result<Vec<u8>> {
    let size = payload.len();
    if size > max_data_len as usize {
        Err(std::io::Error::from(ErrorKind::InvalidData))?
    }
    // type + payload size + payload + checksum
    let mut dat = Vec::with_capacity(1 + 4 + size + 4);
    dat.push(DATA);
    dat.extend((size as u32).to_be_bytes());
    dat.extend(payload);
    dat.extend(checksum(payload).to_be_bytes());
    Ok(dat)
}

impl ConnectionError {
    fn error_code(&self) -> u8 {
        match self {
            // never sent
            ConnectionError::UnknownError => 100,
            ConnectionError::ConnectionClosed => 101,
            ConnectionError::MaxDataLengthExceeded => 200,
            ConnectionError::UnknownMessageType => 201,
            ConnectionError::DecodeError => 202,
            ConnectionError::DataCorrupted => 203,
        }
    }

    fn from_error_code(code: u8) -> Self {
        match code {
            200 => ConnectionError::MaxDataLengthExceeded,
            201 => ConnectionError::UnknownMessageType,
            202 => ConnectionError::DecodeError,
            203 => ConnectionError::DataCorrupted,
            _ => ConnectionError::UnknownError,
        }
    }
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::MaxDataLengthExceeded => f.write_str("frame too large"),
            ConnectionError::UnknownMessageType => f.write_str("unknown frame type"),
            ConnectionError::DataCorrupted => f.write_str("checksum mismatch"),
            ConnectionError::DecodeError => f.write_str("undecodable payload"),
            ConnectionError::UnknownError => f.write_str("unknown error"),
            ConnectionError::ConnectionClosed => f.write_str("connection closed"),
        }
    }
}

impl<T> Debug for Received<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Received::Response(_) => f.write_str("Received::Response"),
            Received::Ping => f.write_str("Received::Ping"),
            Received::Error(e) => write!(f, "Received::Error({:?})", e),
            Received::RemoteError(e) => write!(f, "Received::RemoteError({:?})", e),
        }
    }
}
