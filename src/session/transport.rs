use crate::network::{Conn, ConnectionError, Received};
use crate::session::api::{SessionConfig, SessionError};
use crate::session::messages::Message;
use async_std::future;
use async_std::net::TcpStream;
use futures::StreamExt;
use log::{trace, warn};
use std::time::Duration;

/// One message out, one message in, with connection failures folded
/// into `SessionError`.
pub(crate) struct Transport {
    conn: Conn<Message, Message>,
    read_timeout: Option<Duration>,
    peer_address: String,
}

impl Transport {
    pub(crate) fn new(tcp: TcpStream, config: &SessionConfig) -> Self {
        let peer_address = tcp
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown peer".to_string());
        Transport {
            conn: Conn::init(tcp, config.ping_interval(), config.max_frame_size),
            read_timeout: config.read_timeout(),
            peer_address,
        }
    }

    pub(crate) fn peer_address(&self) -> &str {
        &self.peer_address
    }

    pub(crate) async fn send_message(&self, msg: Message) -> Result<(), SessionError> {
        trace!("to {}: {}", self.peer_address, msg);
        self.conn.send(msg).await.map_err(|e| match e {
            ConnectionError::MaxDataLengthExceeded => SessionError::FrameTooLarge,
            _ => SessionError::ConnectionTerminated,
        })
    }

    /// Wait for the next message, skipping keep-alive pings.
    ///
    /// With a read timeout, every ping restarts the clock.
    pub(crate) async fn receive_message(&mut self) -> Result<Message, SessionError> {
        loop {
            let next = match self.read_timeout {
                None => self.conn.next().await,
                Some(limit) => match future::timeout(limit, self.conn.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!("nothing heard from {} for {:?}", self.peer_address, limit);
                        return Err(SessionError::ConnectionTerminated);
                    }
                },
            };
            match next {
                None => return Err(SessionError::ConnectionTerminated),
                Some(Received::Response(msg)) => {
                    trace!("from {}: {}", self.peer_address, msg);
                    return Ok(msg);
                }
                Some(Received::Ping) => {}
                Some(Received::Error(e)) => return Err(local_failure(e)),
                Some(Received::RemoteError(e)) => {
                    return Err(SessionError::ProtocolViolation(format!(
                        "peer rejected our frame: {}",
                        e
                    )))
                }
            }
        }
    }

    /// deliver whatever is still queued, then close
    pub(crate) async fn close(self) {
        self.conn.close().await
    }
}

fn local_failure(e: ConnectionError) -> SessionError {
    match e {
        ConnectionError::MaxDataLengthExceeded => SessionError::FrameTooLarge,
        ConnectionError::DecodeError
        | ConnectionError::DataCorrupted
        | ConnectionError::UnknownMessageType => SessionError::ProtocolViolation(e.to_string()),
        ConnectionError::UnknownError | ConnectionError::ConnectionClosed => {
            SessionError::ConnectionTerminated
        }
    }
}

#[cfg(test)]
mod test_transport {
    use super::*;
    use async_std::net::TcpListener;
    use async_std::task;
    use futures::executor::block_on;
    use futures::join;

    /// (authority side, peer side)
    fn transport_pair(authority: &SessionConfig, peer: &SessionConfig) -> (Transport, Transport) {
        block_on(async {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let address = listener.local_addr().unwrap();
            let (accepted, connected) = join!(listener.accept(), TcpStream::connect(address));
            (
                Transport::new(accepted.unwrap().0, authority),
                Transport::new(connected.unwrap(), peer),
            )
        })
    }

    #[test]
    fn test_alternating_messages() {
        let config = SessionConfig::default();
        let (mut authority, mut peer) = transport_pair(&config, &config);
        block_on(async {
            authority.send_message(Message::YourTurn).await.unwrap();
            assert_eq!(peer.receive_message().await, Ok(Message::YourTurn));
            peer.send_message(Message::WordOffer("crate".to_string()))
                .await
                .unwrap();
            assert_eq!(
                authority.receive_message().await,
                Ok(Message::WordOffer("crate".to_string()))
            );
        });
    }

    #[test]
    fn test_closed_peer() {
        let config = SessionConfig::default();
        let (mut authority, peer) = transport_pair(&config, &config);
        block_on(async {
            peer.send_message(Message::Done).await.unwrap();
            peer.close().await;
            assert_eq!(authority.receive_message().await, Ok(Message::Done));
            assert_eq!(
                authority.receive_message().await,
                Err(SessionError::ConnectionTerminated)
            );
        });
    }

    #[test]
    fn test_oversized_word() {
        let config = SessionConfig {
            max_frame_size: 8,
            ..SessionConfig::default()
        };
        let (authority, _peer) = transport_pair(&config, &config);
        block_on(async {
            assert_eq!(
                authority
                    .send_message(Message::WordOffer("treasure".to_string()))
                    .await,
                Err(SessionError::FrameTooLarge)
            );
        });
    }

    #[test]
    fn test_silent_peer_times_out() {
        let config = SessionConfig {
            read_timeout: 1,
            ping_interval: 0,
            ..SessionConfig::default()
        };
        let (mut authority, _peer) = transport_pair(&config, &config);
        assert_eq!(
            block_on(authority.receive_message()),
            Err(SessionError::ConnectionTerminated)
        );
    }

    #[test]
    fn test_pings_keep_slow_peer_alive() {
        let quiet = SessionConfig {
            read_timeout: 2,
            ping_interval: 0,
            ..SessionConfig::default()
        };
        let pinging = SessionConfig {
            read_timeout: 0,
            ping_interval: 1,
            ..SessionConfig::default()
        };
        let (mut authority, peer) = transport_pair(&quiet, &pinging);
        // answers later than the read timeout, but pings every second meanwhile
        let answer = task::spawn(async move {
            task::sleep(Duration::from_millis(3500)).await;
            peer.send_message(Message::GuessCount(3)).await.unwrap();
            peer
        });
        assert_eq!(
            block_on(authority.receive_message()),
            Ok(Message::GuessCount(3))
        );
        block_on(answer);
    }
}
