use crate::game::{RoundResult, ScoreBoard, ScoredGuess};
use anyhow::Result;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Which end of the connection this session is.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    /// accepted the connection, decides who hosts each round
    Authority,
    /// connected to the authority, follows its lead
    Peer,
}

/// What a side does in a round.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    /// supplies the secret word
    Host,
    /// plays the other side's word
    Guesser,
}

impl Role {
    /// Hosting alternates by round parity, the authority hosts even rounds.
    pub fn for_round(side: Side, round: u32) -> Role {
        let authority_hosts = round % 2 == 0;
        match (side, authority_hosts) {
            (Side::Authority, true) | (Side::Peer, false) => Role::Host,
            _ => Role::Guesser,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    AwaitingRole,
    Playing,
    ExchangingResult,
    AwaitingContinue,
    Terminated,
}

/// Everything that ends a session early.
#[derive(Clone, PartialEq, Debug)]
pub enum SessionError {
    /// peer closed the stream, socket fault, or nothing heard within the read timeout
    ConnectionTerminated,
    /// malformed or unexpected message
    ProtocolViolation(String),
    /// a frame above the configured size bound
    FrameTooLarge,
    /// no word could be supplied for any length the local player asked for
    WordLengthUnavailable { length: usize, attempts: u32 },
    /// the local player could not answer a prompt
    LocalInput(String),
}

/// 0 means no timeout.
///
/// By default no read timeout, a keep-alive ping every 5 seconds.
#[derive(Clone, PartialEq, Debug)]
pub struct SessionConfig {
    /// seconds without any frame before the peer is considered gone
    pub read_timeout: u64,
    /// seconds of writer idleness before a ping is sent
    pub ping_interval: u64,
    /// upper bound of a frame payload, in bytes
    pub max_frame_size: u32,
    /// how many more lengths the host may try after the first one
    pub max_word_length_retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            read_timeout: 0,
            ping_interval: 5,
            max_frame_size: 1024,
            max_word_length_retries: 5,
        }
    }
}

impl SessionConfig {
    pub(crate) fn read_timeout(&self) -> Option<Duration> {
        seconds(self.read_timeout)
    }

    pub(crate) fn ping_interval(&self) -> Option<Duration> {
        seconds(self.ping_interval)
    }
}

fn seconds(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

/// Things the local player is told about, in the order they happen.
#[derive(Debug)]
pub enum Notice<'a> {
    RoundStarted {
        round: u32,
        role: Role,
        word_length: usize,
    },
    GuessRejected {
        expected: usize,
        actual: usize,
    },
    WordLengthUnavailable {
        length: usize,
    },
    /// the round ended without the word being found
    WordRevealed(&'a str),
    WaitingForPeer,
    RoundFinished {
        result: &'a RoundResult,
        scores: &'a ScoreBoard,
    },
    PeerDeclined,
    PeerLeft,
    SessionAborted(&'a SessionError),
}

/// The human (or script) on this side of the connection.
///
/// All calls are synchronous, the session waits for every answer.
pub trait LocalPlayer {
    /// Next guess. Length is checked by the session, wrong lengths are
    /// reported with `Notice::GuessRejected` and asked again.
    fn prompt_guess(&mut self, length: usize) -> Result<String>;

    /// length of the word to host
    fn prompt_word_length(&mut self) -> Result<usize>;

    fn prompt_yes_no(&mut self, question: &str) -> Result<bool>;

    /// every guess of the current round so far, oldest first
    fn render_feedback(&mut self, guesses: &[ScoredGuess]);

    fn notify(&mut self, notice: Notice<'_>);
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::ConnectionTerminated => f.write_str("connection terminated"),
            SessionError::ProtocolViolation(reason) => write!(f, "protocol violation: {}", reason),
            SessionError::FrameTooLarge => f.write_str("frame too large"),
            SessionError::WordLengthUnavailable { length, attempts } => write!(
                f,
                "no word available (last length tried {}, {} attempts)",
                length, attempts
            ),
            SessionError::LocalInput(reason) => write!(f, "local input failed: {}", reason),
        }
    }
}

impl std::error::Error for SessionError {}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Authority => f.write_str("authority"),
            Side::Peer => f.write_str("peer"),
        }
    }
}

#[cfg(test)]
mod test_api {
    use super::*;

    #[test]
    fn test_exactly_one_host_per_round() {
        for round in 1..=10 {
            let authority = Role::for_round(Side::Authority, round);
            let peer = Role::for_round(Side::Peer, round);
            assert_ne!(authority, peer);
            assert_eq!(authority == Role::Host, round % 2 == 0);
        }
    }

    #[test]
    fn test_zero_disables_timeouts() {
        let config = SessionConfig {
            read_timeout: 0,
            ping_interval: 3,
            ..SessionConfig::default()
        };
        assert_eq!(config.read_timeout(), None);
        assert_eq!(config.ping_interval(), Some(Duration::from_secs(3)));
    }
}
