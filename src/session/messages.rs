//! Wire vocabulary of a session.
//!
//! Every frame payload is one plain UTF-8 text message:
//!
//! - `your turn`: the authority tells the peer to host this round
//! - `<length>:<word>`: a word offer
//! - `<integer>`: guesses used after local play
//! - `<outcome>:<authority guesses>:<peer guesses>:<authority score>:<peer score>`
//! - `continuing` / `done`
use crate::game::{letter_count, Outcome, RoundResult, MAX_GUESSES};
use anyhow::{Error, Result};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const YOUR_TURN: &str = "your turn";
const CONTINUING: &str = "continuing";
const DONE: &str = "done";
const AUTHORITY_WIN: &str = "SERVER WIN";
const PEER_WIN: &str = "CLIENT WIN";
const TIE: &str = "TIE";

#[derive(Clone, PartialEq, Debug)]
pub enum Message {
    /// the receiver hosts this round
    YourTurn,
    /// secret word of the round, sent by the host
    WordOffer(String),
    /// guesses the sender needed (or `MAX_GUESSES` if unsolved)
    GuessCount(u8),
    /// result broadcast by the authority, with the new totals
    RoundResult {
        result: RoundResult,
        authority_score: u32,
        peer_score: u32,
    },
    Continuing,
    Done,
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::YourTurn => f.write_str(YOUR_TURN),
            Message::WordOffer(word) => write!(f, "{}:{}", letter_count(word), word),
            Message::GuessCount(n) => write!(f, "{}", n),
            Message::RoundResult {
                result,
                authority_score,
                peer_score,
            } => write!(
                f,
                "{}:{}:{}:{}:{}",
                outcome_token(result.outcome),
                result.authority_guesses,
                result.peer_guesses,
                authority_score,
                peer_score
            ),
            Message::Continuing => f.write_str(CONTINUING),
            Message::Done => f.write_str(DONE),
        }
    }
}

impl FromStr for Message {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        match text {
            YOUR_TURN => return Ok(Message::YourTurn),
            CONTINUING => return Ok(Message::Continuing),
            DONE => return Ok(Message::Done),
            _ => {}
        }
        let fields: Vec<&str> = text.split(':').collect();
        match fields.as_slice() {
            [count] => Ok(Message::GuessCount(parse_guesses(count)?)),
            [length, word] => {
                let length: usize = length
                    .parse()
                    .map_err(|_| Error::msg(format!("non-numeric word length in {:?}", text)))?;
                if !is_wire_word(word) {
                    return Err(Error::msg(format!("bad word in offer {:?}", text)));
                }
                if letter_count(word) != length {
                    return Err(Error::msg(format!(
                        "word offer {:?} does not have {} letters",
                        text, length
                    )));
                }
                Ok(Message::WordOffer(word.to_string()))
            }
            [outcome, authority_guesses, peer_guesses, authority_score, peer_score] => {
                let outcome = parse_outcome(outcome)?;
                let result =
                    RoundResult::decide(parse_guesses(authority_guesses)?, parse_guesses(peer_guesses)?);
                if result.outcome != outcome {
                    return Err(Error::msg(format!(
                        "outcome does not match guesses in {:?}",
                        text
                    )));
                }
                Ok(Message::RoundResult {
                    result,
                    authority_score: parse_score(authority_score)?,
                    peer_score: parse_score(peer_score)?,
                })
            }
            _ => Err(Error::msg(format!("unknown message {:?}", text))),
        }
    }
}

impl From<Message> for Vec<u8> {
    fn from(msg: Message) -> Self {
        msg.to_string().into_bytes()
    }
}

impl TryFrom<Vec<u8>> for Message {
    type Error = Error;

    fn try_from(value: Vec<u8>) -> Result<Self> {
        let text =
            String::from_utf8(value).map_err(|_| Error::msg("message is not valid utf-8"))?;
        text.parse()
    }
}

/// Words that can travel in a word offer: non-empty, alphabetic, no uppercase.
pub(crate) fn is_wire_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_alphabetic() && !c.is_uppercase())
}

fn outcome_token(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::AuthorityWin => AUTHORITY_WIN,
        Outcome::PeerWin => PEER_WIN,
        Outcome::Tie => TIE,
    }
}

fn parse_outcome(token: &str) -> Result<Outcome> {
    match token {
        AUTHORITY_WIN => Ok(Outcome::AuthorityWin),
        PEER_WIN => Ok(Outcome::PeerWin),
        TIE => Ok(Outcome::Tie),
        _ => Err(Error::msg(format!("unknown outcome {:?}", token))),
    }
}

fn parse_guesses(field: &str) -> Result<u8> {
    match field.parse::<u8>() {
        Ok(n) if (1..=MAX_GUESSES).contains(&n) => Ok(n),
        _ => Err(Error::msg(format!("bad guess count {:?}", field))),
    }
}

fn parse_score(field: &str) -> Result<u32> {
    field
        .parse()
        .map_err(|_| Error::msg(format!("bad score {:?}", field)))
}

#[cfg(test)]
mod test_encode_decode {
    use super::*;

    fn assert_msg_eq(msg: Message) {
        let decoded = Message::try_from(Vec::<u8>::from(msg.clone())).unwrap();
        assert_eq!(msg, decoded)
    }

    fn decode(text: &str) -> Result<Message> {
        Message::try_from(text.as_bytes().to_vec())
    }

    #[test]
    fn test_wire_text() {
        assert_eq!(Message::YourTurn.to_string(), "your turn");
        assert_eq!(Message::WordOffer("crate".to_string()).to_string(), "5:crate");
        assert_eq!(Message::GuessCount(4).to_string(), "4");
        assert_eq!(Message::Continuing.to_string(), "continuing");
        assert_eq!(Message::Done.to_string(), "done");
        let msg = Message::RoundResult {
            result: RoundResult::decide(3, 5),
            authority_score: 1,
            peer_score: 0,
        };
        assert_eq!(msg.to_string(), "SERVER WIN:3:5:1:0");
    }

    #[test]
    fn test_messages() {
        assert_msg_eq(Message::YourTurn);
        assert_msg_eq(Message::WordOffer("audio".to_string()));
        assert_msg_eq(Message::WordOffer("café".to_string()));
        assert_msg_eq(Message::GuessCount(6));
        assert_msg_eq(Message::Continuing);
        assert_msg_eq(Message::Done);
        for (a, p, authority_score, peer_score) in [(3, 5, 1, 0), (5, 3, 2, 7), (6, 6, 0, 0)] {
            assert_msg_eq(Message::RoundResult {
                result: RoundResult::decide(a, p),
                authority_score,
                peer_score,
            });
        }
    }

    #[test]
    fn test_result_fields() {
        match decode("CLIENT WIN:6:2:4:3").unwrap() {
            Message::RoundResult {
                result,
                authority_score,
                peer_score,
            } => {
                assert_eq!(result.outcome, Outcome::PeerWin);
                assert_eq!(result.authority_guesses, 6);
                assert_eq!(result.peer_guesses, 2);
                assert_eq!((authority_score, peer_score), (4, 3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_malformed() {
        for text in [
            "",
            "your turn!",
            "x:crate",
            "4:crate",
            "5:",
            "5:cr4te",
            "5:Crate",
            "5:x-ray",
            "0",
            "7",
            "-1",
            "TIE:3:5:0:0",
            "DRAW:3:3:0:0",
            "SERVER WIN:3:5:1",
            "SERVER WIN:3:5:1:x",
            "a:b:c",
        ] {
            assert!(decode(text).is_err(), "{:?} should not decode", text);
        }
        assert!(Message::try_from(vec![0xff, 0xfe]).is_err());
    }
}
