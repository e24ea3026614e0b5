use anyhow::{Error, Result};
use std::fmt::{Display, Formatter};

/// result of one round, from the point of view of the whole session
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    AuthorityWin,
    PeerWin,
    Tie,
}

/// Guess counts of both sides and who won with them. Fewer guesses wins.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RoundResult {
    pub authority_guesses: u8,
    pub peer_guesses: u8,
    pub outcome: Outcome,
}

impl RoundResult {
    pub fn decide(authority_guesses: u8, peer_guesses: u8) -> Self {
        let outcome = if authority_guesses < peer_guesses {
            Outcome::AuthorityWin
        } else if peer_guesses < authority_guesses {
            Outcome::PeerWin
        } else {
            Outcome::Tie
        };
        RoundResult {
            authority_guesses,
            peer_guesses,
            outcome,
        }
    }
}

/// Running totals of a session.
///
/// Only ever grows: every recorded round adds one to exactly one of
/// `authority_score`, `peer_score` or `ties`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ScoreBoard {
    authority_score: u32,
    peer_score: u32,
    ties: u32,
    rounds_played: u32,
}

impl ScoreBoard {
    pub fn new() -> Self {
        ScoreBoard::default()
    }

    pub fn authority_score(&self) -> u32 {
        self.authority_score
    }

    pub fn peer_score(&self) -> u32 {
        self.peer_score
    }

    pub fn ties(&self) -> u32 {
        self.ties
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    /// decide a round and add it to the totals
    pub fn record_round(&mut self, authority_guesses: u8, peer_guesses: u8) -> RoundResult {
        let result = RoundResult::decide(authority_guesses, peer_guesses);
        self.record(&result);
        result
    }

    pub fn record(&mut self, result: &RoundResult) {
        match result.outcome {
            Outcome::AuthorityWin => self.authority_score += 1,
            Outcome::PeerWin => self.peer_score += 1,
            Outcome::Tie => self.ties += 1,
        }
        self.rounds_played += 1;
    }

    /// Follow the totals broadcast by the authority.
    ///
    /// The broadcast totals must be exactly this board plus `result`,
    /// otherwise the two sides disagree about the session and nothing changes.
    pub fn mirror(
        &mut self,
        result: &RoundResult,
        authority_score: u32,
        peer_score: u32,
    ) -> Result<()> {
        let mut next = *self;
        next.record(result);
        if next.authority_score != authority_score || next.peer_score != peer_score {
            return Err(Error::msg(format!(
                "broadcast score {}:{} does not follow {}:{} after {}",
                authority_score, peer_score, self.authority_score, self.peer_score, result.outcome
            )));
        }
        *self = next;
        Ok(())
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::AuthorityWin => f.write_str("authority wins"),
            Outcome::PeerWin => f.write_str("peer wins"),
            Outcome::Tie => f.write_str("tie"),
        }
    }
}

#[cfg(test)]
mod test_scores {
    use super::*;

    #[test]
    fn test_fewer_guesses_win() {
        let mut board = ScoreBoard::new();
        let result = board.record_round(3, 5);
        assert_eq!(result.outcome, Outcome::AuthorityWin);
        assert_eq!(board.authority_score(), 1);
        assert_eq!(board.peer_score(), 0);

        let result = board.record_round(4, 2);
        assert_eq!(result.outcome, Outcome::PeerWin);
        assert_eq!(board.peer_score(), 1);
    }

    #[test]
    fn test_both_unsolved_is_tie() {
        let mut board = ScoreBoard::new();
        let result = board.record_round(6, 6);
        assert_eq!(result.outcome, Outcome::Tie);
        assert_eq!(board.authority_score(), 0);
        assert_eq!(board.peer_score(), 0);
        assert_eq!(board.ties(), 1);
    }

    #[test]
    fn test_every_round_counted_once() {
        let mut board = ScoreBoard::new();
        let rounds = [(1, 2), (2, 1), (3, 3), (6, 6), (5, 4), (1, 6), (4, 4)];
        for (a, p) in rounds {
            board.record_round(a, p);
            assert_eq!(
                board.authority_score() + board.peer_score() + board.ties(),
                board.rounds_played()
            );
        }
        assert_eq!(board.rounds_played(), rounds.len() as u32);
        assert_eq!(
            (board.authority_score(), board.peer_score(), board.ties()),
            (2, 2, 3)
        );
    }

    #[test]
    fn test_mirror() {
        let mut authority = ScoreBoard::new();
        let mut peer = ScoreBoard::new();
        for (a, p) in [(2, 4), (5, 3), (6, 6)] {
            let result = authority.record_round(a, p);
            peer.mirror(&result, authority.authority_score(), authority.peer_score())
                .unwrap();
        }
        assert_eq!(authority, peer);
    }

    #[test]
    fn test_mirror_rejects_inconsistent_totals() {
        let mut peer = ScoreBoard::new();
        let result = RoundResult::decide(2, 4);
        assert!(peer.mirror(&result, 0, 1).is_err());
        assert!(peer.mirror(&result, 3, 0).is_err());
        assert_eq!(peer, ScoreBoard::new());
        peer.mirror(&result, 1, 0).unwrap();
        assert_eq!(peer.rounds_played(), 1);
    }
}
