use crate::game::feedback::{classify, letter_count, Feedback};
use anyhow::{Error, Result};
use std::fmt::{Display, Formatter};

/// guesses allowed per round
pub const MAX_GUESSES: u8 = 6;

/// one guess together with its classification
#[derive(Clone, PartialEq, Debug)]
pub struct ScoredGuess {
    pub guess: String,
    pub feedback: Feedback,
}

/// A guess with the wrong number of letters. Recovered locally by asking again.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InvalidGuessLength {
    pub expected: usize,
    pub actual: usize,
}

/// One round of play against a single target word.
///
/// Both sides build a `Round` from the same target.
#[derive(Debug)]
pub struct Round {
    word_length: usize,
    target: String,
    max_guesses: u8,
    guesses_used: u8,
    solved: bool,
    history: Vec<ScoredGuess>,
}

impl Round {
    pub fn new(target: String) -> Result<Self> {
        let word_length = letter_count(&target);
        if word_length == 0 {
            return Err(Error::msg("target word must not be empty"));
        }
        Ok(Round {
            word_length,
            target,
            max_guesses: MAX_GUESSES,
            guesses_used: 0,
            solved: false,
            history: Vec::with_capacity(MAX_GUESSES as usize),
        })
    }

    pub fn word_length(&self) -> usize {
        self.word_length
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn max_guesses(&self) -> u8 {
        self.max_guesses
    }

    pub fn guesses_used(&self) -> u8 {
        self.guesses_used
    }

    pub fn history(&self) -> &[ScoredGuess] {
        &self.history
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn is_over(&self) -> bool {
        self.solved || self.guesses_used >= self.max_guesses
    }

    /// Classify a guess and charge it against the round.
    ///
    /// A guess of the wrong length is rejected without being charged.
    /// Once the round `is_over()` nothing is charged any more, and the
    /// last feedback is returned again.
    pub fn guess(&mut self, guess: &str) -> Result<(Feedback, bool), InvalidGuessLength> {
        if self.is_over() {
            let last = self
                .history
                .last()
                .map(|scored| scored.feedback.clone())
                .unwrap_or_default();
            return Ok((last, self.solved));
        }
        let actual = letter_count(guess);
        if actual != self.word_length {
            return Err(InvalidGuessLength {
                expected: self.word_length,
                actual,
            });
        }
        let (feedback, won) = classify(guess, &self.target);
        self.guesses_used += 1;
        self.solved = won;
        self.history.push(ScoredGuess {
            guess: guess.to_string(),
            feedback: feedback.clone(),
        });
        Ok((feedback, won))
    }

    /// Guesses charged for scoring. An unsolved round costs `max_guesses`.
    pub fn score(&self) -> u8 {
        if self.solved {
            self.guesses_used
        } else {
            self.max_guesses
        }
    }
}

impl Display for InvalidGuessLength {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "guess has {} letters, expected {}",
            self.actual, self.expected
        )
    }
}

impl std::error::Error for InvalidGuessLength {}

#[cfg(test)]
mod test_round {
    use super::*;

    #[test]
    fn test_solved_round() {
        let mut round = Round::new("crate".to_string()).unwrap();
        assert_eq!(round.word_length(), 5);
        assert!(!round.guess("trace").unwrap().1);
        assert!(round.guess("crate").unwrap().1);
        assert!(round.is_solved());
        assert!(round.is_over());
        assert_eq!(round.score(), 2);
        assert_eq!(round.history().len(), 2);
        assert_eq!(round.history()[0].guess, "trace");
    }

    #[test]
    fn test_wrong_length_is_not_charged() {
        let mut round = Round::new("crate".to_string()).unwrap();
        assert_eq!(
            round.guess("cat"),
            Err(InvalidGuessLength {
                expected: 5,
                actual: 3
            })
        );
        assert!(round.guess("crates").is_err());
        assert_eq!(round.guesses_used(), 0);
        assert!(round.history().is_empty());
    }

    #[test]
    fn test_exhausted_round() {
        let mut round = Round::new("audio".to_string()).unwrap();
        while !round.is_over() {
            round.guess("radio").unwrap();
        }
        assert_eq!(round.guesses_used(), MAX_GUESSES);
        assert!(!round.is_solved());
        assert_eq!(round.score(), MAX_GUESSES);
    }

    #[test]
    fn test_no_guess_after_round_is_over() {
        let mut round = Round::new("audio".to_string()).unwrap();
        for _ in 0..MAX_GUESSES + 2 {
            round.guess("radio").unwrap();
        }
        assert_eq!(round.guesses_used(), MAX_GUESSES);
        assert_eq!(round.history().len(), MAX_GUESSES as usize);
        // a solved round stays solved
        let mut round = Round::new("audio".to_string()).unwrap();
        round.guess("audio").unwrap();
        let (feedback, won) = round.guess("radio").unwrap();
        assert!(won);
        assert!(feedback.is_solved());
        assert_eq!(round.guesses_used(), 1);
        assert_eq!(round.history()[0].guess, "audio");
    }

    #[test]
    fn test_solved_on_last_guess() {
        let mut round = Round::new("audio".to_string()).unwrap();
        for _ in 1..MAX_GUESSES {
            round.guess("radio").unwrap();
        }
        assert!(round.guess("audio").unwrap().1);
        assert_eq!(round.score(), MAX_GUESSES);
    }

    #[test]
    fn test_empty_target() {
        assert!(Round::new(String::new()).is_err());
    }
}
