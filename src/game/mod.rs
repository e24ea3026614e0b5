mod feedback;
mod round;
mod scores;
mod words;

pub use feedback::{classify, letter_count, Feedback, LetterClassification};
pub use round::{InvalidGuessLength, Round, ScoredGuess, MAX_GUESSES};
pub use scores::{Outcome, RoundResult, ScoreBoard};
pub use words::{WordBank, WordSupplier};
