//! Terminal front end of a session.
use crate::game::{LetterClassification, ScoredGuess};
use crate::session::{LocalPlayer, Notice, Role, SessionError, Side};
use anyhow::{Error, Result};
use crossterm::style::Stylize;
use log::warn;
use std::fmt::Display;
use std::io::{stdin, stdout, BufRead, StdinLock, Stdout, Write};
use unicode_segmentation::UnicodeSegmentation;

/// A human at a terminal, reading answers line by line.
pub struct ConsolePlayer<R = StdinLock<'static>, O = Stdout> {
    side: Side,
    input: R,
    output: O,
}

impl ConsolePlayer {
    pub fn new(side: Side) -> Self {
        ConsolePlayer::with_io(side, stdin().lock(), stdout())
    }
}

impl<R: BufRead, O: Write> ConsolePlayer<R, O> {
    pub fn with_io(side: Side, input: R, output: O) -> Self {
        ConsolePlayer {
            side,
            input,
            output,
        }
    }

    fn show(&mut self, text: impl Display) {
        if let Err(e) = writeln!(self.output, "{}", text) {
            warn!("cannot write to console: {}", e);
        }
    }

    /// print `prompt` and read one trimmed line
    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::msg("input closed"));
        }
        Ok(line.trim().to_string())
    }

    /// (own score, opponent score)
    fn own_view(&self, authority_score: u32, peer_score: u32) -> (u32, u32) {
        match self.side {
            Side::Authority => (authority_score, peer_score),
            Side::Peer => (peer_score, authority_score),
        }
    }

    fn own_guesses(&self, authority_guesses: u8, peer_guesses: u8) -> (u8, u8) {
        match self.side {
            Side::Authority => (authority_guesses, peer_guesses),
            Side::Peer => (peer_guesses, authority_guesses),
        }
    }
}

impl<R: BufRead, O: Write> LocalPlayer for ConsolePlayer<R, O> {
    fn prompt_guess(&mut self, length: usize) -> Result<String> {
        let guess = self.ask(&format!("Guess a {} letter word: ", length))?;
        Ok(guess.to_lowercase())
    }

    fn prompt_word_length(&mut self) -> Result<usize> {
        loop {
            let answer = self.ask("How many letters should your word have? ")?;
            match answer.parse::<usize>() {
                Ok(length) if length > 0 => return Ok(length),
                _ => self.show(format!("{:?} is not a word length", answer).red()),
            }
        }
    }

    fn prompt_yes_no(&mut self, question: &str) -> Result<bool> {
        loop {
            let answer = self.ask(&format!("{} [y/n] ", question))?;
            match answer.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.show("please answer y or n".red()),
            }
        }
    }

    fn render_feedback(&mut self, guesses: &[ScoredGuess]) {
        for scored in guesses {
            let row: String = scored
                .guess
                .graphemes(true)
                .zip(scored.feedback.marks())
                .map(|(letter, mark)| {
                    let letter = format!(" {} ", letter.to_uppercase()).black();
                    match mark {
                        LetterClassification::Exact => letter.on_green(),
                        LetterClassification::Present => letter.on_yellow(),
                        LetterClassification::Absent => letter.on_dark_grey(),
                    }
                    .to_string()
                })
                .collect();
            self.show(row);
        }
    }

    fn notify(&mut self, notice: Notice<'_>) {
        match notice {
            Notice::RoundStarted {
                round,
                role,
                word_length,
            } => {
                let whose = match role {
                    Role::Host => "your word",
                    Role::Guesser => "your opponent's word",
                };
                self.show(
                    format!(
                        "Round {}: guess {} ({} letters)",
                        round, whose, word_length
                    )
                    .bold(),
                );
            }
            Notice::GuessRejected { expected, actual } => self.show(
                format!(
                    "That guess has {} letters, it needs {}.",
                    actual, expected
                )
                .red(),
            ),
            Notice::WordLengthUnavailable { length } => self.show(
                format!("No word with {} letters is available, pick another length.", length)
                    .yellow(),
            ),
            Notice::WordRevealed(word) => self.show(format!("The word was {}.", word.bold())),
            Notice::WaitingForPeer => self.show("Waiting for your opponent...".dark_grey()),
            Notice::RoundFinished { result, scores } => {
                let (mine, theirs) =
                    self.own_guesses(result.authority_guesses, result.peer_guesses);
                let verdict = if mine < theirs {
                    "You won the round!".green()
                } else if theirs < mine {
                    "Your opponent won the round.".red()
                } else {
                    "The round is a tie.".yellow()
                };
                self.show(format!(
                    "{} You needed {}, your opponent {}.",
                    verdict, mine, theirs
                ));
                let (own_score, opponent_score) =
                    self.own_view(scores.authority_score(), scores.peer_score());
                self.show(format!(
                    "Score: you {} - {} opponent ({} ties)",
                    own_score,
                    opponent_score,
                    scores.ties()
                ));
            }
            Notice::PeerDeclined => self.show("Your opponent does not want to play on."),
            Notice::PeerLeft => self.show("Your opponent has left."),
            Notice::SessionAborted(e) => {
                let reason = match e {
                    SessionError::ConnectionTerminated => "lost connection to your opponent".to_string(),
                    other => other.to_string(),
                };
                self.show(format!("Game aborted: {}", reason).red())
            }
        }
    }
}

#[cfg(test)]
mod test_console {
    use super::*;
    use crate::game::{Round, RoundResult, ScoreBoard};
    use std::io::Cursor;

    fn player(side: Side, input: &str) -> ConsolePlayer<Cursor<Vec<u8>>, Vec<u8>> {
        ConsolePlayer::with_io(side, Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn printed(player: &ConsolePlayer<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8_lossy(&player.output).to_string()
    }

    #[test]
    fn test_prompts_reask_until_valid() {
        let mut console = player(Side::Peer, "five\n0\n5\nmaybe\nYes\n  CRATE \n");
        assert_eq!(console.prompt_word_length().unwrap(), 5);
        assert!(console.prompt_yes_no("Again?").unwrap());
        assert_eq!(console.prompt_guess(5).unwrap(), "crate");
        assert!(printed(&console).contains("please answer y or n"));
    }

    #[test]
    fn test_closed_input() {
        let mut console = player(Side::Authority, "");
        assert!(console.prompt_guess(5).is_err());
        assert!(console.prompt_yes_no("Again?").is_err());
        assert!(console.prompt_word_length().is_err());
    }

    #[test]
    fn test_scores_from_own_side() {
        let mut board = ScoreBoard::new();
        let result = board.record_round(3, 5);
        let mut console = player(Side::Peer, "");
        console.notify(Notice::RoundFinished {
            result: &result,
            scores: &board,
        });
        let text = printed(&console);
        assert!(text.contains("You needed 5, your opponent 3."));
        assert!(text.contains("Score: you 0 - 1 opponent (0 ties)"));
        assert_eq!(result, RoundResult::decide(3, 5));
    }

    #[test]
    fn test_feedback_rows() {
        let mut round = Round::new("crate".to_string()).unwrap();
        round.guess("trace").unwrap();
        round.guess("crate").unwrap();
        let mut console = player(Side::Authority, "");
        console.render_feedback(round.history());
        assert_eq!(printed(&console).lines().count(), 2);
    }
}
