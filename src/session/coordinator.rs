use crate::game::{
    letter_count, InvalidGuessLength, Round, RoundResult, ScoreBoard, WordSupplier,
};
use crate::session::api::{
    LocalPlayer, Notice, Role, SessionConfig, SessionError, SessionState, Side,
};
use crate::session::messages::{is_wire_word, Message};
use crate::session::transport::Transport;
use async_std::net::TcpStream;
use log::{error, info, trace, warn};

/// One side of a word duel, from role assignment to the final `done`.
pub struct Session<P: LocalPlayer, W: WordSupplier> {
    side: Side,
    transport: Transport,
    player: P,
    supplier: W,
    config: SessionConfig,
    state: SessionState,
    scores: ScoreBoard,
    round_number: u32,
}

impl<P: LocalPlayer, W: WordSupplier> Session<P, W> {
    pub fn new(tcp: TcpStream, side: Side, player: P, supplier: W, config: SessionConfig) -> Self {
        Session {
            side,
            transport: Transport::new(tcp, &config),
            player,
            supplier,
            config,
            state: SessionState::AwaitingRole,
            scores: ScoreBoard::new(),
            round_number: 0,
        }
    }

    /// Play rounds until either side stops.
    ///
    /// Returns the final scores, or the error that ended the session early.
    /// The connection is closed in both cases.
    pub async fn run(mut self) -> Result<ScoreBoard, SessionError> {
        info!(
            "session with {} started as {}",
            self.transport.peer_address(),
            self.side
        );
        let outcome = self.play_rounds().await;
        self.set_state(SessionState::Terminated);
        match &outcome {
            Ok(scores) => info!(
                "session with {} ended after {} rounds, {}:{} with {} ties",
                self.transport.peer_address(),
                scores.rounds_played(),
                scores.authority_score(),
                scores.peer_score(),
                scores.ties()
            ),
            Err(e) => {
                error!(
                    "session with {} aborted in round {}: {}",
                    self.transport.peer_address(),
                    self.round_number,
                    e
                );
                self.player.notify(Notice::SessionAborted(e));
            }
        }
        self.transport.close().await;
        outcome
    }

    async fn play_rounds(&mut self) -> Result<ScoreBoard, SessionError> {
        loop {
            self.set_state(SessionState::AwaitingRole);
            let target = self.assign_role().await?;
            self.set_state(SessionState::Playing);
            let guesses = self.play_round(target)?;
            self.set_state(SessionState::ExchangingResult);
            self.exchange_result(guesses).await?;
            self.set_state(SessionState::AwaitingContinue);
            if !self.negotiate_continue().await? {
                return Ok(self.scores);
            }
        }
    }

    /// Settle who hosts the next round and return its secret word.
    async fn assign_role(&mut self) -> Result<String, SessionError> {
        self.round_number += 1;
        let role = Role::for_round(self.side, self.round_number);
        let target = match (self.side, role) {
            (Side::Authority, Role::Host) => self.offer_word().await?,
            (Side::Authority, Role::Guesser) => {
                self.transport.send_message(Message::YourTurn).await?;
                match self.await_peer().await? {
                    Message::WordOffer(word) => word,
                    other => return Err(unexpected(&other, "a word offer")),
                }
            }
            (Side::Peer, _) => match (self.await_peer().await?, role) {
                (Message::YourTurn, Role::Host) => self.offer_word().await?,
                (Message::WordOffer(word), Role::Guesser) => word,
                (other @ Message::YourTurn, Role::Guesser)
                | (other @ Message::WordOffer(_), Role::Host) => {
                    return Err(SessionError::ProtocolViolation(format!(
                        "authority sent {:?} in round {} where we are {:?}",
                        other.to_string(),
                        self.round_number,
                        role
                    )))
                }
                (other, _) => return Err(unexpected(&other, "a role assignment")),
            },
        };
        info!(
            "round {} starts, {} is {:?}",
            self.round_number, self.side, role
        );
        self.player.notify(Notice::RoundStarted {
            round: self.round_number,
            role,
            word_length: letter_count(&target),
        });
        Ok(target)
    }

    async fn offer_word(&mut self) -> Result<String, SessionError> {
        let word = self.obtain_word()?;
        self.transport
            .send_message(Message::WordOffer(word.clone()))
            .await?;
        Ok(word)
    }

    /// Ask the local player for lengths until the supplier has a word,
    /// at most `1 + max_word_length_retries` times.
    fn obtain_word(&mut self) -> Result<String, SessionError> {
        let attempts = self.config.max_word_length_retries.saturating_add(1);
        let mut length = 0;
        for _ in 0..attempts {
            length = self.player.prompt_word_length().map_err(local_input)?;
            match self.supplier.supply_word(length) {
                Some(word)
                    if length > 0 && letter_count(&word) == length && is_wire_word(&word) =>
                {
                    return Ok(word)
                }
                Some(word) => warn!(
                    "word supplier returned {:?} for length {}, ignored",
                    word, length
                ),
                None => {}
            }
            self.player
                .notify(Notice::WordLengthUnavailable { length });
        }
        Err(SessionError::WordLengthUnavailable { length, attempts })
    }

    /// Let the local player guess `target`, returning the guesses charged.
    fn play_round(&mut self, target: String) -> Result<u8, SessionError> {
        let mut round =
            Round::new(target).map_err(|e| SessionError::ProtocolViolation(e.to_string()))?;
        while !round.is_over() {
            let guess = self
                .player
                .prompt_guess(round.word_length())
                .map_err(local_input)?;
            match round.guess(&guess) {
                Ok(_) => self.player.render_feedback(round.history()),
                Err(InvalidGuessLength { expected, actual }) => self
                    .player
                    .notify(Notice::GuessRejected { expected, actual }),
            }
        }
        if !round.is_solved() {
            self.player.notify(Notice::WordRevealed(round.target()));
        }
        #[cfg(debug_assertions)]
        trace!(
            "round {} played by {} in {} guesses",
            self.round_number,
            self.side,
            round.score()
        );
        Ok(round.score())
    }

    async fn exchange_result(&mut self, own_guesses: u8) -> Result<(), SessionError> {
        let result = match self.side {
            Side::Authority => {
                let peer_guesses = match self.await_peer().await? {
                    Message::GuessCount(n) => n,
                    other => return Err(unexpected(&other, "a guess count")),
                };
                let result = self.scores.record_round(own_guesses, peer_guesses);
                self.transport
                    .send_message(Message::RoundResult {
                        result,
                        authority_score: self.scores.authority_score(),
                        peer_score: self.scores.peer_score(),
                    })
                    .await?;
                result
            }
            Side::Peer => {
                self.transport
                    .send_message(Message::GuessCount(own_guesses))
                    .await?;
                match self.await_peer().await? {
                    Message::RoundResult {
                        result,
                        authority_score,
                        peer_score,
                    } => {
                        self.follow_broadcast(&result, own_guesses, authority_score, peer_score)?;
                        result
                    }
                    other => return Err(unexpected(&other, "a round result")),
                }
            }
        };
        info!(
            "round {} result: {} ({} vs {} guesses)",
            self.round_number, result.outcome, result.authority_guesses, result.peer_guesses
        );
        self.player.notify(Notice::RoundFinished {
            result: &result,
            scores: &self.scores,
        });
        Ok(())
    }

    fn follow_broadcast(
        &mut self,
        result: &RoundResult,
        own_guesses: u8,
        authority_score: u32,
        peer_score: u32,
    ) -> Result<(), SessionError> {
        if result.peer_guesses != own_guesses {
            return Err(SessionError::ProtocolViolation(format!(
                "result reports {} peer guesses, we sent {}",
                result.peer_guesses, own_guesses
            )));
        }
        self.scores
            .mirror(result, authority_score, peer_score)
            .map_err(|e| SessionError::ProtocolViolation(e.to_string()))
    }

    /// true if both sides want another round
    async fn negotiate_continue(&mut self) -> Result<bool, SessionError> {
        let again = self
            .player
            .prompt_yes_no("Play another round?")
            .map_err(local_input)?;
        if !again {
            match self.transport.send_message(Message::Done).await {
                Err(SessionError::ConnectionTerminated) => {
                    warn!("{} left before our done", self.transport.peer_address())
                }
                other => other?,
            }
            return Ok(false);
        }
        let answer = match self.transport.send_message(Message::Continuing).await {
            Ok(()) => self.await_peer().await,
            Err(e) => Err(e),
        };
        match answer {
            Ok(Message::Continuing) => Ok(true),
            Ok(Message::Done) => {
                info!("{} does not want another round", self.transport.peer_address());
                self.player.notify(Notice::PeerDeclined);
                Ok(false)
            }
            Ok(other) => Err(unexpected(&other, "continuing or done")),
            Err(SessionError::ConnectionTerminated) => {
                warn!(
                    "{} left after round {}",
                    self.transport.peer_address(),
                    self.round_number
                );
                self.player.notify(Notice::PeerLeft);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn await_peer(&mut self) -> Result<Message, SessionError> {
        self.player.notify(Notice::WaitingForPeer);
        self.transport.receive_message().await
    }

    fn set_state(&mut self, state: SessionState) {
        trace!(
            "{} session with {}: {:?} -> {:?}",
            self.side,
            self.transport.peer_address(),
            self.state,
            state
        );
        self.state = state;
    }
}

fn unexpected(msg: &Message, expecting: &str) -> SessionError {
    SessionError::ProtocolViolation(format!("expecting {}, got {:?}", expecting, msg.to_string()))
}

fn local_input(e: anyhow::Error) -> SessionError {
    SessionError::LocalInput(e.to_string())
}
