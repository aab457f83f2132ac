//! Arcade side panel
//!
//! The game engines in the submodules are plain state machines. [`Arcade`]
//! owns one table per game and the timers that drive them: the tic-tac-toe
//! opponent's delayed reply and the math duel countdown. Each timer carries
//! a cancellation token; reset, restart and exit cancel it under the table
//! lock, so a stale timer can never touch a fresh game.

pub mod math_duel;
pub mod rps;
pub mod tictactoe;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::ArcadeSettings;

pub use math_duel::{DuelState, MathDuel, Submission};
pub use rps::{Choice, Outcome, RockPaperScissors, Round, Scoreboard, Side};
pub use tictactoe::{GameStatus, Mark, TicTacToe};

/// Rejected game actions
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("The game is over; reset to play again")]
    GameOver,

    #[error("It is not your turn")]
    NotYourTurn,

    #[error("Cell {0} is out of range")]
    OutOfRange(usize),

    #[error("Cell {0} is already taken")]
    Occupied(usize),

    #[error("Unknown choice: {0}")]
    InvalidChoice(String),

    #[error("The duel has not started")]
    NotStarted,
}

/// Snapshot of the rock-paper-scissors match
#[derive(Debug, Clone, Serialize)]
pub struct RpsView {
    pub best_of: u32,
    pub scores: Scoreboard,
    pub last_round: Option<Round>,
    pub champion: Option<Side>,
}

impl From<&RockPaperScissors> for RpsView {
    fn from(game: &RockPaperScissors) -> Self {
        Self {
            best_of: game.best_of(),
            scores: game.scores(),
            last_round: game.last_round(),
            champion: game.champion(),
        }
    }
}

struct Table<G> {
    game: G,
    rng: StdRng,
    timer: Option<CancellationToken>,
}

impl<G> Table<G> {
    fn new(game: G, rng: StdRng) -> Self {
        Self {
            game,
            rng,
            timer: None,
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
        }
    }

    fn arm_timer(&mut self) -> CancellationToken {
        self.cancel_timer();
        let token = CancellationToken::new();
        self.timer = Some(token.clone());
        token
    }
}

type Shared<G> = Arc<Mutex<Table<G>>>;

/// The three games and their timers
pub struct Arcade {
    opponent_delay: Duration,
    tick_interval: Duration,
    tictactoe: Shared<TicTacToe>,
    rps: Shared<RockPaperScissors>,
    math: Shared<Option<MathDuel>>,
}

impl Arcade {
    pub fn new(settings: &ArcadeSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy)
    }

    /// Deterministic arcade for tests and replays
    pub fn with_seed(settings: &ArcadeSettings, seed: u64) -> Self {
        let mut n = seed;
        Self::with_rng(settings, move || {
            n = n.wrapping_add(1);
            StdRng::seed_from_u64(n)
        })
    }

    fn with_rng(settings: &ArcadeSettings, mut rng: impl FnMut() -> StdRng) -> Self {
        Self {
            opponent_delay: settings.opponent_delay(),
            tick_interval: settings.tick_interval(),
            tictactoe: Arc::new(Mutex::new(Table::new(TicTacToe::new(), rng()))),
            rps: Arc::new(Mutex::new(Table::new(
                RockPaperScissors::new(settings.best_of),
                rng(),
            ))),
            math: Arc::new(Mutex::new(Table::new(None, rng()))),
        }
    }

    pub async fn tictactoe(&self) -> TicTacToe {
        self.tictactoe.lock().await.game.clone()
    }

    /// Place the player's mark and schedule the opponent's reply
    pub async fn tictactoe_move(&self, cell: usize) -> Result<TicTacToe, MoveError> {
        let mut table = self.tictactoe.lock().await;
        table.game.play(cell)?;

        if table.game.awaiting_opponent() {
            let token = table.arm_timer();
            tokio::spawn(opponent_reply(
                self.tictactoe.clone(),
                token,
                self.opponent_delay,
            ));
        }

        Ok(table.game.clone())
    }

    pub async fn tictactoe_reset(&self) -> TicTacToe {
        let mut table = self.tictactoe.lock().await;
        table.cancel_timer();
        table.game.reset();
        table.game.clone()
    }

    pub async fn rps(&self) -> RpsView {
        RpsView::from(&self.rps.lock().await.game)
    }

    pub async fn rps_play(&self, choice: Choice) -> RpsView {
        let mut table = self.rps.lock().await;
        let Table { game, rng, .. } = &mut *table;
        let round = game.play(choice, rng);
        tracing::debug!("RPS round: {:?}", round);
        RpsView::from(&*game)
    }

    pub async fn rps_next_round(&self) -> RpsView {
        let mut table = self.rps.lock().await;
        table.game.next_round();
        RpsView::from(&table.game)
    }

    pub async fn rps_reset(&self) -> RpsView {
        let mut table = self.rps.lock().await;
        table.game.reset();
        RpsView::from(&table.game)
    }

    pub async fn math(&self) -> Option<MathDuel> {
        self.math.lock().await.game.clone()
    }

    /// Start (or restart) the duel and its countdown
    pub async fn math_restart(&self) -> MathDuel {
        let mut table = self.math.lock().await;
        let Table { game, rng, .. } = &mut *table;
        let duel = MathDuel::new(rng);
        *game = Some(duel.clone());

        let token = table.arm_timer();
        tokio::spawn(countdown(self.math.clone(), token, self.tick_interval));
        duel
    }

    pub async fn math_answer(&self, input: &str) -> Result<(Submission, MathDuel), MoveError> {
        let mut table = self.math.lock().await;
        let Table { game, rng, .. } = &mut *table;
        let duel = game.as_mut().ok_or(MoveError::NotStarted)?;
        let submission = duel.submit(input, rng);
        Ok((submission, duel.clone()))
    }

    /// Leave the arcade, cancelling every pending timer
    pub async fn exit(&self) {
        self.tictactoe.lock().await.cancel_timer();
        let mut math = self.math.lock().await;
        math.cancel_timer();
        math.game = None;
    }
}

async fn opponent_reply(table: Shared<TicTacToe>, token: CancellationToken, delay: Duration) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(delay) => {
            let mut table = table.lock().await;
            if token.is_cancelled() {
                return;
            }
            table.timer = None;
            let Table { game, rng, .. } = &mut *table;
            if let Some(cell) = game.opponent_move(rng) {
                tracing::debug!("Opponent played cell {} -> {:?}", cell, game.status());
            }
        }
    }
}

async fn countdown(table: Shared<Option<MathDuel>>, token: CancellationToken, interval: Duration) {
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(interval) => {
                let mut table = table.lock().await;
                if token.is_cancelled() {
                    return;
                }
                let finished = match table.game.as_mut() {
                    Some(duel) => duel.tick() == DuelState::GameOver,
                    None => true,
                };
                if finished {
                    table.timer = None;
                    if let Some(score) = table.game.as_ref().and_then(MathDuel::final_score) {
                        tracing::info!("Math duel over with score {}", score);
                    }
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arcade() -> Arcade {
        Arcade::with_seed(&ArcadeSettings::default(), 11)
    }

    #[tokio::test(start_paused = true)]
    async fn test_opponent_replies_after_delay() {
        let arcade = arcade();

        let game = arcade.tictactoe_move(4).await.unwrap();
        assert!(game.awaiting_opponent());
        assert!(matches!(
            arcade.tictactoe_move(0).await,
            Err(MoveError::NotYourTurn)
        ));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(arcade.tictactoe().await.empty_cells().len(), 8);

        tokio::time::sleep(Duration::from_millis(400)).await;
        let game = arcade.tictactoe().await;
        assert_eq!(game.empty_cells().len(), 7);
        assert_eq!(game.turn(), Mark::X);
        assert_eq!(game.board().iter().filter(|c| **c == Some(Mark::O)).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_reply() {
        let arcade = arcade();

        arcade.tictactoe_move(0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        arcade.tictactoe_reset().await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        let game = arcade.tictactoe().await;
        assert_eq!(game.empty_cells().len(), 9);
        assert_eq!(game.status(), GameStatus::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_ends_duel() {
        let arcade = arcade();
        assert!(matches!(
            arcade.math_answer("1").await,
            Err(MoveError::NotStarted)
        ));

        arcade.math_restart().await;
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(arcade.math().await.unwrap().time_left(), 12);

        let answer = arcade.math().await.unwrap().problem().answer().to_string();
        let (submission, duel) = arcade.math_answer(&answer).await.unwrap();
        assert_eq!(submission, Submission::Correct);
        assert_eq!(duel.time_left(), 14);

        tokio::time::sleep(Duration::from_secs(20)).await;
        let duel = arcade.math().await.unwrap();
        assert_eq!(duel.state(), DuelState::GameOver);
        assert_eq!(duel.final_score(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_countdown() {
        let arcade = arcade();

        arcade.math_restart().await;
        tokio::time::sleep(Duration::from_millis(5500)).await;
        arcade.math_restart().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        // One tick from the new countdown only
        assert_eq!(arcade.math().await.unwrap().time_left(), 14);

        arcade.exit().await;
        assert!(arcade.math().await.is_none());
    }

    #[tokio::test]
    async fn test_rps_scoreboard() {
        let arcade = arcade();

        let view = arcade.rps_play(Choice::Rock).await;
        let round = view.last_round.unwrap();
        assert_eq!(round.player, Choice::Rock);
        assert_eq!(view.best_of, 3);

        let view = arcade.rps_next_round().await;
        assert!(view.last_round.is_none());

        let view = arcade.rps_reset().await;
        assert_eq!(view.scores, Scoreboard::default());
    }
}
