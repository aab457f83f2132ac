//! Rock-paper-scissors with a running best-of-N scoreboard

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::MoveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// The choice this one defeats
    pub fn beats(&self) -> Choice {
        match self {
            Choice::Rock => Choice::Scissors,
            Choice::Scissors => Choice::Paper,
            Choice::Paper => Choice::Rock,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Choice {
        *Self::ALL.choose(rng).unwrap_or(&Choice::Rock)
    }
}

impl FromStr for Choice {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rock" | "🪨" => Ok(Choice::Rock),
            "paper" | "📜" => Ok(Choice::Paper),
            "scissors" | "✂️" => Ok(Choice::Scissors),
            other => Err(MoveError::InvalidChoice(other.to_string())),
        }
    }
}

/// Result of a round from the player's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

/// Decide a single round
pub fn judge(player: Choice, opponent: Choice) -> Outcome {
    if player == opponent {
        Outcome::Draw
    } else if player.beats() == opponent {
        Outcome::Win
    } else {
        Outcome::Lose
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub player: Choice,
    pub opponent: Choice,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub player: u32,
    pub opponent: u32,
    pub draws: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player,
    Opponent,
}

/// Cumulative match state, kept until [`RockPaperScissors::reset`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RockPaperScissors {
    best_of: u32,
    scores: Scoreboard,
    last_round: Option<Round>,
}

impl RockPaperScissors {
    pub fn new(best_of: u32) -> Self {
        Self {
            best_of: best_of.max(1),
            scores: Scoreboard::default(),
            last_round: None,
        }
    }

    pub fn scores(&self) -> Scoreboard {
        self.scores
    }

    pub fn last_round(&self) -> Option<Round> {
        self.last_round
    }

    pub fn best_of(&self) -> u32 {
        self.best_of
    }

    /// Play against a randomly chosen opponent hand
    pub fn play<R: Rng + ?Sized>(&mut self, player: Choice, rng: &mut R) -> Round {
        self.play_against(player, Choice::random(rng))
    }

    /// Play against a known opponent hand
    pub fn play_against(&mut self, player: Choice, opponent: Choice) -> Round {
        let outcome = judge(player, opponent);
        match outcome {
            Outcome::Win => self.scores.player += 1,
            Outcome::Lose => self.scores.opponent += 1,
            Outcome::Draw => self.scores.draws += 1,
        }

        let round = Round {
            player,
            opponent,
            outcome,
        };
        self.last_round = Some(round);
        round
    }

    /// The side holding a majority of the best-of-N rounds, if any
    pub fn champion(&self) -> Option<Side> {
        let needed = self.best_of / 2 + 1;
        if self.scores.player >= needed {
            Some(Side::Player)
        } else if self.scores.opponent >= needed {
            Some(Side::Opponent)
        } else {
            None
        }
    }

    /// Clear the shown round but keep the score
    pub fn next_round(&mut self) {
        self.last_round = None;
    }

    pub fn reset(&mut self) {
        self.scores = Scoreboard::default();
        self.last_round = None;
    }
}
