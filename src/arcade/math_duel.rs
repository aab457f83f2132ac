//! Timed arithmetic duel
//!
//! A countdown ticks once per interval. Correct answers score a point, win
//! back a little time (capped) and roll a new problem. When the clock hits
//! zero the duel is over until restarted.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const START_SECONDS: u32 = 15;
pub const MAX_SECONDS: u32 = 20;
pub const BONUS_SECONDS: u32 = 2;

const OPERAND_MIN: i64 = 1;
const OPERAND_MAX: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "×")]
    Multiply,
}

impl Operator {
    const ALL: [Operator; 3] = [Operator::Add, Operator::Subtract, Operator::Multiply];

    fn apply(&self, a: i64, b: i64) -> i64 {
        match self {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
            Operator::Multiply => a * b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub a: i64,
    pub b: i64,
    pub op: Operator,
}

impl Problem {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            a: rng.gen_range(OPERAND_MIN..=OPERAND_MAX),
            b: rng.gen_range(OPERAND_MIN..=OPERAND_MAX),
            op: Operator::ALL[rng.gen_range(0..Operator::ALL.len())],
        }
    }

    pub fn answer(&self) -> i64 {
        self.op.apply(self.a, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelState {
    Running,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Submission {
    Correct,
    Incorrect,
    /// The clock already ran out
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathDuel {
    problem: Problem,
    score: u32,
    time_left: u32,
    state: DuelState,
}

impl MathDuel {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            problem: Problem::random(rng),
            score: 0,
            time_left: START_SECONDS,
            state: DuelState::Running,
        }
    }

    pub fn problem(&self) -> Problem {
        self.problem
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn state(&self) -> DuelState {
        self.state
    }

    /// Final score once the duel is over
    pub fn final_score(&self) -> Option<u32> {
        match self.state {
            DuelState::GameOver => Some(self.score),
            DuelState::Running => None,
        }
    }

    /// Advance the countdown by one tick
    pub fn tick(&mut self) -> DuelState {
        if self.state == DuelState::Running {
            if self.time_left <= 1 {
                self.time_left = 0;
                self.state = DuelState::GameOver;
            } else {
                self.time_left -= 1;
            }
        }
        self.state
    }

    /// Check a typed answer; anything that is not an integer counts as wrong
    pub fn submit<R: Rng + ?Sized>(&mut self, input: &str, rng: &mut R) -> Submission {
        if self.state == DuelState::GameOver {
            return Submission::Rejected;
        }

        match input.trim().parse::<i64>() {
            Ok(answer) if answer == self.problem.answer() => {
                self.score += 1;
                self.time_left = (self.time_left + BONUS_SECONDS).min(MAX_SECONDS);
                self.problem = Problem::random(rng);
                Submission::Correct
            }
            _ => Submission::Incorrect,
        }
    }

    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        *self = Self::new(rng);
    }
}
