//! "What model is this?" played on top of the carousel.
//!
//! The game owns no timer. The caller feeds it one `tick` per second and
//! calls `advance` once the answer has been on screen for [`REVEAL_DELAY`].

use crate::libcatalog::carousel::Carousel;
use crate::libcatalog::choices::{generate_choices, generate_choices_with, ChoiceError, ChoiceSet};
use log::{debug, info};
use rand::rng;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

pub(crate) const QUESTION_SECONDS: u32 = 15;
pub(crate) const QUESTIONS_PER_GAME: u32 = 10;
pub(crate) const REVEAL_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GameSettings {
    pub question_count: u32,
    pub seconds_per_question: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            question_count: QUESTIONS_PER_GAME,
            seconds_per_question: QUESTION_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Correct,
    Wrong { correct: String },
    TimeUp { correct: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    /// The current question has not been answered yet.
    Unanswered,
    NextQuestion,
    Finished { score: u32, answered: u32 },
}

#[derive(Debug, Error)]
pub(crate) enum TriviaError {
    #[error("there are no truck images to play with")]
    NoImages,
    #[error(transparent)]
    Choices(#[from] ChoiceError),
}

#[derive(Debug)]
pub(crate) struct TriviaGame {
    settings: GameSettings,
    score: u32,
    answered: u32,
    time_left: u32,
    question: ChoiceSet,
    revealed: Option<Outcome>,
}

impl TriviaGame {
    pub fn start(carousel: &mut Carousel, settings: GameSettings) -> Result<Self, TriviaError> {
        Self::prepare(carousel)?;
        let question = generate_choices(&carousel.pool(), carousel.current_index())?;
        Ok(Self::new(settings, question))
    }

    pub fn start_with<R: Rng + ?Sized>(
        carousel: &mut Carousel,
        settings: GameSettings,
        rng: &mut R,
    ) -> Result<Self, TriviaError> {
        Self::prepare(carousel)?;
        let question = generate_choices_with(&carousel.pool(), carousel.current_index(), rng)?;
        Ok(Self::new(settings, question))
    }

    fn prepare(carousel: &mut Carousel) -> Result<(), TriviaError> {
        if carousel.is_empty() {
            return Err(TriviaError::NoImages);
        }
        carousel.set_autoplay(false);
        Ok(())
    }

    fn new(settings: GameSettings, question: ChoiceSet) -> Self {
        info!(
            "[Trivia] Game started: {} questions, {} s each",
            settings.question_count, settings.seconds_per_question
        );
        Self {
            settings,
            score: 0,
            answered: 0,
            time_left: settings.seconds_per_question,
            question,
            revealed: None,
        }
    }

    pub fn question(&self) -> &ChoiceSet {
        &self.question
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn answered(&self) -> u32 {
        self.answered
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    pub fn revealed(&self) -> Option<&Outcome> {
        self.revealed.as_ref()
    }

    /// Scores `answer` (`None` when the clock ran out). Only the first answer
    /// to a question counts; later calls return `None`.
    pub fn answer(&mut self, answer: Option<&str>) -> Option<Outcome> {
        if self.revealed.is_some() {
            return None;
        }
        let correct = self.question.correct_answer.clone();
        let outcome = match answer {
            None => Outcome::TimeUp { correct },
            Some(choice) if self.question.is_correct(choice) => {
                self.score += 1;
                Outcome::Correct
            }
            Some(_) => Outcome::Wrong { correct },
        };
        self.answered += 1;
        debug!(
            "[Trivia] {:?} -> {:?} ({}/{})",
            answer, outcome, self.score, self.answered
        );
        self.revealed = Some(outcome.clone());
        Some(outcome)
    }

    /// One second of the countdown. Answers with a time-up at zero.
    pub fn tick(&mut self) -> Option<Outcome> {
        if self.revealed.is_some() {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.answer(None)
        } else {
            None
        }
    }

    pub fn advance(&mut self, carousel: &mut Carousel) -> Result<Progress, TriviaError> {
        self.advance_with(carousel, &mut rng())
    }

    pub fn advance_with<R: Rng + ?Sized>(
        &mut self,
        carousel: &mut Carousel,
        rng: &mut R,
    ) -> Result<Progress, TriviaError> {
        if self.revealed.is_none() {
            return Ok(Progress::Unanswered);
        }
        if self.answered >= self.settings.question_count {
            return Ok(self.finish(carousel));
        }

        carousel.next();
        self.question = generate_choices_with(&carousel.pool(), carousel.current_index(), rng)?;
        self.time_left = self.settings.seconds_per_question;
        self.revealed = None;
        Ok(Progress::NextQuestion)
    }

    /// Leaves the game early, handing the carousel back to auto-play.
    pub fn exit(mut self, carousel: &mut Carousel) -> Progress {
        self.finish(carousel)
    }

    fn finish(&mut self, carousel: &mut Carousel) -> Progress {
        carousel.set_autoplay(true);
        info!(
            "[Trivia] Game over: {}/{}",
            self.score, self.answered
        );
        Progress::Finished {
            score: self.score,
            answered: self.answered,
        }
    }
}
