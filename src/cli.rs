use crate::libcatalog::assets::{Cdn, ImageParams};
use crate::libcatalog::carousel::{year_label, Carousel};
use crate::libcatalog::choices::ChoiceSet;
use crate::libcatalog::trivia::{GameSettings, Outcome, Progress, TriviaGame, REVEAL_DELAY};
use crate::Error;
use colored::Colorize;
use log::debug;
use std::io::{self, Write};
use std::thread::sleep;
use std::time::{Duration, Instant};
use text_io::read;

#[derive(Debug, PartialEq)]
pub(crate) enum Choice {
    Option(String),
    DontKnow,
    Quit,
}

impl Choice {
    pub(crate) fn from_str(question: &ChoiceSet, input: &str) -> Choice {
        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Choice::Quit;
        }
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if letter.is_ascii_alphabetic() => {
                match question.choice_by_label(letter) {
                    Some(title) => Choice::Option(title.to_string()),
                    None => {
                        println!(
                            "{}",
                            format!("There are only {} options available!", question.choices.len())
                                .bright_red()
                        );
                        Choice::DontKnow
                    }
                }
            }
            _ => Choice::DontKnow,
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum Turn {
    Answered,
    Quit,
}

/// Applies one answer that took `elapsed` to type. Quitting always wins;
/// otherwise the countdown runs first, so a late answer is a time-up.
pub(crate) fn play_turn(game: &mut TriviaGame, choice: Choice, elapsed: Duration) -> Turn {
    let answer = match choice {
        Choice::Quit => return Turn::Quit,
        Choice::Option(title) => title,
        Choice::DontKnow => String::new(),
    };
    for _ in 0..elapsed.as_secs() {
        if game.tick().is_some() {
            return Turn::Answered;
        }
    }
    game.answer(Some(answer.as_str()));
    Turn::Answered
}

pub fn trivia_loop(carousel: &mut Carousel, cdn: &Cdn, settings: GameSettings) -> Result<(), Error> {
    let mut game = TriviaGame::start(carousel, settings)?;
    println!(
        "{}",
        format!(
            "==========> What Model Is This? ({} questions, {} s each) <==========",
            game.settings().question_count,
            game.settings().seconds_per_question
        )
        .cyan()
    );

    loop {
        let Some(image) = carousel.current() else {
            break;
        };
        let leading = format!("{}/{}. ", game.answered() + 1, game.settings().question_count);
        let url = cdn
            .image_url(&image.asset, ImageParams::default().quality(85))
            .unwrap_or_else(|| image.asset.clone());
        println!("{}{}", leading.cyan(), url.black().bold().on_white());
        if let Some(caption) = &image.caption {
            println!("{}{}", " ".repeat(leading.len()), caption.to_uppercase().dimmed());
        }
        debug!("[Trivia] slide {} ({})", carousel.current_index(), year_label(image));

        print_choices(game.question(), &" ".repeat(leading.len()));
        print!(
            "{} ",
            format!(
                "Answer (A-{}, q to quit, anything else if you don't know) [{} s]:",
                ChoiceSet::label(game.question().choices.len().saturating_sub(1)),
                game.time_left()
            )
            .cyan()
        );
        io::stdout().flush()?;

        let asked = Instant::now();
        let input: String = read!("{}\n");
        let elapsed = asked.elapsed();
        let choice = Choice::from_str(game.question(), &input);
        debug!("choice: {:?} after {} ms", choice, elapsed.as_millis());

        if play_turn(&mut game, choice, elapsed) == Turn::Quit {
            println!("{}", "Quitting Early!".cyan());
            if let Progress::Finished { score, answered } = game.exit(carousel) {
                print_score(score, answered);
            }
            return Ok(());
        }
        if let Some(outcome) = game.revealed() {
            print_outcome(outcome);
        }
        println!("{}", format!("Score: {}/{}", game.score(), game.answered()).yellow());

        sleep(REVEAL_DELAY);
        match game.advance(carousel)? {
            Progress::Finished { score, answered } => {
                print_score(score, answered);
                return Ok(());
            }
            Progress::NextQuestion | Progress::Unanswered => {}
        }
    }
    Ok(())
}

fn print_choices(question: &ChoiceSet, indent: &str) {
    for (i, choice) in question.choices.iter().enumerate() {
        println!(
            "{}{} {}",
            indent,
            format!("{}.", ChoiceSet::label(i)).yellow().bold(),
            choice
        );
    }
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Correct => println!("{}", "✓ Correct!".bright_green()),
        Outcome::Wrong { correct } => {
            println!("{}", format!("✗ Wrong! It was: {}", correct).bright_red())
        }
        Outcome::TimeUp { correct } => {
            println!("{}", format!("⏰ Time's up! It was: {}", correct).bright_red())
        }
    }
}

fn print_score(score: u32, answered: u32) {
    println!(
        "{}",
        format!("==========> Final score: {}/{} <==========", score, answered).cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libcatalog::carousel::tests::slide;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn game(seconds_per_question: u32) -> (Carousel, TriviaGame) {
        let mut rng = StdRng::seed_from_u64(7);
        let mut carousel = Carousel::new_with(
            vec![
                slide("Tacoma", "Toyota"),
                slide("Tundra", "Toyota"),
                slide("Ranger", "Ford"),
                slide("Hardbody", "Nissan"),
            ],
            &mut rng,
        );
        let settings = GameSettings {
            question_count: 3,
            seconds_per_question,
        };
        let game = TriviaGame::start_with(&mut carousel, settings, &mut rng).unwrap();
        (carousel, game)
    }

    fn question() -> ChoiceSet {
        ChoiceSet {
            correct_answer: "Tacoma".to_string(),
            choices: ["Tundra", "Tacoma", "Ranger", "Hardbody"]
                .map(String::from)
                .to_vec(),
        }
    }

    #[test]
    fn parses_letters_and_quit() {
        colored::control::set_override(false);
        let four = question();
        let mut two = question();
        two.choices.truncate(2);

        assert_eq!(Choice::from_str(&four, "a"), Choice::Option("Tundra".to_string()));
        assert_eq!(Choice::from_str(&four, " D \n"), Choice::Option("Hardbody".to_string()));
        assert_eq!(Choice::from_str(&four, "Q"), Choice::Quit);
        assert_eq!(Choice::from_str(&two, "c"), Choice::DontKnow);
        assert_eq!(Choice::from_str(&four, "1"), Choice::DontKnow);
        assert_eq!(Choice::from_str(&four, ""), Choice::DontKnow);
    }

    #[test]
    fn quit_wins_even_after_the_time_limit() {
        let (_carousel, mut game) = game(5);
        assert_eq!(
            play_turn(&mut game, Choice::Quit, Duration::from_secs(30)),
            Turn::Quit
        );
        assert_eq!(game.answered(), 0);
        assert!(game.revealed().is_none());
    }

    #[test]
    fn late_answer_runs_the_countdown_out() {
        let (_carousel, mut game) = game(5);
        let correct = game.question().correct_answer.clone();
        let turn = play_turn(
            &mut game,
            Choice::Option(correct.clone()),
            Duration::from_millis(5_400),
        );
        assert_eq!(turn, Turn::Answered);
        assert_eq!(game.time_left(), 0);
        assert_eq!(game.revealed(), Some(&Outcome::TimeUp { correct }));
        assert_eq!((game.score(), game.answered()), (0, 1));
    }

    #[test]
    fn timely_answer_counts_and_spends_whole_seconds() {
        let (_carousel, mut game) = game(5);
        let correct = game.question().correct_answer.clone();
        let turn = play_turn(&mut game, Choice::Option(correct), Duration::from_millis(2_900));
        assert_eq!(turn, Turn::Answered);
        assert_eq!(game.time_left(), 3);
        assert_eq!(game.revealed(), Some(&Outcome::Correct));
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn dont_know_is_a_wrong_answer() {
        let (_carousel, mut game) = game(5);
        let correct = game.question().correct_answer.clone();
        play_turn(&mut game, Choice::DontKnow, Duration::ZERO);
        assert_eq!(game.revealed(), Some(&Outcome::Wrong { correct }));
    }
}
