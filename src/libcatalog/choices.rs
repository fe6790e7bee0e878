use log::debug;
use rand::rng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

/// How many wrong answers a question tries to offer.
pub(crate) const DISTRACTORS: usize = 3;

/// One entry of the trivia pool: what the player has to name, and the group
/// (manufacturer) used to pick plausible wrong answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CatalogItem {
    pub title: String,
    pub group_key: String,
}

impl CatalogItem {
    pub fn new(title: impl Into<String>, group_key: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            group_key: group_key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChoiceSet {
    pub correct_answer: String,
    pub choices: Vec<String>,
}

impl ChoiceSet {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }

    /// Button label for the choice at `index`: A, B, C, ...
    pub fn label(index: usize) -> char {
        (b'A' + (index % 26) as u8) as char
    }

    pub fn choice_by_label(&self, label: char) -> Option<&str> {
        let upper = label.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        self.choices
            .get((upper as u8 - b'A') as usize)
            .map(String::as_str)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ChoiceError {
    #[error("cannot build a question from an empty pool")]
    EmptyPool,
    #[error("current index {index} is outside the pool (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

pub(crate) fn generate_choices(
    pool: &[CatalogItem],
    current_index: usize,
) -> Result<ChoiceSet, ChoiceError> {
    generate_choices_with(pool, current_index, &mut rng())
}

/// Builds the multiple-choice answers for `pool[current_index]`.
///
/// Distractors come from the current item's group first and only fall back to
/// other groups when the group runs dry. Small or single-group pools produce
/// fewer choices instead of an error.
pub(crate) fn generate_choices_with<R: Rng + ?Sized>(
    pool: &[CatalogItem],
    current_index: usize,
    rng: &mut R,
) -> Result<ChoiceSet, ChoiceError> {
    if pool.is_empty() {
        return Err(ChoiceError::EmptyPool);
    }
    let current = pool.get(current_index).ok_or(ChoiceError::IndexOutOfRange {
        index: current_index,
        len: pool.len(),
    })?;
    let correct = current.title.as_str();

    let same_group = distinct_titles(pool, current_index, correct, |item| {
        item.group_key == current.group_key
    });
    let other_group = distinct_titles(pool, current_index, correct, |item| {
        item.group_key != current.group_key
    });

    let mut distractors = same_group.clone();
    distractors.shuffle(rng);
    if distractors.len() < DISTRACTORS {
        let mut shuffled_other = other_group.clone();
        shuffled_other.shuffle(rng);
        distractors.extend(shuffled_other);
    }
    distractors.truncate(DISTRACTORS);

    // A title can live in both tiers when two manufacturers share it.
    let mut seen = HashSet::new();
    distractors.retain(|title| seen.insert(*title));
    debug_assert!(distractors.iter().all(|title| *title != correct));

    if distractors.len() < DISTRACTORS {
        let mut padding: Vec<&str> = same_group
            .iter()
            .chain(other_group.iter())
            .copied()
            .filter(|title| seen.insert(*title))
            .collect();
        padding.shuffle(rng);
        let missing = DISTRACTORS - distractors.len();
        distractors.extend(padding.into_iter().take(missing));
    }

    let mut choices: Vec<String> = Vec::with_capacity(distractors.len() + 1);
    choices.push(correct.to_string());
    choices.extend(distractors.iter().map(|title| title.to_string()));
    choices.shuffle(rng);

    debug!(
        "[Trivia] {:?}: {} same-group, {} other-group candidates -> {:?}",
        correct,
        same_group.len(),
        other_group.len(),
        choices
    );

    Ok(ChoiceSet {
        correct_answer: correct.to_string(),
        choices,
    })
}

/// Distinct titles (first-seen order) of every item except the current one
/// that pass `keep` and differ from the correct answer.
fn distinct_titles<'a>(
    pool: &'a [CatalogItem],
    current_index: usize,
    correct: &str,
    keep: impl Fn(&CatalogItem) -> bool,
) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    pool.iter()
        .enumerate()
        .filter(|(idx, item)| *idx != current_index && item.title != correct && keep(item))
        .map(|(_, item)| item.title.as_str())
        .filter(|title| seen.insert(*title))
        .collect()
}
