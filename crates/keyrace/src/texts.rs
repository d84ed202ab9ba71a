//! Race passage selection.
//!
//! Which passage a room races against is a content decision, not a
//! protocol one; the bank is swappable through the server builder, and
//! a room only ever sees the final string.

use rand::Rng;

/// Built-in passages, used when no custom bank is supplied.
const DEFAULT_PASSAGES: &[&str] = &[
    "Speed at the keyboard comes from rhythm rather than force. Relax \
     your hands, keep your eyes on the words ahead of your cursor, and \
     let the mistakes teach your fingers where the keys really are.",
    "A good program reads like an explanation of itself. Names carry \
     meaning, functions stay small, and anyone who opens the file a \
     year later can follow the thought that shaped it without a guide.",
    "Practice rewards the patient. Improvement hides in sessions that \
     feel ordinary, and only when you look back across the weeks do \
     you notice how far the baseline has quietly moved.",
    "The shortest route between two ideas is a sentence that wastes no \
     words. Cut what repeats, keep what surprises, and the reader will \
     arrive before they notice they were traveling.",
    "Every race begins the same way: a held breath, a countdown, and \
     the first clean keystroke. What separates the fast from the \
     frantic is the refusal to hurry past an error instead of fixing it.",
];

/// A pool of race passages, sampled uniformly per room.
#[derive(Debug, Clone)]
pub struct TextBank {
    passages: Vec<String>,
}

impl TextBank {
    /// A bank holding the built-in passages.
    pub fn new() -> Self {
        Self {
            passages: DEFAULT_PASSAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// A bank over custom passages. An empty list falls back to the
    /// built-ins; a room must always have a text.
    pub fn with_passages(passages: Vec<String>) -> Self {
        if passages.is_empty() {
            Self::new()
        } else {
            Self { passages }
        }
    }

    /// Picks the passage for a new room.
    pub fn pick(&self) -> String {
        let idx = rand::rng().random_range(0..self.passages.len());
        self.passages[idx].clone()
    }
}

impl Default for TextBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_returns_a_member_of_the_bank() {
        let bank = TextBank::new();
        let text = bank.pick();
        assert!(DEFAULT_PASSAGES.contains(&text.as_str()));
    }

    #[test]
    fn test_custom_passages_are_used() {
        let bank =
            TextBank::with_passages(vec!["only one".to_string()]);
        assert_eq!(bank.pick(), "only one");
    }

    #[test]
    fn test_empty_bank_falls_back_to_builtins() {
        let bank = TextBank::with_passages(Vec::new());
        assert!(DEFAULT_PASSAGES.contains(&bank.pick().as_str()));
    }
}
