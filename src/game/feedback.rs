use unicode_segmentation::UnicodeSegmentation;

/// Judgement of one guessed letter at one position.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LetterClassification {
    /// right letter, right position
    Exact,
    /// letter occurs somewhere else in the target
    Present,
    /// letter does not occur in the target
    Absent,
}

/// Per-letter classification of one guess, one entry per letter of the target.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Feedback(Vec<LetterClassification>);

impl Feedback {
    pub fn marks(&self) -> &[LetterClassification] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_solved(&self) -> bool {
        self.0.iter().all(|m| *m == LetterClassification::Exact)
    }
}

/// Number of letters (extended grapheme clusters) in a word.
pub fn letter_count(word: &str) -> usize {
    word.graphemes(true).count()
}

/// Classify every letter of `guess` against `target`.
///
/// Both words must have the same number of letters.
///
/// A letter that is not an exact match is `Present` whenever it occurs
/// anywhere in the target, no matter how many times it was already matched.
/// Guessing `eerie` for `there` therefore marks all three `e`s.
pub fn classify(guess: &str, target: &str) -> (Feedback, bool) {
    let target: Vec<&str> = target.graphemes(true).collect();
    debug_assert_eq!(letter_count(guess), target.len());
    let marks: Vec<LetterClassification> = guess
        .graphemes(true)
        .enumerate()
        .map(|(i, letter)| {
            if target.get(i) == Some(&letter) {
                LetterClassification::Exact
            } else if target.contains(&letter) {
                LetterClassification::Present
            } else {
                LetterClassification::Absent
            }
        })
        .collect();
    let feedback = Feedback(marks);
    let won = feedback.is_solved() && feedback.len() == target.len();
    (feedback, won)
}

#[cfg(test)]
mod test_feedback {
    use super::LetterClassification::{Absent, Exact, Present};
    use super::*;

    #[test]
    fn test_shared_letters_in_and_out_of_place() {
        // `r`, `a` and `e` sit in the same positions in both words
        let (feedback, won) = classify("trace", "crate");
        assert_eq!(feedback.marks(), &[Present, Exact, Exact, Present, Exact]);
        assert!(!won);
    }

    #[test]
    fn test_exact_match() {
        let (feedback, won) = classify("audio", "audio");
        assert_eq!(feedback.marks(), &[Exact; 5]);
        assert!(won);
    }

    #[test]
    fn test_mixed() {
        let (feedback, won) = classify("cloud", "could");
        assert_eq!(feedback.marks(), &[Exact, Present, Present, Present, Exact]);
        assert!(!won);
        let (feedback, _) = classify("xyzzy", "crate");
        assert_eq!(feedback.marks(), &[Absent; 5]);
    }

    #[test]
    fn test_duplicates_are_not_depleted() {
        // `there` has two `e`s, the guess gets three `e` marks
        let (feedback, _) = classify("eerie", "there");
        assert_eq!(feedback.marks(), &[Present, Present, Present, Absent, Exact]);
    }

    #[test]
    fn test_feedback_length_and_win() {
        for target in ["a", "of", "the", "word", "crate", "planet", "letters"] {
            let (feedback, won) = classify(target, target);
            assert_eq!(feedback.len(), letter_count(target));
            assert!(feedback.is_solved());
            assert!(won);
        }
        let pairs = [("b", "a"), ("fo", "of"), ("tee", "the"), ("ward", "word"), ("stare", "crate")];
        for (guess, target) in pairs {
            let (feedback, won) = classify(guess, target);
            assert_eq!(feedback.len(), letter_count(target));
            assert!(!won);
        }
    }

    #[test]
    fn test_graphemes_are_letters() {
        assert_eq!(letter_count("café"), 4);
        assert_eq!(letter_count("cafe\u{301}"), 4);
        let (feedback, won) = classify("éclat", "élite");
        assert_eq!(feedback.len(), 5);
        assert_eq!(feedback.marks()[0], Exact);
        assert!(!won);
    }
}
