//! Guess normalization and matching against the current track.

/// Which parts of the track a submission matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerMatch {
    /// The normalized submission contains the normalized title.
    pub title: bool,
    /// The normalized submission contains the normalized artist name.
    pub artist: bool,
}

impl AnswerMatch {
    /// Full credit requires both parts, in any order.
    pub fn full(&self) -> bool {
        self.title && self.artist
    }
}

/// Evaluate a submission against the current track's title and artist.
pub fn evaluate(submission: &str, title: &str, artist: &str) -> AnswerMatch {
    let guess = normalize(submission);
    let title = normalize(title);
    let artist = normalize(artist);

    AnswerMatch {
        title: !title.is_empty() && guess.contains(&title),
        artist: !artist.is_empty() && guess.contains(&artist),
    }
}

/// Canonical form used on both sides of the comparison: case-folded,
/// diacritics stripped, `&` mapped to the word `e`, punctuation treated as
/// spacing, whitespace collapsed.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '&' {
            folded.push_str(" e ");
            continue;
        }
        for lower in c.to_lowercase() {
            let base = strip_diacritic(lower);
            if base.is_ascii_alphanumeric() {
                folded.push(base);
            } else {
                // Punctuation and symbols separate words the same way
                // whitespace does, so hyphenated titles still match their
                // spaced spellings.
                folded.push(' ');
            }
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map accented Latin letters to their ASCII base. Covers the ranges that
/// show up in catalog metadata; anything else passes through unchanged.
fn strip_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_accents_case_and_punctuation() {
        assert_eq!(normalize("  Não-Para!!  "), "nao para");
        assert_eq!(normalize("BOHEMIAN Rhapsody"), "bohemian rhapsody");
        assert_eq!(normalize("Beyoncé"), "beyonce");
    }

    #[test]
    fn ampersand_becomes_the_word_e() {
        assert_eq!(normalize("Simon & Garfunkel"), "simon e garfunkel");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(normalize("a   b\t c"), "a b c");
    }

    #[test]
    fn hyphenated_title_matches_its_spaced_spelling() {
        let result = evaluate("banda nao para", "Não-Para", "Banda");
        assert!(result.title);
        assert!(result.full());
    }

    #[test]
    fn both_parts_in_any_order_score_full() {
        let result = evaluate("queen bohemian rhapsody", "Bohemian Rhapsody", "Queen");
        assert!(result.title);
        assert!(result.artist);
        assert!(result.full());

        let reversed = evaluate("bohemian rhapsody queen", "Bohemian Rhapsody", "Queen");
        assert!(reversed.full());
    }

    #[test]
    fn single_part_is_not_full_credit() {
        let title_only = evaluate("bohemian rhapsody", "Bohemian Rhapsody", "Queen");
        assert!(title_only.title);
        assert!(!title_only.artist);
        assert!(!title_only.full());

        let artist_only = evaluate("queen", "Bohemian Rhapsody", "Queen");
        assert!(!artist_only.title);
        assert!(artist_only.artist);
        assert!(!artist_only.full());
    }

    #[test]
    fn accents_and_punctuation_do_not_block_a_match() {
        let result = evaluate("evidencias chitaozinho e xororo", "Evidências", "Chitãozinho & Xororó");
        assert!(result.full());
    }

    #[test]
    fn empty_fields_never_match() {
        let result = evaluate("anything", "", "Queen");
        assert!(!result.title);
    }
}
