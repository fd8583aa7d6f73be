//! Emoji marker tallies.
//!
//! Week sheets record behavior incidents as colored square emoji typed into
//! the weekday cells. A tally counts one marker across the concatenated
//! cells of a behavior row using the UTF-16 length identity that the summary
//! formulas rely on:
//!
//! `occurrences = (len(concat) - len(concat without marker)) / 2`
//!
//! # Invariants
//! - Every marker glyph is exactly two UTF-16 code units.

use serde::{Deserialize, Serialize};

/// Marker colors tracked on the summary sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmojiColor {
    Blue,
    Orange,
    Red,
}

impl EmojiColor {
    /// Summary column order: blue, orange, red.
    pub const ALL: [EmojiColor; 3] = [Self::Blue, Self::Orange, Self::Red];

    /// Marker glyph typed by staff.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Blue => "\u{1F7E6}",
            Self::Orange => "\u{1F7E7}",
            Self::Red => "\u{1F7E5}",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

/// Length of `text` in UTF-16 code units, as spreadsheet `LEN` reports it.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Counts `color` markers in one concatenated behavior row.
pub fn count_markers(text: &str, color: EmojiColor) -> usize {
    let stripped = text.replace(color.symbol(), "");
    (utf16_len(text) - utf16_len(&stripped)) / 2
}

/// Sums marker counts across several week sheets.
///
/// Each item holds the weekday cell texts of the same behavior row on one
/// week sheet; cells are concatenated before counting.
pub fn tally_across_weeks<I, S>(weeks: I, color: EmojiColor) -> usize
where
    I: IntoIterator<Item = Vec<S>>,
    S: AsRef<str>,
{
    weeks
        .into_iter()
        .map(|cells| {
            let joined: String = cells.iter().map(AsRef::as_ref).collect();
            count_markers(&joined, color)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::{count_markers, tally_across_weeks, utf16_len, EmojiColor};

    #[test]
    fn every_marker_is_two_utf16_units() {
        for color in EmojiColor::ALL {
            assert_eq!(utf16_len(color.symbol()), 2, "{}", color.as_str());
        }
    }

    #[test]
    fn counts_only_the_requested_color() {
        let text = "\u{1F7E6}\u{1F7E6}\u{1F7E5}";
        assert_eq!(count_markers(text, EmojiColor::Blue), 2);
        assert_eq!(count_markers(text, EmojiColor::Red), 1);
        assert_eq!(count_markers(text, EmojiColor::Orange), 0);
    }

    #[test]
    fn tally_sums_across_week_sheets() {
        let weeks = vec![
            vec!["\u{1F7E6}\u{1F7E6}\u{1F7E5}", "", "", "", ""],
            vec!["", "\u{1F7E6}", "", "", ""],
        ];
        assert_eq!(tally_across_weeks(weeks, EmojiColor::Blue), 3);
    }

    #[test]
    fn plain_text_and_numbers_do_not_count() {
        assert_eq!(count_markers("3 incidents", EmojiColor::Blue), 0);
    }
}
