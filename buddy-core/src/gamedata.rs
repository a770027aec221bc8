//! Extraction of the character and fan-letter lists from the game's data
//! file. The file is a large opaque binary; everything here works on raw
//! bytes and fishes for fixed textual markers.

/// Marks a per-character gachikoi flag field name; the lowercase run in
/// front of each occurrence is the character's identifier.
const GACHIKOI_SUFFIX: &[u8] = b"Gachikoi";

/// The fan-letter name table sits between these two tokens. The start
/// marker is itself the first letter name.
const LETTER_BLOCK_START: &[u8] = b"Shrimp";
const LETTER_BLOCK_END: &[u8] = b"allFanLetters";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameData {
    /// Character identifiers in order of first appearance. Duplicates are
    /// preserved; well-formed data carries each marker exactly once.
    pub character_order: Vec<String>,
    /// Fan-letter identifiers in order of appearance, empty when either
    /// marker is missing.
    pub all_letters: Vec<String>,
}

/// Scan the full contents of the data file. Total over arbitrary bytes;
/// an unreadable file is the caller's problem.
pub fn extract(bytes: &[u8]) -> GameData {
    GameData {
        character_order: scan_character_order(bytes),
        all_letters: scan_letters(bytes),
    }
}

fn scan_character_order(bytes: &[u8]) -> Vec<String> {
    let mut order = Vec::new();
    // End of the last consumed match; a prefix run never reaches back
    // into an earlier match.
    let mut consumed = 0usize;
    let mut at = 0usize;

    while let Some(pos) = find_from(bytes, GACHIKOI_SUFFIX, at) {
        let mut start = pos;
        while start > consumed && bytes[start - 1].is_ascii_lowercase() {
            start -= 1;
        }

        if start < pos {
            order.push(String::from_utf8_lossy(&bytes[start..pos]).into_owned());
            consumed = pos + GACHIKOI_SUFFIX.len();
            at = consumed;
        } else {
            // Bare suffix with no lowercase prefix; keep scanning, the
            // next occurrence may still match.
            at = pos + 1;
        }
    }

    order
}

fn scan_letters(bytes: &[u8]) -> Vec<String> {
    let Some(start) = find_from(bytes, LETTER_BLOCK_START, 0) else {
        return Vec::new();
    };
    let Some(end) = find_from(bytes, LETTER_BLOCK_END, start) else {
        return Vec::new();
    };

    let region = &bytes[start..end];
    let mut letters = Vec::new();
    let mut i = 0usize;

    while i < region.len() {
        if region[i].is_ascii_uppercase() && i + 1 < region.len() && is_word_byte(region[i + 1]) {
            let mut j = i + 1;
            while j < region.len() && is_word_byte(region[j]) {
                j += 1;
            }
            letters.push(String::from_utf8_lossy(&region[i..j]).into_owned());
            i = j;
        } else {
            i += 1;
        }
    }

    letters
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_character_order() {
        let data = b"...xGachikoi...yGachikoi...";
        let extracted = extract(data);
        assert_eq!(extracted.character_order, vec!["x", "y"]);
    }

    #[test]
    fn keeps_duplicate_character_markers() {
        let data = b"|ameGachikoi|kiaraGachikoi|ameGachikoi|";
        let extracted = extract(data);
        assert_eq!(extracted.character_order, vec!["ame", "kiara", "ame"]);
    }

    #[test]
    fn prefix_run_stops_at_previous_match() {
        // The trailing "i" of the first match is lowercase but already
        // consumed; the second prefix must be exactly "xyz".
        let data = b"abcGachikoixyzGachikoi";
        let extracted = extract(data);
        assert_eq!(extracted.character_order, vec!["abc", "xyz"]);
    }

    #[test]
    fn bare_suffix_is_not_a_character() {
        let data = b"Gachikoi then aGachikoi";
        let extracted = extract(data);
        assert_eq!(extracted.character_order, vec!["a"]);
    }

    #[test]
    fn letters_cover_the_marker_region() {
        let data = b"junk Shrimp\x00Bloom\x00Comet99 more\x00allFanLetters tail";
        let extracted = extract(data);
        assert_eq!(extracted.all_letters, vec!["Shrimp", "Bloom", "Comet99"]);
    }

    #[test]
    fn missing_start_marker_yields_no_letters() {
        let data = b"Bloom Comet allFanLetters";
        assert!(extract(data).all_letters.is_empty());
    }

    #[test]
    fn missing_end_marker_yields_no_letters() {
        let data = b"Shrimp Bloom Comet";
        assert!(extract(data).all_letters.is_empty());
    }

    #[test]
    fn end_marker_is_searched_after_the_start() {
        let data = b"allFanLetters junk Shrimp\x00Bloom\x00allFanLetters";
        let extracted = extract(data);
        assert_eq!(extracted.all_letters, vec!["Shrimp", "Bloom"]);
    }

    #[test]
    fn single_uppercase_bytes_are_skipped() {
        let data = b"Shrimp\x00A\x00Bb\x00allFanLetters";
        let extracted = extract(data);
        assert_eq!(extracted.all_letters, vec!["Shrimp", "Bb"]);
    }

    #[test]
    fn works_on_non_utf8_bytes() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0xFF, 0xFE, 0x00]);
        data.extend_from_slice(b"guraGachikoi");
        data.extend_from_slice(&[0x80, 0x81]);
        let extracted = extract(&data);
        assert_eq!(extracted.character_order, vec!["gura"]);
    }
}
