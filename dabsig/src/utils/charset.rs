//! Character set conversion for DAB labels and MOT content names.
//!
//! DAB text fields announce their repertoire with a 4-bit character set id
//! (ETSI TS 101 756, table 16). Only three ids appear on air in practice:
//! the EBU Latin based repertoire, UCS-2 and UTF-8.

/// Character set identifier carried in FIG1 headers and the MOT
/// ContentName parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    EbuLatin,
    Ucs2,
    Utf8,
    Unknown(u8),
}

impl From<u8> for CharacterSet {
    fn from(value: u8) -> Self {
        match value {
            0x0 => CharacterSet::EbuLatin,
            0x6 => CharacterSet::Ucs2,
            0xF => CharacterSet::Utf8,
            other => CharacterSet::Unknown(other),
        }
    }
}

/// Converts a raw label field to UTF-8.
///
/// Unknown character sets fall back to a lossy UTF-8 interpretation;
/// malformed input yields replacement characters, never an error.
pub fn convert_to_utf8(data: &[u8], charset: CharacterSet) -> String {
    match charset {
        CharacterSet::EbuLatin => data
            .iter()
            .map(|&b| EBU_LATIN_TABLE[b as usize])
            .collect(),
        CharacterSet::Ucs2 => data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .map(|cp| char::from_u32(cp as u32).unwrap_or('\u{FFFD}'))
            .collect(),
        CharacterSet::Utf8 | CharacterSet::Unknown(_) => {
            String::from_utf8_lossy(data).into_owned()
        }
    }
}

/// Converts a 16-byte label field and strips the padding spaces
/// broadcasters right-pad labels with.
pub fn convert_label(data: &[u8], charset: CharacterSet) -> String {
    let text = convert_to_utf8(data, charset);
    text.trim_end().to_string()
}

/// EBU Latin based repertoire (ETSI TS 101 756, annex C).
///
/// The lower half tracks ASCII for the printable range; control positions
/// map to space so truncated labels stay printable.
const EBU_LATIN_TABLE: [char; 256] = [
    // 0x00
    ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ',
    // 0x10
    ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ',
    // 0x20
    ' ', '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    // 0x30
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    // 0x40
    '@', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    // 0x50
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '[', '\\', ']', '^', '_',
    // 0x60
    '`', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    // 0x70
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '{', '|', '}', '~', ' ',
    // 0x80
    'á', 'à', 'é', 'è', 'í', 'ì', 'ó', 'ò', 'ú', 'ù', 'Ñ', 'Ç', 'Ş', 'β', '¡', 'Ĳ',
    // 0x90
    'â', 'ä', 'ê', 'ë', 'î', 'ï', 'ô', 'ö', 'û', 'ü', 'ñ', 'ç', 'ş', 'ğ', 'ı', 'ĳ',
    // 0xA0
    'ª', 'α', '©', '‰', 'Ǧ', 'ě', 'ň', 'ő', 'π', '€', '£', '$', '←', '↑', '→', '↓',
    // 0xB0
    'º', '¹', '²', '³', '±', 'İ', 'ń', 'ű', 'µ', '¿', '÷', '°', '¼', '½', '¾', '§',
    // 0xC0
    'Á', 'À', 'É', 'È', 'Í', 'Ì', 'Ó', 'Ò', 'Ú', 'Ù', 'Ř', 'Č', 'Š', 'Ž', 'Ð', 'Ŀ',
    // 0xD0
    'Â', 'Ä', 'Ê', 'Ë', 'Î', 'Ï', 'Ô', 'Ö', 'Û', 'Ü', 'ř', 'č', 'š', 'ž', 'đ', 'ŀ',
    // 0xE0
    'Ã', 'Å', 'Æ', 'Œ', 'ŷ', 'ý', 'Õ', 'Ø', 'Þ', 'Ŋ', 'Ŕ', 'Ć', 'Ś', 'Ź', 'Ŧ', 'ð',
    // 0xF0
    'ã', 'å', 'æ', 'œ', 'ŵ', 'ỳ', 'õ', 'ø', 'þ', 'ŋ', 'ŕ', 'ć', 'ś', 'ź', 'ŧ', 'ħ',
];

#[cfg(test)]
mod tests {
    use super::{CharacterSet, convert_label, convert_to_utf8};

    #[test]
    fn ascii_range_passes_through_ebu_latin() {
        let text = convert_to_utf8(b"Radio 1", CharacterSet::EbuLatin);
        assert_eq!(text, "Radio 1");
    }

    #[test]
    fn label_padding_is_trimmed() {
        let text = convert_label(b"BBC World Sv.   ", CharacterSet::EbuLatin);
        assert_eq!(text, "BBC World Sv.");
    }

    #[test]
    fn ucs2_big_endian_pairs() {
        let text = convert_to_utf8(&[0x00, 0x44, 0x00, 0x52], CharacterSet::Ucs2);
        assert_eq!(text, "DR");
    }

    #[test]
    fn unknown_charset_is_lossy_utf8() {
        let text = convert_to_utf8(&[0x41, 0xFF, 0x42], CharacterSet::Unknown(3));
        assert_eq!(text, "A\u{FFFD}B");
    }
}
