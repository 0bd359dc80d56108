//! Header cards
//!
//! A card is one 80-character header record: keyword in columns 1-8, an
//! optional `= ` value indicator in columns 9-10, then value and comment.

use std::fmt;

use crate::fits::constants::layout::{CARD_SIZE, FIXED_VALUE_END, KEYWORD_LENGTH};
use crate::fits::errors::{CutoutError, CutoutResult};

/// One 80-character header record
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Keyword, trimmed and upper-case
    keyword: String,
    /// Full record, always exactly 80 characters
    image: String,
}

impl Card {
    /// Parse a raw 80-byte record
    pub fn parse(raw: &[u8]) -> CutoutResult<Self> {
        if raw.len() != CARD_SIZE {
            return Err(CutoutError::Format(format!("header card must be {} bytes, got {}", CARD_SIZE, raw.len())));
        }
        if let Some(bad) = raw.iter().find(|b| !(0x20..=0x7e).contains(*b)) {
            return Err(CutoutError::Format(format!("illegal byte 0x{:02x} in header card", bad)));
        }

        // Checked above: printable ASCII only
        let image = String::from_utf8_lossy(raw).into_owned();
        let keyword = image[..KEYWORD_LENGTH].trim_end().to_string();
        Ok(Card { keyword, image })
    }

    /// Build a card from a keyword and already-formatted value text
    fn with_value_text(keyword: &str, value: &str, right_justify: bool, comment: Option<&str>) -> Self {
        let mut image = format!("{:<8}= ", keyword);
        if right_justify {
            image.push_str(&format!("{:>20}", value));
        } else {
            image.push_str(value);
        }
        if let Some(comment) = comment.filter(|c| !c.is_empty()) {
            if image.len() < FIXED_VALUE_END {
                image.push_str(&" ".repeat(FIXED_VALUE_END - image.len()));
            }
            image.push_str(" / ");
            image.push_str(comment);
        }
        Card::from_image(keyword, image)
    }

    fn from_image(keyword: &str, mut image: String) -> Self {
        image.truncate(CARD_SIZE);
        if image.len() < CARD_SIZE {
            image.push_str(&" ".repeat(CARD_SIZE - image.len()));
        }
        Card { keyword: keyword.to_string(), image }
    }

    /// Integer-valued card
    pub fn integer(keyword: &str, value: i64, comment: Option<&str>) -> Self {
        Card::with_value_text(keyword, &value.to_string(), true, comment)
    }

    /// Logical-valued card
    pub fn logical(keyword: &str, value: bool, comment: Option<&str>) -> Self {
        Card::with_value_text(keyword, if value { "T" } else { "F" }, true, comment)
    }

    /// Floating-point card
    pub fn float(keyword: &str, value: f64, comment: Option<&str>) -> Self {
        Card::with_value_text(keyword, &format_float(value), true, comment)
    }

    /// Character-string card; quotes are doubled and short values padded to 8
    pub fn string(keyword: &str, value: &str, comment: Option<&str>) -> Self {
        let quoted = format!("'{:<8}'", value.replace('\'', "''"));
        Card::with_value_text(keyword, &quoted, false, comment)
    }

    /// The END card
    pub fn end() -> Self {
        Card::from_image("END", "END".to_string())
    }

    /// Keyword of this card
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Full 80-character record
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Whether columns 9-10 carry the `= ` value indicator
    pub fn has_value(&self) -> bool {
        &self.image[KEYWORD_LENGTH..KEYWORD_LENGTH + 2] == "= "
    }

    /// Split the value field into (value text, comment)
    fn split_value(&self) -> Option<(&str, Option<&str>)> {
        if !self.has_value() {
            return None;
        }
        let field = &self.image[KEYWORD_LENGTH + 2..];
        let trimmed = field.trim_start();

        if trimmed.starts_with('\'') {
            let bytes = trimmed.as_bytes();
            let mut i = 1;
            while i < bytes.len() {
                if bytes[i] == b'\'' {
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                        i += 2;
                        continue;
                    }
                    break;
                }
                i += 1;
            }
            let end = (i + 1).min(trimmed.len());
            let rest = &trimmed[end..];
            let comment = rest.find('/').map(|p| rest[p + 1..].trim());
            Some((&trimmed[..end], comment))
        } else {
            match trimmed.find('/') {
                Some(p) => Some((trimmed[..p].trim(), Some(trimmed[p + 1..].trim()))),
                None => Some((trimmed.trim(), None)),
            }
        }
    }

    /// Raw value text (quotes included for strings)
    pub fn value_text(&self) -> Option<&str> {
        self.split_value().map(|(v, _)| v)
    }

    /// Comment following the value, if any
    pub fn comment(&self) -> Option<&str> {
        self.split_value().and_then(|(_, c)| c).filter(|c| !c.is_empty())
    }

    /// Value as an integer
    pub fn as_integer(&self) -> Option<i64> {
        self.value_text()?.parse::<i64>().ok()
    }

    /// Value as a float; accepts `D` exponents and integer text
    pub fn as_float(&self) -> Option<f64> {
        let text = self.value_text()?.replace(&['D', 'd'][..], "E");
        text.parse::<f64>().ok()
    }

    /// Value as a logical
    pub fn as_logical(&self) -> Option<bool> {
        match self.value_text()? {
            "T" => Some(true),
            "F" => Some(false),
            _ => None,
        }
    }

    /// Value as a string: quotes stripped, `''` unescaped, trailing blanks trimmed
    pub fn as_string(&self) -> Option<String> {
        let text = self.value_text()?;
        if text.len() < 2 || !text.starts_with('\'') || !text.ends_with('\'') {
            return None;
        }
        Some(text[1..text.len() - 1].replace("''", "'").trim_end().to_string())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.image.trim_end())
    }
}

/// Format a real value so it always reads back as a float
fn format_float(value: f64) -> String {
    let text = format!("{:?}", value).replace('e', "E");
    if text.contains('.') || text.contains('E') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{}.0", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> Vec<u8> {
        format!("{:<80}", text).into_bytes()
    }

    #[test]
    fn test_parse_integer_card() {
        let card = Card::parse(&raw("NAXIS1  =                  500 / length of data axis 1")).unwrap();
        assert_eq!(card.keyword(), "NAXIS1");
        assert_eq!(card.as_integer(), Some(500));
        assert_eq!(card.comment(), Some("length of data axis 1"));
    }

    #[test]
    fn test_parse_string_with_slash_and_quote() {
        let card = Card::parse(&raw("EXTNAME = 'SCI/a''b '           / the name")).unwrap();
        assert_eq!(card.as_string(), Some("SCI/a'b".to_string()));
        assert_eq!(card.comment(), Some("the name"));
    }

    #[test]
    fn test_parse_logical_and_float() {
        let simple = Card::parse(&raw("SIMPLE  =                    T")).unwrap();
        assert_eq!(simple.as_logical(), Some(true));

        let crpix = Card::parse(&raw("CRPIX1  =           1.2500D+02")).unwrap();
        assert_eq!(crpix.as_float(), Some(125.0));
        assert_eq!(crpix.as_integer(), None);
    }

    #[test]
    fn test_commentary_card_has_no_value() {
        let card = Card::parse(&raw("COMMENT   this = not a value")).unwrap();
        assert!(!card.has_value());
        assert_eq!(card.value_text(), None);
    }

    #[test]
    fn test_rejects_non_ascii() {
        let mut bytes = raw("OBJECT  = 'M31'");
        bytes[20] = 0xC3;
        assert!(Card::parse(&bytes).is_err());
    }

    #[test]
    fn test_built_cards_read_back() {
        let card = Card::integer("NAXIS2", 150, Some("cutout"));
        assert_eq!(card.image().len(), 80);
        assert_eq!(&card.image()[..30], "NAXIS2  =                  150");
        assert_eq!(card.as_integer(), Some(150));
        assert_eq!(card.comment(), Some("cutout"));

        let name = Card::string("XTENSION", "IMAGE", None);
        assert_eq!(&name.image()[..20], "XTENSION= 'IMAGE   '");
        assert_eq!(name.as_string(), Some("IMAGE".to_string()));

        let real = Card::float("CDELT1", -2.0, None);
        assert_eq!(real.as_float(), Some(-2.0));
        assert_eq!(real.value_text(), Some("-2.0"));

        assert_eq!(Card::logical("EXTEND", true, None).as_logical(), Some(true));
        assert_eq!(Card::end().image().trim_end(), "END");
    }
}
