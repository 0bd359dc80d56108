//! FITS headers
//!
//! A [`Header`] is the ordered list of cards before `END`. Reading consumes
//! whole 2880-byte blocks; writing pads with blanks back to a block
//! boundary.

use log::trace;
use std::io::Read;

use crate::fits::card::Card;
use crate::fits::constants::keywords;
use crate::fits::constants::layout::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
use crate::fits::constants::padded_len;
use crate::fits::errors::{CutoutError, CutoutResult};

/// Ordered header cards, `END` excluded
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    /// Header from a list of cards
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Header { cards }
    }

    /// Read a header block by block up to and including the `END` card
    ///
    /// Returns the header and the number of bytes consumed (a multiple of
    /// 2880).
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> CutoutResult<(Header, u64)> {
        let mut cards = Vec::new();
        let mut block = vec![0u8; BLOCK_SIZE];
        let mut consumed = 0u64;

        loop {
            if let Err(e) = reader.read_exact(&mut block) {
                let error = CutoutError::from(e);
                return Err(match error {
                    CutoutError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => CutoutError::Format(
                        format!("header truncated after {} bytes without END card", consumed),
                    ),
                    other => other,
                });
            }
            consumed += BLOCK_SIZE as u64;

            for i in 0..CARDS_PER_BLOCK {
                let raw = &block[i * CARD_SIZE..(i + 1) * CARD_SIZE];
                let card = Card::parse(raw)?;
                if card.keyword() == keywords::END {
                    trace!("END found after {} cards", cards.len());
                    return Ok((Header { cards }, consumed));
                }
                cards.push(card);
            }
        }
    }

    /// All cards in order
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards, `END` excluded
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the header has no cards
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Index of the first card with `keyword`
    pub fn position(&self, keyword: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.keyword() == keyword)
    }

    /// First card with `keyword`
    pub fn get(&self, keyword: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.keyword() == keyword)
    }

    pub fn get_integer(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(Card::as_integer)
    }

    pub fn get_float(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(Card::as_float)
    }

    pub fn get_logical(&self, keyword: &str) -> Option<bool> {
        self.get(keyword).and_then(Card::as_logical)
    }

    pub fn get_string(&self, keyword: &str) -> Option<String> {
        self.get(keyword).and_then(Card::as_string)
    }

    /// Integer keyword that must be present
    pub fn required_integer(&self, keyword: &str) -> CutoutResult<i64> {
        match self.get(keyword) {
            None => Err(CutoutError::Format(format!("missing required keyword {}", keyword))),
            Some(card) => card.as_integer().ok_or_else(|| {
                CutoutError::Format(format!("keyword {} is not an integer: {}", keyword, card))
            }),
        }
    }

    /// Replace the first card with the same keyword, or insert at `fallback_index`
    pub fn set(&mut self, card: Card, fallback_index: usize) {
        match self.position(card.keyword()) {
            Some(i) => self.cards[i] = card,
            None => {
                let at = fallback_index.min(self.cards.len());
                self.cards.insert(at, card);
            }
        }
    }

    /// Replace the card at `index`
    pub fn replace_at(&mut self, index: usize, card: Card) {
        self.cards[index] = card;
    }

    /// Insert a card at `index`
    pub fn insert(&mut self, index: usize, card: Card) {
        let at = index.min(self.cards.len());
        self.cards.insert(at, card);
    }

    /// Remove every card with `keyword`; returns how many were removed
    pub fn remove(&mut self, keyword: &str) -> usize {
        let before = self.cards.len();
        self.cards.retain(|c| c.keyword() != keyword);
        before - self.cards.len()
    }

    /// Remove every card whose keyword matches `predicate`
    pub fn remove_where<F: Fn(&str) -> bool>(&mut self, predicate: F) {
        self.cards.retain(|c| !predicate(c.keyword()));
    }

    /// Serialized size, including `END` and padding
    pub fn byte_len(&self) -> u64 {
        padded_len(((self.cards.len() + 1) * CARD_SIZE) as u64)
    }

    /// Serialize as FITS: cards, `END`, blanks to the block boundary
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len() as usize);
        for card in &self.cards {
            out.extend_from_slice(card.image().as_bytes());
        }
        out.extend_from_slice(Card::end().image().as_bytes());
        out.resize(self.byte_len() as usize, b' ');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(cards: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for card in cards {
            out.extend_from_slice(format!("{:<80}", card).as_bytes());
        }
        out.resize(padded_len(out.len() as u64) as usize, b' ');
        out
    }

    #[test]
    fn test_read_single_block() {
        let bytes = header_bytes(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    0",
            "END",
        ]);
        let (header, consumed) = Header::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(consumed, 2880);
        assert_eq!(header.len(), 3);
        assert_eq!(header.get_integer("BITPIX"), Some(16));
        assert_eq!(header.get_logical("SIMPLE"), Some(true));
    }

    #[test]
    fn test_read_spans_blocks() {
        let mut cards: Vec<String> = vec!["SIMPLE  =                    T".into()];
        for i in 0..40 {
            cards.push(format!("HISTORY line {}", i));
        }
        cards.push("END".into());
        let refs: Vec<&str> = cards.iter().map(|s| s.as_str()).collect();

        let (header, consumed) = Header::read_from(&mut Cursor::new(header_bytes(&refs))).unwrap();
        assert_eq!(consumed, 5760);
        assert_eq!(header.len(), 41);
        assert_eq!(header.byte_len(), 5760);
    }

    #[test]
    fn test_missing_end_is_format_error() {
        let bytes = header_bytes(&["SIMPLE  =                    T"]);
        let err = Header::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), crate::fits::errors::ErrorKind::Format);
    }

    #[test]
    fn test_set_remove_and_serialize() {
        let mut header = Header::from_cards(vec![
            Card::logical("SIMPLE", true, None),
            Card::integer("BITPIX", 8, None),
            Card::integer("NAXIS", 1, None),
            Card::integer("NAXIS1", 10, None),
            Card::string("CHECKSUM", "abc", None),
        ]);

        header.set(Card::integer("NAXIS1", 4, None), 0);
        header.set(Card::logical("EXTEND", true, None), 4);
        assert_eq!(header.remove("CHECKSUM"), 1);

        assert_eq!(header.get_integer("NAXIS1"), Some(4));
        assert_eq!(header.position("EXTEND"), Some(4));
        assert!(header.required_integer("NAXIS2").is_err());

        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), 2880);
        let (back, _) = Header::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(back, header);
    }
}
