//! Minimal DER reader.
//!
//! Walks definite-length TLVs without allocating. It is strict where DER is
//! strict: indefinite lengths, non-minimal length octets and multi-byte tag
//! numbers are rejected.

use super::oid::{self, Oid};
use crate::{Error, Result};

/// One decoded tag-length-value node borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub tag: u8,
    /// Content octets.
    pub content: &'a [u8],
    /// The complete encoding including tag and length.
    pub encoded: &'a [u8],
}

impl<'a> Tlv<'a> {
    pub fn is_constructed(&self) -> bool {
        self.tag & 0x20 != 0
    }

    /// Reader over this node's children.
    pub fn children(&self) -> DerReader<'a> {
        DerReader::new(self.content)
    }

    pub fn expect_oid(&self, expected: &Oid) -> Result<()> {
        if self.tag != super::der::TAG_OID {
            return Err(Error::Der(format!(
                "expected OBJECT IDENTIFIER, found tag 0x{:02x}",
                self.tag
            )));
        }
        if !expected.matches(self.content) {
            return Err(Error::Der(format!(
                "expected OID {expected}, found {}",
                oid::to_dotted(self.content).unwrap_or_else(|| "<malformed>".into())
            )));
        }
        Ok(())
    }

    /// Reads a small non-negative INTEGER such as a version field.
    pub fn small_uint(&self) -> Result<u64> {
        if self.tag != super::der::TAG_INTEGER || self.content.is_empty() {
            return Err(Error::Der("expected INTEGER".into()));
        }
        if self.content.len() > 8 || self.content[0] & 0x80 != 0 {
            return Err(Error::Der("INTEGER out of range".into()));
        }
        Ok(self
            .content
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }
}

/// Sequential reader over concatenated TLVs.
#[derive(Debug, Clone)]
pub struct DerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Reads the next TLV, whatever its tag.
    pub fn read_any(&mut self) -> Result<Tlv<'a>> {
        let start = self.pos;
        let tag = *self
            .data
            .get(start)
            .ok_or_else(|| Error::Der("unexpected end of input".into()))?;
        if tag & 0x1f == 0x1f {
            return Err(Error::Der("multi-byte tag numbers are not supported".into()));
        }

        let (length, header) = decode_length(&self.data[start + 1..])?;
        let content_start = start + 1 + header;
        let end = content_start
            .checked_add(length)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                Error::Der(format!(
                    "length {length} exceeds remaining {} bytes",
                    self.data.len() - content_start
                ))
            })?;

        self.pos = end;
        Ok(Tlv {
            tag,
            content: &self.data[content_start..end],
            encoded: &self.data[start..end],
        })
    }

    /// Reads the next TLV and checks its tag.
    pub fn read(&mut self, tag: u8) -> Result<Tlv<'a>> {
        let tlv = self.read_any()?;
        if tlv.tag != tag {
            return Err(Error::Der(format!(
                "expected tag 0x{tag:02x}, found 0x{:02x}",
                tlv.tag
            )));
        }
        Ok(tlv)
    }

    /// Reads the next TLV only if it carries `tag`.
    pub fn read_optional(&mut self, tag: u8) -> Result<Option<Tlv<'a>>> {
        if self.peek_tag() == Some(tag) {
            self.read(tag).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads every remaining TLV.
    pub fn read_all(&mut self) -> Result<Vec<Tlv<'a>>> {
        let mut items = Vec::new();
        while !self.is_empty() {
            items.push(self.read_any()?);
        }
        Ok(items)
    }

    /// Fails if unread bytes remain.
    pub fn finish(&self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Der(format!(
                "{} trailing bytes",
                self.data.len() - self.pos
            )))
        }
    }
}

/// Parses `data` as exactly one TLV with nothing after it.
pub fn parse_single(data: &[u8]) -> Result<Tlv<'_>> {
    let mut reader = DerReader::new(data);
    let tlv = reader.read_any()?;
    reader.finish()?;
    Ok(tlv)
}

/// Returns `(length, number of length octets)`.
fn decode_length(data: &[u8]) -> Result<(usize, usize)> {
    let first = *data
        .first()
        .ok_or_else(|| Error::Der("missing length".into()))?;
    if first < 0x80 {
        return Ok((usize::from(first), 1));
    }
    if first == 0x80 {
        return Err(Error::Der("indefinite length is not DER".into()));
    }

    let count = usize::from(first & 0x7f);
    if count > std::mem::size_of::<usize>() {
        return Err(Error::Der(format!("{count}-byte length is too large")));
    }
    let bytes = data
        .get(1..=count)
        .ok_or_else(|| Error::Der("truncated length".into()))?;
    if bytes[0] == 0 {
        return Err(Error::Der("non-minimal length encoding".into()));
    }
    let length = bytes
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
    if length < 0x80 {
        return Err(Error::Der("non-minimal length encoding".into()));
    }
    Ok((length, 1 + count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::der::{encode, TAG_OCTET_STRING, TAG_SEQUENCE};

    #[test]
    fn test_reads_nested() {
        let bytes = encode(|w| {
            w.sequence(|w| {
                w.integer_u64(1);
                w.octet_string(b"abc");
            })
        });
        let seq = parse_single(&bytes).unwrap();
        assert_eq!(seq.tag, TAG_SEQUENCE);
        let mut children = seq.children();
        assert_eq!(children.read_any().unwrap().small_uint().unwrap(), 1);
        assert_eq!(children.read(TAG_OCTET_STRING).unwrap().content, b"abc");
        children.finish().unwrap();
    }

    #[test]
    fn test_long_form_length() {
        let bytes = encode(|w| w.octet_string(&[7; 200]));
        let tlv = parse_single(&bytes).unwrap();
        assert_eq!(tlv.content.len(), 200);
        assert_eq!(tlv.encoded, &bytes[..]);
    }

    #[test]
    fn test_rejects_indefinite_length() {
        assert!(parse_single(&[0x30, 0x80, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_rejects_non_minimal_length() {
        assert!(parse_single(&[0x04, 0x81, 0x01, 0xff]).is_err());
        assert!(parse_single(&[0x04, 0x82, 0x00, 0x01, 0xff]).is_err());
    }

    #[test]
    fn test_rejects_truncated_and_trailing() {
        assert!(parse_single(&[0x04, 0x05, 0x01]).is_err());
        assert!(parse_single(&[0x05, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_read_optional() {
        let bytes = encode(|w| {
            w.explicit(0, |w| w.null());
            w.null();
        });
        let mut r = DerReader::new(&bytes);
        assert!(r.read_optional(0xa1).unwrap().is_none());
        assert!(r.read_optional(0xa0).unwrap().is_some());
        assert!(r.read_optional(0x05).unwrap().is_some());
        assert!(r.is_empty());
    }
}
