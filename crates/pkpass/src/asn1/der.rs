//! Definite-length DER writer.
//!
//! Constructed nodes are written child-first: the closure fills a scratch
//! writer, then the parent emits tag, length and the finished content. No BER
//! indefinite lengths are ever produced.
//!
//! The encoding uses the following universal tags:
//! - 0x02: INTEGER
//! - 0x04: OCTET STRING
//! - 0x05: NULL
//! - 0x06: OBJECT IDENTIFIER
//! - 0x17 / 0x18: UTCTime / GeneralizedTime
//! - 0x30: SEQUENCE
//! - 0x31: SET / SET OF
//!
//! plus context-specific constructed tags (`0xa0 | n`) for explicit tagging
//! and for `[n] IMPLICIT SET OF`.

use super::oid::Oid;
use super::time::Time;

/// DER tag for INTEGER
pub const TAG_INTEGER: u8 = 0x02;

/// DER tag for OCTET STRING
pub const TAG_OCTET_STRING: u8 = 0x04;

/// DER tag for NULL
pub const TAG_NULL: u8 = 0x05;

/// DER tag for OBJECT IDENTIFIER
pub const TAG_OID: u8 = 0x06;

/// DER tag for SEQUENCE
pub const TAG_SEQUENCE: u8 = 0x30;

/// DER tag for SET / SET OF
pub const TAG_SET: u8 = 0x31;

/// Context-specific, constructed tag `[n]`.
pub const fn context_tag(number: u8) -> u8 {
    0xa0 | (number & 0x1f)
}

/// Encode a length value in DER format.
///
/// For lengths < 128, uses short form (1 byte).
/// For lengths >= 128, uses long form (1 + n bytes).
pub fn encode_length(output: &mut Vec<u8>, length: usize) {
    if length < 128 {
        output.push(length as u8);
    } else {
        let bytes_needed = (64 - (length as u64).leading_zeros() as usize).div_ceil(8);
        output.push(0x80 | bytes_needed as u8);
        for i in (0..bytes_needed).rev() {
            output.push(((length >> (i * 8)) & 0xff) as u8);
        }
    }
}

/// Encodes a single TLV.
pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 6);
    out.push(tag);
    encode_length(&mut out, content.len());
    out.extend_from_slice(content);
    out
}

/// Runs `f` against a fresh writer and returns the bytes it produced.
pub fn encode(f: impl FnOnce(&mut DerWriter)) -> Vec<u8> {
    let mut w = DerWriter::new();
    f(&mut w);
    w.into_bytes()
}

/// Sorts complete element encodings into DER `SET OF` order: ascending by
/// encoded octets.
pub fn canonical_order(mut elements: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    elements.sort();
    elements
}

/// Appends DER nodes to a growable buffer.
///
/// # Examples
///
/// ```
/// use pkpass::asn1::{der::DerWriter, oid};
///
/// let mut w = DerWriter::new();
/// w.sequence(|w| {
///     w.oid(&oid::SHA256);
///     w.null();
/// });
/// assert_eq!(w.as_bytes()[..2], [0x30, 0x0d]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct DerWriter {
    buf: Vec<u8>,
}

impl DerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Appends an already-encoded TLV verbatim (the ASN.1 `ANY` case).
    pub fn raw(&mut self, encoded: &[u8]) {
        self.buf.extend_from_slice(encoded);
    }

    /// Appends a primitive or constructed node with the given content.
    pub fn tlv(&mut self, tag: u8, content: &[u8]) {
        self.buf.push(tag);
        encode_length(&mut self.buf, content.len());
        self.buf.extend_from_slice(content);
    }

    fn constructed(&mut self, tag: u8, f: impl FnOnce(&mut DerWriter)) {
        let content = encode(f);
        self.tlv(tag, &content);
    }

    pub fn sequence(&mut self, f: impl FnOnce(&mut DerWriter)) {
        self.constructed(TAG_SEQUENCE, f);
    }

    /// A SET whose members are emitted in the order written. Only correct
    /// for single-member sets or members already in canonical order; use
    /// [`DerWriter::set_of`] otherwise.
    pub fn set(&mut self, f: impl FnOnce(&mut DerWriter)) {
        self.constructed(TAG_SET, f);
    }

    /// `SET OF`: the elements are sorted by their encoded bytes before emission.
    pub fn set_of(&mut self, elements: Vec<Vec<u8>>) {
        self.sorted(TAG_SET, elements);
    }

    /// `[number] IMPLICIT SET OF`: same canonical ordering as
    /// [`DerWriter::set_of`], under a context-specific tag.
    pub fn implicit_set_of(&mut self, number: u8, elements: Vec<Vec<u8>>) {
        self.sorted(context_tag(number), elements);
    }

    fn sorted(&mut self, tag: u8, elements: Vec<Vec<u8>>) {
        let content = canonical_order(elements).concat();
        self.tlv(tag, &content);
    }

    /// `[number] EXPLICIT`: wraps the node(s) written by `f`.
    pub fn explicit(&mut self, number: u8, f: impl FnOnce(&mut DerWriter)) {
        self.constructed(context_tag(number), f);
    }

    pub fn integer_u64(&mut self, value: u64) {
        self.integer_unsigned(&value.to_be_bytes());
    }

    /// INTEGER from an unsigned big-endian magnitude. Redundant leading
    /// zeros are stripped and a zero byte is prepended when the high bit
    /// would otherwise mark the value negative.
    pub fn integer_unsigned(&mut self, magnitude: &[u8]) {
        let start = magnitude
            .iter()
            .position(|&b| b != 0)
            .unwrap_or(magnitude.len());
        let trimmed = &magnitude[start..];
        let mut content = Vec::with_capacity(trimmed.len() + 1);
        if trimmed.first().map_or(true, |b| b & 0x80 != 0) {
            content.push(0);
        }
        content.extend_from_slice(trimmed);
        self.tlv(TAG_INTEGER, &content);
    }

    /// INTEGER whose two's-complement content octets are already DER, such
    /// as a certificate serial number copied from its TBS structure.
    pub fn integer_raw(&mut self, content: &[u8]) {
        self.tlv(TAG_INTEGER, content);
    }

    pub fn octet_string(&mut self, bytes: &[u8]) {
        self.tlv(TAG_OCTET_STRING, bytes);
    }

    pub fn oid(&mut self, oid: &Oid) {
        self.tlv(TAG_OID, &oid.to_content_bytes());
    }

    pub fn null(&mut self) {
        self.buf.extend_from_slice(&[TAG_NULL, 0x00]);
    }

    pub fn time(&mut self, time: &Time) {
        self.tlv(time.tag(), &time.to_content_bytes());
    }

    /// `AlgorithmIdentifier { algorithm, parameters NULL }`.
    pub fn algorithm_identifier(&mut self, algorithm: &Oid) {
        self.sequence(|w| {
            w.oid(algorithm);
            w.null();
        });
    }
}
