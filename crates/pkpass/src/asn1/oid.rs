//! Well-known object identifiers used by the CMS signer.

use std::fmt;

/// An ASN.1 OBJECT IDENTIFIER stored as its arc list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: &'static [u64],
}

/// PKCS#7 `data` content type (1.2.840.113549.1.7.1).
pub const DATA: Oid = Oid::new(&[1, 2, 840, 113549, 1, 7, 1]);

/// CMS `signedData` content type (1.2.840.113549.1.7.2).
pub const SIGNED_DATA: Oid = Oid::new(&[1, 2, 840, 113549, 1, 7, 2]);

/// `contentType` signed attribute (1.2.840.113549.1.9.3).
pub const CONTENT_TYPE: Oid = Oid::new(&[1, 2, 840, 113549, 1, 9, 3]);

/// `messageDigest` signed attribute (1.2.840.113549.1.9.4).
pub const MESSAGE_DIGEST: Oid = Oid::new(&[1, 2, 840, 113549, 1, 9, 4]);

/// `signingTime` signed attribute (1.2.840.113549.1.9.5).
pub const SIGNING_TIME: Oid = Oid::new(&[1, 2, 840, 113549, 1, 9, 5]);

/// SHA-256 digest algorithm (2.16.840.1.101.3.4.2.1).
pub const SHA256: Oid = Oid::new(&[2, 16, 840, 1, 101, 3, 4, 2, 1]);

/// `rsaEncryption` (1.2.840.113549.1.1.1).
pub const RSA_ENCRYPTION: Oid = Oid::new(&[1, 2, 840, 113549, 1, 1, 1]);

/// `sha256WithRSAEncryption` (1.2.840.113549.1.1.11), accepted on the read path.
pub const SHA256_WITH_RSA: Oid = Oid::new(&[1, 2, 840, 113549, 1, 1, 11]);

impl Oid {
    /// Creates an identifier from its arcs. The first two arcs must form a
    /// valid root (`0.x`/`1.x` with `x < 40`, or `2.x`).
    pub const fn new(arcs: &'static [u64]) -> Self {
        Oid { arcs }
    }

    pub fn arcs(&self) -> &'static [u64] {
        self.arcs
    }

    /// Content octets (without tag and length): the first two arcs are
    /// folded into one subidentifier, each subidentifier is base-128 with
    /// the high bit set on every byte but the last.
    pub fn to_content_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.arcs.len() + 4);
        let (first, rest) = match self.arcs {
            [a, b, rest @ ..] => (a * 40 + b, rest),
            [a] => (a * 40, &[][..]),
            [] => return out,
        };
        push_base128(&mut out, first);
        for &arc in rest {
            push_base128(&mut out, arc);
        }
        out
    }

    /// Compares against DER content octets without allocating an owned OID.
    pub fn matches(&self, content: &[u8]) -> bool {
        self.to_content_bytes() == content
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in self.arcs {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
            first = false;
        }
        Ok(())
    }
}

fn push_base128(out: &mut Vec<u8>, mut value: u64) {
    let mut tmp = [0u8; 10];
    let mut i = tmp.len();
    loop {
        i -= 1;
        tmp[i] = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    let last = tmp.len() - 1;
    for (idx, byte) in tmp.iter().enumerate().skip(i) {
        out.push(if idx == last { *byte } else { byte | 0x80 });
    }
}

/// Decodes OID content octets into dotted notation, for diagnostics.
pub fn to_dotted(content: &[u8]) -> Option<String> {
    let mut arcs = Vec::new();
    let mut value: u64 = 0;
    for (i, &byte) in content.iter().enumerate() {
        if value == 0 && byte == 0x80 {
            return None;
        }
        value = value.checked_mul(128)? | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            if arcs.is_empty() {
                let (a, b) = match value {
                    0..=39 => (0, value),
                    40..=79 => (1, value - 40),
                    _ => (2, value - 80),
                };
                arcs.push(a);
                arcs.push(b);
            } else {
                arcs.push(value);
            }
            value = 0;
        } else if i == content.len() - 1 {
            return None;
        }
    }
    if arcs.is_empty() {
        return None;
    }
    Some(
        arcs.iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join("."),
    )
}
