//! Detached CMS `SignedData` over the pass manifest.
//!
//! The structure is assembled directly from DER primitives:
//!
//! ```text
//! ContentInfo ::= SEQUENCE {
//!   contentType  signedData,
//!   content  [0] EXPLICIT SignedData }
//!
//! SignedData ::= SEQUENCE {
//!   version           1,
//!   digestAlgorithms  SET OF { sha256 NULL },
//!   encapContentInfo  SEQUENCE { data },          -- detached: no eContent
//!   certificates  [0] IMPLICIT SET OF Certificate, -- signer and intermediate
//!   signerInfos       SET OF SignerInfo }
//!
//! SignerInfo ::= SEQUENCE {
//!   version             1,
//!   sid                 IssuerAndSerialNumber,
//!   digestAlgorithm     { sha256 NULL },
//!   signedAttrs     [0] IMPLICIT SET OF Attribute,
//!   signatureAlgorithm  { rsaEncryption NULL },
//!   signature           OCTET STRING }
//! ```
//!
//! The signed attributes are exactly content-type, signing-time and
//! message-digest. The RSA signature (PKCS#1 v1.5, SHA-256) covers their
//! encoding tagged as a universal SET, while the SignerInfo carries the same
//! octets under the `[0]` tag.

use super::cert::{Certificate, SigningCredentials};
use crate::asn1::der::{encode, TAG_SET};
use crate::asn1::oid::{self, Oid};
use crate::asn1::time::Time;
use crate::{Error, Result};
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};
use std::time::SystemTime;

/// DER `DigestInfo` prefix length for SHA-256 (RFC 8017 §9.2 note 1).
const SHA256_DIGEST_INFO_LEN: usize = 19 + 32;

/// Minimum modulus size in bytes for an EMSA-PKCS1-v1_5 SHA-256 encoding.
pub const MIN_MODULUS_BYTES: usize = SHA256_DIGEST_INFO_LEN + 11;

/// The three authenticated attributes of a pass signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAttributes {
    content_type: Oid,
    signing_time: Time,
    message_digest: [u8; 32],
}

impl SignedAttributes {
    pub fn content_type(&self) -> Oid {
        self.content_type
    }

    pub fn signing_time(&self) -> Time {
        self.signing_time
    }

    pub fn message_digest(&self) -> &[u8; 32] {
        &self.message_digest
    }

    /// Each `Attribute ::= SEQUENCE { attrType, attrValues SET OF }`, in
    /// logical order (content-type, signing-time, message-digest).
    pub fn attribute_encodings(&self) -> Vec<Vec<u8>> {
        vec![
            attribute(&oid::CONTENT_TYPE, encode(|w| w.oid(&self.content_type))),
            attribute(&oid::SIGNING_TIME, encode(|w| w.time(&self.signing_time))),
            attribute(
                &oid::MESSAGE_DIGEST,
                encode(|w| w.octet_string(&self.message_digest)),
            ),
        ]
    }

    /// The attributes as a universal SET: the exact bytes that get signed.
    pub fn to_der_set(&self) -> Vec<u8> {
        encode(|w| w.set_of(self.attribute_encodings()))
    }

    /// The attributes as `[0] IMPLICIT SET OF`, as embedded in SignerInfo.
    pub fn to_der_implicit(&self) -> Vec<u8> {
        encode(|w| w.implicit_set_of(0, self.attribute_encodings()))
    }
}

fn attribute(kind: &Oid, value: Vec<u8>) -> Vec<u8> {
    encode(|w| {
        w.sequence(|w| {
            w.oid(kind);
            w.set_of(vec![value]);
        })
    })
}

/// SHA-256 of the manifest bytes.
pub fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Builds the attribute set with the current time as signing time.
pub fn build_signed_attributes(digest: [u8; 32]) -> Result<SignedAttributes> {
    build_signed_attributes_at(digest, SystemTime::now())
}

/// Builds the attribute set with an explicit signing time.
///
/// # Errors
///
/// Returns [`Error::Der`] if `signing_time` falls outside years 0-9999.
pub fn build_signed_attributes_at(
    digest: [u8; 32],
    signing_time: SystemTime,
) -> Result<SignedAttributes> {
    let signing_time = Time::from_system_time(signing_time)?;
    log::debug!(
        "cms: signing time {} as {}",
        signing_time.components(),
        match signing_time {
            Time::Utc(_) => "UTCTime",
            Time::Generalized(_) => "GeneralizedTime",
        }
    );
    Ok(SignedAttributes {
        content_type: oid::DATA,
        signing_time,
        message_digest: digest,
    })
}

/// Signs the SET encoding of `attrs` with RSASSA-PKCS1-v1_5 / SHA-256.
///
/// # Errors
///
/// Returns [`Error::Signing`] if the key's modulus is shorter than
/// [`MIN_MODULUS_BYTES`] or the RSA operation fails.
pub fn sign_attributes(attrs: &SignedAttributes, key: &RsaPrivateKey) -> Result<Vec<u8>> {
    let modulus_bytes = key.size();
    if modulus_bytes < MIN_MODULUS_BYTES {
        return Err(Error::Signing(format!(
            "RSA modulus of {} bits is too small for a SHA-256 signature (need at least {} bits)",
            modulus_bytes * 8,
            MIN_MODULUS_BYTES * 8
        )));
    }

    let signing_key = SigningKey::<Sha256>::new(key.clone());
    let signature = signing_key
        .try_sign(&attrs.to_der_set())
        .map_err(|e| Error::Signing(format!("RSA signing failed: {e}")))?;
    Ok(signature.to_vec())
}

/// Wraps the signature, attributes and certificates into a ContentInfo.
pub fn assemble(
    certificate: &Certificate,
    intermediate: &Certificate,
    attrs: &SignedAttributes,
    signature: &[u8],
) -> Vec<u8> {
    let signer_info = encode(|w| {
        w.sequence(|w| {
            w.integer_u64(1);
            w.sequence(|w| {
                w.raw(certificate.issuer_der());
                w.integer_raw(certificate.serial_der());
            });
            w.algorithm_identifier(&oid::SHA256);
            w.raw(&attrs.to_der_implicit());
            w.algorithm_identifier(&oid::RSA_ENCRYPTION);
            w.octet_string(signature);
        })
    });

    let digest_algorithm = encode(|w| w.algorithm_identifier(&oid::SHA256));
    let certificates = vec![intermediate.der().to_vec(), certificate.der().to_vec()];

    encode(|w| {
        w.sequence(|w| {
            w.oid(&oid::SIGNED_DATA);
            w.explicit(0, |w| {
                w.sequence(|w| {
                    w.integer_u64(1);
                    w.set_of(vec![digest_algorithm]);
                    w.sequence(|w| w.oid(&oid::DATA));
                    w.implicit_set_of(0, certificates);
                    w.set_of(vec![signer_info]);
                })
            });
        })
    })
}

/// Produces the detached signature for `manifest`, signed now.
///
/// # Examples
///
/// ```no_run
/// use pkpass::{crypto::cms, SigningCredentials};
///
/// let credentials = SigningCredentials::from_bytes(
///     &std::fs::read("pass.pem")?,
///     &std::fs::read("wwdr.pem")?,
///     &std::fs::read("pass.key")?,
/// )?;
/// let signature = cms::sign(br#"{"pass.json":"..."}"#, &credentials)?;
/// # Ok::<(), pkpass::Error>(())
/// ```
pub fn sign(manifest: &[u8], credentials: &SigningCredentials) -> Result<Vec<u8>> {
    sign_at(manifest, credentials, SystemTime::now())
}

/// Produces the detached signature for `manifest` with a fixed signing time.
pub fn sign_at(
    manifest: &[u8],
    credentials: &SigningCredentials,
    signing_time: SystemTime,
) -> Result<Vec<u8>> {
    let attrs = build_signed_attributes_at(digest(manifest), signing_time)?;
    let signature = sign_attributes(&attrs, credentials.private_key())?;
    let der = assemble(
        credentials.certificate(),
        credentials.intermediate(),
        &attrs,
        &signature,
    );
    log::debug!(
        "cms: {}-byte signature over {}-byte manifest",
        der.len(),
        manifest.len()
    );
    Ok(der)
}

/// Re-tags a `[0] IMPLICIT` attribute block as the universal SET it was
/// signed as.
pub(crate) fn implicit_to_set(encoded: &[u8]) -> Vec<u8> {
    let mut set = encoded.to_vec();
    if let Some(tag) = set.first_mut() {
        *tag = TAG_SET;
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::der;
    use crate::asn1::reader::parse_single;
    use std::time::{Duration, UNIX_EPOCH};

    fn fixed_attrs() -> SignedAttributes {
        let time = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        build_signed_attributes_at(digest(b"manifest"), time).unwrap()
    }

    #[test]
    fn test_digest_is_sha256() {
        assert_eq!(
            hex::encode(digest(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_attribute_order_is_canonical() {
        let attrs = fixed_attrs();
        let set = attrs.to_der_set();
        let parsed = parse_single(&set).unwrap();
        assert_eq!(parsed.tag, TAG_SET);

        let children: Vec<_> = parsed
            .children()
            .read_all()
            .unwrap()
            .into_iter()
            .map(|t| t.encoded.to_vec())
            .collect();
        let mut sorted = children.clone();
        sorted.sort();
        assert_eq!(children, sorted);
        assert_eq!(children.len(), 3);

        let mut logical = attrs.attribute_encodings();
        logical.reverse();
        assert_eq!(encode(|w| w.set_of(logical)), set);
    }

    #[test]
    fn test_implicit_and_set_share_content() {
        let attrs = fixed_attrs();
        let set = attrs.to_der_set();
        let implicit = attrs.to_der_implicit();
        assert_eq!(implicit[0], der::context_tag(0));
        assert_eq!(&set[1..], &implicit[1..]);
        assert_eq!(implicit_to_set(&implicit), set);
    }

    #[test]
    fn test_signing_time_encoding() {
        let attrs = fixed_attrs();
        assert!(matches!(attrs.signing_time(), Time::Utc(_)));
        let set = attrs.to_der_set();
        assert!(set.windows(13).any(|w| w == b"231114221320Z"));

        let time = UNIX_EPOCH + Duration::from_secs(2_524_608_000);
        let late = build_signed_attributes_at([0; 32], time).unwrap();
        assert!(matches!(late.signing_time(), Time::Generalized(_)));
    }

    #[test]
    fn test_min_modulus() {
        assert_eq!(MIN_MODULUS_BYTES, 62);
    }
}
