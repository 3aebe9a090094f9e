//! Decoding and checking detached pass signatures.
//!
//! [`parse_signature`] accepts the single-signer, issuer-and-serial form of
//! CMS `SignedData` that [`super::cms::sign`] produces. Anything outside that
//! profile (embedded content, multiple signers, unknown digest algorithms)
//! is rejected with [`Error::Der`] or [`Error::Verification`].

use super::cert::Certificate;
use super::cms::{digest, implicit_to_set};
use crate::asn1::der::{
    context_tag, TAG_INTEGER, TAG_OCTET_STRING, TAG_OID, TAG_SEQUENCE, TAG_SET,
};
use crate::asn1::oid;
use crate::asn1::reader::{parse_single, DerReader, Tlv};
use crate::asn1::time::Time;
use crate::{Error, Result};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use sha2::Sha256;

/// The decoded contents of a `signature` entry.
#[derive(Debug, Clone)]
pub struct SignatureInfo {
    /// Certificates embedded in the SignedData, in encoded order.
    pub certificates: Vec<Certificate>,
    /// Signer issuer `Name` TLV.
    pub issuer: Vec<u8>,
    /// Signer serial number content octets.
    pub serial: Vec<u8>,
    pub signing_time: Option<Time>,
    pub message_digest: Vec<u8>,
    /// The signed attributes re-tagged as SET: the bytes the signature covers.
    pub signed_attributes: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignatureInfo {
    /// The embedded certificate named by the signer identifier.
    pub fn signer_certificate(&self) -> Option<&Certificate> {
        self.certificates
            .iter()
            .find(|c| c.matches_identifier(&self.issuer, &self.serial))
    }

    /// Checks the signature against `content` (the manifest bytes).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Verification`] if the message digest does not match
    /// `content`, the signer certificate is missing, or the RSA signature
    /// does not verify.
    pub fn verify(&self, content: &[u8]) -> Result<()> {
        if self.message_digest != digest(content) {
            return Err(Error::Verification(
                "message digest does not match the signed content".into(),
            ));
        }

        let certificate = self.signer_certificate().ok_or_else(|| {
            Error::Verification("signer certificate is not embedded in the signature".into())
        })?;
        let key = VerifyingKey::<Sha256>::new(certificate.public_key()?);
        let signature = Signature::try_from(self.signature.as_slice())
            .map_err(|e| Error::Verification(format!("malformed RSA signature: {e}")))?;
        key.verify(&self.signed_attributes, &signature)
            .map_err(|_| Error::Verification("RSA signature does not verify".into()))?;

        log::debug!(
            "verify: signature by {:?} is valid",
            certificate.common_name()
        );
        Ok(())
    }
}

/// Decodes a DER `ContentInfo` holding a detached `SignedData`.
pub fn parse_signature(der: &[u8]) -> Result<SignatureInfo> {
    let content_info = parse_single(der)?;
    expect_tag(&content_info, TAG_SEQUENCE)?;
    let mut ci = content_info.children();
    ci.read(TAG_OID)?.expect_oid(&oid::SIGNED_DATA)?;
    let explicit = ci.read(context_tag(0))?;
    ci.finish()?;

    let mut wrapper = explicit.children();
    let signed_data = wrapper.read(TAG_SEQUENCE)?;
    wrapper.finish()?;

    let mut sd = signed_data.children();
    let version = sd.read(TAG_INTEGER)?.small_uint()?;
    if version != 1 {
        return Err(Error::Verification(format!(
            "unsupported SignedData version {version}"
        )));
    }

    let digest_algorithms = sd.read(TAG_SET)?;
    let mut has_sha256 = false;
    for alg in digest_algorithms.children().read_all()? {
        has_sha256 |= is_algorithm(&alg, &oid::SHA256)?;
    }
    if !has_sha256 {
        return Err(Error::Verification("SHA-256 is not among the digest algorithms".into()));
    }

    let encap = sd.read(TAG_SEQUENCE)?;
    let mut ec = encap.children();
    ec.read(TAG_OID)?.expect_oid(&oid::DATA)?;
    if !ec.is_empty() {
        return Err(Error::Verification(
            "signature embeds content; a detached signature is required".into(),
        ));
    }

    let mut certificates = Vec::new();
    if let Some(certs) = sd.read_optional(context_tag(0))? {
        for cert in certs.children().read_all()? {
            certificates.push(Certificate::from_der(cert.encoded)?);
        }
    }
    // CRLs are not used by passes but are legal here.
    sd.read_optional(context_tag(1))?;

    let signer_infos = sd.read(TAG_SET)?;
    sd.finish()?;
    let infos = signer_infos.children().read_all()?;
    let [signer_info] = infos.as_slice() else {
        return Err(Error::Verification(format!(
            "expected exactly one signer, found {}",
            infos.len()
        )));
    };

    parse_signer_info(signer_info, certificates)
}

fn parse_signer_info(
    signer_info: &Tlv<'_>,
    certificates: Vec<Certificate>,
) -> Result<SignatureInfo> {
    expect_tag(signer_info, TAG_SEQUENCE)?;
    let mut si = signer_info.children();
    let version = si.read(TAG_INTEGER)?.small_uint()?;
    if version != 1 {
        return Err(Error::Verification(format!(
            "signer identifier version {version} is not issuer-and-serial-number"
        )));
    }

    let sid = si.read(TAG_SEQUENCE)?;
    let mut sid_fields = sid.children();
    let issuer = sid_fields.read(TAG_SEQUENCE)?.encoded.to_vec();
    let serial = sid_fields.read(TAG_INTEGER)?.content.to_vec();
    sid_fields.finish()?;

    let digest_alg = si.read(TAG_SEQUENCE)?;
    if !is_algorithm(&digest_alg, &oid::SHA256)? {
        return Err(Error::Verification("signer digest algorithm is not SHA-256".into()));
    }

    let attrs = si
        .read_optional(context_tag(0))?
        .ok_or_else(|| Error::Verification("signature has no signed attributes".into()))?;
    let (signing_time, message_digest) = parse_attributes(attrs.children())?;

    let signature_alg = si.read(TAG_SEQUENCE)?;
    if !(is_algorithm(&signature_alg, &oid::RSA_ENCRYPTION)?
        || is_algorithm(&signature_alg, &oid::SHA256_WITH_RSA)?)
    {
        return Err(Error::Verification("signature algorithm is not RSA".into()));
    }
    let signature = si.read(TAG_OCTET_STRING)?.content.to_vec();
    // Unsigned attributes, if any, are ignored.
    si.read_optional(context_tag(1))?;
    si.finish()?;

    Ok(SignatureInfo {
        certificates,
        issuer,
        serial,
        signing_time,
        message_digest,
        signed_attributes: implicit_to_set(attrs.encoded),
        signature,
    })
}

fn parse_attributes(mut attrs: DerReader<'_>) -> Result<(Option<Time>, Vec<u8>)> {
    let mut content_type_ok = false;
    let mut signing_time = None;
    let mut message_digest = None;

    while !attrs.is_empty() {
        let attr = attrs.read(TAG_SEQUENCE)?;
        let mut fields = attr.children();
        let kind = fields.read(TAG_OID)?;
        let values = fields.read(TAG_SET)?;
        fields.finish()?;
        let mut values = values.children();
        let value = values.read_any()?;
        values.finish()?;

        if oid::CONTENT_TYPE.matches(kind.content) {
            value.expect_oid(&oid::DATA)?;
            content_type_ok = true;
        } else if oid::SIGNING_TIME.matches(kind.content) {
            signing_time = Some(Time::parse(value.tag, value.content)?);
        } else if oid::MESSAGE_DIGEST.matches(kind.content) {
            expect_tag(&value, TAG_OCTET_STRING)?;
            message_digest = Some(value.content.to_vec());
        } else {
            log::debug!(
                "verify: ignoring signed attribute {}",
                oid::to_dotted(kind.content).unwrap_or_default()
            );
        }
    }

    if !content_type_ok {
        return Err(Error::Verification("content-type attribute is missing".into()));
    }
    let message_digest = message_digest
        .ok_or_else(|| Error::Verification("message-digest attribute is missing".into()))?;
    Ok((signing_time, message_digest))
}

fn is_algorithm(alg: &Tlv<'_>, expected: &oid::Oid) -> Result<bool> {
    expect_tag(alg, TAG_SEQUENCE)?;
    let mut fields = alg.children();
    let id = fields.read(TAG_OID)?;
    Ok(expected.matches(id.content))
}

fn expect_tag(tlv: &Tlv<'_>, tag: u8) -> Result<()> {
    if tlv.tag == tag {
        Ok(())
    } else {
        Err(Error::Der(format!(
            "expected tag 0x{tag:02x}, found 0x{:02x}",
            tlv.tag
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_signed_data() {
        let der = crate::asn1::der::encode(|w| {
            w.sequence(|w| {
                w.oid(&oid::DATA);
                w.explicit(0, |w| w.octet_string(b"x"));
            })
        });
        assert!(parse_signature(&der).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(parse_signature(b"\x30\x80"), Err(Error::Der(_))));
        assert!(parse_signature(&[]).is_err());
    }
}
