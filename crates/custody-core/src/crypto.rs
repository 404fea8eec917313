//! Signature verification for the custody ledger.
//!
//! Identities enroll an ECDSA public key encoded as an X.509
//! SubjectPublicKeyInfo (PKIX, DER) on one of the NIST curves P-256, P-384
//! or P-521. Signatures are ECDSA over a SHA-256 digest of the message,
//! encoded as the fixed-width `r || s` concatenation for the key's curve.

use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::signature::Signer;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::spki::SubjectPublicKeyInfoRef;
use p256::pkcs8::{EncodePublicKey, ObjectIdentifier};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{KeyFormatError, Result};

/// Length of an encoded P-256 `r || s` signature.
pub const SIGNATURE_LEN: usize = 64;

/// A named curve accepted for enrolled keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    P256,
    P384,
    P521,
}

impl Curve {
    const P256_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
    const P384_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
    const P521_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

    fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        [
            (Self::P256_OID, Self::P256),
            (Self::P384_OID, Self::P384),
            (Self::P521_OID, Self::P521),
        ]
        .into_iter()
        .find_map(|(known, curve)| (known == oid).then_some(curve))
    }

    /// Size in bytes of a field element (and of each of `r` and `s`).
    pub const fn field_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// Size in bytes of an encoded `r || s` signature.
    pub const fn signature_len(self) -> usize {
        2 * self.field_len()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
enum VerifyingKey {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
    P521(p521::ecdsa::VerifyingKey),
}

/// A parsed ECDSA public key, ready for verification.
#[derive(Clone)]
pub struct EcdsaPublicKey {
    key: VerifyingKey,
    /// Uncompressed SEC1 point.
    point: Vec<u8>,
}

fn malformed(e: impl fmt::Display) -> KeyFormatError {
    KeyFormatError::Malformed(e.to_string())
}

impl EcdsaPublicKey {
    /// Parse a PKIX (SubjectPublicKeyInfo) DER encoded public key.
    ///
    /// Any algorithm other than `id-ecPublicKey` is rejected, even when the
    /// encoding itself is valid. Elliptic-curve keys on a curve other than
    /// P-256, P-384 or P-521 fail with `UnsupportedCurve`.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoRef::try_from(der).map_err(malformed)?;

        if spki.algorithm.oid != p256::elliptic_curve::ALGORITHM_OID {
            return Err(KeyFormatError::WrongAlgorithm(spki.algorithm.oid.to_string()));
        }

        let curve_oid = spki
            .algorithm
            .parameters_oid()
            .map_err(|e| KeyFormatError::Malformed(format!("missing named curve: {e}")))?;
        let curve = Curve::from_oid(curve_oid)
            .ok_or_else(|| KeyFormatError::UnsupportedCurve(curve_oid.to_string()))?;

        let sec1 = spki
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| malformed("public key bit string has unused bits"))?;

        Self::from_sec1(curve, sec1)
    }

    /// Parse a SEC1 encoded point on `curve`.
    pub fn from_sec1(curve: Curve, sec1: &[u8]) -> Result<Self> {
        let point = match curve {
            Curve::P256 => p256::PublicKey::from_sec1_bytes(sec1)
                .map_err(malformed)?
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
            Curve::P384 => p384::PublicKey::from_sec1_bytes(sec1)
                .map_err(malformed)?
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
            Curve::P521 => p521::PublicKey::from_sec1_bytes(sec1)
                .map_err(malformed)?
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
        };

        let key = match curve {
            Curve::P256 => p256::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                .map(VerifyingKey::P256)
                .map_err(malformed)?,
            Curve::P384 => p384::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                .map(VerifyingKey::P384)
                .map_err(malformed)?,
            Curve::P521 => p521::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                .map(VerifyingKey::P521)
                .map_err(malformed)?,
        };

        Ok(Self { key, point })
    }

    /// The curve this key lives on.
    pub fn curve(&self) -> Curve {
        match self.key {
            VerifyingKey::P256(_) => Curve::P256,
            VerifyingKey::P384(_) => Curve::P384,
            VerifyingKey::P521(_) => Curve::P521,
        }
    }

    /// Uncompressed SEC1 encoding of the point.
    pub fn to_sec1(&self) -> &[u8] {
        &self.point
    }

    /// Encode back to PKIX DER.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let doc = match self.curve() {
            Curve::P256 => p256::PublicKey::from_sec1_bytes(&self.point)
                .map_err(malformed)?
                .to_public_key_der(),
            Curve::P384 => p384::PublicKey::from_sec1_bytes(&self.point)
                .map_err(malformed)?
                .to_public_key_der(),
            Curve::P521 => p521::PublicKey::from_sec1_bytes(&self.point)
                .map_err(malformed)?
                .to_public_key_der(),
        }
        .map_err(malformed)?;

        Ok(doc.as_bytes().to_vec())
    }

    /// Verify a signature over a message. See [`verify`].
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let curve = self.curve();
        if signature.len() != curve.signature_len() {
            return false;
        }
        let prehash = prehash(message, curve);

        match &self.key {
            VerifyingKey::P256(key) => p256::ecdsa::Signature::from_slice(signature)
                .map_or(false, |sig| key.verify_prehash(&prehash, &sig).is_ok()),
            VerifyingKey::P384(key) => p384::ecdsa::Signature::from_slice(signature)
                .map_or(false, |sig| key.verify_prehash(&prehash, &sig).is_ok()),
            VerifyingKey::P521(key) => p521::ecdsa::Signature::from_slice(signature)
                .map_or(false, |sig| key.verify_prehash(&prehash, &sig).is_ok()),
        }
    }

    /// SEC1 point as hex, for display.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.point)
    }
}

impl PartialEq for EcdsaPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.curve() == other.curve() && self.point == other.point
    }
}

impl Eq for EcdsaPublicKey {}

impl fmt::Debug for EcdsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcdsaPub({}, {})", self.curve(), &self.to_hex()[2..18])
    }
}

/// SHA-256 digest of `message`, left-padded with zeros to the curve's field
/// size. Padding leaves the integer value of the digest unchanged.
fn prehash(message: &[u8], curve: Curve) -> Vec<u8> {
    let digest = Sha256::digest(message);
    let mut out = vec![0u8; curve.field_len().saturating_sub(digest.len())];
    out.extend_from_slice(&digest);
    out
}

/// Verify `signature` over `message` under `key`.
///
/// Never fails: a malformed signature (wrong length, out-of-range scalars)
/// simply does not verify.
pub fn verify(message: &[u8], signature: &[u8], key: &EcdsaPublicKey) -> bool {
    key.verify(message, signature)
}

/// A P-256 signing keypair.
///
/// The service itself never holds private keys; this is what enrolling
/// callers (and tests) use to produce signatures.
#[derive(Clone)]
pub struct Keypair {
    signing_key: p256::ecdsa::SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let signing_key = p256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng);
        Self { signing_key }
    }

    /// Create from a 32-byte big-endian secret scalar.
    ///
    /// Fails if the scalar is zero or not below the curve order.
    pub fn from_secret(secret: &[u8; 32]) -> Result<Self> {
        let signing_key = p256::ecdsa::SigningKey::from_slice(secret).map_err(malformed)?;
        Ok(Self { signing_key })
    }

    /// Get the public key.
    pub fn public_key(&self) -> EcdsaPublicKey {
        let key = *self.signing_key.verifying_key();
        EcdsaPublicKey {
            point: key.to_encoded_point(false).as_bytes().to_vec(),
            key: VerifyingKey::P256(key),
        }
    }

    /// The public key as PKIX DER, the form identities enroll with.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        self.signing_key
            .verifying_key()
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(malformed)
    }

    /// Sign a message, returning the 64-byte `r || s` encoding.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let sig: p256::ecdsa::Signature = self.signing_key.sign(message);
        sig.to_bytes().to_vec()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}
