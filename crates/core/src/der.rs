//! Strict DER encoding for secp256k1 ECDSA signatures.
//!
//! The only accepted layout is
//!
//! ```text
//! 0x30 <len> 0x02 <r_len> <r> 0x02 <s_len> <s>
//! ```
//!
//! with short-form lengths that account for every byte of the input and
//! minimally encoded, non-negative integers. Any other encoding of the same
//! `(r, s)` pair is rejected, so each logical signature has exactly one byte
//! representation.

use k256::elliptic_curve::scalar::IsHigh;
use thiserror::Error;

/// Decoded ECDSA signature over secp256k1.
pub type EcdsaSignature = k256::ecdsa::Signature;

/// Smallest possible encoding: one-byte r and s.
const MIN_DER_LEN: usize = 8;
/// Largest possible encoding: 33-byte r and s (32 bytes plus a sign pad).
const MAX_DER_LEN: usize = 72;
/// A secp256k1 scalar with its optional 0x00 sign pad.
const MAX_INTEGER_LEN: usize = 33;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

/// Reasons a byte string is not a strict DER signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DerError {
    #[error("signature length {0} outside 8..=72 bytes")]
    InvalidLength(usize),

    #[error("signature does not start with a SEQUENCE tag")]
    NotASequence,

    #[error("SEQUENCE length does not cover the signature exactly")]
    LengthMismatch,

    #[error("expected INTEGER tag for {0}")]
    MissingIntegerTag(Component),

    #[error("{0} has zero length")]
    EmptyInteger(Component),

    #[error("{0} is longer than a secp256k1 scalar")]
    IntegerTooLong(Component),

    #[error("{0} is encoded as a negative number")]
    NegativeInteger(Component),

    #[error("{0} has superfluous leading zero padding")]
    ExcessPadding(Component),

    #[error("signature scalar is zero or not below the curve order")]
    ScalarOutOfRange,
}

/// Which half of the `(r, s)` pair a DER error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    R,
    S,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::R => f.write_str("r"),
            Component::S => f.write_str("s"),
        }
    }
}

/// Check that `bytes` is a strictly encoded DER signature.
///
/// This looks only at structure; whether the integers are valid scalars is
/// decided by [`decode_strict`].
pub fn validate_strict(bytes: &[u8]) -> Result<(), DerError> {
    let len = bytes.len();
    if !(MIN_DER_LEN..=MAX_DER_LEN).contains(&len) {
        return Err(DerError::InvalidLength(len));
    }

    if bytes[0] != TAG_SEQUENCE {
        return Err(DerError::NotASequence);
    }
    if bytes[1] as usize != len - 2 {
        return Err(DerError::LengthMismatch);
    }

    let r_len = bytes[3] as usize;
    // r must leave room for the tag and length of s.
    if 5 + r_len >= len {
        return Err(DerError::LengthMismatch);
    }
    let s_len = bytes[5 + r_len] as usize;
    if r_len + s_len + 6 != len {
        return Err(DerError::LengthMismatch);
    }

    check_integer(bytes[2], &bytes[4..4 + r_len], Component::R)?;
    check_integer(bytes[4 + r_len], &bytes[6 + r_len..], Component::S)?;

    Ok(())
}

fn check_integer(tag: u8, value: &[u8], component: Component) -> Result<(), DerError> {
    if tag != TAG_INTEGER {
        return Err(DerError::MissingIntegerTag(component));
    }
    match value {
        [] => Err(DerError::EmptyInteger(component)),
        _ if value.len() > MAX_INTEGER_LEN => Err(DerError::IntegerTooLong(component)),
        [first, ..] if first & 0x80 != 0 => Err(DerError::NegativeInteger(component)),
        // A leading zero is only allowed when the next byte would read as negative.
        [0x00, second, ..] if second & 0x80 == 0 => Err(DerError::ExcessPadding(component)),
        _ => Ok(()),
    }
}

/// Decode a strictly encoded DER signature into its `(r, s)` scalars.
pub fn decode_strict(bytes: &[u8]) -> Result<EcdsaSignature, DerError> {
    validate_strict(bytes)?;
    EcdsaSignature::from_der(bytes).map_err(|_| DerError::ScalarOutOfRange)
}

/// Encode a signature as DER. The output always passes [`validate_strict`].
pub fn encode(signature: &EcdsaSignature) -> Vec<u8> {
    signature.to_der().as_bytes().to_vec()
}

/// Whether `s` is the lower of its two representatives (`s <= n / 2`).
pub fn is_low_s(signature: &EcdsaSignature) -> bool {
    !bool::from(signature.s().is_high())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use k256::ecdsa::SigningKey;

    fn sample_signature() -> EcdsaSignature {
        let key = SigningKey::from_bytes((&[0x11u8; 32]).into()).unwrap();
        key.sign_prehash(&[0x22u8; 32]).unwrap()
    }

    /// Hand-built signature with tiny integers: r = 1, s = 1.
    const MINIMAL: [u8; 8] = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01];

    #[test]
    fn test_encode_passes_strict_validation() {
        let der = encode(&sample_signature());
        assert!(validate_strict(&der).is_ok());
    }

    #[test]
    fn test_decode_roundtrip() {
        let sig = sample_signature();
        let decoded = decode_strict(&encode(&sig)).unwrap();
        assert_eq!(decoded, sig);
        assert_eq!(decoded.to_bytes(), sig.to_bytes());
    }

    #[test]
    fn test_minimal_encoding_accepted() {
        assert_eq!(validate_strict(&MINIMAL), Ok(()));
        assert!(decode_strict(&MINIMAL).is_ok());
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(validate_strict(&[]), Err(DerError::InvalidLength(0)));
        assert_eq!(validate_strict(&MINIMAL[..7]), Err(DerError::InvalidLength(7)));
        assert_eq!(
            validate_strict(&[0u8; 73]),
            Err(DerError::InvalidLength(73))
        );
    }

    #[test]
    fn test_wrong_sequence_tag() {
        let mut der = MINIMAL;
        der[0] = 0x31;
        assert_eq!(validate_strict(&der), Err(DerError::NotASequence));
    }

    #[test]
    fn test_trailing_byte_rejected() {
        let mut der = encode(&sample_signature());
        der.push(0x00);
        assert_eq!(validate_strict(&der), Err(DerError::LengthMismatch));
    }

    #[test]
    fn test_trailing_byte_with_patched_sequence_length_rejected() {
        let mut der = encode(&sample_signature());
        der.push(0x00);
        der[1] += 1;
        assert_eq!(validate_strict(&der), Err(DerError::LengthMismatch));
    }

    #[test]
    fn test_missing_integer_tag() {
        let mut der = MINIMAL;
        der[2] = 0x03;
        assert_eq!(
            validate_strict(&der),
            Err(DerError::MissingIntegerTag(Component::R))
        );

        let mut der = MINIMAL;
        der[5] = 0x04;
        assert_eq!(
            validate_strict(&der),
            Err(DerError::MissingIntegerTag(Component::S))
        );
    }

    #[test]
    fn test_empty_integer() {
        // r has length zero, s takes two bytes.
        let der = [0x30, 0x06, 0x02, 0x00, 0x02, 0x02, 0x01, 0x01];
        assert_eq!(
            validate_strict(&der),
            Err(DerError::EmptyInteger(Component::R))
        );
    }

    #[test]
    fn test_negative_integer() {
        let der = [0x30, 0x06, 0x02, 0x01, 0x81, 0x02, 0x01, 0x01];
        assert_eq!(
            validate_strict(&der),
            Err(DerError::NegativeInteger(Component::R))
        );

        let der = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0xff];
        assert_eq!(
            validate_strict(&der),
            Err(DerError::NegativeInteger(Component::S))
        );
    }

    #[test]
    fn test_excess_padding() {
        let der = [0x30, 0x07, 0x02, 0x02, 0x00, 0x01, 0x02, 0x01, 0x01];
        assert_eq!(
            validate_strict(&der),
            Err(DerError::ExcessPadding(Component::R))
        );

        let der = [0x30, 0x07, 0x02, 0x01, 0x01, 0x02, 0x02, 0x00, 0x7f];
        assert_eq!(
            validate_strict(&der),
            Err(DerError::ExcessPadding(Component::S))
        );
    }

    #[test]
    fn test_required_sign_padding_accepted() {
        let der = [0x30, 0x07, 0x02, 0x02, 0x00, 0x80, 0x02, 0x01, 0x01];
        assert_eq!(validate_strict(&der), Ok(()));
    }

    #[test]
    fn test_zero_scalar_rejected_on_decode() {
        let der = [0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x01];
        assert_eq!(validate_strict(&der), Ok(()));
        assert_eq!(decode_strict(&der), Err(DerError::ScalarOutOfRange));
    }

    #[test]
    fn test_low_s_detection() {
        let sig = sample_signature();
        assert!(is_low_s(&sig));

        let high = EcdsaSignature::from_scalars(sig.r().to_bytes(), (-*sig.s()).to_bytes())
            .unwrap();
        assert!(!is_low_s(&high));
        assert!(decode_strict(&encode(&high)).is_ok());
    }

    /// floor(n / 2) for the secp256k1 group order n.
    const HALF_ORDER: &str = "7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0";
    const HALF_ORDER_PLUS_ONE: &str =
        "7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a1";

    fn with_s(s_hex: &str) -> Vec<u8> {
        let mut der = vec![0x30, 0x25, 0x02, 0x01, 0x01, 0x02, 0x20];
        der.extend(hex::decode(s_hex).unwrap());
        der
    }

    #[test]
    fn test_low_s_boundary() {
        let at_half = decode_strict(&with_s(HALF_ORDER)).unwrap();
        assert!(is_low_s(&at_half));

        let above_half = decode_strict(&with_s(HALF_ORDER_PLUS_ONE)).unwrap();
        assert!(!is_low_s(&above_half));
    }
}
