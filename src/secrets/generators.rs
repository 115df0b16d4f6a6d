//! Key material generators, one per [`SecretType`].
//!
//! All randomness comes from the operating system CSPRNG.

use super::spec::SecretType;
use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use p256::pkcs8::EncodePrivateKey;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use rsa::RsaPrivateKey;

const RSA_KEY_BITS: usize = 4096;
const SIGNING_KEY_VERSION: u32 = 0;

/// Produces the raw bytes stored for one secret key
pub type Generator = fn() -> Result<Vec<u8>>;

/// Generator for a secret type
pub fn generator_for(secret_type: SecretType) -> Generator {
    match secret_type {
        SecretType::Rand32 => rand32,
        SecretType::SigningKey => signing_key,
        SecretType::Hex32 => hex32,
        SecretType::Rsa => rsa_private_key,
        SecretType::EcdsaPrime256v1 => ecdsa_prime256v1,
        SecretType::EcdsaSecp256k1 => ecdsa_secp256k1,
        SecretType::EcdsaSecp384r1 => ecdsa_secp384r1,
    }
}

/// Generate fresh key material of the given type
pub fn generate(secret_type: SecretType) -> Result<Vec<u8>> {
    generator_for(secret_type)()
}

/// 32 characters from `[A-Za-z0-9]`
fn rand32() -> Result<Vec<u8>> {
    Ok(OsRng.sample_iter(Alphanumeric).take(32).collect())
}

/// 32 random bytes, hex-encoded
fn hex32() -> Result<Vec<u8>> {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    Ok(hex::encode(bytes).into_bytes())
}

/// Synapse signing key: `ed25519 <version> <unpadded base64 seed>`
fn signing_key() -> Result<Vec<u8>> {
    let key = ed25519_dalek::SigningKey::generate(&mut OsRng);
    let encoded = STANDARD_NO_PAD.encode(key.to_bytes());
    Ok(format!("ed25519 {} {}", SIGNING_KEY_VERSION, encoded).into_bytes())
}

fn rsa_private_key() -> Result<Vec<u8>> {
    rsa_with_bits(RSA_KEY_BITS)
}

fn rsa_with_bits(bits: usize) -> Result<Vec<u8>> {
    let key = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| anyhow!("failed to generate RSA key: {}", e))?;
    let der = key
        .to_pkcs8_der()
        .map_err(|e| anyhow!("failed to encode RSA key as PKCS#8: {}", e))?;
    Ok(der.as_bytes().to_vec())
}

fn ecdsa_prime256v1() -> Result<Vec<u8>> {
    let der = p256::SecretKey::random(&mut OsRng)
        .to_pkcs8_der()
        .map_err(|e| anyhow!("failed to encode P-256 key as PKCS#8: {}", e))?;
    Ok(der.as_bytes().to_vec())
}

fn ecdsa_secp256k1() -> Result<Vec<u8>> {
    let der = k256::SecretKey::random(&mut OsRng)
        .to_pkcs8_der()
        .map_err(|e| anyhow!("failed to encode secp256k1 key as PKCS#8: {}", e))?;
    Ok(der.as_bytes().to_vec())
}

fn ecdsa_secp384r1() -> Result<Vec<u8>> {
    let der = p384::SecretKey::random(&mut OsRng)
        .to_pkcs8_der()
        .map_err(|e| anyhow!("failed to encode P-384 key as PKCS#8: {}", e))?;
    Ok(der.as_bytes().to_vec())
}
