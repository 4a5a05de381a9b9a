//! Cryptographic envelope (§4.D): AES-CBC encrypt-then-HMAC-SHA1 authenticate, with a
//! 4-byte key-hint prefix that lets the keyring pick a decryption key without trial and
//! error across every stored key.
//!
//! Wire layout: `KEY_HINT(4) || IV(16) || CIPHERTEXT(var) || HMAC_TAG(20)`, where the HMAC
//! covers `KEY_HINT || IV || CIPHERTEXT`.
//!
//! The AES-CBC key and the HMAC-SHA1 key are independent values both derived from a single
//! stored `Key`'s raw bytes via `HMAC-SHA256(raw_key, label)`, so one `Key` per keyring entry
//! suffices (§3) while encryption and authentication never share key material directly.

use crate::error::{Result, WebauthError};
use crate::key::{Key, KeySize};
use crate::keyring::{KeyUsage, Keyring};
use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use sha2::Sha256;
use tracing::{debug, warn};

const IV_LEN: usize = 16;
const TAG_LEN: usize = 20;
const HINT_LEN: usize = 4;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

fn derive_enc_key(key: &Key) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key.bytes()).expect("HMAC accepts any key length");
    mac.update(b"webauth-enc");
    let digest = mac.finalize().into_bytes();
    digest[..key.size().bytes()].to_vec()
}

fn derive_mac_key(key: &Key) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key.bytes()).expect("HMAC accepts any key length");
    mac.update(b"webauth-mac");
    mac.finalize().into_bytes().into()
}

macro_rules! cbc_pair {
    ($cipher:ty) => {{ (cbc::Encryptor::<$cipher>::new, cbc::Decryptor::<$cipher>::new) }};
}

fn aes_cbc_encrypt(key_size: KeySize, enc_key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Vec<u8> {
    match key_size {
        KeySize::Bits128 => {
            cbc::Encryptor::<Aes128>::new(enc_key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
        }
        KeySize::Bits192 => {
            cbc::Encryptor::<Aes192>::new(enc_key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
        }
        KeySize::Bits256 => {
            cbc::Encryptor::<Aes256>::new(enc_key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
        }
    }
}

fn aes_cbc_decrypt(key_size: KeySize, enc_key: &[u8], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let result = match key_size {
        KeySize::Bits128 => {
            cbc::Decryptor::<Aes128>::new(enc_key.into(), iv.into()).decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        }
        KeySize::Bits192 => {
            cbc::Decryptor::<Aes192>::new(enc_key.into(), iv.into()).decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        }
        KeySize::Bits256 => {
            cbc::Decryptor::<Aes256>::new(enc_key.into(), iv.into()).decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        }
    };
    result.map_err(|_| WebauthError::Corrupt("invalid CBC padding".into()))
}

fn hmac_tag(mac_key: &[u8; 32], signed: &[u8]) -> [u8; TAG_LEN] {
    let mut mac = HmacSha1::new_from_slice(mac_key).expect("HMAC accepts any key length");
    mac.update(signed);
    let out = mac.finalize().into_bytes();
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&out);
    tag
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Seal `payload` under the keyring's best encryption key (§4.B `best_key(Encrypt, _)`).
pub fn encrypt(payload: &[u8], keyring: &Keyring) -> Result<Vec<u8>> {
    let (creation, key) = keyring.best_key_with_creation(KeyUsage::Encrypt, 0)?;
    encrypt_with_key(payload, creation, key)
}

fn encrypt_with_key(payload: &[u8], key_creation: u32, key: &Key) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let enc_key = derive_enc_key(key);
    let mac_key = derive_mac_key(key);
    let ciphertext = aes_cbc_encrypt(key.size(), &enc_key, &iv, payload);

    let mut signed = Vec::with_capacity(HINT_LEN + IV_LEN + ciphertext.len());
    signed.extend_from_slice(&key_creation.to_be_bytes());
    signed.extend_from_slice(&iv);
    signed.extend_from_slice(&ciphertext);

    let tag = hmac_tag(&mac_key, &signed);
    signed.extend_from_slice(&tag);
    Ok(signed)
}

/// Open an envelope produced by [`encrypt`], trying the time-hinted key first and falling
/// back to every other key (newest `valid_after` first) if that fails authentication.
pub fn decrypt(bytes: &[u8], keyring: &Keyring) -> Result<Vec<u8>> {
    if bytes.len() < HINT_LEN + IV_LEN + TAG_LEN {
        return Err(WebauthError::Corrupt("envelope too short".into()));
    }
    let hint = u32::from_be_bytes(bytes[..HINT_LEN].try_into().unwrap());
    let signed_len = bytes.len() - TAG_LEN;
    let signed = &bytes[..signed_len];
    let tag = &bytes[signed_len..];
    let iv: [u8; IV_LEN] = bytes[HINT_LEN..HINT_LEN + IV_LEN].try_into().unwrap();
    let ciphertext = &bytes[HINT_LEN + IV_LEN..signed_len];

    if let Ok(key) = keyring.best_key(KeyUsage::Decrypt, hint) {
        if let Some(payload) = try_open(key, signed, tag, &iv, ciphertext) {
            return payload;
        }
        warn!(hint, "time-hinted key failed authentication, falling back to every other key");
    }

    for key in keyring.entries_by_decreasing_valid_after() {
        if let Some(payload) = try_open(key, signed, tag, &iv, ciphertext) {
            debug!(hint, "decoded after falling back to a secondary key");
            return payload;
        }
    }

    Err(WebauthError::BadHmac)
}

fn try_open(key: &Key, signed: &[u8], tag: &[u8], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Option<Result<Vec<u8>>> {
    let mac_key = derive_mac_key(key);
    let expected = hmac_tag(&mac_key, signed);
    if !constant_time_eq(&expected, tag) {
        return None;
    }
    let enc_key = derive_enc_key(key);
    Some(aes_cbc_decrypt(key.size(), &enc_key, iv, ciphertext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyAlgorithm;

    fn ring_with_one_key() -> Keyring {
        let key = Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap();
        Keyring::from_key(key)
    }

    #[test]
    fn round_trips_payload() {
        let ring = ring_with_one_key();
        let sealed = encrypt(b"hello world", &ring).unwrap();
        let opened = decrypt(&sealed, &ring).unwrap();
        assert_eq!(opened, b"hello world");
    }

    #[test]
    fn two_encryptions_differ_but_both_decode() {
        let ring = ring_with_one_key();
        let a = encrypt(b"payload", &ring).unwrap();
        let b = encrypt(b"payload", &ring).unwrap();
        assert_ne!(a, b);
        assert_eq!(decrypt(&a, &ring).unwrap(), b"payload");
        assert_eq!(decrypt(&b, &ring).unwrap(), b"payload");
    }

    #[test]
    fn bit_flip_fails_closed() {
        let ring = ring_with_one_key();
        let mut sealed = encrypt(b"payload", &ring).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        let err = decrypt(&sealed, &ring).unwrap_err();
        assert!(matches!(err, WebauthError::BadHmac | WebauthError::Corrupt(_)));
    }

    #[test]
    fn key_rotation_during_decode_uses_time_hinted_key() {
        let k1 = Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap();
        let k2 = Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap();
        let mut ring = Keyring::new(2);
        ring.add(1000, 1000, k1);
        ring.add(2000, 2000, k2);
        // Encrypt under k1 explicitly by constructing the envelope with its creation hint.
        let sealed = encrypt_with_key(b"payload", 1000, ring.entry_key_at(0)).unwrap();
        let opened = decrypt(&sealed, &ring).unwrap();
        assert_eq!(opened, b"payload");
    }
}
