//! Auto-rotation (§4.F): open-or-create a keyring at a path, adding a fresh key whenever the
//! newest one has outlived its configured lifetime, persisting atomically either way.

use crate::error::{Result, WebauthError};
use crate::key::{Key, KeyAlgorithm, KeySize};
use crate::keyring::Keyring;
use crate::time::now_u32;
use std::path::Path;
use tracing::info;

/// What [`auto_update`] actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStatus {
    /// The keyring already had a sufficiently fresh key; nothing changed.
    None,
    /// The file did not exist and was created with a single fresh key.
    Created,
    /// The file existed but its newest key had aged past `lifetime`; a new key was appended.
    Updated,
}

/// Open the keyring at `path`, creating it (if `may_create`) when missing, and rotating in a
/// fresh 128-bit AES key when `lifetime > 0` and every entry has aged out.
pub fn auto_update(path: impl AsRef<Path>, may_create: bool, lifetime: u32) -> Result<(Keyring, RotationStatus)> {
    let path = path.as_ref();
    let now = now_u32()?;

    if !path.exists() {
        if !may_create {
            return Err(WebauthError::FileNotFound(path.display().to_string()));
        }
        let key = Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None)?;
        let mut ring = Keyring::new(1);
        ring.add(now, now, key);
        ring.write(path)?;
        info!(path = %path.display(), "created keyring with a fresh key");
        return Ok((ring, RotationStatus::Created));
    }

    let mut ring = Keyring::read(path)?;
    if lifetime > 0 && !has_fresh_key(&ring, now, lifetime) {
        let key = Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None)?;
        ring.add(now, now, key);
        ring.write(path)?;
        info!(path = %path.display(), "rotated in a fresh key");
        return Ok((ring, RotationStatus::Updated));
    }

    Ok((ring, RotationStatus::None))
}

fn has_fresh_key(ring: &Keyring, now: u32, lifetime: u32) -> bool {
    ring.entries()
        .iter()
        .any(|entry| u64::from(entry.valid_after) + u64::from(lifetime) > u64::from(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_fresh_keyring_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyring.dat");

        let (ring, status) = auto_update(&path, true, 3600).unwrap();

        assert_eq!(status, RotationStatus::Created);
        assert_eq!(ring.len(), 1);
        assert!(path.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn refuses_to_create_when_not_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyring.dat");
        assert!(matches!(auto_update(&path, false, 3600), Err(WebauthError::FileNotFound(_))));
    }

    #[test]
    fn rotates_when_newest_key_has_aged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyring.dat");
        let now = now_u32().unwrap();
        let lifetime = 1000;

        let mut ring = Keyring::new(1);
        ring.add(
            now - 2 * lifetime,
            now - 2 * lifetime,
            Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap(),
        );
        ring.write(&path).unwrap();

        let (ring, status) = auto_update(&path, false, lifetime).unwrap();

        assert_eq!(status, RotationStatus::Updated);
        assert_eq!(ring.len(), 2);
        assert!(ring.entries()[1].creation >= now);
    }

    #[test]
    fn does_nothing_when_key_is_still_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyring.dat");
        let now = now_u32().unwrap();

        let mut ring = Keyring::new(1);
        ring.add(now, now, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        ring.write(&path).unwrap();

        let (ring, status) = auto_update(&path, false, 3600).unwrap();

        assert_eq!(status, RotationStatus::None);
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn zero_lifetime_never_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyring.dat");
        let now = now_u32().unwrap();

        let mut ring = Keyring::new(1);
        ring.add(now - 1_000_000, now - 1_000_000, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        ring.write(&path).unwrap();

        let (_, status) = auto_update(&path, false, 0).unwrap();
        assert_eq!(status, RotationStatus::None);
    }
}
