//! Keyring (§4.B): an ordered collection of dated symmetric keys, with best-key selection,
//! attribute-codec (de)serialization, and atomic file I/O.

use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};
use crate::key::Key;
use crate::time::now_u32;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

const FILE_VERSION: u32 = 1;

/// Which direction a caller wants a key for; see §4.B `best_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsage {
    Encrypt,
    Decrypt,
}

/// One dated key in a keyring (§3 Keyring Entry).
pub struct KeyringEntry {
    pub creation: u32,
    pub valid_after: u32,
    pub key: Key,
}

/// An ordered, index-addressable collection of keyring entries (§3 Keyring).
pub struct Keyring {
    entries: Vec<KeyringEntry>,
}

impl Keyring {
    /// Empty keyring, pre-sized for `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Singleton keyring containing `key` with `creation = 0, valid_after = 0`.
    pub fn from_key(key: Key) -> Self {
        let mut ring = Self::new(1);
        ring.add(0, 0, key);
        ring
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[KeyringEntry] {
        &self.entries
    }

    /// Append a new entry. Callers may pass `0` for either timestamp; the meaning of `0` is
    /// decided by the caller (§4.F auto-rotation treats it as "now").
    pub fn add(&mut self, creation: u32, valid_after: u32, key: Key) {
        self.entries.push(KeyringEntry { creation, valid_after, key });
    }

    /// Remove the entry at `i`, left-shifting later entries.
    pub fn remove(&mut self, i: usize) -> Result<()> {
        if i >= self.entries.len() {
            return Err(WebauthError::NotFound(format!("keyring index {i} out of range")));
        }
        self.entries.remove(i);
        Ok(())
    }

    /// Select the best key for `usage`, given a time `hint` (the encrypting key's creation
    /// timestamp, for `Decrypt`; ignored for `Encrypt`).
    pub fn best_key(&self, usage: KeyUsage, hint: u32) -> Result<&Key> {
        self.best_key_with_creation(usage, hint).map(|(_, key)| key)
    }

    pub(crate) fn best_key_with_creation(&self, usage: KeyUsage, hint: u32) -> Result<(u32, &Key)> {
        let now = now_u32()?;
        let mut best: Option<(u32, &KeyringEntry)> = None;
        for entry in &self.entries {
            if entry.valid_after > now {
                continue;
            }
            if usage == KeyUsage::Decrypt && entry.valid_after > hint {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_valid_after, _)) => entry.valid_after >= best_valid_after,
            };
            if better {
                best = Some((entry.valid_after, entry));
            }
        }
        best.map(|(_, entry)| (entry.creation, &entry.key))
            .ok_or_else(|| WebauthError::NotFound("no valid key available".into()))
    }

    /// All keys, newest `valid_after` first, for the envelope's MAC-failure fallback (§4.D).
    pub(crate) fn entries_by_decreasing_valid_after(&self) -> Vec<&Key> {
        let mut ordered: Vec<&KeyringEntry> = self.entries.iter().collect();
        ordered.sort_by(|a, b| b.valid_after.cmp(&a.valid_after));
        ordered.into_iter().map(|e| &e.key).collect()
    }

    #[cfg(test)]
    pub(crate) fn entry_key_at(&self, i: usize) -> &Key {
        &self.entries[i].key
    }

    /// Encode to the fixed attribute schema: `v`, `n`, then `ct{i}`/`va{i}`/`kt{i}`/`kd{i}`.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = AttrWriter::new();
        w.push_uint32("v", FILE_VERSION);
        w.push_uint32("n", self.entries.len() as u32);
        for (i, entry) in self.entries.iter().enumerate() {
            w.push_time(&format!("ct{i}"), entry.creation);
            w.push_time(&format!("va{i}"), entry.valid_after);
            w.push_uint32(&format!("kt{i}"), entry.key.algorithm().wire_tag());
            w.push_binary(&format!("kd{i}"), entry.key.bytes());
        }
        w.finish()
    }

    /// Decode from the wire form produced by [`Keyring::encode`]. Rejects anything but
    /// version `1` with `FileVersion`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let r = AttrReader::parse(data)?;
        let version = r
            .get_uint32("v")?
            .ok_or_else(|| WebauthError::Corrupt("missing v in keyring file".into()))?;
        if version != FILE_VERSION {
            return Err(WebauthError::FileVersion);
        }
        let count = r
            .get_uint32("n")?
            .ok_or_else(|| WebauthError::Corrupt("missing n in keyring file".into()))?;

        let mut ring = Keyring::new(count as usize);
        for i in 0..count {
            let creation = r
                .get_time(&format!("ct{i}"))?
                .ok_or_else(|| WebauthError::Corrupt(format!("missing ct{i} in keyring file")))?;
            let valid_after = r
                .get_time(&format!("va{i}"))?
                .ok_or_else(|| WebauthError::Corrupt(format!("missing va{i} in keyring file")))?;
            let algorithm_tag = r
                .get_uint32(&format!("kt{i}"))?
                .ok_or_else(|| WebauthError::Corrupt(format!("missing kt{i} in keyring file")))?;
            let key_bytes = r
                .get_binary(&format!("kd{i}"))
                .ok_or_else(|| WebauthError::Corrupt(format!("missing kd{i} in keyring file")))?;
            let key = Key::from_wire(algorithm_tag, &key_bytes)?;
            ring.add(creation, valid_after, key);
        }
        Ok(ring)
    }

    /// Load a keyring from `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WebauthError::FileNotFound(path.display().to_string()));
        }
        let mut file =
            std::fs::File::open(path).map_err(|e| WebauthError::FileOpenRead(e.to_string()))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(|e| WebauthError::FileRead(e.to_string()))?;
        let ring = Self::decode(&buf)?;
        debug!(path = %path.display(), entries = ring.len(), "loaded keyring");
        Ok(ring)
    }

    /// Write a keyring to `path` atomically: write to a sibling temp file (mode 0600),
    /// then rename over `path`. The temp file is removed automatically if any step fails.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| WebauthError::FileOpenWrite(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| WebauthError::FileOpenWrite(e.to_string()))?;
        }

        tmp.write_all(&self.encode()).map_err(|e| WebauthError::FileWrite(e.to_string()))?;
        tmp.flush().map_err(|e| WebauthError::FileWrite(e.to_string()))?;
        tmp.persist(path).map_err(|e| WebauthError::FileWrite(e.error.to_string()))?;
        debug!(path = %path.display(), entries = self.len(), "saved keyring");
        Ok(())
    }
}

/// Thread-safe wrapper recommended (not mandated) by §5: a reader/writer lock around a
/// shared `Keyring`, the same primitive the teacher uses for shared mutable state.
pub struct SharedKeyring(parking_lot::RwLock<Keyring>);

impl SharedKeyring {
    pub fn new(keyring: Keyring) -> Self {
        Self(parking_lot::RwLock::new(keyring))
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, Keyring> {
        self.0.read()
    }

    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, Keyring> {
        self.0.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyAlgorithm, KeySize};

    #[test]
    fn remove_shifts_later_entries_down() {
        let mut ring = Keyring::new(3);
        ring.add(1, 1, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        ring.add(2, 2, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        ring.add(3, 3, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        let kept_bytes: Vec<u8> = ring.entries()[2].key.bytes().to_vec();

        ring.remove(1).unwrap();

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.entries()[0].creation, 1);
        assert_eq!(ring.entries()[1].creation, 3);
        assert_eq!(ring.entries()[1].key.bytes(), kept_bytes.as_slice());
    }

    #[test]
    fn remove_out_of_range_is_not_found() {
        let mut ring = Keyring::new(1);
        assert!(matches!(ring.remove(0), Err(WebauthError::NotFound(_))));
    }

    #[test]
    fn best_key_encrypt_picks_largest_valid_after_not_in_future() {
        let mut ring = Keyring::new(2);
        ring.add(1000, 1000, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        ring.add(2000, 2000, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        let (creation, _) = ring.best_key_with_creation(KeyUsage::Encrypt, 0).unwrap();
        assert_eq!(creation, 2000);
    }

    #[test]
    fn best_key_encrypt_not_found_when_only_future_key() {
        let now = now_u32().unwrap();
        let mut ring = Keyring::new(1);
        ring.add(now, now + 100_000, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        assert!(matches!(ring.best_key(KeyUsage::Encrypt, 0), Err(WebauthError::NotFound(_))));
    }

    #[test]
    fn best_key_decrypt_prefers_contemporaneous_key() {
        let mut ring = Keyring::new(2);
        ring.add(1000, 1000, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        ring.add(2000, 2000, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        let (creation, _) = ring.best_key_with_creation(KeyUsage::Decrypt, 1500).unwrap();
        assert_eq!(creation, 1000);
    }

    #[test]
    fn encode_decode_round_trips() {
        let mut ring = Keyring::new(2);
        ring.add(1000, 1000, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());
        ring.add(2000, 2000, Key::create(KeyAlgorithm::Aes, KeySize::Bits256, None).unwrap());

        let wire = ring.encode();
        let decoded = Keyring::decode(&wire).unwrap();

        assert_eq!(decoded.len(), ring.len());
        for (a, b) in ring.entries().iter().zip(decoded.entries().iter()) {
            assert_eq!(a.creation, b.creation);
            assert_eq!(a.valid_after, b.valid_after);
            assert_eq!(a.key.bytes(), b.key.bytes());
        }
    }

    #[test]
    fn decode_rejects_wrong_version() {
        let mut w = AttrWriter::new();
        w.push_uint32("v", 2).push_uint32("n", 0);
        let wire = w.finish();
        assert!(matches!(Keyring::decode(&wire), Err(WebauthError::FileVersion)));
    }

    #[test]
    fn write_then_read_round_trips_with_owner_only_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyring.dat");
        let mut ring = Keyring::new(1);
        ring.add(1000, 1000, Key::create(KeyAlgorithm::Aes, KeySize::Bits128, None).unwrap());

        ring.write(&path).unwrap();
        let loaded = Keyring::read(&path).unwrap();
        assert_eq!(loaded.len(), 1);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn read_missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.dat");
        assert!(matches!(Keyring::read(&path), Err(WebauthError::FileNotFound(_))));
    }
}
