//! Attribute-list wire codec (§4.C).
//!
//! An attribute list is an ordered sequence of `(name, value)` pairs. The wire form is a
//! sequence of `name=value;` records, with any `;` inside a value escaped by doubling it
//! (`;;` for a literal `;`). Names are short ASCII tokens and are never escaped themselves.
//!
//! Typed wrappers (`push_string`/`get_string`, `push_uint32`/`get_uint32`, ...) sit on top of
//! the raw byte-pair list so that higher layers never hand-roll the escaping.

use crate::error::{Result, WebauthError};

/// Encode an ordered list of `(name, value)` pairs to its wire form.
pub fn encode(pairs: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in pairs {
        out.extend_from_slice(name.as_bytes());
        out.push(b'=');
        for &b in value {
            if b == b';' {
                out.push(b';');
                out.push(b';');
            } else {
                out.push(b);
            }
        }
        out.push(b';');
    }
    out
}

/// Decode the wire form back into an ordered list of `(name, value)` pairs.
pub fn decode(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut pairs = Vec::new();
    let len = data.len();
    let mut i = 0;
    while i < len {
        let mut j = i;
        while j < len && data[j] != b'=' {
            j += 1;
        }
        if j >= len {
            return Err(WebauthError::Corrupt("missing '=' in attribute record".into()));
        }
        let name = std::str::from_utf8(&data[i..j])
            .map_err(|_| WebauthError::Corrupt("attribute name is not valid UTF-8".into()))?
            .to_string();

        let mut k = j + 1;
        let mut value = Vec::new();
        let mut terminated = false;
        while k < len {
            if data[k] == b';' {
                if k + 1 < len && data[k + 1] == b';' {
                    value.push(b';');
                    k += 2;
                    continue;
                }
                terminated = true;
                k += 1;
                break;
            }
            value.push(data[k]);
            k += 1;
        }
        if !terminated {
            return Err(WebauthError::Corrupt("unterminated attribute record".into()));
        }
        pairs.push((name, value));
        i = k;
    }
    Ok(pairs)
}

/// Builder for an outgoing attribute list, in the order fields are pushed.
#[derive(Default)]
pub struct AttrWriter {
    pairs: Vec<(String, Vec<u8>)>,
}

impl AttrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_string(&mut self, name: &str, value: &str) -> &mut Self {
        self.pairs.push((name.to_string(), value.as_bytes().to_vec()));
        self
    }

    pub fn push_uint32(&mut self, name: &str, value: u32) -> &mut Self {
        self.pairs.push((name.to_string(), value.to_be_bytes().to_vec()));
        self
    }

    pub fn push_time(&mut self, name: &str, value: u32) -> &mut Self {
        self.push_uint32(name, value)
    }

    pub fn push_binary(&mut self, name: &str, value: &[u8]) -> &mut Self {
        self.pairs.push((name.to_string(), value.to_vec()));
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        encode(&self.pairs)
    }
}

/// Reader over a decoded attribute list, with typed accessors.
pub struct AttrReader {
    pairs: Vec<(String, Vec<u8>)>,
}

impl AttrReader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(Self { pairs: decode(data)? })
    }

    fn get_raw(&self, name: &str) -> Option<&[u8]> {
        self.pairs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_slice())
    }

    pub fn get_string(&self, name: &str) -> Result<Option<String>> {
        match self.get_raw(name) {
            None => Ok(None),
            Some(bytes) => Ok(Some(
                String::from_utf8(bytes.to_vec())
                    .map_err(|_| WebauthError::Corrupt(format!("{name} is not valid UTF-8")))?,
            )),
        }
    }

    pub fn get_uint32(&self, name: &str) -> Result<Option<u32>> {
        match self.get_raw(name) {
            None => Ok(None),
            Some(bytes) => {
                let arr: [u8; 4] = bytes
                    .try_into()
                    .map_err(|_| WebauthError::Corrupt(format!("{name} is not a 4-byte uint32")))?;
                Ok(Some(u32::from_be_bytes(arr)))
            }
        }
    }

    pub fn get_time(&self, name: &str) -> Result<Option<u32>> {
        self.get_uint32(name)
    }

    pub fn get_binary(&self, name: &str) -> Option<Vec<u8>> {
        self.get_raw(name).map(|b| b.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_simple_pairs() {
        let pairs = vec![
            ("a".to_string(), b"hello".to_vec()),
            ("b".to_string(), b"world".to_vec()),
        ];
        let wire = encode(&pairs);
        let decoded = decode(&wire).unwrap();
        assert_eq!(pairs, decoded);
    }

    #[test]
    fn escapes_semicolons_in_values() {
        let pairs = vec![("s".to_string(), b"a;b;;c".to_vec())];
        let wire = encode(&pairs);
        assert_eq!(wire, b"s=a;;b;;;;c;");
        let decoded = decode(&wire).unwrap();
        assert_eq!(decoded, pairs);
    }

    #[test]
    fn unterminated_record_is_corrupt() {
        let err = decode(b"s=hello").unwrap_err();
        assert!(matches!(err, WebauthError::Corrupt(_)));
    }

    #[test]
    fn missing_equals_is_corrupt() {
        let err = decode(b"nosep").unwrap_err();
        assert!(matches!(err, WebauthError::Corrupt(_)));
    }

    #[test]
    fn typed_writer_and_reader_round_trip() {
        let mut w = AttrWriter::new();
        w.push_string("s", "alice").push_uint32("ct", 1_700_000_000).push_binary("k", &[1, 2, 3]);
        let wire = w.finish();
        let r = AttrReader::parse(&wire).unwrap();
        assert_eq!(r.get_string("s").unwrap().as_deref(), Some("alice"));
        assert_eq!(r.get_uint32("ct").unwrap(), Some(1_700_000_000));
        assert_eq!(r.get_binary("k"), Some(vec![1, 2, 3]));
        assert_eq!(r.get_string("missing").unwrap(), None);
    }

    #[test]
    fn empty_input_decodes_to_empty_list() {
        assert_eq!(decode(b"").unwrap(), vec![]);
    }
}
