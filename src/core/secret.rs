//! Secure secret buffer
//!
//! Holds secret text as UTF-16 code units, the same unit the Credential Manager
//! stores blobs in. Contents are zeroed on drop and never handed out as an
//! ordinary `String`.

use crate::errors::AppError;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Smallest allocation used once the buffer starts growing
const MIN_GROWTH: usize = 16;

/// A mutable, comparable holder for secret text
///
/// # Security
/// - All code units are zeroized on drop (via `ZeroizeOnDrop`)
/// - Growing never abandons an unzeroed allocation
/// - Debug and Display implementations redact the value
/// - Equality runs in constant time for equal lengths
///
/// # Example
///
/// ```
/// use passwordsaver_lib::SecretBuffer;
///
/// let mut typed = SecretBuffer::new();
/// for c in "hunter2".chars() {
///     typed.push(c);
/// }
/// assert_eq!(typed, SecretBuffer::from_plain("hunter2"));
/// assert_eq!(typed.byte_len(), 14);
/// ```
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretBuffer {
    units: Vec<u16>,
}

impl SecretBuffer {
    /// Creates an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self { units: Vec::new() }
    }

    /// Copies plain text into a new buffer
    ///
    /// The caller remains responsible for the `&str` it passed in.
    #[must_use]
    pub fn from_plain(plain: &str) -> Self {
        let mut units = Vec::with_capacity(plain.encode_utf16().count());
        units.extend(plain.encode_utf16());
        Self { units }
    }

    /// Builds a buffer from a little-endian UTF-16 blob
    ///
    /// The blob is read as `bytes.len() / 2` characters; a dangling odd byte is
    /// ignored.
    #[must_use]
    pub fn from_utf16_le_bytes(bytes: &[u8]) -> Self {
        let mut units = Vec::with_capacity(bytes.len() / 2);
        units.extend(
            bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
        );
        Self { units }
    }

    /// Appends one character
    pub fn push(&mut self, ch: char) {
        let mut encoded = [0u16; 2];
        let len = ch.encode_utf16(&mut encoded).len();
        self.reserve_zeroing(len);
        self.units.extend_from_slice(&encoded[..len]);
        encoded.zeroize();
    }

    /// Removes the last character, returning whether there was one
    pub fn pop(&mut self) -> bool {
        let len = self.units.len();
        if len == 0 {
            return false;
        }

        let paired = len >= 2
            && is_low_surrogate(self.units[len - 1])
            && is_high_surrogate(self.units[len - 2]);
        let keep = if paired { len - 2 } else { len - 1 };

        self.units[keep..].zeroize();
        self.units.truncate(keep);
        true
    }

    /// Zeroes the contents and leaves the buffer empty
    pub fn clear(&mut self) {
        self.units.zeroize();
    }

    /// Number of UTF-16 characters held
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Size of the secret as the vault stores it (two bytes per character)
    pub fn byte_len(&self) -> usize {
        self.units.len() * 2
    }

    /// Little-endian UTF-16 copy for marshalling, zeroed when dropped
    pub fn to_utf16_le_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(self.byte_len()));
        for unit in &self.units {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    /// Runs `f` against a transient plain-text view of the secret
    ///
    /// The decoded string lives only for the duration of the call and is wiped
    /// before this returns, whether `f` succeeds or not.
    pub fn with_plain<R>(&self, f: impl FnOnce(&str) -> R) -> Result<R, AppError> {
        // Three UTF-8 bytes per unit is enough for any UTF-16 input, so the
        // string never reallocates and leaves no copy behind.
        let mut plain = Zeroizing::new(String::with_capacity(self.units.len() * 3));
        for decoded in char::decode_utf16(self.units.iter().copied()) {
            match decoded {
                Ok(c) => plain.push(c),
                Err(_) => {
                    return Err(AppError::InvalidCredentials {
                        reason: "secret is not valid UTF-16".to_string(),
                    })
                }
            }
        }
        Ok(f(plain.as_str()))
    }

    /// Constant-time comparison
    ///
    /// A length mismatch answers immediately; equal lengths always scan every
    /// character.
    pub fn ct_eq(&self, other: &Self) -> bool {
        self.units.as_slice().ct_eq(other.units.as_slice()).into()
    }

    fn reserve_zeroing(&mut self, additional: usize) {
        let needed = self.units.len() + additional;
        if needed <= self.units.capacity() {
            return;
        }

        let capacity = needed.max(self.units.capacity() * 2).max(MIN_GROWTH);
        let mut grown = Vec::with_capacity(capacity);
        grown.extend_from_slice(&self.units);
        self.units.zeroize();
        self.units = grown;
    }
}

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

impl PartialEq for SecretBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other)
    }
}

impl Eq for SecretBuffer {}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer([REDACTED, {} chars])", self.units.len())
    }
}

impl fmt::Display for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_buffers() {
        let a = SecretBuffer::from_plain("correct horse");
        let b = SecretBuffer::from_plain("correct horse");
        assert_eq!(a, b);
        assert!(a.ct_eq(&b));
    }

    #[test]
    fn test_different_length_or_content() {
        let a = SecretBuffer::from_plain("secret");
        assert_ne!(a, SecretBuffer::from_plain("secret1"));
        assert_ne!(a, SecretBuffer::from_plain("secreT"));
        assert_ne!(a, SecretBuffer::new());
    }

    #[test]
    fn test_push_builds_same_secret_across_growth() {
        let plain = "a fairly long passphrase that forces several reallocations";
        let mut typed = SecretBuffer::new();
        for c in plain.chars() {
            typed.push(c);
        }
        assert_eq!(typed, SecretBuffer::from_plain(plain));
        assert_eq!(typed.len(), plain.len());
    }

    #[test]
    fn test_pop_removes_whole_surrogate_pair() {
        let mut secret = SecretBuffer::from_plain("pw🔑");
        assert_eq!(secret.len(), 4);
        assert!(secret.pop());
        assert_eq!(secret, SecretBuffer::from_plain("pw"));
        assert!(secret.pop());
        assert!(secret.pop());
        assert!(!secret.pop());
        assert!(secret.is_empty());
    }

    #[test]
    fn test_byte_len_is_two_per_char() {
        let secret = SecretBuffer::from_plain("ab€");
        assert_eq!(secret.len(), 3);
        assert_eq!(secret.byte_len(), 6);
        assert_eq!(secret.to_utf16_le_bytes().as_slice(), &[0x61, 0, 0x62, 0, 0xAC, 0x20]);
    }

    #[test]
    fn test_from_utf16_le_bytes_ignores_odd_byte() {
        let secret = SecretBuffer::from_utf16_le_bytes(&[0x68, 0, 0x69, 0, 0x21]);
        assert_eq!(secret, SecretBuffer::from_plain("hi"));
    }

    #[test]
    fn test_with_plain_scoped_view() {
        let secret = SecretBuffer::from_plain("p@ss wörd");
        let len = secret.with_plain(|plain| {
            assert_eq!(plain, "p@ss wörd");
            plain.len()
        });
        assert_eq!(len.unwrap(), "p@ss wörd".len());
    }

    #[test]
    fn test_with_plain_rejects_lone_surrogate() {
        let secret = SecretBuffer::from_utf16_le_bytes(&[0x00, 0xD8]);
        let result = secret.with_plain(|_| ());
        assert!(matches!(result, Err(AppError::InvalidCredentials { .. })));
    }

    #[test]
    fn test_clear() {
        let mut secret = SecretBuffer::from_plain("secret");
        secret.clear();
        assert!(secret.is_empty());
        assert_eq!(secret, SecretBuffer::new());
    }

    #[test]
    fn test_debug_and_display_redacted() {
        let secret = SecretBuffer::from_plain("secret123");
        let debug_output = format!("{:?}", secret);
        assert!(!debug_output.contains("secret123"));
        assert!(debug_output.contains("9 chars"));
        assert_eq!(secret.to_string(), "[REDACTED]");
    }
}
