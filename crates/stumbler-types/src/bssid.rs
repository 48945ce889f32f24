//! Canonical BSSID handling.
//!
//! Wi-Fi drivers report access point hardware addresses in a variety of
//! textual forms (`aa:bb:cc:dd:ee:ff`, `AA-BB-CC-DD-EE-FF`, `aabb.ccdd.eeff`,
//! or twelve bare hex digits). [`Bssid`] is the canonical form used as the
//! deduplication key: six octets rendered as upper-case, colon-delimited pairs.

use core::fmt;
use core::str::FromStr;

use crate::error::{ParseError, ParseResult};

/// Separators accepted between hex digits when parsing.
const SEPARATORS: [char; 4] = [':', '-', '.', ' '];

/// A canonicalized access point hardware address.
///
/// # Examples
///
/// ```
/// use stumbler_types::Bssid;
///
/// let a: Bssid = " aa:bb:cc:dd:ee:ff ".parse().unwrap();
/// let b: Bssid = "AA-BB-CC-DD-EE-FF".parse().unwrap();
/// let c: Bssid = "aabb.ccdd.eeff".parse().unwrap();
///
/// assert_eq!(a, b);
/// assert_eq!(b, c);
/// assert_eq!(a.to_string(), "AA:BB:CC:DD:EE:FF");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bssid([u8; 6]);

impl Bssid {
    /// The all-ones broadcast address.
    pub const BROADCAST: Bssid = Bssid([0xFF; 6]);

    /// The all-zero address reported by some drivers for hidden entries.
    pub const ZERO: Bssid = Bssid([0x00; 6]);

    /// Create a BSSID from raw octets.
    #[must_use]
    pub const fn from_octets(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Parse a BSSID from any of the accepted textual forms.
    ///
    /// Leading/trailing whitespace is trimmed and `:`, `-`, `.` and space
    /// separators are stripped before the remaining twelve hex digits are
    /// decoded. Letter case is irrelevant.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidBssid`] if the input does not reduce to
    /// exactly twelve hex digits.
    pub fn parse(input: &str) -> ParseResult<Self> {
        let digits: Vec<char> = input
            .trim()
            .chars()
            .filter(|c| !SEPARATORS.contains(c))
            .collect();

        if digits.len() != 12 {
            return Err(ParseError::InvalidBssid {
                input: input.to_string(),
                reason: "expected 12 hex digits",
            });
        }

        let mut octets = [0u8; 6];
        for (octet, pair) in octets.iter_mut().zip(digits.chunks(2)) {
            let hi = pair[0].to_digit(16);
            let lo = pair[1].to_digit(16);
            match (hi, lo) {
                (Some(hi), Some(lo)) => *octet = ((hi << 4) | lo) as u8,
                _ => {
                    return Err(ParseError::InvalidBssid {
                        input: input.to_string(),
                        reason: "non-hex character",
                    });
                }
            }
        }

        Ok(Self(octets))
    }

    /// The six raw octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// The organizationally unique identifier (first three octets).
    #[must_use]
    pub fn oui(&self) -> [u8; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    /// Whether the group (multicast) bit is set.
    #[must_use]
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Whether the locally-administered bit is set.
    ///
    /// Tethering phones and other soft APs commonly use locally administered
    /// addresses.
    #[must_use]
    pub const fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Canonical text form without separators, lower-case.
    ///
    /// Used for prefix matching against blocklists that store bare hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

impl FromStr for Bssid {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Bssid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Bssid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Bssid::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Canonicalize a raw BSSID string.
///
/// Convenience wrapper around [`Bssid::parse`] returning the canonical text.
///
/// # Errors
///
/// Returns [`ParseError::InvalidBssid`] if the input is not a hardware address.
pub fn canonicalize_bssid(raw: &str) -> ParseResult<String> {
    Bssid::parse(raw).map(|b| b.to_string())
}
