//! Ethernet hardware address used as the L2DA steering key.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of an Ethernet hardware address in bytes.
pub const ETH_ALEN: usize = 6;

/// A 48-bit Ethernet MAC address.
///
/// # Examples
///
/// ```
/// use l2da_types::MacAddress;
///
/// let da: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
/// assert_eq!(da.to_string(), "aa:bb:cc:dd:ee:ff");
/// assert_eq!(da.steering_hash(), 0xee);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; ETH_ALEN]);

impl MacAddress {
    /// The all-zero address.
    pub const ZERO: MacAddress = MacAddress([0; ETH_ALEN]);

    /// Creates an address from raw bytes.
    pub const fn new(bytes: [u8; ETH_ALEN]) -> Self {
        MacAddress(bytes)
    }

    /// Reads an address from the start of `bytes`.
    ///
    /// Returns `None` if fewer than [`ETH_ALEN`] bytes are available.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; ETH_ALEN] = bytes.get(..ETH_ALEN)?.try_into().ok()?;
        Some(MacAddress(raw))
    }

    /// Returns the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; ETH_ALEN] {
        &self.0
    }

    /// Bucket selector for the steering table: the byte at offset `ETH_ALEN - 2`.
    ///
    /// Cheap on purpose. Addresses served by one aggregate tend to share an
    /// OUI, so the low-order bytes carry the entropy.
    pub const fn steering_hash(&self) -> u8 {
        self.0[ETH_ALEN - 2]
    }

    /// Returns true for group addresses (I/G bit of the first octet set).
    /// Broadcast is a multicast address.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = if s.contains(':') { ':' } else { '-' };

        let mut bytes = [0u8; ETH_ALEN];
        let mut count = 0;
        for part in s.split(separator) {
            if count == ETH_ALEN || part.len() != 2 {
                return Err(ParseError::InvalidMacAddress(s.to_string()));
            }
            bytes[count] = u8::from_str_radix(part, 16)
                .map_err(|_| ParseError::InvalidMacAddress(s.to_string()))?;
            count += 1;
        }

        if count != ETH_ALEN {
            return Err(ParseError::InvalidMacAddress(s.to_string()));
        }
        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

impl From<[u8; ETH_ALEN]> for MacAddress {
    fn from(bytes: [u8; ETH_ALEN]) -> Self {
        MacAddress(bytes)
    }
}

impl From<MacAddress> for [u8; ETH_ALEN] {
    fn from(mac: MacAddress) -> [u8; ETH_ALEN] {
        mac.0
    }
}
