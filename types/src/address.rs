use core::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// The number of bytes in an [`Address`].
pub const ADDRESS_LENGTH: usize = 32;

/// A 32-byte opaque account identifier.
///
/// Addresses are never interpreted by the engine; derivation of fresh
/// addresses is delegated to the blockchain hook.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Constructs an address from raw bytes.
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    /// Returns the zero address.
    pub const fn zero() -> Self {
        Address([0; ADDRESS_LENGTH])
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the address, returning the underlying array.
    pub fn into_inner(self) -> [u8; ADDRESS_LENGTH] {
        self.0
    }

    /// Constructs an address from a byte slice.
    ///
    /// Returns `None` if the slice is not exactly 32 bytes long.
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; ADDRESS_LENGTH] = bytes.try_into().ok()?;
        Some(Address(array))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex::encode(self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_string = String::deserialize(deserializer)?;
        let bytes = hex::decode(&hex_string).map_err(de::Error::custom)?;
        Address::try_from_slice(&bytes)
            .ok_or_else(|| de::Error::custom("address is not 32 bytes in length"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_round_trip_via_serde() {
        let address = Address::new([7; 32]);
        let json = serde_json::to_string(&address).unwrap();
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(address, parsed);
    }

    #[test]
    fn should_reject_short_slices() {
        assert!(Address::try_from_slice(&[1, 2, 3]).is_none());
    }
}
