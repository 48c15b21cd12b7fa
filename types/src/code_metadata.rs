use core::fmt;

use serde::{Deserialize, Serialize};

/// Two-byte flag set attached to deployed contract code.
#[derive(Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMetadata {
    /// The contract may be redeployed in place through the upgrade path.
    pub upgradeable: bool,
    /// The contract accepts value transfers.
    pub payable: bool,
    /// Other contracts may read this contract's storage.
    pub readable: bool,
}

const METADATA_UPGRADEABLE: u8 = 0b0000_0001;
const METADATA_READABLE: u8 = 0b0000_0100;
const METADATA_PAYABLE: u8 = 0b0000_0010;

impl CodeMetadata {
    /// Length of the serialized form in bytes.
    pub const LENGTH: usize = 2;

    /// Encodes the flags into their two-byte wire form.
    pub fn to_bytes(self) -> [u8; Self::LENGTH] {
        let mut first = 0u8;
        if self.upgradeable {
            first |= METADATA_UPGRADEABLE;
        }
        if self.readable {
            first |= METADATA_READABLE;
        }
        let mut second = 0u8;
        if self.payable {
            second |= METADATA_PAYABLE;
        }
        [first, second]
    }

    /// Decodes the flags from their wire form. Unknown bits are ignored;
    /// inputs shorter than two bytes decode as all-clear flags.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let first = bytes.first().copied().unwrap_or(0);
        let second = bytes.get(1).copied().unwrap_or(0);
        CodeMetadata {
            upgradeable: first & METADATA_UPGRADEABLE != 0,
            readable: first & METADATA_READABLE != 0,
            payable: second & METADATA_PAYABLE != 0,
        }
    }
}

impl fmt::Debug for CodeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CodeMetadata")
            .field("upgradeable", &self.upgradeable)
            .field("payable", &self.payable)
            .field("readable", &self.readable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_round_trip_all_flag_combinations() {
        for bits in 0u8..8 {
            let metadata = CodeMetadata {
                upgradeable: bits & 1 != 0,
                payable: bits & 2 != 0,
                readable: bits & 4 != 0,
            };
            assert_eq!(CodeMetadata::from_bytes(&metadata.to_bytes()), metadata);
        }
    }

    #[test]
    fn should_decode_short_input_as_default() {
        assert_eq!(CodeMetadata::from_bytes(&[]), CodeMetadata::default());
    }
}
