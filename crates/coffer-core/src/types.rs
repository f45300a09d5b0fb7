//! Strong type definitions for Coffer.
//!
//! All identifiers are 128-bit newtypes so that an entry id can never be
//! passed where a group id is expected.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub [u8; 16]);

        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }

            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                let mut bytes = [0u8; 16];
                rand::thread_rng().fill_bytes(&mut bytes);
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let bytes = hex::decode(s)?;
                let arr: [u8; 16] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), &self.to_hex()[..12])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl From<[u8; 16]> for $name {
            fn from(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = std::array::TryFromSliceError;

            fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
                let arr: [u8; 16] = slice.try_into()?;
                Ok(Self(arr))
            }
        }
    };
}

define_id! {
    /// Identifier of a safe entry owned by a single user.
    EntryId
}

define_id! {
    /// Identifier of a sharing group.
    GroupId
}

define_id! {
    /// Identifier of one group's copy of an entry.
    ShareId
}

define_id! {
    /// Identifier of an authenticated user.
    UserId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_hex_roundtrip() {
        let id = ShareId::from_bytes([0x42; 16]);
        let recovered: ShareId = id.to_hex().parse().unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_id_display_is_full_hex() {
        let id = GroupId::from_bytes([0xab; 16]);
        assert_eq!(id.to_string(), "ab".repeat(16));
    }

    #[test]
    fn test_id_debug_names_type() {
        let id = EntryId::from_bytes([0xcd; 16]);
        assert_eq!(format!("{:?}", id), "EntryId(cdcdcdcdcdcd)");
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(UserId::from_hex("abcd").is_err());
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(ShareId::generate(), ShareId::generate());
    }
}
