//! The two id spaces of the table.
//!
//! A [`ContainerId`] names a physical cup and never changes during a round; a
//! [`Slot`] names a place on the table. Keeping them as separate types stops a
//! cup id from being used to index slot tables and vice versa.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of cups (and slots) on the table.
pub const CUPS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("{kind} id {value} out of range (expected 0..=2)")]
    OutOfRange { kind: &'static str, value: u64 },
}

macro_rules! table_id {
    ($name:ident, $kind:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(try_from = "u8", into = "u8")]
        pub struct $name(u8);

        impl $name {
            pub const ALL: [Self; CUPS] = [Self(0), Self(1), Self(2)];

            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub fn get(self) -> u8 {
                self.0
            }
        }

        impl TryFrom<u8> for $name {
            type Error = IdError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                if (value as usize) < CUPS {
                    Ok(Self(value))
                } else {
                    Err(IdError::OutOfRange {
                        kind: $kind,
                        value: value as u64,
                    })
                }
            }
        }

        impl TryFrom<usize> for $name {
            type Error = IdError;

            fn try_from(value: usize) -> Result<Self, Self::Error> {
                u8::try_from(value)
                    .ok()
                    .and_then(|v| Self::try_from(v).ok())
                    .ok_or(IdError::OutOfRange {
                        kind: $kind,
                        value: value as u64,
                    })
            }
        }

        impl From<$name> for u8 {
            fn from(id: $name) -> u8 {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

table_id!(ContainerId, "container");
table_id!(Slot, "slot");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_only_table_range() {
        assert_eq!(ContainerId::try_from(2u8).unwrap().index(), 2);
        assert_eq!(
            ContainerId::try_from(3u8),
            Err(IdError::OutOfRange {
                kind: "container",
                value: 3
            })
        );
        assert!(Slot::try_from(300usize).is_err());
        assert_eq!(Slot::try_from(1usize).unwrap(), Slot::ALL[1]);
    }

    #[test]
    fn serde_rejects_out_of_range_ids() {
        let ok: ContainerId = serde_json::from_str("1").unwrap();
        assert_eq!(ok.get(), 1);
        assert!(serde_json::from_str::<Slot>("7").is_err());
        assert_eq!(serde_json::to_string(&Slot::ALL[2]).unwrap(), "2");
    }
}
