//! FILENAME: core/engine/src/id.rs
//! PURPOSE: Position-derived identifiers for columns and rows.
//! CONTEXT: Both ids are 1-based (`position + 1`), assigned once at load and
//! never reused. On the wire they travel as decimal strings; integers are
//! accepted too.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

macro_rules! position_id {
    ($name:ident, $what:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// Id for the item at 0-based `position`.
            pub fn from_position(position: usize) -> Self {
                $name(position as u32 + 1)
            }

            /// 0-based position of the item.
            pub fn position(self) -> usize {
                self.0.saturating_sub(1) as usize
            }

            /// Parses a decimal id. Zero and non-numeric keys are rejected.
            pub fn parse(key: &str) -> Option<Self> {
                key.trim().parse::<u32>().ok().filter(|n| *n > 0).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct IdVisitor;

                impl<'de> Visitor<'de> for IdVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        write!(f, "a positive {} id as string or integer", $what)
                    }

                    fn visit_str<E: de::Error>(self, v: &str) -> Result<$name, E> {
                        $name::parse(v).ok_or_else(|| E::custom(format!("invalid {} id: {}", $what, v)))
                    }

                    fn visit_u64<E: de::Error>(self, v: u64) -> Result<$name, E> {
                        u32::try_from(v)
                            .ok()
                            .filter(|n| *n > 0)
                            .map($name)
                            .ok_or_else(|| E::custom(format!("invalid {} id: {}", $what, v)))
                    }

                    fn visit_i64<E: de::Error>(self, v: i64) -> Result<$name, E> {
                        match u64::try_from(v) {
                            Ok(n) => self.visit_u64(n),
                            Err(_) => Err(E::custom(format!("invalid {} id: {}", $what, v))),
                        }
                    }
                }

                deserializer.deserialize_any(IdVisitor)
            }
        }
    };
}

position_id!(ColumnId, "column");
position_id!(RowId, "row");
