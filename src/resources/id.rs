//! Resource identifiers.
//!
//! Windows containers identify a resource either by a numeric ordinal or by a
//! case-insensitive name; both NE and PE additionally use the same tagged form
//! for resource *types*. [`crate::resources::ResourceId`] is the key type used
//! throughout the lookup API, with equality and hashing rules that keep the two
//! categories distinct and name comparisons case-insensitive.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a resource or resource type within an executable container.
///
/// Numeric ordinals and names are distinct categories: `Numeric(5)` never equals
/// `Name("5")` or `Name("0x00000005")`. Name equality ignores ASCII case, matching
/// the loader behavior of the original platform. Hashing is performed over the
/// category tag plus the case-folded string form, so the type is usable as a map
/// key consistently with its equality rule.
///
/// # Examples
///
/// ```rust
/// use exescope::resources::ResourceId;
///
/// let by_ordinal = ResourceId::from(6u32);
/// assert_eq!(by_ordinal.to_string(), "0x00000006");
///
/// let by_name = ResourceId::from("FontDir");
/// assert_eq!(by_name, ResourceId::from("FONTDIR"));
/// assert_ne!(by_name, by_ordinal);
/// ```
#[derive(Debug, Clone)]
pub enum ResourceId {
    /// No identifier. Matches only another `Null`.
    Null,
    /// A numeric ordinal.
    Numeric(u32),
    /// A name, compared ASCII-case-insensitively.
    Name(String),
}

impl ResourceId {
    /// Returns `true` for the numeric category.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, ResourceId::Numeric(_))
    }

    /// Returns `true` for the name category.
    #[must_use]
    pub fn is_name(&self) -> bool {
        matches!(self, ResourceId::Name(_))
    }

    /// The numeric ordinal, when this is the numeric category.
    #[must_use]
    pub fn as_numeric(&self) -> Option<u32> {
        match self {
            ResourceId::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    /// The name string, when this is the name category.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            ResourceId::Name(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Null => Ok(()),
            ResourceId::Numeric(value) => write!(f, "0x{value:08X}"),
            ResourceId::Name(name) => f.write_str(name),
        }
    }
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResourceId::Null, ResourceId::Null) => true,
            (ResourceId::Numeric(a), ResourceId::Numeric(b)) => a == b,
            (ResourceId::Name(a), ResourceId::Name(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl Eq for ResourceId {}

impl Hash for ResourceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash over the category tag plus the string form so that hashing agrees
        // with the case-insensitive equality rule.
        match self {
            ResourceId::Null => state.write_u8(0),
            ResourceId::Numeric(value) => {
                state.write_u8(1);
                format!("0x{value:08X}").hash(state);
            }
            ResourceId::Name(name) => {
                state.write_u8(2);
                name.to_ascii_lowercase().hash(state);
            }
        }
    }
}

impl From<u32> for ResourceId {
    fn from(value: u32) -> Self {
        ResourceId::Numeric(value)
    }
}

impl From<u16> for ResourceId {
    fn from(value: u16) -> Self {
        ResourceId::Numeric(u32::from(value))
    }
}

impl From<&str> for ResourceId {
    fn from(name: &str) -> Self {
        ResourceId::Name(name.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(name: String) -> Self {
        ResourceId::Name(name)
    }
}

impl PartialEq<u32> for ResourceId {
    fn eq(&self, other: &u32) -> bool {
        matches!(self, ResourceId::Numeric(value) if value == other)
    }
}

impl PartialEq<&str> for ResourceId {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, ResourceId::Name(name) if name.eq_ignore_ascii_case(other))
    }
}
