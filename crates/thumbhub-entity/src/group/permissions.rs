//! Group permission levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission level of a group, from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "group_permissions", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GroupPermissions {
    /// Members see only their own data.
    Private,
    /// Members may read each other's data.
    ReadOnly,
    /// Members may read and annotate each other's data.
    ReadAnnotate,
    /// Members may read and modify each other's data.
    ReadWrite,
}

impl GroupPermissions {
    /// Whether members can read data owned by other members.
    pub fn is_group_readable(&self) -> bool {
        !matches!(self, Self::Private)
    }

    /// Whether members can write data owned by other members.
    pub fn is_group_writable(&self) -> bool {
        matches!(self, Self::ReadWrite)
    }

    /// Return the level as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::ReadOnly => "read_only",
            Self::ReadAnnotate => "read_annotate",
            Self::ReadWrite => "read_write",
        }
    }
}

impl fmt::Display for GroupPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GroupPermissions {
    type Err = thumbhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "private" => Ok(Self::Private),
            "read_only" => Ok(Self::ReadOnly),
            "read_annotate" => Ok(Self::ReadAnnotate),
            "read_write" => Ok(Self::ReadWrite),
            _ => Err(thumbhub_core::AppError::validation(format!(
                "Invalid group permissions: '{s}'. Expected one of: private, read_only, read_annotate, read_write"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_read_write_is_group_writable() {
        assert!(GroupPermissions::ReadWrite.is_group_writable());
        assert!(!GroupPermissions::ReadAnnotate.is_group_writable());
        assert!(!GroupPermissions::ReadOnly.is_group_writable());
        assert!(!GroupPermissions::Private.is_group_writable());
    }

    #[test]
    fn test_private_is_not_group_readable() {
        assert!(!GroupPermissions::Private.is_group_readable());
        assert!(GroupPermissions::ReadOnly.is_group_readable());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "read-only".parse::<GroupPermissions>().unwrap(),
            GroupPermissions::ReadOnly
        );
        assert!("public".parse::<GroupPermissions>().is_err());
    }
}
