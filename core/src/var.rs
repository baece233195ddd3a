//! Condition variable identifiers.
//!
//! The simulator names variables by numeric id. No name table ships with the
//! data files, so every id maps to the synthetic name `var<id>` and only names
//! of that form resolve back.

use std::fmt;

use crate::error::ParError;

/// A condition variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    pub id: i64,
    pub name: String,
}

impl Var {
    pub fn by_id(id: i64) -> Self {
        Self {
            id,
            name: format!("var{id}"),
        }
    }

    /// Resolve a textual variable name.
    pub fn by_name(name: &str) -> Result<Self, ParError> {
        name.strip_prefix("var")
            .and_then(|digits| digits.parse::<i64>().ok())
            .map(Self::by_id)
            .ok_or_else(|| ParError::UnknownVariable(name.to_string()))
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_and_name_agree() {
        let v = Var::by_id(42);
        assert_eq!(v.name, "var42");
        assert_eq!(Var::by_name("var42").unwrap(), v);
    }

    #[test]
    fn test_unknown_names() {
        assert!(Var::by_name("height").is_err());
        assert!(Var::by_name("var").is_err());
        assert!(Var::by_name("var1x").is_err());
    }

    #[test]
    fn test_name_is_normalized() {
        assert_eq!(Var::by_name("var007").unwrap().name, "var7");
    }
}
