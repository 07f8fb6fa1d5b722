//! Comparator whitelist.
//!
//! Every operator that reaches SQL text passes through [`Comparator::parse`].
//! The only way to obtain a [`Comparator`] is from this fixed set, so an
//! unvalidated operator token cannot be emitted.

use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};

/// Operators accepted from criteria documents.
pub const ALLOWED_COMPARATORS: [&str; 12] = [
    "=", "<", ">", "<=", ">=", "<>", "IN", "NOT IN", "LIKE", "NOT LIKE", "?&", "?|",
];

/// A whitelisted relational, pattern or JSONB array operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `<>`
    Ne,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `?&` - array contains all of the given elements.
    ContainsAll,
    /// `?|` - array contains any of the given elements.
    ContainsAny,
}

impl Comparator {
    /// Validates a comparator against the whitelist.
    ///
    /// Matching is exact: no trimming, no case folding.
    pub fn parse(s: &str) -> QueryResult<Self> {
        match s {
            "=" => Ok(Comparator::Eq),
            "<" => Ok(Comparator::Lt),
            ">" => Ok(Comparator::Gt),
            "<=" => Ok(Comparator::Le),
            ">=" => Ok(Comparator::Ge),
            "<>" => Ok(Comparator::Ne),
            "IN" => Ok(Comparator::In),
            "NOT IN" => Ok(Comparator::NotIn),
            "LIKE" => Ok(Comparator::Like),
            "NOT LIKE" => Ok(Comparator::NotLike),
            "?&" => Ok(Comparator::ContainsAll),
            "?|" => Ok(Comparator::ContainsAny),
            _ => {
                tracing::warn!(comparator = %s, "rejected forbidden comparator");
                Err(QueryError::forbidden(s))
            }
        }
    }

    /// Returns the SQL token.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Lt => "<",
            Comparator::Gt => ">",
            Comparator::Le => "<=",
            Comparator::Ge => ">=",
            Comparator::Ne => "<>",
            Comparator::In => "IN",
            Comparator::NotIn => "NOT IN",
            Comparator::Like => "LIKE",
            Comparator::NotLike => "NOT LIKE",
            Comparator::ContainsAll => "?&",
            Comparator::ContainsAny => "?|",
        }
    }

    /// Returns true for `IN` and `NOT IN`, which take a parenthesised list.
    pub fn is_set_membership(&self) -> bool {
        matches!(self, Comparator::In | Comparator::NotIn)
    }

    /// Returns true for the negated forms.
    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            Comparator::Ne | Comparator::NotIn | Comparator::NotLike
        )
    }
}

impl FromStr for Comparator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Comparator::parse(s)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Validates an optional comparator, falling back to `default` when absent.
pub fn validate_or(comparator: Option<&str>, default: Comparator) -> QueryResult<Comparator> {
    comparator.map_or(Ok(default), Comparator::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist_round_trips() {
        for token in ALLOWED_COMPARATORS {
            let comparator = Comparator::parse(token).unwrap();
            assert_eq!(comparator.as_sql(), token);
        }
    }

    #[test]
    fn test_rejects_everything_else() {
        for token in [
            "", "==", "!=", "in", "like", "ILIKE", "NOT ILIKE", "@>", "= 1; DROP TABLE data; --",
            " =", "OR 1=1",
        ] {
            let err = Comparator::parse(token).unwrap_err();
            assert!(err.is_forbidden_operator(), "accepted {:?}", token);
        }
    }

    #[test]
    fn test_validate_or_default() {
        assert_eq!(validate_or(None, Comparator::In).unwrap(), Comparator::In);
        assert_eq!(
            validate_or(Some("NOT IN"), Comparator::In).unwrap(),
            Comparator::NotIn
        );
        assert!(validate_or(Some("UNION"), Comparator::Eq).is_err());
    }

    #[test]
    fn test_negation_flags() {
        assert!(Comparator::NotIn.is_negated());
        assert!(Comparator::Ne.is_negated());
        assert!(!Comparator::ContainsAll.is_negated());
        assert!(Comparator::In.is_set_membership());
        assert!(!Comparator::Eq.is_set_membership());
    }
}
