//! Condition list entries for WHERE and HAVING clauses.
//!
//! A clause is a flat, ordered list of [`Condition`]s: predicates plus
//! explicit group open/close markers. The compiler turns
//!
//! ```text
//! Open(And), Predicate(And, a = 1), Predicate(Or, b = 2), Close
//! ```
//!
//! into `("a" = 1 OR "b" = 2)`.

use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use crate::value::Value;

/// How an entry joins the entry before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

/// One entry of a condition list.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Opening parenthesis.
    Open(Logic),
    /// Closing parenthesis.
    Close,
    /// `column OP value`.
    Predicate {
        logic: Logic,
        column: Ident,
        op: String,
        value: Value,
    },
}

impl Condition {
    /// Create a predicate entry.
    pub fn predicate(
        logic: Logic,
        column: impl Into<Ident>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Condition::Predicate {
            logic,
            column: column.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    /// The logic keyword of this entry (`None` for `Close`).
    pub fn logic(&self) -> Option<Logic> {
        match self {
            Condition::Open(logic) | Condition::Predicate { logic, .. } => Some(*logic),
            Condition::Close => None,
        }
    }
}

/// Verify that every `Open` has a matching `Close`, no `Close` comes first,
/// and no group is empty.
pub fn check_balance(conditions: &[Condition]) -> DbResult<()> {
    let mut depth: usize = 0;
    for (i, condition) in conditions.iter().enumerate() {
        match condition {
            Condition::Open(_) => depth += 1,
            Condition::Close => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    DbError::validation(format!("Unmatched group close at position {i}"))
                })?;
                if i > 0 && matches!(conditions[i - 1], Condition::Open(_)) {
                    return Err(DbError::validation(format!(
                        "Empty condition group at position {}",
                        i - 1
                    )));
                }
            }
            Condition::Predicate { .. } => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(DbError::validation(format!(
            "{depth} condition group(s) left open"
        )))
    }
}
