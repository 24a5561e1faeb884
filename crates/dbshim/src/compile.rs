//! Clause compiler.
//!
//! Pure functions that turn builder state into SQL fragments. All quoting
//! goes through the [`Connection`], so the output is dialect-correct for the
//! backend it will run on. Nothing here touches the network except string
//! escaping, which may connect implicitly.

use crate::builder::JoinSpec;
use crate::condition::{Condition, Logic, check_balance};
use crate::connection::Connection;
use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use crate::value::Value;

/// Compile a WHERE/HAVING condition list (without the keyword).
///
/// A logic keyword is emitted before every entry except the very first one
/// and any entry directly following an opening parenthesis.
pub fn compile_conditions(conn: &dyn Connection, conditions: &[Condition]) -> DbResult<String> {
    check_balance(conditions)?;

    let mut sql = String::new();
    let mut after_open = false;
    for condition in conditions {
        match condition {
            Condition::Open(logic) => {
                push_logic(&mut sql, *logic, after_open);
                sql.push('(');
                after_open = true;
            }
            Condition::Close => {
                sql.push(')');
                after_open = false;
            }
            Condition::Predicate {
                logic,
                column,
                op,
                value,
            } => {
                push_logic(&mut sql, *logic, after_open);
                sql.push_str(&compile_predicate(conn, column, op, value)?);
                after_open = false;
            }
        }
    }
    Ok(sql)
}

fn push_logic(sql: &mut String, logic: Logic, after_open: bool) {
    if !sql.is_empty() && !after_open {
        sql.push(' ');
        sql.push_str(logic.as_str());
        sql.push(' ');
    }
}

/// `column OP value`, with NULL-aware and list-aware operators.
fn compile_predicate(
    conn: &dyn Connection,
    column: &Ident,
    op: &str,
    value: &Value,
) -> DbResult<String> {
    let mut op = op.trim().to_ascii_uppercase();
    if value.is_null() {
        match op.as_str() {
            "=" => op = "IS".to_string(),
            "!=" | "<>" => op = "IS NOT".to_string(),
            _ => {}
        }
    }

    let column = conn.quote_column(column)?;
    let rendered = match (op.as_str(), value) {
        ("BETWEEN" | "NOT BETWEEN", Value::List(bounds)) if bounds.len() == 2 => {
            format!("{} AND {}", conn.quote(&bounds[0])?, conn.quote(&bounds[1])?)
        }
        ("BETWEEN" | "NOT BETWEEN", _) => {
            return Err(DbError::validation(format!(
                "{op} on {column} needs exactly two bounds"
            )));
        }
        ("IN" | "NOT IN", Value::Expr(sql)) => sql.clone(),
        ("IN" | "NOT IN", _) => format!("({})", conn.quote(value)?),
        _ => conn.quote(value)?,
    };
    Ok(format!("{column} {op} {rendered}"))
}

/// Compile JOIN clauses, space-separated.
///
/// A single ON pair renders bare; several pairs are wrapped in one
/// parenthesized AND group.
pub fn compile_join(conn: &dyn Connection, joins: &[JoinSpec]) -> DbResult<String> {
    let mut out = Vec::with_capacity(joins.len());
    for join in joins {
        let mut sql = match join.kind.as_deref().map(str::trim) {
            Some(kind) if !kind.is_empty() => format!("{} JOIN ", kind.to_ascii_uppercase()),
            _ => "JOIN ".to_string(),
        };
        sql.push_str(&conn.quote_table(&join.table)?);

        if !join.using.is_empty() {
            sql.push_str(" USING (");
            sql.push_str(&compile_columns(conn, &join.using)?);
            sql.push(')');
        } else if !join.on.is_empty() {
            let pairs = join
                .on
                .iter()
                .map(|(left, right)| {
                    Ok(format!(
                        "{} = {}",
                        conn.quote_column(left)?,
                        conn.quote_column(right)?
                    ))
                })
                .collect::<DbResult<Vec<_>>>()?;
            if pairs.len() == 1 {
                sql.push_str(" ON ");
                sql.push_str(&pairs[0]);
            } else {
                sql.push_str(" ON (");
                sql.push_str(&pairs.join(" AND "));
                sql.push(')');
            }
        }
        out.push(sql);
    }
    Ok(out.join(" "))
}

/// Compile `ORDER BY col [DIR], ...` (empty string for no pairs).
pub fn compile_order_by(
    conn: &dyn Connection,
    pairs: &[(Ident, Option<String>)],
) -> DbResult<String> {
    if pairs.is_empty() {
        return Ok(String::new());
    }
    let items = pairs
        .iter()
        .map(|(column, direction)| {
            let mut item = conn.quote_column(column)?;
            if let Some(direction) = direction.as_deref().map(str::trim)
                && !direction.is_empty()
            {
                item.push(' ');
                item.push_str(&direction.to_ascii_uppercase());
            }
            Ok(item)
        })
        .collect::<DbResult<Vec<_>>>()?;
    Ok(format!("ORDER BY {}", items.join(", ")))
}

/// Compile `GROUP BY col, ...` (empty string for no columns).
pub fn compile_group_by(conn: &dyn Connection, columns: &[Ident]) -> DbResult<String> {
    if columns.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("GROUP BY {}", compile_columns(conn, columns)?))
}

/// Comma-separated quoted columns.
pub fn compile_columns(conn: &dyn Connection, columns: &[Ident]) -> DbResult<String> {
    let quoted = columns
        .iter()
        .map(|c| conn.quote_column(c))
        .collect::<DbResult<Vec<_>>>()?;
    Ok(quoted.join(", "))
}

/// Comma-separated `col = value` assignments.
pub fn compile_set(conn: &dyn Connection, pairs: &[(Ident, Value)]) -> DbResult<String> {
    let items = pairs
        .iter()
        .map(|(column, value)| {
            Ok(format!(
                "{} = {}",
                conn.quote_column(column)?,
                conn.quote(value)?
            ))
        })
        .collect::<DbResult<Vec<_>>>()?;
    Ok(items.join(", "))
}

#[cfg(test)]
mod tests;
