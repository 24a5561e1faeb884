//! SQL identifier handling.
//!
//! This module provides [`Ident`], a table or column reference as written by
//! the caller, and the path parser the quoting functions run on it.
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL and escape `"` as `""`
//! - `*` is accepted as the last part (`*`, `users.*`)
//!
//! Every part is re-quoted by the driver when rendered, so `users.id` comes
//! out as `"users"."id"` on PostgreSQL.
//!
//! # Example
//! ```ignore
//! use dbshim::Ident;
//!
//! let col = Ident::from("u.name");
//! let aliased = Ident::from(("u.name", "user_name"));
//! let raw = Ident::expr("COUNT(*)");
//! ```

use crate::error::{DbError, DbResult};

/// A part of a dotted identifier path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Quoted identifier: allows any characters except NUL.
    Quoted(String),
    /// `*` wildcard, only valid as the last part.
    Star,
}

impl IdentPart {
    /// The bare name of the part (`*` for the wildcard).
    pub fn name(&self) -> &str {
        match self {
            IdentPart::Unquoted(s) | IdentPart::Quoted(s) => s,
            IdentPart::Star => "*",
        }
    }
}

/// A table or column reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ident {
    /// A dotted name path with an optional alias.
    Name { name: String, alias: Option<String> },
    /// A raw SQL expression rendered verbatim.
    ///
    /// # Safety
    /// Never build this from user input.
    Expr(String),
}

impl Ident {
    /// Create a name reference.
    pub fn name(name: impl Into<String>) -> Self {
        Ident::Name {
            name: name.into(),
            alias: None,
        }
    }

    /// Create an aliased name reference (`name AS alias`).
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Ident::Name {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Create a raw expression reference.
    pub fn expr(sql: impl Into<String>) -> Self {
        Ident::Expr(sql.into())
    }

    /// Parse the name path of this identifier (`None` for expressions).
    pub fn path(&self) -> DbResult<Option<Vec<IdentPart>>> {
        match self {
            Ident::Name { name, .. } => parse_path(name).map(Some),
            Ident::Expr(_) => Ok(None),
        }
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Ident::name(name)
    }
}

impl From<String> for Ident {
    fn from(name: String) -> Self {
        Ident::name(name)
    }
}

impl From<&String> for Ident {
    fn from(name: &String) -> Self {
        Ident::name(name.clone())
    }
}

impl From<(&str, &str)> for Ident {
    fn from((name, alias): (&str, &str)) -> Self {
        Ident::aliased(name, alias)
    }
}

impl From<&Ident> for Ident {
    fn from(ident: &Ident) -> Self {
        ident.clone()
    }
}

/// Parse an identifier path, supporting dotted and quoted forms.
///
/// - Dotted: `schema.table.column`
/// - Quoted: `"CamelCase"."UserTable"`
/// - Mixed: `public."UserTable".id`
/// - Wildcard: `*`, `users.*`
pub fn parse_path(s: &str) -> DbResult<Vec<IdentPart>> {
    if s.is_empty() {
        return Err(DbError::validation("Identifier cannot be empty"));
    }
    if s.contains('\0') {
        return Err(DbError::validation(
            "Identifier cannot contain NUL character",
        ));
    }

    let mut parts = Vec::new();
    let mut chars = s.chars().peekable();

    while chars.peek().is_some() {
        if parts.last() == Some(&IdentPart::Star) {
            return Err(DbError::validation(format!(
                "'*' must be the last part of identifier '{s}'"
            )));
        }

        // Consume '.' between parts (but require there is a next part).
        if !parts.is_empty() {
            match chars.next() {
                Some('.') => {
                    if chars.peek().is_none() {
                        return Err(DbError::validation("Trailing '.' in identifier"));
                    }
                }
                Some(c) => {
                    return Err(DbError::validation(format!(
                        "Expected '.' between identifier parts, got '{c}'"
                    )));
                }
                None => break,
            }
        }

        if chars.peek() == Some(&'*') {
            chars.next();
            parts.push(IdentPart::Star);
            continue;
        }

        // Quoted identifier part.
        if chars.peek() == Some(&'"') {
            chars.next(); // opening quote
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('"') => {
                        // Escaped quote: ""
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            name.push('"');
                        } else {
                            break;
                        }
                    }
                    Some(c) => name.push(c),
                    None => return Err(DbError::validation("Unclosed quoted identifier")),
                }
            }
            if name.is_empty() {
                return Err(DbError::validation("Empty quoted identifier"));
            }
            parts.push(IdentPart::Quoted(name));
            continue;
        }

        // Unquoted identifier part.
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '.' {
                break;
            }
            let ok = if name.is_empty() {
                c == '_' || c.is_ascii_alphabetic()
            } else {
                c == '_' || c == '$' || c.is_ascii_alphanumeric()
            };
            if !ok {
                return Err(DbError::validation(format!(
                    "Invalid character '{c}' in identifier '{s}'"
                )));
            }
            name.push(c);
            chars.next();
        }
        if name.is_empty() {
            return Err(DbError::validation("Empty identifier segment"));
        }
        parts.push(IdentPart::Unquoted(name));
    }

    Ok(parts)
}
