use crate::ident::Ident;

/// One JOIN clause: target table, optional type and its join condition.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub table: Ident,
    /// `LEFT`, `INNER`, ... (`None` renders a bare `JOIN`).
    pub kind: Option<String>,
    /// `ON left = right` pairs, AND-ed together.
    pub on: Vec<(Ident, Ident)>,
    /// `USING (...)` columns; takes precedence over `on` when set.
    pub using: Vec<Ident>,
}

impl JoinSpec {
    pub fn new(table: impl Into<Ident>, kind: Option<&str>) -> Self {
        Self {
            table: table.into(),
            kind: kind.map(str::to_string),
            on: Vec::new(),
            using: Vec::new(),
        }
    }

    /// Add an `ON left = right` pair.
    pub fn on(&mut self, left: impl Into<Ident>, right: impl Into<Ident>) -> &mut Self {
        self.on.push((left.into(), right.into()));
        self
    }

    /// Set the `USING` column list.
    pub fn using<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Ident>,
    {
        self.using = columns.into_iter().map(Into::into).collect();
        self
    }
}
