//! # Storage Filters
//!
//! A state manager never executes queries. It translates a logical state or
//! group into a [`Filter`] expression over the state column, and the storage
//! collaborator turns that expression into its own predicate type by
//! implementing [`PredicateBuilder`].
//!
//! ```text
//! DRAFT        →  state = $1
//! UNPUBLISHED  →  state IN ($1, $2)
//! RECENT       →  (state = $1 AND published_at > now() - interval '1 hour')
//! REDRAFTABLE  →  (state = $1 OR state = $2 OR (state = $3 AND ...))
//! ```
//!
//! [`SqlPredicate`] is a ready-made builder producing parameterised SQL text.

/// A predicate over an entity's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter<V> {
    /// `column = value`
    Eq { column: String, value: V },
    /// `column IN (values...)`
    In { column: String, values: Vec<V> },
    /// An opaque fragment supplied by the declaring code, passed through
    /// to the builder untouched.
    Raw(String),
    /// Conjunction.
    And(Vec<Filter<V>>),
    /// Disjunction.
    Or(Vec<Filter<V>>),
    /// Negation.
    Not(Box<Filter<V>>),
}

impl<V> Filter<V> {
    pub fn raw(fragment: impl Into<String>) -> Self {
        Self::Raw(fragment.into())
    }

    /// Conjoin with another filter, flattening nested conjunctions.
    pub fn and(self, other: Filter<V>) -> Self {
        match self {
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Negate, collapsing a double negation.
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Render through a collaborator's builder.
    pub fn build<B: PredicateBuilder<V>>(&self, builder: &mut B) -> B::Output {
        match self {
            Self::Eq { column, value } => builder.eq(column, value),
            Self::In { column, values } => builder.in_list(column, values),
            Self::Raw(fragment) => builder.raw(fragment),
            Self::And(parts) => {
                let parts = parts.iter().map(|p| p.build(builder)).collect();
                builder.and(parts)
            }
            Self::Or(parts) => {
                let parts = parts.iter().map(|p| p.build(builder)).collect();
                builder.or(parts)
            }
            Self::Not(inner) => {
                let inner = inner.build(builder);
                builder.not(inner)
            }
        }
    }
}

/// Implemented by the storage layer to turn a [`Filter`] into its own
/// predicate representation.
///
/// Builders take `&mut self` so they can accumulate bind parameters.
pub trait PredicateBuilder<V> {
    type Output;

    fn eq(&mut self, column: &str, value: &V) -> Self::Output;
    fn in_list(&mut self, column: &str, values: &[V]) -> Self::Output;
    fn raw(&mut self, fragment: &str) -> Self::Output;
    fn and(&mut self, parts: Vec<Self::Output>) -> Self::Output;
    fn or(&mut self, parts: Vec<Self::Output>) -> Self::Output;
    fn not(&mut self, inner: Self::Output) -> Self::Output;
}

// ─── SQL Text ────────────────────────────────────────────────────────

/// Bind parameter style for [`SqlPredicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `$1, $2, ...` (PostgreSQL).
    #[default]
    Numbered,
    /// `?, ?, ...` (SQLite, MySQL).
    Question,
}

/// Renders a [`Filter`] as SQL text with bind parameters.
///
/// Column names and raw fragments are emitted verbatim; values are always
/// bound, never inlined.
#[derive(Debug, Clone)]
pub struct SqlPredicate<V> {
    placeholder: Placeholder,
    params: Vec<V>,
}

impl<V: Clone> SqlPredicate<V> {
    pub fn new(placeholder: Placeholder) -> Self {
        Self {
            placeholder,
            params: Vec::new(),
        }
    }

    /// Render `filter`, returning the SQL text and its parameters in bind order.
    pub fn render(filter: &Filter<V>, placeholder: Placeholder) -> (String, Vec<V>) {
        let mut builder = Self::new(placeholder);
        let sql = filter.build(&mut builder);
        (sql, builder.params)
    }

    fn bind(&mut self, value: &V) -> String {
        self.params.push(value.clone());
        match self.placeholder {
            Placeholder::Numbered => format!("${}", self.params.len()),
            Placeholder::Question => "?".to_string(),
        }
    }

    fn join(parts: Vec<String>, op: &str, empty: &str) -> String {
        match parts.len() {
            0 => empty.to_string(),
            1 => parts.into_iter().next().unwrap_or_default(),
            _ => format!("({})", parts.join(op)),
        }
    }
}

impl<V: Clone> PredicateBuilder<V> for SqlPredicate<V> {
    type Output = String;

    fn eq(&mut self, column: &str, value: &V) -> String {
        let p = self.bind(value);
        format!("{column} = {p}")
    }

    fn in_list(&mut self, column: &str, values: &[V]) -> String {
        if values.is_empty() {
            return "FALSE".to_string();
        }
        let ps: Vec<String> = values.iter().map(|v| self.bind(v)).collect();
        format!("{column} IN ({})", ps.join(", "))
    }

    fn raw(&mut self, fragment: &str) -> String {
        fragment.to_string()
    }

    fn and(&mut self, parts: Vec<String>) -> String {
        Self::join(parts, " AND ", "TRUE")
    }

    fn or(&mut self, parts: Vec<String>) -> String {
        Self::join(parts, " OR ", "FALSE")
    }

    fn not(&mut self, inner: String) -> String {
        format!("NOT ({inner})")
    }
}
