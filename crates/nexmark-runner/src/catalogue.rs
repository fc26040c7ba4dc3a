use std::collections::BTreeSet;

/// Nexmark queries in the order a full sweep runs them.
pub const NEXMARK_QUERIES: [&str; 23] = [
    "q0", "q1", "q2", "q3", "q4", "q5", "q6", "q7", "q8", "q9", "q10", "q11", "q12", "q13",
    "q14", "q15", "q16", "q17", "q18", "q19", "q20", "q21", "q22",
];

/// Queries left out of a full sweep. They can still be run by name.
pub const EXCLUDED_QUERIES: [&str; 2] = ["q6", "q9"];

/// Ordered list of workloads plus the names a sweep skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalogue {
    queries: Vec<String>,
    excluded: BTreeSet<String>,
}

impl Catalogue {
    pub fn new<Q, E>(queries: Q, excluded: E) -> Self
    where
        Q: IntoIterator,
        Q::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            queries: queries.into_iter().map(Into::into).collect(),
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn nexmark() -> Self {
        Self::new(NEXMARK_QUERIES, EXCLUDED_QUERIES)
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.iter().any(|q| q == name)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    /// Queries a full sweep runs, in declared order.
    pub fn sweep(&self) -> impl Iterator<Item = &str> + '_ {
        self.queries
            .iter()
            .map(String::as_str)
            .filter(|q| !self.is_excluded(q))
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::nexmark()
    }
}
