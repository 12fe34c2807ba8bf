//! Builder for a multi-term boolean query (§6's `index_multi_term_query_*`
//! API surface, expressed the Rust-idiomatic way: ownership and drop
//! retire the query, no explicit destroy call needed).

use fluxstore_core::{BoolOp, Query};

/// A set of `(colName, Query)` terms combined by one [`BoolOp`].
#[derive(Debug, Clone)]
pub struct MultiTermQuery {
    op: BoolOp,
    terms: Vec<(String, Query)>,
}

impl MultiTermQuery {
    /// An empty query combined with `op`.
    pub fn new(op: BoolOp) -> Self {
        Self {
            op,
            terms: Vec::new(),
        }
    }

    /// Add one `(colName, Query)` term.
    pub fn add_term(&mut self, col_name: impl Into<String>, query: Query) -> &mut Self {
        self.terms.push((col_name.into(), query));
        self
    }

    /// The combining operator.
    pub fn op(&self) -> BoolOp {
        self.op
    }

    /// The terms added so far.
    pub fn terms(&self) -> &[(String, Query)] {
        &self.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_term_accumulates_in_order() {
        let mut q = MultiTermQuery::new(BoolOp::Must);
        q.add_term("k1", Query::Eq(b"a".to_vec()));
        q.add_term("k2", Query::Eq(b"b".to_vec()));
        assert_eq!(q.terms().len(), 2);
        assert_eq!(q.terms()[0].0, "k1");
        assert_eq!(q.terms()[1].0, "k2");
    }
}
