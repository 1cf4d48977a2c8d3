use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use strand_core::Record;

/// Cap applied when a query gives no explicit limit
pub const DEFAULT_QUERY_LIMIT: usize = 256;

/// Query filters for record retrieval; all filters combine with AND
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    /// Filter by chain (exact)
    pub chain_id: Option<String>,

    /// Filter by module (exact)
    pub module: Option<String>,

    /// created_at range (start, inclusive)
    pub created_from: Option<u64>,

    /// created_at range (end, inclusive)
    pub created_to: Option<u64>,

    /// Module-declared projection filters over body fields.
    ///
    /// Honoured only for records whose module advertises the key.
    pub body_filters: Map<String, Value>,

    /// Limit number of results
    pub limit: Option<usize>,

    /// Offset for pagination
    pub offset: Option<usize>,
}

impl QueryFilters {
    /// Create new empty filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by chain
    pub fn with_chain(mut self, chain_id: String) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Filter by module
    pub fn with_module(mut self, module: String) -> Self {
        self.module = Some(module);
        self
    }

    /// Set created_at range
    pub fn with_created_range(mut self, from: Option<u64>, to: Option<u64>) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    /// Add a body-field filter
    pub fn with_body_filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body_filters.insert(key.into(), value);
        self
    }

    /// Set limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set offset
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Query result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Matching records
    pub records: Vec<Record>,

    /// Total number of matching records (before limit/offset)
    pub total: usize,

    /// Whether the result was truncated against the unlimited set
    pub has_more: bool,
}
