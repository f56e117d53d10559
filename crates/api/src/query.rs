use crate::message::CreatedAt;

/// Pagination parameters for `GET /messages`.
///
/// `after` and `before` are exclusive timestamp bounds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub after: Option<CreatedAt>,
    pub before: Option<CreatedAt>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything strictly newer than `cursor`.
    pub fn after(cursor: CreatedAt) -> Self {
        Self::new().with_after(cursor)
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_after(mut self, cursor: CreatedAt) -> Self {
        self.after = Some(cursor);
        self
    }

    pub fn with_before(mut self, cursor: CreatedAt) -> Self {
        self.before = Some(cursor);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.after.is_none() && self.before.is_none()
    }

    /// Query pairs in wire order. A zero limit is treated as unset.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(after) = self.after.as_ref().filter(|after| !after.as_str().is_empty()) {
            pairs.push(("after", after.as_str().to_string()));
        }
        if let Some(before) = self
            .before
            .as_ref()
            .filter(|before| !before.as_str().is_empty())
        {
            pairs.push(("before", before.as_str().to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_has_no_pairs() {
        assert!(ListQuery::new().is_empty());
        assert!(ListQuery::new().to_pairs().is_empty());
    }

    #[test]
    fn pairs_keep_limit_after_before_order() {
        let query = ListQuery::new()
            .with_before(CreatedAt::new("2024-01-02T00:00:00Z"))
            .with_after(CreatedAt::new("2024-01-01T10:00:00Z"))
            .with_limit(10);

        assert_eq!(
            query.to_pairs(),
            vec![
                ("limit", "10".to_string()),
                ("after", "2024-01-01T10:00:00Z".to_string()),
                ("before", "2024-01-02T00:00:00Z".to_string()),
            ]
        );
    }

    #[test]
    fn zero_limit_and_blank_cursors_are_omitted() {
        let query = ListQuery::new()
            .with_limit(0)
            .with_after(CreatedAt::new(""));

        assert!(query.to_pairs().is_empty());
    }
}
