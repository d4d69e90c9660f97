use serde::Serialize;

/// A ranked full-text query
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: String,
    /// Home page of the site to search in; all sites when `None`
    pub site: Option<String>,
    pub offset: usize,
    /// Page size; the configured default when `None`
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }
}

/// One page of ranked results
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResponse {
    /// Number of matching pages before pagination
    pub total: usize,
    pub results: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub page_id: i64,
    pub site_url: String,
    pub site_name: String,
    pub path: String,
    pub title: String,
    /// Body text around the first match with matches wrapped in `<b>`
    pub snippet: String,
    pub absolute_relevance: f64,
    /// `absolute_relevance` divided by the best score of the result set
    pub relative_relevance: f64,
}

impl SearchHit {
    pub fn url(&self) -> String {
        format!("{}{}", self.site_url, self.path)
    }
}
