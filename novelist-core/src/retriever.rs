use crate::NovelistError;

/// Maps a query to ranked background snippets, best match first.
#[async_trait::async_trait]
pub trait ContextRetriever: Send + Sync + 'static {
    async fn retrieve_context(&self, query: &str, top_k: usize)
        -> Result<Vec<String>, NovelistError>;
}

/// Source of prior-chapter summaries, most recent first.
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync + 'static {
    async fn recent_summaries(&self, count: usize) -> Result<Vec<String>, NovelistError>;
}

/// Retriever over a fixed list of snippets; returns the first `top_k`.
#[derive(Clone, Debug, Default)]
pub struct StaticRetriever {
    snippets: Vec<String>,
}

impl StaticRetriever {
    pub fn new<I, T>(snippets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            snippets: snippets.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait::async_trait]
impl ContextRetriever for StaticRetriever {
    async fn retrieve_context(
        &self,
        _query: &str,
        top_k: usize,
    ) -> Result<Vec<String>, NovelistError> {
        Ok(self.snippets.iter().take(top_k).cloned().collect())
    }
}

/// Summarizer over a fixed list of summaries, most recent first.
#[derive(Clone, Debug, Default)]
pub struct StaticSummarizer {
    summaries: Vec<String>,
}

impl StaticSummarizer {
    pub fn new<I, T>(summaries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            summaries: summaries.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait::async_trait]
impl Summarizer for StaticSummarizer {
    async fn recent_summaries(&self, count: usize) -> Result<Vec<String>, NovelistError> {
        Ok(self.summaries.iter().take(count).cloned().collect())
    }
}
