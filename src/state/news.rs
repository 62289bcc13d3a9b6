//! News slice

use super::meta::FetchMeta;
use super::{ReduceContext, Slice};
use serde::{Deserialize, Serialize};

/// A headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    /// RFC 3339 publication time
    pub published_at: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsState {
    pub news: Vec<NewsItem>,
    #[serde(flatten)]
    pub meta: FetchMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewsAction {
    FetchPending,
    FetchFulfilled(Vec<NewsItem>),
    FetchRejected(String),
}

impl NewsAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchPending => "news/fetchNewsData/pending",
            Self::FetchFulfilled(_) => "news/fetchNewsData/fulfilled",
            Self::FetchRejected(_) => "news/fetchNewsData/rejected",
        }
    }
}

impl Slice for NewsState {
    type Action = NewsAction;

    fn reduce(&mut self, action: NewsAction, ctx: &ReduceContext<'_>) {
        match action {
            NewsAction::FetchPending => self.meta.begin(self.news.is_empty()),
            NewsAction::FetchFulfilled(items) => {
                if !items.is_empty() {
                    self.news = items;
                }
                self.meta.succeed(ctx.now);
            }
            NewsAction::FetchRejected(message) => self.meta.fail(message),
        }
    }
}
