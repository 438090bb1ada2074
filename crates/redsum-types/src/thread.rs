use serde::{Deserialize, Serialize};

/// A fetched Reddit thread, flattened into plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadContent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selftext: Option<String>,
    pub subreddit: String,
    #[serde(default)]
    pub comment_bodies: Vec<String>,
}

impl ThreadContent {
    pub fn new(title: impl Into<String>, subreddit: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            selftext: None,
            subreddit: subreddit.into(),
            comment_bodies: Vec::new(),
        }
    }

    pub fn with_selftext(mut self, selftext: impl Into<String>) -> Self {
        self.selftext = Some(selftext.into());
        self
    }

    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comment_bodies = comments;
        self
    }

    /// Text items to summarize: the selftext (when present) followed by
    /// every comment body in thread order.
    ///
    /// A link post with no selftext and no comments falls back to its title
    /// so there is always something to summarize.
    pub fn items(&self) -> Vec<String> {
        let mut items = Vec::with_capacity(self.comment_bodies.len() + 1);

        if let Some(selftext) = self.selftext.as_deref() {
            if !selftext.trim().is_empty() {
                items.push(selftext.to_string());
            }
        }

        items.extend(
            self.comment_bodies
                .iter()
                .filter(|body| !body.trim().is_empty())
                .cloned(),
        );

        if items.is_empty() {
            items.push(self.title.clone());
        }

        items
    }
}
