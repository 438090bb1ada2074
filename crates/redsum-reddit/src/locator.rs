use redsum_types::FetchError;
use url::Url;

const REDDIT_HOSTS: &[&str] = &["reddit.com", "www.reddit.com", "old.reddit.com"];

/// Identifies a thread independently of how its URL was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadLocator {
    pub subreddit: String,
    pub thread_id: String,
}

impl ThreadLocator {
    /// Parse a thread URL such as
    /// `https://www.reddit.com/r/rust/comments/abc123/some_title/`.
    ///
    /// `.json` URLs and URLs without the title slug are accepted too.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let invalid = |reason: &str| FetchError::InvalidUrl(format!("{}: {}", reason, input));

        let url = Url::parse(input.trim()).map_err(|_| invalid("not a URL"))?;

        if url.scheme() != "https" {
            return Err(invalid("only https is supported"));
        }

        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        if !REDDIT_HOSTS.contains(&host) {
            return Err(invalid("not a reddit.com URL"));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            ["r", subreddit, "comments", id, ..] => {
                let thread_id = id.trim_end_matches(".json");
                if thread_id.is_empty() || !thread_id.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(invalid("malformed thread id"));
                }
                Ok(Self {
                    subreddit: subreddit.to_string(),
                    thread_id: thread_id.to_string(),
                })
            }
            _ => Err(invalid("expected /r/<subreddit>/comments/<id>")),
        }
    }

    /// JSON endpoint for this thread under `base_url`.
    pub fn json_url(&self, base_url: &str) -> String {
        format!(
            "{}/r/{}/comments/{}/.json",
            base_url.trim_end_matches('/'),
            self.subreddit,
            self.thread_id
        )
    }
}
