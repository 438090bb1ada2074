use redsum_types::{FetchError, ThreadContent};
use serde::Deserialize;
use serde_json::Value;

/// Bodies Reddit substitutes for comments that no longer have content.
const TOMBSTONES: &[&str] = &["[deleted]", "[removed]"];

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: String,
    #[serde(default)]
    selftext: String,
    subreddit: String,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    #[serde(default)]
    body: Option<String>,
    /// Either an empty string or a nested listing.
    #[serde(default)]
    replies: Value,
}

/// Parse the body of a thread's `.json` endpoint.
///
/// Reddit answers with two listings: the post itself, then the comment
/// tree. Comments are flattened depth-first so replies follow their parent.
pub fn parse_thread(body: &str) -> Result<ThreadContent, FetchError> {
    let listings: Vec<Listing> =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let mut listings = listings.into_iter();

    let post_listing = listings
        .next()
        .ok_or_else(|| FetchError::NotFound("empty response".to_string()))?;

    let post = post_listing
        .data
        .children
        .into_iter()
        .find(|thing| thing.kind == "t3")
        .ok_or_else(|| FetchError::NotFound("no post in listing".to_string()))?;

    let post: PostData =
        serde_json::from_value(post.data).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let mut comments = Vec::new();
    if let Some(comment_listing) = listings.next() {
        collect_comments(comment_listing.data.children, &mut comments);
    }

    let selftext = unescape(&post.selftext);
    Ok(ThreadContent {
        title: unescape(&post.title),
        selftext: if selftext.trim().is_empty() {
            None
        } else {
            Some(selftext)
        },
        subreddit: post.subreddit,
        comment_bodies: comments,
    })
}

fn collect_comments(children: Vec<Thing>, out: &mut Vec<String>) {
    for thing in children {
        // "more" stubs only point at comments that were not loaded
        if thing.kind != "t1" {
            continue;
        }

        let comment: CommentData = match serde_json::from_value(thing.data) {
            Ok(comment) => comment,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unparseable comment");
                continue;
            }
        };

        if let Some(body) = comment.body {
            let body = body.trim();
            if !body.is_empty() && !TOMBSTONES.contains(&body) {
                out.push(unescape(body));
            }
        }

        if comment.replies.is_object() {
            match serde_json::from_value::<Listing>(comment.replies) {
                Ok(replies) => collect_comments(replies.data.children, out),
                Err(e) => tracing::debug!(error = %e, "Skipping malformed replies"),
            }
        }
    }
}

/// Reddit escapes these three entities in markdown bodies.
fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment(body: &str, replies: Value) -> Value {
        json!({ "kind": "t1", "data": { "body": body, "replies": replies } })
    }

    fn thread_json(comments: Vec<Value>) -> String {
        json!([
            {
                "kind": "Listing",
                "data": { "children": [{
                    "kind": "t3",
                    "data": {
                        "title": "Deals on 25 phones &amp; more",
                        "selftext": "Post body",
                        "subreddit": "dealsforindia"
                    }
                }]}
            },
            { "kind": "Listing", "data": { "children": comments } }
        ])
        .to_string()
    }

    #[test]
    fn test_parse_post_and_comments() {
        let body = thread_json(vec![
            comment("first", json!("")),
            comment("second", json!("")),
        ]);

        let thread = parse_thread(&body).unwrap();
        assert_eq!(thread.title, "Deals on 25 phones & more");
        assert_eq!(thread.selftext.as_deref(), Some("Post body"));
        assert_eq!(thread.subreddit, "dealsforindia");
        assert_eq!(thread.comment_bodies, vec!["first", "second"]);
    }

    #[test]
    fn test_replies_flattened_depth_first() {
        let nested = json!({
            "kind": "Listing",
            "data": { "children": [comment("reply", json!(""))] }
        });
        let body = thread_json(vec![
            comment("parent", nested),
            comment("sibling", json!("")),
            json!({ "kind": "more", "data": { "count": 12, "children": ["x1"] } }),
        ]);

        let thread = parse_thread(&body).unwrap();
        assert_eq!(thread.comment_bodies, vec!["parent", "reply", "sibling"]);
    }

    #[test]
    fn test_deleted_comments_skipped() {
        let body = thread_json(vec![
            comment("[deleted]", json!("")),
            comment("[removed]", json!("")),
            comment("kept &lt;3", json!("")),
        ]);

        let thread = parse_thread(&body).unwrap();
        assert_eq!(thread.comment_bodies, vec!["kept <3"]);
    }

    #[test]
    fn test_empty_selftext_is_none() {
        let body = json!([
            { "kind": "Listing", "data": { "children": [{
                "kind": "t3",
                "data": { "title": "Link post", "selftext": "", "subreddit": "pics" }
            }]}}
        ])
        .to_string();

        let thread = parse_thread(&body).unwrap();
        assert!(thread.selftext.is_none());
        assert!(thread.comment_bodies.is_empty());
    }

    #[test]
    fn test_empty_listing_is_not_found() {
        assert!(matches!(parse_thread("[]"), Err(FetchError::NotFound(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            parse_thread("<html>blocked</html>"),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            parse_thread(r#"{"message": "Not Found", "error": 404}"#),
            Err(FetchError::Malformed(_))
        ));
    }
}
