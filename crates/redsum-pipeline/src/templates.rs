/// Header naming the thread a chunk came from.
pub const THREAD_HEADER_TEMPLATE: &str = "Thread: \"<title>\" in r/<subreddit>";

pub const COLLECTING_INSTRUCTIONS: &str = "Below is part of the post and its comments. \
Summarize it, keeping the main points, notable opinions and any concrete information \
people shared such as links, prices or numbers.";

pub const REDUCING_INSTRUCTIONS: &str = "Below are summaries of consecutive parts of the \
same discussion. Merge them into a single coherent summary without repeating points.";

/// Kept when the full instructions no longer fit.
pub const BRIEF_INSTRUCTIONS: &str = "Summarize the text below.";

pub const CONTENT_DELIMITER: &str = "---";
