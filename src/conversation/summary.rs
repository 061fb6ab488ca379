use crate::Message;

pub const DEFAULT_SUMMARY_PROMPT: &str = "Summarize the following conversation, preserving all important details, decisions made, and context that would be needed to continue the conversation naturally:";

/// Prefix of the system message that replaces a compacted span.
pub const SUMMARY_PREFIX: &str = "Previous conversation summary: ";

/// Longest message content, in characters, quoted into a summary request.
pub const MAX_QUOTED_CHARS: usize = 1000;

pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Render messages as `Role: content` paragraphs for a summary request.
pub fn format_messages_for_summary<'a, I>(messages: I) -> String
where
    I: IntoIterator<Item = &'a Message>,
{
    messages
        .into_iter()
        .map(|m| format!("{}: {}", m.role().label(), truncate(m.content())))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn truncate(content: &str) -> String {
    match content.char_indices().nth(MAX_QUOTED_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &content[..cut]),
        None => content.to_string(),
    }
}

/// Full text sent to the summarizing model.
pub fn summary_request(prompt: &str, messages: &[Message]) -> String {
    format!("{prompt}\n\n{}", format_messages_for_summary(messages))
}
