use std::sync::Arc;

use tracing::info;

use crate::{
    chat::models::{Chat, ChatConfig, ChatError},
    conversation::{
        summary::{summary_request, SUMMARY_PREFIX},
        ChatMessages,
    },
    Message, Role,
};

/// How a log splits up for compaction.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactionPlan {
    /// Leading system message, carried over untouched.
    pub system: Option<Message>,
    /// Span that gets summarized.
    pub older: Vec<Message>,
    /// Trailing messages kept verbatim, in order.
    pub kept: Vec<Message>,
}

/// Split `messages`, or `None` when the log is too short to be worth it
/// (at most `keep_recent + 2` messages).
pub fn plan(messages: &ChatMessages, keep_recent: usize) -> Option<CompactionPlan> {
    let count = messages.len();
    if count <= keep_recent.saturating_add(2) {
        return None;
    }

    let all = messages.as_slice();
    let start = match all.first() {
        Some(first) if first.role() == Role::System => 1,
        _ => 0,
    };
    let split = count - keep_recent;
    if split <= start {
        return None;
    }

    Some(CompactionPlan {
        system: all[..start].first().cloned(),
        older: all[start..split].to_vec(),
        kept: all[split..].to_vec(),
    })
}

/// `[system?] + summary + kept`.
pub fn rebuild(plan: CompactionPlan, summary: &str) -> ChatMessages {
    let mut rebuilt = ChatMessages::new();
    if let Some(system) = plan.system {
        rebuilt.append(system);
    }
    rebuilt.add_system(format!("{SUMMARY_PREFIX}{summary}"));
    rebuilt.extend(plan.kept);
    rebuilt
}

pub async fn summarize(chat: &mut Chat, keep_recent: usize, prompt: &str) -> Result<bool, ChatError> {
    let Some(plan) = plan(&chat.messages, keep_recent) else {
        return Ok(false);
    };

    // Same model and options; plain text out, nothing from the live log.
    let config = ChatConfig {
        format: None,
        stream: false,
        ..chat.config()
    };
    let mut summarizer = Chat::from_config(config, Arc::clone(&chat.transport));
    let response = summarizer.send(summary_request(prompt, &plan.older)).await?;

    info!(
        summarized = plan.older.len(),
        kept = plan.kept.len(),
        "conversation compacted"
    );
    chat.messages = rebuild(plan, response.content());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::test_support::{assistant_reply, ScriptedTransport};
    use pretty_assertions::assert_eq;

    fn log_of(n: usize, with_system: bool) -> ChatMessages {
        let mut log = ChatMessages::new();
        if with_system {
            log.add_system("S");
        }
        for i in 0..n {
            if i % 2 == 0 {
                log.add_user(format!("u{i}"));
            } else {
                log.add_assistant(format!("a{i}"));
            }
        }
        log
    }

    #[test]
    fn short_logs_are_left_alone() {
        assert!(plan(&log_of(5, false), 3).is_none());
        assert!(plan(&log_of(4, true), 3).is_none());
        assert!(plan(&log_of(6, false), 3).is_some());
        assert!(plan(&ChatMessages::new(), usize::MAX).is_none());
    }

    #[test]
    fn plan_keeps_system_and_tail() {
        let log = log_of(8, true);
        let plan = plan(&log, 3).unwrap();
        assert_eq!(plan.system.as_ref().map(Message::content), Some("S"));
        assert_eq!(plan.older.len(), 5);
        assert_eq!(plan.older[0].content(), "u0");
        let kept: Vec<_> = plan.kept.iter().map(Message::content).collect();
        assert_eq!(kept, vec!["a5", "u6", "a7"]);
    }

    #[test]
    fn rebuild_orders_system_summary_tail() {
        let log = log_of(8, true);
        let p = plan(&log, 2).unwrap();
        let rebuilt = rebuild(p, "they chatted");
        let contents: Vec<_> = rebuilt.iter().map(Message::content).collect();
        assert_eq!(
            contents,
            vec!["S", "Previous conversation summary: they chatted", "u6", "a7"]
        );
        assert_eq!(rebuilt[1].role(), Role::System);
    }

    #[tokio::test]
    async fn summarize_uses_a_separate_chat() {
        let transport = Arc::new(ScriptedTransport::new(vec![assistant_reply("SUMMARY")]));
        let mut chat = Chat::new("llama3.2", transport.clone());
        *chat.messages_mut() = log_of(7, true);
        let tail_before: Vec<_> = chat.messages().as_slice()[5..].to_vec();

        assert!(chat.summarize_conversation(3, Some("Condense:")).await.unwrap());

        let log = chat.messages();
        assert_eq!(log.len(), 5);
        assert_eq!(log[0].content(), "S");
        assert_eq!(log[1].content(), "Previous conversation summary: SUMMARY");
        assert_eq!(&log.as_slice()[2..], &tail_before[..]);
        assert!(!log.iter().any(|m| m.content().starts_with("Condense:")));

        let (_, payload) = transport.request(0);
        let sent = payload["messages"].as_array().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["role"], "user");
        assert_eq!(
            sent[0]["content"],
            "Condense:\n\nUser: u0\n\nAssistant: a1\n\nUser: u2\n\nAssistant: a3"
        );
    }

    #[tokio::test]
    async fn summarize_without_leading_system() {
        let transport = Arc::new(ScriptedTransport::new(vec![assistant_reply("gist")]));
        let mut chat = Chat::new("m", transport.clone());
        *chat.messages_mut() = log_of(6, false);

        assert!(chat.summarize_conversation(1, None).await.unwrap());
        let contents: Vec<_> = chat.messages().iter().map(Message::content).collect();
        assert_eq!(contents, vec!["Previous conversation summary: gist", "a5"]);
    }

    #[tokio::test]
    async fn too_short_means_no_request() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let mut chat = Chat::new("m", transport.clone());
        *chat.messages_mut() = log_of(5, false);
        let before = chat.messages().clone();

        assert!(!chat.summarize_conversation(3, None).await.unwrap());
        assert_eq!(chat.messages(), &before);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn auto_summarize_respects_the_token_budget() {
        let transport = Arc::new(ScriptedTransport::new(vec![assistant_reply("short")]));
        let mut chat = Chat::new("m", transport.clone());
        for _ in 0..3 {
            chat.user("x".repeat(400)).assistant("y".repeat(400));
        }
        assert_eq!(chat.conversation_stats().estimated_tokens, 600);

        assert!(!chat.auto_summarize_if_needed(600, 2).await.unwrap());
        assert_eq!(transport.request_count(), 0);

        assert!(chat.auto_summarize_if_needed(599, 2).await.unwrap());
        assert_eq!(chat.messages().len(), 3);
        assert!(chat.conversation_stats().estimated_tokens < 600);
    }

    #[tokio::test]
    async fn summary_request_keeps_model_options() {
        let transport = Arc::new(ScriptedTransport::new(vec![assistant_reply("s")]));
        let mut chat = Chat::new("m", transport.clone());
        chat.set_options(crate::ModelOptions::new().temperature(0.5))
            .set_format(Some(serde_json::json!("json")));
        *chat.messages_mut() = log_of(6, false);

        chat.summarize_conversation(1, None).await.unwrap();
        let (_, payload) = transport.request(0);
        assert_eq!(payload["model"], "m");
        assert_eq!(payload["options"]["temperature"], 0.5);
        assert!(payload.get("format").is_none());
        assert!(payload.get("tools").is_none());
    }
}
