use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Message, Role};

/// Size summary of a conversation.
///
/// `estimated_tokens` is `total_characters / 4`, rounded down. It is a cheap
/// heuristic for deciding when to compact, not a tokenizer.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationStats {
    pub total_messages: usize,
    pub by_role: BTreeMap<Role, usize>,
    pub total_characters: usize,
    pub estimated_tokens: usize,
}

impl ConversationStats {
    pub fn from_messages<'a, I>(messages: I) -> Self
    where
        I: IntoIterator<Item = &'a Message>,
    {
        let mut stats = Self::default();
        for message in messages {
            stats.total_messages += 1;
            *stats.by_role.entry(message.role()).or_insert(0) += 1;
            stats.total_characters += message.content().chars().count();
        }
        stats.estimated_tokens = stats.total_characters / 4;
        stats
    }

    pub fn count_for(&self, role: Role) -> usize {
        self.by_role.get(&role).copied().unwrap_or(0)
    }

    pub fn system_messages(&self) -> usize {
        self.count_for(Role::System)
    }

    pub fn user_messages(&self) -> usize {
        self.count_for(Role::User)
    }

    pub fn assistant_messages(&self) -> usize {
        self.count_for(Role::Assistant)
    }

    pub fn tool_messages(&self) -> usize {
        self.count_for(Role::Tool)
    }
}
