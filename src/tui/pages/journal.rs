use crate::api::ApiError;
use crate::models::{ChatResponse, Message, UserContext};
use crate::tui::dispatch::ApiCommand;
use crate::tui::widgets::editor::Editor;
use crate::utils::current_timestamp;

/// Assistant message appended when a reply cannot be obtained
pub const FALLBACK_REPLY: &str =
    "I apologize, but I'm having trouble processing your entry right now. Please try again later.";

pub const HISTORY_FAILED: &str = "Could not load your journal history";

#[derive(Debug, Clone)]
pub struct JournalPage {
    pub messages: Vec<Message>,
    pub composer: Editor,
    /// A reply is outstanding; the composer is locked until it settles
    pub loading: bool,
    pub has_first_entry: bool,
    pub history_pending: bool,
    pub context: Option<UserContext>,
    /// Lines scrolled up from the newest message
    pub scroll_from_bottom: usize,
    /// Entry whose reply is outstanding. Replies for any other id are stale.
    in_flight: Option<u64>,
    /// Never reused, so a late reply cannot match a newer entry
    next_entry_id: u64,
}

impl Default for JournalPage {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            composer: Editor::multi_line(),
            loading: false,
            has_first_entry: false,
            history_pending: false,
            context: None,
            scroll_from_bottom: 0,
            in_flight: None,
            next_entry_id: 1,
        }
    }
}

impl JournalPage {
    /// Reset the page and request history plus the insight context.
    ///
    /// An entry still waiting for its reply survives the reset together with
    /// the unsent draft, so leaving and returning never loses input.
    pub fn on_mount(&mut self, user_id: Option<&str>) -> Vec<ApiCommand> {
        let carried = self
            .in_flight
            .map(|id| (id, self.messages.iter().rev().find(|m| m.is_user()).cloned()));
        let composer = std::mem::replace(&mut self.composer, Editor::multi_line());
        let next_entry_id = self.next_entry_id;

        *self = Self {
            composer,
            next_entry_id,
            ..Self::default()
        };
        if let Some((id, entry)) = carried {
            self.in_flight = Some(id);
            self.loading = true;
            self.has_first_entry = true;
            self.messages.extend(entry);
        }

        let Some(user_id) = user_id else {
            return Vec::new();
        };
        self.history_pending = true;
        vec![
            ApiCommand::FetchHistory {
                user_id: user_id.to_string(),
            },
            ApiCommand::FetchUserContext {
                user_id: user_id.to_string(),
            },
        ]
    }

    /// Drop everything, including an outstanding entry (used on logout).
    /// Entry ids keep counting so replies from the old session stay stale.
    pub fn discard(&mut self) {
        *self = Self {
            next_entry_id: self.next_entry_id,
            ..Self::default()
        };
    }

    /// Whether the conversation view replaces the empty-state prompt
    pub fn shows_conversation(&self) -> bool {
        self.has_first_entry || !self.messages.is_empty()
    }

    /// Append the user's entry and queue it for a reply. Blank entries,
    /// entries while a reply is outstanding, and signed-out submits do
    /// nothing.
    pub fn submit(&mut self, user_id: Option<&str>) -> Option<ApiCommand> {
        if self.loading || self.composer.is_blank() {
            return None;
        }
        let user_id = user_id?;
        let content = self.composer.text();
        let timestamp = current_timestamp();
        let entry_id = self.next_entry_id;
        self.next_entry_id += 1;
        self.in_flight = Some(entry_id);

        self.messages.push(Message::user(content.clone(), timestamp.clone()));
        self.has_first_entry = true;
        self.loading = true;
        self.composer.clear();
        self.scroll_from_bottom = 0;

        Some(ApiCommand::PostEntry {
            entry_id,
            user_id: user_id.to_string(),
            content,
            timestamp,
        })
    }

    /// Settle entry `entry_id` with exactly one assistant message. Replies
    /// for anything but the outstanding entry are dropped.
    pub fn on_reply(&mut self, entry_id: u64, result: Result<ChatResponse, ApiError>) {
        if self.in_flight != Some(entry_id) {
            tracing::debug!(entry_id, "dropping reply for an entry that is not in flight");
            return;
        }
        self.in_flight = None;
        self.loading = false;
        self.scroll_from_bottom = 0;
        match result {
            Ok(reply) => {
                self.messages.push(Message::assistant(reply.response, current_timestamp()));
                if !reply.context.is_empty() {
                    self.context = Some(reply.context);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "diary entry failed");
                self.messages.push(Message::assistant(FALLBACK_REPLY, current_timestamp()));
            }
        }
    }

    /// Place loaded history before anything written since mount. Returns a
    /// status message on failure.
    pub fn on_history(&mut self, result: Result<Vec<Message>, ApiError>) -> Option<String> {
        if !self.history_pending {
            tracing::debug!("dropping history with no request in flight");
            return None;
        }
        self.history_pending = false;
        match result {
            Ok(mut history) => {
                history.append(&mut self.messages);
                self.messages = history;
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load conversation history");
                Some(HISTORY_FAILED.to_string())
            }
        }
    }

    pub fn on_context(&mut self, result: Result<UserContext, ApiError>) {
        match result {
            Ok(context) if !context.is_empty() => self.context = Some(context),
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "user context unavailable"),
        }
    }

    /// Latest assistant reply, for copying
    pub fn latest_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| !m.is_user())
            .map(|m| m.content.as_str())
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn mounted() -> JournalPage {
        let mut page = JournalPage::default();
        page.on_mount(Some("u1"));
        page
    }

    /// Submit `text` and return the id of the entry it created
    fn write(page: &mut JournalPage, text: &str) -> u64 {
        page.composer.insert_str(text);
        match page.submit(Some("u1")) {
            Some(ApiCommand::PostEntry { entry_id, .. }) => entry_id,
            other => panic!("expected a diary entry, got {:?}", other),
        }
    }

    fn reply(text: &str) -> ChatResponse {
        ChatResponse {
            response: text.to_string(),
            context: UserContext::default(),
        }
    }

    #[test]
    fn mount_requests_history_and_context() {
        let mut page = JournalPage::default();
        let commands = page.on_mount(Some("u1"));
        assert_eq!(commands.len(), 2);
        assert!(matches!(&commands[0], ApiCommand::FetchHistory { user_id } if user_id == "u1"));
        assert!(page.on_mount(None).is_empty());
    }

    #[test]
    fn blank_entry_is_ignored() {
        let mut page = mounted();
        page.composer.insert_str("   \n ");
        assert!(page.submit(Some("u1")).is_none());
        assert!(page.messages.is_empty());
        assert!(!page.loading);
    }

    #[test]
    fn entry_appends_immediately_and_locks_composer() {
        let mut page = mounted();
        page.composer.insert_str("Felt great today");
        let command = page.submit(Some("u1")).unwrap();
        match command {
            ApiCommand::PostEntry { user_id, content, timestamp, .. } => {
                assert_eq!(user_id, "u1");
                assert_eq!(content, "Felt great today");
                assert_eq!(page.messages[0].timestamp.as_deref(), Some(timestamp.as_str()));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(page.loading);
        assert!(page.has_first_entry);
        assert!(page.composer.is_blank());
        assert_eq!(page.messages.len(), 1);

        page.composer.insert_str("again");
        assert!(page.submit(Some("u1")).is_none());
    }

    #[test]
    fn reply_appends_assistant_message() {
        let mut page = mounted();
        let entry = write(&mut page, "Felt great today");
        page.on_reply(entry, Ok(reply("That's wonderful!")));
        assert!(!page.loading);
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.messages[1].role, Role::Assistant);
        assert_eq!(page.latest_reply(), Some("That's wonderful!"));
    }

    #[test]
    fn failure_appends_exactly_one_fallback() {
        let mut page = mounted();
        let entry = write(&mut page, "Rough day");
        page.on_reply(entry, Err(ApiError::Decode("bad".to_string())));
        // A duplicate completion must not add a second message
        page.on_reply(entry, Err(ApiError::Decode("bad".to_string())));
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.messages[1].content, FALLBACK_REPLY);
        assert!(!page.loading);
    }

    #[test]
    fn late_history_is_placed_before_local_messages() {
        let mut page = mounted();
        page.composer.insert_str("new entry");
        page.submit(Some("u1"));

        let history = vec![Message {
            role: Role::User,
            content: "older entry".to_string(),
            timestamp: None,
        }];
        assert!(page.on_history(Ok(history)).is_none());
        let contents: Vec<&str> = page.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["older entry", "new entry"]);
        assert!(page.shows_conversation());
    }

    #[test]
    fn history_failure_reports_status() {
        let mut page = mounted();
        let message = page.on_history(Err(ApiError::Decode("bad".to_string())));
        assert_eq!(message.as_deref(), Some(HISTORY_FAILED));
        assert!(!page.shows_conversation());
    }

    #[test]
    fn reply_context_updates_insights() {
        let mut page = mounted();
        let entry = write(&mut page, "Stressed about work");
        let response = ChatResponse {
            response: "That sounds hard.".to_string(),
            context: UserContext {
                mood: Some("anxious".to_string()),
                ..UserContext::default()
            },
        };
        page.on_reply(entry, Ok(response));
        assert_eq!(page.context.as_ref().and_then(|c| c.mood.as_deref()), Some("anxious"));
    }

    #[test]
    fn scrolling_is_clamped_at_bottom() {
        let mut page = mounted();
        page.scroll_up(5);
        page.scroll_down(10);
        assert_eq!(page.scroll_from_bottom, 0);
    }

    #[test]
    fn outstanding_entry_and_draft_survive_a_remount() {
        let mut page = mounted();
        let entry = write(&mut page, "Long day");
        page.composer.insert_str("half a thought");

        let commands = page.on_mount(Some("u1"));
        assert_eq!(commands.len(), 2);
        assert!(page.loading);
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].content, "Long day");
        assert_eq!(page.composer.text(), "half a thought");

        page.on_history(Ok(vec![Message::user("older", "2024-04-30T20:00:00.000Z")]));
        page.on_reply(entry, Ok(reply("Rest well.")));
        let contents: Vec<&str> = page.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["older", "Long day", "Rest well."]);
        assert!(!page.loading);
    }

    #[test]
    fn reply_for_another_entry_is_dropped() {
        let mut page = mounted();
        let first = write(&mut page, "first");
        page.on_reply(first, Ok(reply("one")));
        let second = write(&mut page, "second");
        assert_ne!(first, second);

        page.on_reply(first, Ok(reply("late duplicate")));
        assert!(page.loading);
        page.on_reply(second, Ok(reply("two")));
        let contents: Vec<&str> = page.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "one", "second", "two"]);
    }

    #[test]
    fn discarded_page_keeps_counting_entries() {
        let mut page = mounted();
        let before = write(&mut page, "before logout");
        page.discard();
        assert!(!page.loading);
        assert!(page.messages.is_empty());

        page.on_mount(Some("u1"));
        let after = write(&mut page, "after login");
        page.on_reply(before, Ok(reply("stale")));
        assert!(page.loading);
        assert_ne!(before, after);
    }
}
