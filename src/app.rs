use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::task::JoinHandle;

use crate::config::API_KEY_ENV;
use crate::console::{Console, Effect, Event, Phase};
use crate::gemini::{GeminiClient, RemoteError};

pub struct App {
    pub should_quit: bool,
    pub console: Console,

    // Cursor position in the prompt (char index, not bytes)
    pub cursor: usize,

    // Result view scroll offset
    pub result_scroll: u16,

    // 0-2 for the ellipsis animation while loading
    pub animation_frame: u8,

    // Injected once at startup; None when no API key could be resolved.
    // The missing-key failure surfaces through the normal Error phase on
    // the first generate, not as a startup crash.
    client: Option<GeminiClient>,
    task: Option<JoinHandle<Result<String, RemoteError>>>,
}

impl App {
    pub fn new(client: Option<GeminiClient>) -> Self {
        Self {
            should_quit: false,
            console: Console::new(),
            cursor: 0,
            result_scroll: 0,
            animation_frame: 0,
            client,
            task: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Enter => {
                self.submit();
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let mut prompt = self.console.prompt().to_string();
                    let byte_pos = char_to_byte_index(&prompt, self.cursor);
                    prompt.remove(byte_pos);
                    self.console.apply(Event::PromptChanged(prompt));
                }
            }
            KeyCode::Delete => {
                let mut prompt = self.console.prompt().to_string();
                if self.cursor < prompt.chars().count() {
                    let byte_pos = char_to_byte_index(&prompt, self.cursor);
                    prompt.remove(byte_pos);
                    self.console.apply(Event::PromptChanged(prompt));
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                let char_count = self.console.prompt().chars().count();
                self.cursor = (self.cursor + 1).min(char_count);
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = self.console.prompt().chars().count();
            }
            KeyCode::Up => {
                self.result_scroll = self.result_scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                self.result_scroll = self.result_scroll.saturating_add(1);
            }
            KeyCode::PageUp => {
                self.result_scroll = self.result_scroll.saturating_sub(10);
            }
            KeyCode::PageDown => {
                self.result_scroll = self.result_scroll.saturating_add(10);
            }
            KeyCode::Char(c) => {
                let mut prompt = self.console.prompt().to_string();
                let byte_pos = char_to_byte_index(&prompt, self.cursor);
                prompt.insert(byte_pos, c);
                self.cursor += 1;
                self.console.apply(Event::PromptChanged(prompt));
            }
            _ => {}
        }
    }

    /// Enter pressed (or invoked programmatically). The in-flight slot is
    /// the interface-level guard; the console ignores re-entrant requests
    /// on top of that.
    pub fn submit(&mut self) {
        if self.task.is_some() {
            return;
        }
        if let Effect::StartCall(prompt) = self.console.apply(Event::GenerateRequested) {
            self.start_call(prompt);
        }
    }

    fn start_call(&mut self, prompt: String) {
        self.result_scroll = 0;
        match &self.client {
            Some(client) => {
                let client = client.clone();
                tracing::debug!(model = client.model(), "issuing generate request");
                self.task = Some(tokio::spawn(async move { client.generate(&prompt).await }));
            }
            None => {
                let message = format!("{API_KEY_ENV} is not set");
                tracing::error!("generate failed: {message}");
                self.console.apply(Event::CallFailed(Some(message)));
            }
        }
    }

    /// Drain the in-flight call once it finishes. No cancellation: the
    /// outcome is applied even if the prompt has been edited since.
    pub async fn poll_generate(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        if !task.is_finished() {
            self.task = Some(task);
            return;
        }

        match task.await {
            Ok(Ok(text)) => {
                self.console.apply(Event::CallSucceeded(text));
            }
            Ok(Err(fault)) => {
                tracing::error!("generate call failed: {fault}");
                self.console.apply(Event::CallFailed(Some(fault.to_string())));
            }
            Err(join_error) => {
                tracing::error!("generate task aborted: {join_error}");
                self.console.apply(Event::CallFailed(Some(join_error.to_string())));
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.console.phase() == Phase::Loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

fn char_to_byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ERROR_PREFIX;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_prompt(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    async fn drain_task(app: &mut App) {
        while app.task.is_some() {
            app.poll_generate().await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_submit_without_api_key_reports_error() {
        let mut app = App::new(None);
        type_prompt(&mut app, "hello");
        app.submit();
        assert!(app.task.is_none());
        assert_eq!(app.console.phase(), Phase::Error);
        assert!(app.console.error().unwrap().contains(API_KEY_ENV));
    }

    #[tokio::test]
    async fn test_blank_prompt_spawns_nothing() {
        let mut app = App::new(Some(GeminiClient::new("test-key")));
        type_prompt(&mut app, "   ");
        app.submit();
        assert!(app.task.is_none());
        assert_eq!(app.console.phase(), Phase::Error);
        assert_eq!(app.console.error(), Some("prompt required"));
    }

    #[tokio::test]
    async fn test_typing_clears_validation_error() {
        let mut app = App::new(None);
        app.submit();
        assert_eq!(app.console.phase(), Phase::Error);
        type_prompt(&mut app, "h");
        assert_eq!(app.console.phase(), Phase::Idle);
        assert_eq!(app.console.error(), None);
    }

    #[tokio::test]
    async fn test_submit_ignored_while_call_in_flight() {
        let mut app = App::new(None);
        type_prompt(&mut app, "hello");
        app.task = Some(tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(String::new())
        }));
        app.submit();
        // The guard returned before the console saw the request.
        assert_eq!(app.console.phase(), Phase::Idle);
        app.task.take().unwrap().abort();
    }

    #[tokio::test]
    async fn test_poll_applies_success() {
        let mut app = App::new(None);
        type_prompt(&mut app, "hello");
        app.console.apply(Event::GenerateRequested);
        app.task = Some(tokio::spawn(async { Ok("the answer".to_string()) }));
        drain_task(&mut app).await;
        assert_eq!(app.console.phase(), Phase::Result);
        assert_eq!(app.console.result(), Some("the answer"));
    }

    #[tokio::test]
    async fn test_connection_failure_surfaces_in_error_phase() {
        // Nothing listens on port 9; the transport error flows through
        // CallFailed with the standard prefix.
        let client = GeminiClient::with_base_url("test-key", "http://127.0.0.1:9");
        let mut app = App::new(Some(client));
        type_prompt(&mut app, "hello");
        app.submit();
        assert_eq!(app.console.phase(), Phase::Loading);
        drain_task(&mut app).await;
        assert_eq!(app.console.phase(), Phase::Error);
        assert!(app.console.error().unwrap().starts_with(ERROR_PREFIX));
    }

    #[test]
    fn test_cursor_editing_is_utf8_safe() {
        let mut app = App::new(None);
        type_prompt(&mut app, "héllo");
        app.handle_key(key(KeyCode::Home));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.console.prompt(), "hllo");
        app.handle_key(key(KeyCode::Char('é')));
        assert_eq!(app.console.prompt(), "héllo");
        app.handle_key(key(KeyCode::End));
        app.handle_key(key(KeyCode::Delete));
        assert_eq!(app.console.prompt(), "héllo");
    }
}
