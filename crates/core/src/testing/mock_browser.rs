//! Mock browser engine and session for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::browser::{BrowserEngine, BrowserError, BrowserSession, SessionError, SessionOptions};

/// A command issued through a mock session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCommand {
    Goto(String),
    WaitFor(String),
    CurrentUrl,
    SetValue { selector: String, value: String },
    AttachFile {
        selector: String,
        path: PathBuf,
        /// Whether the file existed when it was attached.
        existed: bool,
    },
    Click(String),
    Close,
}

impl BrowserCommand {
    /// Selector this command addressed, if any.
    pub fn selector(&self) -> Option<&str> {
        match self {
            Self::WaitFor(s) | Self::Click(s) => Some(s),
            Self::SetValue { selector, .. } | Self::AttachFile { selector, .. } => Some(selector),
            Self::Goto(_) | Self::CurrentUrl | Self::Close => None,
        }
    }
}

#[derive(Debug, Default)]
struct MockBrowserState {
    commands: Vec<BrowserCommand>,
    sessions_opened: usize,
    sessions_closed: usize,
    last_options: Option<SessionOptions>,
    /// Selectors that never appear.
    missing: HashSet<String>,
    /// Selector whose first use panics.
    panic_on: Option<String>,
    fail_open: bool,
    fail_close: bool,
    current_url: String,
}

/// Mock implementation of the BrowserEngine trait.
///
/// Sessions share state with the engine, so assertions can be made after
/// the orchestrator has closed and dropped them.
///
/// # Example
///
/// ```rust,ignore
/// let engine = MockBrowserEngine::new();
/// engine.set_missing_element("input[type='file']");
///
/// // ... run a publish ...
///
/// assert_eq!(engine.sessions_opened(), 1);
/// assert_eq!(engine.open_sessions(), 0);
/// assert!(!engine.was_addressed("input[name='bpm']"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockBrowserEngine {
    state: Arc<Mutex<MockBrowserState>>,
}

impl MockBrowserEngine {
    /// Create a mock engine whose sessions find every element.
    pub fn new() -> Self {
        let engine = Self::default();
        engine.state().current_url = "about:blank".to_string();
        engine
    }

    fn state(&self) -> MutexGuard<'_, MockBrowserState> {
        lock(&self.state)
    }

    /// Make waits for `selector` time out and lookups fail.
    pub fn set_missing_element(&self, selector: &str) {
        self.state().missing.insert(selector.to_string());
    }

    /// Panic the first time `selector` is used.
    pub fn set_panic_on(&self, selector: &str) {
        self.state().panic_on = Some(selector.to_string());
    }

    /// Make `open` fail as if the browser could not start.
    pub fn set_fail_open(&self, fail: bool) {
        self.state().fail_open = fail;
    }

    /// Make `close` report an error (the session still counts as closed).
    pub fn set_fail_close(&self, fail: bool) {
        self.state().fail_close = fail;
    }

    /// URL reported by `current_url`.
    pub fn set_current_url(&self, url: &str) {
        self.state().current_url = url.to_string();
    }

    /// All commands issued across sessions, in order.
    pub fn commands(&self) -> Vec<BrowserCommand> {
        self.state().commands.clone()
    }

    /// Whether any command addressed `selector`.
    pub fn was_addressed(&self, selector: &str) -> bool {
        self.state()
            .commands
            .iter()
            .any(|c| c.selector() == Some(selector))
    }

    /// Values typed into `selector`, in order.
    pub fn values_set(&self, selector: &str) -> Vec<String> {
        self.state()
            .commands
            .iter()
            .filter_map(|c| match c {
                BrowserCommand::SetValue { selector: s, value } if s == selector => {
                    Some(value.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state().sessions_opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.state().sessions_closed
    }

    /// Sessions opened but not yet closed.
    pub fn open_sessions(&self) -> usize {
        let state = self.state();
        state.sessions_opened - state.sessions_closed
    }

    /// Options passed to the most recent `open`.
    pub fn last_options(&self) -> Option<SessionOptions> {
        self.state().last_options.clone()
    }
}

fn lock(state: &Mutex<MockBrowserState>) -> MutexGuard<'_, MockBrowserState> {
    // A panicking session must not poison later assertions.
    state.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl BrowserEngine for MockBrowserEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, SessionError> {
        let mut state = self.state();
        state.last_options = Some(options.clone());
        if state.fail_open {
            return Err(SessionError::StartFailed("mock engine refused".to_string()));
        }
        state.sessions_opened += 1;
        drop(state);

        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
            open: AtomicBool::new(true),
        }))
    }
}

/// Session handed out by [`MockBrowserEngine`].
#[derive(Debug)]
pub struct MockSession {
    state: Arc<Mutex<MockBrowserState>>,
    open: AtomicBool,
}

impl MockSession {
    /// Record `command` and apply the configured failure behavior for
    /// `selector`. Returns whether the selector is missing.
    fn record(&self, command: BrowserCommand) -> Result<bool, BrowserError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(BrowserError::Closed);
        }

        let selector = command.selector().map(String::from);
        let (missing, panic) = {
            let mut state = lock(&self.state);
            state.commands.push(command);
            match &selector {
                Some(s) => {
                    let panic = state.panic_on.as_deref() == Some(s.as_str());
                    if panic {
                        state.panic_on = None;
                    }
                    (state.missing.contains(s), panic)
                }
                None => (false, false),
            }
        };

        if panic {
            panic!("mock session panic on {:?}", selector);
        }
        Ok(missing)
    }

    fn lookup(&self, command: BrowserCommand) -> Result<(), BrowserError> {
        let selector = command.selector().unwrap_or_default().to_string();
        if self.record(command)? {
            return Err(BrowserError::ElementNotFound(selector));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.record(BrowserCommand::Goto(url.to_string()))?;
        Ok(())
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        if self.record(BrowserCommand::WaitFor(selector.to_string()))? {
            return Err(BrowserError::Timeout {
                condition: selector.to_string(),
                waited: timeout,
            });
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        self.record(BrowserCommand::CurrentUrl)?;
        Ok(lock(&self.state).current_url.clone())
    }

    async fn set_value(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        self.lookup(BrowserCommand::SetValue {
            selector: selector.to_string(),
            value: value.to_string(),
        })
    }

    async fn attach_file(&self, selector: &str, path: &Path) -> Result<(), BrowserError> {
        self.lookup(BrowserCommand::AttachFile {
            selector: selector.to_string(),
            path: path.to_path_buf(),
            existed: path.exists(),
        })
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.lookup(BrowserCommand::Click(selector.to_string()))
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), BrowserError> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        let mut state = lock(&self.state);
        state.commands.push(BrowserCommand::Close);
        state.sessions_closed += 1;
        if state.fail_close {
            return Err(BrowserError::Command("mock close failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_records_and_closes_once() {
        let engine = MockBrowserEngine::new();
        let session = engine.open(&SessionOptions::default()).await.unwrap();

        session.goto("https://example.com").await.unwrap();
        session.click("#go").await.unwrap();
        session.close().await.unwrap();
        session.close().await.unwrap();

        assert_eq!(engine.sessions_opened(), 1);
        assert_eq!(engine.sessions_closed(), 1);
        assert!(!session.is_open());
        assert!(matches!(
            session.click("#go").await,
            Err(BrowserError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_missing_element_times_out() {
        let engine = MockBrowserEngine::new();
        engine.set_missing_element("#late");
        let session = engine.open(&SessionOptions::default()).await.unwrap();

        let result = session
            .wait_for_element("#late", Duration::from_secs(10))
            .await;
        assert!(matches!(result, Err(BrowserError::Timeout { .. })));
        assert!(matches!(
            session.click("#late").await,
            Err(BrowserError::ElementNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_open() {
        let engine = MockBrowserEngine::new();
        engine.set_fail_open(true);
        assert!(engine.open(&SessionOptions::default()).await.is_err());
        assert_eq!(engine.sessions_opened(), 0);
    }
}
