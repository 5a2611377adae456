//! Browser host abstraction
//!
//! The navigation controller only touches the page through [`BrowserHost`]:
//! reading `location.href`, pushing/replacing history entries and forcing a
//! document load. [`MemoryHost`] keeps all of that in memory.

use parking_lot::Mutex;

use crate::Result;

pub trait BrowserHost: Send + Sync {
    /// Current document URL (`location.href`)
    fn location(&self) -> Result<String>;

    /// `history.pushState({}, "", url)`
    fn push_state(&self, url: &str) -> Result<()>;

    /// `history.replaceState({}, "", url)`
    fn replace_state(&self, url: &str) -> Result<()>;

    /// `location.reload()`
    fn reload(&self) -> Result<()>;

    /// `location = url`
    fn assign(&self, url: &str) -> Result<()>;

    /// Whether `history.state` is present and non-null
    fn history_state_present(&self) -> bool;
}

/// A recorded host interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    PushState(String),
    ReplaceState(String),
    Reload,
    Assign(String),
}

#[derive(Debug, Clone)]
struct Entry {
    url: String,
    /// Entries created through pushState/replaceState carry a state object
    has_state: bool,
}

#[derive(Debug)]
struct MemoryState {
    entries: Vec<Entry>,
    index: usize,
    calls: Vec<HostCall>,
}

/// In-memory host with a history stack and a call log.
#[derive(Debug)]
pub struct MemoryHost {
    state: Mutex<MemoryState>,
}

impl MemoryHost {
    /// A host whose document was loaded from `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                entries: vec![Entry {
                    url: url.into(),
                    has_state: false,
                }],
                index: 0,
                calls: Vec::new(),
            }),
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().calls.clone()
    }

    /// History mutations only (push/replace)
    pub fn history_calls(&self) -> Vec<HostCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, HostCall::PushState(_) | HostCall::ReplaceState(_)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Number of entries in the session history
    pub fn history_len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Step back one entry. Returns false at the start of history.
    pub fn back(&self) -> bool {
        let mut state = self.state.lock();
        if state.index == 0 {
            return false;
        }
        state.index -= 1;
        true
    }

    /// Step forward one entry. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        let mut state = self.state.lock();
        if state.index + 1 >= state.entries.len() {
            return false;
        }
        state.index += 1;
        true
    }
}

impl BrowserHost for MemoryHost {
    fn location(&self) -> Result<String> {
        let state = self.state.lock();
        Ok(state.entries[state.index].url.clone())
    }

    fn push_state(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        let next = state.index + 1;
        state.entries.truncate(next);
        state.entries.push(Entry {
            url: url.to_string(),
            has_state: true,
        });
        state.index = next;
        state.calls.push(HostCall::PushState(url.to_string()));
        Ok(())
    }

    fn replace_state(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        let index = state.index;
        state.entries[index] = Entry {
            url: url.to_string(),
            has_state: true,
        };
        state.calls.push(HostCall::ReplaceState(url.to_string()));
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        self.state.lock().calls.push(HostCall::Reload);
        Ok(())
    }

    fn assign(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        let index = state.index;
        if state.entries[index].url != url {
            let next = index + 1;
            state.entries.truncate(next);
            state.entries.push(Entry {
                url: url.to_string(),
                has_state: false,
            });
            state.index = next;
        }
        state.calls.push(HostCall::Assign(url.to_string()));
        Ok(())
    }

    fn history_state_present(&self) -> bool {
        let state = self.state.lock();
        state.entries[state.index].has_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_back() {
        let host = MemoryHost::new("https://app.test/");
        assert!(!host.history_state_present());

        host.push_state("https://app.test/a").unwrap();
        host.push_state("https://app.test/b").unwrap();
        assert_eq!(host.location().unwrap(), "https://app.test/b");
        assert_eq!(host.history_len(), 3);
        assert!(host.history_state_present());

        assert!(host.back());
        assert_eq!(host.location().unwrap(), "https://app.test/a");
        assert!(host.back());
        assert!(!host.history_state_present());
        assert!(!host.back());

        assert!(host.forward());
        assert_eq!(host.location().unwrap(), "https://app.test/a");
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let host = MemoryHost::new("https://app.test/");
        host.push_state("https://app.test/a").unwrap();
        host.back();
        host.push_state("https://app.test/c").unwrap();

        assert_eq!(host.history_len(), 2);
        assert!(!host.forward());
    }

    #[test]
    fn test_replace_keeps_length() {
        let host = MemoryHost::new("https://app.test/");
        host.replace_state("https://app.test/x").unwrap();

        assert_eq!(host.history_len(), 1);
        assert_eq!(host.location().unwrap(), "https://app.test/x");
        assert_eq!(
            host.history_calls(),
            vec![HostCall::ReplaceState("https://app.test/x".to_string())]
        );
    }

    #[test]
    fn test_reload_is_recorded_but_not_a_history_call() {
        let host = MemoryHost::new("https://app.test/");
        host.reload().unwrap();

        assert_eq!(host.calls(), vec![HostCall::Reload]);
        assert!(host.history_calls().is_empty());
    }
}
