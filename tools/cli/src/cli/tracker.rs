use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandKind {
    Load,
    Add,
    Update,
    Delete,
    Search,
    Logout,
    Register,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandKind::Load => "load",
            CommandKind::Add => "add",
            CommandKind::Update => "update",
            CommandKind::Delete => "delete",
            CommandKind::Search => "search",
            CommandKind::Logout => "logout",
            CommandKind::Register => "register",
        };
        f.write_str(s)
    }
}

impl CommandKind {
    /// Capitalised indefinite article for the command name.
    pub fn article(self) -> &'static str {
        match self {
            CommandKind::Add | CommandKind::Update => "An",
            _ => "A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandState {
    #[default]
    Idle,
    InFlight,
    Success,
    Failed,
}

/// Tracks the state of each kind of command so a second invocation can be
/// refused while the first is still in flight.
#[derive(Debug, Default)]
pub struct CommandTracker {
    states: Mutex<BTreeMap<CommandKind, CommandState>>,
}

impl CommandTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn states(&self) -> MutexGuard<'_, BTreeMap<CommandKind, CommandState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self, kind: CommandKind) -> CommandState {
        self.states().get(&kind).copied().unwrap_or_default()
    }

    /// `None` if `kind` is already in flight.
    pub fn begin(&self, kind: CommandKind) -> Option<CommandTicket<'_>> {
        let mut states = self.states();
        let state = states.entry(kind).or_default();
        if *state == CommandState::InFlight {
            return None;
        }
        *state = CommandState::InFlight;
        Some(CommandTicket {
            tracker: self,
            kind,
            succeeded: false,
        })
    }
}

/// Held for the duration of a command. Unless [`CommandTicket::succeed`] is
/// called the command is recorded as failed when this drops.
#[derive(Debug)]
pub struct CommandTicket<'a> {
    tracker: &'a CommandTracker,
    kind: CommandKind,
    succeeded: bool,
}

impl CommandTicket<'_> {
    pub fn succeed(mut self) {
        self.succeeded = true;
    }
}

impl Drop for CommandTicket<'_> {
    fn drop(&mut self) {
        let end = if self.succeeded {
            CommandState::Success
        } else {
            CommandState::Failed
        };
        self.tracker.states().insert(self.kind, end);
    }
}
