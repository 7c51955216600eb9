use std::fmt;
use std::sync::{Mutex, PoisonError};

use recipes_proto::v1::Entity;

use crate::OutputMode;

/// Where a page may send the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Login,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Login => f.write_str("login"),
        }
    }
}

/// Everything a page does to the user, as opposed to the backend.
pub trait Frontend: Send + Sync {
    /// Replace whatever list was shown before with `records`, in order.
    fn render<E: Entity>(&self, records: &[E]);

    fn alert(&self, message: &str);

    fn navigate(&self, destination: Destination);
}

/// A terminal can't take back what it printed, so each render replaces a
/// pending view and [`TerminalFrontend::flush`] prints whichever view is
/// current when the command ends. Alerts go to stderr straight away.
#[derive(Debug, Default)]
pub struct TerminalFrontend {
    output_mode: OutputMode,
    view: Mutex<Option<String>>,
}

impl TerminalFrontend {
    pub fn new(output_mode: OutputMode) -> Self {
        TerminalFrontend {
            output_mode,
            view: Mutex::new(None),
        }
    }

    /// The view that would be printed by [`TerminalFrontend::flush`].
    pub fn view(&self) -> Option<String> {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn flush(&self) {
        let view = self
            .view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(view) = view {
            print!("{}", view);
        }
    }
}

impl Frontend for TerminalFrontend {
    fn render<E: Entity>(&self, records: &[E]) {
        let view = match self.output_mode {
            OutputMode::Json => match serde_json::to_string(records) {
                Ok(s) => format!("{}\n", s),
                Err(e) => {
                    error!(?e, "unable to encode {} list", E::KIND);
                    return;
                }
            },
            OutputMode::Text => records.iter().map(|r| format!("{}\n", r)).collect(),
        };
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = Some(view);
    }

    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn navigate(&self, destination: Destination) {
        match destination {
            Destination::Login => eprintln!("Please log in to continue."),
        }
    }
}
