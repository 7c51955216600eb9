#![allow(dead_code)]

use std::sync::{Mutex, PoisonError};

use recipes_cli::frontend::{Destination, Frontend};
use recipes_proto::v1::Entity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Render(Vec<String>),
    Alert(String),
    Navigate(Destination),
}

/// Remembers everything a page showed the user.
#[derive(Debug, Default)]
pub struct RecordingFrontend {
    events: Mutex<Vec<Event>>,
}

impl RecordingFrontend {
    fn push(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Alert(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn renders(&self) -> Vec<Vec<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Render(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn last_render(&self) -> Option<Vec<String>> {
        self.renders().pop()
    }

    pub fn navigations(&self) -> Vec<Destination> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Navigate(d) => Some(d),
                _ => None,
            })
            .collect()
    }
}

impl Frontend for RecordingFrontend {
    fn render<E: Entity>(&self, records: &[E]) {
        self.push(Event::Render(
            records.iter().map(|r| r.to_string()).collect(),
        ));
    }

    fn alert(&self, message: &str) {
        self.push(Event::Alert(message.to_string()));
    }

    fn navigate(&self, destination: Destination) {
        self.push(Event::Navigate(destination));
    }
}
