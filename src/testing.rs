//! In-memory browser used by unit tests

use crate::browser::{Driver, DriverError, Launcher};
use crate::crawler::{CrawlEvent, EventLog};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct MockState {
    /// Markup served per URL; unknown URLs serve an empty document
    pub pages: HashMap<String, String>,
    /// Scripted `goto` outcomes, consumed before falling back to success
    pub goto_script: VecDeque<Result<(), DriverError>>,
    /// Launch failures to return before launching succeeds
    pub launch_failures: VecDeque<DriverError>,
    pub visits: Vec<String>,
    pub launches: u32,
    pub quits: u32,
    current: Option<String>,
}

#[derive(Clone, Default)]
pub struct MockLauncher {
    pub state: Arc<Mutex<MockState>>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), html.to_string());
        self
    }

    pub fn script_goto(&self, outcome: Result<(), DriverError>) {
        self.state.lock().unwrap().goto_script.push_back(outcome);
    }

    pub fn fail_launch(&self, error: DriverError) {
        self.state.lock().unwrap().launch_failures.push_back(error);
    }

    pub fn launches(&self) -> u32 {
        self.state.lock().unwrap().launches
    }

    pub fn quits(&self) -> u32 {
        self.state.lock().unwrap().quits
    }

    pub fn visits(&self) -> Vec<String> {
        self.state.lock().unwrap().visits.clone()
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn launch(&self) -> Result<Box<dyn Driver>, DriverError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.launch_failures.pop_front() {
            return Err(error);
        }
        state.launches += 1;
        Ok(Box::new(MockDriver {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl Driver for MockDriver {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.visits.push(url.to_string());
        if let Some(outcome) = state.goto_script.pop_front() {
            outcome?;
        }
        state.current = Some(url.to_string());
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        let html = state
            .current
            .as_ref()
            .and_then(|url| state.pages.get(url))
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string());
        Ok(html)
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        self.state.lock().unwrap().quits += 1;
        Ok(())
    }
}

/// Event log that keeps every event for inspection
#[derive(Default)]
pub struct RecordingLog {
    pub events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingLog {
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&CrawlEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }
}

impl EventLog for RecordingLog {
    fn record(&self, event: &CrawlEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
