//! Applying harvested configuration to a registry

use stratum_core::{Locator, Outcome, Registry};
use tracing::{debug, info};

use crate::Result;
use crate::event::{Event, Harvest, Source};

/// Collects events from any number of sources, then applies them in the
/// order they arrived.
#[derive(Debug, Clone, Default)]
pub struct Configurator {
    harvest: Harvest,
}

impl Configurator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Harvest `source` and queue its events behind those already collected.
    pub fn collect(&mut self, source: &dyn Source) -> Result<&mut Self> {
        let harvest = source.harvest()?;
        debug!(
            source = %source.describe(),
            events = harvest.events.len(),
            "harvested configuration"
        );
        self.harvest.extend(harvest);
        Ok(self)
    }

    pub fn push(&mut self, event: Event) -> &mut Self {
        self.harvest.push(event);
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.harvest.events
    }

    pub fn positional(&self) -> &[String] {
        &self.harvest.positional
    }

    /// Write every queued event through [`Registry::configure`].
    ///
    /// Stops at the first event the registry rejects; events before it stay
    /// applied.
    pub fn apply(&self, registry: &mut Registry) -> Result<Report> {
        let mut report = Report::default();
        for event in &self.harvest.events {
            let outcome = registry.configure(
                &event.key,
                event.value.clone(),
                event.category,
                event.locator.clone(),
            )?;
            report.entries.push(ReportEntry {
                key: event.key.clone(),
                locator: event.locator.clone(),
                outcome,
            });
        }
        info!(
            applied = report.applied().count(),
            shadowed = report.shadowed().count(),
            "configuration applied"
        );
        Ok(report)
    }
}

/// What happened to one event
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub key: String,
    pub locator: Locator,
    pub outcome: Outcome,
}

/// What happened to every event, in application order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn applied(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.outcome.is_applied())
    }

    pub fn shadowed(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| !e.outcome.is_applied())
    }

    /// Entries for `key`, oldest first
    pub fn for_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a ReportEntry> {
        self.entries.iter().filter(move |e| e.key == key)
    }
}
