//! Analytics sinks.

use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::infrastructure::traits::{AnalyticsError, AnalyticsEvent, AnalyticsSink};

/// Emits each event as a structured `tracing` record.
#[derive(Debug, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn track_event(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        info!(
            category = %event.category,
            action = %event.action,
            label = %event.label,
            "analytics event"
        );
        Ok(())
    }
}

/// Keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemoryAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AnalyticsSink for MemoryAnalytics {
    fn track_event(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        self.events
            .lock()
            .map_err(|e| AnalyticsError(e.to_string()))?
            .push(event.clone());
        Ok(())
    }
}
