//! Debug and statistics module

use std::collections::VecDeque;
use std::time::Duration;

use glam::Vec2;

/// Rolling statistics over recent path searches
#[derive(Debug)]
pub struct SearchStats {
    /// Search time history for averaging
    search_times: VecDeque<Duration>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Average search time in milliseconds
    avg_search_time_ms: f32,
    /// Maximum search time in milliseconds
    max_search_time_ms: f32,
    /// Total searches run
    total_searches: u64,
    /// Searches that found no path
    failed_searches: u64,
}

impl SearchStats {
    /// Create a new search stats tracker
    #[must_use]
    pub fn new() -> Self {
        Self {
            search_times: VecDeque::with_capacity(120),
            max_samples: 120,
            avg_search_time_ms: 0.0,
            max_search_time_ms: 0.0,
            total_searches: 0,
            failed_searches: 0,
        }
    }

    /// Record a search and whether it found a path
    pub fn record_search(&mut self, elapsed: Duration, found: bool) {
        self.total_searches += 1;
        if !found {
            self.failed_searches += 1;
        }

        if self.search_times.len() >= self.max_samples {
            self.search_times.pop_front();
        }
        self.search_times.push_back(elapsed);

        self.update_stats();
    }

    fn update_stats(&mut self) {
        if self.search_times.is_empty() {
            return;
        }

        let mut total = Duration::ZERO;
        let mut max = Duration::ZERO;

        for &dt in &self.search_times {
            total += dt;
            max = max.max(dt);
        }

        let count = self.search_times.len() as f32;
        self.avg_search_time_ms = total.as_secs_f32() / count * 1000.0;
        self.max_search_time_ms = max.as_secs_f32() * 1000.0;
    }

    /// Average search time in milliseconds
    #[must_use]
    pub fn avg_search_time_ms(&self) -> f32 {
        self.avg_search_time_ms
    }

    /// Slowest recent search in milliseconds
    #[must_use]
    pub fn max_search_time_ms(&self) -> f32 {
        self.max_search_time_ms
    }

    /// Total searches run
    #[must_use]
    pub fn total_searches(&self) -> u64 {
        self.total_searches
    }

    /// Searches that found no path
    #[must_use]
    pub fn failed_searches(&self) -> u64 {
        self.failed_searches
    }

    /// Get a formatted stats string
    #[must_use]
    pub fn format_stats(&self) -> String {
        format!(
            "Paths: {} ({} failed) | Search: {:.3}ms (max: {:.3})",
            self.total_searches,
            self.failed_searches,
            self.avg_search_time_ms,
            self.max_search_time_ms
        )
    }
}

impl Default for SearchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Overlay data collected once per tick for a diagnostic view.
///
/// Nothing here affects simulation; a renderer may draw it or ignore it.
#[derive(Debug, Default)]
pub struct DebugOverlay {
    /// Whether collection is enabled
    pub enabled: bool,
    /// Navmesh links
    pub edges: Vec<(Vec2, Vec2)>,
    /// Recent search results, newest last
    pub paths: Vec<Vec<Vec2>>,
    /// Free-form lines
    lines: Vec<String>,
}

impl DebugOverlay {
    /// Create an enabled overlay
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// Toggle collection
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    /// Add a text line
    pub fn add_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Text lines collected this tick
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Drop everything collected
    pub fn clear(&mut self) {
        self.edges.clear();
        self.paths.clear();
        self.lines.clear();
    }
}
