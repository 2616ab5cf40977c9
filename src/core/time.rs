//! Per-tick timing handed to every AI update

/// Timing of the current simulation tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UpdateContext {
    /// Ticks since the simulation started
    pub frame_count: u64,
    /// Simulation time at the start of this tick, milliseconds
    pub timestamp_ms: u32,
    /// Length of this tick, milliseconds
    pub delta_ms: u32,
    /// Length of this tick, seconds
    pub delta_s: f32,
}

impl UpdateContext {
    /// Context for the first tick of a simulation
    #[must_use]
    pub fn new(delta_s: f32) -> Self {
        Self {
            frame_count: 0,
            timestamp_ms: 0,
            delta_ms: seconds_to_ms(delta_s),
            delta_s,
        }
    }

    /// Context for the tick following this one
    #[must_use]
    pub fn advance(&self, delta_s: f32) -> Self {
        Self {
            frame_count: self.frame_count + 1,
            timestamp_ms: self.timestamp_ms.wrapping_add(self.delta_ms),
            delta_ms: seconds_to_ms(delta_s),
            delta_s,
        }
    }
}

fn seconds_to_ms(seconds: f32) -> u32 {
    (seconds.max(0.0) * 1000.0).round() as u32
}
