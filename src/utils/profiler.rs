use crate::utils::Logger;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Accumulates wall-clock time per pipeline section so slow stages can
/// be spotted without attaching an external profiler.
pub struct BuildProfiler {
    state: Mutex<ProfilerState>,
}

#[derive(Default)]
struct ProfilerState {
    running: HashMap<String, Instant>,
    sections: BTreeMap<String, SectionRecord>,
}

#[derive(Default, Clone, Copy)]
struct SectionRecord {
    total: Duration,
    max: Duration,
    calls: usize,
}

impl BuildProfiler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProfilerState::default()),
        }
    }

    pub fn start_timer(&self, name: &str) {
        self.state
            .lock()
            .running
            .insert(name.to_string(), Instant::now());
    }

    /// Stops the named timer and folds its duration into the section
    /// record. An end without a matching start records zero.
    pub fn end_timer(&self, name: &str) -> Duration {
        let mut state = self.state.lock();
        let elapsed = state
            .running
            .remove(name)
            .map(|start| start.elapsed())
            .unwrap_or_default();

        let record = state.sections.entry(name.to_string()).or_default();
        record.total += elapsed;
        record.max = record.max.max(elapsed);
        record.calls += 1;

        elapsed
    }

    /// Per-section totals, slowest first.
    pub fn summary(&self) -> Vec<SectionStats> {
        let state = self.state.lock();
        let mut sections: Vec<SectionStats> = state
            .sections
            .iter()
            .map(|(name, record)| SectionStats {
                name: name.clone(),
                total: record.total,
                max: record.max,
                calls: record.calls,
            })
            .collect();
        sections.sort_by(|a, b| b.total.cmp(&a.total));
        sections
    }

    pub fn report_bottlenecks(&self) {
        let sections = self.summary();
        if sections.is_empty() {
            return;
        }

        let profiled: Duration = sections.iter().map(|s| s.total).sum();
        Logger::debug("🔍 Build profile:");
        for section in sections.iter().take(5) {
            let share =
                section.total.as_millis() as f64 / profiled.as_millis().max(1) as f64 * 100.0;
            Logger::debug(&format!(
                "   {}: {:?} ({:.1}%, {} calls, max {:?})",
                section.name, section.total, share, section.calls, section.max
            ));
        }
    }
}

impl Default for BuildProfiler {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct SectionStats {
    pub name: String,
    pub total: Duration,
    pub max: Duration,
    pub calls: usize,
}

impl SectionStats {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            return Duration::ZERO;
        }
        self.total / self.calls as u32
    }
}
