use std::collections::HashMap;

/// Named one-shot timers. At most one pending start per name;
/// a second `start` before `end` overwrites (last start wins).
#[derive(Debug, Default)]
pub struct TimerTable {
    pending: HashMap<String, u64>,
}

impl TimerTable {
    /// Record `now_ms` as the pending start for `name`.
    pub fn start_at(&mut self, name: &str, now_ms: u64) {
        self.pending.insert(name.to_owned(), now_ms);
    }

    /// Elapsed ms since the pending start, removing the entry.
    /// Returns 0 when no timer with that name was started.
    pub fn end_at(&mut self, name: &str, now_ms: u64) -> u64 {
        match self.pending.remove(name) {
            Some(start) => now_ms.saturating_sub(start),
            None => 0,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Named monotonically-increasing counters.
#[derive(Debug, Default)]
pub struct CounterTable {
    counts: HashMap<String, u64>,
}

impl CounterTable {
    /// Bump the counter, creating it at 1 when absent. Returns the new value.
    pub fn increment(&mut self, name: &str) -> u64 {
        let count = self.counts.entry(name.to_owned()).or_insert(0);
        *count += 1;
        *count
    }

    /// Current value; 0 when the counter was never incremented.
    pub fn get(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Set the counter back to 0. The key stays in the table.
    pub fn reset(&mut self, name: &str) {
        self.counts.insert(name.to_owned(), 0);
    }

    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts.clone()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_without_start_returns_zero_and_leaves_table_untouched() {
        let mut timers = TimerTable::default();
        assert_eq!(timers.end_at("missing", 500), 0);
        assert_eq!(timers.pending_len(), 0);
    }

    #[test]
    fn second_start_overwrites_pending_entry() {
        let mut timers = TimerTable::default();
        timers.start_at("render", 100);
        timers.start_at("render", 400);
        // Elapsed is relative to the second start
        assert_eq!(timers.end_at("render", 450), 50);
        // Entry was consumed
        assert_eq!(timers.end_at("render", 500), 0);
    }

    #[test]
    fn end_removes_only_the_named_timer() {
        let mut timers = TimerTable::default();
        timers.start_at("a", 0);
        timers.start_at("b", 10);
        assert_eq!(timers.end_at("a", 30), 30);
        assert_eq!(timers.pending_len(), 1);
        assert_eq!(timers.end_at("b", 30), 20);
    }

    #[test]
    fn counter_increments_and_reads_back() {
        let mut counters = CounterTable::default();
        for _ in 0..7 {
            counters.increment("modal-open");
        }
        assert_eq!(counters.get("modal-open"), 7);
        assert_eq!(counters.get("never-touched"), 0);
    }

    #[test]
    fn reset_zeroes_but_keeps_the_key() {
        let mut counters = CounterTable::default();
        counters.increment("clicks");
        counters.reset("clicks");
        assert_eq!(counters.get("clicks"), 0);
        assert!(counters.snapshot().contains_key("clicks"));
    }

    #[test]
    fn reset_of_unknown_counter_creates_zero_entry() {
        let mut counters = CounterTable::default();
        counters.reset("fresh");
        assert_eq!(counters.get("fresh"), 0);
        assert!(counters.snapshot().contains_key("fresh"));
    }
}
