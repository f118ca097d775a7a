//! Accumulated hit/total statistics per functional unit and per instance.
//!
//! Totals are `Option<u32>`: `None` means "not yet computed / unknowable"
//! and propagates through accumulation instead of combining arithmetically.
//! An FSM with no declared legal transitions, for example, has unknowable
//! state and arc totals, and every ancestor that folds it in inherits the
//! unknown.

use serde::{Deserialize, Serialize};

/// Hit/total counters for every coverage metric tracked by the database.
///
/// Computed bottom-up: an instance's statistics are its own functional
/// unit's statistics plus the sum over all child instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Total combinational expression pairs, if known.
    pub comb_total: Option<u32>,
    /// Combinational expression pairs observed.
    pub comb_hit: u32,
    /// Total FSM states, if known.
    pub state_total: Option<u32>,
    /// FSM states reached.
    pub state_hit: u32,
    /// Total FSM transition arcs, if known.
    pub arc_total: Option<u32>,
    /// FSM transition arcs traversed.
    pub arc_hit: u32,
    /// Total signal bits eligible for toggle coverage, if known.
    pub tog_total: Option<u32>,
    /// Signal bits seen toggling 0→1.
    pub tog01_hit: u32,
    /// Signal bits seen toggling 1→0.
    pub tog10_hit: u32,
    /// Total memory addressable elements, if known.
    pub mem_ae_total: Option<u32>,
    /// Memory addressable elements written.
    pub mem_wr_hit: u32,
    /// Memory addressable elements read.
    pub mem_rd_hit: u32,
    /// Total memory bits eligible for toggle coverage, if known.
    pub mem_tog_total: Option<u32>,
    /// Memory bits seen toggling 0→1.
    pub mem_tog01_hit: u32,
    /// Memory bits seen toggling 1→0.
    pub mem_tog10_hit: u32,
}

fn add_total(acc: &mut Option<u32>, add: Option<u32>) {
    *acc = match (*acc, add) {
        (Some(a), Some(b)) => Some(a + b),
        _ => None,
    };
}

impl Statistics {
    /// Statistics with every total known and zero.
    pub fn zero() -> Self {
        Self {
            comb_total: Some(0),
            state_total: Some(0),
            arc_total: Some(0),
            tog_total: Some(0),
            mem_ae_total: Some(0),
            mem_tog_total: Some(0),
            ..Self::default()
        }
    }

    /// Folds another set of statistics into this one.
    ///
    /// Hits add; totals add unless either side is unknown, in which case
    /// the result is unknown.
    pub fn absorb(&mut self, other: &Statistics) {
        add_total(&mut self.comb_total, other.comb_total);
        self.comb_hit += other.comb_hit;
        add_total(&mut self.state_total, other.state_total);
        self.state_hit += other.state_hit;
        add_total(&mut self.arc_total, other.arc_total);
        self.arc_hit += other.arc_hit;
        add_total(&mut self.tog_total, other.tog_total);
        self.tog01_hit += other.tog01_hit;
        self.tog10_hit += other.tog10_hit;
        add_total(&mut self.mem_ae_total, other.mem_ae_total);
        self.mem_wr_hit += other.mem_wr_hit;
        self.mem_rd_hit += other.mem_rd_hit;
        add_total(&mut self.mem_tog_total, other.mem_tog_total);
        self.mem_tog01_hit += other.mem_tog01_hit;
        self.mem_tog10_hit += other.mem_tog10_hit;
    }

    /// Sum of all hit counters, used for cheap cross-run comparisons.
    pub fn total_hits(&self) -> u64 {
        u64::from(self.comb_hit)
            + u64::from(self.state_hit)
            + u64::from(self.arc_hit)
            + u64::from(self.tog01_hit)
            + u64::from(self.tog10_hit)
            + u64::from(self.mem_wr_hit)
            + u64::from(self.mem_rd_hit)
            + u64::from(self.mem_tog01_hit)
            + u64::from(self.mem_tog10_hit)
    }
}

/// Database-wide coverage-point counts per metric.
///
/// Persisted in the INFO record of a coverage database file; two files can
/// only be merged when their counts agree, since differing counts indicate
/// different design elaborations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCounts {
    /// Combinational expression pairs scored.
    pub comb: u64,
    /// FSM transition arcs scored (declared-legal arcs).
    pub fsm: u64,
    /// Signal bits scored for toggle coverage.
    pub toggle: u64,
    /// Memory addressable elements scored.
    pub memory: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_known() {
        let s = Statistics::zero();
        assert_eq!(s.comb_total, Some(0));
        assert_eq!(s.arc_total, Some(0));
        assert_eq!(s.total_hits(), 0);
    }

    #[test]
    fn absorb_adds_hits_and_totals() {
        let mut a = Statistics::zero();
        a.comb_total = Some(4);
        a.comb_hit = 2;
        let mut b = Statistics::zero();
        b.comb_total = Some(3);
        b.comb_hit = 1;
        a.absorb(&b);
        assert_eq!(a.comb_total, Some(7));
        assert_eq!(a.comb_hit, 3);
    }

    #[test]
    fn unknown_total_propagates() {
        let mut a = Statistics::zero();
        a.arc_total = Some(5);
        let mut b = Statistics::zero();
        b.arc_total = None;
        b.arc_hit = 2;
        a.absorb(&b);
        // Unknown swallows the known side; hits still add.
        assert_eq!(a.arc_total, None);
        assert_eq!(a.arc_hit, 2);

        let c = Statistics::zero();
        a.absorb(&c);
        assert_eq!(a.arc_total, None);
    }

    #[test]
    fn default_totals_are_unknown() {
        let s = Statistics::default();
        assert_eq!(s.comb_total, None);
        assert_eq!(s.state_total, None);
    }

    #[test]
    fn serde_roundtrip() {
        let mut s = Statistics::zero();
        s.state_total = None;
        s.state_hit = 3;
        let json = serde_json::to_string(&s).unwrap();
        let back: Statistics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
