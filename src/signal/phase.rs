// src/signal/phase.rs
//
// Six-position signal cycle. The two all-red positions look identical on
// the street but lead to different greens, so they are distinct states.

use crate::types::{SignalColor, SignalConfig};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NsGreen,
    NsYellow,
    AllRedToEw,
    EwGreen,
    EwYellow,
    AllRedToNs,
}

impl Phase {
    /// Cycle order, starting from the initial phase.
    pub const CYCLE: [Phase; 6] = [
        Phase::NsGreen,
        Phase::NsYellow,
        Phase::AllRedToEw,
        Phase::EwGreen,
        Phase::EwYellow,
        Phase::AllRedToNs,
    ];

    fn index(self) -> usize {
        match self {
            Phase::NsGreen => 0,
            Phase::NsYellow => 1,
            Phase::AllRedToEw => 2,
            Phase::EwGreen => 3,
            Phase::EwYellow => 4,
            Phase::AllRedToNs => 5,
        }
    }

    /// `(ns, ew)` lamp colors shown during this phase.
    pub fn colors(self) -> (SignalColor, SignalColor) {
        use SignalColor::*;
        match self {
            Phase::NsGreen => (Green, Red),
            Phase::NsYellow => (Yellow, Red),
            Phase::AllRedToEw | Phase::AllRedToNs => (Red, Red),
            Phase::EwGreen => (Red, Green),
            Phase::EwYellow => (Red, Yellow),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::NsGreen => "NS-GREEN",
            Phase::NsYellow => "NS-YELLOW",
            Phase::AllRedToEw => "ALL-RED>EW",
            Phase::EwGreen => "EW-GREEN",
            Phase::EwYellow => "EW-YELLOW",
            Phase::AllRedToNs => "ALL-RED>NS",
        }
    }
}

/// Transition table: `phase -> (duration, next phase)`.
#[derive(Debug, Clone)]
pub struct PhaseTable {
    entries: [(u32, Phase); 6],
}

impl PhaseTable {
    pub fn new(green_secs: u32, yellow_secs: u32, all_red_secs: u32) -> Self {
        let entries = [
            (green_secs, Phase::NsYellow),
            (yellow_secs, Phase::AllRedToEw),
            (all_red_secs, Phase::EwGreen),
            (green_secs, Phase::EwYellow),
            (yellow_secs, Phase::AllRedToNs),
            (all_red_secs, Phase::NsGreen),
        ];
        Self { entries }
    }

    pub fn from_config(config: &SignalConfig) -> Self {
        Self::new(config.green_secs, config.yellow_secs, config.all_red_secs)
    }

    pub fn duration(&self, phase: Phase) -> u32 {
        self.entries[phase.index()].0
    }

    pub fn next(&self, phase: Phase) -> Phase {
        self.entries[phase.index()].1
    }

    /// Next phase together with the countdown it starts with.
    pub fn advance(&self, phase: Phase) -> (Phase, u32) {
        let next = self.next(phase);
        (next, self.duration(next))
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self::from_config(&SignalConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_follows_cycle_order() {
        let table = PhaseTable::default();
        for (i, phase) in Phase::CYCLE.iter().enumerate() {
            assert_eq!(table.next(*phase), Phase::CYCLE[(i + 1) % 6]);
        }
    }

    #[test]
    fn test_default_durations() {
        let table = PhaseTable::default();
        let durations: Vec<u32> = Phase::CYCLE.iter().map(|p| table.duration(*p)).collect();
        assert_eq!(durations, vec![15, 3, 2, 15, 3, 2]);
    }

    #[test]
    fn test_no_phase_lights_both_axes() {
        for phase in Phase::CYCLE {
            let (ns, ew) = phase.colors();
            assert!(ns == SignalColor::Red || ew == SignalColor::Red, "{:?}", phase);
        }
    }

    #[test]
    fn test_all_red_positions_lead_to_different_greens() {
        let table = PhaseTable::default();
        assert_eq!(Phase::AllRedToEw.colors(), Phase::AllRedToNs.colors());
        assert_eq!(table.next(Phase::AllRedToEw), Phase::EwGreen);
        assert_eq!(table.next(Phase::AllRedToNs), Phase::NsGreen);
    }
}
