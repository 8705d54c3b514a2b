//! Simulation statistics collection trait

/// Trait for collecting simulation statistics
///
/// Movement and reaction code records through this trait so callers decide
/// whether counting is worth the cost.
pub trait SimStats {
    /// Record that a cell changed position
    fn record_cell_moved(&mut self);

    /// Record that a reaction replaced or deleted a cell (ignition, corrosion)
    fn record_reaction(&mut self);

    /// Record that a cell changed phase (condensing, cooling, dissolving, expiring)
    fn record_phase_change(&mut self);

    /// Record that a blast went off
    fn record_explosion(&mut self);
}

/// Counters for a single tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub cells_moved: u32,
    pub reactions: u32,
    pub phase_changes: u32,
    pub explosions: u32,
}

impl TickStats {
    /// Add another tick's counters into this one
    pub fn accumulate(&mut self, other: &TickStats) {
        self.cells_moved += other.cells_moved;
        self.reactions += other.reactions;
        self.phase_changes += other.phase_changes;
        self.explosions += other.explosions;
    }
}

impl SimStats for TickStats {
    fn record_cell_moved(&mut self) {
        self.cells_moved += 1;
    }

    fn record_reaction(&mut self) {
        self.reactions += 1;
    }

    fn record_phase_change(&mut self) {
        self.phase_changes += 1;
    }

    fn record_explosion(&mut self) {
        self.explosions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_stats_counts() {
        let mut stats = TickStats::default();

        stats.record_cell_moved();
        stats.record_cell_moved();
        stats.record_phase_change();
        stats.record_reaction();
        stats.record_reaction();
        stats.record_reaction();
        stats.record_explosion();

        assert_eq!(stats.cells_moved, 2);
        assert_eq!(stats.phase_changes, 1);
        assert_eq!(stats.reactions, 3);
        assert_eq!(stats.explosions, 1);
    }

    #[test]
    fn test_tick_stats_accumulate() {
        let mut total = TickStats::default();
        let tick = TickStats {
            cells_moved: 4,
            reactions: 1,
            phase_changes: 2,
            explosions: 0,
        };
        total.accumulate(&tick);
        total.accumulate(&tick);
        assert_eq!(total.cells_moved, 8);
        assert_eq!(total.reactions, 2);
        assert_eq!(total.phase_changes, 4);
    }
}
