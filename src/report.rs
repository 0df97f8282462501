//! Table-count summaries printed by the operational binaries

use crate::store::TableCounts;

fn entries(counts: &TableCounts) -> [(&'static str, i64); 6] {
    [
        ("players", counts.players),
        ("players with features", counts.players_with_features),
        ("matches", counts.matches),
        ("matches complete", counts.matches_complete),
        ("player match stats", counts.player_match_stats),
        ("player features", counts.player_features),
    ]
}

/// Log a labeled snapshot of the table counts
pub fn print_summary(title: &str, counts: &TableCounts) {
    log::info!("📊 {}", title);
    for (name, value) in entries(counts) {
        log::info!("  • {:<22} → {:>6}", name, value);
    }
}

/// Log after-values with their deltas against a before-snapshot
pub fn print_deltas(before: &TableCounts, after: &TableCounts) {
    log::info!("✅ Update summary (Δ after - before):");
    for ((name, b), (_, a)) in entries(before).into_iter().zip(entries(after)) {
        log::info!("  • {:<22} → {:>6} ({:+})", name, a, a - b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_cover_all_tables() {
        let counts = TableCounts {
            players: 1,
            players_with_features: 2,
            matches: 3,
            matches_complete: 4,
            player_match_stats: 5,
            player_features: 6,
        };
        let values: Vec<i64> = entries(&counts).iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }
}
