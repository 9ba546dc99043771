use std::collections::BTreeMap;

/// Foreign identifier to generated section index, per target type.
///
/// Indices are handed out as 1, 2, ... in assignment order; callers assign
/// in ascending foreign-id order so the numbering is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    by_type: BTreeMap<String, BTreeMap<u32, u32>>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index for `foreign` in `target`, allocating the next one if needed.
    pub fn assign(&mut self, target: &str, foreign: u32) -> u32 {
        let ids = self.by_type.entry(target.to_string()).or_default();
        let next = ids.len() as u32 + 1;
        *ids.entry(foreign).or_insert(next)
    }

    pub fn get(&self, target: &str, foreign: u32) -> Option<u32> {
        self.by_type.get(target)?.get(&foreign).copied()
    }

    /// Number of generated objects of `target`.
    pub fn count(&self, target: &str) -> usize {
        self.by_type.get(target).map_or(0, BTreeMap::len)
    }

    /// `(foreign, generated)` pairs of `target` in generated order.
    pub fn pairs(&self, target: &str) -> Vec<(u32, u32)> {
        let mut pairs: Vec<(u32, u32)> = self
            .by_type
            .get(target)
            .map(|ids| ids.iter().map(|(&f, &g)| (f, g)).collect())
            .unwrap_or_default();
        pairs.sort_by_key(|&(_, generated)| generated);
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_stable() {
        let mut ids = IdMap::new();
        assert_eq!(ids.assign("Manual", 40), 1);
        assert_eq!(ids.assign("Manual", 7), 2);
        assert_eq!(ids.assign("Manual", 40), 1);
        assert_eq!(ids.assign("Stop", 40), 1);
        assert_eq!(ids.get("Manual", 7), Some(2));
        assert_eq!(ids.get("Rank", 7), None);
        assert_eq!(ids.count("Manual"), 2);
        assert_eq!(ids.pairs("Manual"), vec![(40, 1), (7, 2)]);
    }
}
