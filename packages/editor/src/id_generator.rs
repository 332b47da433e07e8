use crc32fast::Hasher;

/// Derive a stable id seed from a session identifier using CRC32
pub fn session_seed(session_id: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(session_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for placed components within a session.
///
/// Ids look like `<seed>-<n>`. The counter only ever moves forward, so an
/// id handed out once is never handed out again, even after the component
/// it named has been removed and the removal undone.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(session_id: &str) -> Self {
        Self::from_seed(session_seed(session_id))
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Generate next sequential id. `None` once the counter is exhausted.
    pub fn new_id(&mut self) -> Option<String> {
        self.count = self.count.checked_add(1)?;
        Some(format!("{}-{}", self.seed, self.count))
    }

    /// Make sure an id that already exists is never generated again
    pub fn observe(&mut self, id: &str) {
        let Some(rest) = id.strip_prefix(self.seed.as_str()) else {
            return;
        };
        if let Some(n) = rest.strip_prefix('-').and_then(|n| n.parse::<u64>().ok()) {
            self.count = self.count.max(n);
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_stable() {
        assert_eq!(session_seed("canvas"), session_seed("canvas"));
        assert_ne!(session_seed("canvas"), session_seed("other"));
    }

    #[test]
    fn test_sequential_ids() {
        let mut gen = IdGenerator::new("session");

        let id1 = gen.new_id().unwrap();
        let id2 = gen.new_id().unwrap();

        assert!(id1.ends_with("-1"));
        assert!(id2.ends_with("-2"));
        assert!(id1.starts_with(gen.seed()));
    }

    #[test]
    fn test_observe_skips_existing_ids() {
        let mut gen = IdGenerator::from_seed("abc".to_string());
        gen.observe("abc-7");
        gen.observe("abc-3");
        gen.observe("other-99");
        gen.observe("abc-notanumber");

        assert_eq!(gen.new_id().as_deref(), Some("abc-8"));
    }

    #[test]
    fn test_exhausted_counter_stops_instead_of_wrapping() {
        let mut gen = IdGenerator::from_seed("abc".to_string());
        gen.observe(&format!("abc-{}", u64::MAX - 1));

        assert_eq!(gen.new_id(), Some(format!("abc-{}", u64::MAX)));
        assert_eq!(gen.new_id(), None);
        assert_eq!(gen.new_id(), None);
    }
}
