use crate::aggregate::ClubRollup;
use crate::models::SessionRecord;
use sha2::{Digest, Sha256};

/// Feeds the fields that change what a client renders into a digest.
pub trait Fingerprint {
    fn feed(&self, hasher: &mut Sha256);
}

impl Fingerprint for ClubRollup {
    fn feed(&self, hasher: &mut Sha256) {
        let line = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}\n",
            self.club_name,
            self.commission_percentage,
            self.sessions,
            self.total_result,
            self.adjusted_total,
            self.avg_result,
            self.best_session,
            self.worst_session,
        );
        hasher.update(line.len().to_le_bytes());
        hasher.update(line.as_bytes());
    }
}

impl Fingerprint for SessionRecord {
    fn feed(&self, hasher: &mut Sha256) {
        let line = format!(
            "{}|{}|{}|{}|{}\n",
            self.id,
            self.result,
            self.date_time.timestamp_millis(),
            self.club_name,
            self.account_name,
        );
        hasher.update(line.len().to_le_bytes());
        hasher.update(line.as_bytes());
    }
}

/// Hex digest over `items` in the order given.
pub fn fingerprint<T: Fingerprint>(items: &[T]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(items.len().to_le_bytes());
    for item in items {
        item.feed(&mut hasher);
    }
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderDecision {
    pub skip: bool,
    pub fingerprint: String,
}

pub fn should_skip_render<T: Fingerprint>(items: &[T], last_fingerprint: Option<&str>) -> RenderDecision {
    let fingerprint = fingerprint(items);
    RenderDecision {
        skip: last_fingerprint == Some(fingerprint.as_str()),
        fingerprint,
    }
}

/// Remembers the last rendered output together with the fingerprint of its
/// input, re-rendering only when the input changes.
#[derive(Debug, Default)]
pub struct RollupCache<T> {
    last: Option<(String, T)>,
}

impl<T> RollupCache<T> {
    pub fn new() -> Self {
        Self { last: None }
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.last.as_ref().map(|(fp, _)| fp.as_str())
    }

    /// Returns the cached output and whether `render` was skipped.
    pub fn render_with<I, F>(&mut self, items: &[I], render: F) -> (&T, bool)
    where
        I: Fingerprint,
        F: FnOnce(&[I]) -> T,
    {
        let decision = should_skip_render(items, self.fingerprint());
        let skip = decision.skip;
        let (_, output) = match self.last.take() {
            Some(entry) if skip => self.last.insert(entry),
            _ => self.last.insert((decision.fingerprint, render(items))),
        };
        (&*output, skip)
    }
}
