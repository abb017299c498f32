//! Object key generation.
//!
//! Keys have the shape `{stem}-{uuid}_{unix_seconds}{extension}`, e.g.
//! `invoice-3f1c…-9a2e_1700000000.pdf`. The random id makes keys unique
//! without an existence check; the timestamp keeps them roughly sortable.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of random object identifiers.
pub trait IdSource: Send + Sync {
    /// Produce the next identifier.
    fn next_id(&self) -> Uuid;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// UUID v4 identifiers from the OS random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Derives collision-resistant object keys from original filenames.
#[derive(Debug, Clone, Default)]
pub struct KeyGenerator<I = RandomIds, C = SystemClock> {
    ids: I,
    clock: C,
}

impl KeyGenerator {
    /// Key generator using random UUIDs and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<I: IdSource, C: Clock> KeyGenerator<I, C> {
    /// Key generator with explicit id and time sources.
    #[must_use]
    pub fn with_sources(ids: I, clock: C) -> Self {
        Self { ids, clock }
    }

    /// Generate a key for `original_filename`.
    #[must_use]
    pub fn generate(&self, original_filename: &str) -> String {
        let (stem, extension) = split_filename(original_filename);
        let id = self.ids.next_id().hyphenated();
        let timestamp = self.clock.now().timestamp();

        format!("{stem}-{id}_{timestamp}{extension}")
    }
}

/// Split a filename into stem and extension.
///
/// Directory components are dropped. The extension starts at the last `.`
/// and keeps the dot; it is empty when there is no dot.
#[must_use]
pub fn split_filename(filename: &str) -> (&str, &str) {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    match base.rfind('.') {
        Some(dot) => base.split_at(dot),
        None => (base, ""),
    }
}
