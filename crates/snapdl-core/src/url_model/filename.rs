//! Timestamped output filenames.

use chrono::{Duration, Local, NaiveDateTime};

/// `day month year _ hour(12h) minute second _ microseconds`.
const TIMESTAMP_FORMAT: &str = "%d%m%y_%I%M%S_%6f";

/// Produces `<prefix><timestamp><extension>` names that are unique within one
/// generator: when the clock has not moved past the previous name, the
/// timestamp is advanced by one microsecond.
#[derive(Debug, Clone)]
pub struct FilenameGenerator {
    prefix: String,
    extension: String,
    last: Option<NaiveDateTime>,
}

impl FilenameGenerator {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
            last: None,
        }
    }

    pub fn next_name(&mut self) -> String {
        self.name_at(Local::now().naive_local())
    }

    pub(crate) fn name_at(&mut self, now: NaiveDateTime) -> String {
        let stamp = match self.last {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last = Some(stamp);
        format!(
            "{}{}{}",
            self.prefix,
            stamp.format(TIMESTAMP_FORMAT),
            self.extension
        )
    }
}
