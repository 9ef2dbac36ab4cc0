//! Translation of provider status vocabulary into canonical [`Status`].

use orchestrator_common::Status;

/// A provider's known status strings, stored lower-case.
///
/// Lookup lower-cases its input first. Anything not in the table is
/// [`Status::Unknown`], never an error.
///
/// ```
/// use orchestrator_common::Status;
/// use transcode_orchestrator::provider::status::StatusTable;
///
/// const TABLE: StatusTable = StatusTable::new(&[("new", Status::Queued), ("finished", Status::Finished)]);
/// assert_eq!(TABLE.translate("FINISHED"), Status::Finished);
/// assert_eq!(TABLE.translate("teleporting"), Status::Unknown);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StatusTable {
    entries: &'static [(&'static str, Status)],
}

impl StatusTable {
    pub const fn new(entries: &'static [(&'static str, Status)]) -> Self {
        Self { entries }
    }

    pub fn translate(&self, raw: &str) -> Status {
        let normalized = raw.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(known, _)| *known == normalized)
            .map(|(_, status)| *status)
            .unwrap_or(Status::Unknown)
    }

    /// Raw strings this table knows about.
    pub fn known(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(known, _)| *known)
    }
}
