//! Change records folded into typed trees, one per operation.

use ncm_tree::{KeyedList, ListEntry, TreeError, parse_path};

use crate::datastore::{ChangeRecord, Operation};

const TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::changeset");

/// The entities touched by one notification, grouped by operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet<N: ListEntry> {
    created: KeyedList<N>,
    modified: KeyedList<N>,
    deleted: KeyedList<N>,
}

impl<N: ListEntry> Default for ChangeSet<N> {
    fn default() -> Self {
        Self {
            created: KeyedList::new(),
            modified: KeyedList::new(),
            deleted: KeyedList::new(),
        }
    }
}

impl<N: ListEntry> ChangeSet<N> {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one record into the tree of its operation.
    ///
    /// Created and modified records contribute their new value, deleted
    /// records their old one. Moves carry no configuration and are skipped.
    /// The module root segment of the path is dropped.
    pub fn unmarshal(&mut self, record: &ChangeRecord) -> Result<(), TreeError> {
        let (list, value) = match record.operation {
            Operation::Created => (&mut self.created, record.new.as_ref()),
            Operation::Modified => (&mut self.modified, record.new.as_ref()),
            Operation::Deleted => (&mut self.deleted, record.old.as_ref()),
            Operation::Moved => {
                tracing::debug!(target: TARGET, %record, "ignoring move");
                return Ok(());
            }
        };
        let Some(value) = value else {
            tracing::warn!(target: TARGET, %record, "record carries no value");
            return Ok(());
        };
        let segments = parse_path(&value.path)?;
        match segments.split_first() {
            Some((_, rest)) => list.put(rest, &value.payload),
            None => Ok(()),
        }
    }

    /// Entities changed by `operation`. Moves never collect entities.
    #[must_use]
    pub const fn entities(&self, operation: Operation) -> Option<&KeyedList<N>> {
        match operation {
            Operation::Created => Some(&self.created),
            Operation::Modified => Some(&self.modified),
            Operation::Deleted => Some(&self.deleted),
            Operation::Moved => None,
        }
    }

    /// Whether no entity changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::datastore::Value;
    use crate::schema::NetworkInstance;

    const PE1: &str = "/beluganos-network-instance:network-instances/network-instance[name='PE1']";

    fn value(suffix: &str, payload: &str) -> Value {
        Value::new(format!("{PE1}{suffix}"), payload)
    }

    #[rstest]
    fn records_land_in_their_operation() {
        let mut set = ChangeSet::<NetworkInstance>::new();
        set.unmarshal(&ChangeRecord::created(value("/config/router-id", "10.0.0.1")))
            .expect("created record");
        set.unmarshal(&ChangeRecord::deleted(value("/config/description", "old")))
            .expect("deleted record");

        let created = set.entities(Operation::Created).expect("created list");
        let deleted = set.entities(Operation::Deleted).expect("deleted list");
        let key = "PE1".to_owned();
        assert_eq!(
            created.get(&key).and_then(|ni| ni.config.router_id),
            Some("10.0.0.1".parse().expect("valid address"))
        );
        assert_eq!(
            deleted.get(&key).map(|ni| ni.config.description.as_str()),
            Some("old")
        );
        assert!(set.entities(Operation::Modified).is_some_and(KeyedList::is_empty));
    }

    #[rstest]
    fn modified_records_use_the_new_value() {
        let mut set = ChangeSet::<NetworkInstance>::new();
        set.unmarshal(&ChangeRecord::modified(
            value("/config/description", "before"),
            value("/config/description", "after"),
        ))
        .expect("modified record");

        let modified = set.entities(Operation::Modified).expect("modified list");
        assert_eq!(
            modified
                .get(&"PE1".to_owned())
                .map(|ni| ni.config.description.as_str()),
            Some("after")
        );
    }

    #[rstest]
    fn moves_are_ignored() {
        let mut set = ChangeSet::<NetworkInstance>::new();
        let record = ChangeRecord {
            operation: Operation::Moved,
            old: None,
            new: Some(value("", "")),
        };

        set.unmarshal(&record).expect("moves are skipped");

        assert!(set.is_empty());
        assert!(set.entities(Operation::Moved).is_none());
    }

    #[rstest]
    fn parse_failures_propagate() {
        let mut set = ChangeSet::<NetworkInstance>::new();
        let error = set
            .unmarshal(&ChangeRecord::created(value("/config/router-id", "not-an-ip")))
            .expect_err("router-id must parse");

        assert!(matches!(error, TreeError::Parse { .. }), "{error}");
    }
}
