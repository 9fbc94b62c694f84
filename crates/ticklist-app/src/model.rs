// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

/// A named top-level collection owned by the remote service. The local copy
/// is a snapshot, never the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: ChecklistId,
    #[serde(default)]
    pub name: String,
}

/// A completable entry scoped to exactly one checklist. The upstream service
/// is inconsistent about field names, so decoding accepts both spellings and
/// treats a missing completion flag as not completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ItemId,
    #[serde(default, alias = "itemName")]
    pub name: String,
    #[serde(default, rename = "itemCompletionStatus", alias = "completed")]
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::{Checklist, ChecklistItem};
    use crate::ids::{ChecklistId, ItemId};

    #[test]
    fn item_decodes_canonical_field_names() {
        let item: ChecklistItem = serde_json::from_str(
            r#"{"id":3,"name":"Buy milk","itemCompletionStatus":true}"#,
        )
        .expect("decode item");
        assert_eq!(item.id, ItemId::new(3));
        assert_eq!(item.name, "Buy milk");
        assert!(item.completed);
    }

    #[test]
    fn item_decodes_alternate_field_names() {
        let item: ChecklistItem =
            serde_json::from_str(r#"{"id":4,"itemName":"Water plants","completed":false}"#)
                .expect("decode item");
        assert_eq!(item.name, "Water plants");
        assert!(!item.completed);
    }

    #[test]
    fn item_completion_defaults_to_false_when_absent() {
        let item: ChecklistItem =
            serde_json::from_str(r#"{"id":5,"name":"Sweep"}"#).expect("decode item");
        assert!(!item.completed);
    }

    #[test]
    fn checklist_decodes_id_and_name() {
        let list: Checklist =
            serde_json::from_str(r#"{"id":7,"name":"Groceries"}"#).expect("decode checklist");
        assert_eq!(list.id, ChecklistId::new(7));
        assert_eq!(list.name, "Groceries");
    }
}
