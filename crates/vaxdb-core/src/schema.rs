//! Schema ladder - ordered full-state version declarations
//!
//! Each ladder step declares the COMPLETE set of collections and their
//! indexed fields as of that version, not a diff. The migration runner in
//! the store crate turns these declarations into idempotent DDL, so
//! applying versions 1..N from a fresh store or resuming from any
//! intermediate version converges to the same final shape.
//!
//! The six versions mirror the application's release history: check-in
//! queue and settings first, then templates, projects, inventory, invoices
//! and client accounts.

use crate::record::KeyKind;

/// The schema version this build migrates stores up to
pub const TARGET_VERSION: u32 = 6;

/// Column affinity for an indexed field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Real,
}

/// A field the store maintains an index over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedField {
    /// Field name as it appears in the serialized document
    pub name: &'static str,
    pub ty: FieldType,
}

/// One collection's shape at a given schema version
#[derive(Debug, Clone, Copy)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub key: KeyKind,
    pub indexes: &'static [IndexedField],
}

/// A complete schema declaration for one version
#[derive(Debug, Clone, Copy)]
pub struct SchemaVersion {
    pub version: u32,
    pub collections: &'static [CollectionSpec],
}

const fn text(name: &'static str) -> IndexedField {
    IndexedField {
        name,
        ty: FieldType::Text,
    }
}

const fn integer(name: &'static str) -> IndexedField {
    IndexedField {
        name,
        ty: FieldType::Integer,
    }
}

const fn real(name: &'static str) -> IndexedField {
    IndexedField {
        name,
        ty: FieldType::Real,
    }
}

// checkins: mykad is indexed from the start so the duplicate pre-check
// can run as an equality query rather than a scan.
const CHECKINS_V1: CollectionSpec = CollectionSpec {
    name: "checkins",
    key: KeyKind::CallerSupplied,
    indexes: &[
        text("status"),
        text("queueNumber"),
        integer("timestamp"),
        text("fullName"),
        text("mykad"),
    ],
};

const CHECKINS_V3: CollectionSpec = CollectionSpec {
    name: "checkins",
    key: KeyKind::CallerSupplied,
    indexes: &[
        integer("projectId"),
        text("status"),
        text("queueNumber"),
        integer("timestamp"),
        text("fullName"),
        text("mykad"),
    ],
};

const SETTINGS: CollectionSpec = CollectionSpec {
    name: "settings",
    key: KeyKind::AutoIncrement,
    indexes: &[],
};

const TEMPLATES: CollectionSpec = CollectionSpec {
    name: "templates",
    key: KeyKind::AutoIncrement,
    indexes: &[text("name")],
};

const PROJECTS_V3: CollectionSpec = CollectionSpec {
    name: "projects",
    key: KeyKind::AutoIncrement,
    indexes: &[text("name"), text("status"), integer("timestamp")],
};

const PROJECTS_V6: CollectionSpec = CollectionSpec {
    name: "projects",
    key: KeyKind::AutoIncrement,
    indexes: &[
        text("name"),
        text("status"),
        integer("timestamp"),
        integer("clientAccountId"),
    ],
};

const INVENTORY: CollectionSpec = CollectionSpec {
    name: "inventory",
    key: KeyKind::AutoIncrement,
    indexes: &[text("vaccineName"), text("batchNumber"), text("expiryDate")],
};

const INVOICES: CollectionSpec = CollectionSpec {
    name: "invoices",
    key: KeyKind::AutoIncrement,
    indexes: &[
        integer("projectId"),
        text("invoiceNumber"),
        text("date"),
        text("clientName"),
        real("amount"),
    ],
};

const CLIENT_ACCOUNTS: CollectionSpec = CollectionSpec {
    name: "clientAccounts",
    key: KeyKind::AutoIncrement,
    indexes: &[text("email"), text("company"), integer("createdAt")],
};

static LADDER: &[SchemaVersion] = &[
    SchemaVersion {
        version: 1,
        collections: &[CHECKINS_V1, SETTINGS],
    },
    SchemaVersion {
        version: 2,
        collections: &[CHECKINS_V1, SETTINGS, TEMPLATES],
    },
    SchemaVersion {
        version: 3,
        collections: &[CHECKINS_V3, SETTINGS, TEMPLATES, PROJECTS_V3],
    },
    SchemaVersion {
        version: 4,
        collections: &[CHECKINS_V3, SETTINGS, TEMPLATES, PROJECTS_V3, INVENTORY],
    },
    SchemaVersion {
        version: 5,
        collections: &[
            CHECKINS_V3,
            SETTINGS,
            TEMPLATES,
            PROJECTS_V3,
            INVENTORY,
            INVOICES,
        ],
    },
    SchemaVersion {
        version: 6,
        collections: &[
            CHECKINS_V3,
            SETTINGS,
            TEMPLATES,
            PROJECTS_V6,
            INVENTORY,
            INVOICES,
            CLIENT_ACCOUNTS,
        ],
    },
];

/// All schema versions in ascending order
pub fn ladder() -> &'static [SchemaVersion] {
    LADDER
}

/// The final (target) schema version declaration
pub fn target() -> &'static SchemaVersion {
    LADDER.last().expect("schema ladder is never empty")
}

/// Look up a collection's shape in the target schema
pub fn collection_spec(name: &str) -> Option<&'static CollectionSpec> {
    target().collections.iter().find(|c| c.name == name)
}

/// True when `field` is indexed on `collection` in the target schema
pub fn is_indexed(collection: &str, field: &str) -> bool {
    collection_spec(collection)
        .map(|spec| spec.indexes.iter().any(|i| i.name == field))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_sequential_from_one() {
        for (i, step) in ladder().iter().enumerate() {
            assert_eq!(step.version, i as u32 + 1);
        }
        assert_eq!(target().version, TARGET_VERSION);
    }

    #[test]
    fn collections_only_grow() {
        for pair in ladder().windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            for coll in prev.collections {
                let survived = next
                    .collections
                    .iter()
                    .find(|c| c.name == coll.name)
                    .unwrap_or_else(|| panic!("collection {} dropped", coll.name));
                assert_eq!(survived.key, coll.key, "{} changed key kind", coll.name);
                for idx in coll.indexes {
                    assert!(
                        survived.indexes.contains(idx),
                        "{}.{} index dropped",
                        coll.name,
                        idx.name
                    );
                }
            }
        }
    }

    #[test]
    fn target_has_all_seven_collections() {
        let names: Vec<_> = target().collections.iter().map(|c| c.name).collect();
        for expected in [
            "checkins",
            "settings",
            "templates",
            "projects",
            "inventory",
            "invoices",
            "clientAccounts",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn duplicate_precheck_fields_are_indexed() {
        assert!(is_indexed("checkins", "mykad"));
        assert!(is_indexed("checkins", "timestamp"));
        assert!(is_indexed("clientAccounts", "email"));
        assert!(!is_indexed("checkins", "notes"));
        assert!(!is_indexed("nosuch", "field"));
    }
}
