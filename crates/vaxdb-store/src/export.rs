//! Full-database JSON bundles
//!
//! A bundle is the complete contents of every collection plus a format
//! version and a creation timestamp. Import is additive: records whose
//! keys already exist are skipped and counted, never overwritten.

use serde::{Deserialize, Serialize};
use tracing::info;
use vaxdb_core::model::{
    CheckIn, ClientAccount, InventoryItem, InvoiceRecord, Project, Settings, VaccineTemplate,
};
use vaxdb_core::{StoreError, StoreRecord};

use crate::collection::Collection;
use crate::errors::Result;
use crate::handle::VaccineDb;

/// Bundle format version written by this build
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// A full-database export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportBundle {
    /// Creation time, RFC 3339
    pub timestamp: String,
    pub version: u32,
    pub data: ExportData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub checkins: Vec<CheckIn>,
    #[serde(default)]
    pub settings: Vec<Settings>,
    #[serde(default)]
    pub templates: Vec<VaccineTemplate>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub invoices: Vec<InvoiceRecord>,
    #[serde(default)]
    pub client_accounts: Vec<ClientAccount>,
}

/// Outcome of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    /// Records skipped because their key already existed
    pub skipped: usize,
}

/// Snapshot every collection into a bundle
pub fn export_all(db: &VaccineDb) -> Result<ExportBundle> {
    let bundle = ExportBundle {
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: EXPORT_FORMAT_VERSION,
        data: ExportData {
            projects: db.projects().to_array()?,
            checkins: db.checkins().to_array()?,
            settings: db.settings_collection().to_array()?,
            templates: db.templates().to_array()?,
            inventory: db.inventory().to_array()?,
            invoices: db.invoices().to_array()?,
            client_accounts: db.client_accounts().to_array()?,
        },
    };
    info!(
        checkins = bundle.data.checkins.len(),
        projects = bundle.data.projects.len(),
        "database exported"
    );
    Ok(bundle)
}

/// Merge a bundle into the database, keeping original keys.
///
/// Existing records win: a bundle record whose key is already present is
/// skipped. The settings singleton is only taken from the bundle when the
/// local row still carries the seeded defaults.
///
/// # Errors
///
/// `InvalidRecord` if the bundle's format version is newer than this
/// build understands.
pub fn import_all(db: &VaccineDb, bundle: &ExportBundle) -> Result<ImportSummary> {
    if bundle.version > EXPORT_FORMAT_VERSION {
        return Err(StoreError::invalid_record(
            "bundle",
            format!("unsupported bundle version {}", bundle.version),
        ));
    }

    let mut summary = ImportSummary::default();
    import_records(&db.projects(), &bundle.data.projects, &mut summary)?;
    import_records(&db.checkins(), &bundle.data.checkins, &mut summary)?;
    import_records(&db.templates(), &bundle.data.templates, &mut summary)?;
    import_records(&db.inventory(), &bundle.data.inventory, &mut summary)?;
    import_records(&db.invoices(), &bundle.data.invoices, &mut summary)?;
    import_records(
        &db.client_accounts(),
        &bundle.data.client_accounts,
        &mut summary,
    )?;

    if db.get_settings()? == Settings::defaults() {
        if let Some(settings) = bundle.data.settings.first() {
            let mut settings = settings.clone();
            db.put_settings(&mut settings)?;
            summary.added += 1;
        }
    }

    info!(
        added = summary.added,
        skipped = summary.skipped,
        "bundle imported"
    );
    Ok(summary)
}

fn import_records<T: StoreRecord>(
    collection: &Collection<T>,
    records: &[T],
    summary: &mut ImportSummary,
) -> Result<()> {
    for record in records {
        let mut record = record.clone();
        match collection.add(&mut record) {
            Ok(_) => summary.added += 1,
            Err(StoreError::DuplicateKey { .. }) => summary.skipped += 1,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// MyKad numbers already present, for pre-import duplicate screening
pub fn existing_mykads(db: &VaccineDb) -> Result<std::collections::HashSet<String>> {
    Ok(db
        .checkins()
        .to_array()?
        .into_iter()
        .map(|c| c.mykad)
        .collect())
}
