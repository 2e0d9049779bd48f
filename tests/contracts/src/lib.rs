//! Fixtures shared by the scenario tests.

use chrono::{DateTime, TimeZone, Utc};
use dsefs_messaging::{CurrentUser, UserRole};
use dsefs_search::records::{AGENTS_KEY, DOCUMENTS_KEY, REPORTS_KEY};
use dsefs_storage::KeyValueStore;
use serde_json::json;

/// Seed the three source collections with a small, realistic data set.
pub fn seed_collections(storage: &dyn KeyValueStore) -> dsefs_storage::Result<()> {
    storage.set(
        REPORTS_KEY,
        &json!([
            {"id": "r1", "titre": "Rapport Annuel 2024", "nature": "annuel", "statut": "elaboration",
             "responsable": "Awa Ndiaye", "datePrevue": "2024-12-31"},
            {"id": "r2", "titre": "Bilan des feux de brousse", "nature": "trimestriel", "statut": "validation",
             "datePrevue": "2024-09-30", "notes": "Zones nord et est"}
        ])
        .to_string(),
    )?;
    storage.set(
        DOCUMENTS_KEY,
        &json!([
            {"id": "d1", "nomFichier": "plan_amenagement.pdf", "titre": "Plan d'aménagement annuel",
             "typeMime": "application/pdf", "dateUpload": "2024-03-15T10:00:00Z", "auteur": "Moussa Diop"}
        ])
        .to_string(),
    )?;
    storage.set(
        AGENTS_KEY,
        &json!([
            {"id": "a1", "matricule": "M-042", "prenom": "Awa", "nom": "Ndiaye", "division": "Inventaire"}
        ])
        .to_string(),
    )?;
    Ok(())
}

pub fn user(id: &str, prenom: &str, nom: &str) -> CurrentUser {
    CurrentUser::new(id, prenom, nom, UserRole::Editeur)
}

/// A fixed instant on 1 May 2024, `minute` minutes past 09:00 UTC.
pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}
