//! Dashboard collections scanned by the global search.
//!
//! Each record type knows its storage key, the fields a query is matched
//! against, and how it is presented as a [`SearchableItem`].

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::item::{ItemIcon, SearchableItem, TYPE_AGENT, TYPE_DOCUMENT, TYPE_REPORT};

pub const REPORTS_KEY: &str = "rapports_en_preparation_data_v2";
pub const DOCUMENTS_KEY: &str = "uploaded_documents_data";
pub const AGENTS_KEY: &str = "agents_data";

/// A record stored as a JSON array under a fixed key.
pub trait SourceRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const STORAGE_KEY: &'static str;

    fn id(&self) -> &str;

    /// Whether any searchable field contains `needle`, which is already lowercase.
    fn matches(&self, needle: &str) -> bool;

    fn to_searchable(&self) -> SearchableItem;
}

fn contains(field: &str, needle: &str) -> bool {
    field.to_lowercase().contains(needle)
}

fn contains_opt(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| contains(f, needle))
}

/// Browser documents write `null` for cleared text fields.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Kind of report being prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportNature {
    Ptba,
    Performances,
    Annuel,
    Trimestriel,
    Autre,
}

impl ReportNature {
    pub const ALL: [ReportNature; 5] = [
        ReportNature::Ptba,
        ReportNature::Performances,
        ReportNature::Annuel,
        ReportNature::Trimestriel,
        ReportNature::Autre,
    ];

    pub fn value(self) -> &'static str {
        match self {
            ReportNature::Ptba => "ptba",
            ReportNature::Performances => "performances",
            ReportNature::Annuel => "annuel",
            ReportNature::Trimestriel => "trimestriel",
            ReportNature::Autre => "autre",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportNature::Ptba => "Plan de Travail et Budget Annuel",
            ReportNature::Performances => "Rapport de Performances",
            ReportNature::Annuel => "Rapport Annuel",
            ReportNature::Trimestriel => "Rapport Trimestriel",
            ReportNature::Autre => "Autre type de rapport",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|nature| nature.value() == value)
    }
}

/// Workflow state of a report in preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Elaboration,
    Validation,
    Finalise,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [
        ReportStatus::Elaboration,
        ReportStatus::Validation,
        ReportStatus::Finalise,
    ];

    pub fn value(self) -> &'static str {
        match self {
            ReportStatus::Elaboration => "elaboration",
            ReportStatus::Validation => "validation",
            ReportStatus::Finalise => "finalise",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.value() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportStatus::Elaboration => "En élaboration",
            ReportStatus::Validation => "En validation",
            ReportStatus::Finalise => "Finalisé",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RapportEnPreparation {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub titre: String,
    /// Nature value; unknown values are kept and shown verbatim.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nature: String,
    /// Status value; unknown values are kept and shown verbatim.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub statut: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date_prevue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RapportEnPreparation {
    /// Catalog label of the nature, if the value is known.
    pub fn nature_label(&self) -> Option<&'static str> {
        ReportNature::from_value(&self.nature).map(ReportNature::label)
    }

    pub fn status(&self) -> Option<ReportStatus> {
        ReportStatus::from_value(&self.statut)
    }

    /// Status label, or the raw value when it is not a known status.
    pub fn status_label(&self) -> &str {
        self.status()
            .map_or(self.statut.as_str(), |status| status.label())
    }
}

impl SourceRecord for RapportEnPreparation {
    const STORAGE_KEY: &'static str = REPORTS_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.titre, needle)
            || contains_opt(self.nature_label(), needle)
            || contains_opt(self.responsable.as_deref(), needle)
    }

    fn to_searchable(&self) -> SearchableItem {
        let nature_label = self.nature_label().unwrap_or(self.nature.as_str());
        let title = if self.titre.is_empty() {
            "Titre manquant".to_string()
        } else {
            self.titre.clone()
        };
        let description = match non_blank(self.notes.as_deref()) {
            Some(notes) => notes.to_string(),
            None => format!(
                "Responsable: {}",
                non_blank(self.responsable.as_deref()).unwrap_or("N/A")
            ),
        };

        SearchableItem {
            id: format!("rapport-{}", self.id),
            title,
            type_label: TYPE_REPORT.to_string(),
            category: format!("Rapport ({nature_label})"),
            path: format!("/rapports/preparation#item-{}", self.id),
            description: Some(description),
            icon: Some(ItemIcon::Report),
            is_history: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nom_fichier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_mime: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date_upload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auteur: Option<String>,
}

impl UploadedDocument {
    /// Upload date as `dd/mm/yyyy`, or the raw value when it does not parse.
    pub fn upload_date_display(&self) -> String {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.date_upload) {
            return dt.format("%d/%m/%Y").to_string();
        }
        if let Ok(date) = NaiveDate::parse_from_str(&self.date_upload, "%Y-%m-%d") {
            return date.format("%d/%m/%Y").to_string();
        }
        self.date_upload.clone()
    }
}

impl SourceRecord for UploadedDocument {
    const STORAGE_KEY: &'static str = DOCUMENTS_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, needle: &str) -> bool {
        contains_opt(self.titre.as_deref(), needle)
            || contains(&self.nom_fichier, needle)
            || contains_opt(self.description.as_deref(), needle)
            || contains_opt(self.auteur.as_deref(), needle)
    }

    fn to_searchable(&self) -> SearchableItem {
        let title = non_blank(self.titre.as_deref()).unwrap_or(self.nom_fichier.as_str());
        let description = match non_blank(self.description.as_deref()) {
            Some(description) => description.to_string(),
            None => {
                let mut text = format!("Uploadé le: {}", self.upload_date_display());
                if let Some(auteur) = non_blank(self.auteur.as_deref()) {
                    text.push_str(" par ");
                    text.push_str(auteur);
                }
                text
            }
        };

        SearchableItem {
            id: format!("doc-{}", self.id),
            title: title.to_string(),
            type_label: TYPE_DOCUMENT.to_string(),
            category: non_blank(self.type_mime.as_deref())
                .unwrap_or("Fichier")
                .to_string(),
            path: format!("/documents/view/{}", self.id),
            description: Some(description),
            icon: Some(ItemIcon::Document),
            is_history: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub matricule: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prenom: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poste: Option<String>,
}

impl Agent {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

impl SourceRecord for Agent {
    const STORAGE_KEY: &'static str = AGENTS_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.prenom, needle)
            || contains(&self.nom, needle)
            || contains(&self.full_name(), needle)
            || contains(&self.matricule, needle)
            || contains_opt(self.email.as_deref(), needle)
            || contains_opt(self.division.as_deref(), needle)
    }

    fn to_searchable(&self) -> SearchableItem {
        let mut description = format!("Matricule: {}", self.matricule);
        if let Some(poste) = non_blank(self.poste.as_deref()) {
            description.push_str(" - ");
            description.push_str(poste);
        }

        SearchableItem {
            id: format!("agent-{}", self.id),
            title: self.full_name(),
            type_label: TYPE_AGENT.to_string(),
            category: non_blank(self.division.as_deref())
                .unwrap_or("Personnel")
                .to_string(),
            path: format!("/personnel/agents/{}", self.id),
            description: Some(description),
            icon: Some(ItemIcon::Agent),
            is_history: None,
        }
    }
}
