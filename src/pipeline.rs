use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::affiliation::extract_company_authors;
use crate::pubmed::PaperSource;
use crate::pubmed::types::PaperRecord;

/// Placeholder for a field with no qualifying data.
pub const NOT_APPLICABLE: &str = "N/A";

const JOIN_SEPARATOR: &str = ", ";

/// One output line per paper. Serialised field names are the report columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "PubmedID")]
    pub pubmed_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Publication Date")]
    pub publication_date: String,
    #[serde(rename = "Non-academic Author(s)")]
    pub non_academic_authors: String,
    #[serde(rename = "Company Affiliation(s)")]
    pub company_affiliations: String,
    #[serde(rename = "Corresponding Author Email")]
    pub corresponding_email: String,
}

impl ReportRow {
    pub fn from_record(record: PaperRecord) -> Self {
        let company = extract_company_authors(&record.authors);
        Self {
            pubmed_id: record.id,
            title: record.title.unwrap_or_else(|| NOT_APPLICABLE.to_string()),
            publication_date: record
                .pub_date
                .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
            non_academic_authors: join_or_na(&company.names),
            company_affiliations: join_or_na(&company.affiliations),
            corresponding_email: record.correspondence.unwrap_or_default(),
        }
    }

    /// False only when the classifier found no company-affiliated author.
    pub fn has_company_authors(&self) -> bool {
        self.non_academic_authors != NOT_APPLICABLE
    }
}

fn join_or_na(values: &[String]) -> String {
    if values.is_empty() {
        NOT_APPLICABLE.to_string()
    } else {
        values.join(JOIN_SEPARATOR)
    }
}

/// Fetch and classify each paper in `ids`, one request at a time.
///
/// Papers whose summary is missing or whose fetch fails produce no row; the
/// remaining rows keep input order.
pub async fn process_papers(source: &impl PaperSource, ids: &[String]) -> Vec<ReportRow> {
    let mut rows = Vec::with_capacity(ids.len());

    for id in ids {
        match source.fetch_summary(id).await {
            Ok(Some(record)) => rows.push(ReportRow::from_record(record)),
            Ok(None) => debug!(id = %id, "no summary record, skipping"),
            Err(e) => debug!(id = %id, error = %e, "summary fetch failed, skipping"),
        }
    }

    debug!(requested = ids.len(), rows = rows.len(), "papers processed");
    rows
}
