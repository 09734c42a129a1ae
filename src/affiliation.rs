//! Company-affiliation heuristic over free-text affiliation strings.
//!
//! Case-insensitive substring match against a fixed keyword list. Substring
//! (not whole-word) matching is intentional: "LtdCo" matches, and so does any
//! word that happens to contain "inc". Unlisted forms such as "corp" or "gmbh"
//! are not recognised.

use crate::pubmed::types::AuthorEntry;

pub const COMPANY_KEYWORDS: [&str; 5] = ["inc", "ltd", "pharma", "biotech", "company"];

/// Authors whose affiliation matched, with the lower-cased affiliations.
/// `names[i]` belongs to `affiliations[i]`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CompanyAuthors {
    pub names: Vec<String>,
    pub affiliations: Vec<String>,
}

pub fn is_company_affiliation(affiliation: &str) -> bool {
    let lower = affiliation.to_lowercase();
    COMPANY_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Partition out company-affiliated authors, preserving encounter order.
/// A missing name is recorded as an empty string to keep both lists aligned.
pub fn extract_company_authors(authors: &[AuthorEntry]) -> CompanyAuthors {
    let mut found = CompanyAuthors::default();
    for author in authors {
        let affiliation = author
            .affiliation
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        if is_company_affiliation(&affiliation) {
            found.names.push(author.name.clone().unwrap_or_default());
            found.affiliations.push(affiliation);
        }
    }
    found
}
