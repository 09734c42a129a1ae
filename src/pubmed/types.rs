//! Loosely-typed E-utilities payloads read into owned records.
//!
//! Remote bodies are parsed as `serde_json::Value` and every field is looked up
//! with an explicit default: a missing key or a value of the wrong type never
//! fails the whole record.

use serde_json::Value;

/// One author as listed in a summary record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorEntry {
    pub name: Option<String>,
    pub affiliation: Option<String>,
}

/// Per-paper metadata from `esummary.fcgi`. No normalisation is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperRecord {
    pub id: String,
    pub title: Option<String>,
    pub pub_date: Option<String>,
    pub authors: Vec<AuthorEntry>,
    pub correspondence: Option<String>,
}

/// Ordered identifiers at `esearchresult.idlist`. Numeric ids are accepted too.
pub fn extract_id_list(body: &Value) -> Vec<String> {
    body.get("esearchresult")
        .and_then(|r| r.get("idlist"))
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(|id| match id {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The record at `result.<id>`, or `None` when it is missing, empty, or an
/// E-utilities per-id error object.
pub fn extract_summary(body: &Value, id: &str) -> Option<PaperRecord> {
    let entry = body.get("result")?.get(id)?.as_object()?;
    if entry.is_empty() || entry.contains_key("error") {
        return None;
    }

    let authors = entry
        .get("authors")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(author_from_value).collect())
        .unwrap_or_default();

    Some(PaperRecord {
        id: id.to_string(),
        title: string_field(entry.get("title")),
        pub_date: string_field(entry.get("pubdate")),
        authors,
        correspondence: string_field(entry.get("correspondence")),
    })
}

fn author_from_value(value: &Value) -> Option<AuthorEntry> {
    match value {
        Value::Object(fields) => Some(AuthorEntry {
            name: string_field(fields.get("name")),
            affiliation: string_field(fields.get("affiliation")),
        }),
        Value::String(name) => Some(AuthorEntry {
            name: Some(name.clone()),
            affiliation: None,
        }),
        _ => None,
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}
