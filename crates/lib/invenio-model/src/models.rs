use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Draft or published record as returned by the records API.
///
/// Only the fields this crate reads are typed. Everything else the remote
/// service sends (access, files, pids, parent, custom fields, ...) is kept in
/// `extra` so a fetched record can be written back without losing data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub links: RecordLinks,
    #[serde(default, skip_serializing)]
    pub errors: Vec<FieldError>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Human-facing URL of the record, falling back to the API self link.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.links
            .self_html
            .as_deref()
            .or(self.links.self_api.as_deref())
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").and_then(Value::as_str)
    }
}

/// Link block of a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_api: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_html: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identifier and link of a created or published record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordRef {
    pub id: String,
    pub url: String,
}

/// Per-field validation message reported by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.messages.join("; "))
        } else {
            write!(f, "{}: {}", self.field, self.messages.join("; "))
        }
    }
}

/// Error body returned by the records API on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl ErrorBody {
    /// Flattens the message and field errors into one line.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(message) = self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            parts.push(message.trim().to_string());
        }
        parts.extend(self.errors.iter().map(ToString::to_string));
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

/// Search response envelope: `{"hits": {"hits": [...]}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult<T> {
    pub hits: SearchHits<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHits<T> {
    pub hits: Vec<T>,
    #[serde(default)]
    pub total: Option<Value>,
}

/// Entry of the resource type vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Closed set of resource types accepted by `set_resource_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Publication,
    PublicationBook,
    PublicationConferencePaper,
    PublicationConferenceProceeding,
    PublicationArticle,
    PublicationPreprint,
    PublicationReport,
    PublicationThesis,
    PublicationWorkingPaper,
    PublicationDataPaper,
    PublicationDissertation,
    Poster,
    Presentation,
    Dataset,
    Image,
    ImageFigure,
    ImagePhoto,
    Video,
    Audio,
    Software,
    Workflow,
}

impl ResourceType {
    pub const ALL: [Self; 21] = [
        Self::Publication,
        Self::PublicationBook,
        Self::PublicationConferencePaper,
        Self::PublicationConferenceProceeding,
        Self::PublicationArticle,
        Self::PublicationPreprint,
        Self::PublicationReport,
        Self::PublicationThesis,
        Self::PublicationWorkingPaper,
        Self::PublicationDataPaper,
        Self::PublicationDissertation,
        Self::Poster,
        Self::Presentation,
        Self::Dataset,
        Self::Image,
        Self::ImageFigure,
        Self::ImagePhoto,
        Self::Video,
        Self::Audio,
        Self::Software,
        Self::Workflow,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publication => "publication",
            Self::PublicationBook => "publication-book",
            Self::PublicationConferencePaper => "publication-conferencepaper",
            Self::PublicationConferenceProceeding => "publication-conferenceproceeding",
            Self::PublicationArticle => "publication-article",
            Self::PublicationPreprint => "publication-preprint",
            Self::PublicationReport => "publication-report",
            Self::PublicationThesis => "publication-thesis",
            Self::PublicationWorkingPaper => "publication-workingpaper",
            Self::PublicationDataPaper => "publication-datapaper",
            Self::PublicationDissertation => "publication-dissertation",
            Self::Poster => "poster",
            Self::Presentation => "presentation",
            Self::Dataset => "dataset",
            Self::Image => "image",
            Self::ImageFigure => "image-figure",
            Self::ImagePhoto => "image-photo",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Software => "software",
            Self::Workflow => "workflow",
        }
    }

    /// All accepted identifiers, in declaration order.
    #[must_use]
    pub fn ids() -> Vec<&'static str> {
        Self::ALL.iter().map(|value| value.as_str()).collect()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a member of [`ResourceType::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownResourceType(pub String);

impl fmt::Display for UnknownResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid resource type '{}'; must be one of: {}",
            self.0,
            ResourceType::ids().join(", ")
        )
    }
}

impl std::error::Error for UnknownResourceType {}

impl FromStr for ResourceType {
    type Err = UnknownResourceType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
            .ok_or_else(|| UnknownResourceType(value.to_string()))
    }
}

/// Value stored under `metadata.resource_type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceTypeRef {
    pub id: String,
}

/// Creator as supplied by a caller: `name` is "family, given".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatorInput {
    pub name: String,
    #[serde(default)]
    pub orcid: Option<String>,
}

impl CreatorInput {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            orcid: None,
        }
    }

    #[must_use]
    pub fn with_orcid(mut self, orcid: impl Into<String>) -> Self {
        self.orcid = Some(orcid.into());
        self
    }
}

/// Entry of `metadata.creators`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Creator {
    pub person_or_org: PersonOrOrg,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PersonOrOrgKind {
    Personal,
    Organizational,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonOrOrg {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PersonOrOrgKind,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub identifiers: Vec<Identifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identifier {
    pub scheme: String,
    pub identifier: String,
}

impl Identifier {
    #[must_use]
    pub fn orcid(value: impl Into<String>) -> Self {
        Self {
            scheme: "orcid".to_string(),
            identifier: value.into(),
        }
    }
}

impl From<&CreatorInput> for Creator {
    fn from(input: &CreatorInput) -> Self {
        let name = input.name.trim().to_string();
        let (family_name, given_name) = split_name(&name);
        let identifiers = input
            .orcid
            .as_deref()
            .map(str::trim)
            .filter(|orcid| !orcid.is_empty())
            .map(Identifier::orcid)
            .into_iter()
            .collect();

        Self {
            person_or_org: PersonOrOrg {
                name,
                kind: PersonOrOrgKind::Personal,
                given_name,
                family_name,
                identifiers,
            },
        }
    }
}

/// Splits "family, given" on the first comma. Without a comma the whole
/// string is the family name.
fn split_name(full_name: &str) -> (String, String) {
    match full_name.split_once(',') {
        Some((family, given)) => (family.trim().to_string(), given.trim().to_string()),
        None => (full_name.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn creator_with_orcid_splits_family_and_given() {
        let creator = Creator::from(
            &CreatorInput::new("Smith, John").with_orcid("0000-0001-2345-6789"),
        );

        assert_eq!(creator.person_or_org.family_name, "Smith");
        assert_eq!(creator.person_or_org.given_name, "John");
        assert_eq!(creator.person_or_org.name, "Smith, John");
        assert_eq!(creator.person_or_org.kind, PersonOrOrgKind::Personal);
        assert_eq!(
            creator.person_or_org.identifiers,
            vec![Identifier::orcid("0000-0001-2345-6789")]
        );
    }

    #[test]
    fn creator_without_comma_is_family_name_only() {
        let creator = Creator::from(&CreatorInput::new("Madonna"));

        assert_eq!(creator.person_or_org.family_name, "Madonna");
        assert_eq!(creator.person_or_org.given_name, "");
        assert!(creator.person_or_org.identifiers.is_empty());
    }

    #[test]
    fn creator_splits_on_first_comma_only() {
        let creator = Creator::from(&CreatorInput::new("  de la Cruz , Maria, Jr. "));

        assert_eq!(creator.person_or_org.family_name, "de la Cruz");
        assert_eq!(creator.person_or_org.given_name, "Maria, Jr.");
        assert_eq!(creator.person_or_org.name, "de la Cruz , Maria, Jr.");
    }

    #[test]
    fn blank_orcid_is_dropped() {
        let creator = Creator::from(&CreatorInput::new("Doe, Jane").with_orcid("   "));
        assert!(creator.person_or_org.identifiers.is_empty());
    }

    #[test]
    fn creator_serializes_type_field() {
        let creator = Creator::from(&CreatorInput::new("Doe, Jane"));
        let value = serde_json::to_value(&creator).expect("serialize creator");

        assert_eq!(value["person_or_org"]["type"], json!("personal"));
        assert_eq!(value["person_or_org"]["identifiers"], json!([]));
    }

    #[test]
    fn resource_type_parses_every_declared_id() {
        assert_eq!(ResourceType::ALL.len(), 21);
        for value in ResourceType::ALL {
            assert_eq!(value.as_str().parse::<ResourceType>(), Ok(value));
        }
    }

    #[test]
    fn unknown_resource_type_lists_valid_values() {
        let err = "not-a-real-type"
            .parse::<ResourceType>()
            .expect_err("should reject unknown type");
        let message = err.to_string();

        assert!(message.contains("not-a-real-type"));
        assert!(message.contains("publication-article"));
        assert!(message.contains("workflow"));
    }

    #[test]
    fn record_keeps_unknown_fields_on_round_trip() {
        let raw = json!({
            "id": "abcd-1234",
            "metadata": {"title": "Old", "publisher": "CERN"},
            "links": {"self": "https://api/records/abcd-1234/draft", "files": "https://api/files"},
            "access": {"record": "public"},
            "errors": [{"field": "metadata.creators", "messages": ["Missing data."]}]
        });

        let record: Record = serde_json::from_value(raw).expect("parse record");
        assert_eq!(record.title(), Some("Old"));
        assert_eq!(record.errors.len(), 1);
        assert_eq!(record.url(), Some("https://api/records/abcd-1234/draft"));

        let written = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(written["access"], json!({"record": "public"}));
        assert_eq!(written["links"]["files"], json!("https://api/files"));
        assert_eq!(written["metadata"]["publisher"], json!("CERN"));
        assert!(written.get("errors").is_none());
    }

    #[test]
    fn error_body_reason_joins_field_messages() {
        let body: ErrorBody = serde_json::from_value(json!({
            "status": 400,
            "message": "A validation error occurred.",
            "errors": [{"field": "metadata.title", "messages": ["Missing data for required field."]}]
        }))
        .expect("parse error body");

        assert_eq!(
            body.reason().as_deref(),
            Some("A validation error occurred.; metadata.title: Missing data for required field.")
        );
    }
}
