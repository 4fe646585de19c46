//! Path segments of the InvenioRDM REST API, relative to the API base URL.

pub const SEG_RECORDS: &str = "records";
pub const SEG_DRAFT: &str = "draft";
pub const SEG_FILES: &str = "files";
pub const SEG_CONTENT: &str = "content";
pub const SEG_COMMIT: &str = "commit";
pub const SEG_ACTIONS: &str = "actions";
pub const SEG_PUBLISH: &str = "publish";

pub const VOCABULARY_RESOURCE_TYPES: [&str; 2] = ["vocabularies", "resourcetypes"];

pub const RESOURCE_TYPE_FIELD: &str = "resource_type";

#[must_use]
pub const fn records() -> [&'static str; 1] {
    [SEG_RECORDS]
}

#[must_use]
pub const fn draft(record_id: &str) -> [&str; 3] {
    [SEG_RECORDS, record_id, SEG_DRAFT]
}

#[must_use]
pub const fn publish(record_id: &str) -> [&str; 5] {
    [SEG_RECORDS, record_id, SEG_DRAFT, SEG_ACTIONS, SEG_PUBLISH]
}

#[must_use]
pub const fn draft_files(record_id: &str) -> [&str; 4] {
    [SEG_RECORDS, record_id, SEG_DRAFT, SEG_FILES]
}

#[must_use]
pub const fn draft_file_content<'a>(record_id: &'a str, key: &'a str) -> [&'a str; 6] {
    [SEG_RECORDS, record_id, SEG_DRAFT, SEG_FILES, key, SEG_CONTENT]
}

#[must_use]
pub const fn draft_file_commit<'a>(record_id: &'a str, key: &'a str) -> [&'a str; 6] {
    [SEG_RECORDS, record_id, SEG_DRAFT, SEG_FILES, key, SEG_COMMIT]
}
