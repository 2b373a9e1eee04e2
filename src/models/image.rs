use serde::{Deserialize, Serialize};

/// Metadata extracted from a file on disk, before it has a catalog row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMeta {
    pub filepath: String,
    pub filename: String,
    pub date_taken: String,
    pub date_modified: String,
    pub filesize: i64,
    pub width: i64,
    pub height: i64,
}

/// One catalogued image row. `llm_tags` is `None` until the enrichment
/// loop has processed the record; tags are stored comma-joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    pub filepath: String,
    pub filename: String,
    pub date_taken: String,
    pub date_modified: String,
    pub filesize: i64,
    pub width: i64,
    pub height: i64,
    pub llm_tags: Option<String>,
}

impl ImageRecord {
    pub fn tags(&self) -> Vec<&str> {
        self.llm_tags
            .as_deref()
            .map(|t| t.split(',').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_tags(tags: Option<&str>) -> ImageRecord {
        ImageRecord {
            id: 1,
            filepath: "/photos/a.jpg".to_string(),
            filename: "a.jpg".to_string(),
            date_taken: "2024-06-01T12:00:00".to_string(),
            date_modified: "2024-06-01T12:00:00".to_string(),
            filesize: 1024,
            width: 640,
            height: 480,
            llm_tags: tags.map(|t| t.to_string()),
        }
    }

    #[test]
    fn tags_split_on_comma() {
        let record = record_with_tags(Some("cat,indoor,table"));
        assert_eq!(record.tags(), vec!["cat", "indoor", "table"]);
    }

    #[test]
    fn tags_empty_when_untagged() {
        let record = record_with_tags(None);
        assert!(record.tags().is_empty());
    }
}
