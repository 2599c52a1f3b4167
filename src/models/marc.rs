//! MARC record model
//!
//! One record per book, holding the raw field text as exported from the
//! holdings spreadsheet. The `data` JSON column is a derived view rebuilt
//! from the raw fields on every write; it is never edited directly.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Raw MARC field text attached to a book (1:1)
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MarcRecord {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub book_id: i32,
    /// Derived JSON view of the raw fields below
    #[serde(default)]
    pub data: Value,

    pub field_020: Option<String>,
    pub field_020_set: Option<String>,
    pub field_022: Option<String>,
    pub field_052: Option<String>,
    pub field_056: Option<String>,
    pub field_090: Option<String>,

    pub field_245: Option<String>,
    pub field_246_parallel: Option<String>,
    pub field_246_original: Option<String>,
    pub field_250: Option<String>,

    pub field_260: Option<String>,
    pub field_300: Option<String>,
    pub field_310: Option<String>,
    pub field_362: Option<String>,

    pub field_490: Option<String>,

    pub field_500: Option<String>,
    pub field_502: Option<String>,
    pub field_504: Option<String>,
    pub field_541: Option<String>,
    pub field_546: Option<String>,
    pub field_586: Option<String>,
    pub field_590: Option<String>,

    pub field_600: Option<String>,
    pub field_610: Option<String>,
    pub field_647: Option<String>,
    pub field_650: Option<String>,
    pub field_653: Option<String>,
    pub field_655: Option<String>,

    pub field_700: Option<String>,
    pub field_710: Option<String>,
    pub field_720: Option<String>,
    pub field_730: Option<String>,

    pub field_856: Option<String>,
}

impl MarcRecord {
    /// Rebuild the derived JSON view from the raw field text.
    ///
    /// Tags with text become `{"<tag>": {"a": <text>}}`, except 020 which
    /// also carries the set ISBN and 246 which distinguishes parallel and
    /// original titles. Empty fields are omitted.
    pub fn build_json(&self) -> Value {
        let mut root = Map::new();

        let mut put = |tag: &str, key: &str, val: &Option<String>| {
            let Some(v) = val.as_deref().filter(|v| !v.is_empty()) else {
                return;
            };
            root.entry(tag.to_string())
                .or_insert_with(|| json!({}))
                .as_object_mut()
                .expect("tag entry is always an object")
                .insert(key.to_string(), Value::String(v.to_string()));
        };

        put("020", "a", &self.field_020);
        put("020", "set", &self.field_020_set);

        let simple: [(&str, &Option<String>); 27] = [
            ("022", &self.field_022),
            ("052", &self.field_052),
            ("056", &self.field_056),
            ("090", &self.field_090),
            ("245", &self.field_245),
            ("250", &self.field_250),
            ("260", &self.field_260),
            ("300", &self.field_300),
            ("310", &self.field_310),
            ("362", &self.field_362),
            ("490", &self.field_490),
            ("500", &self.field_500),
            ("502", &self.field_502),
            ("504", &self.field_504),
            ("541", &self.field_541),
            ("546", &self.field_546),
            ("586", &self.field_586),
            ("590", &self.field_590),
            ("600", &self.field_600),
            ("610", &self.field_610),
            ("647", &self.field_647),
            ("650", &self.field_650),
            ("653", &self.field_653),
            ("655", &self.field_655),
            ("700", &self.field_700),
            ("710", &self.field_710),
            ("720", &self.field_720),
        ];
        for (tag, val) in simple {
            put(tag, "a", val);
        }
        put("730", "a", &self.field_730);
        put("856", "a", &self.field_856);

        put("246", "parallel_title", &self.field_246_parallel);
        put("246", "original_title", &self.field_246_original);

        Value::Object(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_json_empty_record() {
        let record = MarcRecord::default();
        assert_eq!(record.build_json(), json!({}));
    }

    #[test]
    fn test_build_json_isbn_and_set() {
        let record = MarcRecord {
            field_020: Some("$a 9788912345678".to_string()),
            field_020_set: Some("$a 9788912345685".to_string()),
            ..Default::default()
        };
        assert_eq!(
            record.build_json(),
            json!({"020": {"a": "$a 9788912345678", "set": "$a 9788912345685"}})
        );
    }

    #[test]
    fn test_build_json_parallel_titles() {
        let record = MarcRecord {
            field_246_parallel: Some("Library science".to_string()),
            field_246_original: Some("문헌정보학".to_string()),
            ..Default::default()
        };
        let j = record.build_json();
        assert_eq!(j["246"]["parallel_title"], "Library science");
        assert_eq!(j["246"]["original_title"], "문헌정보학");
    }

    #[test]
    fn test_build_json_skips_empty_fields() {
        let record = MarcRecord {
            field_245: Some("$a Title".to_string()),
            field_250: Some(String::new()),
            ..Default::default()
        };
        let j = record.build_json();
        assert_eq!(j["245"]["a"], "$a Title");
        assert!(j.get("250").is_none());
    }
}
