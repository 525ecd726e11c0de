use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Category, CourseId, Level};

pub const DEFAULT_INSTRUCTOR: &str = "Solopren Team";
pub const DEFAULT_DURATION: &str = "4 weeks";
pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub image: String,
    pub category: Category,
    pub level: Level,
    pub price: f64,
    pub instructor: String,
    pub duration: String,
    pub created_at: DateTime<Utc>,
}

/// Create payload. Every field is optional on the wire so that a missing
/// field is reported as a validation failure instead of a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// Partial update payload. `id` and `createdAt` are not part of the shape,
/// so values sent for them are dropped during decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePage {
    pub items: Vec<Course>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_matching: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn course_serializes_with_camel_case_and_iso_timestamp() {
        let course = Course {
            id: CourseId(7),
            title: "Digital Marketing Essentials".into(),
            description: "Fundamentals".into(),
            image: "https://example.test/marketing.png".into(),
            category: Category::Marketing,
            level: Level::Beginner,
            price: 59.0,
            instructor: DEFAULT_INSTRUCTOR.into(),
            duration: DEFAULT_DURATION.into(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&course).expect("json");
        assert_eq!(json["id"], 7);
        assert_eq!(json["category"], "marketing");
        assert_eq!(json["level"], "Beginner");
        assert_eq!(json["price"], 59.0);
        assert_eq!(json["createdAt"], "2024-03-01T12:00:00Z");
    }

    #[test]
    fn patch_ignores_immutable_fields() {
        let patch: CoursePatch = serde_json::from_value(serde_json::json!({
            "id": 99,
            "createdAt": "1999-01-01T00:00:00Z",
            "price": 10
        }))
        .expect("patch");
        assert_eq!(patch.price, Some(10.0));
        assert_eq!(
            patch,
            CoursePatch {
                price: Some(10.0),
                ..CoursePatch::default()
            }
        );
    }

    #[test]
    fn page_uses_wire_field_names() {
        let page = CoursePage {
            items: Vec::new(),
            total_pages: 0,
            current_page: 1,
            total_matching: 0,
        };
        let json = serde_json::to_value(&page).expect("json");
        assert_eq!(
            json,
            serde_json::json!({
                "items": [],
                "totalPages": 0,
                "currentPage": 1,
                "totalMatching": 0
            })
        );
    }
}
