use shared::{
    domain::{Category, Level, UnknownVariant},
    protocol::{Course, CoursePatch, NewCourse, DEFAULT_DURATION, DEFAULT_INSTRUCTOR},
};

use crate::StoreError;

/// Fully validated create payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub image: String,
    pub category: Category,
    pub level: Level,
    pub price: f64,
    pub instructor: String,
    pub duration: String,
}

/// Patch whose present fields have all passed validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<Category>,
    pub level: Option<Level>,
    pub price: Option<f64>,
    pub instructor: Option<String>,
    pub duration: Option<String>,
}

pub fn validate_new(fields: NewCourse) -> Result<CourseDraft, StoreError> {
    let missing: Vec<&str> = [
        ("title", is_blank(&fields.title)),
        ("description", is_blank(&fields.description)),
        ("image", is_blank(&fields.image)),
        ("category", is_blank(&fields.category)),
        ("level", is_blank(&fields.level)),
        ("price", fields.price.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, missing)| missing.then_some(name))
    .collect();
    if !missing.is_empty() {
        return Err(StoreError::InvalidInput(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    Ok(CourseDraft {
        title: title_text(fields.title.unwrap_or_default())?,
        description: required_text("description", fields.description.unwrap_or_default())?,
        image: required_text("image", fields.image.unwrap_or_default())?,
        category: parse_category(&fields.category.unwrap_or_default())?,
        level: parse_level(&fields.level.unwrap_or_default())?,
        price: checked_price(fields.price.unwrap_or_default())?,
        instructor: defaulted_text(fields.instructor.unwrap_or_default(), DEFAULT_INSTRUCTOR),
        duration: defaulted_text(fields.duration.unwrap_or_default(), DEFAULT_DURATION),
    })
}

pub fn validate_patch(patch: CoursePatch) -> Result<ValidPatch, StoreError> {
    Ok(ValidPatch {
        title: patch.title.map(title_text).transpose()?,
        description: patch
            .description
            .map(|v| required_text("description", v))
            .transpose()?,
        image: patch.image.map(|v| required_text("image", v)).transpose()?,
        category: patch.category.as_deref().map(parse_category).transpose()?,
        level: patch.level.as_deref().map(parse_level).transpose()?,
        price: patch.price.map(checked_price).transpose()?,
        instructor: patch
            .instructor
            .map(|v| defaulted_text(v, DEFAULT_INSTRUCTOR)),
        duration: patch.duration.map(|v| defaulted_text(v, DEFAULT_DURATION)),
    })
}

/// Merges a validated patch into `course`. `id` and `created_at` are untouched.
pub fn apply_patch(course: &mut Course, patch: ValidPatch) {
    if let Some(title) = patch.title {
        course.title = title;
    }
    if let Some(description) = patch.description {
        course.description = description;
    }
    if let Some(image) = patch.image {
        course.image = image;
    }
    if let Some(category) = patch.category {
        course.category = category;
    }
    if let Some(level) = patch.level {
        course.level = level;
    }
    if let Some(price) = patch.price {
        course.price = price;
    }
    if let Some(instructor) = patch.instructor {
        course.instructor = instructor;
    }
    if let Some(duration) = patch.duration {
        course.duration = duration;
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn required_text(field: &str, value: String) -> Result<String, StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(value)
}

// Titles are the only field stored trimmed.
fn title_text(value: String) -> Result<String, StoreError> {
    required_text("title", value).map(|title| title.trim().to_string())
}

fn parse_category(value: &str) -> Result<Category, StoreError> {
    value
        .trim()
        .parse()
        .map_err(|e: UnknownVariant| StoreError::InvalidInput(e.to_string()))
}

fn parse_level(value: &str) -> Result<Level, StoreError> {
    value
        .trim()
        .parse()
        .map_err(|e: UnknownVariant| StoreError::InvalidInput(e.to_string()))
}

fn defaulted_text(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn checked_price(price: f64) -> Result<f64, StoreError> {
    if !price.is_finite() {
        return Err(StoreError::InvalidInput("price must be a number".into()));
    }
    if price < 0.0 {
        return Err(StoreError::InvalidInput(
            "price must not be negative".into(),
        ));
    }
    Ok(price)
}
