use shared::protocol::NewCourse;
use tracing::info;

use crate::{CatalogStore, StoreResult};

/// The launch catalog, in the order it appears on the landing page.
pub fn seed_courses() -> Vec<NewCourse> {
    [
        (
            "Solopreneur Business Foundations",
            "Learn how to create a solid foundation for your solo business venture.",
            "https://source.unsplash.com/random/600x400/?business",
            "business",
            "Beginner",
            49.0,
        ),
        (
            "Building Your Online Presence",
            "Create a professional online presence with minimal technical knowledge.",
            "https://source.unsplash.com/random/600x400/?coding",
            "tech",
            "Intermediate",
            79.0,
        ),
        (
            "Digital Marketing Essentials",
            "Master the fundamentals of digital marketing to grow your solo business.",
            "https://source.unsplash.com/random/600x400/?marketing",
            "marketing",
            "Beginner",
            59.0,
        ),
        (
            "Creative Content Production",
            "Learn to create engaging content that showcases your unique perspective.",
            "https://source.unsplash.com/random/600x400/?design",
            "creative",
            "Advanced",
            89.0,
        ),
        (
            "Financial Management for Solopreneurs",
            "Take control of your finances and maximize profitability.",
            "https://source.unsplash.com/random/600x400/?finance",
            "business",
            "Intermediate",
            69.0,
        ),
        (
            "Automation for Solo Businesses",
            "Use technology to automate tasks and scale your business efficiently.",
            "https://source.unsplash.com/random/600x400/?automation",
            "tech",
            "Advanced",
            99.0,
        ),
    ]
    .into_iter()
    .map(
        |(title, description, image, category, level, price)| NewCourse {
            title: Some(title.into()),
            description: Some(description.into()),
            image: Some(image.into()),
            category: Some(category.into()),
            level: Some(level.into()),
            price: Some(price),
            instructor: None,
            duration: None,
        },
    )
    .collect()
}

/// Inserts the launch catalog when the store holds no courses.
///
/// Courses are inserted last-to-first so the newest-first listing shows them
/// in landing page order. Returns the number of courses inserted.
pub async fn seed_if_empty(store: &dyn CatalogStore) -> StoreResult<usize> {
    let (_, total) = store.list(None, 0, 1).await?;
    if total > 0 {
        return Ok(0);
    }

    let courses = seed_courses();
    let count = courses.len();
    for course in courses.into_iter().rev() {
        store.create(course).await?;
    }
    info!(count, "seeded course catalog");
    Ok(count)
}
