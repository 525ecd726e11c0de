use std::sync::Arc;

use shared::{
    domain::{Category, CourseId, Level},
    protocol::{CoursePatch, NewCourse, DEFAULT_DURATION, DEFAULT_INSTRUCTOR},
};
use storage::{seed_if_empty, CatalogStore, MemoryStore, Storage, StoreError};

async fn backends() -> Vec<(&'static str, Arc<dyn CatalogStore>)> {
    let sqlite = Storage::new("sqlite::memory:").await.expect("sqlite");
    vec![
        ("memory", Arc::new(MemoryStore::new())),
        ("sqlite", Arc::new(sqlite)),
    ]
}

fn new_course(title: &str, category: &str) -> NewCourse {
    NewCourse {
        title: Some(title.into()),
        description: Some(format!("All about {title}")),
        image: Some("https://example.test/course.png".into()),
        category: Some(category.into()),
        level: Some("Intermediate".into()),
        price: Some(69.0),
        instructor: None,
        duration: None,
    }
}

#[tokio::test]
async fn create_then_get_round_trips_with_defaults() {
    for (name, store) in backends().await {
        let created = store
            .create(new_course("Financial Management", "business"))
            .await
            .expect("create");
        assert_eq!(created.instructor, DEFAULT_INSTRUCTOR, "{name}");
        assert_eq!(created.duration, DEFAULT_DURATION, "{name}");
        assert_eq!(created.category, Category::Business, "{name}");
        assert_eq!(created.level, Level::Intermediate, "{name}");

        let loaded = store.get(created.id).await.expect("get").expect("present");
        assert_eq!(loaded, created, "{name}");
    }
}

#[tokio::test]
async fn explicit_instructor_and_duration_are_kept() {
    for (name, store) in backends().await {
        let created = store
            .create(NewCourse {
                instructor: Some("Ada".into()),
                duration: Some("6 weeks".into()),
                ..new_course("Automation", "tech")
            })
            .await
            .expect("create");
        assert_eq!(created.instructor, "Ada", "{name}");
        assert_eq!(created.duration, "6 weeks", "{name}");
    }
}

#[tokio::test]
async fn padded_text_fields_read_back_unchanged() {
    for (name, store) in backends().await {
        let fields = NewCourse {
            description: Some("  Indented blurb\n".into()),
            image: Some(" https://example.test/p.png ".into()),
            instructor: Some(" Ada ".into()),
            ..new_course("  Padded Title ", "creative")
        };
        let created = store.create(fields.clone()).await.expect("create");
        let loaded = store.get(created.id).await.expect("get").expect("present");

        assert_eq!(loaded.title, "Padded Title", "{name}");
        assert_eq!(Some(loaded.description), fields.description, "{name}");
        assert_eq!(Some(loaded.image), fields.image, "{name}");
        assert_eq!(Some(loaded.instructor), fields.instructor, "{name}");
    }
}

#[tokio::test]
async fn invalid_create_does_not_insert() {
    for (name, store) in backends().await {
        let err = store
            .create(NewCourse {
                price: Some(-5.0),
                ..new_course("Broken", "tech")
            })
            .await
            .expect_err("negative price");
        assert!(matches!(err, StoreError::InvalidInput(_)), "{name}");

        let (items, total) = store.list(None, 0, 10).await.expect("list");
        assert!(items.is_empty(), "{name}");
        assert_eq!(total, 0, "{name}");
    }
}

#[tokio::test]
async fn ids_are_unique() {
    for (name, store) in backends().await {
        let a = store.create(new_course("A", "tech")).await.expect("a");
        let b = store.create(new_course("B", "tech")).await.expect("b");
        assert_ne!(a.id, b.id, "{name}");
    }
}

#[tokio::test]
async fn later_created_course_is_listed_first() {
    for (name, store) in backends().await {
        let first = store.create(new_course("First", "tech")).await.expect("first");
        let second = store
            .create(new_course("Second", "tech"))
            .await
            .expect("second");

        let (items, total) = store.list(None, 0, 10).await.expect("list");
        assert_eq!(total, 2, "{name}");
        assert_eq!(items[0].id, second.id, "{name}");
        assert_eq!(items[1].id, first.id, "{name}");
    }
}

#[tokio::test]
async fn list_filters_and_windows_results() {
    for (name, store) in backends().await {
        seed_if_empty(store.as_ref()).await.expect("seed");

        let (all, total) = store.list(None, 0, 6).await.expect("all");
        assert_eq!(all.len(), 6, "{name}");
        assert_eq!(total, 6, "{name}");
        assert_eq!(all[0].title, "Solopreneur Business Foundations", "{name}");

        let (tech, tech_total) = store.list(Some(Category::Tech), 0, 6).await.expect("tech");
        assert_eq!(tech_total, 2, "{name}");
        assert!(tech.iter().all(|c| c.category == Category::Tech), "{name}");

        let (page_two, total) = store.list(None, 4, 4).await.expect("page two");
        assert_eq!(total, 6, "{name}");
        assert_eq!(page_two.len(), 2, "{name}");
        assert_eq!(page_two[0].id, all[4].id, "{name}");

        let (past_end, total) = store.list(None, 12, 6).await.expect("past end");
        assert!(past_end.is_empty(), "{name}");
        assert_eq!(total, 6, "{name}");
    }
}

#[tokio::test]
async fn list_rejects_non_positive_limit() {
    for (name, store) in backends().await {
        let err = store.list(None, 0, 0).await.expect_err("zero limit");
        assert!(matches!(err, StoreError::InvalidInput(_)), "{name}");
    }
}

#[tokio::test]
async fn seeding_is_skipped_when_courses_exist() {
    for (name, store) in backends().await {
        assert_eq!(seed_if_empty(store.as_ref()).await.expect("seed"), 6, "{name}");
        assert_eq!(seed_if_empty(store.as_ref()).await.expect("reseed"), 0, "{name}");
        let (_, total) = store.list(None, 0, 1).await.expect("list");
        assert_eq!(total, 6, "{name}");
    }
}

#[tokio::test]
async fn update_merges_fields_and_preserves_identity() {
    for (name, store) in backends().await {
        let created = store
            .create(new_course("Digital Marketing", "marketing"))
            .await
            .expect("create");

        let updated = store
            .update(
                created.id,
                CoursePatch {
                    price: Some(10.0),
                    level: Some("Advanced".into()),
                    ..CoursePatch::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.id, created.id, "{name}");
        assert_eq!(updated.created_at, created.created_at, "{name}");
        assert_eq!(updated.price, 10.0, "{name}");
        assert_eq!(updated.level, Level::Advanced, "{name}");
        assert_eq!(updated.title, created.title, "{name}");

        let loaded = store.get(created.id).await.expect("get").expect("present");
        assert_eq!(loaded, updated, "{name}");
    }
}

#[tokio::test]
async fn update_validates_present_fields_and_leaves_record_untouched() {
    for (name, store) in backends().await {
        let created = store
            .create(new_course("Creative Content", "creative"))
            .await
            .expect("create");

        let err = store
            .update(
                created.id,
                CoursePatch {
                    title: Some("Renamed".into()),
                    category: Some("cooking".into()),
                    ..CoursePatch::default()
                },
            )
            .await
            .expect_err("bad category");
        assert!(matches!(err, StoreError::InvalidInput(_)), "{name}");

        let loaded = store.get(created.id).await.expect("get").expect("present");
        assert_eq!(loaded, created, "{name}");
    }
}

#[tokio::test]
async fn update_and_delete_unknown_ids_are_not_found() {
    for (name, store) in backends().await {
        let missing = CourseId(4242);
        let err = store
            .update(missing, CoursePatch::default())
            .await
            .expect_err("update missing");
        assert!(matches!(err, StoreError::NotFound(id) if id == missing), "{name}");

        let err = store.delete(missing).await.expect_err("delete missing");
        assert!(matches!(err, StoreError::NotFound(_)), "{name}");
        assert!(store.get(missing).await.expect("get").is_none(), "{name}");
    }
}

#[tokio::test]
async fn second_delete_reports_not_found() {
    for (name, store) in backends().await {
        let created = store.create(new_course("Gone", "tech")).await.expect("create");
        store.delete(created.id).await.expect("first delete");
        let err = store.delete(created.id).await.expect_err("second delete");
        assert!(matches!(err, StoreError::NotFound(_)), "{name}");
        assert!(store.get(created.id).await.expect("get").is_none(), "{name}");
    }
}
