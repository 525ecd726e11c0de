use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::{
    domain::{CategoryFilter, CourseId},
    protocol::NewCourse,
};
use storage::{seed_if_empty, CatalogStore, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/catalog.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert the launch catalog when the database has no courses.
    Seed,
    List {
        #[arg(long, default_value = "all")]
        filter: CategoryFilter,
        #[arg(long, default_value_t = 0)]
        skip: i64,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    CreateCourse {
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        image: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        level: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        instructor: Option<String>,
        #[arg(long)]
        duration: Option<String>,
    },
    DeleteCourse {
        id: CourseId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Seed => {
            let inserted = seed_if_empty(&storage).await?;
            println!("seeded {inserted} courses");
        }
        Command::List {
            filter,
            skip,
            limit,
        } => {
            let (items, total) = storage.list(filter.category(), skip, limit).await?;
            for course in &items {
                println!(
                    "{}\t{}\t{}\t{}\t{:.2}\t{}",
                    course.id,
                    course.title,
                    course.category,
                    course.level,
                    course.price,
                    course.created_at.to_rfc3339()
                );
            }
            println!("{} of {total} matching", items.len());
        }
        Command::CreateCourse {
            title,
            description,
            image,
            category,
            level,
            price,
            instructor,
            duration,
        } => {
            let course = storage
                .create(NewCourse {
                    title: Some(title),
                    description: Some(description),
                    image: Some(image),
                    category: Some(category),
                    level: Some(level),
                    price: Some(price),
                    instructor,
                    duration,
                })
                .await?;
            println!("created course_id={}", course.id);
        }
        Command::DeleteCourse { id } => {
            storage.delete(id).await?;
            println!("deleted course_id={id}");
        }
    }

    Ok(())
}
