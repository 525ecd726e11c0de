use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{CatalogClient, CatalogView, ClientConfig, Rendering};
use shared::{domain::CategoryFilter, domain::CourseId, protocol::Course};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server_url: String,
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse one page of the catalog.
    List {
        #[arg(long, default_value = "all")]
        filter: CategoryFilter,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long)]
        limit: Option<i64>,
    },
    Show {
        id: CourseId,
    },
    Chat {
        message: String,
    },
}

struct TerminalView;

impl CatalogView for TerminalView {
    fn show_loading(&self) {
        println!("Loading courses...");
    }

    fn render(&self, rendering: &Rendering) {
        match rendering {
            Rendering::Courses(items) => items.iter().for_each(print_course_line),
            Rendering::NoResults => println!("No courses found matching your criteria."),
            Rendering::Unchanged => println!("Catalog unavailable; nothing new to show."),
        }
    }

    fn render_pagination(&self, total_pages: i64, current_page: i64) {
        if total_pages > 1 {
            println!("-- page {current_page} of {total_pages} --");
        }
    }

    fn scroll_to_catalog(&self) {}
}

fn print_course_line(course: &Course) {
    println!(
        "#{:<4} {:<42} {:<10} {:<13} ${:>7.2}",
        course.id, course.title, course.category, course.level, course.price
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let config = ClientConfig {
        request_timeout: Duration::from_secs(args.timeout_secs),
        ..ClientConfig::new(args.server_url)
    };

    match args.command {
        Command::List {
            filter,
            page,
            limit,
        } => {
            let client = CatalogClient::new(
                ClientConfig {
                    page_size: limit,
                    ..config
                },
                TerminalView,
            )?;
            client.open(filter, page).await;
        }
        Command::Show { id } => {
            let client = CatalogClient::new(config, TerminalView)?;
            let course = client.fetch_course(id).await?;
            println!("{}", serde_json::to_string_pretty(&course)?);
        }
        Command::Chat { message } => {
            let client = CatalogClient::new(config, TerminalView)?;
            let reply = client.send_chat(&message).await?;
            println!("{}", reply.response);
        }
    }

    Ok(())
}
