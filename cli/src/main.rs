//! Expertise CLI client - browse expertises from the terminal

mod client;
mod messages;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::{ExpertiseClient, ListFilter};
use crate::messages::{ExpertiseDetail, UserExpertise};

#[derive(Parser)]
#[command(name = "expertise-cli")]
#[command(about = "CLI client for the expertise server")]
#[command(version)]
struct Cli {
    /// Server URL
    #[arg(short, long, env = "EXPERTISE_SERVER", default_value = "http://localhost:3000")]
    server: String,

    /// API token
    #[arg(short, long, env = "EXPERTISE_TOKEN")]
    token: String,

    /// Print raw JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List visible expertises
    List {
        /// Search work programs, editors and experts
        #[arg(long)]
        search: Option<String>,

        /// Only expertises in this status (on_expertise, rework, accepted)
        #[arg(long)]
        status: Option<String>,

        /// Ordering fields, e.g. -date_of_last_change
        #[arg(long)]
        ordering: Option<String>,
    },

    /// Show one expertise with its experts
    Show {
        /// Expertise ID
        id: i64,
    },

    /// Show the expertise of a work program
    WorkProgram {
        /// Work program ID
        id: i64,
    },

    /// List comments of an expertise
    Comments {
        /// Expertise ID
        expertise: i64,

        /// Only comments in this block
        #[arg(short, long)]
        block: Option<String>,
    },

    /// List your own assignments
    Assignments {
        /// Limit to one expertise
        #[arg(short, long)]
        expertise: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expertise_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let client = ExpertiseClient::new(&cli.server, cli.token.clone())?;

    match cli.command {
        Commands::List {
            search,
            status,
            ordering,
        } => {
            let filter = ListFilter {
                search,
                status,
                ordering,
            };
            let expertises = client.list_expertises(&filter).await?;
            if cli.json {
                return print_json(&expertises);
            }

            if expertises.is_empty() {
                println!("No expertises found.");
            } else {
                println!("Expertises:");
                println!("{:─<60}", "");
                for expertise in expertises {
                    println!(
                        "  #{} {} [{}] {} (changed: {})",
                        expertise.id,
                        expertise.work_program.title,
                        expertise.work_program.discipline_code,
                        expertise.expertise_status,
                        expertise.date_of_last_change.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        Commands::Show { id } => {
            let detail = client.get_expertise(id).await?;
            if cli.json {
                return print_json(&detail);
            }
            print_detail(&detail);
        }
        Commands::WorkProgram { id } => {
            let detail = client.expertise_for_work_program(id).await?;
            if cli.json {
                return print_json(&detail);
            }
            print_detail(&detail);
        }
        Commands::Comments { expertise, block } => {
            let comments = client.comments(expertise, block.as_deref()).await?;
            if cli.json {
                return print_json(&comments);
            }

            if comments.is_empty() {
                println!("No comments.");
            }
            for comment in comments {
                println!(
                    "[{}] {} ({}): {}",
                    comment.comment_block,
                    comment.author.display_name(),
                    comment.comment_date.format("%Y-%m-%d %H:%M"),
                    comment.comment_text
                );
            }
        }
        Commands::Assignments { expertise } => {
            let assignments = client.assignments(expertise).await?;
            if cli.json {
                return print_json(&assignments);
            }

            if assignments.is_empty() {
                println!("No assignments.");
            }
            for assignment in &assignments {
                print_assignment(assignment);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_detail(detail: &ExpertiseDetail) {
    let expertise = &detail.expertise;
    println!(
        "Expertise #{} - {}",
        expertise.id, expertise.work_program.title
    );
    println!("{:─<60}", "");
    println!(
        "  Work program: #{} {} ({})",
        expertise.work_program.id,
        expertise.work_program.discipline_code,
        expertise.work_program.qualification
    );
    println!("  Status:       {}", expertise.expertise_status);
    println!(
        "  Changed:      {}",
        expertise.date_of_last_change.format("%Y-%m-%d %H:%M")
    );
    println!("  Experts:");
    for assignment in &detail.experts {
        print_assignment(assignment);
    }
}

fn print_assignment(assignment: &UserExpertise) {
    println!(
        "    #{} expertise {} - {} ({}) {}",
        assignment.id,
        assignment.expertise_id,
        assignment.expert.display_name(),
        assignment.stuff_status,
        assignment.user_expertise_status.as_deref().unwrap_or("-")
    );
}
