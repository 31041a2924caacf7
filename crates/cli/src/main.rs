use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use trails_agents::{ChatInput, ReplyDelays, TourismAgent};
use trails_core::{
    catalog, Category, ChatChannel, CostRange, FilterCriteria, InterestTag, SortKey, TripRequest,
};
use trails_observability::{init_tracing, AppMetrics};
use trails_storage::MemoryStore;

#[derive(Debug, Parser)]
#[command(name = "trails")]
#[command(about = "Jharkhand tourism assistant CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat. `/reset` clears the transcript, `exit` quits.
    Chat {
        /// Use the floating widget's exact-phrase answers.
        #[arg(long)]
        widget: bool,
        /// Skip the artificial reply delay.
        #[arg(long)]
        instant: bool,
        /// Print the session as JSON on exit.
        #[arg(long)]
        dump_session: bool,
    },
    PlanTrip {
        #[arg(long = "interest", required = true)]
        interests: Vec<String>,
        #[arg(long)]
        days: u32,
        #[arg(long, default_value_t = 5_000)]
        budget: u32,
        #[arg(long, default_value_t = 1)]
        people: u32,
    },
    Search {
        #[command(subcommand)]
        target: SearchTarget,
    },
    /// Dump destinations, products, interests and quick prompts.
    Catalog,
}

#[derive(Debug, Subcommand)]
enum SearchTarget {
    Destinations(SearchArgs),
    Products(SearchArgs),
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[arg(long, default_value = "")]
    query: String,
    #[arg(long)]
    min: Option<u32>,
    #[arg(long)]
    max: Option<u32>,
    #[arg(long)]
    category: Vec<String>,
    #[arg(long)]
    sort: Option<String>,
}

impl SearchArgs {
    fn criteria(&self) -> Result<FilterCriteria> {
        let mut criteria = FilterCriteria::new()
            .with_query(self.query.as_str())
            .with_cost_range(CostRange::from_bounds(self.min, self.max)?);
        for label in &self.category {
            criteria = criteria
                .with_category(Category::parse(label).context("invalid --category value")?);
        }
        if let Some(sort) = self.sort.as_deref() {
            criteria = criteria.sorted_by(SortKey::parse(sort).context("invalid --sort value")?);
        }
        Ok(criteria)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("trails_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Chat {
            widget,
            instant,
            dump_session,
        } => {
            let delays = if instant {
                ReplyDelays::none()
            } else {
                ReplyDelays::from_env()
            };
            let store = Arc::new(MemoryStore::new());
            let agent = build_agent(store.clone(), delays);
            let channel = if widget {
                ChatChannel::Widget
            } else {
                ChatChannel::Assistant
            };
            run_chat(&agent, channel).await?;
            if dump_session {
                println!("{}", store.export_json()?);
            }
        }
        Command::PlanTrip {
            interests,
            days,
            budget,
            people,
        } => {
            let interests = interests
                .iter()
                .map(|value| InterestTag::parse(value))
                .collect::<Result<Vec<_>, _>>()
                .context("invalid --interest value")?;

            let agent = build_agent(Arc::new(MemoryStore::new()), ReplyDelays::none());
            let reply = agent
                .plan_trip(
                    None,
                    TripRequest {
                        interests,
                        days: Some(days),
                        budget: Some(budget),
                        people: Some(people),
                    },
                )
                .await?;

            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Search { target } => {
            let agent = build_agent(Arc::new(MemoryStore::new()), ReplyDelays::none());
            let output = match target {
                SearchTarget::Destinations(args) => {
                    serde_json::to_string_pretty(&agent.search_destinations(&args.criteria()?))?
                }
                SearchTarget::Products(args) => {
                    serde_json::to_string_pretty(&agent.search_products(&args.criteria()?))?
                }
            };
            println!("{output}");
        }
        Command::Catalog => {
            let agent = build_agent(Arc::new(MemoryStore::new()), ReplyDelays::none());
            println!(
                "{}",
                serde_json::to_string_pretty(&agent.catalog_overview())?
            );
        }
    }

    Ok(())
}

async fn run_chat(agent: &TourismAgent<MemoryStore>, channel: ChatChannel) -> Result<()> {
    let greeting = agent
        .catalog()
        .responses()
        .respond(channel.greeting_key())?;
    println!("{greeting}\n");
    println!("Try asking:");
    for prompt in channel.quick_prompts() {
        println!("- {prompt}");
    }
    println!("\nType '/reset' to start over or 'exit' to quit.");

    let mut session_id: Option<String> = None;
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim_end_matches(['\n', '\r']);
        let command = message.trim();
        if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
            break;
        }
        if command.is_empty() {
            continue;
        }
        if command == "/reset" {
            let session = agent.reset_chat(session_id.clone(), channel).await?;
            session_id = Some(session.session_id);
            println!("\n{greeting}\n");
            continue;
        }

        let reply = agent
            .chat(ChatInput {
                session_id: session_id.clone(),
                text: message.to_string(),
                channel,
            })
            .await?;
        session_id = Some(reply.session_id);

        println!("\n{}\n", reply.reply_text);
    }

    Ok(())
}

fn build_agent(store: Arc<MemoryStore>, delays: ReplyDelays) -> TourismAgent<MemoryStore> {
    TourismAgent::new(
        Arc::new(catalog().clone()),
        store,
        AppMetrics::shared(),
        delays,
    )
}
