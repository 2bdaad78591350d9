//! Rookery - A terminal social media manager for Facebook, Instagram, LinkedIn, and Threads
#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rookery::auth::CredentialStore;
use rookery::models::{Category, MediaFile, Platform, Post, PostStatus, SocialAccount};
use rookery::{Config, Database, SocialMediaManager};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;

    match parse_args(&config)? {
        Command::Accounts { org } => list_accounts(&org),
        Command::Connect { platform, org } => connect_flow(&platform, &org, &config).await,
        Command::Activate { account_id, org } => activate_account(&account_id, &org),
        Command::Post {
            content,
            platforms,
            at,
            media,
            category,
            org,
        } => post_cli(&content, &platforms, at.as_deref(), &media, category.as_deref(), &org, config).await,
        Command::Queue { org } => show_queue(&org),
        Command::Publish { post_id, org } => publish_cli(&post_id, &org, config).await,
        Command::Run { org, all } => {
            if all {
                run_scheduler_all(config).await
            } else {
                run_scheduler(&org, config).await
            }
        }
        Command::Metrics { org } => collect_metrics(&org, config).await,
        Command::Analytics { org } => show_analytics(&org),
        Command::Categories { add, org } => categories_cli(add, &org),
        Command::Migrate { org } => migrate_cli(&org),
        Command::Demo { wipe } => demo_cli(wipe),
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    }
}

/// CLI commands
enum Command {
    Accounts {
        org: String,
    },
    Connect {
        platform: String,
        org: String,
    },
    Activate {
        account_id: String,
        org: String,
    },
    Post {
        content: String,
        platforms: Vec<String>,
        at: Option<String>,
        media: Vec<String>,
        category: Option<String>,
        org: String,
    },
    Queue {
        org: String,
    },
    Publish {
        post_id: String,
        org: String,
    },
    Run {
        org: String,
        all: bool,
    },
    Metrics {
        org: String,
    },
    Analytics {
        org: String,
    },
    Categories {
        add: Option<(String, String, Option<String>)>,
        org: String,
    },
    Migrate {
        org: String,
    },
    Demo {
        wipe: bool,
    },
    Help,
    Version,
}

/// Value following any of the given flags
fn flag_value(args: &[String], names: &[&str]) -> Option<String> {
    args.iter()
        .position(|a| names.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// All values following repeated occurrences of the given flags
fn flag_values(args: &[String], names: &[&str]) -> Vec<String> {
    let mut values = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if names.contains(&args[i].as_str()) {
            if let Some(value) = args.get(i + 1) {
                values.push(value.clone());
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    values
}

fn parse_args(config: &Config) -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 1 {
        return Ok(Command::Help);
    }

    let org = flag_value(&args, &["--org", "-o"])
        .unwrap_or_else(|| config.default_organization.clone());

    match args[1].as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),

        "accounts" => Ok(Command::Accounts { org }),

        "connect" => {
            let platform = args
                .get(2)
                .ok_or_else(|| {
                    anyhow::anyhow!("Missing platform (facebook, instagram, linkedin, threads)")
                })?
                .clone();
            Ok(Command::Connect { platform, org })
        }

        "activate" => {
            let account_id = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing account id"))?
                .clone();
            Ok(Command::Activate { account_id, org })
        }

        "post" => {
            let content = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing post content"))?
                .clone();

            let mut platforms: Vec<String> = flag_value(&args, &["--to", "-t"])
                .map(|nets| nets.split(',').map(String::from).collect())
                .unwrap_or_default();

            // Default to the configured cross-post targets
            if platforms.is_empty() {
                platforms = config.default_post_platforms.clone();
            }
            if platforms.is_empty() {
                platforms = vec!["facebook".to_string()];
            }

            Ok(Command::Post {
                content,
                platforms,
                at: flag_value(&args, &["--at", "-a"]),
                media: flag_values(&args, &["--media", "-m"]),
                category: flag_value(&args, &["--category", "-c"]),
                org,
            })
        }

        "queue" => Ok(Command::Queue { org }),

        "publish" => {
            let post_id = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing post id"))?
                .clone();
            Ok(Command::Publish { post_id, org })
        }

        "run" => Ok(Command::Run {
            org,
            all: args.iter().any(|a| a == "--all"),
        }),
        "metrics" => Ok(Command::Metrics { org }),
        "analytics" => Ok(Command::Analytics { org }),

        "categories" => {
            let add = if args.get(2).map(String::as_str) == Some("add") {
                let name = args
                    .get(3)
                    .ok_or_else(|| anyhow::anyhow!("Missing category name"))?
                    .clone();
                let color = args.get(4).cloned().unwrap_or_else(|| "#6364FF".to_string());
                let description = args.get(5).filter(|a| !a.starts_with('-')).cloned();
                Some((name, color, description))
            } else {
                None
            };
            Ok(Command::Categories { add, org })
        }

        "migrate" => Ok(Command::Migrate { org }),

        "demo" => Ok(Command::Demo {
            wipe: args.iter().any(|a| a == "--wipe"),
        }),

        other => Err(anyhow::anyhow!(
            "Unknown command: {other}\nRun 'rookery --help' for usage"
        )),
    }
}

fn print_help() {
    let config_path = rookery::Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"{}
🐦‍⬛ Rookery - A terminal social media manager

USAGE:
    rookery [COMMAND] [--org <organization>]

COMMANDS:
    connect <platform>                 Connect a platform account
      Examples:
        rookery connect facebook
        rookery connect linkedin

    accounts                           List connected accounts
    activate <account-id>              Make an account the active one for its platform

    post <content> [OPTIONS]           Compose a post
      Options:
        -t, --to <platforms>           Comma-separated platforms (default: config)
        -a, --at <time>                Schedule ('in 2h', '15:00', '2030-01-15 14:30')
        -m, --media <path-or-url>      Attach media (repeatable)
        -c, --category <name>          Assign a category
      Examples:
        rookery post "Hello world!"
        rookery post "Ship day 🎉" --to facebook,linkedin --at "in 2h"
        rookery post "New look" --to instagram --media https://cdn.example.com/a.jpg

    queue                              List scheduled posts
    publish <post-id>                  Publish a stored post now
    run [--all]                        Poll and publish due posts (foreground);
                                       --all sweeps every organization

    metrics                            Fetch engagement for published posts
    analytics                          Show the engagement rollup

    categories [add <name> [color] [description]]
                                       List or add categories

    migrate                            Run pending database migrations
    demo [--wipe]                      Seed (or wipe) the demo organization

OPTIONS:
    -o, --org <name>                   Organization (default from config)
    -h, --help                         Show this help message
    -v, --version                      Show version information

CONFIG:
    {}

HOMEPAGE:
    {}
"#,
        rookery::LOGO,
        config_path,
        rookery::REPO_URL
    );
}

fn print_version() {
    println!("rookery {}", rookery::VERSION);
}

/// Read one trimmed line from stdin after a prompt
fn prompt(label: &str) -> Result<String> {
    println!("{label}");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn manager_with_store(config: Config) -> Result<SocialMediaManager> {
    let store = CredentialStore::open()?;
    Ok(SocialMediaManager::new(config, Arc::new(store)))
}

fn list_accounts(org: &str) -> Result<()> {
    let db = Database::open_org(org)?;
    let accounts = db.get_accounts()?;

    if accounts.is_empty() {
        println!("No accounts connected for organization '{org}'.");
        println!("\nConnect one with:");
        println!("  rookery connect facebook");
        return Ok(());
    }

    println!("Connected accounts ({org}):\n");

    for account in accounts {
        let active_marker = if account.is_active { " (active)" } else { "" };
        println!(
            "  {} {} — {}{}\n    id: {}",
            account.platform.emoji(),
            account.platform.name(),
            account.display_name,
            active_marker,
            account.id
        );
    }

    Ok(())
}

async fn connect_flow(platform: &str, org: &str, config: &Config) -> Result<()> {
    let platform = Platform::from_str(platform).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown platform: {platform}\nSupported: facebook, instagram, linkedin, threads"
        )
    })?;

    println!(
        "{} Connecting a {} account to '{}'...",
        platform.emoji(),
        platform.name(),
        org
    );

    let display_name = prompt("\nDisplay name for this account:")?;

    let mut account = match platform {
        Platform::Facebook => {
            let page_id = prompt("\nFacebook page id:")?;
            SocialAccount::new_facebook(&display_name, &page_id)
        }
        Platform::Instagram => {
            let business_id = prompt("\nInstagram business account id:")?;
            SocialAccount::new_instagram(&display_name, &business_id)
        }
        Platform::LinkedIn => {
            let org_id = prompt(
                "\nLinkedIn organization id (press Enter to post as a member):",
            )?;
            let org_id = if org_id.is_empty() { None } else { Some(org_id.as_str()) };
            SocialAccount::new_linkedin(&display_name, org_id)
        }
        Platform::Threads => {
            let user_id = prompt("\nThreads user id:")?;
            SocialAccount::new_threads(&display_name, &user_id)
        }
    };

    let token = prompt("\nAccess token:")?;

    // Verify the token before keeping anything
    let store = Arc::new(CredentialStore::open()?);
    store.store_token(&account, &token)?;

    let manager = SocialMediaManager::new(config.clone(), store.clone());
    if manager.test_connection(&account).await? {
        println!("✓ Token verified");
    } else {
        store.delete_tokens(&account)?;
        anyhow::bail!("The platform rejected this token; nothing was saved");
    }

    let db = Database::open_org(org)?;

    // First account for a platform becomes the posting default
    let is_first = db.get_accounts_for_platform(platform)?.is_empty();
    db.insert_account(&account)?;
    if is_first {
        db.set_active_account(account.id, platform)?;
        account.is_active = true;
    }

    println!("✓ Connected {} as {}", platform.name(), account.display_name);
    if account.is_active {
        println!("✓ Set as the active {} account", platform.name());
    }

    Ok(())
}

fn activate_account(account_id: &str, org: &str) -> Result<()> {
    let id = uuid::Uuid::parse_str(account_id)
        .map_err(|_| anyhow::anyhow!("Invalid account id: {account_id}"))?;

    let db = Database::open_org(org)?;
    let account = db
        .get_accounts()?
        .into_iter()
        .find(|a| a.id == id)
        .ok_or_else(|| anyhow::anyhow!("No account with id {account_id}"))?;

    db.set_active_account(account.id, account.platform)?;
    println!(
        "✓ {} is now the active {} account",
        account.display_name,
        account.platform.name()
    );

    Ok(())
}

async fn post_cli(
    content: &str,
    platforms: &[String],
    at: Option<&str>,
    media: &[String],
    category: Option<&str>,
    org: &str,
    config: Config,
) -> Result<()> {
    let db = Database::open_org(org)?;

    let scheduled_for = at.map(rookery::schedule::parse_schedule_time).transpose()?;

    let category_id = match category {
        Some(name) => Some(
            db.get_categories()?
                .into_iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow::anyhow!("No category named '{name}'"))?
                .id,
        ),
        None => None,
    };

    // Register media once; every platform post references the same files
    let mut media_ids = Vec::new();
    for path in media {
        let mime = guess_mime(path);
        let file = MediaFile::new(path, mime);
        db.insert_media(&file)?;
        media_ids.push(file.id);
    }

    let manager = manager_with_store(config)?;

    for platform_name in platforms {
        let platform = Platform::from_str(platform_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown platform: {}", platform_name))?;

        let mut post = match scheduled_for {
            Some(at) => Post::scheduled(platform, content, at),
            None => Post::new(platform, content),
        };
        post.category_id = category_id;
        post.media_ids = media_ids.clone();
        db.insert_post(&post)?;

        if let Some(at) = scheduled_for {
            println!(
                "{} Scheduled for {} on {} ({})",
                platform.emoji(),
                at.format("%Y-%m-%d %H:%M UTC"),
                platform.name(),
                post.id
            );
            continue;
        }

        println!("{} Posting to {}...", platform.emoji(), platform.name());
        let outcome = manager.publish(&db, &post).await?;

        if outcome.success {
            println!(
                "✓ Posted: {}",
                outcome.platform_post_id.as_deref().unwrap_or("(no id)")
            );
        } else {
            println!(
                "✗ Failed: {}",
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Crude mime guess from the file extension
fn guess_mime(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else if lower.ends_with(".mp4") {
        "video/mp4"
    } else {
        "image/jpeg"
    }
}

fn show_queue(org: &str) -> Result<()> {
    let db = Database::open_org(org)?;
    let posts = db.get_posts(None, Some(PostStatus::Scheduled), 100)?;

    if posts.is_empty() {
        println!("No scheduled posts for '{org}'.");
        return Ok(());
    }

    println!("Scheduled posts ({org}):\n");

    for post in posts {
        let when = post
            .scheduled_for
            .map_or_else(|| "unscheduled".to_string(), |dt| {
                dt.format("%Y-%m-%d %H:%M UTC").to_string()
            });
        println!(
            "  {} {} {} — {}\n    id: {}",
            post.status.emoji(),
            post.platform.emoji(),
            when,
            post.preview(60),
            post.id
        );
    }

    Ok(())
}

async fn publish_cli(post_id: &str, org: &str, config: Config) -> Result<()> {
    let id = uuid::Uuid::parse_str(post_id)
        .map_err(|_| anyhow::anyhow!("Invalid post id: {post_id}"))?;

    let db = Database::open_org(org)?;
    let manager = manager_with_store(config)?;

    let outcome = manager.publish_post(&db, id).await?;

    if outcome.success {
        println!(
            "✓ Posted: {}",
            outcome.platform_post_id.as_deref().unwrap_or("(no id)")
        );
    } else {
        println!(
            "✗ Failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

async fn run_scheduler(org: &str, config: Config) -> Result<()> {
    let db = Database::open_org(org)?;
    let interval = config.poll_interval_secs;
    let manager = manager_with_store(config)?;

    println!("⏳ Watching for due posts every {interval}s (Ctrl-C to stop)...");
    rookery::schedule::run_forever(&db, &manager, interval).await;

    Ok(())
}

/// Sweep every organization's queue, keeping at most the configured number
/// of databases open through the connection cache
async fn run_scheduler_all(config: Config) -> Result<()> {
    let cache = rookery::db::cache_from_config(&config);
    let interval = config.poll_interval_secs;
    let manager = manager_with_store(config)?;

    println!("⏳ Watching all organizations every {interval}s (Ctrl-C to stop)...");

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval.max(1)));
    loop {
        ticker.tick().await;

        for org in rookery::paths::list_organizations()? {
            let handle = match cache.open(&org) {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!(org = %org, error = %e, "could not open organization");
                    continue;
                }
            };

            let db = handle.lock().await;
            match rookery::schedule::run_due(&db, &manager, chrono::Utc::now()).await {
                Ok(results) => {
                    for (post, outcome) in results {
                        if outcome.success {
                            println!("✓ [{org}] published {}", post.id);
                        } else {
                            println!(
                                "✗ [{org}] {} failed: {}",
                                post.id,
                                outcome.error.as_deref().unwrap_or("unknown error")
                            );
                        }
                    }
                }
                Err(e) => tracing::error!(org = %org, "sweep failed: {e}"),
            }
        }
    }
}

async fn collect_metrics(org: &str, config: Config) -> Result<()> {
    let db = Database::open_org(org)?;
    let store = CredentialStore::open()?;
    let collector = rookery::insights::MetricsCollector::new(config, Arc::new(store));

    println!("📈 Fetching engagement for published posts...");
    let report = collector.collect(&db).await?;

    println!(
        "✓ {} snapshot(s) written, {} post(s) skipped",
        report.collected, report.skipped
    );

    Ok(())
}

fn show_analytics(org: &str) -> Result<()> {
    let db = Database::open_org(org)?;
    let summary = rookery::insights::summarize(&db)?;

    if summary.totals.posts == 0 {
        println!("No published posts with metrics yet.");
        println!("\nRun 'rookery metrics' after publishing to collect engagement.");
        return Ok(());
    }

    println!("Engagement ({org}):\n");
    println!(
        "  Posts: {}   Reach: {}   Impressions: {}",
        summary.totals.posts, summary.totals.reach, summary.totals.impressions
    );
    println!(
        "  ♥ {}  💬 {}  🔁 {}  🔗 {}",
        summary.totals.likes, summary.totals.comments, summary.totals.shares, summary.totals.clicks
    );
    println!(
        "  Avg engagement rate: {:.1}%",
        summary.avg_engagement_rate * 100.0
    );

    let mut platforms: Vec<_> = summary.by_platform.into_iter().collect();
    platforms.sort_by_key(|(p, _)| p.as_str());

    for (platform, totals) in platforms {
        println!(
            "\n  {} {} — {} post(s), reach {}, ♥ {} 💬 {} 🔁 {}",
            platform.emoji(),
            platform.name(),
            totals.posts,
            totals.reach,
            totals.likes,
            totals.comments,
            totals.shares
        );
    }

    Ok(())
}

fn categories_cli(add: Option<(String, String, Option<String>)>, org: &str) -> Result<()> {
    let db = Database::open_org(org)?;

    if let Some((name, color, description)) = add {
        let category = match description {
            Some(desc) => Category::with_description(&name, &color, &desc),
            None => Category::new(&name, &color),
        };
        db.insert_category(&category)?;
        println!("✓ Added category '{}' ({})", category.name, category.color);
        return Ok(());
    }

    let categories = db.get_categories()?;
    if categories.is_empty() {
        println!("No categories for '{org}'.");
        println!("\nAdd one with:");
        println!("  rookery categories add \"Product\" \"#6364FF\"");
        return Ok(());
    }

    println!("Categories ({org}):\n");
    for category in categories {
        let desc = category
            .description
            .map_or_else(String::new, |d| format!(" — {d}"));
        println!("  {} {}{}", category.color, category.name, desc);
    }

    Ok(())
}

fn migrate_cli(org: &str) -> Result<()> {
    let db = Database::open_org(org)?;
    let report = rookery::db::migrate::run(db.connection())?;

    if report.from_version == report.to_version {
        println!("✓ Schema already at version {}", report.to_version);
    } else {
        println!(
            "✓ Migrated v{} → v{} ({} row(s) moved, {} statement(s) skipped)",
            report.from_version, report.to_version, report.rows_migrated, report.statements_skipped
        );
    }

    Ok(())
}

fn demo_cli(wipe: bool) -> Result<()> {
    if wipe {
        if rookery::demo::wipe()? {
            println!("✓ Demo organization removed");
        } else {
            println!("Demo organization does not exist.");
        }
        return Ok(());
    }

    rookery::demo::seed()?;
    println!(
        "✓ Seeded the '{}' organization",
        rookery::demo::DEMO_ORGANIZATION
    );
    println!("\nExplore it with:");
    println!("  rookery accounts --org demo");
    println!("  rookery queue --org demo");
    println!("  rookery analytics --org demo");

    Ok(())
}
