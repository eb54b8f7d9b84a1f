use anyhow::anyhow;
use chrono::Utc;
use serde::Serialize;

use mangashelf::config::Config;
use mangashelf::error::Result;
use mangashelf::Repository;

const USAGE: &str = "usage: mangashelf [--db PATH] <items | item NAME | feed-items FEED | feeds | tags | chapter NAME POSITION | delete NAME>";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // --db overrides the configured database
    let config = match args.iter().position(|a| a == "--db") {
        Some(i) if i + 1 < args.len() => {
            let db_path = args.remove(i + 1);
            args.remove(i);
            let config = Config { db_path };
            config.ensure_db_dir()?;
            config
        }
        Some(_) => return Err(anyhow!("--db needs a path\n{USAGE}").into()),
        None => Config::load()?,
    };

    let repository = Repository::open(&config.db_path).await?;
    let result = run(&repository, &args).await;
    repository.close().await?;
    result
}

async fn run(repository: &Repository, args: &[String]) -> Result<()> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["items"] => print_json(&repository.list_item_views().await?),
        ["item", name] => match repository.get_item_view_by_name(name).await? {
            Some(view) => print_json(&view),
            None => Err(anyhow!("no item named {name:?}").into()),
        },
        ["feed-items", feed] => print_json(&repository.list_item_views_by_feed(feed).await?),
        ["feeds"] => print_json(&repository.list_feeds().await?),
        ["tags"] => print_json(&repository.list_tags().await?),
        ["chapter", name, position] => {
            let stamp = Utc::now().to_rfc3339();
            if !repository.update_position(name, position, &stamp).await? {
                eprintln!("No item named {name:?}; nothing updated");
            }
            Ok(())
        }
        ["delete", name] => {
            if !repository.delete_item(name).await? {
                eprintln!("No item named {name:?}; nothing deleted");
            }
            Ok(())
        }
        _ => Err(anyhow!(USAGE).into()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
