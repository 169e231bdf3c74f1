//! `findit match`: rank potential counterparts for an item.

use anyhow::Result;

use finditnow_core::matching::{find_matches_in, MatchResult};

use crate::config::Config;
use crate::items::open_store;

pub async fn run_match(config: &Config, id: &str, explain: bool, json: bool) -> Result<()> {
    let store = open_store(config).await?;
    let result = find_matches_in(&store, id).await;
    store.pool().close().await;
    let matches = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    for (rank, m) in matches.iter().enumerate() {
        print_match(rank + 1, m, explain);
    }

    Ok(())
}

fn print_match(rank: usize, m: &MatchResult, explain: bool) {
    println!(
        "{}. [{:.2}] {}  {}",
        rank,
        m.score,
        m.item.id,
        m.item.title.as_deref().unwrap_or("(untitled)")
    );
    println!(
        "    {} | {} | {}",
        m.item.kind,
        m.item.location.as_deref().unwrap_or("-"),
        m.item.date.as_deref().unwrap_or("-")
    );
    if explain {
        let b = &m.breakdown;
        println!(
            "    category={:.3} location={:.3} date={:.3} title={:.3} description={:.3} (÷{:.1})",
            b.category, b.location, b.date, b.title, b.description, b.weight_total
        );
    }
}
