use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let db_path = std::env::var("SUREBETS_DB_PATH").unwrap_or_else(|_| "data/surebets.db".to_string());
    let conn = Connection::open(&db_path).with_context(|| format!("open db at {db_path}"))?;

    println!("db_path={db_path}");
    for t in ["bet", "raw_content", "sure_bet"] {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(1) FROM {t}"), [], |r| r.get(0))
            .with_context(|| format!("count {t}"))?;
        println!("{t}: {count}");
    }

    let pending: i64 = conn
        .query_row("SELECT COUNT(1) FROM raw_content WHERE was_processed=0", [], |r| r.get(0))
        .context("count unprocessed raw contents")?;
    println!("raw_content_unprocessed: {pending}");

    let mut stmt = conn
        .prepare("SELECT provider, COUNT(1) FROM bet GROUP BY provider ORDER BY provider")
        .context("prepare per-provider count")?;
    let per_provider = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (provider, count) in per_provider {
        println!("bet[{provider}]: {count}");
    }

    let last_sure_bet: Option<(String, String, String, String, String)> = conn
        .query_row(
            "SELECT created_at, opponent_1, opponent_2, winning, benefit_1 FROM sure_bet ORDER BY created_at DESC LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()
        .context("read last sure bet")?;

    if let Some((ts, opponent_1, opponent_2, winning, benefit)) = last_sure_bet {
        println!("last_sure_bet: ts={ts} match={opponent_1} vs {opponent_2} winning={winning} benefit={benefit}");
    } else {
        println!("last_sure_bet: <none>");
    }

    Ok(())
}
