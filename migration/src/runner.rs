use colored::*;
use futures::FutureExt;
use sea_orm_migration::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

const STATUS_COLUMN: usize = 80;

/// Applies every pending migration in order, printing one status line each.
///
/// Already-applied migrations are skipped, so running this twice is harmless.
pub async fn run_all_migrations(url: &str) -> Result<(), DbErr> {
    let db = sea_orm::Database::connect(url).await?;

    println!("Running migrations...");
    for pending in migration::Migrator::get_pending_migrations(&db).await? {
        print_status_prefix(pending.name());
    }

    let start = Instant::now();
    let result = std::panic::AssertUnwindSafe(migration::Migrator::up(&db, None))
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(())) => {
            let time_str = format!("({:.2?})", start.elapsed()).dimmed();
            println!("{} {}", "done".green(), time_str);
            Ok(())
        }
        Ok(Err(err)) => {
            println!("{}", "failed".red());
            Err(err)
        }
        Err(_) => {
            println!("{}", "failed".red());
            Err(DbErr::Migration("migration panicked".into()))
        }
    }
}

fn print_status_prefix(name: &str) {
    let name_str = format!("Pending {}", name.bold());
    let dots = ".".repeat(STATUS_COLUMN.saturating_sub(name_str.len()));
    println!("{}{}", name_str, dots);
    io::stdout().flush().ok();
}
