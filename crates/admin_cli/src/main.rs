use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{
    DEFAULT_QUEUE, DatabaseLedger, LedgerStore, QueueChannel, StoreError, User as Account,
    credentials,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

mod prompt;

#[derive(Parser, Debug)]
#[command(name = "tally_admin")]
#[command(about = "Admin utilities for Tally (users, limits, notification queue)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./tally.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Notifications(Notifications),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user, prompting for the password.
    Create(UserCreateArgs),
    /// Change the weekly spending limit of an existing user.
    Limit(UserLimitArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    /// Weekly limit in minor units, `0` disables notifications.
    #[arg(long, default_value_t = 0)]
    weekly_limit: i64,
}

#[derive(Args, Debug)]
struct UserLimitArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    weekly_limit: i64,
}

#[derive(Args, Debug)]
struct Notifications {
    #[arg(long, default_value = DEFAULT_QUEUE)]
    queue: String,

    #[command(subcommand)]
    command: NotificationsCommand,
}

#[derive(Subcommand, Debug)]
enum NotificationsCommand {
    /// Print queued notifications, oldest first.
    Pending {
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// Remove a delivered notification from the queue.
    Ack {
        #[arg(long)]
        id: i64,
    },
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn check_limit(weekly_limit: i64) {
    if weekly_limit < 0 {
        eprintln!("weekly limit must be >= 0");
        std::process::exit(2);
    }
}

/// `None` when no user has `email`; other store failures are returned.
async fn find_user(
    ledger: &dyn LedgerStore,
    email: &str,
) -> Result<Option<Account>, StoreError> {
    match ledger.user_by_email(email).await {
        Ok(user) => Ok(Some(user)),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            check_limit(args.weekly_limit);
            let ledger = DatabaseLedger::new(db);
            if find_user(&ledger, &args.email).await?.is_some() {
                eprintln!("user already exists: {}", args.email);
                std::process::exit(1);
            }

            let password = prompt::new_password()?;
            let hash = credentials::hash_password(&password)?;
            let user = ledger
                .create_user(&args.name, &args.email, &hash, args.weekly_limit)
                .await?;

            println!("created user: {} ({})", user.email, user.id);
        }
        Command::User(User {
            command: UserCommand::Limit(args),
        }) => {
            check_limit(args.weekly_limit);
            let ledger = DatabaseLedger::new(db);
            let Some(user) = find_user(&ledger, &args.email).await? else {
                eprintln!("user not found: {}", args.email);
                std::process::exit(1);
            };

            ledger.set_weekly_limit(user.id, args.weekly_limit).await?;
            println!(
                "weekly limit for {}: {} -> {}",
                user.email, user.weekly_spending_limit, args.weekly_limit
            );
        }
        Command::Notifications(Notifications { queue, command }) => {
            let channel = QueueChannel::new(db, queue);
            match command {
                NotificationsCommand::Pending { limit } => {
                    let pending = channel.pending(limit).await?;
                    if pending.is_empty() {
                        println!("queue {} is empty", channel.queue());
                    }
                    for item in pending {
                        let n = &item.notification;
                        println!(
                            "#{} {} user={} {}/{} {}",
                            item.id,
                            item.enqueued_at.to_rfc3339(),
                            n.user_id,
                            n.current_expenses,
                            n.limit,
                            n.message
                        );
                    }
                }
                NotificationsCommand::Ack { id } => {
                    if !channel.ack(id).await? {
                        eprintln!("notification not found: {id}");
                        std::process::exit(1);
                    }
                    println!("acknowledged notification {id}");
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use engine::{DbErr, Expense, MemoryLedger, NewExpense};

    use super::*;

    /// Ledger whose every call fails like an unreachable database.
    struct Unreachable;

    fn outage() -> StoreError {
        StoreError::Database(DbErr::Custom("connection refused".to_string()))
    }

    #[async_trait]
    impl LedgerStore for Unreachable {
        async fn create_expense(&self, _: NewExpense) -> Result<Expense, StoreError> {
            Err(outage())
        }
        async fn weekly_total(&self, _: i64) -> Result<i64, StoreError> {
            Err(outage())
        }
        async fn weekly_limit(&self, _: i64) -> Result<i64, StoreError> {
            Err(outage())
        }
        async fn set_weekly_limit(&self, _: i64, _: i64) -> Result<(), StoreError> {
            Err(outage())
        }
        async fn list_expenses(&self, _: i64) -> Result<Vec<Expense>, StoreError> {
            Err(outage())
        }
        async fn delete_expense(&self, _: i64, _: i64) -> Result<(), StoreError> {
            Err(outage())
        }
        async fn user_by_email(&self, _: &str) -> Result<Account, StoreError> {
            Err(outage())
        }
    }

    #[tokio::test]
    async fn find_user_distinguishes_absent_from_present() {
        let ledger = MemoryLedger::new();
        let alice = ledger.add_user("Alice", "alice@example.com", "hash", 100);

        let found = find_user(&ledger, "alice@example.com").await.unwrap();
        assert_eq!(found.map(|user| user.id), Some(alice.id));
        assert!(find_user(&ledger, "bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_user_propagates_store_failures() {
        let err = find_user(&Unreachable, "alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
