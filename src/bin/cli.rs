use anyhow::{bail, Context};
use careerquest::{
    db,
    repositories::{
        SqliteUserRepository, SqliteVerificationRepository, VerificationRepository,
    },
    services::user_service::{CreateUserRequest, UpdatePasswordRequest, UserService},
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "careerquest-cli")]
#[command(about = "CLI tool for managing CareerQuest users and pending verifications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Pending email verification commands
    Pending {
        #[command(subcommand)]
        command: PendingCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a confirmed user without email verification
    Create {
        /// Login id
        #[arg(short, long)]
        user_id: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short = 'n', long)]
        name: String,

        /// Phone number, e.g. 010-1234-5678
        #[arg(long)]
        phone: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show one user, looked up by login id or email
    Show {
        /// Login id
        #[arg(short, long, conflicts_with = "email", required_unless_present = "email")]
        user_id: Option<String>,

        /// Email address
        #[arg(short, long)]
        email: Option<String>,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Delete a user
    Delete {
        /// Login id of the user to delete
        #[arg(short, long)]
        user_id: String,
    },

    /// Set a new password for a user
    SetPassword {
        /// Login id of the user
        #[arg(short, long)]
        user_id: String,

        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum PendingCommands {
    /// Show the pending verification for an email
    Show {
        #[arg(short, long)]
        email: String,
    },

    /// Drop the pending verification for an email
    Remove {
        #[arg(short, long)]
        email: String,
    },

    /// Delete every expired pending verification
    Purge,
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn password_pair(given: Option<String>, prompt: &str) -> anyhow::Result<(String, String)> {
    match given {
        Some(pw) => Ok((pw.clone(), pw)),
        None => {
            let password = get_password(prompt)?;
            let confirm = get_password("Confirm password")?;
            Ok((password, confirm))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Connect to database
    let pool = db::create_pool()
        .await
        .context("Failed to connect to database")?;

    // Run migrations
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    match cli.command {
        Commands::User { command } => {
            let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
            let user_service = UserService::new(user_repository);
            run_user_command(&user_service, command).await
        }
        Commands::Pending { command } => {
            let verification_repository = SqliteVerificationRepository::new(pool.clone());
            run_pending_command(&verification_repository, command).await
        }
    }
}

async fn run_user_command(user_service: &UserService, command: UserCommands) -> anyhow::Result<()> {
    match command {
        UserCommands::Create {
            user_id,
            email,
            name,
            phone,
            password,
        } => {
            let (password, password_confirm) = password_pair(password, "Password")?;

            let request = CreateUserRequest {
                user_id,
                password,
                password_confirm: Some(password_confirm),
                user_name: name,
                email,
                phone_num: phone,
            };

            let user = user_service
                .create_user(request)
                .await
                .context("❌ Failed to create user")?;
            println!("✅ User created successfully!");
            println!("  User ID: {}", user.user_id);
            println!("  Email: {}", user.email);
            println!("  Role: {}", user.role);
        }

        UserCommands::Show { user_id, email } => {
            let (found, key) = match (user_id, email) {
                (Some(user_id), _) => (user_service.find_user_by_user_id(&user_id).await?, user_id),
                (None, Some(email)) => (user_service.find_user_by_email(&email).await?, email),
                (None, None) => bail!("❌ Pass --user-id or --email"),
            };

            match found {
                Some(user) => {
                    println!("User ID: {}", user.user_id);
                    println!("Name: {}", user.user_name);
                    println!("Email: {}", user.email);
                    println!("Phone: {}", user.phone_num);
                    println!("Role: {}", user.role);
                    println!("Created: {}", user.created_at.as_deref().unwrap_or("N/A"));
                }
                None => bail!("❌ User '{}' not found", key),
            }
        }

        UserCommands::List { limit, offset } => {
            let users = user_service
                .list_users(Some(limit), Some(offset))
                .await
                .context("❌ Failed to list users")?;

            if users.is_empty() {
                println!("No users found.");
            } else {
                println!(
                    "{:<20} {:<40} {:<20} {:<20}",
                    "User ID", "Email", "Role", "Created"
                );
                println!("{}", "-".repeat(100));
                for user in users {
                    println!(
                        "{:<20} {:<40} {:<20} {:<20}",
                        user.user_id,
                        user.email,
                        user.role,
                        user.created_at.as_deref().unwrap_or("N/A")
                    );
                }
            }
        }

        UserCommands::Delete { user_id } => {
            user_service
                .delete_user(&user_id)
                .await
                .with_context(|| format!("❌ Failed to delete user '{}'", user_id))?;
            println!("✅ User '{}' deleted successfully!", user_id);
        }

        UserCommands::SetPassword { user_id, password } => {
            if user_service.find_user_by_user_id(&user_id).await?.is_none() {
                bail!("❌ User '{}' not found", user_id);
            }

            let (new_password, password_confirm) = password_pair(password, "New password")?;

            let request = UpdatePasswordRequest {
                user_id: user_id.clone(),
                current_password: None,
                new_password,
                new_password_confirm: Some(password_confirm),
            };

            user_service
                .update_password(request)
                .await
                .context("❌ Failed to update password")?;
            println!("✅ Password updated successfully for '{}'!", user_id);
        }
    }

    Ok(())
}

async fn run_pending_command(
    repository: &SqliteVerificationRepository,
    command: PendingCommands,
) -> anyhow::Result<()> {
    match command {
        PendingCommands::Show { email } => match repository.get(&email).await? {
            Some(pending) => {
                let state = if pending.is_expired(Utc::now()) {
                    "expired"
                } else {
                    "live"
                };
                println!("Pending verification for {}", pending.email);
                println!("  User ID: {}", pending.user_id);
                println!("  Name: {}", pending.user_name);
                println!("  Created: {}", pending.created_at);
                println!("  Expires: {} ({})", pending.expires_at, state);
            }
            None => println!("No pending verification for {}", email),
        },

        PendingCommands::Remove { email } => {
            if repository.remove(&email).await? {
                println!("✅ Pending verification for {} removed", email);
            } else {
                println!("ℹ️  No pending verification for {}", email);
            }
        }

        PendingCommands::Purge => {
            let purged = repository.purge_expired(Utc::now()).await?;
            println!("✅ Purged {} expired pending verification(s)", purged);
        }
    }

    Ok(())
}
