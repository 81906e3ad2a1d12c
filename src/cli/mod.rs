//! Line-oriented front end.
//! - Opens the local database and fetches the remote credentials
//! - Wires the identity provider into the application context
//! - Reads commands from stdin while rendering session events

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{fetch_remote_credentials, AppConfig};
use crate::database::db::connection::get_db_pool;
use crate::database::db::kv::SqliteKvStore;
use crate::database::db::migrate;
use crate::database::models::amount::parse_lenient;
use crate::database::models::{month_key, BudgetItem, FixedPlanningConfig, StoredBudget};
use crate::error::AuthError;
use crate::identity::{IdentityProvider, LocalIdentityProvider, SignInRequest};
use crate::session::{AppContext, AppEvent};
use crate::store::http::HttpDocumentStore;
use crate::store::{BudgetSnapshot, LocalBackend};

pub mod input;
pub mod ui;
pub mod util;

use input::{Command, Half};

pub async fn run(config: &AppConfig) -> Result<()> {
    let pool = get_db_pool(&config.database_url).await?;
    migrate::run_migrations(&pool).await?;
    let local = LocalBackend::new(Arc::new(SqliteKvStore::new(pool)));

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()?;
    let credentials = match fetch_remote_credentials(&client, &config.config_url).await {
        Ok(creds) => creds,
        Err(e) => {
            eprintln!("Could not load the app configuration from {}: {}", config.config_url, e);
            return Err(e.into());
        }
    };
    let documents = HttpDocumentStore::from_credentials(client, &credentials, &config.config_url);

    let provider = LocalIdentityProvider::new();
    let mut identities = provider.subscribe();
    let (mut ctx, mut events) = AppContext::new(local, Arc::new(documents));

    let mut shell = Shell::default();
    ui::print_identity(None);
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = identities.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = identities.borrow_and_update().clone();
                ctx.apply_identity(next).await;
            }
            Some(event) = events.recv() => {
                ui::render_event(&event);
                shell.observe(event);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match input::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => shell.execute(command, &mut ctx, &provider).await,
                    Err(usage) => println!("{usage}"),
                }
            }
        }
    }

    ctx.shutdown();
    Ok(())
}

/// What the prompt remembers between commands.
#[derive(Default)]
struct Shell {
    budgets: BudgetSnapshot,
    fixed: Option<FixedPlanningConfig>,
}

impl Shell {
    fn observe(&mut self, event: AppEvent) {
        match event {
            AppEvent::Budgets(snapshot) => self.budgets = snapshot,
            AppEvent::FixedData(fixed) => self.fixed = fixed,
            AppEvent::IdentityChanged(None) => {
                self.budgets = BudgetSnapshot::default();
                self.fixed = None;
            }
            _ => {}
        }
    }

    async fn execute(
        &mut self,
        command: Command,
        ctx: &mut AppContext,
        provider: &LocalIdentityProvider,
    ) {
        match command {
            Command::Help => ui::print_help(),
            Command::Quit => {}
            Command::Guest => report_auth(provider.sign_in_anonymously().await.map(|_| ())),
            Command::Login {
                id,
                email,
                display_name,
            } => {
                let request = SignInRequest {
                    id,
                    display_name,
                    email,
                };
                report_auth(provider.sign_in(request).await.map(|_| ()));
            }
            Command::Logout => report_auth(provider.sign_out().await),
            Command::Migrate => {
                if !ctx.migration_pending() {
                    println!("Nothing left on this device to move.");
                } else if let Err(e) = ctx.retry_migration().await {
                    println!("{e}");
                }
            }
            Command::Show => ui::print_draft(ctx.draft()),
            Command::Month(name) => ctx.draft_mut().month_name = name,
            Command::Goal(raw) => {
                ctx.draft_mut().set_savings_goal(&raw);
                ui::print_draft(ctx.draft());
            }
            Command::Add(kind) => {
                ctx.draft_mut().add(kind);
                ui::print_draft(ctx.draft());
            }
            Command::Set {
                list,
                index,
                field,
                value,
            } => {
                if ctx.draft_mut().set_field(list, index, field, &value) {
                    ui::print_draft(ctx.draft());
                } else {
                    println!("That row has no such field.");
                }
            }
            Command::Remove { list, index } => {
                if !ctx.draft_mut().remove(list, index) {
                    println!("No row {}.", index + 1);
                }
            }
            Command::Save => {
                if let Err(e) = ctx.save_draft().await {
                    println!("{e}");
                }
            }
            Command::List => ui::print_budgets(&self.budgets),
            Command::Open(target) => match self.find(&target) {
                Some(budget) => {
                    ctx.open_budget(&budget);
                    ui::print_draft(ctx.draft());
                }
                None => println!("No saved month matches '{target}'."),
            },
            Command::Delete(target) => {
                let key = self
                    .find(&target)
                    .map(|b| b.id)
                    .unwrap_or_else(|| month_key(&target));
                if let Err(e) = ctx.delete_budget(&key).await {
                    println!("{e}");
                }
            }
            Command::Fixed => match &self.fixed {
                Some(fixed) => ui::print_fixed(fixed),
                None => println!("No fixed planning yet."),
            },
            Command::Income { half, amount } => {
                let mut fixed = self.fixed.clone().unwrap_or_default();
                match half {
                    Half::Q1 => fixed.income_q1 = parse_lenient(&amount),
                    Half::Q2 => fixed.income_q2 = parse_lenient(&amount),
                }
                self.save_fixed(ctx, fixed).await;
            }
            Command::Expense { half, name, amount } => {
                let mut fixed = self.fixed.clone().unwrap_or_default();
                let item = BudgetItem::new(name, parse_lenient(&amount));
                match half {
                    Half::Q1 => fixed.fixed_expenses_q1.push(item),
                    Half::Q2 => fixed.fixed_expenses_q2.push(item),
                }
                self.save_fixed(ctx, fixed).await;
            }
        }
    }

    async fn save_fixed(&mut self, ctx: &mut AppContext, fixed: FixedPlanningConfig) {
        match ctx.save_fixed_data(&fixed).await {
            Ok(()) => {
                ui::print_fixed(&fixed);
                self.fixed = Some(fixed);
            }
            Err(e) => println!("{e}"),
        }
    }

    /// Look up a listed month by row number, key or name.
    fn find(&self, target: &str) -> Option<StoredBudget> {
        let budgets = &self.budgets.budgets;
        if let Ok(n) = target.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| budgets.get(i)).cloned();
        }
        let key = month_key(target.trim());
        budgets.iter().find(|b| b.id == key).cloned()
    }
}

fn report_auth(result: Result<(), AuthError>) {
    if let Err(e) = result {
        tracing::warn!(code = %e.code, "auth error: {}", e.message);
        println!("{}", e.user_message());
    }
}
