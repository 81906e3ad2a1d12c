//! Plain-text rendering of the session state.

use crate::database::models::{FixedPlanningConfig, Liability, StoredBudget};
use crate::identity::Identity;
use crate::session::{AppEvent, BudgetDraft};
use crate::store::BudgetSnapshot;
use crate::totals::{summarize_fixed, ProgressBand};

use super::util::{fmt_percent, format_currency};

pub fn print_help() {
    println!(
        "\
Session:   guest | login <id> [email] [name] | logout | migrate | quit
Draft:     month <name> | goal <amount> | show
           add <asset|owed|liability|card>
           set <assets|owed|liabilities> <n> <name|amount|total|minimum> <value>
           remove <assets|owed|liabilities> <n>
Records:   save | list | open <n|key> | delete <key>
Fixed:     fixed | income <q1|q2> <amount> | expense <q1|q2> <name> <amount>"
    );
}

pub fn print_identity(identity: Option<&Identity>) {
    match identity {
        None => println!("Signed out. Type `guest` or `login <id>` to start."),
        Some(identity) => println!("== {} ==", identity.label()),
    }
}

pub fn print_draft(draft: &BudgetDraft) {
    let month = if draft.month_name.trim().is_empty() {
        "(unnamed month)"
    } else {
        draft.month_name.as_str()
    };
    println!("-- {month} --");

    println!("Assets");
    for (i, item) in draft.assets.iter().enumerate() {
        println!("  {:>2}. {:<20} {:>14}", i + 1, item.name, format_currency(&item.amount));
    }
    println!("Owed to me");
    for (i, item) in draft.owed.iter().enumerate() {
        println!("  {:>2}. {:<20} {:>14}", i + 1, item.name, format_currency(&item.amount));
    }
    println!("Liabilities");
    for (i, liability) in draft.liabilities.iter().enumerate() {
        match liability {
            Liability::Standard(item) => {
                println!("  {:>2}. {:<20} {:>14}", i + 1, item.name, format_currency(&item.amount))
            }
            Liability::CreditCard(card) => println!(
                "  {:>2}. {:<20} {:>14}  (min {})",
                i + 1,
                card.name,
                format_currency(&card.total),
                format_currency(&card.minimum)
            ),
        }
    }

    let totals = draft.totals();
    println!();
    println!("Total assets       {:>14}", format_currency(&totals.total_assets));
    println!("Total liabilities  {:>14}", format_currency(&totals.total_liabilities));
    println!("Net worth          {:>14}", format_currency(&totals.net_worth));
    println!("After minimums     {:>14}", format_currency(&totals.partial_net_worth));

    let progress = draft.progress();
    let band = match progress.band {
        ProgressBand::Low => "low",
        ProgressBand::Medium => "getting there",
        ProgressBand::High => "on track",
    };
    println!(
        "Savings goal       {:>14}  {} ({band})",
        format_currency(&progress.goal),
        fmt_percent(&progress.display_percent())
    );
}

pub fn print_budgets(snapshot: &BudgetSnapshot) {
    if let Some(error) = &snapshot.error {
        println!("! {error}");
        return;
    }
    if snapshot.budgets.is_empty() {
        println!("No saved months yet.");
        return;
    }
    for (i, budget) in snapshot.budgets.iter().enumerate() {
        print_budget_line(i, budget);
    }
}

fn print_budget_line(i: usize, budget: &StoredBudget) {
    let record = &budget.record;
    println!(
        "  {:>2}. {:<20} net {:>14}  saved {}",
        i + 1,
        record.month_name,
        format_currency(&record.net_worth),
        record.created_at.format("%Y-%m-%d %H:%M")
    );
}

pub fn print_fixed(config: &FixedPlanningConfig) {
    let summary = summarize_fixed(config);
    let halves = [
        (
            "1st half",
            summary.income_q1,
            summary.expenses_q1,
            &config.fixed_expenses_q1,
            summary.remaining_q1,
        ),
        (
            "2nd half",
            summary.income_q2,
            summary.expenses_q2,
            &config.fixed_expenses_q2,
            summary.remaining_q2,
        ),
    ];
    for (label, income, expenses, items, remaining) in halves {
        println!("-- {label} --");
        println!("  Income     {:>14}", format_currency(&income));
        for item in items {
            println!("    {:<18} {:>14}", item.name, format_currency(&item.amount));
        }
        println!("  Expenses   {:>14}", format_currency(&expenses));
        println!("  Remaining  {:>14}", format_currency(&remaining));
    }
}

pub fn render_event(event: &AppEvent) {
    match event {
        AppEvent::IdentityChanged(identity) => print_identity(identity.as_ref()),
        AppEvent::Budgets(snapshot) => {
            if snapshot.error.is_some() {
                print_budgets(snapshot);
            } else {
                println!("({} saved months)", snapshot.budgets.len());
            }
        }
        AppEvent::FixedData(_) => {}
        AppEvent::Migrated(report) => println!(
            "Moved {} guest month(s){} to your account.",
            report.budgets,
            if report.fixed_data { " and fixed planning" } else { "" }
        ),
        AppEvent::MigrationFailed(message) => {
            println!("! Could not move guest data to your account: {message}.");
            println!("  Your data stays on this device for now. Type `migrate` to try again.");
        }
        AppEvent::Notice(message) => println!("{message}"),
        AppEvent::DraftReset => println!("Draft cleared."),
    }
}
