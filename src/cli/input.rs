use crate::session::{Field, ListKind, NewItem};

/// Which half of the month a fixed-planning entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    Q1,
    Q2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Guest,
    Login {
        id: String,
        email: Option<String>,
        display_name: Option<String>,
    },
    Logout,
    Migrate,
    Show,
    Month(String),
    Goal(String),
    Add(NewItem),
    Set {
        list: ListKind,
        index: usize,
        field: Field,
        value: String,
    },
    Remove {
        list: ListKind,
        index: usize,
    },
    Save,
    List,
    Open(String),
    Delete(String),
    Fixed,
    Income {
        half: Half,
        amount: String,
    },
    Expense {
        half: Half,
        name: String,
        amount: String,
    },
}

const SET_USAGE: &str =
    "usage: set <assets|owed|liabilities> <n> <name|amount|total|minimum> <value>";

/// Parse one input line. Indexes are 1-based on the command line.
pub fn parse(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Command::Show);
    };
    let rest: Vec<&str> = words.collect();

    match head.to_ascii_lowercase().as_str() {
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "guest" => Ok(Command::Guest),
        "login" => {
            let id = rest.first().ok_or("usage: login <id> [email] [display name]")?;
            Ok(Command::Login {
                id: id.to_string(),
                email: rest.get(1).map(|s| s.to_string()),
                display_name: (rest.len() > 2).then(|| rest[2..].join(" ")),
            })
        }
        "logout" => Ok(Command::Logout),
        "migrate" => Ok(Command::Migrate),
        "show" => Ok(Command::Show),
        "month" => {
            if rest.is_empty() {
                return Err("usage: month <name>".into());
            }
            Ok(Command::Month(rest.join(" ")))
        }
        "goal" => Ok(Command::Goal(rest.first().copied().unwrap_or("0").to_string())),
        "add" => match rest.first().copied() {
            Some("asset") => Ok(Command::Add(NewItem::Asset)),
            Some("owed") => Ok(Command::Add(NewItem::Owed)),
            Some("liability") => Ok(Command::Add(NewItem::StandardLiability)),
            Some("card") => Ok(Command::Add(NewItem::CreditCard)),
            _ => Err("usage: add <asset|owed|liability|card>".into()),
        },
        "set" => {
            if rest.len() < 3 {
                return Err(SET_USAGE.into());
            }
            Ok(Command::Set {
                list: parse_list(rest[0])?,
                index: parse_index(rest[1])?,
                field: parse_field(rest[2])?,
                value: rest[3..].join(" "),
            })
        }
        "remove" | "rm" => {
            if rest.len() != 2 {
                return Err("usage: remove <assets|owed|liabilities> <n>".into());
            }
            Ok(Command::Remove {
                list: parse_list(rest[0])?,
                index: parse_index(rest[1])?,
            })
        }
        "save" => Ok(Command::Save),
        "list" | "ls" => Ok(Command::List),
        "open" => one_arg(&rest, "usage: open <n|key>").map(Command::Open),
        "delete" | "del" => one_arg(&rest, "usage: delete <key>").map(Command::Delete),
        "fixed" => Ok(Command::Fixed),
        "income" => {
            if rest.len() != 2 {
                return Err("usage: income <q1|q2> <amount>".into());
            }
            Ok(Command::Income {
                half: parse_half(rest[0])?,
                amount: rest[1].to_string(),
            })
        }
        "expense" => {
            if rest.len() < 3 {
                return Err("usage: expense <q1|q2> <name> <amount>".into());
            }
            let (amount, name) = rest[1..].split_last().ok_or("missing amount")?;
            Ok(Command::Expense {
                half: parse_half(rest[0])?,
                name: name.join(" "),
                amount: amount.to_string(),
            })
        }
        other => Err(format!("unknown command '{other}', type help")),
    }
}

fn one_arg(rest: &[&str], usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        return Err(usage.to_string());
    }
    Ok(rest.join(" "))
}

fn parse_list(s: &str) -> Result<ListKind, String> {
    match s {
        "assets" | "asset" => Ok(ListKind::Assets),
        "owed" => Ok(ListKind::Owed),
        "liabilities" | "liability" => Ok(ListKind::Liabilities),
        other => Err(format!("unknown list '{other}'")),
    }
}

fn parse_field(s: &str) -> Result<Field, String> {
    match s {
        "name" => Ok(Field::Name),
        "amount" => Ok(Field::Amount),
        "total" => Ok(Field::Total),
        "minimum" | "min" => Ok(Field::Minimum),
        other => Err(format!("unknown field '{other}'")),
    }
}

fn parse_index(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("'{s}' is not a row number")),
    }
}

fn parse_half(s: &str) -> Result<Half, String> {
    match s.to_ascii_lowercase().as_str() {
        "q1" => Ok(Half::Q1),
        "q2" => Ok(Half::Q2),
        other => Err(format!("'{other}' is not q1 or q2")),
    }
}
