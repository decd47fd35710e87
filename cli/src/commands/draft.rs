//! Draft commands

use super::Session;
use crate::DraftCommands;
use anyhow::{bail, Result};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct DraftRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn handle(action: DraftCommands, session: &Session) -> Result<()> {
    let drafts = session.drafts()?;
    let Some(key) = drafts.key().map(str::to_owned) else {
        bail!("no applicant email; set --email or RECRUIT_EMAIL");
    };

    match action {
        DraftCommands::Show => {
            let snapshot = drafts.load()?;
            if !session.format.is_text() {
                session.format.print(&snapshot);
            } else if snapshot.is_empty() {
                println!("No saved draft for {}", key);
            } else {
                let rows: Vec<DraftRow> = snapshot
                    .iter()
                    .map(|(field, value)| DraftRow {
                        field: field.clone(),
                        value: value.as_text(),
                    })
                    .collect();
                println!("{}", Table::new(rows));
            }
        }
        DraftCommands::Clear => {
            drafts.clear()?;
            println!("Draft cleared for {}", key);
        }
    }
    Ok(())
}
