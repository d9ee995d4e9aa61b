use clap::{Parser, Subcommand};
use farm_records::FormKind;

#[derive(Parser, Debug)]
#[command(name = "wizard", version, about = "Harvest, maintenance and yield record entry")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Cmd>,

    /// Work against an in-memory store with sample data instead of the backend
    #[arg(long, global = true)]
    pub offline: bool,

    /// Override `api.base_url` from the configuration
    #[arg(long, global = true, value_name = "URL")]
    pub api: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Run the interactive terminal UI (default)
    Run {
        /// Open the yield record with this id for editing
        #[arg(long, value_name = "ID")]
        edit_yield: Option<String>,
    },
    /// Fill in and submit a form without the UI
    Submit {
        /// harvest-schedule, maintenance or yield-record
        form: FormKind,
        /// Field value, repeatable: --set cropType=Coconut
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
        /// Update this existing record instead of creating one
        #[arg(long, value_name = "ID")]
        id: Option<String>,
        /// Answer the confirmation prompt with yes
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the stock level of one fertilizer type
    Stock {
        /// Fertilizer type, e.g. Urea
        item: String,
    },
    /// List the available forms and their fields
    Forms,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got `{raw}`"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in `{raw}`"));
    }
    Ok((field.to_string(), value.to_string()))
}
