//! Non-interactive commands: `submit`, `stock` and `forms`.
//!
//! They run the same form engine as the terminal UI, with a stdin prompt for
//! the confirmation step and notifications printed to stdout.

use std::io::{BufRead, Write};
use std::sync::Arc;

use color_eyre::{
    Result,
    eyre::{bail, eyre},
};
use farm_records::{FormKind, RecordStore, check_stock};
use field_gate::prelude::*;
use serde_json::Value;
use tracing::{info, warn};

/// Confirmation on the terminal: `y`/`yes` or the confirm label accepts.
#[derive(Debug, Clone, Copy)]
pub struct StdinConfirmer {
    pub assume_yes: bool,
}

impl Confirmer for StdinConfirmer {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        if self.assume_yes {
            return true;
        }
        let prompt = prompt.clone();
        let answer = tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout();
            let _ = write!(
                stdout,
                "{}\n{} [{} / {}] ",
                prompt.title, prompt.text, prompt.confirm_label, prompt.cancel_label
            );
            let _ = stdout.flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| (line, prompt))
        })
        .await;
        match answer {
            Ok(Ok((line, prompt))) => accepts(&line, &prompt),
            Ok(Err(err)) => {
                warn!(%err, "reading the confirmation failed");
                false
            }
            Err(err) => {
                warn!(%err, "confirmation task failed");
                false
            }
        }
    }
}

fn accepts(line: &str, prompt: &ConfirmPrompt) -> bool {
    let answer = line.trim();
    answer.eq_ignore_ascii_case("y")
        || answer.eq_ignore_ascii_case("yes")
        || answer.eq_ignore_ascii_case(&prompt.confirm_label)
}

/// Prints notifications, one per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        info!(severity = ?notification.severity, title = %notification.title, "notification");
        println!("{}", render_notification(&notification));
    }
}

fn render_notification(notification: &Notification) -> String {
    let tag = match notification.severity {
        Severity::Success => "ok",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    format!("[{tag}] {}: {}", notification.title, notification.message)
}

/// Build the raw draft for a form from `--set` pairs, on top of `base`.
pub fn draft(
    definition: &FormDefinition,
    base: Record,
    values: &[(String, String)],
) -> Result<Record> {
    let mut record = base;
    for (field, value) in values {
        if definition.field(field).is_none() {
            let known: Vec<&str> = definition.fields().iter().map(|f| f.id).collect();
            bail!(
                "unknown field `{field}` for {}; fields are: {}",
                definition.slug,
                known.join(", ")
            );
        }
        record.insert(field.clone(), Value::String(value.clone()));
    }
    Ok(record)
}

/// Describe every field that keeps the session from being valid.
pub fn problems(session: &FormSession) -> Vec<String> {
    let definition = session.definition();
    definition
        .fields()
        .iter()
        .filter_map(|f| {
            if session.is_locked(f.id) {
                let dep = f.depends_on.unwrap_or_default();
                Some(format!("{}: locked until `{dep}` is valid", f.id))
            } else {
                match session.status(f.id) {
                    Some(FieldStatus::Invalid(msg)) => Some(format!("{}: {msg}", f.id)),
                    Some(FieldStatus::Pending) | None => Some(format!("{}: missing", f.id)),
                    Some(FieldStatus::Valid) => None,
                }
            }
        })
        .collect()
}

pub async fn submit(
    store: RecordStore,
    form: FormKind,
    values: &[(String, String)],
    id: Option<String>,
    assume_yes: bool,
) -> Result<()> {
    let definition = Arc::new(form.definition()?);
    if form.edits_existing() && id.is_none() {
        bail!("{form} edits an existing record; pass --id");
    }

    let (base, target) = match id {
        Some(id) => {
            let record = store.get(definition.resource, &id).await?;
            info!(form = %form, id = %id, "loaded record for editing");
            (record, SubmissionTarget::Update(id))
        }
        None => (Record::new(), SubmissionTarget::Create),
    };
    let record = draft(&definition, base, values)?;
    let session = FormSession::prefilled(Arc::clone(&definition), Arc::new(SystemClock), &record);

    let mut workflow = FormWorkflow::new(
        session,
        target,
        Arc::new(store),
        StdinConfirmer { assume_yes },
        ConsoleNotifier,
    );
    match workflow.submit().await? {
        WorkflowOutcome::Succeeded { navigate_to } => {
            info!(form = %form, route = %navigate_to, "submitted");
            Ok(())
        }
        WorkflowOutcome::Rejected => {
            let details = workflow.session().map(problems).unwrap_or_default();
            for line in &details {
                eprintln!("  {line}");
            }
            Err(eyre!("{} is not valid, nothing was sent", definition.title))
        }
        WorkflowOutcome::Declined => {
            println!("Submission cancelled.");
            Ok(())
        }
        WorkflowOutcome::Ignored => Ok(()),
        WorkflowOutcome::Failed(reason) => Err(eyre!("submission failed: {reason}")),
    }
}

pub async fn stock(store: RecordStore, item: &str) -> Result<()> {
    let level = check_stock(&store, &ConsoleNotifier, item).await?;
    info!(item, total = level.total, "stock checked");
    Ok(())
}

pub fn list_forms(registry: &FormRegistry) {
    for form in registry.iter() {
        println!("{} ({}) -> /{}", form.slug, form.title, form.resource);
        for f in form.fields() {
            let after = f
                .depends_on
                .map(|d| format!(", after {d}"))
                .unwrap_or_default();
            let required = if f.required { "required" } else { "optional" };
            println!("  {:<18} {} [{required}{after}]", f.id, f.label);
        }
    }
}
