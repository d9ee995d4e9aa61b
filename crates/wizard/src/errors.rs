//! Error and panic reporting for the wizard binary.
//!
//! Errors returned from `main` go through `color_eyre`. A panic first hands
//! the terminal back to the shell, then lands in the log file, and only then
//! is shown on stderr: a human-panic report in release builds, a better-panic
//! trace in debug builds.

use std::any::Any;
use std::panic::PanicHookInfo;
use std::sync::OnceLock;

use color_eyre::{
    Result,
    config::{HookBuilder, PanicHook},
};
use tracing::error;

use crate::{logging, tui};

static INSTALLED: OnceLock<()> = OnceLock::new();

pub fn init() -> Result<()> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    let (panic_hook, eyre_hook) = hooks().try_into_hooks()?;
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |info| {
        if let Err(err) = tui::restore() {
            eprintln!("failed to restore the terminal: {err}");
        }

        let report = panic_hook.panic_report(info).to_string();
        error!(
            location = %location(info),
            message = %payload_text(info.payload()),
            "wizard panicked"
        );
        error!("{}", strip_ansi_escapes::strip_str(report));
        logging::flush();

        report_to_user(info, &panic_hook);
        std::process::exit(libc::EXIT_FAILURE);
    }));

    let _ = INSTALLED.set(());
    Ok(())
}

fn hooks() -> HookBuilder {
    HookBuilder::default()
        .panic_section(format!(
            "The wizard crashed. Details are in {}; please attach that file when reporting the bug.",
            logging::log_path().display()
        ))
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
}

fn location(info: &PanicHookInfo<'_>) -> String {
    info.location()
        .map(|l| format!("{}:{}", l.file(), l.line()))
        .unwrap_or_else(|| "<unknown>".into())
}

fn payload_text(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string payload>"
    }
}

#[cfg(not(debug_assertions))]
fn report_to_user(info: &PanicHookInfo<'_>, panic_hook: &PanicHook) {
    use human_panic::{handle_dump, metadata, print_msg};

    let metadata = metadata!();
    let dump = handle_dump(&metadata, info);
    if let Err(err) = print_msg(dump, &metadata) {
        eprintln!("human-panic: printing error message to console failed: {err}");
    }
    eprintln!("{}", panic_hook.panic_report(info));
}

#[cfg(debug_assertions)]
fn report_to_user(info: &PanicHookInfo<'_>, _panic_hook: &PanicHook) {
    better_panic::Settings::auto()
        .most_recent_first(false)
        .lineno_suffix(true)
        .verbosity(better_panic::Verbosity::Full)
        .create_panic_handler()(info);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn panic_payloads_are_readable() {
        let literal: Box<dyn Any + Send> = Box::new("field list empty");
        let owned: Box<dyn Any + Send> = Box::new(String::from("store gone"));
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(payload_text(literal.as_ref()), "field list empty");
        assert_eq!(payload_text(owned.as_ref()), "store gone");
        assert_eq!(payload_text(other.as_ref()), "<non-string payload>");
    }
}
