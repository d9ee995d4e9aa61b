use field_gate::prelude::{Notification, PersistenceError, Record};
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum Action {
    Tick,
    Render,
    /// Navigate to a page by id. Form pages use `form/<slug>`, record lists
    /// use the form's success route (e.g. `/harvest/harvest-schedule`).
    Navigate(String),
    Resize(u16, u16),
    Suspend,
    Resume,
    Quit,
    ClearScreen,
    Error(String),

    /// Submit the form on the current page.
    Submit,
    PopupResult(PopupResult),
    ClosePopup,
    /// The dispatched ticket came back from the record store.
    SubmissionFinished(Result<(), PersistenceError>),
    /// Queue a notification dialog.
    Notify(Notification),
    DismissNotification,
    /// Ask the current record list to fetch again.
    Reload,
    RecordsLoaded {
        resource: String,
        result: Result<Vec<Record>, PersistenceError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopupResult {
    Confirmed,
    Cancelled,
}
