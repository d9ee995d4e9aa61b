//! "Add Harvest Schedule" form.
//!
//! Crop type, date, start, end, field and crew size, each unlocked by the one
//! before it. The harvest date has to fall between today and the end of the
//! current year.

use field_gate::prelude::*;

pub const SLUG: &str = "harvest-schedule";
pub const RESOURCE: &str = "harvest";

pub const CROPS: &[&str] = &["Coconut", "Banana", "Pepper", "Papaya", "Pineapple"];
pub const FIELDS: &[&str] = &["AA1", "BB1", "CC1", "DD1"];

pub fn definition() -> Result<FormDefinition, RegistryError> {
    FormDefinition::builder(SLUG, "Add Harvest Schedule", RESOURCE)
        .description("Schedule a harvest for one field.")
        .copy(SubmissionCopy {
            confirm: ConfirmPrompt {
                title: "Confirmation Required".into(),
                text: "Are you sure you want to submit this harvest schedule?".into(),
                confirm_label: "Yes, submit it!".into(),
                cancel_label: "No, cancel!".into(),
            },
            success_title: "Success".into(),
            success_message: "Harvest Schedule added successfully!".into(),
            failure_fallback: "There was an error adding the harvest schedule.".into(),
            success_route: "/harvest/harvest-schedule".into(),
        })
        .field(
            FieldSpec::new("cropType", "Crop Type", 0, FieldKind::choice(CROPS))
                .required("Please select a crop type!"),
        )
        .field(
            FieldSpec::new("harvestDate", "Harvest Date", 1, FieldKind::Date)
                .required("Please select the harvest date!")
                .depends_on("cropType")
                .within(
                    DateBound::Today,
                    DateBound::EndOfYear,
                    "Please select a date between today and the end of the year.",
                ),
        )
        .field(
            FieldSpec::new("startTime", "Start Time", 2, FieldKind::Time)
                .required("Please select the start time!")
                .depends_on("harvestDate"),
        )
        .field(
            FieldSpec::new("endTime", "End Time", 3, FieldKind::Time)
                .required("Please select the end time!")
                .depends_on("startTime")
                .after("startTime", "End time must be after the start time!"),
        )
        .field(
            FieldSpec::new("fieldNumber", "Field Number", 4, FieldKind::choice(FIELDS))
                .required("Please select a field number!")
                .depends_on("endTime"),
        )
        .field(
            FieldSpec::new("numberOfWorkers", "Number of Workers", 5, FieldKind::Integer)
                .required("Number of workers is required!")
                .depends_on("fieldNumber")
                .range(1, 40, "Number of workers must be between 1 and 40!")
                .help("Between 1 and 40"),
        )
        .build()
}
