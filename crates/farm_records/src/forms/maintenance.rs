//! "Add New Record for Maintenance" form.

use field_gate::prelude::*;

pub const SLUG: &str = "maintenance";
pub const RESOURCE: &str = "maintenance";

const ALPHABETIC: &str = r"^[a-zA-Z\s]*$";
const ALPHABETIC_MESSAGE: &str = "Only alphabetic characters are allowed.";

pub fn definition() -> Result<FormDefinition, RegistryError> {
    FormDefinition::builder(SLUG, "Add New Record for Maintenance", RESOURCE)
        .description("Log a maintenance task and its progress.")
        .copy(SubmissionCopy {
            confirm: ConfirmPrompt {
                title: "Are you sure?".into(),
                text: "Do you want to add this maintenance record?".into(),
                confirm_label: "Yes, add it!".into(),
                cancel_label: "No, cancel!".into(),
            },
            success_title: "Success".into(),
            success_message: "Maintenance record added successfully!".into(),
            failure_fallback: "There was an error adding the maintenance record.".into(),
            success_route: "/maintenance".into(),
        })
        .field(
            FieldSpec::new("dateOfMaintenance", "Date of Maintenance", 0, FieldKind::Date)
                .required("Please select a date of maintenance.")
                .within(
                    DateBound::Unbounded,
                    DateBound::Today,
                    "Please select a date that is not in the future.",
                ),
        )
        .field(
            FieldSpec::new("task", "Task", 1, FieldKind::Text)
                .required("This field is required.")
                .depends_on("dateOfMaintenance")
                .pattern(ALPHABETIC, ALPHABETIC_MESSAGE)?,
        )
        .field(
            FieldSpec::new("managerInCharge", "Manager in Charge", 2, FieldKind::Text)
                .required("This field is required.")
                .depends_on("task")
                .pattern(ALPHABETIC, ALPHABETIC_MESSAGE)?,
        )
        .field(
            FieldSpec::new("progress", "Progress", 3, FieldKind::Integer)
                .required("This field is required.")
                .depends_on("managerInCharge")
                .filter(InputFilter::DigitsWithSuffix('%'))
                .range(0, 100, "Progress must be between 0% and 100%.")
                .help("Percentage, e.g. 40%"),
        )
        .build()
}
