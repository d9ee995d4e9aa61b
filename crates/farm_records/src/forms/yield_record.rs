//! "Edit Yield Record" form. Only used for updates of an existing record.

use field_gate::prelude::*;

pub const SLUG: &str = "yield-record";
pub const RESOURCE: &str = "yield";

pub fn definition() -> Result<FormDefinition, RegistryError> {
    FormDefinition::builder(SLUG, "Edit Yield Record", RESOURCE)
        .description("Correct the quantities of a recorded harvest.")
        .copy(SubmissionCopy {
            confirm: ConfirmPrompt {
                title: "Are you sure?".into(),
                text: "Do you want to update the yield record?".into(),
                confirm_label: "Yes, update it!".into(),
                cancel_label: "No, cancel!".into(),
            },
            success_title: "Success".into(),
            success_message: "Yield Record updated successfully!".into(),
            failure_fallback: "Failed to update yield record.".into(),
            success_route: "/harvest/yield".into(),
        })
        .field(
            FieldSpec::new("cropType", "Crop Type", 0, FieldKind::choice(&["Coconut"]))
                .required("Please select a crop type!"),
        )
        .field(
            FieldSpec::new("harvestdate", "Harvest Date", 1, FieldKind::Date)
                .required("Please select the harvest date!")
                .depends_on("cropType")
                .within(
                    DateBound::DaysAgo(7),
                    DateBound::Today,
                    "Please select a date within the past 7 days.",
                ),
        )
        .field(
            FieldSpec::new(
                "fieldNumber",
                "Field Number",
                2,
                FieldKind::choice(&["AA1", "BB1", "CC1", "DD1"]),
            )
            .required("Please select a field number!")
            .depends_on("harvestdate"),
        )
        .field(
            FieldSpec::new("quantity", "Quantity", 3, FieldKind::Integer)
                .required("Quantity is required!")
                .depends_on("fieldNumber")
                .range(1, i64::MAX, "Quantity must be at least 1!"),
        )
        .field(
            FieldSpec::new("unit", "Unit", 4, FieldKind::choice(&["Kg", "MetricTon"]))
                .required("Please select a unit!")
                .depends_on("quantity"),
        )
        .field(
            FieldSpec::new("treesPicked", "Trees Picked", 5, FieldKind::Integer)
                .required("Please enter the number of trees picked!")
                .depends_on("unit")
                .range(1, 1_000_000, "Trees Picked must be between 1 and 1,000,000!"),
        )
        .field(
            FieldSpec::new(
                "storageLocation",
                "Storage Location",
                6,
                FieldKind::choice(&["LL1", "LL2", "LL3", "LL4"]),
            )
            .required("Please enter the storage location!")
            .depends_on("treesPicked"),
        )
        .build()
}
