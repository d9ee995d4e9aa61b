//! Form definitions and the registry of all forms of an application.
//!
//! A `FormDefinition` groups the ordered `FieldSpec`s of one form together with
//! the copy used around submission (confirmation prompt, notifications, the
//! route to navigate to afterwards).
//!
//! Building a definition validates the field graph. Every problem found here is
//! a programming defect in the form declaration and is reported once at
//! startup, never per user action:
//! - duplicate field ids or positions
//! - a `depends_on` naming an unknown field, the field itself, or forming a cycle
//! - a dependency whose position is not strictly before the dependent field
//! - cross-field rules naming unknown or incomparable fields
//!
//! Typical usage:
//! ```ignore
//! let form = FormDefinition::builder("shift", "Add Shift", "shifts")
//!     .field(FieldSpec::new("start", "Start", 0, FieldKind::Time).required("required"))
//!     .field(FieldSpec::new("end", "End", 1, FieldKind::Time)
//!         .required("required")
//!         .depends_on("start")
//!         .after("start", "End must follow start"))
//!     .build()?;
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::field::{FieldKind, FieldSpec};
use crate::notify::ConfirmPrompt;
use crate::rules::{Relation, ValidationRule};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("form `{0}` declares no fields")]
    EmptyForm(&'static str),

    #[error("form `{form}`: duplicate field id `{field}`")]
    DuplicateField {
        form: &'static str,
        field: &'static str,
    },

    #[error("form `{form}`: fields `{first}` and `{second}` share position {order}")]
    DuplicateOrder {
        form: &'static str,
        order: u32,
        first: &'static str,
        second: &'static str,
    },

    #[error("form `{form}`: field `{field}` depends on unknown field `{depends_on}`")]
    MissingDependency {
        form: &'static str,
        field: &'static str,
        depends_on: &'static str,
    },

    #[error("form `{form}`: dependency cycle {}", path.join(" -> "))]
    DependencyCycle {
        form: &'static str,
        path: Vec<&'static str>,
    },

    #[error(
        "form `{form}`: field `{field}` must be positioned after its dependency `{depends_on}`"
    )]
    OrderNotIncreasing {
        form: &'static str,
        field: &'static str,
        depends_on: &'static str,
    },

    #[error("form `{form}`: field `{field}` compares against unknown field `{other}`")]
    UnknownCrossReference {
        form: &'static str,
        field: &'static str,
        other: &'static str,
    },

    #[error("form `{form}`: field `{field}` cannot be ordered against `{other}`")]
    IncompatibleCrossReference {
        form: &'static str,
        field: &'static str,
        other: &'static str,
    },

    #[error("field `{field}`: invalid pattern: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("form `{0}` registered twice")]
    DuplicateForm(&'static str),
}

/// Copy shown around a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionCopy {
    pub confirm: ConfirmPrompt,
    pub success_title: String,
    pub success_message: String,
    /// Generic message shown in front of the remote failure reason.
    pub failure_fallback: String,
    /// Where the caller navigates after a successful submission.
    pub success_route: String,
}

impl Default for SubmissionCopy {
    fn default() -> Self {
        Self {
            confirm: ConfirmPrompt::default(),
            success_title: "Success".into(),
            success_message: "Record saved successfully!".into(),
            failure_fallback: "Please try again.".into(),
            success_route: "/".into(),
        }
    }
}

/// Validated, immutable definition of one form.
#[derive(Debug)]
pub struct FormDefinition {
    pub slug: &'static str,
    pub title: &'static str,
    /// REST resource the records of this form belong to.
    pub resource: &'static str,
    pub description: Option<String>,
    pub copy: SubmissionCopy,
    fields: Vec<FieldSpec>,
    index: HashMap<&'static str, usize>,
}

impl FormDefinition {
    pub fn builder(
        slug: &'static str,
        title: &'static str,
        resource: &'static str,
    ) -> FormDefinitionBuilder {
        FormDefinitionBuilder {
            slug,
            title,
            resource,
            description: None,
            copy: SubmissionCopy::default(),
            fields: Vec::new(),
        }
    }

    /// Fields sorted by position.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.index.get(id).map(|&i| &self.fields[i])
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Position of a field in `fields()`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Whether `ancestor` appears on `id`'s dependency chain.
    pub fn chain_includes(&self, id: &str, ancestor: &str) -> bool {
        let mut cursor = self.field(id).and_then(|f| f.depends_on);
        while let Some(dep) = cursor {
            if dep == ancestor {
                return true;
            }
            cursor = self.field(dep).and_then(|f| f.depends_on);
        }
        false
    }
}

pub struct FormDefinitionBuilder {
    slug: &'static str,
    title: &'static str,
    resource: &'static str,
    description: Option<String>,
    copy: SubmissionCopy,
    fields: Vec<FieldSpec>,
}

impl FormDefinitionBuilder {
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn copy(mut self, copy: SubmissionCopy) -> Self {
        self.copy = copy;
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate the field graph and freeze the definition.
    pub fn build(self) -> Result<FormDefinition, RegistryError> {
        let form = self.slug;
        if self.fields.is_empty() {
            return Err(RegistryError::EmptyForm(form));
        }

        let mut fields = self.fields;
        fields.sort_by_key(|f| f.order);

        let mut index = HashMap::with_capacity(fields.len());
        for (i, f) in fields.iter().enumerate() {
            if index.insert(f.id, i).is_some() {
                return Err(RegistryError::DuplicateField { form, field: f.id });
            }
        }
        for pair in fields.windows(2) {
            if pair[0].order == pair[1].order {
                return Err(RegistryError::DuplicateOrder {
                    form,
                    order: pair[0].order,
                    first: pair[0].id,
                    second: pair[1].id,
                });
            }
        }

        for f in &fields {
            if let Some(dep) = f.depends_on {
                if !index.contains_key(dep) {
                    return Err(RegistryError::MissingDependency {
                        form,
                        field: f.id,
                        depends_on: dep,
                    });
                }
            }
        }

        check_cycles(form, &fields, &index)?;

        for f in &fields {
            if let Some(dep) = f.depends_on {
                let dep_order = fields[index[dep]].order;
                if dep_order >= f.order {
                    return Err(RegistryError::OrderNotIncreasing {
                        form,
                        field: f.id,
                        depends_on: dep,
                    });
                }
            }
        }

        for f in &fields {
            for rule in &f.rules {
                let ValidationRule::CrossField { other, relation, .. } = rule else {
                    continue;
                };
                let Some(&j) = index.get(other) else {
                    return Err(RegistryError::UnknownCrossReference {
                        form,
                        field: f.id,
                        other: *other,
                    });
                };
                if *other == f.id || !comparable(&f.kind, &fields[j].kind, *relation) {
                    return Err(RegistryError::IncompatibleCrossReference {
                        form,
                        field: f.id,
                        other: *other,
                    });
                }
            }
        }

        debug!(form, fields = fields.len(), "form definition validated");

        Ok(FormDefinition {
            slug: self.slug,
            title: self.title,
            resource: self.resource,
            description: self.description,
            copy: self.copy,
            fields,
            index,
        })
    }
}

fn check_cycles(
    form: &'static str,
    fields: &[FieldSpec],
    index: &HashMap<&'static str, usize>,
) -> Result<(), RegistryError> {
    for start in fields {
        let mut path = vec![start.id];
        let mut seen = HashSet::from([start.id]);
        let mut cursor = start.depends_on;
        while let Some(dep) = cursor {
            path.push(dep);
            if !seen.insert(dep) {
                return Err(RegistryError::DependencyCycle { form, path });
            }
            cursor = index.get(dep).and_then(|&i| fields[i].depends_on);
        }
    }
    Ok(())
}

/// Ordering relations need the same kind; text and choice values only compare
/// for equality.
fn comparable(a: &FieldKind, b: &FieldKind, relation: Relation) -> bool {
    use FieldKind::*;
    match (a, b) {
        (Date, Date) | (Time, Time) | (Integer, Integer) => true,
        (Text | Choice { .. }, Text | Choice { .. }) => relation == Relation::NotSame,
        _ => false,
    }
}

/// All forms of an application, keyed by slug.
#[derive(Debug, Default)]
pub struct FormRegistry {
    forms: Vec<Arc<FormDefinition>>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, form: FormDefinition) -> Result<(), RegistryError> {
        if self.get(form.slug).is_some() {
            return Err(RegistryError::DuplicateForm(form.slug));
        }
        self.forms.push(Arc::new(form));
        Ok(())
    }

    pub fn get(&self, slug: &str) -> Option<Arc<FormDefinition>> {
        self.forms.iter().find(|f| f.slug == slug).cloned()
    }

    /// Forms in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<FormDefinition>> {
        self.forms.iter()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}
