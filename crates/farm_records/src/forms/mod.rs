//! The record entry forms of the plantation back office.

pub mod harvest_schedule;
pub mod maintenance;
pub mod yield_record;

use field_gate::prelude::*;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum FormKind {
    HarvestSchedule,
    Maintenance,
    YieldRecord,
}

impl FormKind {
    pub fn slug(&self) -> &'static str {
        match self {
            FormKind::HarvestSchedule => harvest_schedule::SLUG,
            FormKind::Maintenance => maintenance::SLUG,
            FormKind::YieldRecord => yield_record::SLUG,
        }
    }

    pub fn definition(&self) -> Result<FormDefinition, RegistryError> {
        match self {
            FormKind::HarvestSchedule => harvest_schedule::definition(),
            FormKind::Maintenance => maintenance::definition(),
            FormKind::YieldRecord => yield_record::definition(),
        }
    }

    /// Whether the form edits an existing record rather than creating one.
    pub fn edits_existing(&self) -> bool {
        matches!(self, FormKind::YieldRecord)
    }
}

/// Registry with every form kind, validated.
pub fn registry() -> Result<FormRegistry, RegistryError> {
    let mut registry = FormRegistry::new();
    for kind in FormKind::iter() {
        registry.register(kind.definition()?)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn every_kind_registers() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), 3);
        for kind in FormKind::iter() {
            let form = registry.get(kind.slug()).unwrap();
            assert_eq!(form.slug, kind.to_string());
        }
    }

    #[test]
    fn kinds_parse_from_their_slug() {
        assert_eq!(
            FormKind::from_str("harvest-schedule").unwrap(),
            FormKind::HarvestSchedule
        );
        assert_eq!(FormKind::from_str("yield-record").unwrap(), FormKind::YieldRecord);
        assert!(FormKind::from_str("pre-order").is_err());
    }

    #[test]
    fn harvest_fields_form_a_single_chain() {
        let form = harvest_schedule::definition().unwrap();
        let ids: Vec<_> = form.fields().iter().map(|f| f.id).collect();
        assert_eq!(
            ids,
            vec![
                "cropType",
                "harvestDate",
                "startTime",
                "endTime",
                "fieldNumber",
                "numberOfWorkers"
            ]
        );
        for pair in form.fields().windows(2) {
            assert_eq!(pair[1].depends_on, Some(pair[0].id));
        }
    }
}
