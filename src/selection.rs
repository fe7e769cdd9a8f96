//! Field-level selection rules and picker labels

use serde::Deserialize;

use crate::types::EntityType;
use crate::{PickerError, Result};

/// Size limits of the host field together with its cardinality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionConstraints {
    pub min: Option<usize>,
    pub max: Option<usize>,
    /// `false` for a single-value field
    pub multiple: bool,
}

#[derive(Debug, Deserialize)]
struct FieldValidation {
    size: Option<SizeValidation>,
}

#[derive(Debug, Deserialize)]
struct SizeValidation {
    min: Option<usize>,
    max: Option<usize>,
}

impl SelectionConstraints {
    /// Build from the host field type (`"Array"` or `"Symbol"`) and its
    /// validation list, e.g. `[{"size": {"min": 1, "max": 3}}]`.
    ///
    /// Validation entries other than `size` are ignored.
    pub fn from_field(field_type: &str, validations: &serde_json::Value) -> Result<Self> {
        let validations: Vec<FieldValidation> = serde_json::from_value(validations.clone())
            .map_err(|e| PickerError::Config(format!("unreadable field validations: {e}")))?;

        let mut constraints = Self {
            multiple: field_type == "Array",
            ..Self::default()
        };
        for size in validations.into_iter().filter_map(|validation| validation.size) {
            constraints.min = size.min.or(constraints.min);
            constraints.max = size.max.or(constraints.max);
        }
        Ok(constraints)
    }

    /// Check a prospective selection size
    pub fn validate(&self, count: usize) -> Result<()> {
        if !self.multiple && count > 1 {
            return Err(PickerError::Validation(format!(
                "only one item can be selected, got {count}"
            )));
        }
        if let Some(min) = self.min.filter(|min| count < *min) {
            return Err(PickerError::Validation(format!(
                "at least {min} items must be selected, got {count}"
            )));
        }
        if let Some(max) = self.max.filter(|max| count > *max) {
            return Err(PickerError::Validation(format!(
                "at most {max} items can be selected, got {count}"
            )));
        }
        Ok(())
    }
}

/// Article and noun forms used in picker labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Noun {
    pub prefix: &'static str,
    pub single: &'static str,
    pub multiple: &'static str,
}

const ITEMS: Noun = Noun {
    prefix: "an",
    single: "item",
    multiple: "items",
};

impl EntityType {
    pub fn noun(self) -> Noun {
        match self {
            EntityType::Category => Noun {
                prefix: "a",
                single: "category",
                multiple: "categories",
            },
            EntityType::Collection => Noun {
                prefix: "a",
                single: "collection",
                multiple: "collections",
            },
            EntityType::Product => Noun {
                prefix: "a",
                single: "product",
                multiple: "products",
            },
            EntityType::Variant => Noun {
                prefix: "a",
                single: "variant",
                multiple: "variants",
            },
        }
    }
}

fn noun_for(types: &[EntityType]) -> Noun {
    match types {
        [only] => only.noun(),
        _ => ITEMS,
    }
}

/// Label of the button that opens the picker
pub fn call_to_action(multiple: bool, types: &[EntityType]) -> String {
    let noun = noun_for(types);
    if multiple {
        format!("Select {}", noun.multiple)
    } else {
        format!("Select {} {}", noun.prefix, noun.single)
    }
}

/// Label of the confirm button for `count` selected items
pub fn save_button_text(count: usize, types: &[EntityType]) -> String {
    let noun = noun_for(types);
    match count {
        0 => format!("Save {}", noun.multiple),
        1 => format!("Save 1 {}", noun.single),
        n => format!("Save {n} {}", noun.multiple),
    }
}
