//! Field table for the species form: one row per editable column, each with the
//! validator that normalizes its raw text input. Renderers and the draft both walk
//! [`SPECIES_FIELDS`] instead of knowing fields individually.

use shared::domain::{Kingdom, Species, KINGDOMS};
use url::Url;

use crate::error::FieldError;

pub const MIN_POPULATION: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    ScientificName,
    CommonName,
    Kingdom,
    TotalPopulation,
    Description,
    Image,
}

impl FieldName {
    pub const ALL: [FieldName; 6] = [
        FieldName::ScientificName,
        FieldName::CommonName,
        FieldName::Kingdom,
        FieldName::TotalPopulation,
        FieldName::Description,
        FieldName::Image,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static FieldSpec {
        &SPECIES_FIELDS[self.index()]
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }
}

/// Widget hint for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput {
    SingleLine,
    MultiLine,
    Choice(&'static [Kingdom]),
    Count,
}

/// A normalized field value produced by a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    OptionalText(Option<String>),
    Kingdom(Kingdom),
    Count(Option<i64>),
}

impl FieldValue {
    /// Text content of a text field; `None` for blanks and non-text values.
    pub fn text(&self) -> Option<String> {
        match self {
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::OptionalText(text) => text.clone(),
            _ => None,
        }
    }

    pub fn kingdom(&self) -> Option<Kingdom> {
        match self {
            FieldValue::Kingdom(kingdom) => Some(*kingdom),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<i64> {
        match self {
            FieldValue::Count(count) => *count,
            _ => None,
        }
    }
}

pub type Validator = fn(&str) -> Result<FieldValue, FieldError>;

pub struct FieldSpec {
    pub name: FieldName,
    pub label: &'static str,
    pub input: FieldInput,
    pub required: bool,
    pub validate: Validator,
}

pub static SPECIES_FIELDS: [FieldSpec; 6] = [
    FieldSpec {
        name: FieldName::ScientificName,
        label: "Scientific Name",
        input: FieldInput::SingleLine,
        required: true,
        validate: required_text,
    },
    FieldSpec {
        name: FieldName::CommonName,
        label: "Common Name",
        input: FieldInput::SingleLine,
        required: false,
        validate: optional_text,
    },
    FieldSpec {
        name: FieldName::Kingdom,
        label: "Kingdom",
        input: FieldInput::Choice(&KINGDOMS),
        required: true,
        validate: kingdom,
    },
    FieldSpec {
        name: FieldName::TotalPopulation,
        label: "Total Population",
        input: FieldInput::Count,
        required: false,
        validate: population,
    },
    FieldSpec {
        name: FieldName::Description,
        label: "Description",
        input: FieldInput::MultiLine,
        required: false,
        validate: optional_text,
    },
    FieldSpec {
        name: FieldName::Image,
        label: "Image URL",
        input: FieldInput::SingleLine,
        required: false,
        validate: image_url,
    },
];

/// Raw text a form shows for `field` when editing `species`.
pub fn input_for(species: &Species, field: FieldName) -> String {
    match field {
        FieldName::ScientificName => species.scientific_name.clone(),
        FieldName::CommonName => species.common_name.clone().unwrap_or_default(),
        FieldName::Kingdom => species.kingdom.as_str().to_string(),
        FieldName::TotalPopulation => species
            .total_population
            .map(|count| count.to_string())
            .unwrap_or_default(),
        FieldName::Description => species.description.clone().unwrap_or_default(),
        FieldName::Image => species.image.clone().unwrap_or_default(),
    }
}

/// Trims and maps blank input to `None`.
pub fn normalize_optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required_text(raw: &str) -> Result<FieldValue, FieldError> {
    normalize_optional(raw)
        .map(FieldValue::Text)
        .ok_or(FieldError::Required)
}

fn optional_text(raw: &str) -> Result<FieldValue, FieldError> {
    Ok(FieldValue::OptionalText(normalize_optional(raw)))
}

fn kingdom(raw: &str) -> Result<FieldValue, FieldError> {
    raw.parse::<Kingdom>()
        .map(FieldValue::Kingdom)
        .map_err(|err| FieldError::UnknownKingdom(err.0))
}

fn population(raw: &str) -> Result<FieldValue, FieldError> {
    let Some(trimmed) = normalize_optional(raw) else {
        return Ok(FieldValue::Count(None));
    };
    let count = trimmed
        .parse::<i64>()
        .map_err(|_| FieldError::NotAnInteger(trimmed.clone()))?;
    if count < MIN_POPULATION {
        return Err(FieldError::BelowMinimum {
            min: MIN_POPULATION,
        });
    }
    Ok(FieldValue::Count(Some(count)))
}

fn image_url(raw: &str) -> Result<FieldValue, FieldError> {
    let Some(trimmed) = normalize_optional(raw) else {
        return Ok(FieldValue::OptionalText(None));
    };
    Url::parse(&trimmed).map_err(|err| FieldError::InvalidUrl {
        input: trimmed.clone(),
        reason: err.to_string(),
    })?;
    Ok(FieldValue::OptionalText(Some(trimmed)))
}
