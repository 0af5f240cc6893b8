use shared::domain::{Kingdom, Species, SpeciesFields, KINGDOMS};

use crate::{
    error::{FieldError, ValidationErrors},
    fields::{input_for, FieldName, FieldValue},
};

const FIELD_COUNT: usize = FieldName::ALL.len();

/// In-progress form contents: the raw text per field plus the outcome of the
/// last validation of that field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    inputs: [String; FIELD_COUNT],
    results: [Result<FieldValue, FieldError>; FIELD_COUNT],
}

impl FormDraft {
    pub fn from_species(species: &Species) -> Self {
        Self::from_inputs(FieldName::ALL.map(|field| input_for(species, field)))
    }

    /// Empty form for a new record. The kingdom starts on the first choice so the
    /// picker never shows an invalid value.
    pub fn blank() -> Self {
        Self::from_inputs(FieldName::ALL.map(|field| match field {
            FieldName::Kingdom => KINGDOMS[0].as_str().to_string(),
            _ => String::new(),
        }))
    }

    fn from_inputs(inputs: [String; FIELD_COUNT]) -> Self {
        let results = FieldName::ALL.map(|field| (field.spec().validate)(&inputs[field.index()]));
        Self { inputs, results }
    }

    pub fn input(&self, field: FieldName) -> &str {
        &self.inputs[field.index()]
    }

    /// Replaces one field's raw input and re-validates just that field.
    pub fn set(&mut self, field: FieldName, input: impl Into<String>) -> Result<(), FieldError> {
        let input = input.into();
        let result = (field.spec().validate)(&input);
        self.inputs[field.index()] = input;
        self.results[field.index()] = result;
        self.error(field).cloned().map_or(Ok(()), Err)
    }

    pub fn set_kingdom(&mut self, kingdom: Kingdom) {
        self.inputs[FieldName::Kingdom.index()] = kingdom.as_str().to_string();
        self.results[FieldName::Kingdom.index()] = Ok(FieldValue::Kingdom(kingdom));
    }

    pub fn error(&self, field: FieldName) -> Option<&FieldError> {
        self.results[field.index()].as_ref().err()
    }

    pub fn is_valid(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }

    pub fn errors(&self) -> ValidationErrors {
        ValidationErrors(
            FieldName::ALL
                .into_iter()
                .filter_map(|field| self.error(field).map(|err| (field, err.clone())))
                .collect(),
        )
    }

    /// Assembles the normalized record fields, or every field error if any field
    /// fails.
    pub fn build(&self) -> Result<SpeciesFields, ValidationErrors> {
        if !self.is_valid() {
            return Err(self.errors());
        }

        let scientific_name = self
            .value(FieldName::ScientificName)
            .and_then(FieldValue::text)
            .ok_or_else(|| failure(FieldName::ScientificName, FieldError::Required))?;
        let kingdom = self
            .value(FieldName::Kingdom)
            .and_then(FieldValue::kingdom)
            .ok_or_else(|| {
                let input = self.input(FieldName::Kingdom).to_string();
                failure(FieldName::Kingdom, FieldError::UnknownKingdom(input))
            })?;

        Ok(SpeciesFields {
            scientific_name,
            common_name: self.value(FieldName::CommonName).and_then(FieldValue::text),
            kingdom,
            total_population: self
                .value(FieldName::TotalPopulation)
                .and_then(FieldValue::count),
            description: self.value(FieldName::Description).and_then(FieldValue::text),
            image: self.value(FieldName::Image).and_then(FieldValue::text),
        })
    }

    fn value(&self, field: FieldName) -> Option<&FieldValue> {
        self.results[field.index()].as_ref().ok()
    }
}

fn failure(field: FieldName, err: FieldError) -> ValidationErrors {
    ValidationErrors(vec![(field, err)])
}
