//! The document-wide sheet-metal definition and bend-table records.

use serde::{Deserialize, Serialize};

/// Material and tooling values shared by every feature that follows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetMetalDefinition {
    pub thickness: f64,
    /// Inner bend radius.
    pub radius: f64,
    /// Neutral-axis position for unfolding, in `[0, 1]`.
    pub k_factor: f64,
    /// Punch and die used for the bends.
    pub toolset: String,
}

impl SheetMetalDefinition {
    pub fn new(
        thickness: f64,
        radius: f64,
        k_factor: f64,
        toolset: impl Into<String>,
    ) -> Result<Self, DefinitionError> {
        let definition = Self {
            thickness,
            radius,
            k_factor,
            toolset: toolset.into(),
        };
        definition.validate()?;
        Ok(definition)
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        for (field, value) in [("thickness", self.thickness), ("radius", self.radius)] {
            if !(value > 0.0) {
                return Err(DefinitionError::NotPositive { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.k_factor) {
            return Err(DefinitionError::KFactorOutOfRange {
                value: self.k_factor,
            });
        }
        Ok(())
    }
}

/// One record of a bend table.
///
/// Columns: 0 thickness, 2 and 5 toolset halves, 3 radius, 4 k-factor,
/// 6 display label. Column 1 is not used.
#[derive(Debug, Clone, PartialEq)]
pub struct BendTableRow {
    pub thickness: f64,
    pub radius: f64,
    pub k_factor: f64,
    pub toolset: String,
    pub label: String,
}

const LABEL_COLUMN: usize = 6;

impl BendTableRow {
    /// Parse an already split record. Numbers may use a decimal comma.
    pub fn parse<S: AsRef<str>>(fields: &[S]) -> Result<Self, DefinitionError> {
        if fields.len() <= LABEL_COLUMN {
            return Err(DefinitionError::MissingColumns {
                expected: LABEL_COLUMN + 1,
                found: fields.len(),
            });
        }
        let text = |column: usize| fields[column].as_ref().trim();
        let number = |column: usize| {
            parse_decimal(text(column)).ok_or_else(|| DefinitionError::InvalidNumber {
                column,
                text: text(column).to_string(),
            })
        };

        Ok(Self {
            thickness: number(0)?,
            radius: number(3)?,
            k_factor: number(4)?,
            toolset: format!("{}{}", text(2), text(5)),
            label: text(LABEL_COLUMN).to_string(),
        })
    }

    pub fn to_definition(&self) -> Result<SheetMetalDefinition, DefinitionError> {
        SheetMetalDefinition::new(
            self.thickness,
            self.radius,
            self.k_factor,
            self.toolset.clone(),
        )
    }
}

fn parse_decimal(text: &str) -> Option<f64> {
    text.replace(',', ".").parse().ok()
}

/// Errors from definition values and bend-table records.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("k-factor must be within [0, 1], got {value}")]
    KFactorOutOfRange { value: f64 },

    #[error("bend table row has {found} columns, expected at least {expected}")]
    MissingColumns { expected: usize, found: usize },

    #[error("column {column}: {text:?} is not a number")]
    InvalidNumber { column: usize, text: String },
}
