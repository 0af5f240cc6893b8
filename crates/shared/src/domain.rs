use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(SpeciesId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kingdom {
    Animalia,
    Plantae,
    Fungi,
    Protista,
    Archaea,
    Bacteria,
}

/// Every kingdom a species may be filed under, in display order.
pub const KINGDOMS: [Kingdom; 6] = [
    Kingdom::Animalia,
    Kingdom::Plantae,
    Kingdom::Fungi,
    Kingdom::Protista,
    Kingdom::Archaea,
    Kingdom::Bacteria,
];

impl Kingdom {
    pub fn as_str(self) -> &'static str {
        match self {
            Kingdom::Animalia => "Animalia",
            Kingdom::Plantae => "Plantae",
            Kingdom::Fungi => "Fungi",
            Kingdom::Protista => "Protista",
            Kingdom::Archaea => "Archaea",
            Kingdom::Bacteria => "Bacteria",
        }
    }
}

impl fmt::Display for Kingdom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown kingdom '{0}'")]
pub struct UnknownKingdom(pub String);

impl FromStr for Kingdom {
    type Err = UnknownKingdom;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        KINGDOMS
            .into_iter()
            .find(|kingdom| kingdom.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownKingdom(trimmed.to_string()))
    }
}

/// The user-editable part of a species record, already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesFields {
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub kingdom: Kingdom,
    pub total_population: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub owner: UserId,
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub kingdom: Kingdom,
    pub total_population: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Species {
    pub fn fields(&self) -> SpeciesFields {
        SpeciesFields {
            scientific_name: self.scientific_name.clone(),
            common_name: self.common_name.clone(),
            kingdom: self.kingdom,
            total_population: self.total_population,
            description: self.description.clone(),
            image: self.image.clone(),
        }
    }

    /// Replaces the editable fields with a committed draft. Identity, owner and
    /// creation time are untouched.
    pub fn apply(&mut self, fields: SpeciesFields) {
        self.scientific_name = fields.scientific_name;
        self.common_name = fields.common_name;
        self.kingdom = fields.kingdom;
        self.total_population = fields.total_population;
        self.description = fields.description;
        self.image = fields.image;
    }

    pub fn is_owned_by(&self, viewer: UserId) -> bool {
        self.owner == viewer
    }
}
