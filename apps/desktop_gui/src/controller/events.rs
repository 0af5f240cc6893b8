//! UI/backend events and error modeling for the catalog window.

use client_core::{CreateTicket, DeleteTicket, SaveTicket, StoreError};
use shared::{
    domain::{Species, SpeciesId},
    error::{ApiError, ErrorCode},
};

pub enum UiEvent {
    Info(String),
    Error(UiError),
    SpeciesLoaded(Vec<Species>),
    SaveFinished {
        ticket: SaveTicket,
        result: Result<(), StoreError>,
    },
    DeleteFinished {
        ticket: DeleteTicket,
        result: Result<(), StoreError>,
    },
    CreateFinished {
        ticket: CreateTicket,
        result: Result<SpeciesId, StoreError>,
    },
}

impl UiEvent {
    /// Completions clear a card's busy flag, so they must reach the UI.
    pub fn settles_ticket(&self) -> bool {
        matches!(
            self,
            UiEvent::SaveFinished { .. }
                | UiEvent::DeleteFinished { .. }
                | UiEvent::CreateFinished { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Storage,
    Validation,
    Authorization,
    Unknown,
}

impl UiErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Storage => "Storage",
            Self::Validation => "Validation",
            Self::Authorization => "Permission",
            Self::Unknown => "Unexpected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadSpecies,
    SaveSpecies,
    DeleteSpecies,
    CreateSpecies,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("not the owner")
            || message_lower.contains("forbidden")
            || message_lower.contains("no species")
        {
            UiErrorCategory::Authorization
        } else if message_lower.contains("invalid")
            || message_lower.contains("required")
            || message_lower.contains("constraint")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("database")
            || message_lower.contains("sqlite")
            || message_lower.contains("migration")
            || message_lower.contains("pool")
            || message_lower.contains("disconnected")
        {
            UiErrorCategory::Storage
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_api(context: UiErrorContext, err: &ApiError) -> Self {
        let category = match err.code {
            ErrorCode::Forbidden | ErrorCode::NotFound => UiErrorCategory::Authorization,
            ErrorCode::Validation => UiErrorCategory::Validation,
            ErrorCode::Storage | ErrorCode::Busy => UiErrorCategory::Storage,
            ErrorCode::Internal => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.message.clone(),
        }
    }

    /// Startup and load failures leave the window without data, so they get a
    /// sticky banner instead of a toast.
    pub fn wants_banner(&self) -> bool {
        matches!(
            self.context,
            UiErrorContext::BackendStartup | UiErrorContext::LoadSpecies
        )
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
