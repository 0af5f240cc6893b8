//! Backend commands queued from UI to backend worker.

use client_core::{CreateTicket, DeleteTicket, SaveTicket};

pub enum BackendCommand {
    LoadSpecies,
    SaveSpecies(SaveTicket),
    DeleteSpecies(DeleteTicket),
    CreateSpecies(CreateTicket),
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadSpecies => "load_species",
            Self::SaveSpecies(_) => "save_species",
            Self::DeleteSpecies(_) => "delete_species",
            Self::CreateSpecies(_) => "create_species",
        }
    }
}
