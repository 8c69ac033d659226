//! Backend commands queued from UI to backend worker.

use client_core::{LocateTicket, PredictionTicket};

#[derive(Debug)]
pub enum BackendCommand {
    Predict(PredictionTicket),
    Locate(LocateTicket),
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Predict(_) => "predict",
            BackendCommand::Locate(_) => "locate",
        }
    }
}
