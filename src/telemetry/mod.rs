mod service;

pub use service::{ReadingInput, TelemetryService};
