pub mod orchestrator;
pub mod policy;

pub use orchestrator::{InspectionEvent, InspectionOrchestrator, OrchestratorConfig};
pub use policy::PolicyEvaluator;
