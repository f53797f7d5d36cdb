pub mod agent;
pub mod billing;
pub mod completion;
pub mod front_desk;
pub mod intent;
pub mod manager;
pub mod nurse;
pub mod reception;

pub use agent::Agent;
pub use billing::BillingAgent;
pub use completion::{CompletionClient, GroqCompletionClient};
pub use front_desk::FrontDeskService;
pub use manager::AgentManager;
pub use nurse::NurseAgent;
pub use reception::ReceptionAgent;
