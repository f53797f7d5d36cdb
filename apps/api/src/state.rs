use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use appointment_cell::services::{
    AppointmentBookingService, AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore,
};
use chat_cell::handlers::ChatState;
use chat_cell::services::{AgentManager, CompletionClient, FrontDeskService, GroqCompletionClient};
use doctor_cell::services::{DoctorService, DoctorStore, InMemoryDoctorStore, SupabaseDoctorStore};
use patient_cell::services::{InMemoryPatientStore, PatientService, PatientStore, SupabasePatientStore};
use shared_config::AppConfig;
use shared_database::SupabaseClient;

/// Every service the routers need, built once at startup.
pub struct AppState {
    pub supabase: Option<Arc<SupabaseClient>>,
    pub doctors: Arc<DoctorService>,
    pub patients: Arc<PatientService>,
    pub appointments: Arc<AppointmentBookingService>,
    pub chat: Arc<ChatState>,
}

struct Stores {
    doctors: Arc<dyn DoctorStore>,
    patients: Arc<dyn PatientStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl AppState {
    pub async fn initialize(config: &AppConfig) -> anyhow::Result<Self> {
        let (supabase, stores) = if config.is_configured() {
            let client = Arc::new(SupabaseClient::new(config).context("failed to build Supabase client")?);

            match client.health_check().await {
                Ok(()) => info!("Connected to Supabase at {}", client.get_base_url()),
                Err(e) => warn!("Supabase health check failed, continuing: {}", e),
            }

            let stores = Stores {
                doctors: Arc::new(SupabaseDoctorStore::new(Arc::clone(&client))),
                patients: Arc::new(SupabasePatientStore::new(Arc::clone(&client))),
                appointments: Arc::new(SupabaseAppointmentStore::new(Arc::clone(&client))),
            };
            (Some(client), stores)
        } else {
            info!("Using in-memory stores");
            let stores = Stores {
                doctors: Arc::new(InMemoryDoctorStore::new()),
                patients: Arc::new(InMemoryPatientStore::new()),
                appointments: Arc::new(InMemoryAppointmentStore::new()),
            };
            (None, stores)
        };

        let completion: Option<Arc<dyn CompletionClient>> = if config.is_llm_configured() {
            let client = GroqCompletionClient::new(config).context("failed to build completion client")?;
            Some(Arc::new(client))
        } else {
            warn!("Chat agents will answer from canned replies only");
            None
        };

        let doctors = Arc::new(DoctorService::new(Arc::clone(&stores.doctors)));
        let patients = Arc::new(PatientService::new(Arc::clone(&stores.patients)));
        let appointments = Arc::new(AppointmentBookingService::new(
            stores.doctors,
            stores.patients,
            stores.appointments,
        ));

        let chat = Arc::new(ChatState {
            manager: Arc::new(AgentManager::new(Arc::clone(&doctors), completion)),
            front_desk: Arc::new(FrontDeskService::new(Arc::clone(&patients), Arc::clone(&appointments))),
        });

        Ok(Self {
            supabase,
            doctors,
            patients,
            appointments,
            chat,
        })
    }

    /// Drop the services, then close the PostgREST client if nothing else
    /// still holds it.
    pub fn shutdown(self) {
        let AppState { supabase, doctors, patients, appointments, chat } = self;
        drop((doctors, patients, appointments, chat));

        if let Some(client) = supabase {
            match Arc::try_unwrap(client) {
                Ok(client) => client.shutdown(),
                Err(_) => warn!("Supabase client still referenced at shutdown"),
            }
        }
        info!("Shutdown complete");
    }
}
