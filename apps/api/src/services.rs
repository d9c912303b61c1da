// apps/api/src/services.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use appointment_cell::{Appointment, SchedulingService};
use directory_cell::DirectoryService;
use identity_cell::{IdentityService, User};
use review_cell::{Review, ReviewService};
use shared_config::AppConfig;
use shared_database::{CollectionStore, JsonFileStore, SequenceMark};

/// The persistence ports behind the engines.
pub struct CollectionStores {
    pub users: Arc<dyn CollectionStore<User>>,
    pub user_ids: Arc<dyn CollectionStore<SequenceMark>>,
    pub appointments: Arc<dyn CollectionStore<Appointment>>,
    pub appointment_ids: Arc<dyn CollectionStore<SequenceMark>>,
    pub reviews: Arc<dyn CollectionStore<Review>>,
}

/// Every engine the API serves, each loaded from its own collection.
#[derive(Clone)]
pub struct AppServices {
    pub identity: Arc<IdentityService>,
    pub scheduling: Arc<SchedulingService>,
    pub reviews: Arc<ReviewService>,
    pub directory: Arc<DirectoryService>,
}

impl AppServices {
    /// Opens the JSON collections under the configured data directory.
    pub async fn open(config: &AppConfig) -> Result<Self> {
        info!("Opening data directory {}", config.data_dir.display());

        Self::from_stores(
            config,
            CollectionStores {
                users: Arc::new(JsonFileStore::<User>::new(config.users_path())),
                user_ids: Arc::new(JsonFileStore::<SequenceMark>::new(config.user_ids_path())),
                appointments: Arc::new(JsonFileStore::<Appointment>::new(
                    config.appointments_path(),
                )),
                appointment_ids: Arc::new(JsonFileStore::<SequenceMark>::new(
                    config.appointment_ids_path(),
                )),
                reviews: Arc::new(JsonFileStore::<Review>::new(config.reviews_path())),
            },
        )
        .await
    }

    pub async fn from_stores(config: &AppConfig, stores: CollectionStores) -> Result<Self> {
        let identity = Arc::new(
            IdentityService::load(stores.users, stores.user_ids)
                .await
                .context("failed to load users")?,
        );
        let scheduling = Arc::new(
            SchedulingService::load(
                stores.appointments,
                stores.appointment_ids,
                config.conflict_scope,
            )
            .await
            .context("failed to load appointments")?,
        );
        let reviews = Arc::new(
            ReviewService::load(stores.reviews)
                .await
                .context("failed to load reviews")?,
        );
        let directory = Arc::new(DirectoryService::new(
            identity.clone(),
            scheduling.clone(),
            reviews.clone(),
        ));

        Ok(Self {
            identity,
            scheduling,
            reviews,
            directory,
        })
    }
}
