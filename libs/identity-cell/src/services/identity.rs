// libs/identity-cell/src/services/identity.rs
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use shared_database::{CollectionStore, IdSequence, SequenceMark};

use crate::models::{
    default_weekly_availability, Account, GalleryImage, IdentityError, NewAccount,
    NewGalleryImage, NewUser, ProfileUpdate, ProviderDetails, ProviderProfile, PublicUser, User,
    WeeklyAvailability,
};
use crate::services::password::PasswordService;
use crate::services::validation::{
    validate_availability, validate_email, validate_gallery_image, validate_registration,
};

/// Owns the user collection. Every mutation runs clone-modify-save-commit
/// under the collection lock, so memory only changes once the store has
/// accepted the write.
pub struct IdentityService {
    store: Arc<dyn CollectionStore<User>>,
    users: Mutex<Vec<User>>,
    ids: IdSequence,
}

impl IdentityService {
    /// `ids` holds the user id high-water mark, so a deleted account's id
    /// is never handed to a later registration.
    pub async fn load(
        store: Arc<dyn CollectionStore<User>>,
        ids: Arc<dyn CollectionStore<SequenceMark>>,
    ) -> Result<Self, IdentityError> {
        let users = store.load().await?;
        let highest = users.iter().map(|u| u.id).max().unwrap_or(0);
        let ids = IdSequence::load(ids, highest).await?;
        info!("Identity store loaded with {} users", users.len());

        Ok(Self {
            store,
            users: Mutex::new(users),
            ids,
        })
    }

    /// Register a new account. Username uniqueness is case-insensitive and
    /// only checked here.
    pub async fn create_user(&self, new_user: NewUser) -> Result<PublicUser, IdentityError> {
        let account = match new_user.account {
            NewAccount::Consumer => NewAccount::Consumer,
            NewAccount::Provider(details) => NewAccount::Provider(ProviderDetails {
                business_name: details.business_name.trim().to_string(),
                business_description: details.business_description.trim().to_string(),
                service_category: details.service_category.trim().to_string(),
                services_offered: details.services_offered.trim().to_string(),
                address: details.address.trim().to_string(),
                availability: details.availability,
            }),
        };
        let new_user = NewUser {
            username: new_user.username.trim().to_string(),
            email: new_user.email.trim().to_string(),
            phone: new_user.phone.trim().to_string(),
            name: new_user.name.trim().to_string(),
            password: new_user.password,
            account,
        };
        debug!("Creating user: {}", new_user.username);

        validate_registration(&new_user)?;

        let password_hash = PasswordService::hash_password(&new_user.password)
            .map_err(|e| IdentityError::PasswordHash(e.to_string()))?;

        let account = match new_user.account {
            NewAccount::Consumer => Account::Consumer,
            NewAccount::Provider(details) => Account::Provider(ProviderProfile {
                business_name: details.business_name,
                business_description: details.business_description,
                service_category: details.service_category,
                services_offered: details.services_offered,
                address: details.address,
                availability: details
                    .availability
                    .unwrap_or_else(default_weekly_availability),
                gallery: Vec::new(),
            }),
        };

        let name = if new_user.name.is_empty() {
            new_user.username.clone()
        } else {
            new_user.name
        };

        let mut users = self.users.lock().await;

        let lowered = new_user.username.to_lowercase();
        if users.iter().any(|u| u.username.to_lowercase() == lowered) {
            warn!("Registration rejected, username taken: {}", new_user.username);
            return Err(IdentityError::UsernameTaken(new_user.username));
        }

        let user = User {
            id: self.ids.next_id().await?,
            username: new_user.username,
            password_hash,
            email: new_user.email,
            phone: new_user.phone,
            name,
            profile_picture: String::new(),
            created_at: Utc::now(),
            account,
        };
        let public = PublicUser::from(&user);

        let mut working = users.clone();
        working.push(user);
        self.store.save(&working).await?;
        *users = working;

        info!("User {} created with role {}", public.id, public.role());
        Ok(public)
    }

    /// Returns the sanitized user when the credentials match, `None` otherwise.
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<PublicUser> {
        let lowered = username.trim().to_lowercase();
        let candidate = {
            let users = self.users.lock().await;
            users
                .iter()
                .find(|u| u.username.to_lowercase() == lowered)
                .cloned()
        };

        let user = candidate?;
        match PasswordService::verify_password(password, &user.password_hash) {
            Ok(true) => {
                debug!("User {} authenticated", user.id);
                Some(PublicUser::from(&user))
            }
            Ok(false) => None,
            Err(e) => {
                warn!("Stored password hash for user {} is unreadable: {}", user.id, e);
                None
            }
        }
    }

    pub async fn get_user(&self, user_id: i64) -> Option<PublicUser> {
        let users = self.users.lock().await;
        users.iter().find(|u| u.id == user_id).map(PublicUser::from)
    }

    pub async fn providers(&self) -> Vec<PublicUser> {
        let users = self.users.lock().await;
        users
            .iter()
            .filter(|u| matches!(u.account, Account::Provider(_)))
            .map(PublicUser::from)
            .collect()
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        update: ProfileUpdate,
    ) -> Result<PublicUser, IdentityError> {
        if let Some(email) = &update.email {
            validate_email(email.trim())?;
        }

        self.mutate_user(user_id, |user| {
            if let Some(name) = update.name {
                user.name = name.trim().to_string();
            }
            if let Some(email) = update.email {
                user.email = email.trim().to_string();
            }
            if let Some(phone) = update.phone {
                user.phone = phone.trim().to_string();
            }
            if let Some(picture) = update.profile_picture {
                user.profile_picture = picture;
            }

            match (&mut user.account, update.provider) {
                (Account::Provider(profile), Some(changes)) => {
                    if let Some(value) = changes.business_name {
                        profile.business_name = value.trim().to_string();
                    }
                    if let Some(value) = changes.business_description {
                        profile.business_description = value.trim().to_string();
                    }
                    if let Some(value) = changes.service_category {
                        profile.service_category = value.trim().to_string();
                    }
                    if let Some(value) = changes.services_offered {
                        profile.services_offered = value.trim().to_string();
                    }
                    if let Some(value) = changes.address {
                        profile.address = value.trim().to_string();
                    }
                }
                (Account::Consumer, Some(_)) => {
                    debug!("Ignoring provider fields for consumer {}", user.id);
                }
                (_, None) => {}
            }
            Ok(())
        })
        .await
    }

    pub async fn update_availability(
        &self,
        user_id: i64,
        availability: WeeklyAvailability,
    ) -> Result<PublicUser, IdentityError> {
        validate_availability(&availability)?;

        self.mutate_user(user_id, |user| match &mut user.account {
            Account::Provider(profile) => {
                profile.availability = availability;
                Ok(())
            }
            Account::Consumer => Err(IdentityError::NotAProvider(user.id)),
        })
        .await
    }

    pub async fn add_gallery_image(
        &self,
        user_id: i64,
        image: NewGalleryImage,
        now: DateTime<Utc>,
    ) -> Result<GalleryImage, IdentityError> {
        let extension = validate_gallery_image(&image)?;
        let data = format!("data:image/{};base64,{}", extension, STANDARD.encode(&image.bytes));

        let mut added = None;
        self.mutate_user(user_id, |user| match &mut user.account {
            Account::Provider(profile) => {
                let gallery_image = GalleryImage {
                    id: profile.gallery.iter().map(|img| img.id).max().unwrap_or(0) + 1,
                    filename: image.filename,
                    data,
                    uploaded_at: now,
                    description: image.description.trim().to_string(),
                };
                profile.gallery.push(gallery_image.clone());
                added = Some(gallery_image);
                Ok(())
            }
            Account::Consumer => Err(IdentityError::NotAProvider(user.id)),
        })
        .await?;

        added.ok_or(IdentityError::NotAProvider(user_id))
    }

    pub async fn remove_gallery_image(
        &self,
        user_id: i64,
        image_id: i64,
    ) -> Result<PublicUser, IdentityError> {
        self.mutate_user(user_id, |user| match &mut user.account {
            Account::Provider(profile) => {
                let before = profile.gallery.len();
                profile.gallery.retain(|img| img.id != image_id);
                if profile.gallery.len() == before {
                    return Err(IdentityError::ImageNotFound(image_id));
                }
                Ok(())
            }
            Account::Consumer => Err(IdentityError::NotAProvider(user.id)),
        })
        .await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<PublicUser, IdentityError> {
        let mut users = self.users.lock().await;

        let position = users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or(IdentityError::NotFound(user_id))?;

        let mut working = users.clone();
        let removed = working.remove(position);
        self.store.save(&working).await?;
        *users = working;

        info!("User {} deleted", user_id);
        Ok(PublicUser::from(&removed))
    }

    /// Apply `change` to one user and persist the collection. A failing
    /// closure or save leaves the in-memory copy untouched.
    async fn mutate_user<F>(&self, user_id: i64, change: F) -> Result<PublicUser, IdentityError>
    where
        F: FnOnce(&mut User) -> Result<(), IdentityError>,
    {
        let mut users = self.users.lock().await;
        let mut working = users.clone();

        let user = working
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(IdentityError::NotFound(user_id))?;
        change(user)?;
        let public = PublicUser::from(&*user);

        self.store.save(&working).await?;
        *users = working;

        debug!("User {} updated", user_id);
        Ok(public)
    }
}
