// libs/directory-cell/src/services/directory.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use appointment_cell::{Appointment, AppointmentStatus, SchedulingService};
use identity_cell::{Account, IdentityService, PublicUser};
use review_cell::{Review, ReviewService};

use crate::models::{
    BookableProvider, BookingView, DetailedReview, DirectoryError, LocatedProvider,
    ProfileSummary, ProviderBookings, ProviderListing, ProviderProfileView, ProviderStats,
    PublicReview, PublicReviews, ReviewBoard, ANONYMOUS_NAME, UNKNOWN_NAME,
};

const NEXT_APPOINTMENTS_LIMIT: usize = 5;

/// Joins the three engines into page-shaped read models. Never writes.
pub struct DirectoryService {
    identity: Arc<IdentityService>,
    scheduling: Arc<SchedulingService>,
    reviews: Arc<ReviewService>,
}

impl DirectoryService {
    pub fn new(
        identity: Arc<IdentityService>,
        scheduling: Arc<SchedulingService>,
        reviews: Arc<ReviewService>,
    ) -> Self {
        Self {
            identity,
            scheduling,
            reviews,
        }
    }

    /// Providers whose category matches exactly, with rating figures.
    pub async fn providers_by_category(&self, category: &str) -> Vec<ProviderListing> {
        debug!("Listing providers in category '{}'", category);

        let mut listings = Vec::new();
        for provider in self.identity.providers().await {
            let matches = provider
                .account
                .provider_profile()
                .is_some_and(|profile| profile.service_category == category);
            if !matches {
                continue;
            }

            let summary = self.reviews.rating_summary(provider.id).await;
            listings.push(ProviderListing {
                provider,
                average_rating: summary.average_rating,
                total_reviews: summary.total_reviews,
            });
        }
        listings
    }

    pub async fn provider_profile(
        &self,
        provider_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ProviderProfileView, DirectoryError> {
        let provider = self.require_provider(provider_id).await?;

        let received = self.reviews.reviews_for(provider_id).await;
        let summary = self.reviews.rating_summary(provider_id).await;
        let mut reviews = self.detail_reviews(received).await;
        reviews.sort_by(|a, b| b.review.created_at.cmp(&a.review.created_at));

        let upcoming_appointments = self
            .scheduling
            .appointments_for_provider(provider_id)
            .await
            .iter()
            .filter(|apt| apt.status.is_active() && apt.datetime >= now)
            .count();

        Ok(ProviderProfileView {
            provider,
            reviews,
            average_rating: summary.average_rating,
            total_reviews: summary.total_reviews,
            upcoming_appointments,
        })
    }

    pub async fn review_board(&self, user_id: i64) -> ReviewBoard {
        let received = self.reviews.reviews_for(user_id).await;
        let written = self.reviews.reviews_by(user_id).await;

        ReviewBoard {
            received: self.detail_reviews(received).await,
            written: self.detail_reviews(written).await,
            average_rating: self.reviews.calculate_average_rating(user_id).await,
        }
    }

    pub async fn public_reviews(&self, user_id: i64) -> PublicReviews {
        let received = self.reviews.reviews_for(user_id).await;
        let summary = self.reviews.rating_summary(user_id).await;

        let mut names = NameCache::default();
        let mut reviews = Vec::with_capacity(received.len());
        for review in received {
            let reviewer_name = names
                .resolve(&self.identity, review.reviewer_id)
                .await
                .unwrap_or_else(|| ANONYMOUS_NAME.to_string());
            reviews.push(PublicReview {
                review,
                reviewer_name,
            });
        }

        PublicReviews {
            reviews,
            average_rating: summary.rounded_average(),
            total_reviews: summary.total_reviews,
        }
    }

    pub async fn provider_bookings(&self, provider_id: i64) -> Result<ProviderBookings, DirectoryError> {
        self.require_provider(provider_id).await?;

        let mut customers: HashMap<i64, Option<PublicUser>> = HashMap::new();
        let mut bookings = ProviderBookings::default();

        for appointment in self.scheduling.appointments_for_provider(provider_id).await {
            let customer = match customers.get(&appointment.user_id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.identity.get_user(appointment.user_id).await;
                    customers.insert(appointment.user_id, fetched.clone());
                    fetched
                }
            };

            let status = appointment.status;
            let view = BookingView {
                customer_name: customer
                    .as_ref()
                    .map(person_name)
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                customer_phone: customer.as_ref().map(|c| c.phone.clone()).unwrap_or_default(),
                customer_email: customer.as_ref().map(|c| c.email.clone()).unwrap_or_default(),
                appointment,
            };

            match status {
                AppointmentStatus::Pending => bookings.pending.push(view),
                AppointmentStatus::Confirmed => bookings.confirmed.push(view),
                AppointmentStatus::Completed => bookings.completed.push(view),
                AppointmentStatus::Declined => {}
            }
        }

        Ok(bookings)
    }

    pub async fn profile_summary(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ProfileSummary, DirectoryError> {
        let user = self
            .identity
            .get_user(user_id)
            .await
            .ok_or(DirectoryError::UserNotFound(user_id))?;

        let booked = self.scheduling.appointments_for_consumer(user_id).await;
        let (upcoming, past) = split_by_time(&booked, now);
        let next_appointments = self
            .scheduling
            .upcoming_for_consumer(user_id, now, NEXT_APPOINTMENTS_LIMIT)
            .await;

        let provider = if user.is_provider() {
            let bookings = self.scheduling.appointments_for_provider(user_id).await;
            let (_, past_bookings) = split_by_time(&bookings, now);
            Some(ProviderStats {
                total_bookings: bookings.len(),
                pending_bookings: bookings
                    .iter()
                    .filter(|apt| apt.status == AppointmentStatus::Pending)
                    .count(),
                past_bookings,
            })
        } else {
            None
        };

        Ok(ProfileSummary {
            user,
            total_appointments: booked.len(),
            upcoming_appointments: upcoming,
            past_appointments: past,
            next_appointments,
            provider,
        })
    }

    pub async fn bookable_providers(&self) -> Vec<BookableProvider> {
        self.identity
            .providers()
            .await
            .into_iter()
            .filter_map(|provider| match provider.account {
                Account::Provider(profile) => Some(BookableProvider {
                    id: provider.id,
                    name: provider.name,
                    business_name: profile.business_name,
                    service_category: profile.service_category,
                    availability: profile.availability,
                }),
                Account::Consumer => None,
            })
            .collect()
    }

    pub async fn located_providers(&self) -> Vec<LocatedProvider> {
        self.identity
            .providers()
            .await
            .into_iter()
            .filter_map(|provider| match provider.account {
                Account::Provider(profile) if !profile.address.is_empty() => Some(LocatedProvider {
                    id: provider.id,
                    business_name: profile.business_name,
                    service_category: profile.service_category,
                    address: profile.address,
                    business_description: profile.business_description,
                    services_offered: profile.services_offered,
                    phone: provider.phone,
                    email: provider.email,
                }),
                _ => None,
            })
            .collect()
    }

    async fn require_provider(&self, provider_id: i64) -> Result<PublicUser, DirectoryError> {
        let user = self
            .identity
            .get_user(provider_id)
            .await
            .ok_or(DirectoryError::ProviderNotFound(provider_id))?;

        if user.is_provider() {
            Ok(user)
        } else {
            Err(DirectoryError::NotAProvider(provider_id))
        }
    }

    async fn detail_reviews(&self, reviews: Vec<Review>) -> Vec<DetailedReview> {
        let mut names = NameCache::default();
        let mut detailed = Vec::with_capacity(reviews.len());

        for review in reviews {
            let reviewer_name = names
                .resolve(&self.identity, review.reviewer_id)
                .await
                .unwrap_or_else(|| UNKNOWN_NAME.to_string());
            let reviewed_name = names
                .resolve(&self.identity, review.reviewed_id)
                .await
                .unwrap_or_else(|| UNKNOWN_NAME.to_string());
            let appointment_type = self
                .scheduling
                .get_appointment(review.appointment_id)
                .await
                .map(|apt| apt.appointment_type)
                .unwrap_or_else(|| UNKNOWN_NAME.to_string());

            detailed.push(DetailedReview {
                review,
                reviewer_name,
                reviewed_name,
                appointment_type,
            });
        }

        detailed
    }
}

#[derive(Default)]
struct NameCache {
    names: HashMap<i64, Option<String>>,
}

impl NameCache {
    async fn resolve(&mut self, identity: &IdentityService, user_id: i64) -> Option<String> {
        if let Some(cached) = self.names.get(&user_id) {
            return cached.clone();
        }
        let name = identity.get_user(user_id).await.map(|user| person_name(&user));
        self.names.insert(user_id, name.clone());
        name
    }
}

/// The display name, or the username when no name was given.
fn person_name(user: &PublicUser) -> String {
    if user.name.is_empty() {
        user.username.clone()
    } else {
        user.name.clone()
    }
}

/// (upcoming, past) counts: strictly after `now` is upcoming.
fn split_by_time(appointments: &[Appointment], now: DateTime<Utc>) -> (usize, usize) {
    let upcoming = appointments.iter().filter(|apt| apt.datetime > now).count();
    (upcoming, appointments.len() - upcoming)
}
