use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use appointment_cell::{Appointment, AppointmentStatus, NewAppointment, SchedulingService};
use directory_cell::{directory_routes, DirectoryError, DirectoryService, DirectoryState};
use identity_cell::{IdentityService, NewAccount, NewUser, ProviderDetails, User};
use review_cell::{Review, ReviewService};
use shared_config::ConflictScope;
use shared_database::{InMemoryStore, SequenceMark};
use shared_utils::test_utils::{TestConfig, TestUser};

struct Fixture {
    directory: Arc<DirectoryService>,
    scheduling: Arc<SchedulingService>,
    reviews: Arc<ReviewService>,
}

fn new_user(username: &str, name: &str, account: NewAccount) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: "secret".to_string(),
        email: format!("{}@example.com", username),
        phone: "555-0100".to_string(),
        name: name.to_string(),
        account,
    }
}

fn provider(business_name: &str, category: &str, address: &str) -> NewAccount {
    NewAccount::Provider(ProviderDetails {
        business_name: business_name.to_string(),
        service_category: category.to_string(),
        address: address.to_string(),
        ..ProviderDetails::default()
    })
}

fn booking(date: &str, time: &str, user_id: i64, provider_id: i64) -> NewAppointment {
    NewAppointment {
        type_key: "spa".to_string(),
        date: date.to_string(),
        time: time.to_string(),
        duration_minutes: 60,
        notes: String::new(),
        user_id,
        provider_id: Some(provider_id),
    }
}

/// Users: 1 consumer "Ana", 2 spa provider with address, 3 salon provider.
/// Appointments with provider 2: 1 completed (past), 2 pending (future),
/// 3 confirmed (future). Ana reviewed appointment 1 with 4 stars.
async fn fixture() -> Fixture {
    let identity = Arc::new(
        IdentityService::load(
            Arc::new(InMemoryStore::<User>::new()),
            Arc::new(InMemoryStore::<SequenceMark>::new()),
        )
        .await
        .unwrap(),
    );
    identity
        .create_user(new_user("ana", "Ana", NewAccount::Consumer))
        .await
        .unwrap();
    identity
        .create_user(new_user("calm", "Cal", provider("Calm Spa", "Spa Treatment", "1 Main St")))
        .await
        .unwrap();
    identity
        .create_user(new_user("cuts", "", provider("Cuts", "Hair Salon", "")))
        .await
        .unwrap();

    let scheduling = Arc::new(
        SchedulingService::load(
            Arc::new(InMemoryStore::<Appointment>::new()),
            Arc::new(InMemoryStore::<SequenceMark>::new()),
            ConflictScope::Global,
        )
        .await
        .unwrap(),
    );
    scheduling.add_appointment(booking("2024-01-10", "10:00", 1, 2)).await.unwrap();
    scheduling.add_appointment(booking("2099-01-10", "10:00", 1, 2)).await.unwrap();
    scheduling.add_appointment(booking("2099-01-11", "10:00", 1, 2)).await.unwrap();
    scheduling
        .update_status(1, AppointmentStatus::Confirmed, Utc::now())
        .await
        .unwrap();
    scheduling
        .update_status(1, AppointmentStatus::Completed, Utc::now())
        .await
        .unwrap();
    scheduling
        .update_status(3, AppointmentStatus::Confirmed, Utc::now())
        .await
        .unwrap();

    let reviews = Arc::new(
        ReviewService::load(Arc::new(InMemoryStore::<Review>::new()))
            .await
            .unwrap(),
    );
    let completed = scheduling.get_appointment(1).await.unwrap();
    reviews.submit_review(&completed, 1, 4, "calming").await.unwrap();

    let directory = Arc::new(DirectoryService::new(identity, scheduling.clone(), reviews.clone()));
    Fixture {
        directory,
        scheduling,
        reviews,
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
}

#[tokio::test]
async fn test_providers_by_category_is_exact() {
    let fixture = fixture().await;

    let spa = fixture.directory.providers_by_category("Spa Treatment").await;
    assert_eq!(spa.len(), 1);
    assert_eq!(spa[0].provider.id, 2);
    assert_eq!(spa[0].average_rating, 4.0);
    assert_eq!(spa[0].total_reviews, 1);

    let salon = fixture.directory.providers_by_category("Hair Salon").await;
    assert_eq!(salon[0].average_rating, 0.0);
    assert_eq!(salon[0].total_reviews, 0);

    assert!(fixture.directory.providers_by_category("spa treatment").await.is_empty());
}

#[tokio::test]
async fn test_provider_profile() {
    let fixture = fixture().await;

    let profile = fixture.directory.provider_profile(2, now()).await.unwrap();
    assert_eq!(profile.total_reviews, 1);
    assert_eq!(profile.upcoming_appointments, 2);
    assert_eq!(profile.reviews[0].reviewer_name, "Ana");
    assert_eq!(profile.reviews[0].appointment_type, "Spa Treatment");

    assert_matches!(
        fixture.directory.provider_profile(1, now()).await,
        Err(DirectoryError::NotAProvider(1))
    );
    assert_matches!(
        fixture.directory.provider_profile(40, now()).await,
        Err(DirectoryError::ProviderNotFound(40))
    );
}

#[tokio::test]
async fn test_review_board_and_public_reviews() {
    let fixture = fixture().await;

    let board = fixture.directory.review_board(1).await;
    assert!(board.received.is_empty());
    assert_eq!(board.written.len(), 1);
    assert_eq!(board.written[0].reviewed_name, "Cal");
    assert_eq!(board.average_rating, 0.0);

    let public = fixture.directory.public_reviews(2).await;
    assert_eq!(public.total_reviews, 1);
    assert_eq!(public.reviews[0].reviewer_name, "Ana");
}

#[tokio::test]
async fn test_missing_names_fall_back() {
    let fixture = fixture().await;
    fixture
        .reviews
        .add_review(review_cell::NewReview {
            appointment_id: 77,
            reviewer_id: 99,
            reviewed_id: 2,
            rating: 2,
            comment: String::new(),
        })
        .await
        .unwrap();

    let public = fixture.directory.public_reviews(2).await;
    assert!(public.reviews.iter().any(|r| r.reviewer_name == "Anonymous"));
    assert_eq!(public.average_rating, 3.0);

    let board = fixture.directory.review_board(2).await;
    let orphan = board.received.iter().find(|r| r.review.reviewer_id == 99).unwrap();
    assert_eq!(orphan.reviewer_name, "Unknown");
    assert_eq!(orphan.appointment_type, "Unknown");
}

#[tokio::test]
async fn test_provider_bookings_split_by_status() {
    let fixture = fixture().await;
    fixture
        .scheduling
        .update_status(2, AppointmentStatus::Declined, Utc::now())
        .await
        .unwrap();

    let bookings = fixture.directory.provider_bookings(2).await.unwrap();
    assert!(bookings.pending.is_empty());
    assert_eq!(bookings.confirmed.len(), 1);
    assert_eq!(bookings.completed.len(), 1);
    assert_eq!(bookings.completed[0].customer_name, "Ana");
    assert_eq!(bookings.completed[0].customer_email, "ana@example.com");
}

#[tokio::test]
async fn test_profile_summary() {
    let fixture = fixture().await;

    let consumer = fixture.directory.profile_summary(1, now()).await.unwrap();
    assert_eq!(consumer.total_appointments, 3);
    assert_eq!(consumer.upcoming_appointments, 2);
    assert_eq!(consumer.past_appointments, 1);
    assert_eq!(consumer.next_appointments.len(), 2);
    assert!(consumer.provider.is_none());

    let provider = fixture.directory.profile_summary(2, now()).await.unwrap();
    let stats = provider.provider.unwrap();
    assert_eq!(stats.total_bookings, 3);
    assert_eq!(stats.pending_bookings, 1);
    assert_eq!(stats.past_bookings, 1);
}

#[tokio::test]
async fn test_bookable_and_located_providers() {
    let fixture = fixture().await;

    let bookable = fixture.directory.bookable_providers().await;
    assert_eq!(bookable.len(), 2);
    assert_eq!(bookable[1].name, "cuts");
    assert_eq!(bookable[0].availability.len(), 7);

    let located = fixture.directory.located_providers().await;
    assert_eq!(located.len(), 1);
    assert_eq!(located[0].address, "1 Main St");
}

#[tokio::test]
async fn test_routes() {
    let fixture = fixture().await;
    let config = TestConfig::default();
    let app = directory_routes(DirectoryState {
        config: config.to_arc(),
        directory: fixture.directory.clone(),
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/providers?category=Spa%20Treatment")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body[0]["business_name"], "Calm Spa");
    assert_eq!(body[0]["total_reviews"], 1);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/providers/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/me/summary").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/me/bookings")
                .header(AUTHORIZATION, TestUser::consumer(1, "ana").bearer(&config))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
