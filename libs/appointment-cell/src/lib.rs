// =====================================================================================
// APPOINTMENT CELL - SCHEDULING ENGINE
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    appointment_type_label, Appointment, AppointmentError, AppointmentStatus,
    ConflictCheckResponse, NewAppointment, SlotQuery, SuggestedSlot, APPOINTMENT_TYPES,
};
pub use router::{appointment_routes, AppointmentState};
pub use services::{AppointmentLifecycleService, ConflictDetectionService, SchedulingService};
