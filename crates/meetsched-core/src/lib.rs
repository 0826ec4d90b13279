//! Core types: meeting requests and results, invitation emails, tracing setup

pub mod invite;
pub mod meeting;
pub mod tracing;

pub use invite::{EmailNotification, SUBJECT_PREFIX, compose_invite};
pub use meeting::{MeetingRequest, MeetingResult, ValidationError, is_valid_email};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
