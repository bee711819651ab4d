//! Request and Response models for the clinical API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! deserializing query strings and serializing response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{validate_namespace, AdultQuery, AgeQuery, ChildQuery, PregnancyQuery};
pub use responses::{
    AdultAssessmentResponse, AgeResponse, BumpResponse, ChildAssessmentResponse, HealthResponse,
    Indicator,
};
