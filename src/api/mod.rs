//! API Module
//!
//! HTTP handlers and routing for the clinical REST API.
//!
//! # Endpoints
//! - `GET /api/clinical/child` - Growth indicators for a child measurement
//! - `GET /api/clinical/adult` - BMI, blood pressure, MUAC and waist risk
//! - `GET /api/clinical/pregnancy` - Gestational age, trimester and due date
//! - `GET /api/clinical/age` - Age in months and years
//! - `POST /api/cache/:namespace/bump` - Invalidate a cache namespace
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
