// policyguard-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts the application depends on (RuleExtractor...)
pub mod ports;

// 2. Domain (business core)
// Transaction table, rule engine, anomaly detection, risk scoring.
// Depends on nothing else (no infra, no app).
pub mod domain;

// 3. Infrastructure (Adapters)
// Technical implementations (CSV IO, Gemini client, PDF report, config files).
// Depends on Domain and Ports.
pub mod infrastructure;

// 4. Application (Use Cases)
// Orchestration (pipeline, export).
// Depends on Domain, Infra and Ports.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// Lets callers import the main error easily: use policyguard_core::PolicyGuardError;
pub use error::PolicyGuardError;
