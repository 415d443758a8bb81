//! Organization infrastructure implementations

mod repository;

pub use repository::InMemoryOrganizationRepository;
