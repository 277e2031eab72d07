// src/sessions/mod.rs

pub mod ev_route;
pub mod incident;
pub mod timer;

pub use ev_route::EvRouteCoordinator;
pub use incident::IncidentManager;
pub use timer::SessionTimer;
