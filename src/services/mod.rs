/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Storage connection supervisor driving degraded mode.
pub mod storage_supervisor;
/// Tournament creation, lookup and match reporting.
pub mod tournament_service;
