//! Service layer: room lifecycle, scoring, ranking, background loops, and
//! the SSE plumbing between them.

pub mod documentation;
pub mod guess_service;
pub mod health_service;
pub mod presence;
pub mod ranking_service;
pub mod room_service;
pub mod scheduler;
pub mod sse_events;
pub mod sse_service;
