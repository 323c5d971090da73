//! Transport-neutral HTTP admin surface.
//!
//! ```text
//!   HttpRequest ──▶ router::dispatch ──▶ AppService ──▶ Outcome
//!                                             │
//!   HttpResponse ◀── pages / status mapping ◀─┘   (+ FollowUp for the caller)
//! ```
//!
//! Nothing here touches a socket.  The ESP-IDF server adapter copies each
//! request into an [`HttpRequest`], writes the [`HttpResponse`] back, and
//! only then runs the returned follow-up (restart or firmware install).

pub mod form;
pub mod pages;
pub mod request;
pub mod router;

pub use request::{HttpRequest, HttpResponse, Method};
pub use router::{Routed, dispatch};
