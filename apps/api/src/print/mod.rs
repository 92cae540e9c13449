// Print projection and the HTML rendering surface for preview/print.
// Projection is pure; opening a page is the only effect.

pub mod handlers;
pub mod page;
pub mod projector;
