// Structured record schema, validation, and the editable controller that owns the
// current record for the session.

pub mod controller;
pub mod handlers;
pub mod schema;
pub mod validation;
