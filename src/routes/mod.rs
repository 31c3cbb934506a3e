/// Router Module Index
///
/// The shell's routes, grouped by who they are meant for. Every group sits
/// behind the same `route_guard` layer applied in `create_router`; the grouping
/// only decides which session extractor the handlers take.

/// Routes reachable without a credential (landing, login, register, logout).
pub mod public;

/// Routes under the guarded prefixes (`/dashboard`, `/courses`, `/profile`).
pub mod authenticated;

/// Course management. Handlers take `InstructorContext` and answer 403 otherwise.
pub mod instructor;
