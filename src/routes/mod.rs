/// Router Module Index
///
/// Splits the API by access level. Authentication is a single layer over the whole
/// authenticated router.

/// Routes reachable without a session: health, registration, login, token refresh and
/// the public video listing.
pub mod public;

/// Routes behind the `AuthUser` middleware. Ownership checks happen in the handlers.
pub mod authenticated;
