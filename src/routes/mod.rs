/// Router Module Index
///
/// Organizes the portal's routing into two modules. The split mirrors the
/// session lifecycle rather than an access-control boundary: the portal gates
/// access implicitly: a page behind the session layer still renders for an
/// anonymous visitor, its upstream calls simply fail and degrade.

/// Routes reachable before a session exists: the root redirect, the login
/// page, and the health probe.
pub mod public;

/// The page routes wrapped by the session-bootstrap middleware. Every request
/// through these resolves the session from the cookie first.
pub mod pages;
