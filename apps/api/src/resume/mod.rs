// Résumé source: loading, validation, and the read-only résumé endpoint.
// The résumé is static data; nothing in this module mutates it after load.

pub mod handlers;
pub mod loader;
pub mod validation;
