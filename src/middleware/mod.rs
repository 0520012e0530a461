/*
 * Responsibility
 * - Router-level middleware (origin gate + CORS headers, HTTP plumbing)
 */
pub mod cors;
pub mod http;
