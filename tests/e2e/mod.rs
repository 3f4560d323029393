// End-to-end tests for the Textcast Backend API
//
// Each test gets its own application instance and its own fake speech API,
// both bound to ephemeral ports. The real reqwest-based speech client talks
// to the fake over HTTP, so status classification and body streaming are
// exercised exactly as in production.
//
// Fake speech API behaviour is driven by the credential and the chunk text:
// - "invalid-key" → 401, "rate-limited-key" → 429
// - input containing FAIL_UPSTREAM → 500
// - input containing SLOW → delayed response

mod helpers;
mod test_health;
mod test_tts;
