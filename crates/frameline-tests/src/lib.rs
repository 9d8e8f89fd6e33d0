//! Integration test crate for the Frameline playback engine.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the frameline crates to verify they work together.

#[cfg(test)]
mod playback;

#[cfg(test)]
mod timeline;

#[cfg(test)]
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
