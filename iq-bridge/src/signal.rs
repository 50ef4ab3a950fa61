//! Signal handling for graceful shutdown.

use crate::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Install a SIGINT/SIGTERM handler that clears the returned flag.
///
/// The supervisor polls the flag at every blocking point and tears the
/// current session down once it clears.
///
/// # Example
/// ```ignore
/// let running = setup_shutdown_handler()?;
/// Supervisor::new(config, running).run();
/// ```
pub fn setup_shutdown_handler() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}
