//! Task Watchdog Timer (TWDT) guard for the control loop.
//!
//! A stalled control loop leaves the blower at its last duty, so the
//! device resets if the loop stops feeding the watchdog for
//! [`TIMEOUT_MS`]. On host targets this is a no-op.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Longer than any control period, short enough to bound a runaway fire.
pub const TIMEOUT_MS: u32 = 5_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::subscribe()
    }
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    pub fn subscribe() -> Self {
        #[cfg(target_os = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms: TIMEOUT_MS,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: TWDT API calls from the main task during boot.
            let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
            if ret != ESP_OK {
                log::warn!("watchdog: reconfigure returned {} (already configured?)", ret);
            }
            let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
            let subscribed = ret == ESP_OK;
            if subscribed {
                log::info!("watchdog: control task subscribed ({} ms)", TIMEOUT_MS);
            } else {
                log::warn!("watchdog: subscribe failed ({})", ret);
            }
            Self { subscribed }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::debug!("watchdog(sim): no-op");
            Self {}
        }
    }

    /// Must be called at least every [`TIMEOUT_MS`].
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: resets the TWDT entry of the subscribed calling task.
            unsafe { esp_task_wdt_reset() };
        }
    }
}
