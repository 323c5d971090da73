//! Runtime: the service together with the adapters it drives.
//!
//! One `Runtime` lives behind a mutex shared by the HTTP server tasks and
//! the main loop, so requests and ticks never interleave inside the
//! service.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::adapters::device::DeviceAdapter;
use crate::adapters::log_sink::LogEventSink;
use crate::adapters::nvs::NvsAdapter;
use crate::adapters::time::UptimeClock;
use crate::app::commands::FollowUp;
use crate::app::service::AppService;
use crate::http::{self, HttpRequest, Routed};

pub struct Runtime {
    pub service: AppService<NvsAdapter>,
    pub device: DeviceAdapter,
    pub sink: LogEventSink,
    pub clock: UptimeClock,
}

/// Handle shared between the server and the main loop.
pub type SharedRuntime = Arc<Mutex<Runtime>>;

impl Runtime {
    pub fn new(service: AppService<NvsAdapter>, device: DeviceAdapter, clock: UptimeClock) -> Self {
        Self {
            service,
            device,
            sink: LogEventSink::new(),
            clock,
        }
    }

    /// Apply the stored wiring and announce the mode.
    pub fn start(&mut self) {
        self.service.start(&mut self.device, &mut self.sink);
    }

    pub fn into_shared(self) -> SharedRuntime {
        Arc::new(Mutex::new(self))
    }

    /// Route one request.
    pub fn handle(&mut self, req: &HttpRequest) -> Routed {
        let now = self.clock.uptime_secs();
        info!("HTTP {:?} {}", req.method, req.path);
        http::dispatch(&mut self.service, req, now, &mut self.device, &mut self.sink)
    }

    pub fn run_follow_up(&mut self, follow_up: FollowUp) {
        self.service
            .run_follow_up(follow_up, &mut self.device, &mut self.sink);
    }

    /// One pass of the periodic control loop.
    pub fn tick(&mut self) {
        let now = self.clock.uptime_secs();
        self.service.tick(now, &mut self.device, &mut self.sink);
    }
}

/// Lock `shared`, recovering the guard if a handler panicked mid-request.
pub fn lock(shared: &SharedRuntime) -> MutexGuard<'_, Runtime> {
    shared.lock().unwrap_or_else(|poisoned| {
        warn!("runtime lock poisoned, continuing");
        poisoned.into_inner()
    })
}
