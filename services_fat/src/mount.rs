//! Backend mount lifecycle
//!
//! Each backend moves Unmounted → Mounted through a successful startup
//! followed by a successful filesystem mount, and back through a
//! filesystem unmount followed by a backend shutdown. The shutdown is
//! attempted even when nothing was mounted.

use crate::config::ModuleConfig;
use core_types::result_code::ResultCode;
use fs_engine::{FilesystemEngine, FsError};
use hal::{DiscInterface, SharedDisc};
use log::debug;
use std::fmt;

/// Removable storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Sd,
    Usb,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Sd => write!(f, "SD"),
            Backend::Usb => write!(f, "USB"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Unmounted,
    Mounted,
}

/// Result of a lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted,
    /// Mount requested while already mounted; nothing was touched
    AlreadyMounted,
    /// No backend attached, or its startup reported failure
    BackendStartupFailed,
    /// The backend started but the filesystem mount failed
    MountFailed(FsError),
    Unmounted,
    /// The filesystem was unmounted but the backend shutdown reported
    /// failure
    BackendShutdownFailed,
}

impl MountOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            MountOutcome::Mounted | MountOutcome::AlreadyMounted | MountOutcome::Unmounted
        )
    }

    /// Result code for the caller: 0 on success, 1 on failure
    ///
    /// Backend calls report a boolean; the caller sees its negation.
    pub fn code(&self) -> ResultCode {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

struct Slot {
    mount_name: String,
    disc: Option<SharedDisc>,
    state: MountState,
}

impl Slot {
    fn new(mount_name: &str) -> Self {
        Self {
            mount_name: mount_name.to_string(),
            disc: None,
            state: MountState::Unmounted,
        }
    }
}

/// Mount table for the SD and USB backends
///
/// Owned by the server and touched only from the request loop.
pub struct MountLifecycleManager {
    sd: Slot,
    usb: Slot,
}

impl MountLifecycleManager {
    pub fn new(config: &ModuleConfig) -> Self {
        Self {
            sd: Slot::new(&config.sd_mount_name),
            usb: Slot::new(&config.usb_mount_name),
        }
    }

    /// Attaches a backend driver; a backend left unattached fails to start
    pub fn with_backend(mut self, backend: Backend, disc: SharedDisc) -> Self {
        self.attach(backend, disc);
        self
    }

    pub fn attach(&mut self, backend: Backend, disc: SharedDisc) {
        self.slot_mut(backend).disc = Some(disc);
    }

    pub fn state(&self, backend: Backend) -> MountState {
        self.slot(backend).state
    }

    pub fn mount_name(&self, backend: Backend) -> &str {
        &self.slot(backend).mount_name
    }

    pub fn disc(&self, backend: Backend) -> Option<SharedDisc> {
        self.slot(backend).disc.clone()
    }

    /// Starts the backend, then mounts it under its name
    ///
    /// A backend left running after a failed filesystem mount stays
    /// running; the next unmount request shuts it down.
    pub fn mount<E: FilesystemEngine + ?Sized>(
        &mut self,
        backend: Backend,
        engine: &mut E,
    ) -> MountOutcome {
        let slot = self.slot_mut(backend);
        if slot.state == MountState::Mounted {
            debug!("{} already mounted as {}", backend, slot.mount_name);
            return MountOutcome::AlreadyMounted;
        }

        let disc = match &slot.disc {
            Some(disc) => disc.clone(),
            None => {
                debug!("{} backend not attached", backend);
                return MountOutcome::BackendStartupFailed;
            }
        };

        if !disc.borrow_mut().startup() {
            debug!("{} backend startup failed", backend);
            return MountOutcome::BackendStartupFailed;
        }

        match engine.mount(&slot.mount_name, disc) {
            Ok(()) => {
                slot.state = MountState::Mounted;
                debug!("{} mounted as {}", backend, slot.mount_name);
                MountOutcome::Mounted
            }
            Err(err) => {
                debug!("{} mount as {} failed: {}", backend, slot.mount_name, err);
                MountOutcome::MountFailed(err)
            }
        }
    }

    /// Unmounts the filesystem, then shuts the backend down
    ///
    /// Both steps always run. The outcome reflects the shutdown only.
    pub fn unmount<E: FilesystemEngine + ?Sized>(
        &mut self,
        backend: Backend,
        engine: &mut E,
    ) -> MountOutcome {
        let slot = self.slot_mut(backend);

        if let Err(err) = engine.unmount(&slot.mount_name) {
            debug!("unmount of {} reported {}", slot.mount_name, err);
        }
        slot.state = MountState::Unmounted;

        let released = match &slot.disc {
            Some(disc) => disc.borrow_mut().shutdown(),
            None => false,
        };
        if released {
            debug!("{} unmounted from {}", backend, slot.mount_name);
            MountOutcome::Unmounted
        } else {
            debug!("{} backend shutdown failed", backend);
            MountOutcome::BackendShutdownFailed
        }
    }

    fn slot(&self, backend: Backend) -> &Slot {
        match backend {
            Backend::Sd => &self.sd,
            Backend::Usb => &self.usb,
        }
    }

    fn slot_mut(&mut self, backend: Backend) -> &mut Slot {
        match backend {
            Backend::Sd => &mut self.sd,
            Backend::Usb => &mut self.usb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_engine::MemoryFilesystem;
    use hal::{DiscFailure, DiscInterface, FailingDisc, RamDisc};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manager_with(disc: Rc<RefCell<FailingDisc<RamDisc>>>) -> MountLifecycleManager {
        MountLifecycleManager::new(&ModuleConfig::default()).with_backend(Backend::Sd, disc)
    }

    fn disc(failure: DiscFailure) -> Rc<RefCell<FailingDisc<RamDisc>>> {
        Rc::new(RefCell::new(FailingDisc::new(
            RamDisc::new(*b"WISD", 128),
            failure,
        )))
    }

    #[test]
    fn test_mount_then_unmount() {
        let sd = disc(DiscFailure::Never);
        let mut mounts = manager_with(sd.clone());
        let mut engine = MemoryFilesystem::new();

        assert_eq!(mounts.mount(Backend::Sd, &mut engine), MountOutcome::Mounted);
        assert_eq!(mounts.state(Backend::Sd), MountState::Mounted);
        assert!(engine.is_mounted("sd"));
        assert!(sd.borrow().inner().is_running());

        assert_eq!(
            mounts.unmount(Backend::Sd, &mut engine),
            MountOutcome::Unmounted
        );
        assert_eq!(mounts.state(Backend::Sd), MountState::Unmounted);
        assert!(!engine.is_mounted("sd"));
        assert!(!sd.borrow().inner().is_running());
    }

    #[test]
    fn test_mount_twice_is_harmless() {
        let sd = disc(DiscFailure::Never);
        let mut mounts = manager_with(sd.clone());
        let mut engine = MemoryFilesystem::new();

        mounts.mount(Backend::Sd, &mut engine);
        assert_eq!(
            mounts.mount(Backend::Sd, &mut engine),
            MountOutcome::AlreadyMounted
        );
        assert_eq!(sd.borrow().inner().startup_calls(), 1);
        assert_eq!(MountOutcome::AlreadyMounted.code(), 0);
    }

    #[test]
    fn test_startup_failure_leaves_table_unmounted() {
        let mut mounts = manager_with(disc(DiscFailure::Startup));
        let mut engine = MemoryFilesystem::new();

        let outcome = mounts.mount(Backend::Sd, &mut engine);
        assert_eq!(outcome, MountOutcome::BackendStartupFailed);
        assert_eq!(outcome.code(), 1);
        assert_eq!(mounts.state(Backend::Sd), MountState::Unmounted);
        assert!(!engine.is_mounted("sd"));
    }

    #[test]
    fn test_ejected_medium_fails_startup() {
        let sd = disc(DiscFailure::Never);
        sd.borrow_mut().inner_mut().set_inserted(false);
        let mut mounts = manager_with(sd);
        let mut engine = MemoryFilesystem::new();

        let outcome = mounts.mount(Backend::Sd, &mut engine);
        assert_eq!(outcome, MountOutcome::BackendStartupFailed);
        assert_eq!(mounts.state(Backend::Sd), MountState::Unmounted);
    }

    #[test]
    fn test_filesystem_mount_failure_leaves_backend_running() {
        let usb = disc(DiscFailure::Never);
        let mut mounts = MountLifecycleManager::new(&ModuleConfig::default())
            .with_backend(Backend::Usb, usb.clone());
        let mut engine = MemoryFilesystem::new();

        // Another volume already holds the name
        let mut other = RamDisc::new(*b"USBS", 16);
        assert!(other.startup());
        engine.mount("usb", hal::shared(other)).unwrap();

        let outcome = mounts.mount(Backend::Usb, &mut engine);
        assert_eq!(outcome, MountOutcome::MountFailed(FsError::AlreadyExists));
        assert_eq!(outcome.code(), 1);
        assert_eq!(mounts.state(Backend::Usb), MountState::Unmounted);
        assert!(usb.borrow().inner().is_running());
    }

    #[test]
    fn test_unmount_when_unmounted_still_shuts_down() {
        let sd = disc(DiscFailure::Never);
        let mut mounts = manager_with(sd.clone());
        let mut engine = MemoryFilesystem::new();

        assert_eq!(
            mounts.unmount(Backend::Sd, &mut engine),
            MountOutcome::Unmounted
        );
        assert_eq!(sd.borrow().inner().shutdown_calls(), 1);
        assert_eq!(mounts.state(Backend::Sd), MountState::Unmounted);
    }

    #[test]
    fn test_shutdown_failure_is_reported() {
        let sd = disc(DiscFailure::Shutdown);
        let mut mounts = manager_with(sd.clone());
        let mut engine = MemoryFilesystem::new();

        mounts.mount(Backend::Sd, &mut engine);
        let outcome = mounts.unmount(Backend::Sd, &mut engine);
        assert_eq!(outcome, MountOutcome::BackendShutdownFailed);
        assert_eq!(outcome.code(), 1);
        assert_eq!(mounts.state(Backend::Sd), MountState::Unmounted);
        assert!(!engine.is_mounted("sd"));
        assert!(!sd.borrow().inner().is_running());
    }

    #[test]
    fn test_unattached_backend() {
        let mut mounts = MountLifecycleManager::new(&ModuleConfig::default());
        let mut engine = MemoryFilesystem::new();
        assert_eq!(
            mounts.mount(Backend::Usb, &mut engine),
            MountOutcome::BackendStartupFailed
        );
        assert_eq!(
            mounts.unmount(Backend::Usb, &mut engine),
            MountOutcome::BackendShutdownFailed
        );
        assert!(mounts.disc(Backend::Usb).is_none());
    }

    #[test]
    fn test_mount_names_follow_config() {
        let config = ModuleConfig {
            usb_mount_name: "ums".to_string(),
            ..ModuleConfig::default()
        };
        let mounts = MountLifecycleManager::new(&config);
        assert_eq!(mounts.mount_name(Backend::Sd), "sd");
        assert_eq!(mounts.mount_name(Backend::Usb), "ums");
    }
}
