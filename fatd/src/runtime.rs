//! # Host Runtime
//!
//! Boots the FAT module against the simulated kernel and replays a request
//! script through it, one request at a time.

use crate::request_script::{RequestScript, RequestScriptError, Route, Step};
use core_types::result_code::ResultCode;
use core_types::Fd;
use fs_engine::MemoryFilesystem;
use hal::{shared, RamDisc};
use ipc::{IoBuffer, MessageId, Request};
use kernel_api::KernelError;
use log::{debug, info};
use services_fat::{
    Backend, FatError, FatServer, IoctlvCode, ModuleConfig, MountLifecycleManager,
};
use sim_kernel::test_utils::vector_outputs;
use sim_kernel::{Completion, SimulatedKernel};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// 1 MiB of 512-byte sectors
pub const DEFAULT_SECTORS: usize = 2048;

/// Host runtime error types
#[derive(Debug, Error)]
pub enum FatdError {
    #[error("Start-up failed: {0}")]
    Startup(#[from] FatError),

    #[error("Script error: {0}")]
    Script(#[from] RequestScriptError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] KernelError),

    #[error("Request {0} was not acknowledged")]
    NotAcknowledged(MessageId),
}

/// Host runtime configuration
#[derive(Debug, Clone)]
pub struct FatdConfig {
    /// Module configuration
    pub module: ModuleConfig,
    /// Request script text (JSON)
    pub script: Option<String>,
    /// Sectors on the simulated SD card
    pub sd_sectors: usize,
    /// Sectors on the simulated USB drive
    pub usb_sectors: usize,
    /// Whether a USB drive is attached
    pub usb: bool,
}

impl Default for FatdConfig {
    fn default() -> Self {
        Self {
            module: ModuleConfig::default(),
            script: None,
            sd_sectors: DEFAULT_SECTORS,
            usb_sectors: DEFAULT_SECTORS,
            usb: true,
        }
    }
}

/// Outcome of one replayed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Position in the script, from 1
    pub step: usize,
    pub op: &'static str,
    /// Acknowledge value
    pub result: ResultCode,
    /// Decoded output, when the request returns data
    pub detail: Option<String>,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} {}: {}", self.step, self.op, self.result)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

/// Host runtime
pub struct FatdRuntime {
    server: FatServer<SimulatedKernel, MemoryFilesystem>,
    script: Option<RequestScript>,
    /// Handles bound by `open` steps
    handles: HashMap<String, Fd>,
}

impl FatdRuntime {
    /// Creates the runtime and starts the FAT module
    pub fn new(config: FatdConfig) -> Result<Self, FatdError> {
        let script = match &config.script {
            Some(text) => Some(RequestScript::from_json(text)?),
            None => None,
        };

        let mut mounts = MountLifecycleManager::new(&config.module)
            .with_backend(Backend::Sd, shared(RamDisc::new(*b"WISD", config.sd_sectors)));
        if config.usb {
            mounts.attach(Backend::Usb, shared(RamDisc::new(*b"WUSB", config.usb_sectors)));
        }

        let server = FatServer::initialize(
            SimulatedKernel::new(),
            MemoryFilesystem::new(),
            mounts,
            config.module,
        )?;

        Ok(Self {
            server,
            script,
            handles: HashMap::new(),
        })
    }

    /// Replays the whole script and returns one report per step
    pub fn run(&mut self) -> Result<Vec<StepReport>, FatdError> {
        let steps = match &self.script {
            Some(script) => script.steps().to_vec(),
            None => Vec::new(),
        };
        info!("replaying {} steps", steps.len());

        let mut reports = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            reports.push(self.execute(index + 1, step)?);
        }
        Ok(reports)
    }

    /// Sends one step and serves the queue until it drains
    pub fn execute(&mut self, number: usize, step: &Step) -> Result<StepReport, FatdError> {
        let scripted = step.to_request(&self.handles)?;
        let device = match &scripted.route {
            Route::Path(path) => path.clone(),
            Route::Control => self.server.config().control_device.clone(),
        };

        let id = self
            .server
            .kernel_mut()
            .send_to_device(&device, scripted.fd, scripted.request)?;
        let served = self.server.serve_pending()?;
        debug!("step {} served {} requests", number, served);

        let completion = self
            .server
            .kernel()
            .completion(id)
            .ok_or(FatdError::NotAcknowledged(id))?;
        let result = completion.result;
        let detail = describe(completion);

        if let Step::Open {
            bind: Some(name), ..
        } = step
        {
            if result > 0 {
                self.handles.insert(name.clone(), Fd::from_raw(result));
            }
        }

        Ok(StepReport {
            step: number,
            op: step.op(),
            result,
            detail,
        })
    }

    pub fn server(&self) -> &FatServer<SimulatedKernel, MemoryFilesystem> {
        &self.server
    }

    /// Handle bound to `name` by an earlier open
    pub fn handle(&self, name: &str) -> Option<Fd> {
        self.handles.get(name).copied()
    }
}

fn be_u32(bytes: &[u8], offset: usize) -> u32 {
    bytes
        .get(offset..offset + 4)
        .and_then(|word| word.try_into().ok())
        .map(u32::from_be_bytes)
        .unwrap_or(0)
}

fn be_u64(bytes: &[u8], offset: usize) -> u64 {
    bytes
        .get(offset..offset + 8)
        .and_then(|word| word.try_into().ok())
        .map(u64::from_be_bytes)
        .unwrap_or(0)
}

/// NUL-separated names, empty slots skipped
fn names(listing: &[u8]) -> Vec<String> {
    listing
        .split(|byte| *byte == 0)
        .filter(|name| !name.is_empty())
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect()
}

fn word(buffer: Option<&IoBuffer>) -> u32 {
    buffer.and_then(|buffer| buffer.word().ok()).unwrap_or(0)
}

/// Decodes the data a successful request returned
fn describe(completion: &Completion) -> Option<String> {
    if completion.result < 0 {
        return None;
    }

    match &completion.message.request {
        Request::Read { buffer } => {
            let len = usize::try_from(completion.result).unwrap_or(0);
            let data = buffer.as_slice().get(..len).unwrap_or(&[]);
            Some(format!("{:?}", String::from_utf8_lossy(data)))
        }
        Request::Ioctl {
            output: Some(output),
            ..
        } => {
            let record = output.as_slice();
            Some(format!(
                "length {} position {}",
                be_u32(record, 0),
                be_u32(record, 4)
            ))
        }
        Request::Ioctlv { command, .. } => {
            let outputs = vector_outputs(completion);
            match IoctlvCode::from_raw(*command)? {
                IoctlvCode::ReadDir | IoctlvCode::ReadDirLongNames if outputs.len() > 1 => {
                    let count = word(outputs.get(1));
                    let listed = names(outputs.first()?.as_slice());
                    Some(format!("{} entries: {}", count, listed.join(", ")))
                }
                IoctlvCode::ReadDir | IoctlvCode::ReadDirLongNames => {
                    Some(format!("{} entries", word(outputs.first())))
                }
                IoctlvCode::Stat => {
                    let record = outputs.first()?.as_slice();
                    Some(format!(
                        "size {} mode {:o} ino {}",
                        be_u64(record, 0),
                        be_u32(record, 8),
                        be_u32(record, 16)
                    ))
                }
                IoctlvCode::VfsStats => {
                    let record = outputs.first()?.as_slice();
                    Some(format!(
                        "block size {} blocks {} free {}",
                        be_u32(record, 0),
                        be_u32(record, 8),
                        be_u32(record, 12)
                    ))
                }
                IoctlvCode::GetUsage => Some(format!(
                    "blocks {} inodes {}",
                    word(outputs.first()),
                    word(outputs.get(1))
                )),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request_script::HandleRef;

    fn runtime() -> FatdRuntime {
        FatdRuntime::new(FatdConfig::default()).unwrap()
    }

    #[test]
    fn test_runtime_creation() {
        let runtime = runtime();
        assert_eq!(
            runtime.server().kernel().registered_devices(),
            vec!["fat", "sd:", "usb:"]
        );
    }

    #[test]
    fn test_run_without_script() {
        let mut runtime = runtime();
        assert!(runtime.run().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_script_rejected() {
        let config = FatdConfig {
            script: Some("not json".to_string()),
            ..FatdConfig::default()
        };
        assert!(matches!(
            FatdRuntime::new(config),
            Err(FatdError::Script(RequestScriptError::Parse(_)))
        ));
    }

    #[test]
    fn test_open_binds_handle() {
        let mut runtime = runtime();
        runtime.execute(1, &Step::MountSd).unwrap();
        runtime
            .execute(
                2,
                &Step::Mkfile {
                    path: "sd:/a".to_string(),
                },
            )
            .unwrap();
        let report = runtime
            .execute(
                3,
                &Step::Open {
                    path: "sd:/a".to_string(),
                    mode: 3,
                    bind: Some("a".to_string()),
                },
            )
            .unwrap();
        assert_eq!(report.result, 1);
        assert_eq!(runtime.handle("a"), Some(Fd::from_raw(1)));

        let failed = runtime
            .execute(
                4,
                &Step::Open {
                    path: "sd:/b".to_string(),
                    mode: 1,
                    bind: Some("b".to_string()),
                },
            )
            .unwrap();
        assert!(failed.result < 0);
        assert_eq!(runtime.handle("b"), None);
    }

    #[test]
    fn test_unbound_handle_is_an_error() {
        let mut runtime = runtime();
        let step = Step::Close {
            fd: HandleRef::Named("ghost".to_string()),
        };
        assert!(matches!(
            runtime.execute(1, &step),
            Err(FatdError::Script(RequestScriptError::UnboundHandle(_)))
        ));
    }

    #[test]
    fn test_report_display() {
        let report = StepReport {
            step: 3,
            op: "usage",
            result: 0,
            detail: Some("blocks 1 inodes 2".to_string()),
        };
        assert_eq!(report.to_string(), "step 3 usage: 0 (blocks 1 inodes 2)");

        let bare = StepReport {
            step: 1,
            op: "mount_sd",
            result: 1,
            detail: None,
        };
        assert_eq!(bare.to_string(), "step 1 mount_sd: 1");
    }

    #[test]
    fn test_names_skip_padding() {
        assert_eq!(
            names(b"A.TXT\0\0\0\0\0\0\0\0B.TXT\0\0\0"),
            vec!["A.TXT".to_string(), "B.TXT".to_string()]
        );
    }
}
