//! # Request Script
//!
//! A JSON request script for deterministic runs and demos.
//!
//! ## Format
//!
//! A JSON array of steps, each an object tagged by `op`:
//! - File handles: `open`, `close`, `read`, `write`, `seek`, `file_stats`
//! - Paths: `mkdir`, `mkfile`, `readdir`, `readdir_lfn`, `delete`,
//!   `delete_dir`, `rename`, `stat`, `vfs_stats`, `usage`
//! - Backends: `mount_sd`, `unmount_sd`, `mount_usb`, `unmount_usb`
//!
//! An `open` may bind its handle to a name with `"as"`; later steps refer
//! to it as `"fd": "name"`. A raw handle number is accepted too.
//!
//! `readdir` and `readdir_lfn` list up to `limit` names (at most
//! [`MAX_LIST_LIMIT`]). With `"count_only": true` they only count entries.
//!
//! ## Example
//!
//! ```text
//! [
//!   { "op": "mount_sd" },
//!   { "op": "mkfile", "path": "sd:/hello.txt" },
//!   { "op": "open", "path": "sd:/hello.txt", "mode": 3, "as": "hello" },
//!   { "op": "write", "fd": "hello", "data": "Hello FAT" },
//!   { "op": "close", "fd": "hello" }
//! ]
//! ```

use core_types::Fd;
use fs_engine::path::NAME_MAX;
use fs_engine::SHORT_NAME_SLOT;
use ipc::{IoBuffer, Request};
use serde::{Deserialize, Serialize};
use services_fat::{IoctlCode, IoctlvCode};
use std::collections::HashMap;
use thiserror::Error;

/// Entries listed when a read-directory step gives no limit
pub const DEFAULT_LIST_LIMIT: u32 = 16;

/// Largest entry limit a read-directory step may ask for
pub const MAX_LIST_LIMIT: u32 = 1024;

/// Request script error types
#[derive(Debug, Error)]
pub enum RequestScriptError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Empty script")]
    EmptyScript,

    #[error("Unbound handle: {0}")]
    UnboundHandle(String),

    #[error("Entry limit {0} is too large")]
    ListLimit(u32),
}

/// Reference to an open file handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandleRef {
    /// A handle number as returned by the engine
    Raw(i32),
    /// A name bound by an earlier `open`
    Named(String),
}

/// A single scripted request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Open {
        path: String,
        mode: u32,
        #[serde(default, rename = "as", skip_serializing_if = "Option::is_none")]
        bind: Option<String>,
    },
    Close {
        fd: HandleRef,
    },
    Read {
        fd: HandleRef,
        len: usize,
    },
    Write {
        fd: HandleRef,
        data: String,
    },
    Seek {
        fd: HandleRef,
        offset: i32,
        #[serde(default)]
        origin: u32,
    },
    FileStats {
        fd: HandleRef,
    },
    Mkdir {
        path: String,
    },
    Mkfile {
        path: String,
    },
    Readdir {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
        #[serde(default, skip_serializing_if = "is_false")]
        count_only: bool,
    },
    ReaddirLfn {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
        #[serde(default, skip_serializing_if = "is_false")]
        count_only: bool,
    },
    Delete {
        path: String,
    },
    DeleteDir {
        path: String,
    },
    Rename {
        from: String,
        to: String,
    },
    Stat {
        path: String,
    },
    VfsStats {
        path: String,
    },
    Usage {
        path: String,
    },
    MountSd,
    UnmountSd,
    MountUsb,
    UnmountUsb,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Where a request is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The device serving a path
    Path(String),
    /// The control device
    Control,
}

/// A step turned into a request
#[derive(Debug, Clone)]
pub struct ScriptedRequest {
    pub route: Route,
    pub fd: Fd,
    pub request: Request,
}

impl Step {
    /// Short name of the step, as written in the script
    pub fn op(&self) -> &'static str {
        match self {
            Step::Open { .. } => "open",
            Step::Close { .. } => "close",
            Step::Read { .. } => "read",
            Step::Write { .. } => "write",
            Step::Seek { .. } => "seek",
            Step::FileStats { .. } => "file_stats",
            Step::Mkdir { .. } => "mkdir",
            Step::Mkfile { .. } => "mkfile",
            Step::Readdir { .. } => "readdir",
            Step::ReaddirLfn { .. } => "readdir_lfn",
            Step::Delete { .. } => "delete",
            Step::DeleteDir { .. } => "delete_dir",
            Step::Rename { .. } => "rename",
            Step::Stat { .. } => "stat",
            Step::VfsStats { .. } => "vfs_stats",
            Step::Usage { .. } => "usage",
            Step::MountSd => "mount_sd",
            Step::UnmountSd => "unmount_sd",
            Step::MountUsb => "mount_usb",
            Step::UnmountUsb => "unmount_usb",
        }
    }

    /// Builds the request for this step
    ///
    /// Named handles are resolved through `handles`.
    pub fn to_request(
        &self,
        handles: &HashMap<String, Fd>,
    ) -> Result<ScriptedRequest, RequestScriptError> {
        let resolve = |handle: &HandleRef| match handle {
            HandleRef::Raw(raw) => Ok(Fd::from_raw(*raw)),
            HandleRef::Named(name) => handles
                .get(name)
                .copied()
                .ok_or_else(|| RequestScriptError::UnboundHandle(name.clone())),
        };

        let scripted = match self {
            Step::Open { path, mode, .. } => ScriptedRequest {
                route: Route::Path(path.clone()),
                fd: Fd::CONTROL,
                request: Request::Open {
                    device: path.clone(),
                    mode: *mode,
                },
            },
            Step::Close { fd } => on_handle(resolve(fd)?, Request::Close),
            Step::Read { fd, len } => on_handle(
                resolve(fd)?,
                Request::Read {
                    buffer: IoBuffer::zeroed(*len),
                },
            ),
            Step::Write { fd, data } => on_handle(
                resolve(fd)?,
                Request::Write {
                    buffer: IoBuffer::new(data.as_bytes().to_vec()),
                },
            ),
            Step::Seek { fd, offset, origin } => on_handle(
                resolve(fd)?,
                Request::Seek {
                    offset: *offset,
                    origin: *origin,
                },
            ),
            Step::FileStats { fd } => on_handle(
                resolve(fd)?,
                Request::Ioctl {
                    command: IoctlCode::FileStats.as_raw(),
                    input: None,
                    output: Some(IoBuffer::zeroed(fs_engine::FileStats::WIRE_SIZE)),
                },
            ),
            Step::Mkdir { path } => on_path(path, IoctlvCode::MakeDir, vec![], vec![]),
            Step::Mkfile { path } => on_path(path, IoctlvCode::MakeFile, vec![], vec![]),
            Step::Readdir {
                path,
                count_only: true,
                ..
            } => count_dir(path, IoctlvCode::ReadDir),
            Step::ReaddirLfn {
                path,
                count_only: true,
                ..
            } => count_dir(path, IoctlvCode::ReadDirLongNames),
            Step::Readdir { path, limit, .. } => {
                read_dir(path, IoctlvCode::ReadDir, *limit, SHORT_NAME_SLOT)?
            }
            Step::ReaddirLfn { path, limit, .. } => {
                read_dir(path, IoctlvCode::ReadDirLongNames, *limit, NAME_MAX + 1)?
            }
            Step::Delete { path } => on_path(path, IoctlvCode::Delete, vec![], vec![]),
            Step::DeleteDir { path } => on_path(path, IoctlvCode::DeleteDir, vec![], vec![]),
            Step::Rename { from, to } => on_path(
                from,
                IoctlvCode::Rename,
                vec![IoBuffer::from_path(to)],
                vec![],
            ),
            Step::Stat { path } => on_path(
                path,
                IoctlvCode::Stat,
                vec![],
                vec![IoBuffer::zeroed(fs_engine::PathStat::WIRE_SIZE)],
            ),
            Step::VfsStats { path } => on_path(
                path,
                IoctlvCode::VfsStats,
                vec![],
                vec![IoBuffer::zeroed(fs_engine::VfsStats::WIRE_SIZE)],
            ),
            Step::Usage { path } => on_path(
                path,
                IoctlvCode::GetUsage,
                vec![],
                vec![IoBuffer::zeroed(4), IoBuffer::zeroed(4)],
            ),
            Step::MountSd => on_control(IoctlvCode::MountSd),
            Step::UnmountSd => on_control(IoctlvCode::UnmountSd),
            Step::MountUsb => on_control(IoctlvCode::MountUsb),
            Step::UnmountUsb => on_control(IoctlvCode::UnmountUsb),
        };
        Ok(scripted)
    }
}

fn on_handle(fd: Fd, request: Request) -> ScriptedRequest {
    ScriptedRequest {
        route: Route::Control,
        fd,
        request,
    }
}

fn vectored(code: IoctlvCode, inputs: Vec<IoBuffer>, outputs: Vec<IoBuffer>) -> Request {
    let num_in = inputs.len() as u32;
    let num_io = outputs.len() as u32;
    let mut vector = inputs;
    vector.extend(outputs);
    Request::Ioctlv {
        command: code.as_raw(),
        vector,
        num_in,
        num_io,
    }
}

/// A vectorized request whose first input is `path`
fn on_path(
    path: &str,
    code: IoctlvCode,
    extra_inputs: Vec<IoBuffer>,
    outputs: Vec<IoBuffer>,
) -> ScriptedRequest {
    let mut inputs = vec![IoBuffer::from_path(path)];
    inputs.extend(extra_inputs);
    ScriptedRequest {
        route: Route::Path(path.to_string()),
        fd: Fd::CONTROL,
        request: vectored(code, inputs, outputs),
    }
}

fn on_control(code: IoctlvCode) -> ScriptedRequest {
    ScriptedRequest {
        route: Route::Control,
        fd: Fd::CONTROL,
        request: vectored(code, vec![], vec![]),
    }
}

/// Read-directory in the listing shape, sized for `limit` names
fn read_dir(
    path: &str,
    code: IoctlvCode,
    limit: Option<u32>,
    slot: usize,
) -> Result<ScriptedRequest, RequestScriptError> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit > MAX_LIST_LIMIT {
        return Err(RequestScriptError::ListLimit(limit));
    }
    let size = (limit as usize)
        .checked_mul(slot)
        .ok_or(RequestScriptError::ListLimit(limit))?;
    Ok(on_path(
        path,
        code,
        vec![IoBuffer::from_word(limit)],
        vec![IoBuffer::zeroed(size), IoBuffer::zeroed(4)],
    ))
}

/// Read-directory in the count-only shape
fn count_dir(path: &str, code: IoctlvCode) -> ScriptedRequest {
    on_path(path, code, vec![], vec![IoBuffer::zeroed(4)])
}

/// Request script
///
/// Parsed once, then replayed step by step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestScript {
    steps: Vec<Step>,
}

impl RequestScript {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Parses a script from JSON text
    pub fn from_json(text: &str) -> Result<Self, RequestScriptError> {
        let script: Self = serde_json::from_str(text)?;
        if script.steps.is_empty() {
            return Err(RequestScriptError::EmptyScript);
        }
        Ok(script)
    }

    pub fn to_json(&self) -> Result<String, RequestScriptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let script = RequestScript::from_json(
            r#"[
                { "op": "mount_sd" },
                { "op": "open", "path": "sd:/a", "mode": 1, "as": "a" },
                { "op": "read", "fd": "a", "len": 32 },
                { "op": "seek", "fd": 3, "offset": -4, "origin": 2 },
                { "op": "readdir_lfn", "path": "sd:/" }
            ]"#,
        )
        .unwrap();

        assert_eq!(script.len(), 5);
        assert_eq!(script.steps()[0], Step::MountSd);
        assert_eq!(
            script.steps()[1],
            Step::Open {
                path: "sd:/a".to_string(),
                mode: 1,
                bind: Some("a".to_string()),
            }
        );
        assert_eq!(
            script.steps()[3],
            Step::Seek {
                fd: HandleRef::Raw(3),
                offset: -4,
                origin: 2,
            }
        );
        assert_eq!(
            script.steps()[4],
            Step::ReaddirLfn {
                path: "sd:/".to_string(),
                limit: None,
                count_only: false,
            }
        );
    }

    #[test]
    fn test_empty_script() {
        assert!(matches!(
            RequestScript::from_json("[]"),
            Err(RequestScriptError::EmptyScript)
        ));
    }

    #[test]
    fn test_unknown_op() {
        assert!(matches!(
            RequestScript::from_json(r#"[{ "op": "format" }]"#),
            Err(RequestScriptError::Parse(_))
        ));
    }

    #[test]
    fn test_to_json_round_trip() {
        let script = RequestScript::new(vec![
            Step::MountUsb,
            Step::Rename {
                from: "usb:/a".to_string(),
                to: "usb:/b".to_string(),
            },
        ]);
        let text = script.to_json().unwrap();
        assert_eq!(RequestScript::from_json(&text).unwrap(), script);
    }

    #[test]
    fn test_named_handle_resolution() {
        let mut handles = HashMap::new();
        handles.insert("log".to_string(), Fd::from_raw(4));

        let step = Step::Write {
            fd: HandleRef::Named("log".to_string()),
            data: "hi".to_string(),
        };
        let scripted = step.to_request(&handles).unwrap();
        assert_eq!(scripted.fd, Fd::from_raw(4));
        assert_eq!(scripted.route, Route::Control);

        let unbound = Step::Close {
            fd: HandleRef::Named("missing".to_string()),
        };
        assert!(matches!(
            unbound.to_request(&handles),
            Err(RequestScriptError::UnboundHandle(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_rename_vector_layout() {
        let step = Step::Rename {
            from: "sd:/old".to_string(),
            to: "sd:/new".to_string(),
        };
        let scripted = step.to_request(&HashMap::new()).unwrap();
        assert_eq!(scripted.route, Route::Path("sd:/old".to_string()));
        match scripted.request {
            Request::Ioctlv {
                command,
                vector,
                num_in,
                num_io,
            } => {
                assert_eq!(command, IoctlvCode::Rename.as_raw());
                assert_eq!((num_in, num_io), (2, 0));
                assert_eq!(vector[1].path().unwrap(), "sd:/new");
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_read_dir_listing_shape() {
        let step = Step::Readdir {
            path: "sd:/".to_string(),
            limit: Some(3),
            count_only: false,
        };
        match step.to_request(&HashMap::new()).unwrap().request {
            Request::Ioctlv {
                vector,
                num_in,
                num_io,
                ..
            } => {
                assert_eq!((num_in, num_io), (2, 2));
                assert_eq!(vector[1].word().unwrap(), 3);
                assert_eq!(vector[2].len(), 3 * SHORT_NAME_SLOT);
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_read_dir_count_only_shape() {
        let script = RequestScript::from_json(
            r#"[{ "op": "readdir", "path": "sd:/", "count_only": true }]"#,
        )
        .unwrap();
        match script.steps()[0].to_request(&HashMap::new()).unwrap().request {
            Request::Ioctlv {
                command,
                vector,
                num_in,
                num_io,
            } => {
                assert_eq!(command, IoctlvCode::ReadDir.as_raw());
                assert_eq!((num_in, num_io), (1, 1));
                assert_eq!(vector[1].len(), 4);
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_read_dir_limit_is_bounded() {
        let script = RequestScript::from_json(
            r#"[{ "op": "readdir_lfn", "path": "sd:/", "limit": 4294967295 }]"#,
        )
        .unwrap();
        assert!(matches!(
            script.steps()[0].to_request(&HashMap::new()),
            Err(RequestScriptError::ListLimit(u32::MAX))
        ));

        let largest = Step::ReaddirLfn {
            path: "sd:/".to_string(),
            limit: Some(MAX_LIST_LIMIT),
            count_only: false,
        };
        assert!(largest.to_request(&HashMap::new()).is_ok());
    }
}
