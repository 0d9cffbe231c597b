//! Device handles and acquisition
//!
//! An event device node is queried through [`DeviceQuery`], which [`EventDevice`]
//! implements with evdev ioctls. [`DeviceHandle`] is what the monitor owns: an
//! open node plus whether it speaks the native event protocol or the legacy
//! three-octet mouse protocol.

use crate::codes::EV_VERSION;
use crate::error::DeviceError;
use crate::ioctl::{self, StateKind};
use crate::mouse::MouseTranslator;
use crate::settings::Settings;
use crate::symbols::{CodeTable, SymbolResolver};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Longest device name we ask the kernel for.
const NAME_LEN: usize = 64;

/// Bus type, vendor, product and version of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputId {
    pub bus_type: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

impl From<libc::input_id> for InputId {
    fn from(id: libc::input_id) -> Self {
        Self {
            bus_type: id.bustype,
            vendor: id.vendor,
            product: id.product,
            version: id.version,
        }
    }
}

/// Calibration of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbsInfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: i32,
}

impl From<libc::input_absinfo> for AbsInfo {
    fn from(info: libc::input_absinfo) -> Self {
        Self {
            value: info.value,
            minimum: info.minimum,
            maximum: info.maximum,
            fuzz: info.fuzz,
            flat: info.flat,
            resolution: info.resolution,
        }
    }
}

/// Identity and capability queries against one device.
///
/// Bitset queries fill `buf` and return how many bytes the device wrote.
pub trait DeviceQuery {
    fn name(&self) -> io::Result<String>;
    fn driver_version(&self) -> io::Result<i32>;
    fn input_id(&self) -> io::Result<InputId>;
    /// Supported codes of `class`; class 0 yields the supported classes.
    fn event_bits(&self, class: u16, buf: &mut [u8]) -> io::Result<usize>;
    fn state_bits(&self, kind: StateKind, buf: &mut [u8]) -> io::Result<usize>;
    /// Key repeat delay and period in milliseconds.
    fn key_repeat(&self) -> io::Result<(u32, u32)>;
    fn abs_info(&self, axis: u16) -> io::Result<AbsInfo>;
}

/// An open `/dev/input/event*` node.
#[derive(Debug)]
pub struct EventDevice {
    file: File,
}

impl EventDevice {
    /// Open read-only, for inspection.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self { file })
    }

    pub fn into_file(self) -> File {
        self.file
    }
}

impl AsFd for EventDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl DeviceQuery for EventDevice {
    fn name(&self) -> io::Result<String> {
        let mut buf = [0u8; NAME_LEN];
        ioctl::name(self.as_fd(), &mut buf)
    }

    fn driver_version(&self) -> io::Result<i32> {
        ioctl::version(self.as_fd())
    }

    fn input_id(&self) -> io::Result<InputId> {
        ioctl::input_id(self.as_fd()).map(InputId::from)
    }

    fn event_bits(&self, class: u16, buf: &mut [u8]) -> io::Result<usize> {
        ioctl::event_bits(self.as_fd(), class, buf)
    }

    fn state_bits(&self, kind: StateKind, buf: &mut [u8]) -> io::Result<usize> {
        ioctl::state_bits(self.as_fd(), kind, buf)
    }

    fn key_repeat(&self) -> io::Result<(u32, u32)> {
        ioctl::repeat(self.as_fd()).map(|[delay, period]| (delay, period))
    }

    fn abs_info(&self, axis: u16) -> io::Result<AbsInfo> {
        ioctl::abs_info(self.as_fd(), axis).map(AbsInfo::from)
    }
}

/// How a handle's byte stream is framed.
#[derive(Debug)]
pub enum DeviceKind {
    /// Native `struct input_event` records.
    Native,
    /// Three-octet mouse packets, translated into event frames.
    Legacy(MouseTranslator),
}

impl DeviceKind {
    pub fn is_legacy(&self) -> bool {
        matches!(self, DeviceKind::Legacy(_))
    }
}

/// A validated device owned by the monitor.
#[derive(Debug)]
pub struct DeviceHandle {
    label: String,
    file: File,
    kind: DeviceKind,
    /// Name and identity the device was validated with; `None` for legacy nodes
    name: Option<String>,
    id: Option<InputId>,
}

/// Open a device node read/write.
pub fn open_rw(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

fn open_error(path: &Path, source: io::Error) -> DeviceError {
    if source.kind() == io::ErrorKind::PermissionDenied {
        DeviceError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        DeviceError::Open {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl DeviceHandle {
    /// Wrap an already-open stream. `label` prefixes every emitted line.
    pub fn new(label: impl Into<String>, file: File, kind: DeviceKind) -> Self {
        Self {
            label: label.into(),
            file,
            kind,
            name: None,
            id: None,
        }
    }

    /// Open `path` read/write and validate it.
    ///
    /// Native devices must report [`EV_VERSION`]; their name and identity are
    /// queried and logged. Legacy devices (path matches one of
    /// `legacy_patterns`) carry no identity and skip the queries.
    pub fn acquire<T: CodeTable>(
        path: &Path,
        legacy_patterns: &[String],
        symbols: &SymbolResolver<T>,
    ) -> Result<Self, DeviceError> {
        let file = open_rw(path).map_err(|e| open_error(path, e))?;
        Self::validate(path, file, legacy_patterns, symbols)
    }

    /// Validate an already-opened node at `path`.
    pub fn validate<T: CodeTable>(
        path: &Path,
        file: File,
        legacy_patterns: &[String],
        symbols: &SymbolResolver<T>,
    ) -> Result<Self, DeviceError> {
        let label = path.display().to_string();

        if is_legacy_path(path, legacy_patterns) {
            info!("{label} name='mouse'");
            return Ok(Self::new(label, file, DeviceKind::Legacy(MouseTranslator::new())));
        }

        let device = EventDevice { file };
        let query_err = |query: &'static str| {
            let path = path.to_path_buf();
            move |source| DeviceError::Query {
                path,
                query,
                source,
            }
        };
        let version = device
            .driver_version()
            .map_err(query_err("EVIOCGVERSION"))?;
        if version != EV_VERSION {
            return Err(DeviceError::UnsupportedVersion {
                path: path.to_path_buf(),
                version,
            });
        }
        let name = device.name().map_err(query_err("EVIOCGNAME"))?;
        let id = device.input_id().map_err(query_err("EVIOCGID"))?;
        info!(
            "{label} name='{name}' bus={} ({}) vendor={} product={} version={}",
            id.bus_type,
            symbols.bus_name(id.bus_type),
            id.vendor,
            id.product,
            id.version
        );

        Ok(Self {
            label,
            file: device.into_file(),
            kind: DeviceKind::Native,
            name: Some(name),
            id: Some(id),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn id(&self) -> Option<InputId> {
        self.id
    }

    pub(crate) fn parts_mut(&mut self) -> (&str, &mut File, &mut DeviceKind) {
        (&self.label, &mut self.file, &mut self.kind)
    }
}

impl AsFd for DeviceHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

fn is_legacy_path(path: &Path, patterns: &[String]) -> bool {
    let path = path.to_string_lossy();
    patterns.iter().any(|p| path.contains(p.as_str()))
}

/// Paths tried, in order, for a device argument such as `event3`, `3`,
/// `input/mice` or a full path.
pub fn candidate_paths(arg: &str, input_dir: &Path) -> Vec<PathBuf> {
    vec![
        PathBuf::from(arg),
        Path::new("/dev").join(arg),
        input_dir.join(arg),
        input_dir.join(format!("event{arg}")),
    ]
}

/// Resolve and acquire every device argument, in order.
///
/// Permission and validation failures are fatal straight away; a candidate
/// that merely fails to open moves on to the next candidate.
pub fn acquire_all<T: CodeTable>(
    args: &[String],
    settings: &Settings,
    symbols: &SymbolResolver<T>,
) -> Result<Vec<DeviceHandle>, DeviceError> {
    acquire_all_with(args, settings, symbols, open_rw)
}

/// [`acquire_all`] with the node opener supplied by the caller.
pub fn acquire_all_with<T, F>(
    args: &[String],
    settings: &Settings,
    symbols: &SymbolResolver<T>,
    mut open: F,
) -> Result<Vec<DeviceHandle>, DeviceError>
where
    T: CodeTable,
    F: FnMut(&Path) -> io::Result<File>,
{
    if args.len() > settings.max_devices {
        return Err(DeviceError::TooManyDevices {
            limit: settings.max_devices,
        });
    }

    let mut handles = Vec::with_capacity(args.len());
    for arg in args {
        let handle = candidate_paths(arg, &settings.input_dir)
            .into_iter()
            .find_map(|path| {
                let acquired = open(&path)
                    .map_err(|e| open_error(&path, e))
                    .and_then(|file| {
                        DeviceHandle::validate(&path, file, &settings.legacy_patterns, symbols)
                    });
                match acquired {
                    Err(DeviceError::Open { path, source }) => {
                        debug!("{}: {source}", path.display());
                        None
                    }
                    other => Some(other),
                }
            })
            .unwrap_or_else(|| Err(DeviceError::NotFound(arg.clone())))?;
        handles.push(handle);
    }
    Ok(handles)
}
