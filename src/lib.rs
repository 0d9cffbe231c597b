//! evtools - Linux input device inspection
//!
//! Two read-only views of `/dev/input` devices:
//!
//! - [`monitor`]: multiplexes live event streams from several devices and
//!   prints each event with symbolic names (`evdump`). Legacy three-octet
//!   mouse nodes are emulated as regular relative pointers by [`mouse`].
//! - [`caps`]: walks a device's capability bitsets and live key/switch/LED/
//!   sound state (`evls`).
//!
//! Names come from [`symbols`], backed by the kernel tables in [`codes`].

pub mod caps;
pub mod codes;
pub mod device;
pub mod error;
pub mod event;
pub mod filter;
mod ioctl;
pub mod logging;
pub mod monitor;
pub mod mouse;
pub mod settings;
pub mod symbols;

pub use caps::{CapabilityReport, ClassDetail, ClassReport};
pub use device::{AbsInfo, DeviceHandle, DeviceKind, DeviceQuery, EventDevice, InputId};
pub use error::{DeviceError, MonitorError, SettingsError, WalkError};
pub use event::{EventRecord, Timestamp};
pub use filter::EventFilter;
pub use ioctl::StateKind;
pub use monitor::Monitor;
pub use mouse::MouseTranslator;
pub use settings::Settings;
pub use symbols::{CodeTable, LinuxCodes, SymbolResolver, Table};
