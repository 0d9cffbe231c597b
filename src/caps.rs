//! Capability walking
//!
//! [`walk`] asks a device which event classes it supports and, per class,
//! what it can report: active keys, relative and misc codes, absolute axes
//! with their calibration, and switch/LED/sound codes with their live state.
//! [`scan`] walks several devices in turn, abandoning only the device that
//! fails.

use crate::codes::{ABS_MAX, EV_MAX, EV_VERSION, KEY_MAX, LED_MAX, MSC_MAX, REL_MAX, SND_MAX, SW_MAX};
use crate::device::{AbsInfo, DeviceQuery, InputId};
use crate::error::WalkError;
use crate::ioctl::StateKind;
use crate::symbols::{CodeTable, SymbolResolver};
use evdev::EventType;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bytes needed for a bitset covering codes `0..=max`.
fn bitset_len(max: u16) -> usize {
    usize::from(max) / 8 + 1
}

fn bit_set(bits: &[u8], bit: u16) -> bool {
    let bit = usize::from(bit);
    bits.get(bit / 8).is_some_and(|b| b & (1 << (bit % 8)) != 0)
}

/// Set bits of `bits` in `0..=max`.
fn set_bits(bits: &[u8], max: u16) -> impl Iterator<Item = u16> + '_ {
    (0..=max).filter(move |&b| bit_set(bits, b))
}

/// A code paired with its symbolic name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub code: u16,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    pub code: u16,
    pub name: String,
    /// `None` when the calibration query failed
    pub info: Option<AbsInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: u16,
    pub name: String,
    /// `None` when the device would not report live state
    pub active: Option<bool>,
}

/// Per-class detail gathered by the secondary query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassDetail {
    /// Class has no secondary query, or it failed
    None,
    Keys {
        repeat: Option<(u32, u32)>,
        active: Vec<Code>,
    },
    Relative(Vec<Code>),
    Misc(Vec<Code>),
    Axes(Vec<Axis>),
    Switches(Vec<Status>),
    Leds(Vec<Status>),
    Sounds(Vec<Status>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassReport {
    pub class: u16,
    pub name: String,
    pub detail: ClassDetail,
}

/// Everything learned about one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityReport {
    pub path: PathBuf,
    pub name: Option<String>,
    pub id: InputId,
    pub bus_name: String,
    pub classes: Vec<ClassReport>,
}

/// Walk one device. Only the identity checks and the class bitset query can
/// fail the walk; every per-class query is best effort.
pub fn walk<D, T>(
    path: &Path,
    device: &D,
    symbols: &SymbolResolver<T>,
) -> Result<CapabilityReport, WalkError>
where
    D: DeviceQuery,
    T: CodeTable,
{
    let query_err = |query: &'static str| {
        move |source| WalkError::Query {
            path: path.to_path_buf(),
            query,
            source,
        }
    };

    let name = match device.name() {
        Ok(name) if !name.is_empty() => Some(name),
        Ok(_) => None,
        Err(e) => {
            debug!("{}: EVIOCGNAME failed: {e}", path.display());
            None
        }
    };

    let version = device
        .driver_version()
        .map_err(query_err("EVIOCGVERSION"))?;
    if version != EV_VERSION {
        return Err(WalkError::UnsupportedVersion {
            path: path.to_path_buf(),
            version,
        });
    }
    let id = device.input_id().map_err(query_err("EVIOCGID"))?;

    let mut classes = vec![0u8; bitset_len(EV_MAX)];
    let got = device
        .event_bits(0, &mut classes)
        .map_err(query_err("EVIOCGBIT(0)"))?;
    if got != classes.len() {
        return Err(WalkError::BitsetSize {
            path: path.to_path_buf(),
            expected: classes.len(),
            got,
        });
    }

    // Bit 0 is EV_SYN, which every device has and which has nothing to list
    let reports = set_bits(&classes, EV_MAX)
        .filter(|&class| class != 0)
        .map(|class| ClassReport {
            class,
            name: symbols.class_name(class).to_string(),
            detail: class_detail(device, class, symbols),
        })
        .collect();

    Ok(CapabilityReport {
        path: path.to_path_buf(),
        name,
        id,
        bus_name: symbols.bus_name(id.bus_type).to_string(),
        classes: reports,
    })
}

fn class_detail<D: DeviceQuery, T: CodeTable>(
    device: &D,
    class: u16,
    symbols: &SymbolResolver<T>,
) -> ClassDetail {
    let code = |code: u16| Code {
        code,
        name: symbols.code_name(class, code).to_string(),
    };

    match EventType(class) {
        EventType::KEY => {
            let repeat = device.key_repeat().ok();
            // Every supported key would be hundreds of lines; held keys are the
            // interesting part.
            let active: Vec<Code> = query_bits(|buf| device.state_bits(StateKind::Key, buf), KEY_MAX)
                .map(|bits| set_bits(&bits, KEY_MAX).map(code).collect())
                .unwrap_or_default();
            ClassDetail::Keys { repeat, active }
        }
        EventType::RELATIVE => supported(device, class, REL_MAX)
            .map(|bits| ClassDetail::Relative(set_bits(&bits, REL_MAX).map(code).collect()))
            .unwrap_or(ClassDetail::None),
        EventType::MISC => supported(device, class, MSC_MAX)
            .map(|bits| ClassDetail::Misc(set_bits(&bits, MSC_MAX).map(code).collect()))
            .unwrap_or(ClassDetail::None),
        EventType::ABSOLUTE => supported(device, class, ABS_MAX)
            .map(|bits| {
                let axes = set_bits(&bits, ABS_MAX)
                    .map(|axis| Axis {
                        code: axis,
                        name: symbols.code_name(class, axis).to_string(),
                        info: device.abs_info(axis).ok(),
                    })
                    .collect();
                ClassDetail::Axes(axes)
            })
            .unwrap_or(ClassDetail::None),
        EventType::SWITCH => statuses(device, class, StateKind::Switch, SW_MAX, symbols)
            .map(ClassDetail::Switches)
            .unwrap_or(ClassDetail::None),
        EventType::LED => statuses(device, class, StateKind::Led, LED_MAX, symbols)
            .map(ClassDetail::Leds)
            .unwrap_or(ClassDetail::None),
        EventType::SOUND => statuses(device, class, StateKind::Sound, SND_MAX, symbols)
            .map(ClassDetail::Sounds)
            .unwrap_or(ClassDetail::None),
        _ => ClassDetail::None,
    }
}

/// Run a bitset query sized for `0..=max`; `None` unless it fills the buffer.
fn query_bits(query: impl FnOnce(&mut [u8]) -> io::Result<usize>, max: u16) -> Option<Vec<u8>> {
    let mut bits = vec![0u8; bitset_len(max)];
    match query(&mut bits) {
        Ok(n) if n == bits.len() => Some(bits),
        _ => None,
    }
}

fn supported<D: DeviceQuery>(device: &D, class: u16, max: u16) -> Option<Vec<u8>> {
    query_bits(|buf| device.event_bits(class, buf), max)
}

fn statuses<D: DeviceQuery, T: CodeTable>(
    device: &D,
    class: u16,
    kind: StateKind,
    max: u16,
    symbols: &SymbolResolver<T>,
) -> Option<Vec<Status>> {
    let supported = supported(device, class, max)?;
    let state = query_bits(|buf| device.state_bits(kind, buf), max);
    let entries = set_bits(&supported, max)
        .map(|code| Status {
            code,
            name: symbols.code_name(class, code).to_string(),
            active: state.as_ref().map(|bits| bit_set(bits, code)),
        })
        .collect();
    Some(entries)
}

/// Outcome of walking one device during a [`scan`].
pub type ScanResult = Result<CapabilityReport, WalkError>;

/// Walk every path in order. `open` returning `NotFound` skips the path
/// silently; any other failure is logged and the scan moves on.
pub fn scan<D, T, I, F>(paths: I, mut open: F, symbols: &SymbolResolver<T>) -> Vec<ScanResult>
where
    D: DeviceQuery,
    T: CodeTable,
    I: IntoIterator<Item = PathBuf>,
    F: FnMut(&Path) -> io::Result<D>,
{
    let mut results = Vec::new();
    for path in paths {
        let result = match open(&path) {
            Ok(device) => walk(&path, &device, symbols),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{}: not present", path.display());
                continue;
            }
            Err(source) => Err(WalkError::Open {
                path: path.clone(),
                source,
            }),
        };
        if let Err(e) = &result {
            warn!("{e}");
        }
        results.push(result);
    }
    results
}

/// Event device nodes under `dir`, ordered by their number.
pub fn event_nodes(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut nodes: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = name.to_str()?.strip_prefix("event")?.parse().ok()?;
            Some((index, entry.path()))
        })
        .collect();
    nodes.sort();
    Ok(nodes.into_iter().map(|(_, path)| path).collect())
}

fn write_codes(f: &mut fmt::Formatter<'_>, label: &str, codes: &[Code]) -> fmt::Result {
    for c in codes {
        writeln!(f, "    {label} {} is {}", c.code, c.name)?;
    }
    Ok(())
}

/// `kind` is `(lower, title)` case, e.g. `("switch", "Switch")`.
fn write_statuses(
    f: &mut fmt::Formatter<'_>,
    (kind, title): (&str, &str),
    entries: &[Status],
) -> fmt::Result {
    for s in entries {
        match s.active {
            Some(true) => writeln!(f, "    Active {kind} {} is {}", s.code, s.name)?,
            Some(false) => writeln!(f, "    Inactive {kind} {} is {}", s.code, s.name)?,
            None => writeln!(f, "    {title} {} is {}", s.code, s.name)?,
        }
    }
    Ok(())
}

impl fmt::Display for CapabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.path.display())?;
        writeln!(f, "  Name \"{}\"", self.name.as_deref().unwrap_or("Name unknown"))?;
        writeln!(f, "  Vendor {}", self.id.vendor)?;
        writeln!(f, "  Product {}", self.id.product)?;
        writeln!(f, "  Version {}", self.id.version)?;
        writeln!(f, "  Bus type {} is {}", self.id.bus_type, self.bus_name)?;

        for class in &self.classes {
            writeln!(f, "  Capability {} is {}", class.class, class.name)?;
            match &class.detail {
                ClassDetail::None => {}
                ClassDetail::Keys { repeat, active } => {
                    if let Some((delay, period)) = repeat {
                        writeln!(f, "    Repeat delay {delay} mS")?;
                        writeln!(f, "    Repeat period {period} mS")?;
                    }
                    write_codes(f, "Active key", active)?;
                }
                ClassDetail::Relative(codes) => write_codes(f, "Relative event", codes)?,
                ClassDetail::Misc(codes) => write_codes(f, "Misc event", codes)?,
                ClassDetail::Axes(axes) => {
                    for axis in axes {
                        writeln!(f, "    Axis {} is {}", axis.code, axis.name)?;
                        if let Some(i) = &axis.info {
                            writeln!(f, "      Value     : {}", i.value)?;
                            writeln!(f, "      Minimum   : {}", i.minimum)?;
                            writeln!(f, "      Maximum   : {}", i.maximum)?;
                            writeln!(f, "      Fuzz      : {}", i.fuzz)?;
                            writeln!(f, "      Flat      : {}", i.flat)?;
                            writeln!(f, "      Resolution: {}", i.resolution)?;
                        }
                    }
                }
                ClassDetail::Switches(entries) => write_statuses(f, ("switch", "Switch"), entries)?,
                ClassDetail::Leds(entries) => write_statuses(f, ("LED", "LED"), entries)?,
                ClassDetail::Sounds(entries) => write_statuses(f, ("sound", "Sound"), entries)?,
            }
        }
        Ok(())
    }
}
