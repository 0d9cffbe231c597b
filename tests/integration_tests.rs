//! Integration tests for evtools
//!
//! The capability walker runs against fake devices; the multiplexer runs
//! against Unix socket pairs standing in for device nodes.

use evtools::caps::{self, Axis, ClassDetail, Code, Status};
use evtools::error::{MonitorError, WalkError};
use evtools::{
    AbsInfo, DeviceHandle, DeviceKind, DeviceQuery, EventFilter, EventRecord, InputId, Monitor,
    MouseTranslator, StateKind, SymbolResolver, Timestamp,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

const EV_VERSION: i32 = 0x010001;

#[derive(Clone, Default)]
struct FakeDevice {
    name: String,
    version: i32,
    id: InputId,
    /// Byte count reported by the class bitset query, if not the full buffer
    class_bits_len: Option<usize>,
    supported: HashMap<u16, Vec<u16>>,
    state: Vec<(StateKind, Vec<u16>)>,
    repeat: Option<(u32, u32)>,
    abs: HashMap<u16, AbsInfo>,
}

fn fill(buf: &mut [u8], codes: &[u16]) {
    for &c in codes {
        let c = usize::from(c);
        if let Some(byte) = buf.get_mut(c / 8) {
            *byte |= 1 << (c % 8);
        }
    }
}

fn unsupported() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "not supported")
}

impl DeviceQuery for FakeDevice {
    fn name(&self) -> io::Result<String> {
        Ok(self.name.clone())
    }

    fn driver_version(&self) -> io::Result<i32> {
        Ok(self.version)
    }

    fn input_id(&self) -> io::Result<InputId> {
        Ok(self.id)
    }

    fn event_bits(&self, class: u16, buf: &mut [u8]) -> io::Result<usize> {
        if class == 0 {
            let mut classes: Vec<u16> = self.supported.keys().copied().collect();
            classes.push(0);
            fill(buf, &classes);
            return Ok(self.class_bits_len.unwrap_or(buf.len()));
        }
        let codes = self.supported.get(&class).ok_or_else(unsupported)?;
        fill(buf, codes);
        Ok(buf.len())
    }

    fn state_bits(&self, kind: StateKind, buf: &mut [u8]) -> io::Result<usize> {
        let (_, codes) = self
            .state
            .iter()
            .find(|(k, _)| *k == kind)
            .ok_or_else(unsupported)?;
        fill(buf, codes);
        Ok(buf.len())
    }

    fn key_repeat(&self) -> io::Result<(u32, u32)> {
        self.repeat.ok_or_else(unsupported)
    }

    fn abs_info(&self, axis: u16) -> io::Result<AbsInfo> {
        self.abs.get(&axis).copied().ok_or_else(unsupported)
    }
}

fn keyboard() -> FakeDevice {
    FakeDevice {
        name: "AT Translated Set 2 keyboard".to_string(),
        version: EV_VERSION,
        id: InputId {
            bus_type: 0x11,
            vendor: 1,
            product: 1,
            version: 0xab41,
        },
        supported: HashMap::from([
            (0x01, vec![1, 28, 30]),
            (0x04, vec![4]),
            (0x11, vec![0, 1, 2]),
            (0x14, vec![]),
        ]),
        state: vec![(StateKind::Key, vec![28]), (StateKind::Led, vec![1])],
        repeat: Some((250, 33)),
        ..Default::default()
    }
}

fn touchpad() -> FakeDevice {
    FakeDevice {
        name: "Touchpad".to_string(),
        version: EV_VERSION,
        supported: HashMap::from([(0x01, vec![0x110]), (0x03, vec![0, 1])]),
        abs: HashMap::from([(
            0,
            AbsInfo {
                value: 10,
                minimum: 0,
                maximum: 1200,
                fuzz: 0,
                flat: 0,
                resolution: 12,
            },
        )]),
        ..Default::default()
    }
}

fn code(code: u16, name: &str) -> Code {
    Code {
        code,
        name: name.to_string(),
    }
}

#[test]
fn test_walk_keyboard() {
    let report = caps::walk(
        Path::new("/dev/input/event0"),
        &keyboard(),
        &SymbolResolver::linux(),
    )
    .unwrap();

    assert_eq!(report.name.as_deref(), Some("AT Translated Set 2 keyboard"));
    assert_eq!(report.bus_name, "BUS_I8042");
    let classes: Vec<(u16, &str)> = report
        .classes
        .iter()
        .map(|c| (c.class, c.name.as_str()))
        .collect();
    assert_eq!(
        classes,
        vec![(1, "EV_KEY"), (4, "EV_MSC"), (0x11, "EV_LED"), (0x14, "EV_REP")]
    );

    // Only held keys are listed, not every supported key
    assert_eq!(
        report.classes[0].detail,
        ClassDetail::Keys {
            repeat: Some((250, 33)),
            active: vec![code(28, "KEY_ENTER")],
        }
    );
    assert_eq!(
        report.classes[1].detail,
        ClassDetail::Misc(vec![code(4, "MSC_SCAN")])
    );
    let leds = match &report.classes[2].detail {
        ClassDetail::Leds(leds) => leds,
        other => panic!("expected LEDs, got {other:?}"),
    };
    assert_eq!(
        leds.iter().map(|s| s.active).collect::<Vec<_>>(),
        vec![Some(false), Some(true), Some(false)]
    );
    // No secondary query for EV_REP
    assert_eq!(report.classes[3].detail, ClassDetail::None);
}

#[test]
fn test_walk_axes_with_and_without_calibration() {
    let report = caps::walk(Path::new("touchpad"), &touchpad(), &SymbolResolver::linux()).unwrap();
    let axes = match &report.classes[1].detail {
        ClassDetail::Axes(axes) => axes.clone(),
        other => panic!("expected axes, got {other:?}"),
    };
    assert_eq!(axes.len(), 2);
    assert_eq!(axes[0].name, "ABS_X");
    assert_eq!(axes[0].info.map(|i| i.maximum), Some(1200));
    assert_eq!(
        axes[1],
        Axis {
            code: 1,
            name: "ABS_Y".to_string(),
            info: None,
        }
    );
    // Keys present but no live key state: nothing listed, and no repeat
    assert_eq!(
        report.classes[0].detail,
        ClassDetail::Keys {
            repeat: None,
            active: vec![],
        }
    );
}

#[test]
fn test_walk_status_unavailable_is_unqualified() {
    let lid = FakeDevice {
        name: "Lid Switch".to_string(),
        version: EV_VERSION,
        supported: HashMap::from([(0x05, vec![0])]),
        ..Default::default()
    };
    let report = caps::walk(Path::new("lid"), &lid, &SymbolResolver::linux()).unwrap();
    assert_eq!(
        report.classes[0].detail,
        ClassDetail::Switches(vec![Status {
            code: 0,
            name: "SW_LID".to_string(),
            active: None,
        }])
    );
    assert!(report.to_string().contains("    Switch 0 is SW_LID\n"));
}

#[test]
fn test_walk_rejects_wrong_version() {
    let old = FakeDevice {
        version: 0x010000,
        ..keyboard()
    };
    let err = caps::walk(Path::new("old"), &old, &SymbolResolver::linux()).unwrap_err();
    assert!(matches!(err, WalkError::UnsupportedVersion { version: 0x010000, .. }));
}

#[test]
fn test_scan_skips_broken_device() {
    let broken = FakeDevice {
        class_bits_len: Some(1),
        ..keyboard()
    };
    let mut devices = HashMap::from([
        (PathBuf::from("/dev/input/event0"), broken),
        (PathBuf::from("/dev/input/event2"), touchpad()),
    ]);
    let paths = vec![
        PathBuf::from("/dev/input/event0"),
        PathBuf::from("/dev/input/event1"),
        PathBuf::from("/dev/input/event2"),
    ];

    let results = caps::scan(
        paths,
        |path: &Path| {
            devices
                .remove(path)
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        },
        &SymbolResolver::linux(),
    );

    // event1 doesn't exist and is skipped without a result
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0],
        Err(WalkError::BitsetSize {
            expected: 4,
            got: 1,
            ..
        })
    ));
    let report = results[1].as_ref().unwrap();
    assert_eq!(report.path, PathBuf::from("/dev/input/event2"));
    assert_eq!(report.classes.len(), 2);
}

#[test]
fn test_scan_reports_open_failure_and_continues() {
    let results = caps::scan(
        vec![PathBuf::from("denied"), PathBuf::from("ok")],
        |path: &Path| {
            if path == Path::new("denied") {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            } else {
                Ok(touchpad())
            }
        },
        &SymbolResolver::linux(),
    );
    assert!(matches!(results[0], Err(WalkError::Open { .. })));
    assert!(results[1].is_ok());
}

#[test]
fn test_report_text() {
    let report = caps::walk(
        Path::new("/dev/input/event0"),
        &keyboard(),
        &SymbolResolver::linux(),
    )
    .unwrap();
    let text = report.to_string();
    assert!(text.starts_with("/dev/input/event0:\n  Name \"AT Translated Set 2 keyboard\"\n"));
    assert!(text.contains("  Capability 1 is EV_KEY\n    Repeat delay 250 mS\n    Repeat period 33 mS\n    Active key 28 is KEY_ENTER\n"));
    assert!(text.contains("    Misc event 4 is MSC_SCAN\n"));
    assert!(text.contains("    Inactive LED 0 is LED_NUML\n    Active LED 1 is LED_CAPSL\n"));
    assert!(text.ends_with("  Capability 20 is EV_REP\n"));
}

/// A device stand-in: the test writes to the stream, the monitor reads the file.
fn fake_node() -> (UnixStream, File) {
    let (writer, reader) = UnixStream::pair().unwrap();
    (writer, File::from(OwnedFd::from(reader)))
}

fn native(label: &str) -> (UnixStream, DeviceHandle) {
    let (writer, file) = fake_node();
    (writer, DeviceHandle::new(label, file, DeviceKind::Native))
}

fn lines(monitor: &Monitor<Vec<u8>>) -> Vec<String> {
    String::from_utf8(monitor.output().clone())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_monitor_only_services_ready_device() {
    let (mut first, first_dev) = native("first");
    let (mut second, second_dev) = native("second");
    let mut monitor = Monitor::new(
        vec![first_dev, second_dev],
        EventFilter::default(),
        SymbolResolver::linux(),
        Vec::new(),
    );

    let press = EventRecord::new(Timestamp::new(1700000000, 250), 1, 30, 1);
    first.write_all(&press.encode()).unwrap();
    assert_eq!(monitor.poll_once().unwrap(), 1);
    assert_eq!(
        lines(&monitor),
        vec!["first 1700000000.000250 type=1 (EV_KEY) code=30 (KEY_A) value=1"]
    );

    // The idle device's stream was left alone and is serviced once it has data
    let release = EventRecord::new(Timestamp::new(1700000001, 0), 1, 30, 0);
    second.write_all(&release.encode()).unwrap();
    assert_eq!(monitor.poll_once().unwrap(), 1);
    assert_eq!(
        lines(&monitor)[1],
        "second 1700000001.000000 type=1 (EV_KEY) code=30 (KEY_A) value=0"
    );
}

#[test]
fn test_monitor_services_devices_in_index_order() {
    let (mut first, first_dev) = native("first");
    let (mut second, second_dev) = native("second");
    let mut monitor = Monitor::new(
        vec![first_dev, second_dev],
        EventFilter::default(),
        SymbolResolver::linux(),
        Vec::new(),
    );
    second
        .write_all(&EventRecord::new(Timestamp::new(2, 0), 2, 0, 7).encode())
        .unwrap();
    first
        .write_all(&EventRecord::new(Timestamp::new(3, 0), 2, 1, -7).encode())
        .unwrap();

    assert_eq!(monitor.poll_once().unwrap(), 2);
    let out = lines(&monitor);
    assert!(out[0].starts_with("first 3.000000 type=2 (EV_REL) code=1 (REL_Y) value=-7"));
    assert!(out[1].starts_with("second 2.000000 type=2 (EV_REL) code=0 (REL_X) value=7"));
}

#[test]
fn test_monitor_translates_legacy_mouse() {
    let (mut mouse, file) = fake_node();
    let handle = DeviceHandle::new(
        "/dev/input/mice",
        file,
        DeviceKind::Legacy(MouseTranslator::new()),
    );
    let mut monitor = Monitor::new(
        vec![handle],
        EventFilter::default(),
        SymbolResolver::linux(),
        Vec::new(),
    );

    mouse.write_all(&[0b011, 5, (-3i8) as u8]).unwrap();
    assert_eq!(monitor.poll_once().unwrap(), 5);
    let tails: Vec<String> = lines(&monitor)
        .iter()
        .map(|l| l.split_once(" type=").unwrap().1.to_string())
        .collect();
    assert_eq!(
        tails,
        vec![
            "1 (EV_KEY) code=272 (BTN_LEFT) value=1",
            "1 (EV_KEY) code=273 (BTN_RIGHT) value=1",
            "2 (EV_REL) code=0 (REL_X) value=5",
            "2 (EV_REL) code=1 (REL_Y) value=3",
            "0 (EV_SYN) code=0 (SYN_REPORT) value=0",
        ]
    );
}

#[test]
fn test_monitor_filters_silently() {
    let (mut node, handle) = native("kbd");
    let filter = EventFilter {
        class: Some(1),
        value: Some(1),
        ..Default::default()
    };
    let mut monitor = Monitor::new(vec![handle], filter, SymbolResolver::linux(), Vec::new());

    node.write_all(&EventRecord::new(Timestamp::new(1, 0), 4, 4, 30).encode())
        .unwrap();
    assert_eq!(monitor.poll_once().unwrap(), 0);
    node.write_all(&EventRecord::new(Timestamp::new(1, 1), 1, 30, 1).encode())
        .unwrap();
    assert_eq!(monitor.poll_once().unwrap(), 1);
    assert_eq!(lines(&monitor).len(), 1);
}

#[test]
fn test_monitor_partial_record_is_fatal() {
    let (mut node, handle) = native("kbd");
    let mut monitor = Monitor::new(
        vec![handle],
        EventFilter::default(),
        SymbolResolver::linux(),
        Vec::new(),
    );
    node.write_all(&[0u8; 10]).unwrap();
    let err = monitor.poll_once().unwrap_err();
    assert!(matches!(err, MonitorError::ShortRead { got: 10, .. }));
}

#[test]
fn test_monitor_disconnect_is_fatal() {
    let (node, handle) = native("kbd");
    let mut monitor = Monitor::new(
        vec![handle],
        EventFilter::default(),
        SymbolResolver::linux(),
        Vec::new(),
    );
    drop(node);
    let err = monitor.poll_once().unwrap_err();
    assert!(matches!(err, MonitorError::ShortRead { got: 0, ref device, .. } if device == "kbd"));
}

#[test]
fn test_monitor_short_mouse_packet_is_fatal() {
    let (mut mouse, file) = fake_node();
    let handle = DeviceHandle::new("mice", file, DeviceKind::Legacy(MouseTranslator::new()));
    let mut monitor = Monitor::new(
        vec![handle],
        EventFilter::default(),
        SymbolResolver::linux(),
        Vec::new(),
    );
    mouse.write_all(&[1, 2]).unwrap();
    let err = monitor.poll_once().unwrap_err();
    assert!(matches!(err, MonitorError::ShortRead { expected: 3, got: 2, .. }));
}
