//! Hardware-dependent tests that require real input devices
//!
//! These tests are ignored by default and can be run with:
//! `cargo test -- --ignored`
//!
//! They require:
//! - At least one `/dev/input/event*` node
//! - Read permission on those nodes (root, or membership in the `input` group)
//! - A mouse for the legacy `/dev/input/mice` tests

use evtools::caps;
use evtools::{DeviceHandle, EventDevice, Settings, SymbolResolver};
use std::path::Path;

/// Every event node should walk cleanly and report EV_SYN-free classes
#[test]
#[ignore]
fn test_real_walk_event_nodes() {
    let nodes = caps::event_nodes(Path::new("/dev/input")).expect("Can't read /dev/input");
    println!("Found {} input event devices", nodes.len());
    assert!(!nodes.is_empty(), "No input event devices found");

    let symbols = SymbolResolver::linux();
    let results = caps::scan(nodes, |path: &Path| EventDevice::open(path), &symbols);
    let reports: Vec<_> = results.into_iter().filter_map(Result::ok).collect();
    assert!(!reports.is_empty(), "No device could be walked (permissions?)");

    for report in &reports {
        print!("{report}");
        assert!(report.classes.iter().all(|c| c.class != 0));
    }
}

/// At least one device should advertise keys
#[test]
#[ignore]
fn test_real_keyboard_present() {
    let nodes = caps::event_nodes(Path::new("/dev/input")).expect("Can't read /dev/input");
    let symbols = SymbolResolver::linux();
    let has_keys = caps::scan(nodes, |path: &Path| EventDevice::open(path), &symbols)
        .into_iter()
        .filter_map(Result::ok)
        .any(|report| report.classes.iter().any(|c| c.name == "EV_KEY"));
    assert!(has_keys, "No device reports EV_KEY");
}

/// The multiplexed mouse node is opened as a legacy device without queries
#[test]
#[ignore]
fn test_real_legacy_mice_acquire() {
    let path = Path::new("/dev/input/mice");
    assert!(path.exists(), "/dev/input/mice not found");

    let settings = Settings::default();
    let handle = DeviceHandle::acquire(path, &settings.legacy_patterns, &SymbolResolver::linux())
        .expect("Failed to open /dev/input/mice (are you root?)");
    assert!(handle.kind().is_legacy());
    assert_eq!(handle.label(), "/dev/input/mice");
}

/// A native node passes the version and identity checks
#[test]
#[ignore]
fn test_real_native_acquire() {
    let nodes = caps::event_nodes(Path::new("/dev/input")).expect("Can't read /dev/input");
    let first = nodes.first().expect("No input event devices found");

    let handle = DeviceHandle::acquire(first, &[], &SymbolResolver::linux())
        .expect("Failed to acquire event device (are you root?)");
    assert!(!handle.kind().is_legacy());
    assert!(handle.id().is_some());
    println!("{} is '{}'", handle.label(), handle.name().unwrap_or_default());
}
