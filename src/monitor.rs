//! Event multiplexer
//!
//! Waits on every device at once with `poll(2)`, then services each ready
//! device in index order with a single read: one native record, or one
//! three-octet packet run through the device's [`MouseTranslator`]. Records
//! that pass the filter are written as one line each and flushed immediately.
//!
//! Any wait or read failure ends monitoring for all devices.
//!
//! [`MouseTranslator`]: crate::mouse::MouseTranslator

use crate::device::{DeviceHandle, DeviceKind};
use crate::error::MonitorError;
use crate::event::{EventRecord, RAW_EVENT_SIZE, Timestamp};
use crate::filter::EventFilter;
use crate::mouse::PACKET_SIZE;
use crate::symbols::{CodeTable, LinuxCodes, SymbolResolver};
use std::convert::Infallible;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd};
use tracing::debug;

/// Readiness flags that mean "a read won't block". Hang-up and error count so
/// a vanished device fails its read instead of spinning the wait.
const READY: libc::c_short = libc::POLLIN | libc::POLLHUP | libc::POLLERR;

pub struct Monitor<W, T = LinuxCodes> {
    devices: Vec<DeviceHandle>,
    pollfds: Vec<libc::pollfd>,
    filter: EventFilter,
    symbols: SymbolResolver<T>,
    out: W,
}

impl<W: Write, T: CodeTable> Monitor<W, T> {
    pub fn new(
        devices: Vec<DeviceHandle>,
        filter: EventFilter,
        symbols: SymbolResolver<T>,
        out: W,
    ) -> Self {
        let pollfds = devices
            .iter()
            .map(|d| libc::pollfd {
                fd: d.as_fd().as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();
        Self {
            devices,
            pollfds,
            filter,
            symbols,
            out,
        }
    }

    pub fn devices(&self) -> &[DeviceHandle] {
        &self.devices
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Monitor until a device or the wait fails.
    pub fn run(&mut self) -> Result<Infallible, MonitorError> {
        loop {
            self.poll_once()?;
        }
    }

    /// Block until at least one device is ready, then drain every ready
    /// device once. Returns the number of lines written.
    pub fn poll_once(&mut self) -> Result<usize, MonitorError> {
        let rc = unsafe {
            libc::poll(
                self.pollfds.as_mut_ptr(),
                self.pollfds.len() as libc::nfds_t,
                -1,
            )
        };
        if rc < 0 {
            return Err(MonitorError::Wait(io::Error::last_os_error()));
        }
        if rc == 0 {
            return Err(MonitorError::NothingReady);
        }
        debug!("{rc} device(s) ready");

        let mut emitted = 0;
        for n in 0..self.devices.len() {
            let ready = self.pollfds[n].revents & READY != 0;
            self.pollfds[n].revents = 0;
            if !ready {
                continue;
            }
            for record in read_records(&mut self.devices[n])? {
                if emit(
                    &mut self.out,
                    &self.filter,
                    &self.symbols,
                    self.devices[n].label(),
                    &record,
                )? {
                    emitted += 1;
                }
            }
        }
        Ok(emitted)
    }
}

/// One read from `device`, decoded into records.
fn read_records(device: &mut DeviceHandle) -> Result<Vec<EventRecord>, MonitorError> {
    let (label, file, kind) = device.parts_mut();
    match kind {
        DeviceKind::Native => {
            let mut buf = [0u8; RAW_EVENT_SIZE];
            read_frame(label, file, &mut buf)?;
            let record = EventRecord::decode(&buf).ok_or_else(|| MonitorError::ShortRead {
                device: label.to_string(),
                expected: RAW_EVENT_SIZE,
                got: buf.len(),
            })?;
            Ok(vec![record])
        }
        DeviceKind::Legacy(translator) => {
            let mut packet = [0u8; PACKET_SIZE];
            read_frame(label, file, &mut packet)?;
            Ok(translator.translate(packet, Timestamp::now()))
        }
    }
}

/// A single read that must fill `buf` exactly.
fn read_frame(label: &str, file: &mut File, buf: &mut [u8]) -> Result<(), MonitorError> {
    let got = file.read(buf).map_err(|source| MonitorError::Read {
        device: label.to_string(),
        source,
    })?;
    if got != buf.len() {
        return Err(MonitorError::ShortRead {
            device: label.to_string(),
            expected: buf.len(),
            got,
        });
    }
    Ok(())
}

/// One output line for `record`, without the trailing newline.
pub fn format_record<T: CodeTable>(
    device: &str,
    record: &EventRecord,
    symbols: &SymbolResolver<T>,
) -> String {
    format!(
        "{device} {} type={} ({}) code={} ({}) value={}",
        record.time,
        record.class,
        symbols.class_name(record.class),
        record.code,
        symbols.code_name(record.class, record.code),
        record.value
    )
}

/// Write `record` if it passes `filter`. Returns whether a line was written.
fn emit<W: Write, T: CodeTable>(
    out: &mut W,
    filter: &EventFilter,
    symbols: &SymbolResolver<T>,
    device: &str,
    record: &EventRecord,
) -> Result<bool, MonitorError> {
    if !filter.matches(record) {
        return Ok(false);
    }
    let line = format_record(device, record, symbols);
    writeln!(out, "{line}").map_err(MonitorError::Output)?;
    out.flush().map_err(MonitorError::Output)?;
    Ok(true)
}
