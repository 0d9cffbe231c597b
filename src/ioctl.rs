//! evdev ioctl requests
//!
//! Thin safe wrappers; each returns the raw ioctl result (the number of bytes
//! the kernel copied, for the bitset queries) or the OS error.

use nix::errno::Errno;
use nix::{ioctl_read, ioctl_read_buf, request_code_read};
use std::io;
use std::mem::size_of;
use std::os::fd::{AsRawFd, BorrowedFd};

const EVDEV: u8 = b'E';

ioctl_read!(eviocgversion, EVDEV, 0x01, libc::c_int);
ioctl_read!(eviocgid, EVDEV, 0x02, libc::input_id);
ioctl_read!(eviocgrep, EVDEV, 0x03, [libc::c_uint; 2]);
ioctl_read_buf!(eviocgname, EVDEV, 0x06, u8);
ioctl_read_buf!(eviocgkey, EVDEV, 0x18, u8);
ioctl_read_buf!(eviocgled, EVDEV, 0x19, u8);
ioctl_read_buf!(eviocgsnd, EVDEV, 0x1a, u8);
ioctl_read_buf!(eviocgsw, EVDEV, 0x1b, u8);

/// Live-state bitsets a device can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Key,
    Led,
    Sound,
    Switch,
}

fn check(res: nix::Result<libc::c_int>) -> io::Result<usize> {
    res.map(|n| n as usize).map_err(io::Error::from)
}

pub fn version(fd: BorrowedFd<'_>) -> io::Result<i32> {
    let mut version: libc::c_int = 0;
    check(unsafe { eviocgversion(fd.as_raw_fd(), &mut version) })?;
    Ok(version)
}

pub fn input_id(fd: BorrowedFd<'_>) -> io::Result<libc::input_id> {
    let mut id = libc::input_id {
        bustype: 0,
        vendor: 0,
        product: 0,
        version: 0,
    };
    check(unsafe { eviocgid(fd.as_raw_fd(), &mut id) })?;
    Ok(id)
}

/// Key repeat delay and period in milliseconds.
pub fn repeat(fd: BorrowedFd<'_>) -> io::Result<[u32; 2]> {
    let mut rep: [libc::c_uint; 2] = [0; 2];
    check(unsafe { eviocgrep(fd.as_raw_fd(), &mut rep) })?;
    Ok(rep)
}

/// Device name, truncated to `buf`; trailing NULs are dropped.
pub fn name(fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<String> {
    let n = check(unsafe { eviocgname(fd.as_raw_fd(), buf) })?;
    let raw = &buf[..n.min(buf.len())];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// `EVIOCGBIT(class, len)`: supported codes of `class`, or supported classes
/// when `class` is 0.
pub fn event_bits(fd: BorrowedFd<'_>, class: u16, buf: &mut [u8]) -> io::Result<usize> {
    let request = request_code_read!(EVDEV, 0x20 + class as u32, buf.len());
    check(Errno::result(unsafe {
        libc::ioctl(fd.as_raw_fd(), request, buf.as_mut_ptr())
    }))
}

pub fn state_bits(fd: BorrowedFd<'_>, kind: StateKind, buf: &mut [u8]) -> io::Result<usize> {
    let raw = fd.as_raw_fd();
    check(unsafe {
        match kind {
            StateKind::Key => eviocgkey(raw, buf),
            StateKind::Led => eviocgled(raw, buf),
            StateKind::Sound => eviocgsnd(raw, buf),
            StateKind::Switch => eviocgsw(raw, buf),
        }
    })
}

/// `EVIOCGABS(axis)`: calibration of one absolute axis.
pub fn abs_info(fd: BorrowedFd<'_>, axis: u16) -> io::Result<libc::input_absinfo> {
    let mut info = libc::input_absinfo {
        value: 0,
        minimum: 0,
        maximum: 0,
        fuzz: 0,
        flat: 0,
        resolution: 0,
    };
    let request = request_code_read!(EVDEV, 0x40 + axis as u32, size_of::<libc::input_absinfo>());
    check(Errno::result(unsafe {
        libc::ioctl(fd.as_raw_fd(), request, &mut info as *mut libc::input_absinfo)
    }))?;
    Ok(info)
}
