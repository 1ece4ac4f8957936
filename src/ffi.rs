//! Thin wrappers around the inotify, eventfd and poll system calls.
#![allow(clippy::cast_sign_loss)]

use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Size of the fixed part of an inotify record. The entry name follows it.
pub const EVENT_HEADER_SIZE: usize = std::mem::size_of::<libc::inotify_event>();

fn cvt(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

pub fn inotify_init() -> io::Result<OwnedFd> {
    let fd = cvt(unsafe { libc::inotify_init1(libc::IN_CLOEXEC | libc::IN_NONBLOCK) })?;
    // Safety: `fd` was just returned by the kernel and is owned by nobody else.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

pub fn eventfd() -> io::Result<OwnedFd> {
    let fd = cvt(unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) })?;
    // Safety: as above.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

pub fn add_watch(fd: BorrowedFd<'_>, path: &Path, mask: u32) -> io::Result<i32> {
    let path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "path contains an interior nul byte")
    })?;
    cvt(unsafe { libc::inotify_add_watch(fd.as_raw_fd(), path.as_ptr(), mask) })
}

pub fn rm_watch(fd: BorrowedFd<'_>, wd: i32) -> io::Result<()> {
    cvt(unsafe { libc::inotify_rm_watch(fd.as_raw_fd(), wd) }).map(drop)
}

/// Add one to an eventfd counter, making it readable.
pub fn signal(fd: BorrowedFd<'_>) -> io::Result<()> {
    let one: u64 = 1;
    let written = unsafe {
        libc::write(
            fd.as_raw_fd(),
            std::ptr::addr_of!(one).cast(),
            std::mem::size_of::<u64>(),
        )
    };
    if written == -1 {
        let err = io::Error::last_os_error();
        // The counter is saturated, which already makes it readable.
        if err.kind() != io::ErrorKind::WouldBlock {
            return Err(err);
        }
    }
    Ok(())
}

/// Block until one of `fds` is readable. Returns readiness for each descriptor in order.
pub fn poll_readable<const N: usize>(fds: [BorrowedFd<'_>; N]) -> io::Result<[bool; N]> {
    let mut pollfds = fds.map(|fd| libc::pollfd {
        fd: fd.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    });
    loop {
        let ret = unsafe { libc::poll(pollfds.as_mut_ptr(), N as libc::nfds_t, -1) };
        match cvt(ret) {
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(pollfds.map(|pollfd| pollfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0))
}

/// Read into `buf`. A non-blocking descriptor with nothing to read yields `Ok(0)`.
pub fn read(fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<usize> {
    let ret = unsafe { libc::read(fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
    if ret == -1 {
        let err = io::Error::last_os_error();
        return match err.kind() {
            io::ErrorKind::WouldBlock => Ok(0),
            _ => Err(err),
        };
    }
    Ok(ret as usize)
}
