// SPDX-License-Identifier: MIT

//! SCM_RIGHTS file-descriptor passing over a Unix domain socket.
//!
//! Present per the Design Notes (`spec.md` §9): the source has a buffered
//! `send_fds`/`recv_fds` helper and a `get_pipe` accessor on jobs, but it is
//! dead code on the dispatch path — jobs stream output through `log_path`
//! instead. This helper exists for the day that changes; it is **not** wired
//! into [`crate::command::WorkerCommand::ExecuteCommand`].

use crate::error::ProtocolError;
use nix::sys::socket::{recvmsg, sendmsg, ControlMessage, ControlMessageOwned, MsgFlags};
use std::io::{IoSlice, IoSliceMut};
use std::os::unix::io::RawFd;

/// Upper bound on fds accepted in a single `recv_fds` call — an unbounded
/// ancillary buffer is an easy way to let a peer force an allocation.
const MAX_FDS: usize = 16;

/// Send `body` as one `sendmsg` call, with `fds` attached as ancillary
/// `SCM_RIGHTS` data.
pub fn send_fds(socket_fd: RawFd, body: &[u8], fds: &[RawFd]) -> Result<usize, ProtocolError> {
    let iov = [IoSlice::new(body)];
    let cmsgs = if fds.is_empty() { Vec::new() } else { vec![ControlMessage::ScmRights(fds)] };
    Ok(sendmsg::<()>(socket_fd, &iov, &cmsgs, MsgFlags::empty(), None)?)
}

/// Receive one message into `buf`, draining any `SCM_RIGHTS` ancillary data
/// into the returned fd list (capped at [`MAX_FDS`]).
pub fn recv_fds(socket_fd: RawFd, buf: &mut [u8]) -> Result<(usize, Vec<RawFd>), ProtocolError> {
    let mut iov = [IoSliceMut::new(buf)];
    let mut cmsg_buffer = nix::cmsg_space!([RawFd; MAX_FDS]);
    let msg = recvmsg::<()>(socket_fd, &mut iov, Some(&mut cmsg_buffer), MsgFlags::empty())?;

    let mut fds = Vec::new();
    for cmsg in msg.cmsgs()? {
        if let ControlMessageOwned::ScmRights(received) = cmsg {
            fds.extend(received);
        }
    }
    Ok((msg.bytes, fds))
}

#[cfg(test)]
#[path = "fdpass_tests.rs"]
mod tests;
