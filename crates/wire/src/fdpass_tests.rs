use super::*;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;

#[test]
fn send_fds_with_no_fds_still_delivers_the_body() {
    let (a, b) = UnixStream::pair().expect("socketpair failed");
    send_fds(a.as_raw_fd(), b"hello", &[]).expect("send failed");

    let mut buf = [0u8; 16];
    let (n, fds) = recv_fds(b.as_raw_fd(), &mut buf).expect("recv failed");
    assert_eq!(&buf[..n], b"hello");
    assert!(fds.is_empty());
}

#[test]
fn send_fds_passes_an_open_descriptor() {
    let (a, b) = UnixStream::pair().expect("socketpair failed");
    let (payload_r, payload_w) = UnixStream::pair().expect("socketpair failed");
    drop(payload_w);

    send_fds(a.as_raw_fd(), b"fd incoming", &[payload_r.as_raw_fd()]).expect("send failed");

    let mut buf = [0u8; 32];
    let (n, fds) = recv_fds(b.as_raw_fd(), &mut buf).expect("recv failed");
    assert_eq!(&buf[..n], b"fd incoming");
    assert_eq!(fds.len(), 1);
}
