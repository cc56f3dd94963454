//! Run notifications for an external delivery channel (syslog).
//!
//! Delivery is best effort: callers log a failed notification and carry on.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Default syslog destination (the local syslog daemon).
pub const DEFAULT_SYSLOG_TARGET: &str = "127.0.0.1:514";

/// Program name used in the syslog tag.
pub const SYSLOG_TAG: &str = "sasweep";

// facility user (1) * 8 + severity info (6)
const USER_INFO_PRIORITY: u8 = 14;

/// Errors from notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("cannot resolve syslog target {target}: {reason}")]
    Resolve { target: String, reason: String },

    #[error("failed to send to {target}: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Trait for the notification channel.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        (**self).notify(message)
    }
}

/// Sends `<PRI>sasweep[pid]: message` datagrams to a syslog receiver.
#[derive(Debug)]
pub struct SyslogNotifier {
    socket: UdpSocket,
    target: SocketAddr,
    pid: u32,
}

impl SyslogNotifier {
    /// Resolve `target` (`host:port`) and bind a local UDP socket for it.
    pub fn new(target: &str) -> Result<Self, NotifyError> {
        let resolve_error = |reason: String| NotifyError::Resolve {
            target: target.to_string(),
            reason,
        };

        let addr = target
            .to_socket_addrs()
            .map_err(|e| resolve_error(e.to_string()))?
            .next()
            .ok_or_else(|| resolve_error("no addresses".to_string()))?;

        let bind: SocketAddr = if addr.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind).map_err(|e| resolve_error(e.to_string()))?;

        Ok(Self {
            socket,
            target: addr,
            pid: std::process::id(),
        })
    }

    /// Resolved destination.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Notifier for SyslogNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let datagram = format_syslog(self.pid, message);
        self.socket
            .send_to(datagram.as_bytes(), self.target)
            .map(|_| ())
            .map_err(|source| NotifyError::Send {
                target: self.target,
                source,
            })
    }
}

/// Format one syslog datagram.
pub fn format_syslog(pid: u32, message: &str) -> String {
    format!(
        "<{}>{}[{}]: {}",
        USER_INFO_PRIORITY, SYSLOG_TAG, pid, message
    )
}

/// Mock notifier capturing delivered messages.
/// Cloning creates a new handle to the same captured messages.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    messages: Arc<RwLock<Vec<String>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.read().unwrap().clone()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.write().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Notifier used when delivery is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _message: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}
