use std::net::SocketAddr;

use super::state::ConnectionState;

/// Placeholder netstat prints when the owning process is not visible.
pub const OWNER_SENTINEL: &str = "-";

/// One parsed row of the connection listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub protocol: String,
    pub recv_queue: String,
    pub send_queue: String,
    pub local_address: SocketAddr,
    pub foreign_address: SocketAddr,
    /// State column verbatim. Use [`ConnectionRecord::connection_state`] to classify it.
    pub state: String,
    pub owner_pid: String,
    pub owner_program_name: String,
    /// The owner is `-` even though the observer runs with root privileges.
    pub is_owner_unbound: bool,
}

/// Typed view over the owner columns of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner<'a> {
    /// No PID/Program column, or one in an unexpected shape.
    Unset,
    Unknown { unbound: bool },
    Process { pid: &'a str, program: &'a str },
}

impl ConnectionRecord {
    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::from_label(&self.state)
    }

    pub fn is_listening(&self) -> bool {
        self.connection_state() == ConnectionState::Listen
    }

    pub fn is_ipv6(&self) -> bool {
        self.local_address.is_ipv6()
    }

    pub fn owner(&self) -> Owner<'_> {
        if self.owner_pid == OWNER_SENTINEL && self.owner_program_name == OWNER_SENTINEL {
            Owner::Unknown {
                unbound: self.is_owner_unbound,
            }
        } else if self.owner_pid.is_empty() && self.owner_program_name.is_empty() {
            Owner::Unset
        } else {
            Owner::Process {
                pid: &self.owner_pid,
                program: &self.owner_program_name,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(state: &str, pid: &str, program: &str) -> ConnectionRecord {
        ConnectionRecord {
            protocol: "tcp".to_string(),
            recv_queue: "0".to_string(),
            send_queue: "0".to_string(),
            local_address: "127.0.0.1:22".parse().unwrap(),
            foreign_address: "0.0.0.0:0".parse().unwrap(),
            state: state.to_string(),
            owner_pid: pid.to_string(),
            owner_program_name: program.to_string(),
            is_owner_unbound: false,
        }
    }

    #[test]
    fn test_owner_views() {
        assert_eq!(make_record("LISTEN", "", "").owner(), Owner::Unset);
        assert_eq!(
            make_record("LISTEN", "-", "-").owner(),
            Owner::Unknown { unbound: false }
        );
        assert_eq!(
            make_record("LISTEN", "812", "sshd").owner(),
            Owner::Process {
                pid: "812",
                program: "sshd"
            }
        );
    }

    #[test]
    fn test_state_classification() {
        let rec = make_record("LISTEN", "", "");
        assert!(rec.is_listening());
        assert!(!rec.is_ipv6());

        let rec = make_record("WEIRD", "", "");
        assert_eq!(rec.connection_state(), ConnectionState::Unknown);
        assert_eq!(rec.state, "WEIRD");
    }
}
