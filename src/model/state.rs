use std::fmt;
use std::str::FromStr;

/// TCP connection state as printed in the State column of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    /// Any token the table below does not know. Renders as `UNKNOWN`.
    Unknown,
}

impl ConnectionState {
    pub const ALL: [ConnectionState; 12] = [
        ConnectionState::Established,
        ConnectionState::SynSent,
        ConnectionState::SynRecv,
        ConnectionState::FinWait1,
        ConnectionState::FinWait2,
        ConnectionState::TimeWait,
        ConnectionState::Close,
        ConnectionState::CloseWait,
        ConnectionState::LastAck,
        ConnectionState::Listen,
        ConnectionState::Closing,
        ConnectionState::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Established => "ESTABLISHED",
            ConnectionState::SynSent => "SYN_SENT",
            ConnectionState::SynRecv => "SYN_RECV",
            ConnectionState::FinWait1 => "FIN_WAIT1",
            ConnectionState::FinWait2 => "FIN_WAIT2",
            ConnectionState::TimeWait => "TIME_WAIT",
            ConnectionState::Close => "CLOSE",
            ConnectionState::CloseWait => "CLOSE_WAIT",
            ConnectionState::LastAck => "LAST_ACK",
            ConnectionState::Listen => "LISTEN",
            ConnectionState::Closing => "CLOSING",
            ConnectionState::Unknown => "UNKNOWN",
        }
    }

    /// Classify a state token. Unrecognized tokens fall back to `Unknown`.
    pub fn from_label(token: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.label() == token)
            .unwrap_or(ConnectionState::Unknown)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ConnectionState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_label_round_trips() {
        for state in ConnectionState::ALL {
            assert!(!state.label().is_empty());
            assert_eq!(ConnectionState::from_label(state.label()), state);
        }
    }

    #[test]
    fn test_unrecognized_token_is_unknown() {
        assert_eq!(ConnectionState::from_label("BOGUS"), ConnectionState::Unknown);
        assert_eq!(ConnectionState::from_label(""), ConnectionState::Unknown);
        // Labels are case sensitive, as netstat prints them upper case.
        assert_eq!(ConnectionState::from_label("listen"), ConnectionState::Unknown);
    }

    #[test]
    fn test_unknown_renders_literal_word() {
        assert_eq!(ConnectionState::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_syn_recv_has_label() {
        assert_eq!(ConnectionState::SynRecv.to_string(), "SYN_RECV");
        assert_eq!("SYN_RECV".parse::<ConnectionState>(), Ok(ConnectionState::SynRecv));
    }
}
