//! Link lifecycle state, mirrored by both ends of a connection.

/// Lifecycle state of one side of a hub link.
///
/// The machine is `Idle → Connecting → Open → Closing → Closed`. A failed
/// handshake or transport error short-circuits to `Closed`; `Closed` is
/// terminal and no transition leaves it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// Not yet connecting.
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Admitted; invocations and events flow.
    Open,
    /// Close initiated, not yet torn down.
    Closing,
    /// Terminal.
    Closed,
}

impl LinkState {
    /// Whether this state permits sending invocations.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Whether this is the terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Connecting)
                | (Self::Connecting, Self::Open | Self::Closing | Self::Closed)
                | (Self::Open, Self::Closing | Self::Closed)
                | (Self::Closing, Self::Closed)
        )
    }
}
