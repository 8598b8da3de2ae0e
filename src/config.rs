//! Construction-time tunables for a [`Session`](crate::Session).
//!
//! Bundles the handful of knobs that shape a session's timing and window
//! behavior — MTU, flush interval, window sizes, no-delay mode, fast
//! retransmit threshold, congestion control, dead-link threshold, stream
//! mode — into one struct so a caller configures a session once at
//! construction instead of chasing several separate setter calls.
//!
//! Every field here can still be changed after construction through the
//! matching `Session::set_*` method; `Config` only picks the starting
//! values.

/// Construction-time tunables for a [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum transmission unit in bytes. Must be >= 50.
    pub mtu: u32,
    /// Flush period in milliseconds, clamped to [10, 5000].
    pub interval: u32,
    /// Local send window cap, in segments.
    pub snd_wnd: u32,
    /// Local receive window cap, in segments.
    pub rcv_wnd: u32,
    /// `true` lowers `rx_minrto` to 30ms and tightens the first-transmit
    /// backoff window; the "no-delay" tuning mode.
    pub nodelay: bool,
    /// Duplicate-ACK threshold that triggers fast retransmit. `0` disables
    /// fast retransmit entirely.
    pub fast_resend: u32,
    /// Disables the congestion controller: the effective send window
    /// becomes `min(snd_wnd, rmt_wnd)` with no slow start / cwnd cap.
    pub no_cwnd: bool,
    /// Consecutive retransmissions of a single segment after which the
    /// session sets its advisory dead-link flag.
    pub dead_link: u32,
    /// Stream mode: `send` coalesces small payloads into the send queue's
    /// tail segment instead of preserving message boundaries.
    pub stream: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mtu: 1400,
            interval: 100,
            snd_wnd: 32,
            rcv_wnd: 32,
            nodelay: false,
            fast_resend: 0,
            no_cwnd: false,
            dead_link: 20,
            stream: false,
        }
    }
}

impl Config {
    /// Convenience constructor bundling the no-delay mode, flush interval,
    /// fast-resend threshold, and congestion-control toggle into one call.
    pub fn with_nodelay(mut self, interval: u32, resend: u32, no_cwnd: bool) -> Self {
        self.nodelay = true;
        self.interval = interval;
        self.fast_resend = resend;
        self.no_cwnd = no_cwnd;
        self
    }

    pub fn with_wndsize(mut self, snd_wnd: u32, rcv_wnd: u32) -> Self {
        self.snd_wnd = snd_wnd;
        self.rcv_wnd = rcv_wnd;
        self
    }

    pub fn with_mtu(mut self, mtu: u32) -> Self {
        self.mtu = mtu;
        self
    }
}
