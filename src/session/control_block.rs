//! The per-conversation control block: send/receive queues, RTT/RTO
//! estimator, congestion controller, and the flush scheduler.
//!
//! One struct owns every piece of per-connection state, driven by entry
//! points called from outside under a caller-held lock.

use std::collections::VecDeque;
use std::fmt;

use log::{debug, trace, warn};

use crate::config::Config;
use crate::session::error::{ConfigError, InputError, RecvError, SendError};
use crate::session::segment::{decode_header, Cmd, Segment, HEADER_LEN};
use crate::session::{itimediff, wrapping_le, wrapping_lt};

const ASK_SEND: u8 = 1;
const ASK_TELL: u8 = 2;

/// Signature of the caller-supplied output sink: handed every encoded
/// datagram the session wants to send.
///
/// Takes only the bytes — no `session`/`user` parameters are threaded back
/// through the call, since both are known to the caller before the session
/// is even constructed; a closure that needs them can simply capture them
/// (see DESIGN.md, "output callback signature").
/// Not `Send`: a session is single-threaded/cooperative, so a caller
/// wanting cross-thread delivery captures its own `Arc<Mutex<_>>` or
/// channel sender inside the closure.
pub type OutputFn = Box<dyn FnMut(&[u8])>;

/// Whether a previously fast-retransmitted segment is still eligible for
/// a *second* fast retransmit before its RTO would fire anyway. Not part
/// of the wire format; purely a local accounting aid used by `flush`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    First,
    Timeout,
    FastRetransmit,
}

/// A reliable, ordered, message-oriented ARQ session over one conversation.
///
/// Owns six logical regions (send queue/buffer, receive buffer/queue, ACK
/// list, flush scratch buffer) plus window/RTT/congestion state. Not
/// internally synchronized — a caller driving two sessions concurrently
/// must serialize access to each one itself.
pub struct Session {
    conv: u32,
    user: u64,

    send_queue: VecDeque<Segment>,
    send_buffer: VecDeque<Segment>,
    receive_buffer: VecDeque<Segment>,
    receive_queue: VecDeque<Segment>,
    ack_list: Vec<(u32, u32)>,

    snd_wnd: u32,
    rcv_wnd: u32,
    rmt_wnd: u32,
    cwnd: u32,
    incr: u32,
    ssthresh: u32,

    snd_una: u32,
    snd_nxt: u32,
    rcv_nxt: u32,

    mtu: u32,
    mss: u32,

    rx_srtt: u32,
    rx_rttval: u32,
    rx_rto: u32,
    rx_minrto: u32,

    current: u32,
    interval: u32,
    ts_flush: u32,
    ts_probe: u32,
    probe_wait: u32,

    probe: u8,
    nodelay: bool,
    nocwnd: bool,
    stream: bool,
    updated: bool,
    state: i32,

    fastresend: u32,
    dead_link: u32,

    xmit: u32,

    buffer: Vec<u8>,
    output: OutputFn,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("conv", &self.conv)
            .field("snd_una", &self.snd_una)
            .field("snd_nxt", &self.snd_nxt)
            .field("rcv_nxt", &self.rcv_nxt)
            .field("cwnd", &self.cwnd)
            .field("ssthresh", &self.ssthresh)
            .field("rx_rto", &self.rx_rto)
            .field("state", &self.state)
            .finish()
    }
}

impl Session {
    /// Builds a fresh control block for conversation `conv`. `user` is an
    /// opaque token handed back to the caller by nothing in this crate
    /// directly — it exists so a caller managing many sessions keyed by
    /// something other than `conv` has somewhere to stash that key.
    /// `output` is invoked synchronously from `update`'s flush pass,
    /// never reentrant with respect to this session.
    pub fn new(conv: u32, user: u64, config: Config, output: OutputFn) -> Session {
        let mtu = config.mtu.max(50);
        let mss = mtu - HEADER_LEN as u32;
        let interval = config.interval.clamp(10, 5000);
        let rx_minrto = if config.nodelay { 30 } else { 100 };

        Session {
            conv,
            user,
            send_queue: VecDeque::new(),
            send_buffer: VecDeque::new(),
            receive_buffer: VecDeque::new(),
            receive_queue: VecDeque::new(),
            ack_list: Vec::new(),
            snd_wnd: config.snd_wnd.max(1),
            rcv_wnd: config.rcv_wnd.max(1),
            rmt_wnd: 32,
            cwnd: 0,
            incr: 0,
            ssthresh: 2,
            snd_una: 0,
            snd_nxt: 0,
            rcv_nxt: 0,
            mtu,
            mss,
            rx_srtt: 0,
            rx_rttval: 0,
            rx_rto: 200,
            rx_minrto,
            current: 0,
            interval,
            ts_flush: interval,
            ts_probe: 0,
            probe_wait: 0,
            probe: 0,
            nodelay: config.nodelay,
            nocwnd: config.no_cwnd,
            stream: config.stream,
            updated: false,
            state: 0,
            fastresend: config.fast_resend,
            dead_link: config.dead_link.max(1),
            xmit: 0,
            buffer: Vec::with_capacity(3 * (mtu as usize + HEADER_LEN)),
            output,
        }
    }

    pub fn conv(&self) -> u32 {
        self.conv
    }

    pub fn user(&self) -> u64 {
        self.user
    }

    /// `true` once a single segment has been retransmitted `dead_link`
    /// times. Advisory only: the session keeps running, and nothing in
    /// this crate ever clears the flag again (see DESIGN.md, "dead-link
    /// latching").
    pub fn is_dead_link(&self) -> bool {
        self.state < 0
    }

    /// Segments queued for send plus segments in flight, awaiting ACK.
    pub fn wait_send(&self) -> usize {
        self.send_buffer.len() + self.send_queue.len()
    }

    /// Extracts the `conv` field from a raw datagram, for demultiplexing
    /// before routing the datagram to the right session's `input`.
    pub fn peek_conv(bytes: &[u8]) -> Option<u32> {
        if bytes.len() < 4 {
            return None;
        }
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn set_mtu(&mut self, mtu: u32) -> Result<(), ConfigError> {
        if mtu < 50 {
            return Err(ConfigError::MtuTooSmall(mtu));
        }
        self.mtu = mtu;
        self.mss = mtu - HEADER_LEN as u32;
        self.buffer = Vec::with_capacity(3 * (mtu as usize + HEADER_LEN));
        Ok(())
    }

    pub fn set_interval(&mut self, interval: u32) {
        self.interval = interval.clamp(10, 5000);
    }

    /// Composite setter bundling the no-delay toggle, flush interval,
    /// fast-resend threshold, and congestion-control toggle into one call.
    /// `interval` of `None` leaves the flush period alone.
    pub fn set_nodelay(&mut self, enabled: bool, interval: Option<u32>, resend: u32, nc: bool) {
        self.nodelay = enabled;
        self.rx_minrto = if enabled { 30 } else { 100 };
        if let Some(interval) = interval {
            self.interval = interval.clamp(10, 5000);
        }
        self.fastresend = resend;
        self.nocwnd = nc;
    }

    pub fn set_wndsize(&mut self, snd_wnd: u32, rcv_wnd: u32) {
        if snd_wnd > 0 {
            self.snd_wnd = snd_wnd;
        }
        if rcv_wnd > 0 {
            self.rcv_wnd = rcv_wnd;
        }
    }

    pub fn set_stream(&mut self, stream: bool) {
        self.stream = stream;
    }

    fn wnd_unused(&self) -> u16 {
        let queued = self.receive_queue.len() as u32;
        if queued < self.rcv_wnd {
            (self.rcv_wnd - queued) as u16
        } else {
            0
        }
    }

    // ---- segmentation (send path) -------------------------------

    /// Enqueues `payload` for transmission, splitting it into at most 255
    /// `mss`-sized fragments (message mode) or coalescing it onto the
    /// pending tail segment (stream mode).
    pub fn send(&mut self, payload: &[u8]) -> Result<(), SendError> {
        if payload.is_empty() {
            return Err(SendError::InvalidArgument);
        }
        let mss = self.mss as usize;

        if self.stream {
            self.send_stream(payload, mss);
            return Ok(());
        }

        let count = (payload.len() + mss - 1) / mss;
        if count > 255 {
            return Err(SendError::FragmentOverflow);
        }

        for i in 0..count {
            let start = i * mss;
            let end = ((i + 1) * mss).min(payload.len());
            let frg = (count - 1 - i) as u8;
            self.send_queue
                .push_back(Segment::data_segment(frg, payload[start..end].to_vec()));
        }
        trace!(
            "send: queued {} fragment(s), {} bytes, conv={}",
            count,
            payload.len(),
            self.conv
        );
        Ok(())
    }

    fn send_stream(&mut self, payload: &[u8], mss: usize) {
        let mut offset = 0;
        if let Some(tail) = self.send_queue.back_mut() {
            if tail.data.len() < mss {
                let room = mss - tail.data.len();
                let take = room.min(payload.len());
                tail.data.extend_from_slice(&payload[..take]);
                offset = take;
            }
        }
        if offset >= payload.len() {
            return;
        }
        let remaining = &payload[offset..];
        for chunk in remaining.chunks(mss.max(1)) {
            self.send_queue
                .push_back(Segment::data_segment(0, chunk.to_vec()));
        }
    }

    // ---- reassembly (receive path) -------------------------------

    /// Size of the next complete message without consuming it. A
    /// non-empty `receive_queue` whose head fragment set has not fully
    /// arrived yet reports [`RecvError::InternalInconsistency`] — the
    /// queue only ever holds segments belonging to the next deliverable
    /// message, so a short fragment run here means the reassembly
    /// bookkeeping has a bug, not that the caller should retry (see
    /// DESIGN.md).
    pub fn peek_size(&self) -> Result<usize, RecvError> {
        let head = self.receive_queue.front().ok_or(RecvError::EmptyQueue)?;
        if head.frg == 0 {
            return Ok(head.data.len());
        }
        if (self.receive_queue.len() as u32) < head.frg as u32 + 1 {
            return Err(RecvError::InternalInconsistency);
        }
        let mut len = 0usize;
        for seg in self.receive_queue.iter() {
            len += seg.data.len();
            if seg.frg == 0 {
                break;
            }
        }
        Ok(len)
    }

    /// Dequeues the next complete message into `buf`, returning the
    /// number of bytes written.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, RecvError> {
        let size = self.peek_size()?;
        if size > buf.len() {
            return Err(RecvError::BufferTooSmall {
                needed: size,
                available: buf.len(),
            });
        }

        let was_full = self.receive_queue.len() as u32 >= self.rcv_wnd;

        let mut offset = 0;
        loop {
            let seg = self
                .receive_queue
                .pop_front()
                .expect("peek_size validated enough fragments");
            buf[offset..offset + seg.data.len()].copy_from_slice(&seg.data);
            offset += seg.data.len();
            if seg.frg == 0 {
                break;
            }
        }

        self.promote_from_receive_buffer();

        if was_full && (self.receive_queue.len() as u32) < self.rcv_wnd {
            self.probe |= ASK_TELL;
            debug!("recv: receive queue re-opened, arming ASK_TELL");
        }

        Ok(offset)
    }

    fn promote_from_receive_buffer(&mut self) {
        while let Some(front) = self.receive_buffer.front() {
            if front.sn != self.rcv_nxt || (self.receive_queue.len() as u32) >= self.rcv_wnd {
                break;
            }
            let seg = self.receive_buffer.pop_front().unwrap();
            trace!("promotion sweep: sn={} -> receive_queue", seg.sn);
            self.rcv_nxt = self.rcv_nxt.wrapping_add(1);
            self.receive_queue.push_back(seg);
        }
    }

    fn insert_receive_buffer(&mut self, seg: Segment) {
        let mut insert_at = self.receive_buffer.len();
        let mut duplicate = false;
        for (i, existing) in self.receive_buffer.iter().enumerate().rev() {
            if existing.sn == seg.sn {
                duplicate = true;
                break;
            }
            if wrapping_lt(existing.sn, seg.sn) {
                insert_at = i + 1;
                break;
            }
            insert_at = i;
        }
        if duplicate {
            trace!("input: dropping duplicate sn={}", seg.sn);
        } else {
            self.receive_buffer.insert(insert_at, seg);
        }
    }

    // ---- input parser ---------------------------------------------

    /// Decodes one or more back-to-back segments from `bytes` and applies
    /// them to session state. On a malformed header the whole call
    /// aborts and returns `Err`, but everything parsed before the bad
    /// header (and the session overall) remains valid.
    pub fn input(&mut self, bytes: &[u8]) -> Result<(), InputError> {
        let prev_una = self.snd_una;
        let mut maxack: Option<u32> = None;

        let mut offset = 0usize;
        while offset < bytes.len() {
            if bytes.len() - offset < HEADER_LEN {
                return Err(InputError::ShortHeader {
                    len: bytes.len() - offset,
                });
            }
            let header = decode_header(&bytes[offset..]);
            if header.conv != self.conv {
                return Err(InputError::ConvMismatch {
                    expected: self.conv,
                    found: header.conv,
                });
            }

            let available = bytes.len() - offset - HEADER_LEN;
            if header.len as usize > available {
                return Err(InputError::DeclaredLengthExceedsBuffer {
                    declared: header.len,
                    available,
                });
            }
            let cmd = Cmd::try_from(header.cmd_raw).map_err(InputError::UnknownCommand)?;

            self.rmt_wnd = header.wnd as u32;
            self.parse_una(header.una);
            self.shrink_buf();

            let payload_start = offset + HEADER_LEN;
            let payload_end = payload_start + header.len as usize;

            match cmd {
                Cmd::Ack => {
                    if itimediff(self.current, header.ts) >= 0 {
                        self.update_rtt_estimator(itimediff(self.current, header.ts) as u32);
                    }
                    self.remove_acked(header.sn);
                    maxack = Some(match maxack {
                        Some(m) if wrapping_lt(m, header.sn) => header.sn,
                        Some(m) => m,
                        None => header.sn,
                    });
                }
                Cmd::Push => {
                    let in_window = wrapping_le(self.rcv_nxt, header.sn)
                        && wrapping_lt(header.sn, self.rcv_nxt.wrapping_add(self.rcv_wnd));
                    if in_window {
                        self.ack_list.push((header.sn, header.ts));
                        let mut seg = Segment::data_segment(
                            header.frg,
                            bytes[payload_start..payload_end].to_vec(),
                        );
                        seg.conv = header.conv;
                        seg.sn = header.sn;
                        seg.una = header.una;
                        seg.wnd = header.wnd;
                        seg.ts = header.ts;
                        self.insert_receive_buffer(seg);
                        self.promote_from_receive_buffer();
                    }
                }
                Cmd::Wask => {
                    self.probe |= ASK_TELL;
                    debug!("input: WASK received, arming ASK_TELL");
                }
                Cmd::Wins => {}
            }

            offset = payload_end;
        }

        if let Some(maxack) = maxack {
            self.parse_fastack(maxack);
        }
        if wrapping_lt(prev_una, self.snd_una) {
            self.update_congestion_on_ack();
        }
        Ok(())
    }

    fn parse_una(&mut self, una: u32) {
        while let Some(front) = self.send_buffer.front() {
            if wrapping_lt(front.sn, una) {
                self.send_buffer.pop_front();
            } else {
                break;
            }
        }
    }

    fn shrink_buf(&mut self) {
        self.snd_una = self
            .send_buffer
            .front()
            .map(|s| s.sn)
            .unwrap_or(self.snd_nxt);
    }

    fn remove_acked(&mut self, sn: u32) {
        if let Some(pos) = self.send_buffer.iter().position(|s| s.sn == sn) {
            self.send_buffer.remove(pos);
        }
    }

    fn parse_fastack(&mut self, maxack: u32) {
        for seg in self.send_buffer.iter_mut() {
            if wrapping_lt(seg.sn, maxack) {
                seg.fastack += 1;
            }
        }
    }

    // ---- RTT/RTO estimator ----------------------------------------

    fn update_rtt_estimator(&mut self, rtt: u32) {
        if self.rx_srtt == 0 {
            self.rx_srtt = rtt;
            self.rx_rttval = rtt / 2;
        } else {
            let delta = if rtt > self.rx_srtt {
                rtt - self.rx_srtt
            } else {
                self.rx_srtt - rtt
            };
            self.rx_rttval = (3 * self.rx_rttval + delta) / 4;
            self.rx_srtt = (7 * self.rx_srtt + rtt) / 8;
            if self.rx_srtt < 1 {
                self.rx_srtt = 1;
            }
        }
        let candidate = self.rx_srtt + self.interval.max(4 * self.rx_rttval);
        self.rx_rto = candidate.clamp(self.rx_minrto, 60_000);
        trace!(
            "rtt sample {}ms -> srtt={} rttval={} rto={}",
            rtt,
            self.rx_srtt,
            self.rx_rttval,
            self.rx_rto
        );
    }

    // ---- congestion controller ------------------------------------

    fn update_congestion_on_ack(&mut self) {
        if self.nocwnd {
            return;
        }
        let mss = self.mss;
        if self.cwnd < self.ssthresh {
            self.cwnd += 1;
            self.incr += mss;
        } else {
            self.incr = self.incr.max(mss);
            self.incr += mss * mss / self.incr + mss / 16;
            if (self.cwnd + 1) * mss <= self.incr {
                self.cwnd += 1;
            }
        }
        if self.cwnd > self.rmt_wnd {
            self.cwnd = self.rmt_wnd;
            self.incr = self.rmt_wnd * mss;
        }
        trace!("cwnd grew to {} (ssthresh={})", self.cwnd, self.ssthresh);
    }

    fn apply_congestion_reactions(&mut self, change: u32, lost: bool) {
        if self.nocwnd {
            return;
        }
        if change > 0 {
            let inflight = itimediff(self.snd_nxt, self.snd_una).max(0) as u32;
            self.ssthresh = (inflight / 2).max(2);
            self.cwnd = self.ssthresh + change;
            self.incr = self.cwnd * self.mss;
            debug!(
                "fast retransmit reaction: ssthresh={} cwnd={}",
                self.ssthresh, self.cwnd
            );
        }
        if lost {
            self.ssthresh = (self.cwnd / 2).max(2);
            self.cwnd = 1;
            self.incr = self.mss;
            debug!("timeout loss reaction: ssthresh={} cwnd=1", self.ssthresh);
        }
        if self.cwnd < 1 {
            self.cwnd = 1;
        }
    }

    // ---- flush (the scheduler) -------------------------------------

    fn flush(&mut self) {
        if !self.updated {
            return;
        }
        let current = self.current;
        self.buffer.clear();
        let wnd_unused = self.wnd_unused();

        // Step 2: drain the ACK list.
        let ack_list = std::mem::take(&mut self.ack_list);
        for (sn, ts) in ack_list {
            if self.buffer.len() + HEADER_LEN > self.mtu as usize {
                (self.output)(&self.buffer);
                self.buffer.clear();
            }
            Segment::ack(self.conv, self.rcv_nxt, wnd_unused, sn, ts).encode(&mut self.buffer);
        }

        // Step 3: zero-window probe management.
        if self.rmt_wnd == 0 {
            if self.probe_wait == 0 {
                self.probe_wait = 7_000;
                self.ts_probe = current.wrapping_add(self.probe_wait);
            } else if itimediff(current, self.ts_probe) >= 0 {
                self.probe_wait += self.probe_wait / 2;
                self.probe_wait = self.probe_wait.min(120_000);
                self.ts_probe = current.wrapping_add(self.probe_wait);
                self.probe |= ASK_SEND;
                debug!("zero-window probe armed, next wait {}ms", self.probe_wait);
            }
        } else {
            self.ts_probe = 0;
            self.probe_wait = 0;
        }

        // Step 4: emit WASK / WINS.
        if self.probe & ASK_SEND != 0 {
            if self.buffer.len() + HEADER_LEN > self.mtu as usize {
                (self.output)(&self.buffer);
                self.buffer.clear();
            }
            Segment::control(self.conv, Cmd::Wask, self.rcv_nxt, wnd_unused, current)
                .encode(&mut self.buffer);
        }
        if self.probe & ASK_TELL != 0 {
            if self.buffer.len() + HEADER_LEN > self.mtu as usize {
                (self.output)(&self.buffer);
                self.buffer.clear();
            }
            Segment::control(self.conv, Cmd::Wins, self.rcv_nxt, wnd_unused, current)
                .encode(&mut self.buffer);
        }
        self.probe = 0;

        // Step 5: effective congestion window.
        let mut cwnd_eff = self.snd_wnd.min(self.rmt_wnd);
        if !self.nocwnd {
            cwnd_eff = cwnd_eff.min(self.cwnd);
        }

        // Step 6: promote send_queue -> send_buffer.
        let mut inflight = self.snd_nxt.wrapping_sub(self.snd_una);
        while inflight < cwnd_eff {
            let Some(mut seg) = self.send_queue.pop_front() else {
                break;
            };
            seg.conv = self.conv;
            seg.cmd = Cmd::Push;
            seg.sn = self.snd_nxt;
            seg.una = self.rcv_nxt;
            seg.wnd = wnd_unused;
            seg.ts = current;
            seg.resendts = current;
            seg.rto = self.rx_rto;
            seg.xmit = 0;
            seg.fastack = 0;
            self.snd_nxt = self.snd_nxt.wrapping_add(1);
            self.send_buffer.push_back(seg);
            inflight += 1;
        }

        // Step 7: transmit sweep.
        let rtomin = if self.nodelay { 0 } else { self.rx_rto / 8 };
        let rcv_nxt = self.rcv_nxt;
        let mtu = self.mtu as usize;
        let rx_rto = self.rx_rto;
        let nodelay = self.nodelay;
        let fastresend = self.fastresend;
        let dead_link = self.dead_link;

        let mut change = 0u32;
        let mut lost = false;
        let mut newly_dead = false;

        for seg in self.send_buffer.iter_mut() {
            let trigger = if seg.xmit == 0 {
                Trigger::First
            } else if itimediff(current, seg.resendts) >= 0 {
                Trigger::Timeout
            } else if fastresend > 0 && seg.fastack >= fastresend {
                Trigger::FastRetransmit
            } else {
                continue;
            };

            match trigger {
                Trigger::First => {
                    seg.resendts = current + seg.rto + rtomin;
                }
                Trigger::Timeout => {
                    seg.rto = if nodelay {
                        seg.rto + rx_rto / 2
                    } else {
                        seg.rto + rx_rto
                    };
                    seg.resendts = current + seg.rto;
                    lost = true;
                    self.xmit += 1;
                }
                Trigger::FastRetransmit => {
                    seg.fastack = 0;
                    seg.resendts = current + seg.rto;
                    change += 1;
                }
            }

            seg.xmit += 1;
            seg.ts = current;
            seg.wnd = wnd_unused;
            seg.una = rcv_nxt;

            if self.buffer.len() + seg.encoded_len() > mtu {
                (self.output)(&self.buffer);
                self.buffer.clear();
            }
            seg.encode(&mut self.buffer);

            if seg.xmit >= dead_link {
                newly_dead = true;
            }
        }

        if newly_dead && self.state >= 0 {
            warn!("segment exceeded dead_link retransmissions, marking state=-1");
            self.state = -1;
        }

        // Step 8: emit residual bytes.
        if !self.buffer.is_empty() {
            (self.output)(&self.buffer);
            self.buffer.clear();
        }

        // Step 9: congestion reactions.
        self.apply_congestion_reactions(change, lost);
    }

    // ---- tick (update/check) ---------------------------------------

    /// Advances the session clock to `current` (milliseconds, same epoch
    /// throughout a session's life) and runs `flush` if a flush interval
    /// has elapsed.
    pub fn update(&mut self, current: u32) {
        self.current = current;
        if !self.updated {
            self.updated = true;
            self.ts_flush = current;
        }

        let mut slap = itimediff(current, self.ts_flush);
        if !(-10_000..10_000).contains(&slap) {
            self.ts_flush = current;
            slap = 0;
        }

        if slap >= 0 {
            self.ts_flush = self.ts_flush.wrapping_add(self.interval);
            if itimediff(current, self.ts_flush) >= 0 {
                self.ts_flush = current.wrapping_add(self.interval);
            }
            self.flush();
        }
    }

    /// Read-only companion to [`Session::update`]: the absolute time at
    /// which `update` should next be called.
    pub fn check(&self, current: u32) -> u32 {
        if !self.updated {
            return current;
        }

        let mut ts_flush = self.ts_flush;
        if itimediff(current, ts_flush).abs() >= 10_000 {
            ts_flush = current;
        }
        if itimediff(current, ts_flush) >= 0 {
            return current;
        }

        let mut minimal = itimediff(ts_flush, current);
        for seg in self.send_buffer.iter() {
            let diff = itimediff(seg.resendts, current);
            if diff <= 0 {
                return current;
            }
            if diff < minimal {
                minimal = diff;
            }
        }

        let minimal = (minimal as u32).min(self.interval);
        current.wrapping_add(minimal)
    }
}
