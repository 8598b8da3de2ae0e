use byteorder::{ByteOrder, LittleEndian};

/// Size in bytes of the fixed segment header (everything before the payload).
pub const HEADER_LEN: usize = 24;

/// The four segment kinds that travel on the wire.
///
/// `PUSH` carries user data, `ACK` acknowledges a single `sn`, `WASK`/`WINS`
/// are the zero-window probe and its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Cmd {
    Push = 81,
    Ack = 82,
    Wask = 83,
    Wins = 84,
}

impl Cmd {
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Cmd {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            81 => Ok(Cmd::Push),
            82 => Ok(Cmd::Ack),
            83 => Ok(Cmd::Wask),
            84 => Ok(Cmd::Wins),
            other => Err(other),
        }
    }
}

/// A single segment: wire fields plus the bookkeeping a sender needs to
/// decide when to retransmit it.
///
/// `sn`/`una`/`ts` double as wire fields and in-memory state: a segment
/// sitting in `send_buffer` keeps its last-sent `ts` so it can be
/// re-encoded verbatim (refreshed just before the bytes go out) on every
/// retransmission.
#[derive(Debug, Clone)]
pub struct Segment {
    pub conv: u32,
    pub cmd: Cmd,
    pub frg: u8,
    pub wnd: u16,
    pub ts: u32,
    pub sn: u32,
    pub una: u32,
    pub data: Vec<u8>,

    /// Absolute time (same clock as `update`) at which this segment is next
    /// due for (re)transmission.
    pub(crate) resendts: u32,
    /// Current retransmission timeout for this segment specifically; grows
    /// on every timeout retransmit, independent of the session's `rx_rto`.
    pub(crate) rto: u32,
    /// Number of later-sn ACKs observed while this segment stayed unacked;
    /// reaching `fastresend` triggers a fast retransmit.
    pub(crate) fastack: u32,
    /// Number of times this segment has been put on the wire.
    pub(crate) xmit: u32,
}

impl Segment {
    pub(crate) fn data_segment(frg: u8, data: Vec<u8>) -> Segment {
        Segment {
            conv: 0,
            cmd: Cmd::Push,
            frg,
            wnd: 0,
            ts: 0,
            sn: 0,
            una: 0,
            data,
            resendts: 0,
            rto: 0,
            fastack: 0,
            xmit: 0,
        }
    }

    pub(crate) fn control(conv: u32, cmd: Cmd, una: u32, wnd: u16, current: u32) -> Segment {
        Segment {
            conv,
            cmd,
            frg: 0,
            wnd,
            ts: current,
            sn: 0,
            una,
            data: Vec::new(),
            resendts: 0,
            rto: 0,
            fastack: 0,
            xmit: 0,
        }
    }

    pub(crate) fn ack(conv: u32, una: u32, wnd: u16, sn: u32, ts: u32) -> Segment {
        Segment {
            conv,
            cmd: Cmd::Ack,
            frg: 0,
            wnd,
            ts,
            sn,
            una,
            data: Vec::new(),
            resendts: 0,
            rto: 0,
            fastack: 0,
            xmit: 0,
        }
    }

    pub(crate) fn encoded_len(&self) -> usize {
        HEADER_LEN + self.data.len()
    }

    /// Appends this segment's wire representation (header + payload) to `out`.
    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.resize(start + HEADER_LEN, 0);
        let header = &mut out[start..start + HEADER_LEN];

        LittleEndian::write_u32(&mut header[0..4], self.conv);
        header[4] = self.cmd.as_u8();
        header[5] = self.frg;
        LittleEndian::write_u16(&mut header[6..8], self.wnd);
        LittleEndian::write_u32(&mut header[8..12], self.ts);
        LittleEndian::write_u32(&mut header[12..16], self.sn);
        LittleEndian::write_u32(&mut header[16..20], self.una);
        LittleEndian::write_u32(&mut header[20..24], self.data.len() as u32);

        out.extend_from_slice(&self.data);
    }
}

/// A decoded header, borrowed from the input buffer: `payload` points into
/// the caller's slice, no copy happens until the segment is actually queued.
pub(crate) struct Header {
    pub conv: u32,
    pub cmd_raw: u8,
    pub frg: u8,
    pub wnd: u16,
    pub ts: u32,
    pub sn: u32,
    pub una: u32,
    pub len: u32,
}

pub(crate) fn decode_header(bytes: &[u8]) -> Header {
    debug_assert!(bytes.len() >= HEADER_LEN);
    Header {
        conv: LittleEndian::read_u32(&bytes[0..4]),
        cmd_raw: bytes[4],
        frg: bytes[5],
        wnd: LittleEndian::read_u16(&bytes[6..8]),
        ts: LittleEndian::read_u32(&bytes[8..12]),
        sn: LittleEndian::read_u32(&bytes[12..16]),
        una: LittleEndian::read_u32(&bytes[16..20]),
        len: LittleEndian::read_u32(&bytes[20..24]),
    }
}
