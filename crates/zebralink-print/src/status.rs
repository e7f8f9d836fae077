// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host status (`~HS`) query and parser.
//
// The printer answers `~HS` with three STX..ETX framed strings of
// comma-separated positional fields:
//
//   frame 1: aaa,b,c,dddd,eee,f,g,h,iii,j,k,l
//            b = paper out, c = pause, eee = formats in buffer,
//            f = receive buffer full, j = corrupt RAM,
//            k = head under temperature, l = head over temperature
//   frame 2: mmm,n,o,p,q,r,s,t,uuuuuuuu,v,www
//            o = head up, p = ribbon out, uuuuuuuu = labels remaining
//   frame 3: xxxx,y  (password, static RAM; unused)
//
// Anything short of that is a protocol error, never a defaulted status.

use tracing::debug;

use zebralink_core::error::{Result, ZebraLinkError};
use zebralink_core::types::{PrinterStatus, status_bits};

use crate::session::PrinterSession;

/// Host status request.
pub const HOST_STATUS: &[u8] = b"~HS";

const STX: u8 = 0x02;
const ETX: u8 = 0x03;

/// Frames in a complete host status reply.
pub const FRAME_COUNT: usize = 3;

/// Query the printer's host status.
pub async fn query_status(session: &mut PrinterSession) -> Result<PrinterStatus> {
    let reply = session.request(HOST_STATUS, is_complete).await?;
    let status = parse_host_status(&reply)?;
    debug!(endpoint = %session.endpoint(), raw_code = status.raw_code, "host status");
    Ok(status)
}

/// Whether `buf` holds all three frames.
pub fn is_complete(buf: &[u8]) -> bool {
    frames(buf).len() >= FRAME_COUNT
}

/// Contents of every closed STX..ETX frame in `buf`.
fn frames(buf: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut rest = buf;
    while let Some(start) = rest.iter().position(|&b| b == STX) {
        let body = &rest[start + 1..];
        let Some(end) = body.iter().position(|&b| b == ETX) else {
            break;
        };
        out.push(&body[..end]);
        rest = &body[end + 1..];
    }
    out
}

/// Parse a raw `~HS` reply.
pub fn parse_host_status(buf: &[u8]) -> Result<PrinterStatus> {
    let frames = frames(buf);
    if frames.len() < FRAME_COUNT {
        return Err(ZebraLinkError::Protocol(format!(
            "host status has {} of {FRAME_COUNT} frames",
            frames.len()
        )));
    }

    let first = Fields::split(frames[0], 1, 12)?;
    let second = Fields::split(frames[1], 2, 9)?;

    let media_out = first.flag(1, "paper out")?;
    let is_paused = first.flag(2, "pause")?;
    let formats_in_buffer = first.number(4, "formats in buffer")?;
    let receive_buffer_full = first.flag(5, "buffer full")?;
    let corrupt_ram = first.flag(9, "corrupt RAM")?;
    let head_too_cold = first.flag(10, "under temperature")?;
    let head_too_hot = first.flag(11, "over temperature")?;

    let head_open = second.flag(2, "head up")?;
    let ribbon_out = second.flag(3, "ribbon out")?;
    let labels_remaining = second.number(8, "labels remaining")?;

    let raw_code = [
        (media_out, status_bits::MEDIA_OUT),
        (is_paused, status_bits::PAUSED),
        (head_open, status_bits::HEAD_OPEN),
        (ribbon_out, status_bits::RIBBON_OUT),
        (head_too_hot, status_bits::HEAD_TOO_HOT),
        (head_too_cold, status_bits::HEAD_TOO_COLD),
        (receive_buffer_full, status_bits::BUFFER_FULL),
        (corrupt_ram, status_bits::CORRUPT_RAM),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .fold(0, |code, (_, bit)| code | bit);

    Ok(PrinterStatus {
        is_ready: raw_code == 0,
        is_paused,
        head_open,
        media_out,
        ribbon_out,
        head_too_hot,
        head_too_cold,
        receive_buffer_full,
        labels_remaining,
        formats_in_buffer,
        raw_code,
    })
}

struct Fields<'a> {
    frame: usize,
    values: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn split(raw: &'a [u8], frame: usize, min_fields: usize) -> Result<Self> {
        let text = std::str::from_utf8(raw).map_err(|_| {
            ZebraLinkError::Protocol(format!("host status frame {frame} is not text"))
        })?;
        let values: Vec<&str> = text.split(',').map(str::trim).collect();
        if values.len() < min_fields {
            return Err(ZebraLinkError::Protocol(format!(
                "host status frame {frame} has {} fields, expected at least {min_fields}",
                values.len()
            )));
        }
        Ok(Self { frame, values })
    }

    fn flag(&self, index: usize, name: &str) -> Result<bool> {
        match self.values[index] {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(ZebraLinkError::Protocol(format!(
                "host status frame {} field {index} ({name}) is '{other}', expected 0 or 1",
                self.frame
            ))),
        }
    }

    fn number(&self, index: usize, name: &str) -> Result<u32> {
        self.values[index].parse().map_err(|_| {
            ZebraLinkError::Protocol(format!(
                "host status frame {} field {index} ({name}) is '{}', expected a number",
                self.frame, self.values[index]
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zebralink_core::error::ErrorCode;

    fn reply(first: &str, second: &str) -> Vec<u8> {
        format!("\x02{first}\x03\r\n\x02{second}\x03\r\n\x021234,0\x03\r\n").into_bytes()
    }

    const READY_1: &str = "030,0,0,1245,000,0,0,0,000,0,0,0";
    const READY_2: &str = "000,0,0,0,1,2,6,0,00000000,1,000";

    #[test]
    fn ready_printer_has_zero_code() {
        let status = parse_host_status(&reply(READY_1, READY_2)).unwrap();
        assert!(status.is_ready);
        assert_eq!(status.raw_code, 0);
        assert_eq!(status.labels_remaining, 0);
    }

    #[test]
    fn fault_flags_set_their_bits() {
        let status = parse_host_status(&reply(
            "030,1,1,1245,003,0,0,0,000,0,0,1",
            "000,0,1,0,1,2,6,0,00000012,1,000",
        ))
        .unwrap();
        assert!(!status.is_ready);
        assert!(status.media_out && status.is_paused && status.head_open && status.head_too_hot);
        assert!(!status.ribbon_out);
        assert_eq!(status.formats_in_buffer, 3);
        assert_eq!(status.labels_remaining, 12);
        assert_eq!(
            status.raw_code,
            status_bits::MEDIA_OUT
                | status_bits::PAUSED
                | status_bits::HEAD_OPEN
                | status_bits::HEAD_TOO_HOT
        );
    }

    #[test]
    fn missing_frame_is_a_protocol_error() {
        let buf = format!("\x02{READY_1}\x03\r\n\x02{READY_2}\x03\r\n");
        let err = parse_host_status(buf.as_bytes()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProtocolError);
        assert!(!is_complete(buf.as_bytes()));
    }

    #[test]
    fn short_frame_is_a_protocol_error() {
        let err = parse_host_status(&reply("030,0,0", READY_2)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProtocolError);
    }

    #[test]
    fn non_binary_flag_is_a_protocol_error() {
        let err = parse_host_status(&reply("030,2,0,1245,000,0,0,0,000,0,0,0", READY_2)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProtocolError);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_host_status(b"").is_err());
        assert!(parse_host_status(b"\x02\x03\x02\x03\x02\x03").is_err());
        assert!(parse_host_status(b"hello printer").is_err());
    }

    #[test]
    fn completeness_tracks_closed_frames() {
        let full = reply(READY_1, READY_2);
        assert!(is_complete(&full));
        assert!(!is_complete(&full[..full.len() - 3]));
    }
}
