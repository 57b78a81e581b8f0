//! USBTMC bulk message framing, independent of the USB stack carrying it.

#![cfg_attr(not(feature = "hardware"), allow(dead_code))]

use bitflags::bitflags;

use crate::{Error, Result};

pub(crate) const MSGID_DEV_DEP_MSG_OUT: u8 = 1;
pub(crate) const MSGID_REQUEST_DEV_DEP_MSG_IN: u8 = 2;
pub(crate) const MSGID_DEV_DEP_MSG_IN: u8 = 2;

pub(crate) const HEADER_LEN: usize = 12;

/// Messages longer than this are rejected instead of accumulating without bound.
pub(crate) const MAX_MESSAGE_LEN: usize = 64 << 20;

bitflags! {
    /// `bmTransferAttributes` of a bulk message header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TransferAttributes: u8 {
        const EndOfMessage      = 1<<0;
    }
}

/// The bulk-out and bulk-in endpoints of one USBTMC interface.
pub(crate) trait BulkPipe {
    fn write_bulk(&mut self, data: &[u8]) -> Result<usize>;
    fn read_bulk(&mut self, buffer: &mut [u8]) -> Result<usize>;
}

pub(crate) fn bulk_header(msg_id: u8, tag: u8, transfer_size: u32, attributes: TransferAttributes)
        -> [u8; HEADER_LEN] {
    let size = transfer_size.to_le_bytes();
    [
        msg_id, tag, !tag, 0x00,
        size[0], size[1], size[2], size[3],
        attributes.bits(), 0x00, 0x00, 0x00,
    ]
}

/// Validates a `DEV_DEP_MSG_IN` header and returns its transfer size and attributes.
pub(crate) fn parse_response_header(header: &[u8], tag: u8) -> Result<(usize, TransferAttributes)> {
    if header.len() < HEADER_LEN {
        return Err(Error::protocol(format!("short USBTMC response header ({} bytes)", header.len())))
    }
    if header[0] != MSGID_DEV_DEP_MSG_IN || header[1] != tag || header[2] != !tag {
        return Err(Error::protocol(format!(
            "unexpected USBTMC response header {:02x?} for bTag {}", &header[..HEADER_LEN], tag)))
    }
    let transfer_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    Ok((transfer_size as usize, TransferAttributes::from_bits_retain(header[8])))
}

/// Splits device-dependent messages into USBTMC transfers and reassembles replies.
#[derive(Debug)]
pub(crate) struct MessageChannel<P: BulkPipe> {
    pipe: P,
    chunk_size: usize,
    max_message_len: usize,
    tag: u8,
}

impl<P: BulkPipe> MessageChannel<P> {
    pub fn new(pipe: P, chunk_size: usize) -> MessageChannel<P> {
        MessageChannel {
            pipe,
            chunk_size: chunk_size.clamp(1, u32::MAX as usize),
            max_message_len: MAX_MESSAGE_LEN,
            tag: 0,
        }
    }

    pub fn pipe_mut(&mut self) -> &mut P {
        &mut self.pipe
    }

    fn next_tag(&mut self) -> u8 {
        // bTag must never be zero
        self.tag = self.tag % 255 + 1;
        self.tag
    }

    fn write_all(&mut self, packet: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < packet.len() {
            let count = self.pipe.write_bulk(&packet[written..])?;
            if count == 0 {
                return Err(Error::protocol("USBTMC bulk-out transfer stalled"))
            }
            written += count;
        }
        Ok(())
    }

    fn read_some(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let count = self.pipe.read_bulk(buffer)?;
        if count == 0 {
            return Err(Error::protocol("empty USBTMC bulk-in transfer"))
        }
        Ok(count)
    }

    pub fn write_message(&mut self, data: &[u8]) -> Result<()> {
        log::trace!("usbtmc write({:?})", String::from_utf8_lossy(data));
        let mut offset = 0;
        loop {
            let end = data.len().min(offset + self.chunk_size);
            let last = end == data.len();
            let chunk = &data[offset..end];

            let mut attributes = TransferAttributes::empty();
            attributes.set(TransferAttributes::EndOfMessage, last);
            let tag = self.next_tag();
            let mut packet = Vec::with_capacity(HEADER_LEN + chunk.len() + 3);
            packet.extend_from_slice(&bulk_header(MSGID_DEV_DEP_MSG_OUT, tag, chunk.len() as u32, attributes));
            packet.extend_from_slice(chunk);
            // transfers are padded to a multiple of 4 bytes
            packet.resize(packet.len().next_multiple_of(4), 0);
            self.write_all(&packet)?;

            if last { return Ok(()) }
            offset = end;
        }
    }

    pub fn read_message(&mut self) -> Result<Vec<u8>> {
        let mut message = Vec::new();
        let mut buffer = vec![0u8; HEADER_LEN + self.chunk_size + 3];
        loop {
            let tag = self.next_tag();
            self.write_all(&bulk_header(MSGID_REQUEST_DEV_DEP_MSG_IN, tag, self.chunk_size as u32,
                                        TransferAttributes::empty()))?;

            let mut received = self.read_some(&mut buffer)?;
            let (transfer_size, attributes) = parse_response_header(&buffer[..received], tag)?;
            if message.len() + transfer_size > self.max_message_len {
                return Err(Error::protocol(format!(
                    "USBTMC message exceeds {} bytes", self.max_message_len)))
            }
            let total = HEADER_LEN + transfer_size;
            if buffer.len() < total {
                buffer.resize(total + 3, 0);
            }
            while received < total {
                received += self.read_some(&mut buffer[received..])?;
            }
            log::trace!("usbtmc read {} bytes, {:?}", transfer_size, attributes);
            message.extend_from_slice(&buffer[HEADER_LEN..total]);

            if attributes.contains(TransferAttributes::EndOfMessage) {
                return Ok(message)
            }
        }
    }
}
