//! Message framing over a byte-stream transport.
//!
//! The pre-login exchange is the only traffic before TLS, so these helpers
//! work directly on any `AsyncRead + AsyncWrite` stream. A message is written
//! as one or more packets; a response is read packet by packet until
//! `END_OF_MESSAGE`.

use bytes::{Bytes, BytesMut};
use tds_protocol::{PACKET_HEADER_SIZE, PacketHeader, PacketType, ProtocolError, frame_message};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Write one framed message and flush it.
pub async fn write_message<W>(
    writer: &mut W,
    packet_type: PacketType,
    payload: &[u8],
    packet_size: usize,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let framed = frame_message(packet_type, payload, packet_size);
    writer.write_all(&framed).await.map_err(map_io)?;
    writer.flush().await.map_err(map_io)?;
    Ok(())
}

/// Read packets of `expected` type until end of message and return the
/// reassembled payload.
pub async fn read_message<R>(
    reader: &mut R,
    expected: PacketType,
    max_message_size: usize,
) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut message = BytesMut::new();

    loop {
        let mut header_buf = [0u8; PACKET_HEADER_SIZE];
        reader.read_exact(&mut header_buf).await.map_err(map_io)?;
        let header = PacketHeader::decode(&mut &header_buf[..])?;

        if header.packet_type != expected {
            return Err(ProtocolError::UnexpectedPacketType {
                expected: expected as u8,
                actual: header.packet_type as u8,
            }
            .into());
        }

        let payload_len = header.payload_length();
        if message.len() + payload_len > max_message_size {
            return Err(ProtocolError::MessageTooLarge(message.len() + payload_len).into());
        }

        let start = message.len();
        message.resize(start + payload_len, 0);
        reader
            .read_exact(&mut message[start..])
            .await
            .map_err(map_io)?;

        if header.is_end_of_message() {
            return Ok(message.freeze());
        }
    }
}

fn map_io(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        Error::Io(e)
    }
}
