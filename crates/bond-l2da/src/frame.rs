//! Frame abstraction consumed by the TX/RX paths.

use l2da_types::{MacAddress, ETH_ALEN};

use crate::error::{L2daError, Result};

/// Length of an untagged Ethernet header.
pub const ETH_HLEN: usize = 14;

/// EAPOL (802.1X port access entity).
pub const ETH_P_PAE: u16 = 0x888e;

/// What the steering logic needs to know about a frame.
pub trait Frame: Sized {
    fn source(&self) -> MacAddress;

    fn destination(&self) -> MacAddress;

    /// Control-protocol frames (authentication, negotiation) bypass RX dedup.
    fn is_control_protocol(&self) -> bool;

    /// Frames the host looped back to itself are never bridged.
    fn is_loopback(&self) -> bool;

    /// Copies the frame for forwarding. `None` on allocation failure.
    fn try_clone(&self) -> Option<Self>;

    /// Resets per-receive metadata before the frame is queued for transmit.
    fn prepare_forward(&mut self);
}

/// Path metadata carried alongside a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacketType {
    /// Received from the wire.
    #[default]
    Host,
    /// Queued for transmit by the forwarding path.
    Outgoing,
    /// Sent by this host and looped back to it.
    Loopback,
}

/// An owned Ethernet frame, header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    data: Vec<u8>,
    pkt_type: PacketType,
}

impl EthernetFrame {
    /// Wraps a raw frame. Fails if it is shorter than an Ethernet header.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        if data.len() < ETH_HLEN {
            return Err(L2daError::InvalidArgument(format!(
                "frame of {} bytes is shorter than the Ethernet header",
                data.len()
            )));
        }
        Ok(Self {
            data,
            pkt_type: PacketType::Host,
        })
    }

    /// Builds a frame from header fields and payload.
    pub fn build(dst: MacAddress, src: MacAddress, ethertype: u16, payload: &[u8]) -> Self {
        let mut data = Vec::with_capacity(ETH_HLEN + payload.len());
        data.extend_from_slice(dst.as_bytes());
        data.extend_from_slice(src.as_bytes());
        data.extend_from_slice(&ethertype.to_be_bytes());
        data.extend_from_slice(payload);
        Self {
            data,
            pkt_type: PacketType::Host,
        }
    }

    pub fn with_packet_type(mut self, pkt_type: PacketType) -> Self {
        self.pkt_type = pkt_type;
        self
    }

    pub fn packet_type(&self) -> PacketType {
        self.pkt_type
    }

    pub fn ethertype(&self) -> u16 {
        u16::from_be_bytes([self.data[2 * ETH_ALEN], self.data[2 * ETH_ALEN + 1]])
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[ETH_HLEN..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Frame for EthernetFrame {
    fn source(&self) -> MacAddress {
        MacAddress::from_slice(&self.data[ETH_ALEN..]).unwrap_or(MacAddress::ZERO)
    }

    fn destination(&self) -> MacAddress {
        MacAddress::from_slice(&self.data).unwrap_or(MacAddress::ZERO)
    }

    fn is_control_protocol(&self) -> bool {
        self.ethertype() == ETH_P_PAE
    }

    fn is_loopback(&self) -> bool {
        self.pkt_type == PacketType::Loopback
    }

    fn try_clone(&self) -> Option<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(self.data.len()).ok()?;
        data.extend_from_slice(&self.data);
        Some(Self {
            data,
            pkt_type: self.pkt_type,
        })
    }

    fn prepare_forward(&mut self) {
        self.pkt_type = PacketType::Outgoing;
    }
}
