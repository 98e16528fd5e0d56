/// Header stage at which a received frame ran out of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncatedAt {
    EthernetHeader,
    VlanTag,
    ProfinetHeader,
    DcpHeader,
}

/// Reason a received frame was discarded by the validator.
///
/// None of these are fatal; the driver loop keeps receiving until its
/// timeout elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseDcpError {
    /// Not enough bytes to read the next fixed-size header.
    Truncated(TruncatedAt),
    /// Destination MAC is neither ours, broadcast, nor the DCP multicast.
    AddressMismatch,
    /// The (outer or VLAN-encapsulated) ethertype is not PROFINET.
    ProtocolMismatch,
    /// The PROFINET frame-id is not the one expected for the in-flight request.
    FrameIdMismatch,
    /// The DCP header declares more payload than the buffer holds.
    DeclaredLengthExceedsBuffer,
}
