/// User actions fed into the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Open the signaling channel and join the room.
    Start,

    /// Place an outgoing call: create and send an offer.
    Call,

    /// Tear the session down. Terminal.
    Stop,
}
