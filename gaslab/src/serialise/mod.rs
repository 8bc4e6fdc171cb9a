mod codec;
mod snapshot;

pub use codec::{BincodeCodec, Codec, CodecError, JsonCodec, PayloadCodecs};
pub use snapshot::GraphSnapshot;
