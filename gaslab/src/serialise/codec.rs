use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("Bincode operation failed: {source}")]
    BinCodeError {
        #[from]
        source: Box<bincode::ErrorKind>,
    },

    #[error("JSON operation failed: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Custom(String),
}

/// Turns a payload into bytes and back.
///
/// Implementations must round trip: `decode(&encode(p)?)?` is observationally equal to `p`.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// Compact binary encoding, the default for checkpoints and transfer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<T: Serialize + DeserializeOwned> Codec<T> for BincodeCodec {
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Human readable encoding, handy when inspecting checkpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec {
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// One codec per payload type of a vertex program.
pub struct PayloadCodecs<V, E, A> {
    pub vertex: Arc<dyn Codec<V>>,
    pub edge: Arc<dyn Codec<E>>,
    /// Merged accumulators, for handing gathered values to code outside the engine.
    pub accum: Arc<dyn Codec<A>>,
}

impl<V, E, A> Clone for PayloadCodecs<V, E, A> {
    fn clone(&self) -> Self {
        Self {
            vertex: self.vertex.clone(),
            edge: self.edge.clone(),
            accum: self.accum.clone(),
        }
    }
}

impl<V, E, A> Debug for PayloadCodecs<V, E, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCodecs").finish_non_exhaustive()
    }
}

impl<V, E, A> PayloadCodecs<V, E, A>
where
    V: Serialize + DeserializeOwned + 'static,
    E: Serialize + DeserializeOwned + 'static,
    A: Serialize + DeserializeOwned + 'static,
{
    pub fn bincode() -> Self {
        Self {
            vertex: Arc::new(BincodeCodec),
            edge: Arc::new(BincodeCodec),
            accum: Arc::new(BincodeCodec),
        }
    }

    pub fn json() -> Self {
        Self {
            vertex: Arc::new(JsonCodec),
            edge: Arc::new(JsonCodec),
            accum: Arc::new(JsonCodec),
        }
    }
}

impl<V, E, A> PayloadCodecs<V, E, A> {
    pub fn new(
        vertex: Arc<dyn Codec<V>>,
        edge: Arc<dyn Codec<E>>,
        accum: Arc<dyn Codec<A>>,
    ) -> Self {
        Self {
            vertex,
            edge,
            accum,
        }
    }

    pub fn with_vertex_codec(mut self, codec: impl Codec<V> + 'static) -> Self {
        self.vertex = Arc::new(codec);
        self
    }

    pub fn with_edge_codec(mut self, codec: impl Codec<E> + 'static) -> Self {
        self.edge = Arc::new(codec);
        self
    }

    pub fn with_accum_codec(mut self, codec: impl Codec<A> + 'static) -> Self {
        self.accum = Arc::new(codec);
        self
    }
}

#[cfg(test)]
mod codec_tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Rank {
        id: u64,
        label: String,
        neighbours: Vec<i64>,
    }

    fn rank() -> impl Strategy<Value = Rank> {
        (
            any::<u64>(),
            any::<String>(),
            proptest::collection::vec(any::<i64>(), 0..16),
        )
            .prop_map(|(id, label, neighbours)| Rank {
                id,
                label,
                neighbours,
            })
    }

    proptest! {
        #[test]
        fn bincode_round_trips_structs(r in rank()) {
            let bytes = Codec::<Rank>::encode(&BincodeCodec, &r).unwrap();
            let back: Rank = BincodeCodec.decode(&bytes).unwrap();
            prop_assert_eq!(back, r);
        }

        #[test]
        fn bincode_round_trips_floats(v in any::<f64>().prop_filter("not nan", |v| !v.is_nan())) {
            let bytes = Codec::<f64>::encode(&BincodeCodec, &v).unwrap();
            let back: f64 = BincodeCodec.decode(&bytes).unwrap();
            prop_assert_eq!(back.to_bits(), v.to_bits());
        }

        #[test]
        fn json_round_trips_structs(r in rank()) {
            let bytes = Codec::<Rank>::encode(&JsonCodec, &r).unwrap();
            let back: Rank = JsonCodec.decode(&bytes).unwrap();
            prop_assert_eq!(back, r);
        }
    }

    #[test]
    fn truncated_bytes_fail_to_decode() {
        let r = Rank {
            id: 7,
            label: "seven".to_string(),
            neighbours: vec![1, 2, 3],
        };
        let bytes = Codec::<Rank>::encode(&BincodeCodec, &r).unwrap();
        let res: Result<Rank, _> = BincodeCodec.decode(&bytes[..bytes.len() - 3]);
        assert!(matches!(res, Err(CodecError::BinCodeError { .. })));

        let res: Result<Rank, _> = JsonCodec.decode(b"{\"id\": 7");
        assert!(matches!(res, Err(CodecError::JsonError { .. })));
    }

    #[test]
    fn codecs_can_be_swapped_per_payload() {
        let codecs: PayloadCodecs<u64, String, f64> =
            PayloadCodecs::bincode().with_edge_codec(JsonCodec);
        let edge = codecs.edge.encode(&"weight".to_string()).unwrap();
        assert_eq!(edge, b"\"weight\"".to_vec());
        let v = codecs.vertex.encode(&5u64).unwrap();
        assert_eq!(codecs.vertex.decode(&v).unwrap(), 5u64);
    }
}
