//!  Defines the `VertexProgram` trait, the fixed set of callback slots a user component
//!  implements to run on the engine, and the `ProgramContext` that binds a program to its
//!  codecs and configuration.
//!
//!  Every slot is a pure function over payload values. Slots that may fail return a
//!  [CallbackError], which the engine turns into a failed superstep.

use std::{fmt::Debug, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};

use crate::{config::EngineConfig, core::StateType, errors::CallbackError, serialise::PayloadCodecs};

/// What a scatter call wants done with its edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterOutcome<E> {
    /// `None` leaves the edge payload untouched, `Some` rewrites it whole.
    pub edge: Option<E>,
    /// Add the neighbour to the next superstep's active set.
    pub activate: bool,
}

impl<E> ScatterOutcome<E> {
    /// Leave the edge alone and do not activate the neighbour.
    pub fn keep() -> Self {
        Self {
            edge: None,
            activate: false,
        }
    }

    /// Activate the neighbour without touching the edge.
    pub fn activate() -> Self {
        Self {
            edge: None,
            activate: true,
        }
    }

    /// Rewrite the edge payload.
    pub fn rewrite(edge: E, activate: bool) -> Self {
        Self {
            edge: Some(edge),
            activate,
        }
    }
}

impl<E> Default for ScatterOutcome<E> {
    fn default() -> Self {
        Self::keep()
    }
}

/// The callback slots of a vertex program.
///
/// In `gather` and `scatter`, `src` and `target` are the payloads of the edge's own endpoints
/// (for an in-edge the running vertex is `target`, for an out-edge it is `src`), while `num_in`
/// and `num_out` are always the degrees of the running vertex.
pub trait VertexProgram: Send + Sync + 'static {
    type VertexData: StateType;
    type EdgeData: StateType;
    type Accum: StateType;

    fn new_vertex(&self) -> Self::VertexData;

    fn new_edge(&self) -> Self::EdgeData;

    /// The empty accumulator. Handed to `apply` when no edge contributes.
    fn new_accum(&self) -> Self::Accum;

    fn gather(
        &self,
        src: &Self::VertexData,
        target: &Self::VertexData,
        edge: &Self::EdgeData,
        num_in: usize,
        num_out: usize,
    ) -> Result<Self::Accum, CallbackError>;

    /// Must be associative and commutative.
    fn merge(&self, a: Self::Accum, b: Self::Accum) -> Result<Self::Accum, CallbackError>;

    /// `acc` is `None` only when the aggregator is disabled.
    fn apply(
        &self,
        target: &Self::VertexData,
        acc: Option<Self::Accum>,
        num_in: usize,
        num_out: usize,
    ) -> Result<Self::VertexData, CallbackError>;

    fn scatter(
        &self,
        src: &Self::VertexData,
        target: &Self::VertexData,
        edge: &Self::EdgeData,
        num_in: usize,
        num_out: usize,
    ) -> Result<ScatterOutcome<Self::EdgeData>, CallbackError>;

    fn transform_vertex(&self, v: &Self::VertexData) -> Result<Self::VertexData, CallbackError> {
        Ok(v.clone())
    }

    fn transform_edge(&self, e: &Self::EdgeData) -> Result<Self::EdgeData, CallbackError> {
        Ok(e.clone())
    }

    fn save_vertex(&self, _id: u64, _v: &Self::VertexData) -> Result<(), CallbackError> {
        Ok(())
    }

    fn save_edge(&self, _src: u64, _dst: u64, _e: &Self::EdgeData) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Turn one raw input line into an edge. `Ok(None)` skips the line.
    fn parse_edge(
        &self,
        _source: &str,
        line: &str,
    ) -> Result<Option<(u64, u64, Self::EdgeData)>, CallbackError> {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(src), Some(dst)) if !src.starts_with('#') => {
                let src = src
                    .parse()
                    .map_err(|_| CallbackError::new(format!("invalid source id '{src}'")))?;
                let dst = dst
                    .parse()
                    .map_err(|_| CallbackError::new(format!("invalid target id '{dst}'")))?;
                Ok(Some((src, dst, self.new_edge())))
            }
            _ => Ok(None),
        }
    }
}

pub type CodecsOf<P> = PayloadCodecs<
    <P as VertexProgram>::VertexData,
    <P as VertexProgram>::EdgeData,
    <P as VertexProgram>::Accum,
>;

/// A bound program together with the codecs for its payloads and the engine configuration.
pub struct ProgramContext<P: VertexProgram> {
    program: Arc<P>,
    codecs: CodecsOf<P>,
    config: EngineConfig,
}

impl<P: VertexProgram> Clone for ProgramContext<P> {
    fn clone(&self) -> Self {
        Self {
            program: self.program.clone(),
            codecs: self.codecs.clone(),
            config: self.config.clone(),
        }
    }
}

impl<P: VertexProgram> Debug for ProgramContext<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramContext")
            .field("program", &std::any::type_name::<P>())
            .field("config", &self.config)
            .finish()
    }
}

impl<P: VertexProgram> ProgramContext<P> {
    pub fn new(program: P, codecs: CodecsOf<P>, config: EngineConfig) -> Self {
        Self {
            program: Arc::new(program),
            codecs,
            config,
        }
    }

    pub fn program(&self) -> &P {
        &self.program
    }

    pub fn codecs(&self) -> &CodecsOf<P> {
        &self.codecs
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_codecs(mut self, codecs: CodecsOf<P>) -> Self {
        self.codecs = codecs;
        self
    }
}

impl<P> ProgramContext<P>
where
    P: VertexProgram,
    P::VertexData: Serialize + DeserializeOwned,
    P::EdgeData: Serialize + DeserializeOwned,
    P::Accum: Serialize + DeserializeOwned,
{
    /// Bincode codecs for every payload type.
    pub fn with_defaults(program: P, config: EngineConfig) -> Self {
        Self::new(program, PayloadCodecs::bincode(), config)
    }
}

#[cfg(test)]
mod program_test {
    use super::*;
    use crate::serialise::JsonCodec;

    struct Unit;

    impl VertexProgram for Unit {
        type VertexData = u64;
        type EdgeData = f64;
        type Accum = u64;

        fn new_vertex(&self) -> u64 {
            0
        }

        fn new_edge(&self) -> f64 {
            1.0
        }

        fn new_accum(&self) -> u64 {
            0
        }

        fn gather(&self, _: &u64, _: &u64, _: &f64, _: usize, _: usize) -> Result<u64, CallbackError> {
            Ok(1)
        }

        fn merge(&self, a: u64, b: u64) -> Result<u64, CallbackError> {
            Ok(a + b)
        }

        fn apply(&self, t: &u64, _: Option<u64>, _: usize, _: usize) -> Result<u64, CallbackError> {
            Ok(*t)
        }

        fn scatter(
            &self,
            _: &u64,
            _: &u64,
            _: &f64,
            _: usize,
            _: usize,
        ) -> Result<ScatterOutcome<f64>, CallbackError> {
            Ok(ScatterOutcome::keep())
        }
    }

    #[test]
    fn default_parse_edge_reads_whitespace_separated_pairs() {
        let p = Unit;
        assert_eq!(p.parse_edge("f", "1 2").unwrap(), Some((1, 2, 1.0)));
        assert_eq!(p.parse_edge("f", "  3\t4  extra").unwrap(), Some((3, 4, 1.0)));
        assert_eq!(p.parse_edge("f", "# comment").unwrap(), None);
        assert_eq!(p.parse_edge("f", "").unwrap(), None);
        assert!(p.parse_edge("f", "a 2").is_err());
    }

    #[test]
    fn default_hooks_are_identity_and_no_op() {
        let p = Unit;
        assert_eq!(p.transform_vertex(&5).unwrap(), 5);
        assert_eq!(p.transform_edge(&2.5).unwrap(), 2.5);
        assert!(p.save_vertex(1, &5).is_ok());
        assert!(p.save_edge(1, 2, &2.5).is_ok());
    }

    #[test]
    fn scatter_outcome_helpers() {
        assert_eq!(ScatterOutcome::<f64>::default(), ScatterOutcome::keep());
        assert!(ScatterOutcome::<f64>::activate().activate);
        assert_eq!(ScatterOutcome::rewrite(2.0, false).edge, Some(2.0));
    }

    #[test]
    fn context_codecs_round_trip_every_payload_type() {
        let ctx = ProgramContext::with_defaults(Unit, EngineConfig::default());
        let codecs = ctx.codecs();
        assert_eq!(codecs.vertex.decode(&codecs.vertex.encode(&7).unwrap()).unwrap(), 7);
        assert_eq!(codecs.edge.decode(&codecs.edge.encode(&0.5).unwrap()).unwrap(), 0.5);

        let acc = ctx.program().merge(3, 4).unwrap();
        let bytes = codecs.accum.encode(&acc).unwrap();
        assert_eq!(codecs.accum.decode(&bytes).unwrap(), 7);

        let ctx = ctx.with_codecs(PayloadCodecs::bincode().with_accum_codec(JsonCodec));
        let bytes = ctx.codecs().accum.encode(&acc).unwrap();
        assert_eq!(bytes, b"7".to_vec());
        assert_eq!(ctx.codecs().accum.decode(&bytes).unwrap(), 7);
        assert!(ctx.codecs().accum.decode(b"seven").is_err());
    }
}
