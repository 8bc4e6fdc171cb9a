//! Reusable accumulator definitions for the merge slot of a vertex program.
//!
//! Every definition here is associative and commutative, so the order in which the engine
//! merges gather contributions never changes the final accumulator.

use std::{hash::Hash, marker::PhantomData, ops::AddAssign};

use num_traits::{Bounded, Zero};
use rustc_hash::FxHashSet;

use crate::core::StateType;

pub trait Accumulator<A>: Send + Sync {
    fn zero() -> A;

    fn combine(a1: &mut A, a2: &A);

    fn merge(mut a1: A, a2: A) -> A {
        Self::combine(&mut a1, &a2);
        a1
    }
}

pub struct SumDef<A: StateType + Zero + AddAssign<A>> {
    _marker: PhantomData<A>,
}

impl<A> Accumulator<A> for SumDef<A>
where
    A: StateType + Zero + AddAssign<A>,
{
    fn zero() -> A {
        A::zero()
    }

    fn combine(a1: &mut A, a2: &A) {
        *a1 += a2.clone();
    }
}

pub struct MinDef<A: StateType + Bounded + PartialOrd> {
    _marker: PhantomData<A>,
}

impl<A> Accumulator<A> for MinDef<A>
where
    A: StateType + Bounded + PartialOrd,
{
    fn zero() -> A {
        A::max_value()
    }

    fn combine(a1: &mut A, a2: &A) {
        if *a2 < *a1 {
            *a1 = a2.clone();
        }
    }
}

pub struct MaxDef<A: StateType + Bounded + PartialOrd> {
    _marker: PhantomData<A>,
}

impl<A> Accumulator<A> for MaxDef<A>
where
    A: StateType + Bounded + PartialOrd,
{
    fn zero() -> A {
        A::min_value()
    }

    fn combine(a1: &mut A, a2: &A) {
        if *a2 > *a1 {
            *a1 = a2.clone();
        }
    }
}

pub struct SetDef<A: StateType + Hash + Eq> {
    _marker: PhantomData<A>,
}

impl<A> Accumulator<FxHashSet<A>> for SetDef<A>
where
    A: StateType + Hash + Eq,
{
    fn zero() -> FxHashSet<A> {
        FxHashSet::default()
    }

    fn combine(a1: &mut FxHashSet<A>, a2: &FxHashSet<A>) {
        a1.extend(a2.iter().cloned())
    }
}
