use crate::genomics::{EdgeGene, Genome};
use crate::Innovation;

use std::cmp::Ordering;
use std::collections::btree_map;
use std::iter::Peekable;

/// Which of the two aligned genomes a gene belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    First,
    Second,
}

/// A single step of the alignment of two genomes' edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Aligned<'a> {
    /// Both genomes hold an edge with this innovation number.
    Matching(&'a EdgeGene, &'a EdgeGene),
    /// Only one genome holds this edge, within the other's innovation range.
    Disjoint(Side, &'a EdgeGene),
    /// Only one genome holds this edge, beyond the other's highest innovation.
    Excess(Side, &'a EdgeGene),
}

type Edges<'a> = Peekable<btree_map::Values<'a, Innovation, EdgeGene>>;

/// Merge-join over the edges of two genomes, in
/// ascending innovation order.
pub(crate) struct Alignment<'a> {
    first: Edges<'a>,
    second: Edges<'a>,
}

impl<'a> Alignment<'a> {
    pub(crate) fn new(first: &'a Genome, second: &'a Genome) -> Alignment<'a> {
        Alignment {
            first: first.edges.values().peekable(),
            second: second.edges.values().peekable(),
        }
    }
}

impl<'a> Iterator for Alignment<'a> {
    type Item = Aligned<'a>;

    fn next(&mut self) -> Option<Aligned<'a>> {
        let order = match (self.first.peek(), self.second.peek()) {
            (None, None) => return None,
            (Some(_), None) => return Some(Aligned::Excess(Side::First, self.first.next()?)),
            (None, Some(_)) => return Some(Aligned::Excess(Side::Second, self.second.next()?)),
            (Some(a), Some(b)) => a.innovation().cmp(&b.innovation()),
        };
        Some(match order {
            Ordering::Less => Aligned::Disjoint(Side::First, self.first.next()?),
            Ordering::Greater => Aligned::Disjoint(Side::Second, self.second.next()?),
            Ordering::Equal => Aligned::Matching(self.first.next()?, self.second.next()?),
        })
    }
}
