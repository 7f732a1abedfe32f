use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap, HashMap},
};

use crate::error::{Error, Result};

/// Number of occurrences of each character in a text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<char, u64>,
}

impl FrequencyTable {
    /// Count every character of `text` in a single pass, whitespace and
    /// control characters included.
    pub fn count(text: &str) -> Self {
        let mut counts = HashMap::new();
        for c in text.chars() {
            *counts.entry(c).or_insert(0) += 1;
        }

        Self { counts }
    }

    pub fn get(&self, symbol: char) -> u64 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    /// Number of distinct symbols
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Symbols and counts in ascending symbol order
    pub fn sorted(&self) -> Vec<(char, u64)> {
        let mut entries: Vec<_> = self.counts.iter().map(|(&c, &n)| (c, n)).collect();
        entries.sort_unstable_by_key(|&(c, _)| c);
        entries
    }
}

/// A node of a [`HuffmanTree`]. Children are indices into the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Leaf(char),
    Internal { left: usize, right: usize },
}

/// A binary prefix-code tree stored as a flat arena.
///
/// Leaves hold exactly one symbol, internal nodes exactly two children. The
/// tree is only ever built bottom-up (from frequencies) or top-down (from a
/// code table) and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize,
}

impl HuffmanTree {
    /// Build the optimal prefix code tree for the given frequencies.
    ///
    /// Nodes are merged lowest frequency first. Ties are broken by the order
    /// in which nodes entered the queue: leaves enter in ascending symbol
    /// order, each merged node enters after every node already queued. The
    /// first node taken off the queue becomes the left child. The same
    /// frequencies therefore always produce the same tree.
    pub fn build(frequencies: &FrequencyTable) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut nodes = Vec::with_capacity(frequencies.len() * 2 - 1);
        let mut queue = BinaryHeap::with_capacity(frequencies.len());
        let mut sequence = 0u64;

        for (symbol, count) in frequencies.sorted() {
            queue.push(Reverse((count, sequence, nodes.len())));
            nodes.push(Node::Leaf(symbol));
            sequence += 1;
        }

        while let (Some(Reverse((left_count, _, left))), Some(Reverse((right_count, _, right)))) =
            (queue.pop(), queue.pop())
        {
            queue.push(Reverse((left_count + right_count, sequence, nodes.len())));
            nodes.push(Node::Internal { left, right });
            sequence += 1;
        }

        // The loop above only exits once a single node was popped
        let root = nodes.len() - 1;

        Ok(Self { nodes, root })
    }

    /// Rebuild a tree from `(symbol, code)` pairs alone.
    ///
    /// Internal nodes are created along each code's path and the symbol is
    /// attached where the path ends. Codes that are empty, collide, or are a
    /// prefix of another code are rejected.
    pub fn from_codes<'a, I>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (char, &'a [bool])>,
    {
        // Slots are `None` until a path reaches them
        let mut slots: Vec<Slot> = vec![Slot::Branch { left: None, right: None }];

        for (symbol, code) in codes {
            if code.is_empty() {
                return Err(Error::CorruptArtifact(format!(
                    "symbol {symbol:?} has an empty code"
                )));
            }

            let mut current = 0;
            for (depth, &bit) in code.iter().enumerate() {
                let last = depth + 1 == code.len();

                let Slot::Branch { left, right } = &slots[current] else {
                    return Err(prefix_conflict(symbol));
                };
                let child = if bit { *right } else { *left };

                current = match (child, last) {
                    (Some(_), true) => return Err(prefix_conflict(symbol)),
                    (Some(next), false) => next,
                    (None, _) => {
                        let next = slots.len();
                        slots.push(if last {
                            Slot::Leaf(symbol)
                        } else {
                            Slot::Branch { left: None, right: None }
                        });

                        if let Slot::Branch { left, right } = &mut slots[current] {
                            if bit {
                                *right = Some(next);
                            } else {
                                *left = Some(next);
                            }
                        }

                        next
                    }
                };
            }
        }

        if let Slot::Branch { left: None, right: None } = slots[0] {
            return Err(Error::EmptyInput);
        }

        Ok(Self::from_slots(slots))
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn node(&self, index: usize) -> Node {
        self.nodes[index]
    }

    /// Number of leaves, which is the number of distinct symbols
    pub fn symbol_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf(_)))
            .count()
    }

    /// Walk the tree once, depth first, assigning `false` for every step to
    /// the left and `true` for every step to the right.
    ///
    /// A tree made of a single leaf gives its symbol the one-bit code `0`.
    pub fn codes(&self) -> BTreeMap<char, Vec<bool>> {
        let mut table = BTreeMap::new();

        if let Node::Leaf(symbol) = self.nodes[self.root] {
            table.insert(symbol, vec![false]);
            return table;
        }

        let mut stack = vec![(self.root, Vec::new())];
        while let Some((index, path)) = stack.pop() {
            let Some(&node) = self.nodes.get(index) else {
                continue;
            };

            match node {
                Node::Leaf(symbol) => {
                    table.insert(symbol, path);
                }
                Node::Internal { left, right } => {
                    let mut right_path = path.clone();
                    right_path.push(true);
                    stack.push((right, right_path));

                    let mut left_path = path;
                    left_path.push(false);
                    stack.push((left, left_path));
                }
            }
        }

        table
    }

    /// Convert a partially filled table into a tree. Branches missing a child
    /// keep a dangling edge, represented by `usize::MAX`.
    fn from_slots(slots: Vec<Slot>) -> Self {
        let nodes = slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Leaf(symbol) => Node::Leaf(symbol),
                Slot::Branch { left, right } => Node::Internal {
                    left: left.unwrap_or(usize::MAX),
                    right: right.unwrap_or(usize::MAX),
                },
            })
            .collect();

        Self { nodes, root: 0 }
    }

    /// Child reached from an internal node, or `None` for a dangling edge
    pub(crate) fn step(&self, index: usize, bit: bool) -> Option<usize> {
        match self.nodes[index] {
            Node::Internal { left, right } => {
                let next = if bit { right } else { left };
                (next < self.nodes.len()).then_some(next)
            }
            Node::Leaf(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Leaf(char),
    Branch {
        left: Option<usize>,
        right: Option<usize>,
    },
}

fn prefix_conflict(symbol: char) -> Error {
    Error::CorruptArtifact(format!(
        "code for {symbol:?} collides with or is a prefix of another code"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> Vec<bool> {
        s.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn counts_every_character() {
        let freq = FrequencyTable::count("a b\na");
        assert_eq!(freq.get('a'), 2);
        assert_eq!(freq.get(' '), 1);
        assert_eq!(freq.get('\n'), 1);
        assert_eq!(freq.get('z'), 0);
        assert_eq!(freq.len(), 4);
    }

    #[test]
    fn two_symbols() {
        let tree = HuffmanTree::build(&FrequencyTable::count("aaab")).unwrap();
        let codes = tree.codes();

        // The rarer symbol is taken first and lands on the left
        assert_eq!(codes[&'b'], bits("0"));
        assert_eq!(codes[&'a'], bits("1"));
        assert_eq!(tree.symbol_count(), 2);
    }

    #[test]
    fn single_symbol_gets_one_bit() {
        let tree = HuffmanTree::build(&FrequencyTable::count("zzzz")).unwrap();
        assert_eq!(tree.node(tree.root()), Node::Leaf('z'));
        assert_eq!(tree.codes()[&'z'], bits("0"));
    }

    #[test]
    fn empty_frequencies_fail() {
        let err = HuffmanTree::build(&FrequencyTable::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn ties_are_broken_by_queue_order() {
        // All equal: a+b merge first, then c+d, then the two pairs
        let tree = HuffmanTree::build(&FrequencyTable::count("abcd")).unwrap();
        let codes = tree.codes();

        assert_eq!(codes[&'a'], bits("00"));
        assert_eq!(codes[&'b'], bits("01"));
        assert_eq!(codes[&'c'], bits("10"));
        assert_eq!(codes[&'d'], bits("11"));
    }

    #[test]
    fn code_lengths_follow_frequency() {
        let text = "aaaaaaaaaaaaaaaabbbbbbbbccccdde";
        let codes = HuffmanTree::build(&FrequencyTable::count(text)).unwrap().codes();

        assert_eq!(codes[&'a'].len(), 1);
        assert_eq!(codes[&'b'].len(), 2);
        assert_eq!(codes[&'c'].len(), 3);
        assert_eq!(codes[&'d'].len(), 4);
        assert_eq!(codes[&'e'].len(), 4);
    }

    #[test]
    fn no_code_is_a_prefix_of_another() {
        let text = "the quick brown fox jumps over the lazy dog\n\t\r";
        let codes = HuffmanTree::build(&FrequencyTable::count(text)).unwrap().codes();

        for (a, code_a) in &codes {
            for (b, code_b) in &codes {
                if a != b {
                    assert!(!code_b.starts_with(code_a), "{a:?} prefixes {b:?}");
                }
            }
        }
    }

    #[test]
    fn rebuilt_tree_has_same_codes() {
        let text = "mississippi river";
        let codes = HuffmanTree::build(&FrequencyTable::count(text)).unwrap().codes();

        let rebuilt = HuffmanTree::from_codes(codes.iter().map(|(&c, b)| (c, b.as_slice()))).unwrap();
        assert_eq!(rebuilt.codes(), codes);
    }

    #[test]
    fn rebuild_rejects_prefix_codes() {
        let short = bits("0");
        let long = bits("01");

        let err = HuffmanTree::from_codes([('a', short.as_slice()), ('b', long.as_slice())]).unwrap_err();
        assert!(matches!(err, Error::CorruptArtifact(_)));

        let err = HuffmanTree::from_codes([('b', long.as_slice()), ('a', short.as_slice())]).unwrap_err();
        assert!(matches!(err, Error::CorruptArtifact(_)));
    }

    #[test]
    fn rebuild_rejects_empty_code() {
        let err = HuffmanTree::from_codes([('a', &[][..])]).unwrap_err();
        assert!(matches!(err, Error::CorruptArtifact(_)));
    }
}
