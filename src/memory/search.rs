//! Progressive memory search
//!
//! A search starts with every addressable unit of the registered banks as
//! a candidate. Each filter pass drops the candidates whose live value fails
//! a comparison, either against a fixed value or against the value seen on
//! the previous pass.

use serde::{Deserialize, Serialize};

use super::{BankRegistry, MemSize};
use crate::triggers::Comparison;

/// Granularity of a memory search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSize {
    Nibble,
    #[default]
    Byte,
    /// 16-bit values at even addresses
    Word,
    /// 32-bit values at addresses divisible by four
    Dword,
}

impl SearchSize {
    fn stride(&self) -> usize {
        match self {
            SearchSize::Nibble | SearchSize::Byte => 1,
            SearchSize::Word => 2,
            SearchSize::Dword => 4,
        }
    }
}

/// A memory location still consistent with the search so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCandidate {
    pub address: usize,
    /// Upper nibble of the byte; only meaningful for nibble searches
    pub is_upper_nibble: bool,
    pub last_known_value: u32,
}

/// Result of one filter pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub remaining: usize,
    /// False when nothing matched; the candidate set was left unchanged
    pub found_any: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemorySearchEngine {
    candidates: Vec<MemoryCandidate>,
    size: SearchSize,
}

impl MemorySearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a new search over every registered bank
    pub fn reset(&mut self, banks: &BankRegistry, size: SearchSize) {
        self.reset_range(banks, size, 0, banks.total_size());
    }

    /// Seed a new search over `[start, end)`
    pub fn reset_range(&mut self, banks: &BankRegistry, size: SearchSize, start: usize, end: usize) {
        let end = end.min(banks.total_size());
        let stride = size.stride();
        let first = start.div_ceil(stride) * stride;

        let mut candidates = Vec::new();
        let mut address = first;
        while address + stride <= end {
            match size {
                SearchSize::Nibble => {
                    for is_upper_nibble in [false, true] {
                        candidates.push(MemoryCandidate {
                            address,
                            is_upper_nibble,
                            last_known_value: 0,
                        });
                    }
                }
                _ => candidates.push(MemoryCandidate {
                    address,
                    is_upper_nibble: false,
                    last_known_value: 0,
                }),
            }
            address += stride;
        }

        for candidate in candidates.iter_mut() {
            candidate.last_known_value = Self::live_value(banks, size, candidate);
        }

        log::debug!(
            "Memory search reset: {} {:?} candidates in 0x{:x}..0x{:x}",
            candidates.len(),
            size,
            first,
            end
        );
        self.candidates = candidates;
        self.size = size;
    }

    /// Keep only candidates whose live value satisfies `op`
    ///
    /// The comparison is against `query_value`, or against each candidate's
    /// last known value when `use_last_known` is set. When no candidate
    /// passes, the current set is kept.
    pub fn compare(
        &mut self,
        banks: &BankRegistry,
        op: Comparison,
        query_value: u32,
        use_last_known: bool,
    ) -> SearchOutcome {
        let size = self.size;
        let survivors: Vec<MemoryCandidate> = self
            .candidates
            .iter()
            .filter_map(|candidate| {
                let live = Self::live_value(banks, size, candidate);
                let target = if use_last_known {
                    candidate.last_known_value
                } else {
                    query_value
                };
                op.evaluate(live, target).then_some(MemoryCandidate {
                    last_known_value: live,
                    ..*candidate
                })
            })
            .collect();

        if survivors.is_empty() {
            log::debug!(
                "Memory search filter {:?} matched nothing; keeping {} candidates",
                op,
                self.candidates.len()
            );
            return SearchOutcome {
                remaining: self.candidates.len(),
                found_any: false,
            };
        }

        log::debug!(
            "Memory search filter {:?}: {} -> {} candidates",
            op,
            self.candidates.len(),
            survivors.len()
        );
        self.candidates = survivors;
        SearchOutcome {
            remaining: self.candidates.len(),
            found_any: true,
        }
    }

    /// Drop all candidates, as when the bank layout changes
    pub fn clear(&mut self) {
        self.candidates.clear();
    }

    pub fn candidates(&self) -> &[MemoryCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn size_mode(&self) -> SearchSize {
        self.size
    }

    /// Live value of the candidate at `index`
    pub fn candidate_value(&self, banks: &BankRegistry, index: usize) -> Option<u32> {
        self.candidates
            .get(index)
            .map(|candidate| Self::live_value(banks, self.size, candidate))
    }

    fn live_value(banks: &BankRegistry, size: SearchSize, candidate: &MemoryCandidate) -> u32 {
        let width = match size {
            SearchSize::Nibble if candidate.is_upper_nibble => MemSize::UpperNibble,
            SearchSize::Nibble => MemSize::LowerNibble,
            SearchSize::Byte => MemSize::Byte,
            SearchSize::Word => MemSize::Word,
            SearchSize::Dword => MemSize::Dword,
        };
        banks.read(candidate.address, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SharedMemory;

    fn banks(data: Vec<u8>) -> (BankRegistry, SharedMemory) {
        let memory = SharedMemory::from_bytes(data);
        let mut banks = BankRegistry::new();
        banks.register(0, Box::new(memory.clone())).unwrap();
        (banks, memory)
    }

    #[test]
    fn test_reset_counts() {
        let (banks, _) = banks(vec![0; 10]);
        let mut search = MemorySearchEngine::new();

        search.reset(&banks, SearchSize::Nibble);
        assert_eq!(search.len(), 20);
        assert!(!search.candidates()[0].is_upper_nibble);
        assert!(search.candidates()[1].is_upper_nibble);

        search.reset(&banks, SearchSize::Byte);
        assert_eq!(search.len(), 10);

        search.reset(&banks, SearchSize::Word);
        assert_eq!(search.len(), 5);
        assert_eq!(search.candidates()[1].address, 2);

        search.reset(&banks, SearchSize::Dword);
        assert_eq!(search.len(), 2);
        assert_eq!(search.size_mode(), SearchSize::Dword);
    }

    #[test]
    fn test_reset_seeds_last_known() {
        let (banks, _) = banks(vec![0x21, 0x43]);
        let mut search = MemorySearchEngine::new();

        search.reset(&banks, SearchSize::Nibble);
        let seeded: Vec<u32> = search.candidates().iter().map(|c| c.last_known_value).collect();
        assert_eq!(seeded, vec![1, 2, 3, 4]);

        search.reset(&banks, SearchSize::Word);
        assert_eq!(search.candidates()[0].last_known_value, 0x4321);
    }

    #[test]
    fn test_reset_range_aligns() {
        let (banks, _) = banks(vec![0; 32]);
        let mut search = MemorySearchEngine::new();
        search.reset_range(&banks, SearchSize::Word, 3, 11);
        let addresses: Vec<usize> = search.candidates().iter().map(|c| c.address).collect();
        assert_eq!(addresses, vec![4, 6, 8]);

        search.reset_range(&banks, SearchSize::Byte, 30, 100);
        assert_eq!(search.len(), 2);
    }

    #[test]
    fn test_filter_fixed_value() {
        let (banks, memory) = banks(vec![5; 16]);
        let mut search = MemorySearchEngine::new();
        search.reset(&banks, SearchSize::Byte);

        let outcome = search.compare(&banks, Comparison::Equal, 5, false);
        assert_eq!(outcome, SearchOutcome { remaining: 16, found_any: true });

        for address in (0..16).step_by(2) {
            memory.poke(address, 6);
        }
        let outcome = search.compare(&banks, Comparison::Equal, 5, false);
        assert_eq!(outcome.remaining, 8);
        assert!(search.candidates().iter().all(|c| c.address % 2 == 1));
    }

    #[test]
    fn test_filter_against_last_known() {
        let (banks, memory) = banks(vec![1, 2, 3, 4]);
        let mut search = MemorySearchEngine::new();
        search.reset(&banks, SearchSize::Byte);

        memory.poke(2, 9);
        let outcome = search.compare(&banks, Comparison::NotEqual, 0, true);
        assert_eq!(outcome.remaining, 1);
        assert_eq!(search.candidates()[0].address, 2);
        assert_eq!(search.candidates()[0].last_known_value, 9);

        let outcome = search.compare(&banks, Comparison::Equal, 0, true);
        assert_eq!(outcome.remaining, 1);
    }

    #[test]
    fn test_empty_result_keeps_candidates() {
        let (banks, _) = banks(vec![1, 2, 3, 4]);
        let mut search = MemorySearchEngine::new();
        search.reset(&banks, SearchSize::Byte);
        let before = search.candidates().to_vec();

        let outcome = search.compare(&banks, Comparison::GreaterThan, 100, false);
        assert_eq!(outcome, SearchOutcome { remaining: 4, found_any: false });
        assert_eq!(search.candidates(), before.as_slice());
    }

    #[test]
    fn test_candidate_value_and_clear() {
        let (banks, memory) = banks(vec![7, 8]);
        let mut search = MemorySearchEngine::new();
        search.reset(&banks, SearchSize::Byte);
        memory.poke(1, 10);
        assert_eq!(search.candidate_value(&banks, 1), Some(10));
        assert_eq!(search.candidate_value(&banks, 2), None);

        search.clear();
        assert!(search.is_empty());
    }
}
