//! Flush merge algorithm (§4.6): a two-input ordered merge of a cache's
//! collapsed entries (`C`) and a TFile's current terms (`T`), emitting
//! one `(term, postings)` record per distinct term with `indexMergeSameKey`
//! coalescing and tombstone collapse applied.

use fluxstore_indexcache::CacheRecord;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Merge `cache_entries` (ascending by term) against `segment_entries`
/// (ascending by term, typically a TFile's [`fluxstore_tfile::TermIter`]
/// collected into a `Vec`), producing the sorted, deduplicated stream a
/// `TFileWriter` should write for the next segment version. Terms whose
/// merged posting set is empty (fully tombstoned, absent from the
/// segment) are dropped rather than written out.
pub fn merge_cache_and_segment(
    cache_entries: Vec<(Vec<u8>, CacheRecord)>,
    segment_entries: Vec<(Vec<u8>, Vec<u64>)>,
) -> Vec<(Vec<u8>, Vec<u64>)> {
    let mut out: Vec<(Vec<u8>, Vec<u64>)> = Vec::new();
    let mut ci = cache_entries.into_iter().peekable();
    let mut si = segment_entries.into_iter().peekable();

    loop {
        let cmp = match (ci.peek(), si.peek()) {
            (Some((ck, _)), Some((sk, _))) => Some(ck.cmp(sk)),
            (Some(_), None) => Some(Ordering::Less),
            (None, Some(_)) => Some(Ordering::Greater),
            (None, None) => None,
        };

        match cmp {
            Some(Ordering::Equal) => {
                let (term, crec) = ci.next().unwrap();
                let (_, spost) = si.next().unwrap();
                push_coalesced(&mut out, term, collapse_postings(&crec, &spost));
            }
            Some(Ordering::Less) => {
                let (term, crec) = ci.next().unwrap();
                push_coalesced(&mut out, term, collapse_postings(&crec, &[]));
            }
            Some(Ordering::Greater) => {
                let (term, spost) = si.next().unwrap();
                push_coalesced(&mut out, term, spost);
            }
            None => break,
        }
    }

    out
}

fn collapse_postings(crec: &CacheRecord, segment: &[u64]) -> Vec<u64> {
    let mut set: BTreeSet<u64> = segment.iter().copied().collect();
    set.extend(crec.postings.iter().copied());
    for uid in &crec.tombstones {
        set.remove(uid);
    }
    set.into_iter().collect()
}

/// `indexMergeSameKey`: coalesce an emission into the previous one if
/// they share a term (defends against either input containing duplicate
/// term keys), and drop terms that end up with no postings at all.
fn push_coalesced(out: &mut Vec<(Vec<u8>, Vec<u64>)>, term: Vec<u8>, mut postings: Vec<u64>) {
    if let Some(last) = out.last_mut() {
        if last.0 == term {
            last.1.append(&mut postings);
            last.1.sort_unstable();
            last.1.dedup();
            return;
        }
    }
    if !postings.is_empty() {
        out.push((term, postings));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_entry(postings: &[u64], tombstones: &[u64]) -> CacheRecord {
        CacheRecord {
            postings: postings.to_vec(),
            tombstones: tombstones.to_vec(),
        }
    }

    #[test]
    fn empty_cache_leaves_segment_unchanged() {
        let segment = vec![(b"a".to_vec(), vec![1, 2])];
        let merged = merge_cache_and_segment(Vec::new(), segment.clone());
        assert_eq!(merged, segment);
    }

    #[test]
    fn empty_segment_emits_cache_sorted() {
        let cache = vec![(b"a".to_vec(), cache_entry(&[2, 1], &[]))];
        let merged = merge_cache_and_segment(cache, Vec::new());
        assert_eq!(merged, vec![(b"a".to_vec(), vec![1, 2])]);
    }

    #[test]
    fn matching_terms_union_their_postings() {
        let cache = vec![(b"a".to_vec(), cache_entry(&[3], &[]))];
        let segment = vec![(b"a".to_vec(), vec![1, 2])];
        let merged = merge_cache_and_segment(cache, segment);
        assert_eq!(merged, vec![(b"a".to_vec(), vec![1, 2, 3])]);
    }

    #[test]
    fn tombstone_removes_uid_from_the_segment_side() {
        let cache = vec![(b"a".to_vec(), cache_entry(&[], &[1]))];
        let segment = vec![(b"a".to_vec(), vec![1, 2])];
        let merged = merge_cache_and_segment(cache, segment);
        assert_eq!(merged, vec![(b"a".to_vec(), vec![2])]);
    }

    #[test]
    fn term_fully_tombstoned_with_nothing_on_disk_is_dropped() {
        let cache = vec![(b"a".to_vec(), cache_entry(&[], &[1]))];
        let merged = merge_cache_and_segment(cache, Vec::new());
        assert!(merged.is_empty());
    }

    #[test]
    fn disjoint_terms_interleave_in_order() {
        let cache = vec![(b"b".to_vec(), cache_entry(&[5], &[]))];
        let segment = vec![(b"a".to_vec(), vec![1]), (b"c".to_vec(), vec![9])];
        let merged = merge_cache_and_segment(cache, segment);
        assert_eq!(
            merged,
            vec![
                (b"a".to_vec(), vec![1]),
                (b"b".to_vec(), vec![5]),
                (b"c".to_vec(), vec![9]),
            ]
        );
    }
}
