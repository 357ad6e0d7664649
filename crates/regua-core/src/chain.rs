//! Alternative-chain resolution and the edit-time cycle check.
//!
//! Links form a directed graph through their `alternative_id` pointers. Every
//! walk here carries a visited set, so it ends within `|links| + 1` steps even
//! on data that already contains a cycle or a dangling pointer.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
  Error, Result,
  link::{LinkId, ThemeRuleLink},
};

/// Lookup-by-id over a collection of links.
pub trait LinkLookup {
  fn link(&self, id: LinkId) -> Option<&ThemeRuleLink>;
}

impl LinkLookup for BTreeMap<LinkId, ThemeRuleLink> {
  fn link(&self, id: LinkId) -> Option<&ThemeRuleLink> { self.get(&id) }
}

impl LinkLookup for HashMap<LinkId, ThemeRuleLink> {
  fn link(&self, id: LinkId) -> Option<&ThemeRuleLink> { self.get(&id) }
}

impl LinkLookup for [ThemeRuleLink] {
  fn link(&self, id: LinkId) -> Option<&ThemeRuleLink> {
    self.iter().find(|l| l.link_id == id)
  }
}

/// The fallback chain starting at `start`: `[start, start.alternative, ...]`.
///
/// Stops at a link without an alternative, at a pointer that does not resolve,
/// or just before a link that is already in the chain.
pub fn resolve_chain<'a, L>(
  links: &'a L,
  start: &'a ThemeRuleLink,
) -> Vec<&'a ThemeRuleLink>
where
  L: LinkLookup + ?Sized,
{
  let mut seen = BTreeSet::from([start.link_id]);
  let mut chain = vec![start];
  let mut next = start.alternative_id;

  while let Some(id) = next {
    if !seen.insert(id) {
      break;
    }
    let Some(link) = links.link(id) else { break };
    chain.push(link);
    next = link.alternative_id;
  }

  chain
}

/// Whether pointing `link_id`'s alternative at `proposed` would close a loop.
///
/// Walks forward from `proposed`. Reaching `link_id` is a cycle. Revisiting
/// any other id means the chain below `proposed` already loops, which is
/// rejected the same way; on acyclic data the answer is exactly "the walk from
/// `proposed` reaches `link_id`".
pub fn would_create_cycle<L>(links: &L, link_id: LinkId, proposed: LinkId) -> bool
where
  L: LinkLookup + ?Sized,
{
  let mut seen = BTreeSet::from([link_id]);
  let mut cursor = Some(proposed);

  while let Some(id) = cursor {
    if !seen.insert(id) {
      return true;
    }
    cursor = links.link(id).and_then(|l| l.alternative_id);
  }

  false
}

/// Validate a proposed alternative for `link_id` before it is persisted.
///
/// `link_id` is `None` for a link that does not exist yet; such a link has no
/// incoming pointers and cannot be part of a cycle, so only the target's
/// existence is checked.
pub fn check_alternative<L>(
  links: &L,
  link_id: Option<LinkId>,
  proposed: Option<LinkId>,
) -> Result<()>
where
  L: LinkLookup + ?Sized,
{
  let Some(alternative_id) = proposed else {
    return Ok(());
  };

  if link_id == Some(alternative_id) {
    return Err(Error::AlternativeCycle {
      link_id: alternative_id,
      alternative_id,
    });
  }

  if links.link(alternative_id).is_none() {
    return Err(Error::LinkNotFound(alternative_id));
  }

  if let Some(id) = link_id
    && would_create_cycle(links, id, alternative_id)
  {
    return Err(Error::AlternativeCycle { link_id: id, alternative_id });
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn link(id: LinkId, alternative_id: Option<LinkId>) -> ThemeRuleLink {
    ThemeRuleLink { link_id: id, theme_id: id * 10, rule_id: 1, alternative_id }
  }

  fn graph(edges: &[(LinkId, Option<LinkId>)]) -> BTreeMap<LinkId, ThemeRuleLink> {
    edges.iter().map(|&(id, alt)| (id, link(id, alt))).collect()
  }

  fn ids(chain: &[&ThemeRuleLink]) -> Vec<LinkId> {
    chain.iter().map(|l| l.link_id).collect()
  }

  #[test]
  fn link_without_alternative_has_chain_of_one() {
    let g = graph(&[(1, None)]);
    assert_eq!(ids(&resolve_chain(&g, &g[&1])), [1]);
  }

  #[test]
  fn chain_follows_alternatives_in_order() {
    let g = graph(&[(1, Some(2)), (2, Some(3)), (3, None)]);
    assert_eq!(ids(&resolve_chain(&g, &g[&1])), [1, 2, 3]);
    assert_eq!(ids(&resolve_chain(&g, &g[&2])), [2, 3]);
  }

  #[test]
  fn chain_stops_before_a_repeated_link() {
    let g = graph(&[(1, Some(2)), (2, Some(3)), (3, Some(1))]);
    assert_eq!(ids(&resolve_chain(&g, &g[&1])), [1, 2, 3]);

    let self_loop = graph(&[(4, Some(4))]);
    assert_eq!(ids(&resolve_chain(&self_loop, &self_loop[&4])), [4]);
  }

  #[test]
  fn chain_stops_at_a_dangling_pointer() {
    let g = graph(&[(1, Some(2)), (2, Some(99))]);
    assert_eq!(ids(&resolve_chain(&g, &g[&1])), [1, 2]);
  }

  #[test]
  fn self_alternative_is_a_cycle() {
    let g = graph(&[(1, None)]);
    assert!(would_create_cycle(&g, 1, 1));
    assert!(matches!(
      check_alternative(&g, Some(1), Some(1)),
      Err(Error::AlternativeCycle { link_id: 1, alternative_id: 1 })
    ));
  }

  #[test]
  fn pointing_back_into_own_chain_is_rejected() {
    // B -> C -> A; setting A -> B closes the loop.
    let g = graph(&[(1, None), (2, Some(3)), (3, Some(1))]);
    assert!(would_create_cycle(&g, 1, 2));
    assert!(check_alternative(&g, Some(1), Some(2)).is_err());
    // C -> A already; A -> nothing else is fine.
    assert!(!would_create_cycle(&g, 2, 3));
  }

  #[test]
  fn unrelated_target_is_accepted() {
    let g = graph(&[(1, None), (2, Some(3)), (3, None)]);
    assert!(!would_create_cycle(&g, 1, 2));
    assert!(check_alternative(&g, Some(1), Some(2)).is_ok());
    assert!(check_alternative(&g, Some(1), None).is_ok());
  }

  #[test]
  fn missing_target_is_not_found() {
    let g = graph(&[(1, None)]);
    assert!(matches!(
      check_alternative(&g, Some(1), Some(5)),
      Err(Error::LinkNotFound(5))
    ));
    assert!(matches!(
      check_alternative(&g, None, Some(5)),
      Err(Error::LinkNotFound(5))
    ));
  }

  #[test]
  fn new_link_only_needs_an_existing_target() {
    let g = graph(&[(1, Some(2)), (2, Some(1))]);
    assert!(check_alternative(&g, None, Some(1)).is_ok());
  }

  /// Reference answer: does following pointers from `from` reach `target`
  /// within `bound` hops?
  fn reaches(
    g: &BTreeMap<LinkId, ThemeRuleLink>,
    from: LinkId,
    target: LinkId,
    bound: usize,
  ) -> bool {
    let mut cursor = Some(from);
    for _ in 0..=bound {
      match cursor {
        Some(id) if id == target => return true,
        Some(id) => cursor = g.get(&id).and_then(|l| l.alternative_id),
        None => return false,
      }
    }
    false
  }

  /// Every alternative assignment over four links, including cycles and a
  /// dangling id (5).
  fn all_graphs() -> impl Iterator<Item = BTreeMap<LinkId, ThemeRuleLink>> {
    let choices: [Option<LinkId>; 6] =
      [None, Some(1), Some(2), Some(3), Some(4), Some(5)];
    (0..6usize.pow(4)).map(move |mut n| {
      let mut edges = Vec::with_capacity(4);
      for id in 1..=4 {
        edges.push((id, choices[n % 6]));
        n /= 6;
      }
      graph(&edges)
    })
  }

  fn is_acyclic(g: &BTreeMap<LinkId, ThemeRuleLink>) -> bool {
    g.keys().all(|&id| {
      g[&id]
        .alternative_id
        .is_none_or(|next| !reaches(g, next, id, g.len()))
    })
  }

  #[test]
  fn chains_never_repeat_and_stay_bounded() {
    for g in all_graphs() {
      for start in g.values() {
        let chain = ids(&resolve_chain(&g, start));
        let unique: BTreeSet<_> = chain.iter().copied().collect();
        assert_eq!(unique.len(), chain.len(), "{chain:?}");
        assert!(chain.len() <= g.len());
        assert_eq!(chain[0], start.link_id);
      }
    }
  }

  #[test]
  fn cycle_check_matches_reachability_on_acyclic_graphs() {
    for g in all_graphs().filter(is_acyclic) {
      for &a in g.keys() {
        for &b in g.keys() {
          assert_eq!(
            would_create_cycle(&g, a, b),
            reaches(&g, b, a, g.len()),
            "a={a} b={b} graph={g:?}"
          );
        }
      }
    }
  }
}
