//! Hierarchy Walker.
//!
//! Follows referral edges upward from a purchaser, one hop per iteration,
//! with an explicit depth bound. A broken segment (unregistered referrer,
//! unreadable edge, or a cycle) truncates the walk instead of failing it:
//! the ancestors already collected still earn their commissions.

use std::collections::HashSet;

use rusqlite::Connection;
use upline_db::queries::hierarchy;
use upline_types::Address;

use crate::Result;

/// One upward step from a member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Link {
    /// No referrer: top of the tree.
    Root,
    /// A registered referrer.
    Referrer(Address),
    /// A referrer address with no member row yet.
    Dangling(Address),
    /// An edge whose stored referrer cannot be decoded.
    Broken(String),
}

/// Read access to the referral relation.
pub trait HierarchySource {
    fn link(&self, member: &Address) -> Result<Link>;
}

impl HierarchySource for Connection {
    fn link(&self, member: &Address) -> Result<Link> {
        let Some(edge) = hierarchy::edge(self, member)? else {
            return Ok(Link::Root);
        };
        let Ok(referrer) = Address::parse(&edge.referrer) else {
            return Ok(Link::Broken(edge.referrer));
        };
        if edge.referrer_registered {
            Ok(Link::Referrer(referrer))
        } else {
            Ok(Link::Dangling(referrer))
        }
    }
}

/// An ancestor and its distance from the purchaser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ancestor {
    pub address: Address,
    /// Direct referrer = 1.
    pub depth: u32,
}

/// Resolve the ancestor chain of `purchaser`, nearest first, at most
/// `max_depth` long.
pub fn resolve_chain<S>(source: &S, purchaser: &Address, max_depth: u32) -> Result<Vec<Ancestor>>
where
    S: HierarchySource + ?Sized,
{
    let mut chain = Vec::new();
    let mut seen = HashSet::from([purchaser.clone()]);
    let mut current = purchaser.clone();

    for depth in 1..=max_depth {
        match source.link(&current)? {
            Link::Root => break,
            Link::Referrer(referrer) => {
                if !seen.insert(referrer.clone()) {
                    tracing::warn!(
                        %purchaser,
                        member = %current,
                        %referrer,
                        depth,
                        "referral cycle detected; truncating upline"
                    );
                    break;
                }
                chain.push(Ancestor {
                    address: referrer.clone(),
                    depth,
                });
                current = referrer;
            }
            Link::Dangling(referrer) => {
                tracing::warn!(
                    %purchaser,
                    member = %current,
                    %referrer,
                    depth,
                    "referrer not registered; truncating upline"
                );
                break;
            }
            Link::Broken(raw) => {
                tracing::warn!(
                    %purchaser,
                    member = %current,
                    referrer = %raw,
                    depth,
                    "unreadable referral edge; truncating upline"
                );
                break;
            }
        }
    }

    Ok(chain)
}

/// Whether `target` appears anywhere above `from` (or is `from` itself).
///
/// Unbounded by depth; terminates on the first repeated address.
pub fn reaches<S>(source: &S, from: &Address, target: &Address) -> Result<bool>
where
    S: HierarchySource + ?Sized,
{
    let mut seen = HashSet::new();
    let mut current = from.clone();
    loop {
        if &current == target {
            return Ok(true);
        }
        if !seen.insert(current.clone()) {
            return Ok(false);
        }
        match source.link(&current)? {
            Link::Referrer(next) | Link::Dangling(next) => current = next,
            Link::Root | Link::Broken(_) => return Ok(false),
        }
    }
}
