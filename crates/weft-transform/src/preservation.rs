//! Transformation of structure-preserving operation pairs.
//!
//! Two concurrently-authored operations against the same base document are
//! rewritten into a pair that converges when applied in swapped order:
//!
//! ```text
//! transform(client, server) -> (client', server')
//!
//!   base --client--> . --server'--> D
//!   base --server--> . --client'--> D    (same D, same annotations)
//! ```
//!
//! Components are consumed in base-document position order: the driver feeds
//! one client component, then pulls server components until the client no
//! longer leads. A component whose range overlaps nothing yet is parked as a
//! pending range cache for the counterpart to resolve; overlapping pairs are
//! resolved through an exhaustive matrix over (incoming, cached) kinds. The
//! first-processed side wins contested attribute keys and contested
//! annotation keys, so the fold is deterministic: identical inputs always
//! produce identical outputs.

use crate::error::{Result, TransformError};
use crate::position::{PositionTracker, Side};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;
use weft_docop::{
    AnnotationBoundary, AnnotationChange, Attributes, AttributesUpdate, Component, DocOp,
    DocOpBuilder,
};

/// The transformed pair: `client` applies after the original server
/// operation, `server` applies after the original client operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPair {
    pub client: DocOp,
    pub server: DocOp,
}

/// The pending effect of one side's range component, awaiting resolution
/// against the counterpart. Reverts to `Retain` after a retain component.
#[derive(Debug)]
enum RangeCache {
    Retain,
    ReplaceAttributes { old: Attributes, new: Attributes },
    UpdateAttributes(AttributesUpdate),
}

impl RangeCache {
    fn kind(&self) -> &'static str {
        match self {
            RangeCache::Retain => "retain",
            RangeCache::ReplaceAttributes { .. } => "replaceAttributes",
            RangeCache::UpdateAttributes(_) => "updateAttributes",
        }
    }
}

/// An incoming range component, borrowed from the operation being consumed.
enum RangeAction<'a> {
    Retain,
    ReplaceAttributes {
        old: &'a Attributes,
        new: &'a Attributes,
    },
    UpdateAttributes(&'a AttributesUpdate),
}

impl RangeAction<'_> {
    fn kind(&self) -> &'static str {
        match self {
            RangeAction::Retain => "retain",
            RangeAction::ReplaceAttributes { .. } => "replaceAttributes",
            RangeAction::UpdateAttributes(_) => "updateAttributes",
        }
    }
}

/// How much of a requested range was accounted for.
enum Resolved {
    /// The whole range overlapped the counterpart's pending cache.
    Whole,
    /// Only this much overlapped; `Part(0)` means nothing did and the
    /// component must be parked as a new pending cache.
    Part(i64),
}

/// An annotation value change in flight on one side, not yet matched by
/// the counterpart.
#[derive(Debug)]
struct ValueUpdate {
    old: Option<String>,
    new: Option<String>,
}

/// All state of one transform call. Both sides' outputs, caches, and
/// annotation trackers are owned here, so the two logical targets resolve
/// against each other without shared aliasing.
struct Session {
    outputs: [DocOpBuilder; 2],
    caches: [RangeCache; 2],
    tracked: [BTreeMap<String, ValueUpdate>; 2],
    position: PositionTracker,
}

impl Session {
    fn new() -> Self {
        Self {
            outputs: [DocOpBuilder::new(), DocOpBuilder::new()],
            caches: [RangeCache::Retain, RangeCache::Retain],
            tracked: [BTreeMap::new(), BTreeMap::new()],
            position: PositionTracker::new(),
        }
    }

    fn apply(&mut self, side: Side, component: &Component) -> Result<()> {
        match component {
            Component::Retain(n) => {
                self.resolve_range(side, *n as i64, RangeAction::Retain)?;
                self.caches[side.index()] = RangeCache::Retain;
            }
            Component::ReplaceAttributes { old, new } => {
                let resolved =
                    self.resolve_range(side, 1, RangeAction::ReplaceAttributes { old, new })?;
                if matches!(resolved, Resolved::Part(0)) {
                    self.caches[side.index()] = RangeCache::ReplaceAttributes {
                        old: old.clone(),
                        new: new.clone(),
                    };
                }
            }
            Component::UpdateAttributes(update) => {
                let resolved = self.resolve_range(side, 1, RangeAction::UpdateAttributes(update))?;
                if matches!(resolved, Resolved::Part(0)) {
                    self.caches[side.index()] = RangeCache::UpdateAttributes(update.clone());
                }
            }
            Component::AnnotationBoundary(boundary) => {
                // Boundary declarations are position-neutral.
                self.register_boundary(side, boundary);
            }
            other => return Err(TransformError::ContractViolation(other.kind())),
        }
        Ok(())
    }

    /// Account a range of `size` positions against the counterpart.
    ///
    /// Reads the current offset, then advances it. If the previous offset
    /// was negative, that much of the counterpart's outstanding range is
    /// resolved now; if the offset stays non-positive the whole range
    /// overlaps; otherwise nothing overlapped and the caller parks the
    /// component as a new pending cache.
    fn resolve_range(&mut self, side: Side, size: i64, action: RangeAction<'_>) -> Result<Resolved> {
        let previous = self.position.get(side);
        self.position.increase(side, size);
        if self.position.get(side) > 0 {
            if previous < 0 {
                self.resolve(side, -previous, action)?;
            }
            Ok(Resolved::Part(-previous))
        } else {
            self.resolve(side, size, action)?;
            Ok(Resolved::Whole)
        }
    }

    /// The resolution matrix: the incoming component of `incoming` against
    /// the counterpart's cached pending effect.
    fn resolve(&mut self, incoming: Side, size: i64, action: RangeAction<'_>) -> Result<()> {
        let i = incoming.index();
        let c = incoming.opposite().index();
        match (&action, &self.caches[c]) {
            (RangeAction::Retain, RangeCache::Retain) => {
                self.outputs[i].retain(size as usize);
                self.outputs[c].retain(size as usize);
            }
            (RangeAction::Retain, RangeCache::ReplaceAttributes { old, new }) => {
                ensure_unit(size, &action, &self.caches[c])?;
                let (old, new) = (old.clone(), new.clone());
                self.outputs[c].replace_attributes(old, new);
                self.outputs[i].retain(1);
            }
            (RangeAction::Retain, RangeCache::UpdateAttributes(update)) => {
                ensure_unit(size, &action, &self.caches[c])?;
                let update = update.clone();
                self.outputs[c].update_attributes(update);
                self.outputs[i].retain(1);
            }
            (RangeAction::ReplaceAttributes { old, new }, RangeCache::Retain) => {
                self.outputs[i].replace_attributes((*old).clone(), (*new).clone());
                self.outputs[c].retain(1);
            }
            (
                RangeAction::ReplaceAttributes { new, .. },
                RangeCache::ReplaceAttributes { new: cached_new, .. },
            ) => {
                // Both replaced the same item: the cached side wins, and
                // re-states its replacement on top of the incoming one.
                ensure_unit(size, &action, &self.caches[c])?;
                let (old, new) = ((*new).clone(), cached_new.clone());
                self.outputs[c].replace_attributes(old, new);
                self.outputs[i].retain(1);
            }
            (RangeAction::ReplaceAttributes { old, new }, RangeCache::UpdateAttributes(update)) => {
                // A replacement trumps a concurrent update; its old state is
                // rebased over the update already applied.
                ensure_unit(size, &action, &self.caches[c])?;
                let rebased = old.updated_with(update);
                self.outputs[c].retain(1);
                self.outputs[i].replace_attributes(rebased, (*new).clone());
            }
            (RangeAction::UpdateAttributes(update), RangeCache::Retain) => {
                self.outputs[i].update_attributes((*update).clone());
                self.outputs[c].retain(1);
            }
            (RangeAction::UpdateAttributes(update), RangeCache::ReplaceAttributes { old, new }) => {
                ensure_unit(size, &action, &self.caches[c])?;
                let (old, new) = (old.updated_with(update), new.clone());
                self.outputs[c].replace_attributes(old, new);
                self.outputs[i].retain(1);
            }
            (RangeAction::UpdateAttributes(incoming_update), RangeCache::UpdateAttributes(cached)) => {
                ensure_unit(size, &action, &self.caches[c])?;
                // The cached side's update survives with each contested old
                // value rebased onto the incoming side's new value; contested
                // keys are excluded from the incoming side so each key is
                // carried by exactly one output.
                let folded = AttributesUpdate::from_triples(cached.iter().map(|triple| {
                    let old = match incoming_update.change_for(&triple.key) {
                        Some(seen) => seen.new.clone(),
                        None => triple.old.clone(),
                    };
                    (triple.key.clone(), old, triple.new.clone())
                }));
                let passed_through = incoming_update.exclude(&cached.keys());
                self.outputs[c].update_attributes(folded);
                self.outputs[i].update_attributes(passed_through);
            }
        }
        Ok(())
    }

    /// Fold one side's boundary declarations against the counterpart's
    /// in-flight annotation changes, emitting one boundary to each output.
    fn register_boundary(&mut self, side: Side, boundary: &AnnotationBoundary) {
        let own = side.index();
        for key in boundary.ends() {
            self.tracked[own].remove(key);
        }
        for change in boundary.changes() {
            self.tracked[own].insert(
                change.key.clone(),
                ValueUpdate {
                    old: change.old.clone(),
                    new: change.new.clone(),
                },
            );
        }
        let (own_boundary, other_boundary) = match side {
            Side::Client => self.fold_client_boundary(boundary),
            Side::Server => self.fold_server_boundary(boundary),
        };
        self.outputs[own].annotation_boundary(own_boundary);
        self.outputs[side.opposite().index()].annotation_boundary(other_boundary);
    }

    /// Client boundary fold. Returns (client emission, server emission).
    fn fold_client_boundary(
        &self,
        boundary: &AnnotationBoundary,
    ) -> (AnnotationBoundary, AnnotationBoundary) {
        let server_tracked = &self.tracked[Side::Server.index()];
        let mut client_ends = Vec::new();
        let mut client_changes = Vec::new();
        let mut server_ends = Vec::new();
        let mut server_changes = Vec::new();
        for key in boundary.ends() {
            client_ends.push(key.to_string());
            if let Some(in_flight) = server_tracked.get(key) {
                // The server's change outlives ours; re-state it so it stays
                // open on the server output.
                server_changes.push(AnnotationChange {
                    key: key.to_string(),
                    old: in_flight.old.clone(),
                    new: in_flight.new.clone(),
                });
            }
        }
        for change in boundary.changes() {
            match server_tracked.get(&change.key) {
                Some(in_flight) => {
                    // Concurrent change on both sides: the server's change is
                    // treated as logically prior, so its new value becomes
                    // our old value and the key closes on the server output.
                    client_changes.push(AnnotationChange {
                        key: change.key.clone(),
                        old: in_flight.new.clone(),
                        new: change.new.clone(),
                    });
                    server_ends.push(change.key.clone());
                }
                None => client_changes.push(change.clone()),
            }
        }
        (
            AnnotationBoundary::from_parts(client_ends, client_changes),
            AnnotationBoundary::from_parts(server_ends, server_changes),
        )
    }

    /// Server boundary fold. Returns (server emission, client emission).
    /// Not a mirror image of the client fold: the client side has priority,
    /// so contested keys fold into the client output here too.
    fn fold_server_boundary(
        &self,
        boundary: &AnnotationBoundary,
    ) -> (AnnotationBoundary, AnnotationBoundary) {
        let client_tracked = &self.tracked[Side::Client.index()];
        // The client output never closes keys here; a contested end only
        // re-states the client's own in-flight change.
        let client_ends: Vec<String> = Vec::new();
        let mut client_changes = Vec::new();
        let mut server_ends = Vec::new();
        let mut server_changes = Vec::new();
        for key in boundary.ends() {
            match client_tracked.get(key) {
                Some(in_flight) => client_changes.push(AnnotationChange {
                    key: key.to_string(),
                    old: in_flight.old.clone(),
                    new: in_flight.new.clone(),
                }),
                None => server_ends.push(key.to_string()),
            }
        }
        for change in boundary.changes() {
            match client_tracked.get(&change.key) {
                Some(in_flight) => {
                    // Subsumed into the client's chain: the client re-bases
                    // onto our new value, and we emit nothing for the key.
                    client_changes.push(AnnotationChange {
                        key: change.key.clone(),
                        old: change.new.clone(),
                        new: in_flight.new.clone(),
                    });
                }
                None => server_changes.push(change.clone()),
            }
        }
        (
            AnnotationBoundary::from_parts(server_ends, server_changes),
            AnnotationBoundary::from_parts(client_ends, client_changes),
        )
    }

    fn finish(self) -> OperationPair {
        let [client, server] = self.outputs;
        OperationPair {
            client: client.finish(),
            server: server.finish(),
        }
    }
}

fn ensure_unit(size: i64, action: &RangeAction<'_>, cache: &RangeCache) -> Result<()> {
    if size == 1 {
        Ok(())
    } else {
        Err(TransformError::IncompatibleComponents {
            incoming: action.kind(),
            pending: cache.kind(),
            size,
        })
    }
}

/// Transform a pair of structure-preserving operations over a common base
/// document into a pair that converges under swapped application order.
///
/// Both inputs must consist solely of retain, replaceAttributes,
/// updateAttributes, and annotationBoundary components and span documents
/// of identical length; content-bearing components are a
/// [`TransformError::ContractViolation`], and a length disagreement that
/// starves one side mid-stream is a [`TransformError::StructuralMismatch`].
/// On error no partial output is returned.
pub fn transform(client_op: &DocOp, server_op: &DocOp) -> Result<OperationPair> {
    trace!(
        client_components = client_op.len(),
        server_components = server_op.len(),
        "transforming structure-preserving pair"
    );
    let mut session = Session::new();
    let mut server_index = 0;
    for component in client_op.components() {
        session.apply(Side::Client, component)?;
        while session.position.get(Side::Client) > 0 {
            let Some(next) = server_op.components().get(server_index) else {
                return Err(TransformError::StructuralMismatch {
                    side: Side::Server.name(),
                    consumed: server_index,
                    total: server_op.len(),
                    outstanding: session.position.get(Side::Client),
                });
            };
            server_index += 1;
            session.apply(Side::Server, next)?;
        }
    }
    while let Some(component) = server_op.components().get(server_index) {
        server_index += 1;
        session.apply(Side::Server, component)?;
    }
    trace!("transform complete");
    Ok(session.finish())
}
