/*! Typed model of the [NeTEx](https://netex-cen.eu/) timetable entities handled
by the publication core, together with an id-keyed lookup index.

## Two documents, one graph

A published dataset is split into a *common file* (stops, networks, calendar
primitives, shared across every line of a codespace) and one *line file* per
transit line (routes, journey patterns, service journeys). Entities reference
each other across the two documents through [VersionedRef] values; an index
([NetexEntitiesIndex]) is built per document and gives O(1) lookup by id plus
the secondary foreign-key lookups the reference resolvers need.

## Design decisions

Only the fields the resolution and reassembly algorithms traverse are
modelled; the full NeTEx schema is far larger and the rest of it travels
through this system untouched. Versions are opaque strings, as in the schema.
Indexes are write-once: populated while a document is parsed, read-only for
the rest of their life.
*/

pub mod entities;
pub mod index;
pub mod serde_helpers;

pub use entities::*;
pub use index::NetexEntitiesIndex;
