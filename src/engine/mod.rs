//! Location hierarchy and rollup engine
//!
//! Pure, synchronous computations over an immutable snapshot of location
//! records. Nothing here performs I/O or fails: malformed links (missing
//! parents, cycles, duplicate ids) are tolerated and reported as data.
//!
//! - [`tree`] indexes records by parent
//! - [`rollup`] sums a metric over every subtree, cycle-safe
//! - [`flatten`] produces the expand/collapse-aware display list
//! - [`query`] answers ancestor/descendant questions

pub mod flatten;
pub mod query;
pub mod rollup;
pub mod tree;

pub use flatten::{flatten, FlattenOptions, Flattened, VisibleNode};
pub use query::{ancestors_of, breadcrumb, descendants_of, Selection};
pub use rollup::{LocationTotals, Metric, Rollup};
pub use tree::{LocationTree, TreeNode};
