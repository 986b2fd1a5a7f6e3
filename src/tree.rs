//! Structured tree interchange.
//!
//! Serde-derived mirrors of the document model, shaped for exchange with
//! other tooling:
//!
//! ```text
//! { entry_id, saveframes: [ { name, category, tag_prefix,
//!                             tags: [[name, value]],
//!                             loops: [ { category, tags: [name], data: [[value]] } ] } ] }
//! ```
//!
//! [`Entry::from_tree`] rebuilds the document through the ordinary model
//! operations, so a hand-built tree is held to the same structural
//! invariants as parsed text.
//!
//! ## Examples
//!
//! ```rust
//! use nmrstar::Entry;
//!
//! let entry: Entry = "data_x\nsave_s\n_S.V 1\nsave_\n".parse().unwrap();
//! let tree = entry.to_tree();
//! let rebuilt = Entry::from_tree(&tree).unwrap();
//! assert!(entry.compare(&rebuilt).is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::loops::Loop;
use crate::saveframe::Saveframe;
use crate::Result;

/// Interchange form of an [`Entry`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTree {
    pub entry_id: String,
    pub saveframes: Vec<SaveframeTree>,
}

/// Interchange form of a [`Saveframe`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveframeTree {
    pub name: String,
    pub category: Option<String>,
    pub tag_prefix: Option<String>,
    pub tags: Vec<(String, String)>,
    pub loops: Vec<LoopTree>,
}

/// Interchange form of a [`Loop`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopTree {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub data: Vec<Vec<String>>,
}

impl From<&Loop> for LoopTree {
    fn from(lp: &Loop) -> Self {
        LoopTree {
            category: lp.category().map(str::to_string),
            tags: lp.columns().to_vec(),
            data: lp.rows().to_vec(),
        }
    }
}

impl From<&Saveframe> for SaveframeTree {
    fn from(frame: &Saveframe) -> Self {
        SaveframeTree {
            name: frame.name().to_string(),
            category: frame.category().map(str::to_string),
            tag_prefix: frame.tag_prefix().map(str::to_string),
            tags: frame.tags().to_vec(),
            loops: frame.loops().iter().map(LoopTree::from).collect(),
        }
    }
}

impl From<&Entry> for EntryTree {
    fn from(entry: &Entry) -> Self {
        EntryTree {
            entry_id: entry.entry_id().to_string(),
            saveframes: entry.saveframes().iter().map(SaveframeTree::from).collect(),
        }
    }
}

impl Entry {
    /// Produces the interchange tree for this entry.
    #[must_use]
    pub fn to_tree(&self) -> EntryTree {
        EntryTree::from(self)
    }

    /// Rebuilds an entry from an interchange tree, enforcing every model
    /// invariant along the way.
    pub fn from_tree(tree: &EntryTree) -> Result<Entry> {
        let mut entry = Entry::from_scratch(&tree.entry_id);
        for frame_tree in &tree.saveframes {
            let mut frame = Saveframe::from_scratch(&frame_tree.name);
            if let Some(prefix) = &frame_tree.tag_prefix {
                frame.set_tag_prefix(prefix)?;
            }
            for (tag, value) in &frame_tree.tags {
                frame.add_tag(tag, value)?;
            }
            if let Some(category) = &frame_tree.category {
                frame.set_category(category);
            }
            for loop_tree in &frame_tree.loops {
                let mut lp = Loop::from_scratch();
                if let Some(category) = &loop_tree.category {
                    lp.set_category(category);
                }
                for column in &loop_tree.tags {
                    lp.add_column(column)?;
                }
                for row in &loop_tree.data {
                    lp.add_row(row.clone())?;
                }
                frame.add_loop(lp)?;
            }
            entry.add_saveframe(frame)?;
        }
        Ok(entry)
    }
}
